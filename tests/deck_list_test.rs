// Property tests for the .ydk deck list parser
use proptest::prelude::*;
use ydk_deck_builder::deck::parse_deck_list;
use ydk_deck_builder::{CardIdentifier, DeckError, DeckList, Zone};

fn zone_strategy() -> impl Strategy<Value = Zone> {
    prop_oneof![Just(Zone::Main), Just(Zone::Extra), Just(Zone::Side)]
}

proptest! {
    #[test]
    fn exported_text_reparses_to_same_list(
        entries in prop::collection::vec((zone_strategy(), "[0-9]{1,9}"), 0..40)
    ) {
        let mut list = DeckList::new();
        for (zone, raw) in &entries {
            list.push(*zone, CardIdentifier::parse(raw).expect("digits"));
        }

        let reparsed = parse_deck_list(&list.to_text()).expect("exported text must parse");
        prop_assert_eq!(reparsed, list);
    }

    #[test]
    fn non_directive_non_digit_line_is_malformed(line in "[a-zA-Z!#][a-zA-Z0-9 ]{0,12}") {
        prop_assume!(!["#main", "#extra", "!side"].contains(&line.trim()));

        let text = format!("#main\n4001\n{}\n4002\n", line);
        let result = parse_deck_list(&text);

        prop_assert!(
            matches!(result, Err(DeckError::MalformedDeckList { line_number: 3, .. })),
            "unexpected result for {:?}",
            line
        );
    }

    #[test]
    fn blank_lines_and_padding_are_ignored(ids in prop::collection::vec("[0-9]{1,8}", 1..10)) {
        let padded: Vec<String> = ids.iter().map(|id| format!("  {}\t\n", id)).collect();
        let text = format!("\n!side\n\n{}\n", padded.join("\n"));

        let list = parse_deck_list(&text).expect("padded list must parse");
        let side: Vec<&str> = list.zone(Zone::Side).iter().map(CardIdentifier::as_str).collect();

        prop_assert_eq!(side, ids.iter().map(String::as_str).collect::<Vec<_>>());
        prop_assert!(list.zone(Zone::Main).is_empty());
    }
}

#[test]
fn reference_example_splits_zones_in_order() {
    let list =
        parse_deck_list("#main\n4001\n!side\n4002\n4002\n#extra\n").expect("valid deck list");

    let ids = |zone| -> Vec<String> { list.zone(zone).iter().map(|id| id.to_string()).collect() };
    assert_eq!(ids(Zone::Main), vec!["4001"]);
    assert_eq!(ids(Zone::Side), vec!["4002", "4002"]);
    assert!(ids(Zone::Extra).is_empty());
}
