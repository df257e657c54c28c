//! 卡组文本（.ydk）解析
//!
//! 逐行处理，行首尾空白先裁剪：
//! - `#main` / `#extra` / `!side` 切换当前区域（大小写敏感、精确匹配）
//! - 空行跳过；文件头的 UTF-8 BOM 忽略
//! - 其余行必须是纯数字卡号，追加到当前区域
//!
//! 在任何区域指令之前出现卡号，或出现既非指令也非数字的行，整次解析失败，
//! 不返回任何部分结果。

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::{CardIdentifier, DeckList, Zone};
use crate::error::DeckError;

fn directive_zone(line: &str) -> Option<Zone> {
    Zone::ALL.into_iter().find(|zone| zone.directive() == line)
}

/// 解析卡组文本。
pub fn parse_deck_list(content: &str) -> Result<DeckList, DeckError> {
    let mut list = DeckList::new();
    let mut active: Option<Zone> = None;

    // Windows 编辑器常在文件头写入 BOM
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(zone) = directive_zone(line) {
            active = Some(zone);
            continue;
        }

        let malformed = || DeckError::MalformedDeckList {
            line_number: idx + 1,
            line: line.to_string(),
        };

        let zone = active.ok_or_else(malformed)?;
        let identifier = CardIdentifier::parse(line).ok_or_else(malformed)?;
        list.push(zone, identifier);
    }

    log::debug!(
        "📄 卡组解析完成 - main={} extra={} side={}",
        list.zone(Zone::Main).len(),
        list.zone(Zone::Extra).len(),
        list.zone(Zone::Side).len()
    );

    Ok(list)
}

/// 读取并解析卡组文件。
pub fn parse_file(path: &Path) -> Result<DeckList, DeckError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(DeckError::DeckFileNotFound(path.to_path_buf()));
        }
        Err(err) => return Err(DeckError::io(path, err)),
    };

    parse_deck_list(&content)
}
