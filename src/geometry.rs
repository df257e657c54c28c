//! 几何基础类型
//!
//! 卡片在屏幕上的包围盒与指针坐标。全部为整数像素坐标，
//! 平移使用饱和运算，避免极端拖拽距离导致溢出。

use serde::{Deserialize, Serialize};

/// 屏幕坐标系下的点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// 轴对齐矩形（左上角 + 宽高）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// 判断点是否落在矩形内（左闭右开，与常见 UI 命中测试一致）。
    ///
    /// 零尺寸矩形不包含任何点。
    pub fn contains(&self, point: Point) -> bool {
        let px = point.x as i64;
        let py = point.y as i64;
        let left = self.x as i64;
        let top = self.y as i64;

        px >= left
            && py >= top
            && px < left + self.width as i64
            && py < top + self.height as i64
    }

    /// 返回平移后的矩形，尺寸不变。
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..*self
        }
    }
}
