use parsing::Parse;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Parse, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Parse, Serialize, Deserialize)]
pub struct Size {
    #[serde(rename = "w")]
    pub width: u32,
    #[serde(rename = "h")]
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// An axis aligned rectangle, stored on disk as origin then size.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Parse, Serialize, Deserialize)]
pub struct Rect {
    #[serde(flatten)]
    pub origin: Point,
    #[serde(flatten)]
    pub size: Size,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn x(&self) -> i32 {
        self.origin.x
    }

    pub fn y(&self) -> i32 {
        self.origin.y
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use parsing::ReadBytes;

    #[test]
    fn rect_parses_origin_then_size() {
        let mut bytes = Vec::new();
        for v in [-2_i32, 3] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        for v in [10_u32, 20] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let mut b = bytes.as_slice();
        let r: Rect = b.read_type_le().unwrap();
        assert_eq!(r, Rect::new(-2, 3, 10, 20));
        assert!(b.is_empty());
    }

    #[test]
    fn rect_serializes_flat() {
        let json = serde_json::to_value(Rect::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, serde_json::json!({"x": 1, "y": 2, "w": 3, "h": 4}));
    }
}
