use crate::color::Color;
use crate::geometry::{Point, Rect};
use crate::user_data::UserData;

/// Color used for slices without a user data color
pub const DEFAULT_SLICE_COLOR: Color = Color {
    r: 0,
    g: 0,
    b: 255,
    a: 255,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SliceKey {
    /// First frame this key applies to
    pub frame: usize,
    pub bounds: Rect,
    /// Relative to `bounds`
    pub center: Option<Rect>,
    /// Relative to `bounds`
    pub pivot: Option<Point>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Slice {
    pub name: String,
    pub nine_patch: bool,
    pub has_pivot: bool,
    /// Sorted by starting frame
    pub keys: Vec<SliceKey>,
    pub user_data: Option<UserData>,
}

impl Slice {
    pub fn color(&self) -> Color {
        self.user_data
            .as_ref()
            .and_then(|ud| ud.color)
            .unwrap_or(DEFAULT_SLICE_COLOR)
    }

    /// The key in effect on `frame`, if any key starts at or before it
    pub fn key_for_frame(&self, frame: usize) -> Option<&SliceKey> {
        self.keys.iter().rev().find(|key| key.frame <= frame)
    }
}
