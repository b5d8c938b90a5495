use crate::color::Color;
use crate::geometry::Size;
use crate::user_data::UserData;

/// Tiles stored as one vertical strip, `tile_count` tiles high
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Tileset {
    pub id: u32,
    pub name: String,
    pub tile_count: u32,
    pub tile_size: Size,
    /// First tile number shown in the editor
    pub base_index: i16,
    pub empty_tile_zero: bool,
    pub pixels: Vec<Color>,
    pub user_data: Option<UserData>,
}

impl Tileset {
    pub fn strip_size(&self) -> Size {
        Size::new(
            self.tile_size.width,
            self.tile_size.height * self.tile_count,
        )
    }

    /// Pixels of one tile, row major. `None` past the end of the strip.
    pub fn tile_pixels(&self, index: u32) -> Option<&[Color]> {
        let area = self.tile_size.area();
        let start = (index as usize).checked_mul(area)?;
        self.pixels.get(start..start.checked_add(area)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tiles_are_stacked() {
        let pixels: Vec<Color> = (0..8).map(|v| Color::new(v, 0, 0, 255)).collect();
        let ts = Tileset {
            id: 0,
            name: "t".into(),
            tile_count: 2,
            tile_size: Size::new(2, 2),
            base_index: 1,
            empty_tile_zero: false,
            pixels,
            user_data: None,
        };
        assert_eq!(ts.strip_size(), Size::new(2, 4));
        assert_eq!(ts.tile_pixels(1).map(|p| p[0].r), Some(4));
        assert_eq!(ts.tile_pixels(2), None);
    }
}
