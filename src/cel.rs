use crate::color::Color;
use crate::geometry::{Point, Size};
use crate::user_data::UserData;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Cel {
    pub layer: usize,
    /// Top left corner on the canvas, may be negative
    pub position: Point,
    pub opacity: u8,
    pub z_index: i16,
    pub content: CelContent,
    pub user_data: Option<UserData>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CelContent {
    Image(ImageCel),
    Tilemap(TilemapCel),
    /// Alias of the cel at `cels[cel]` of frame `frame`. The target is
    /// never itself a link.
    Linked { frame: usize, cel: usize },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ImageCel {
    pub size: Size,
    pub pixels: Vec<Color>,
}

impl ImageCel {
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.size.width + x) as usize]
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TilemapCel {
    /// Measured in tiles
    pub size: Size,
    pub tile_size: Size,
    pub tiles: Vec<Tile>,
}

impl TilemapCel {
    pub fn tile(&self, x: u32, y: u32) -> Tile {
        self.tiles[(y * self.size.width + x) as usize]
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Tile {
    pub id: u32,
    pub flip_x: bool,
    pub flip_y: bool,
    /// Swap of the x and y axes
    pub flip_diagonal: bool,
}

/// Bit masks a tilemap cel declares for its tile records
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TileMasks {
    pub id: u32,
    pub flip_x: u32,
    pub flip_y: u32,
    pub flip_diagonal: u32,
}

impl Tile {
    pub fn from_raw(raw: u32, masks: &TileMasks) -> Self {
        Self {
            id: raw & masks.id,
            flip_x: raw & masks.flip_x != 0,
            flip_y: raw & masks.flip_y != 0,
            flip_diagonal: raw & masks.flip_diagonal != 0,
        }
    }
}
