//! Reads Aseprite (`.ase`/`.aseprite`) files into a [`Document`] and packs
//! their flattened frames into spritesheets.
//!
//! ```no_run
//! use aseprite_sheet::{pack_spritesheet, Document, SheetOptions};
//!
//! let doc = Document::read_file("walk.aseprite")?;
//! let sheet = pack_spritesheet(&doc, &SheetOptions::default());
//! println!("{}x{}", sheet.size.width, sheet.size.height);
//! # Ok::<(), aseprite_sheet::Error>(())
//! ```

pub mod ase_file;
pub mod blend;
pub mod cel;
pub mod color;
pub mod compositor;
pub mod compression;
pub mod document;
pub mod error;
pub mod geometry;
pub mod layer;
pub mod options;
pub mod palette;
mod parser;
pub mod pixel;
pub mod slice;
pub mod spritesheet;
pub mod tag;
pub mod tileset;
pub mod user_data;

pub use blend::BlendMode;
pub use cel::{Cel, CelContent, ImageCel, Tile, TilemapCel};
pub use color::{Color, ColorDepth, TRANSPARENT};
pub use document::{Document, Frame, Header, HeaderFlags};
pub use error::{Error, FormatError, Location, Result, Warning};
pub use geometry::{Point, Rect, Size};
pub use layer::{Layer, LayerFlags, LayerKind};
pub use options::{ConfigError, FlattenOptions, SheetOptions};
pub use palette::Palette;
pub use slice::{Slice, SliceKey};
pub use spritesheet::{pack_spritesheet, pack_tileset, Spritesheet, TilesetSheet};
pub use tag::{LoopDirection, Tag};
pub use tileset::Tileset;
pub use user_data::UserData;
