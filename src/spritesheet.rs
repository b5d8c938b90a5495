//! Spritesheet packing - flattened frames laid out on a near square grid

use crate::color::{Color, TRANSPARENT};
use crate::document::Document;
use crate::geometry::{Point, Rect, Size};
use crate::options::SheetOptions;
use crate::tag::{LoopDirection, Tag};
use crate::tileset::Tileset;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

/// Cell placement for `count` equally sized images.
///
/// `columns = ceil(sqrt(count))`, `rows = ceil(count / columns)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    cell: Size,
    border_padding: u32,
    spacing: u32,
    inner_padding: u32,
}

impl GridLayout {
    pub fn new(count: usize, cell: Size, options: &SheetOptions) -> Self {
        let count = count as u64;
        let mut columns = 0_u64;
        while columns * columns < count {
            columns += 1;
        }
        let rows = if columns == 0 {
            0
        } else {
            count.div_ceil(columns)
        };
        Self {
            columns: columns as u32,
            rows: rows as u32,
            cell,
            border_padding: options.border_padding,
            spacing: options.spacing,
            inner_padding: options.inner_padding,
        }
    }

    /// Saturates instead of wrapping on oversized padding
    fn extent(&self, cells: u32, cell: u32) -> u32 {
        cells
            .saturating_mul(cell)
            .saturating_add(self.border_padding.saturating_mul(2))
            .saturating_add(self.spacing.saturating_mul(cells.saturating_sub(1)))
            .saturating_add(self.inner_padding.saturating_mul(2).saturating_mul(cells))
    }

    fn offset(&self, index: u32, cell: u32) -> u32 {
        index
            .saturating_mul(cell)
            .saturating_add(self.border_padding)
            .saturating_add(self.spacing.saturating_mul(index))
            .saturating_add(
                self.inner_padding
                    .saturating_mul(index.saturating_mul(2).saturating_add(1)),
            )
    }

    /// Size of the whole sheet
    pub fn size(&self) -> Size {
        Size::new(
            self.extent(self.columns, self.cell.width),
            self.extent(self.rows, self.cell.height),
        )
    }

    /// Top left corner of the image in the `index`th cell, row major
    pub fn cell_origin(&self, index: usize) -> Point {
        let columns = self.columns.max(1);
        let col = index as u32 % columns;
        let row = index as u32 / columns;
        Point::new(
            self.offset(col, self.cell.width) as i32,
            self.offset(row, self.cell.height) as i32,
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct SheetFrame {
    /// Frame index in the document
    pub index: usize,
    pub source: Rect,
    pub duration: u16,
    /// Earlier frame with identical pixels whose rectangle is reused
    pub duplicate_of: Option<usize>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct SheetTag {
    pub name: String,
    pub from: usize,
    pub to: usize,
    pub direction: LoopDirection,
    pub repeat: u16,
    pub color: Color,
}

impl From<&Tag> for SheetTag {
    fn from(tag: &Tag) -> Self {
        Self {
            name: tag.name.clone(),
            from: tag.from,
            to: tag.to,
            direction: tag.direction,
            repeat: tag.repeat,
            color: tag.display_color(),
        }
    }
}

/// A slice as it applies to a single frame
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct SheetSlice {
    pub name: String,
    pub frame: usize,
    pub bounds: Rect,
    pub center: Option<Rect>,
    pub pivot: Option<Point>,
    pub color: Color,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Spritesheet {
    pub size: Size,
    #[serde(skip)]
    pub pixels: Vec<Color>,
    /// One entry per document frame, duplicates included
    pub frames: Vec<SheetFrame>,
    pub tags: Vec<SheetTag>,
    pub slices: Vec<SheetSlice>,
}

impl Spritesheet {
    /// The packed frames an animation tag covers
    pub fn tag_frames(&self, tag: &SheetTag) -> &[SheetFrame] {
        &self.frames[tag.from..=tag.to]
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct SheetTile {
    pub index: usize,
    pub source: Rect,
    pub duplicate_of: Option<usize>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct TilesetSheet {
    pub name: String,
    pub tile_size: Size,
    pub size: Size,
    #[serde(skip)]
    pub pixels: Vec<Color>,
    pub tiles: Vec<SheetTile>,
}

pub fn pack_spritesheet(doc: &Document, options: &SheetOptions) -> Spritesheet {
    let frame_size = doc.size();
    let images: Vec<Vec<Color>> = (0..doc.frames().len())
        .into_par_iter()
        .map(|frame| doc.flatten_frame(frame, &options.layers))
        .collect();

    let atlas = pack_cells(&images, frame_size, options);
    debug!(
        frames = images.len(),
        width = atlas.size.width,
        height = atlas.size.height,
        "packed spritesheet"
    );

    let frames = atlas
        .cells
        .iter()
        .enumerate()
        .map(|(index, cell)| SheetFrame {
            index,
            source: cell.source,
            duration: doc.frame(index).duration,
            duplicate_of: cell.duplicate_of,
        })
        .collect();

    Spritesheet {
        size: atlas.size,
        pixels: atlas.pixels,
        frames,
        tags: doc.tags().iter().map(SheetTag::from).collect(),
        slices: interpolate_slices(doc),
    }
}

/// Packs the tiles of a tileset with the same grid rules as frames
pub fn pack_tileset(tileset: &Tileset, options: &SheetOptions) -> TilesetSheet {
    let images: Vec<&[Color]> = (0..tileset.tile_count)
        .map_while(|tile| tileset.tile_pixels(tile))
        .collect();
    let atlas = pack_cells(&images, tileset.tile_size, options);

    TilesetSheet {
        name: tileset.name.clone(),
        tile_size: tileset.tile_size,
        size: atlas.size,
        pixels: atlas.pixels,
        tiles: atlas
            .cells
            .iter()
            .enumerate()
            .map(|(index, cell)| SheetTile {
                index,
                source: cell.source,
                duplicate_of: cell.duplicate_of,
            })
            .collect(),
    }
}

/// One record per frame, each key held until the next key starts
fn interpolate_slices(doc: &Document) -> Vec<SheetSlice> {
    let frame_count = doc.frames().len();
    let mut out = Vec::new();
    for slice in doc.slices() {
        let color = slice.color();
        for (i, key) in slice.keys.iter().enumerate() {
            let end = slice
                .keys
                .get(i + 1)
                .map_or(frame_count, |next| next.frame)
                .min(frame_count);
            for frame in key.frame..end {
                out.push(SheetSlice {
                    name: slice.name.clone(),
                    frame,
                    bounds: key.bounds,
                    center: key.center,
                    pivot: key.pivot,
                    color,
                });
            }
        }
    }
    out
}

struct PackedCell {
    source: Rect,
    duplicate_of: Option<usize>,
}

struct Atlas {
    size: Size,
    pixels: Vec<Color>,
    cells: Vec<PackedCell>,
}

fn pack_cells<T: AsRef<[Color]>>(images: &[T], cell: Size, options: &SheetOptions) -> Atlas {
    let duplicates = if options.merge_duplicates {
        find_duplicates(images)
    } else {
        vec![None; images.len()]
    };
    let unique: Vec<usize> = (0..images.len())
        .filter(|&i| duplicates[i].is_none())
        .collect();

    let layout = GridLayout::new(unique.len(), cell, options);
    let size = layout.size();
    let mut pixels = vec![TRANSPARENT; size.area()];
    let mut sources = vec![Rect::default(); images.len()];
    for (slot, &image) in unique.iter().enumerate() {
        let origin = layout.cell_origin(slot);
        blit(&mut pixels, size, images[image].as_ref(), cell, origin);
        sources[image] = Rect { origin, size: cell };
    }

    let cells = duplicates
        .iter()
        .enumerate()
        .map(|(i, &duplicate_of)| PackedCell {
            source: sources[duplicate_of.unwrap_or(i)],
            duplicate_of,
        })
        .collect();
    Atlas {
        size,
        pixels,
        cells,
    }
}

/// For each image, the first earlier image with identical pixels
fn find_duplicates<T: AsRef<[Color]>>(images: &[T]) -> Vec<Option<usize>> {
    let mut out: Vec<Option<usize>> = Vec::with_capacity(images.len());
    for (i, image) in images.iter().enumerate() {
        let original = (0..i)
            .filter(|&j| out[j].is_none())
            .find(|&j| images[j].as_ref() == image.as_ref());
        out.push(original);
    }
    out
}

fn blit(dst: &mut [Color], dst_size: Size, src: &[Color], src_size: Size, origin: Point) {
    let width = src_size.width as usize;
    let (x, y) = (origin.x as usize, origin.y as usize);
    for (row, line) in src.chunks_exact(width.max(1)).enumerate() {
        let start = (y + row) * dst_size.width as usize + x;
        dst[start..start + line.len()].copy_from_slice(line);
    }
}
