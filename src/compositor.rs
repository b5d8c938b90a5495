//! Frame flattening.
//!
//! Cels are drawn in declaration order, each one blended over what is
//! already on the canvas with its layer's blend mode.

use crate::blend::{blend, mul_un8, BlendMode};
use crate::cel::{CelContent, ImageCel, Tile, TilemapCel};
use crate::color::{Color, TRANSPARENT};
use crate::document::Document;
use crate::geometry::{Point, Size};
use crate::options::FlattenOptions;
use crate::tileset::Tileset;

pub fn flatten_frame(doc: &Document, frame: usize, options: &FlattenOptions) -> Vec<Color> {
    let size = doc.size();
    let mut canvas = Canvas {
        size,
        pixels: vec![TRANSPARENT; size.area()],
    };

    for (index, cel) in doc.frame(frame).cels.iter().enumerate() {
        if !is_drawn(doc, cel.layer, options) {
            continue;
        }
        let layer = doc.layer(cel.layer);
        let source = doc.resolve_cel(frame, index);
        let opacity = mul_un8(source.opacity, layer.opacity);
        let paint = Paint {
            opacity,
            mode: layer.blend_mode,
        };

        match &source.content {
            CelContent::Image(image) => canvas.draw_image(image, source.position, paint),
            CelContent::Tilemap(tilemap) if options.include_tilemap_cels => {
                if let Some(tileset) = layer.tileset() {
                    canvas.draw_tilemap(tilemap, doc.tileset(tileset), source.position, paint);
                }
            }
            CelContent::Tilemap(_) | CelContent::Linked { .. } => {}
        }
    }
    canvas.pixels
}

fn is_drawn(doc: &Document, layer_index: usize, options: &FlattenOptions) -> bool {
    let layer = doc.layer(layer_index);
    if layer.is_reference() {
        return false;
    }
    if layer.is_background() && !options.include_background_layer {
        return false;
    }
    !options.only_visible_layers || doc.is_layer_visible(layer_index)
}

#[derive(Clone, Copy)]
struct Paint {
    opacity: u8,
    mode: BlendMode,
}

struct Canvas {
    size: Size,
    pixels: Vec<Color>,
}

impl Canvas {
    /// Out of bounds destinations are dropped
    fn put(&mut self, x: i64, y: i64, color: Color, paint: Paint) {
        if x < 0 || y < 0 || x >= self.size.width as i64 || y >= self.size.height as i64 {
            return;
        }
        let dst = &mut self.pixels[y as usize * self.size.width as usize + x as usize];
        *dst = blend(*dst, color, paint.opacity, paint.mode);
    }

    fn draw_image(&mut self, image: &ImageCel, origin: Point, paint: Paint) {
        for y in 0..image.size.height {
            for x in 0..image.size.width {
                self.put(
                    origin.x as i64 + x as i64,
                    origin.y as i64 + y as i64,
                    image.pixel(x, y),
                    paint,
                );
            }
        }
    }

    fn draw_tilemap(&mut self, tilemap: &TilemapCel, tileset: &Tileset, origin: Point, paint: Paint) {
        let tile_size = tileset.tile_size;
        for ty in 0..tilemap.size.height {
            for tx in 0..tilemap.size.width {
                let tile = tilemap.tile(tx, ty);
                if tile.id == 0 && tileset.empty_tile_zero {
                    continue;
                }
                let Some(pixels) = tileset.tile_pixels(tile.id) else {
                    continue;
                };
                let left = origin.x as i64 + (tx * tile_size.width) as i64;
                let top = origin.y as i64 + (ty * tile_size.height) as i64;
                for v in 0..tile_size.height {
                    for u in 0..tile_size.width {
                        let (sx, sy) = tile_source(tile, u, v, tile_size);
                        let color = pixels[(sy * tile_size.width + sx) as usize];
                        self.put(left + u as i64, top + v as i64, color, paint);
                    }
                }
            }
        }
    }
}

/// Maps a pixel of a placed tile back to the tileset image.
/// The diagonal flip applies to square tiles only.
fn tile_source(tile: Tile, u: u32, v: u32, size: Size) -> (u32, u32) {
    let mut sx = if tile.flip_x { size.width - 1 - u } else { u };
    let mut sy = if tile.flip_y { size.height - 1 - v } else { v };
    if tile.flip_diagonal && size.width == size.height {
        std::mem::swap(&mut sx, &mut sy);
    }
    (sx, sy)
}
