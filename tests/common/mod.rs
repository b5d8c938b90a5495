//! Builds small `.aseprite` files in memory

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::{write::ZlibEncoder, Compression};
use std::io::Write;

pub const RGBA: u16 = 32;
pub const GRAYSCALE: u16 = 16;
pub const INDEXED: u16 = 8;

pub const VISIBLE: u16 = 1;
pub const BACKGROUND: u16 = 8;

pub const TILE_ID_MASK: u32 = 0x1fff_ffff;
pub const TILE_FLIP_X: u32 = 0x2000_0000;
pub const TILE_FLIP_Y: u32 = 0x4000_0000;
pub const TILE_FLIP_DIAGONAL: u32 = 0x8000_0000;

pub struct AseFile {
    width: u16,
    height: u16,
    depth: u16,
    flags: u32,
    transparent_index: u8,
    num_colors: u16,
    frames: Vec<Frame>,
}

impl AseFile {
    pub fn new(width: u16, height: u16, depth: u16) -> Self {
        Self {
            width,
            height,
            depth,
            flags: 1,
            transparent_index: 0,
            num_colors: 0,
            frames: Vec::new(),
        }
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn transparent_index(mut self, index: u8) -> Self {
        self.transparent_index = index;
        self
    }

    pub fn num_colors(mut self, count: u16) -> Self {
        self.num_colors = count;
        self
    }

    pub fn frame(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let frames: Vec<u8> = self.frames.iter().flat_map(Frame::build).collect();
        let mut out = Vec::new();
        out.write_u32::<LittleEndian>((128 + frames.len()) as u32)
            .unwrap();
        out.write_u16::<LittleEndian>(0xA5E0).unwrap();
        out.write_u16::<LittleEndian>(self.frames.len() as u16)
            .unwrap();
        out.write_u16::<LittleEndian>(self.width).unwrap();
        out.write_u16::<LittleEndian>(self.height).unwrap();
        out.write_u16::<LittleEndian>(self.depth).unwrap();
        out.write_u32::<LittleEndian>(self.flags).unwrap();
        out.write_u16::<LittleEndian>(100).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u8(self.transparent_index).unwrap();
        out.write_all(&[0; 3]).unwrap();
        out.write_u16::<LittleEndian>(self.num_colors).unwrap();
        out.write_u8(1).unwrap();
        out.write_u8(1).unwrap();
        out.write_i16::<LittleEndian>(0).unwrap();
        out.write_i16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(16).unwrap();
        out.write_u16::<LittleEndian>(16).unwrap();
        out.write_all(&[0; 84]).unwrap();
        assert_eq!(out.len(), 128);
        out.extend_from_slice(&frames);
        out
    }
}

pub struct Frame {
    duration: u16,
    chunks: Vec<Vec<u8>>,
    trailing: usize,
}

impl Frame {
    pub fn new(duration: u16) -> Self {
        Self {
            duration,
            chunks: Vec::new(),
            trailing: 0,
        }
    }

    pub fn chunk(mut self, chunk: Vec<u8>) -> Self {
        self.chunks.push(chunk);
        self
    }

    /// Unused bytes counted in the frame size
    pub fn trailing(mut self, bytes: usize) -> Self {
        self.trailing = bytes;
        self
    }

    fn build(&self) -> Vec<u8> {
        let body: Vec<u8> = self.chunks.concat();
        let mut out = Vec::new();
        out.write_u32::<LittleEndian>((16 + body.len() + self.trailing) as u32)
            .unwrap();
        out.write_u16::<LittleEndian>(0xF1FA).unwrap();
        out.write_u16::<LittleEndian>(self.chunks.len() as u16)
            .unwrap();
        out.write_u16::<LittleEndian>(self.duration).unwrap();
        out.write_all(&[0; 2]).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.extend_from_slice(&body);
        out.extend(std::iter::repeat(0).take(self.trailing));
        out
    }
}

pub fn chunk(chunk_type: u16, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u32::<LittleEndian>((body.len() + 6) as u32)
        .unwrap();
    out.write_u16::<LittleEndian>(chunk_type).unwrap();
    out.extend_from_slice(body);
    out
}

pub fn string(out: &mut Vec<u8>, s: &str) {
    out.write_u16::<LittleEndian>(s.len() as u16).unwrap();
    out.extend_from_slice(s.as_bytes());
}

pub fn zlib(bytes: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(bytes).unwrap();
    enc.finish().unwrap()
}

fn layer_body(flags: u16, layer_type: u16, child_level: u16, opacity: u8, name: &str) -> Vec<u8> {
    let mut body = Vec::new();
    for v in [flags, layer_type, child_level, 0, 0, 0] {
        body.write_u16::<LittleEndian>(v).unwrap();
    }
    body.write_u8(opacity).unwrap();
    body.write_all(&[0; 3]).unwrap();
    string(&mut body, name);
    body
}

pub fn layer(name: &str, flags: u16, child_level: u16) -> Vec<u8> {
    chunk(0x2004, &layer_body(flags, 0, child_level, 255, name))
}

pub fn layer_with_opacity(name: &str, opacity: u8) -> Vec<u8> {
    chunk(0x2004, &layer_body(VISIBLE, 0, 0, opacity, name))
}

pub fn group(name: &str, flags: u16, child_level: u16) -> Vec<u8> {
    chunk(0x2004, &layer_body(flags, 1, child_level, 255, name))
}

pub fn tilemap_layer(name: &str, tileset_id: u32) -> Vec<u8> {
    let mut body = layer_body(VISIBLE, 2, 0, 255, name);
    body.write_u32::<LittleEndian>(tileset_id).unwrap();
    chunk(0x2004, &body)
}

pub fn layer_with_uuid(name: &str, uuid: &[u8]) -> Vec<u8> {
    let mut body = layer_body(VISIBLE, 0, 0, 255, name);
    body.extend_from_slice(uuid);
    chunk(0x2004, &body)
}

fn cel_body(layer: u16, x: i16, y: i16, cel_type: u16) -> Vec<u8> {
    let mut body = Vec::new();
    body.write_u16::<LittleEndian>(layer).unwrap();
    body.write_i16::<LittleEndian>(x).unwrap();
    body.write_i16::<LittleEndian>(y).unwrap();
    body.write_u8(255).unwrap();
    body.write_u16::<LittleEndian>(cel_type).unwrap();
    body.write_i16::<LittleEndian>(0).unwrap();
    body.write_all(&[0; 5]).unwrap();
    body
}

pub fn raw_cel(layer: u16, x: i16, y: i16, width: u16, height: u16, pixels: &[u8]) -> Vec<u8> {
    let mut body = cel_body(layer, x, y, 0);
    body.write_u16::<LittleEndian>(width).unwrap();
    body.write_u16::<LittleEndian>(height).unwrap();
    body.extend_from_slice(pixels);
    chunk(0x2005, &body)
}

pub fn compressed_cel(
    layer: u16,
    x: i16,
    y: i16,
    width: u16,
    height: u16,
    pixels: &[u8],
) -> Vec<u8> {
    let mut body = cel_body(layer, x, y, 2);
    body.write_u16::<LittleEndian>(width).unwrap();
    body.write_u16::<LittleEndian>(height).unwrap();
    body.extend_from_slice(&zlib(pixels));
    chunk(0x2005, &body)
}

pub fn linked_cel(layer: u16, frame: u16) -> Vec<u8> {
    let mut body = cel_body(layer, 0, 0, 1);
    body.write_u16::<LittleEndian>(frame).unwrap();
    chunk(0x2005, &body)
}

/// 32 bit tiles with the usual masks
pub fn tilemap_cel(layer: u16, width: u16, height: u16, tiles: &[u32]) -> Vec<u8> {
    let mut body = cel_body(layer, 0, 0, 3);
    for v in [width, height, 32] {
        body.write_u16::<LittleEndian>(v).unwrap();
    }
    for mask in [TILE_ID_MASK, TILE_FLIP_X, TILE_FLIP_Y, TILE_FLIP_DIAGONAL] {
        body.write_u32::<LittleEndian>(mask).unwrap();
    }
    body.write_all(&[0; 10]).unwrap();
    let mut raw = Vec::new();
    for &tile in tiles {
        raw.write_u32::<LittleEndian>(tile).unwrap();
    }
    body.extend_from_slice(&zlib(&raw));
    chunk(0x2005, &body)
}

pub fn palette(new_size: u32, first: u32, colors: &[[u8; 4]]) -> Vec<u8> {
    let mut body = Vec::new();
    body.write_u32::<LittleEndian>(new_size).unwrap();
    body.write_u32::<LittleEndian>(first).unwrap();
    body.write_u32::<LittleEndian>(first + colors.len() as u32 - 1)
        .unwrap();
    body.write_all(&[0; 8]).unwrap();
    for rgba in colors {
        body.write_u16::<LittleEndian>(0).unwrap();
        body.write_all(rgba).unwrap();
    }
    chunk(0x2019, &body)
}

/// `(from, to, direction, color, name)`
pub fn tags(tags: &[(u16, u16, u8, [u8; 3], &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    body.write_u16::<LittleEndian>(tags.len() as u16).unwrap();
    body.write_all(&[0; 8]).unwrap();
    for &(from, to, direction, color, name) in tags {
        body.write_u16::<LittleEndian>(from).unwrap();
        body.write_u16::<LittleEndian>(to).unwrap();
        body.write_u8(direction).unwrap();
        body.write_u16::<LittleEndian>(0).unwrap();
        body.write_all(&[0; 6]).unwrap();
        body.write_all(&color).unwrap();
        body.write_u8(0).unwrap();
        string(&mut body, name);
    }
    chunk(0x2018, &body)
}

pub fn user_data(text: Option<&str>, color: Option<[u8; 4]>) -> Vec<u8> {
    let flags = text.map_or(0, |_| 1) | color.map_or(0, |_| 2);
    let mut body = Vec::new();
    body.write_u32::<LittleEndian>(flags).unwrap();
    if let Some(text) = text {
        string(&mut body, text);
    }
    if let Some(color) = color {
        body.write_all(&color).unwrap();
    }
    chunk(0x2020, &body)
}

/// Plain slice keys: `(frame, x, y, width, height)`
pub fn slice(name: &str, keys: &[(u32, i32, i32, u32, u32)]) -> Vec<u8> {
    let mut body = Vec::new();
    body.write_u32::<LittleEndian>(keys.len() as u32).unwrap();
    body.write_u32::<LittleEndian>(0).unwrap();
    body.write_u32::<LittleEndian>(0).unwrap();
    string(&mut body, name);
    for &(frame, x, y, w, h) in keys {
        body.write_u32::<LittleEndian>(frame).unwrap();
        body.write_i32::<LittleEndian>(x).unwrap();
        body.write_i32::<LittleEndian>(y).unwrap();
        body.write_u32::<LittleEndian>(w).unwrap();
        body.write_u32::<LittleEndian>(h).unwrap();
    }
    chunk(0x2022, &body)
}

fn tileset_head(id: u32, flags: u32, num_tiles: u32, tile_w: u16, tile_h: u16) -> Vec<u8> {
    let mut body = Vec::new();
    body.write_u32::<LittleEndian>(id).unwrap();
    body.write_u32::<LittleEndian>(flags).unwrap();
    body.write_u32::<LittleEndian>(num_tiles).unwrap();
    body.write_u16::<LittleEndian>(tile_w).unwrap();
    body.write_u16::<LittleEndian>(tile_h).unwrap();
    body.write_i16::<LittleEndian>(1).unwrap();
    body.write_all(&[0; 14]).unwrap();
    string(&mut body, "tiles");
    body
}

/// Embedded tileset with tile 0 empty. `pixels` holds every tile, top to bottom.
pub fn tileset(id: u32, num_tiles: u32, tile_w: u16, tile_h: u16, pixels: &[u8]) -> Vec<u8> {
    let mut body = tileset_head(id, 2 | 4, num_tiles, tile_w, tile_h);
    let data = zlib(pixels);
    body.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    body.extend_from_slice(&data);
    chunk(0x2023, &body)
}

pub fn external_tileset(id: u32) -> Vec<u8> {
    let mut body = tileset_head(id, 1, 1, 8, 8);
    body.write_u32::<LittleEndian>(0).unwrap();
    body.write_u32::<LittleEndian>(0).unwrap();
    chunk(0x2023, &body)
}

pub const RED: [u8; 4] = [255, 0, 0, 255];
pub const GREEN: [u8; 4] = [0, 255, 0, 255];
pub const BLUE: [u8; 4] = [0, 0, 255, 255];
pub const CLEAR: [u8; 4] = [0, 0, 0, 0];

pub fn rgba(pixels: &[[u8; 4]]) -> Vec<u8> {
    pixels.concat()
}
