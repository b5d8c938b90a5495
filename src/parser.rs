//! Chunk dispatcher that turns the raw file layout into a [`Document`].

use crate::ase_file::{
    self, AsepriteHeader, CelChunk, Chunk, FrameHeader, LayerChunk, PaletteChunk, SliceChunk,
    TagsChunk, TilemapData, TilesetChunk, UserDataChunk,
};
use crate::blend::BlendMode;
use crate::cel::{Cel, CelContent, ImageCel, Tile, TileMasks, TilemapCel};
use crate::color::{self, ColorDepth};
use crate::compression::decompress;
use crate::document::{Document, Frame, Header, HeaderFlags};
use crate::error::{Error, FormatError, Location, Result, Warning};
use crate::geometry::{Point, Rect, Size};
use crate::layer::{Layer, LayerFlags, LayerKind};
use crate::pixel::decode_pixels;
use crate::slice::{Slice, SliceKey};
use crate::tag::{LoopDirection, Tag};
use crate::tileset::Tileset;
use crate::user_data::UserData;
use byteorder::{ByteOrder, LittleEndian};
use parsing::{Cursor, ReadBytes};
use std::cmp::Ordering;
use tracing::{debug, trace, warn};

pub(crate) fn parse(bytes: &[u8]) -> Result<Document> {
    let mut cursor = Cursor::new(bytes);
    let raw: AsepriteHeader = cursor.read_type_le()?;
    let header = read_header(&raw)?;
    debug!(
        frames = header.frame_count,
        width = header.size.width,
        height = header.size.height,
        depth = header.color_depth.bits(),
        "parsing aseprite file"
    );

    let mut parser = Parser::new(header);
    if raw.file_size as usize != bytes.len() {
        parser.warn(Warning::FileSizeMismatch {
            declared: raw.file_size,
            actual: bytes.len(),
        });
    }
    for frame in 0..parser.doc.header.frame_count {
        parser
            .read_frame(&mut cursor, frame)
            .map_err(|err| err.at(Location::frame(frame)))?;
    }
    Ok(parser.finish())
}

fn read_header(raw: &AsepriteHeader) -> std::result::Result<Header, FormatError> {
    if raw.width == 0 || raw.height == 0 {
        return Err(FormatError::InvalidCanvasSize {
            width: raw.width,
            height: raw.height,
        });
    }
    let color_depth = ColorDepth::from_bits(raw.color_depth)?;
    let transparent_index = match color_depth {
        ColorDepth::Indexed => raw.transparent_index,
        _ => 0,
    };
    Ok(Header {
        frame_count: raw.num_frames as usize,
        size: Size::new(raw.width as u32, raw.height as u32),
        color_depth,
        flags: HeaderFlags::from_bits_truncate(raw.flags),
        transparent_index,
        color_count: raw.num_colors,
        pixel_width: raw.pixel_width,
        pixel_height: raw.pixel_height,
        grid: Rect::new(
            raw.grid_x as i32,
            raw.grid_y as i32,
            raw.grid_width as u32,
            raw.grid_height as u32,
        ),
    })
}

/// The entity the next user data chunk belongs to
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum UserDataTarget {
    None,
    Sprite,
    Layer(usize),
    /// Cel index within the current frame
    Cel(usize),
    /// Tags take one user data chunk each, in order
    Tags { next: usize },
    Slice(usize),
    Tileset(usize),
}

struct Parser {
    doc: Document,
    /// Open groups by child level
    open_groups: Vec<usize>,
    user_data_target: UserDataTarget,
    opacity_warned: bool,
}

impl Parser {
    fn new(header: Header) -> Self {
        Self {
            doc: Document::new(header),
            open_groups: Vec::new(),
            user_data_target: UserDataTarget::None,
            opacity_warned: false,
        }
    }

    fn warn(&mut self, warning: Warning) {
        warn!("{warning}");
        self.doc.warnings.push(warning);
    }

    fn finish(mut self) -> Document {
        let declared = match self.doc.header.color_count {
            0 => 256,
            n => n as usize,
        };
        if self.doc.header.color_depth == ColorDepth::Indexed && declared != self.doc.palette.len()
        {
            let actual = self.doc.palette.len();
            self.warn(Warning::PaletteSizeMismatch { declared, actual });
        }
        self.doc
    }

    fn read_frame(&mut self, cursor: &mut Cursor<'_>, frame: usize) -> Result<()> {
        let start = cursor.position();
        let header: FrameHeader = cursor.read_type_le()?;
        let end = start.saturating_add(header.frame_size as usize);
        let num_chunks = header.num_chunks();
        debug!(frame, chunks = num_chunks, duration = header.duration, "reading frame");

        self.doc.frames.push(Frame {
            duration: header.duration,
            cels: Vec::new(),
        });
        self.user_data_target = UserDataTarget::None;

        for chunk in 0..num_chunks {
            self.read_chunk(cursor, frame, chunk)
                .map_err(|err| err.at(Location::chunk(frame, chunk)))?;
        }

        let position = cursor.position();
        match position.cmp(&end) {
            Ordering::Equal => {}
            Ordering::Less => {
                if end > cursor.len() {
                    return Err(Error::from(parsing::Error::UnexpectedEndOfData {
                        wanted: end - position,
                        remaining: cursor.remaining(),
                    }));
                }
                self.warn(Warning::ExtraFrameBytes {
                    frame,
                    bytes: end - position,
                });
                cursor.seek(end)?;
            }
            Ordering::Greater => {
                return Err(FormatError::FrameSizeMismatch {
                    expected_end: end,
                    actual: position,
                }
                .into())
            }
        }
        Ok(())
    }

    fn read_chunk(&mut self, cursor: &mut Cursor<'_>, frame: usize, index: usize) -> Result<()> {
        let start = cursor.position();
        let mut peek = *cursor;
        let size = peek.read_type_le::<ase_file::Dword>()?;
        let chunk_type = peek.read_type_le::<ase_file::Word>()?;
        trace!(frame, chunk = index, chunk_type, size, "reading chunk");

        let chunk = match cursor.read_type_le::<Chunk>() {
            Ok(chunk) => chunk,
            Err(parsing::Error::EnumTypeValueMatchFailed(_)) => {
                self.warn(Warning::UnknownChunk { frame, chunk_type });
                cursor.seek(start.saturating_add(size as usize))?;
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        match chunk {
            Chunk::Layer(layer) => self.add_layer(&layer),
            Chunk::Cel(cel) => self.add_cel(&cel, frame),
            Chunk::Tags(tags) => self.add_tags(&tags),
            Chunk::Palette(palette) => self.apply_palette(&palette, frame),
            Chunk::UserData(user_data) => {
                self.attach_user_data(&user_data, frame, index);
                Ok(())
            }
            Chunk::Slice(slice) => self.add_slice(&slice),
            Chunk::Tileset(tileset) => self.add_tileset(&tileset),
            // these never change which entity user data belongs to
            ignored @ (Chunk::OldPalette1(_)
            | Chunk::OldPalette2(_)
            | Chunk::CelExtra(_)
            | Chunk::ColorProfile(_)
            | Chunk::ExternalFiles(_)
            | Chunk::Mask(_)
            | Chunk::Path(_)) => {
                self.warn(Warning::IgnoredChunk {
                    frame,
                    chunk_type: ignored.chunk_type(),
                });
                Ok(())
            }
        }
    }

    fn add_layer(&mut self, chunk: &LayerChunk<'_>) -> Result<()> {
        let index = self.doc.layers.len();
        let blend_mode = BlendMode::from_u16(chunk.blend_mode)?;
        let kind = match (chunk.layer_type, chunk.tileset_index) {
            (0, _) => LayerKind::Image,
            (1, _) => LayerKind::Group {
                children: Vec::new(),
            },
            (2, Some(tileset)) => LayerKind::Tilemap {
                tileset: self.resolve_tileset(tileset)?,
            },
            (other, _) => return Err(FormatError::UnknownLayerType(other).into()),
        };
        let uuid = self.layer_uuid(chunk.uuid)?;

        let opacity = if self.doc.header.layer_opacity_valid() {
            chunk.opacity
        } else {
            if !self.opacity_warned {
                self.opacity_warned = true;
                self.warn(Warning::LayerOpacityIgnored);
            }
            255
        };

        let level = chunk.child_level as usize;
        self.open_groups.truncate(level);
        let parent = match level {
            0 => None,
            _ => self
                .open_groups
                .get(level - 1)
                .or(self.open_groups.last())
                .copied(),
        };
        if let Some(parent) = parent {
            if let LayerKind::Group { children } = &mut self.doc.layers[parent].kind {
                children.push(index);
            }
        }
        if matches!(kind, LayerKind::Group { .. }) {
            self.open_groups.push(index);
        }

        self.doc.layers.push(Layer {
            name: chunk.name.to_owned(),
            flags: LayerFlags::from_bits_truncate(chunk.flags),
            kind,
            child_level: chunk.child_level,
            parent,
            blend_mode,
            opacity,
            uuid,
            user_data: None,
        });
        self.user_data_target = UserDataTarget::Layer(index);
        Ok(())
    }

    fn resolve_tileset(&self, index: u32) -> Result<usize> {
        self.doc
            .tilesets
            .iter()
            .position(|tileset| tileset.id == index)
            .ok_or_else(|| FormatError::UnresolvedTileset(index as usize).into())
    }

    fn layer_uuid(&self, bytes: &[u8]) -> Result<Option<[u8; 16]>> {
        if self.doc.header.flags.contains(HeaderFlags::LAYER_UUIDS) {
            let uuid = <[u8; 16]>::try_from(bytes)
                .map_err(|_| FormatError::InvalidUuid(bytes.len()))?;
            Ok(Some(uuid))
        } else if !bytes.is_empty() {
            Err(FormatError::ChunkSizeMismatch {
                remaining: bytes.len(),
            }
            .into())
        } else {
            Ok(None)
        }
    }

    fn add_cel(&mut self, chunk: &CelChunk<'_>, frame: usize) -> Result<()> {
        let layer = chunk.layer_index as usize;
        if layer >= self.doc.layers.len() {
            return Err(FormatError::UnresolvedLayer(layer).into());
        }
        let ordinal = self.doc.frames[frame].cels.len();

        let raw = match chunk.content() {
            Ok(raw) => raw,
            Err(parsing::Error::EnumTypeValueMatchFailed(_)) => {
                return Err(FormatError::UnknownCelType(chunk.cel_type).into())
            }
            Err(err) => return Err(err.into()),
        };
        let content = match raw {
            ase_file::CelContent::Raw(image) => {
                CelContent::Image(self.decode_image(image.width, image.height, image.pixels)?)
            }
            ase_file::CelContent::Compressed(image) => {
                let size = Size::new(image.width as u32, image.height as u32);
                let bytes = decompress(
                    image.pixels,
                    size.area() * self.doc.header.color_depth.bytes_per_pixel(),
                )?;
                CelContent::Image(self.decode_image(image.width, image.height, &bytes)?)
            }
            ase_file::CelContent::Linked(link) => {
                self.resolve_link(link.frame as usize, frame, layer, ordinal)?
            }
            ase_file::CelContent::Tilemap(tilemap) => {
                CelContent::Tilemap(self.decode_tilemap(&tilemap, layer)?)
            }
        };

        self.doc.frames[frame].cels.push(Cel {
            layer,
            position: Point::new(chunk.x as i32, chunk.y as i32),
            opacity: chunk.opacity,
            z_index: chunk.z_index,
            content,
            user_data: None,
        });
        self.user_data_target = UserDataTarget::Cel(ordinal);
        Ok(())
    }

    fn decode_image(&self, width: u16, height: u16, bytes: &[u8]) -> Result<ImageCel> {
        let size = Size::new(width as u32, height as u32);
        let pixels = decode_pixels(
            bytes,
            self.doc.header.color_depth,
            &self.doc.palette,
            size.area(),
        )?;
        Ok(ImageCel { size, pixels })
    }

    /// Finds the cel a link points at.
    ///
    /// The cel at the same position in the target frame is used when it is
    /// on the same layer, otherwise the target frame's cel on that layer.
    fn resolve_link(
        &self,
        target_frame: usize,
        current_frame: usize,
        layer: usize,
        ordinal: usize,
    ) -> Result<CelContent> {
        let unresolved = FormatError::UnresolvedLinkedCel {
            frame: target_frame,
            cel: ordinal,
        };
        if target_frame >= current_frame {
            return Err(unresolved.into());
        }
        let cels = &self.doc.frames[target_frame].cels;
        let found = cels
            .get(ordinal)
            .filter(|cel| cel.layer == layer)
            .map(|_| ordinal)
            .or_else(|| cels.iter().position(|cel| cel.layer == layer));
        let Some(cel) = found else {
            return Err(unresolved.into());
        };
        Ok(match cels[cel].content {
            CelContent::Linked { frame, cel } => CelContent::Linked { frame, cel },
            _ => CelContent::Linked {
                frame: target_frame,
                cel,
            },
        })
    }

    fn decode_tilemap(&self, data: &TilemapData<'_>, layer: usize) -> Result<TilemapCel> {
        let Some(tileset) = self.doc.layers[layer].tileset() else {
            return Err(FormatError::TilemapCelOnNonTilemapLayer(layer).into());
        };
        let bytes_per_tile = match data.bits_per_tile {
            8 => 1,
            16 => 2,
            32 => 4,
            other => return Err(FormatError::UnsupportedTileBits(other).into()),
        };
        let size = Size::new(data.width as u32, data.height as u32);
        let expected = size.area() * bytes_per_tile;
        let raw = decompress(data.tiles, expected)?;
        if raw.len() != expected {
            return Err(FormatError::PixelDataSize {
                expected,
                found: raw.len(),
            }
            .into());
        }

        let masks = TileMasks {
            id: data.tile_id_mask,
            flip_x: data.x_flip_mask,
            flip_y: data.y_flip_mask,
            flip_diagonal: data.diagonal_flip_mask,
        };
        let tiles = raw
            .chunks_exact(bytes_per_tile)
            .map(|bytes| {
                let value = match bytes_per_tile {
                    1 => bytes[0] as u32,
                    2 => LittleEndian::read_u16(bytes) as u32,
                    _ => LittleEndian::read_u32(bytes),
                };
                Tile::from_raw(value, &masks)
            })
            .collect();

        Ok(TilemapCel {
            size,
            tile_size: self.doc.tilesets[tileset].tile_size,
            tiles,
        })
    }

    fn add_tags(&mut self, chunk: &TagsChunk<'_>) -> Result<()> {
        let frames = self.doc.header.frame_count;
        let first = self.doc.tags.len();
        for raw in &chunk.tags {
            let direction = LoopDirection::from_u8(raw.direction)?;
            if raw.from > raw.to || raw.to as usize >= frames {
                return Err(FormatError::InvalidTagRange {
                    from: raw.from,
                    to: raw.to,
                    frames,
                }
                .into());
            }
            self.doc.tags.push(Tag {
                name: raw.name.to_owned(),
                from: raw.from as usize,
                to: raw.to as usize,
                direction,
                repeat: raw.repeat,
                color: color::from_rgb(raw.color),
                user_data: None,
            });
        }
        self.user_data_target = UserDataTarget::Tags { next: first };
        Ok(())
    }

    fn apply_palette(&mut self, chunk: &PaletteChunk<'_>, frame: usize) -> Result<()> {
        let new_size = chunk.new_size as usize;
        if new_size > 0 && new_size != self.doc.palette.len() {
            self.doc.palette.resize(new_size);
        }
        for (offset, entry) in chunk.entries.iter().enumerate() {
            let index = chunk.first as usize + offset;
            if index >= self.doc.palette.len() {
                return Err(FormatError::PaletteIndexOutOfRange {
                    index,
                    len: self.doc.palette.len(),
                }
                .into());
            }
            self.doc.palette.set(index, color::from_rgba(entry.rgba));
        }
        self.user_data_target = match frame {
            0 => UserDataTarget::Sprite,
            _ => UserDataTarget::None,
        };
        Ok(())
    }

    fn attach_user_data(&mut self, chunk: &UserDataChunk<'_>, frame: usize, index: usize) {
        if chunk.has_properties() {
            self.warn(Warning::UserDataPropertiesSkipped {
                frame,
                chunk: index,
            });
        }
        let user_data = Some(UserData::from(chunk));

        let target = std::mem::replace(&mut self.user_data_target, UserDataTarget::None);
        match target {
            UserDataTarget::None => self.warn(Warning::UnattachedUserData {
                frame,
                chunk: index,
            }),
            UserDataTarget::Sprite => self.doc.user_data = user_data,
            UserDataTarget::Layer(layer) => self.doc.layers[layer].user_data = user_data,
            UserDataTarget::Cel(cel) => self.doc.frames[frame].cels[cel].user_data = user_data,
            UserDataTarget::Tags { next } => match self.doc.tags.get_mut(next) {
                Some(tag) => {
                    tag.user_data = user_data;
                    if next + 1 < self.doc.tags.len() {
                        self.user_data_target = UserDataTarget::Tags { next: next + 1 };
                    }
                }
                None => self.warn(Warning::UnattachedUserData {
                    frame,
                    chunk: index,
                }),
            },
            UserDataTarget::Slice(slice) => self.doc.slices[slice].user_data = user_data,
            UserDataTarget::Tileset(tileset) => self.doc.tilesets[tileset].user_data = user_data,
        }
    }

    fn add_slice(&mut self, chunk: &SliceChunk<'_>) -> Result<()> {
        let mut keys: Vec<SliceKey> = chunk
            .keys()?
            .into_iter()
            .map(|key| SliceKey {
                frame: key.frame as usize,
                bounds: key.bounds,
                center: key.center,
                pivot: key.pivot,
            })
            .collect();
        keys.sort_by_key(|key| key.frame);

        let index = self.doc.slices.len();
        self.doc.slices.push(Slice {
            name: chunk.name.to_owned(),
            nine_patch: chunk.is_nine_patch(),
            has_pivot: chunk.has_pivot(),
            keys,
            user_data: None,
        });
        self.user_data_target = UserDataTarget::Slice(index);
        Ok(())
    }

    fn add_tileset(&mut self, chunk: &TilesetChunk<'_>) -> Result<()> {
        if chunk.external.is_some() {
            return Err(FormatError::ExternalTilesetUnsupported.into());
        }
        let tile_size = Size::new(chunk.tile_width as u32, chunk.tile_height as u32);
        let pixels = match &chunk.embedded {
            Some(embedded) => {
                let depth = self.doc.header.color_depth;
                let too_large = || FormatError::TilesetTooLarge {
                    tiles: chunk.num_tiles,
                    tile_width: chunk.tile_width,
                    tile_height: chunk.tile_height,
                };
                let count = tile_size
                    .area()
                    .checked_mul(chunk.num_tiles as usize)
                    .ok_or_else(too_large)?;
                let len = count
                    .checked_mul(depth.bytes_per_pixel())
                    .ok_or_else(too_large)?;
                let bytes = decompress(embedded.data, len)?;
                decode_pixels(&bytes, depth, &self.doc.palette, count)?
            }
            None => {
                self.warn(Warning::TilesetWithoutPixels { id: chunk.id });
                Vec::new()
            }
        };

        let index = self.doc.tilesets.len();
        self.doc.tilesets.push(Tileset {
            id: chunk.id,
            name: chunk.name.to_owned(),
            tile_count: chunk.num_tiles,
            tile_size,
            base_index: chunk.base_index,
            empty_tile_zero: chunk.flags & ase_file::TILESET_EMPTY_TILE_ZERO != 0,
            pixels,
            user_data: None,
        });
        self.user_data_target = UserDataTarget::Tileset(index);
        Ok(())
    }
}
