//! Raw on-disk layout of `.aseprite` files.
//!
//! Everything here is a borrowed view of the input bytes. Interpretation
//! (palette lookups, decompression, reference resolution) happens in
//! [`crate::parser`].

use crate::geometry::{Point, Rect};
use parsing::ReadBytes;

pub type Byte = u8;
pub type Word = u16;
pub type Short = i16;
pub type Dword = u32;

pub const HEADER_SIZE: usize = 128;
pub const CHUNK_HEADER_SIZE: usize = 6;

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct AsepriteHeader {
        pub file_size: Dword,
        [[magic: Word = 0xA5E0]]
        pub num_frames: Word,
        pub width: Word,
        pub height: Word,
        /// 32=RGBA, 16=Grayscale, 8=Indexed
        pub color_depth: Word,
        pub flags: Dword,
        /// Deprecated, now on each frame
        pub speed: Word,
        [[ignore: Dword]]
        [[ignore: Dword]]
        pub transparent_index: Byte,
        [[padding_bytes = 3]]
        /// 0 means 256 for old sprites
        pub num_colors: Word,
        pub pixel_width: Byte,
        pub pixel_height: Byte,
        pub grid_x: Short,
        pub grid_y: Short,
        pub grid_width: Word,
        pub grid_height: Word,
        [[padding_bytes = 84]]
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct FrameHeader {
        pub frame_size: Dword,
        [[magic: Word = 0xF1FA]]
        old_num_chunks: Word,
        pub duration: Word,
        [[padding_bytes = 2]]
        new_num_chunks: Dword,
    }
}

impl FrameHeader {
    pub fn num_chunks(&self) -> usize {
        if self.old_num_chunks == 0xFFFF && self.new_num_chunks > self.old_num_chunks as Dword {
            self.new_num_chunks as usize
        } else {
            self.old_num_chunks as usize
        }
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct RestOfBytes<'a> {
        #[parse(rest_of_buf)]
        pub bytes: &'a [u8],
    }
}

parsing::parsable_struct! {
    /// Length prefixed UTF-8 string
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct AseString<'a> {
        [[param: Word = len]]
        #[parse(sized_utf8_string = len)]
        pub value: &'a str,
    }
}

parsing::parsable_enum! {
    #[derive(Clone, PartialEq, Debug)]
    #[repr(u16)]
    pub enum Chunk<'a> {
        [[param: Dword = chunk_size]]
        [[limit_buffer = (chunk_size as usize).saturating_sub(std::mem::size_of::<Dword>())]]
        [[param: Word = chunk_type]]
        [[enum_type = chunk_type]]
        OldPalette1(RestOfBytes<'a>) = 0x0004,
        OldPalette2(RestOfBytes<'a>) = 0x0011,
        Layer(LayerChunk<'a>) = 0x2004,
        Cel(CelChunk<'a>) = 0x2005,
        CelExtra(RestOfBytes<'a>) = 0x2006,
        ColorProfile(RestOfBytes<'a>) = 0x2007,
        ExternalFiles(RestOfBytes<'a>) = 0x2008,
        /// deprecated
        Mask(RestOfBytes<'a>) = 0x2016,
        Path(RestOfBytes<'a>) = 0x2017,
        Tags(TagsChunk<'a>) = 0x2018,
        Palette(PaletteChunk<'a>) = 0x2019,
        UserData(UserDataChunk<'a>) = 0x2020,
        Slice(SliceChunk<'a>) = 0x2022,
        Tileset(TilesetChunk<'a>) = 0x2023,
    }
}

impl Chunk<'_> {
    pub fn chunk_type(&self) -> Word {
        match self {
            Chunk::OldPalette1(_) => 0x0004,
            Chunk::OldPalette2(_) => 0x0011,
            Chunk::Layer(_) => 0x2004,
            Chunk::Cel(_) => 0x2005,
            Chunk::CelExtra(_) => 0x2006,
            Chunk::ColorProfile(_) => 0x2007,
            Chunk::ExternalFiles(_) => 0x2008,
            Chunk::Mask(_) => 0x2016,
            Chunk::Path(_) => 0x2017,
            Chunk::Tags(_) => 0x2018,
            Chunk::Palette(_) => 0x2019,
            Chunk::UserData(_) => 0x2020,
            Chunk::Slice(_) => 0x2022,
            Chunk::Tileset(_) => 0x2023,
        }
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct LayerChunk<'a> {
        pub flags: Word,
        pub layer_type: Word,
        pub child_level: Word,
        [[ignore: Word]]
        [[ignore: Word]]
        pub blend_mode: Word,
        pub opacity: Byte,
        [[padding_bytes = 3]]
        [[param: Word = name_len]]
        #[parse(sized_utf8_string = name_len)]
        pub name: &'a str,
        #[parse(option_if: Dword = layer_type == 2)]
        pub tileset_index: Option<Dword>,
        /// Present only when the header carries the layer UUID flag
        #[parse(rest_of_buf)]
        pub uuid: &'a [u8],
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct CelChunk<'a> {
        pub layer_index: Word,
        pub x: Short,
        pub y: Short,
        pub opacity: Byte,
        pub cel_type: Word,
        pub z_index: Short,
        [[padding_bytes = 5]]
        #[parse(rest_of_buf)]
        pub data: &'a [u8],
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct ImageData<'a> {
        pub width: Word,
        pub height: Word,
        #[parse(rest_of_buf)]
        pub pixels: &'a [u8],
    }
}

parsing::parsable_struct! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct LinkedData {
        pub frame: Word,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct TilemapData<'a> {
        pub width: Word,
        pub height: Word,
        pub bits_per_tile: Word,
        pub tile_id_mask: Dword,
        pub x_flip_mask: Dword,
        pub y_flip_mask: Dword,
        pub diagonal_flip_mask: Dword,
        [[padding_bytes = 10]]
        #[parse(rest_of_buf)]
        pub tiles: &'a [u8],
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CelContent<'a> {
    Raw(ImageData<'a>),
    Linked(LinkedData),
    /// zlib stream of `width * height` pixels
    Compressed(ImageData<'a>),
    /// zlib stream of `width * height` tile records
    Tilemap(TilemapData<'a>),
}

impl<'a> CelChunk<'a> {
    /// Decodes the type specific part of the cel.
    ///
    /// An unknown cel type fails with `EnumTypeValueMatchFailed`, the same
    /// way an unknown chunk type does.
    pub fn content(&self) -> parsing::Result<CelContent<'a>> {
        let mut input: &'a [u8] = self.data;
        let content = match self.cel_type {
            0 => CelContent::Raw(input.read_type_le()?),
            1 => CelContent::Linked(input.read_type_le()?),
            2 => CelContent::Compressed(input.read_type_le()?),
            3 => CelContent::Tilemap(input.read_type_le()?),
            other => return Err(parsing::Error::EnumTypeValueMatchFailed(other as u64)),
        };
        if !input.is_empty() {
            return Err(parsing::Error::UnconsumedBytes {
                remaining: input.len(),
            });
        }
        Ok(content)
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct TagsChunk<'a> {
        [[param: Word = num_tags]]
        [[padding_bytes = 8]]
        #[parse(collection: RawTag = num_tags)]
        pub tags: Vec<RawTag<'a>>,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct RawTag<'a> {
        pub from: Word,
        pub to: Word,
        pub direction: Byte,
        pub repeat: Word,
        [[padding_bytes = 6]]
        /// deprecated, user data color takes over
        pub color: [Byte; 3],
        [[padding_bytes = 1]]
        [[param: Word = name_len]]
        #[parse(sized_utf8_string = name_len)]
        pub name: &'a str,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct PaletteChunk<'a> {
        pub new_size: Dword,
        pub first: Dword,
        pub last: Dword,
        [[padding_bytes = 8]]
        #[parse(collection: PaletteEntry = ((last as usize).saturating_add(1).saturating_sub(first as usize)))]
        pub entries: Vec<PaletteEntry<'a>>,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct PaletteEntry<'a> {
        [[param: Word = entry_flags]]
        pub rgba: [Byte; 4],
        #[parse(option_if: AseString<'a> = (entry_flags & 1) != 0)]
        pub name: Option<AseString<'a>>,
    }
}

pub const USER_DATA_TEXT: Dword = 1;
pub const USER_DATA_COLOR: Dword = 2;
pub const USER_DATA_PROPERTIES: Dword = 4;

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct UserDataChunk<'a> {
        pub flags: Dword,
        #[parse(option_if: AseString<'a> = (flags & USER_DATA_TEXT) != 0)]
        pub text: Option<AseString<'a>>,
        #[parse(option_if: [Byte; 4] = (flags & USER_DATA_COLOR) != 0)]
        pub color: Option<[Byte; 4]>,
        /// Property maps are kept undecoded
        #[parse(rest_of_buf)]
        pub properties: &'a [u8],
    }
}

impl UserDataChunk<'_> {
    pub fn has_properties(&self) -> bool {
        self.flags & USER_DATA_PROPERTIES != 0
    }
}

pub const SLICE_NINE_PATCH: Dword = 1;
pub const SLICE_PIVOT: Dword = 2;

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct SliceChunk<'a> {
        pub num_keys: Dword,
        pub flags: Dword,
        [[ignore: Dword]]
        [[param: Word = name_len]]
        #[parse(sized_utf8_string = name_len)]
        pub name: &'a str,
        #[parse(rest_of_buf)]
        pub key_bytes: &'a [u8],
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RawSliceKey {
    pub frame: Dword,
    pub bounds: Rect,
    pub center: Option<Rect>,
    pub pivot: Option<Point>,
}

impl SliceChunk<'_> {
    pub fn is_nine_patch(&self) -> bool {
        self.flags & SLICE_NINE_PATCH != 0
    }

    pub fn has_pivot(&self) -> bool {
        self.flags & SLICE_PIVOT != 0
    }

    /// Key layout depends on the slice flags, so keys are decoded here
    /// instead of through a collection field.
    pub fn keys(&self) -> parsing::Result<Vec<RawSliceKey>> {
        let mut input = self.key_bytes;
        let keys = (0..self.num_keys)
            .map(|_| {
                let frame = input.read_type_le::<Dword>()?;
                let bounds = input.read_type_le::<Rect>()?;
                let center = if self.is_nine_patch() {
                    Some(input.read_type_le::<Rect>()?)
                } else {
                    None
                };
                let pivot = if self.has_pivot() {
                    Some(input.read_type_le::<Point>()?)
                } else {
                    None
                };
                Ok(RawSliceKey {
                    frame,
                    bounds,
                    center,
                    pivot,
                })
            })
            .collect::<parsing::Result<Vec<_>>>()?;
        if !input.is_empty() {
            return Err(parsing::Error::UnconsumedBytes {
                remaining: input.len(),
            });
        }
        Ok(keys)
    }
}

pub const TILESET_EXTERNAL: Dword = 1;
pub const TILESET_EMBEDDED: Dword = 2;
pub const TILESET_EMPTY_TILE_ZERO: Dword = 4;

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct TilesetChunk<'a> {
        pub id: Dword,
        pub flags: Dword,
        pub num_tiles: Dword,
        pub tile_width: Word,
        pub tile_height: Word,
        pub base_index: Short,
        [[padding_bytes = 14]]
        [[param: Word = name_len]]
        #[parse(sized_utf8_string = name_len)]
        pub name: &'a str,
        #[parse(option_if: ExternalTilesetRef = (flags & TILESET_EXTERNAL) != 0)]
        pub external: Option<ExternalTilesetRef>,
        #[parse(option_if: EmbeddedTiles<'a> = (flags & TILESET_EMBEDDED) != 0)]
        pub embedded: Option<EmbeddedTiles<'a>>,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct ExternalTilesetRef {
        pub file_id: Dword,
        pub tileset_id: Dword,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct EmbeddedTiles<'a> {
        [[param: Dword = data_len]]
        /// zlib stream of a `tile_width x (tile_height * num_tiles)` image
        #[parse(sized_buf = data_len)]
        pub data: &'a [u8],
    }
}
