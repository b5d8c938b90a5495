use crate::cel::{Cel, CelContent};
use crate::color::{Color, ColorDepth};
use crate::compositor;
use crate::error::{Result, Warning};
use crate::geometry::{Rect, Size};
use crate::layer::Layer;
use crate::options::FlattenOptions;
use crate::palette::Palette;
use crate::parser;
use crate::slice::Slice;
use crate::tag::Tag;
use crate::tileset::Tileset;
use crate::user_data::UserData;
use bitflags::bitflags;
use std::io::Read;
use std::path::Path;

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct HeaderFlags: u32 {
        const LAYER_OPACITY_VALID = 1;
        const GROUP_OPACITY_VALID = 2;
        const LAYER_UUIDS = 4;
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Header {
    pub frame_count: usize,
    pub size: Size,
    pub color_depth: ColorDepth,
    pub flags: HeaderFlags,
    /// Always 0 unless the sprite is indexed
    pub transparent_index: u8,
    pub color_count: u16,
    pub pixel_width: u8,
    pub pixel_height: u8,
    pub grid: Rect,
}

impl Header {
    pub fn layer_opacity_valid(&self) -> bool {
        self.flags.contains(HeaderFlags::LAYER_OPACITY_VALID)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Frame {
    /// Milliseconds
    pub duration: u16,
    pub cels: Vec<Cel>,
}

/// A fully parsed sprite. Immutable once returned by the parser.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Document {
    pub(crate) header: Header,
    pub(crate) palette: Palette,
    pub(crate) layers: Vec<Layer>,
    pub(crate) frames: Vec<Frame>,
    pub(crate) tags: Vec<Tag>,
    pub(crate) slices: Vec<Slice>,
    pub(crate) tilesets: Vec<Tileset>,
    pub(crate) user_data: Option<UserData>,
    pub(crate) warnings: Vec<Warning>,
}

impl Document {
    pub(crate) fn new(header: Header) -> Self {
        Self {
            palette: Palette::new(header.transparent_index),
            header,
            layers: Vec::new(),
            frames: Vec::new(),
            tags: Vec::new(),
            slices: Vec::new(),
            tilesets: Vec::new(),
            user_data: None,
            warnings: Vec::new(),
        }
    }

    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        parser::parse(bytes)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn size(&self) -> Size {
        self.header.size
    }

    pub fn color_depth(&self) -> ColorDepth {
        self.header.color_depth
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> &Layer {
        &self.layers[index]
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> &Frame {
        &self.frames[index]
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    pub fn tileset(&self, index: usize) -> &Tileset {
        &self.tilesets[index]
    }

    /// Sprite level user data
    pub fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn cel(&self, frame: usize, cel: usize) -> &Cel {
        &self.frames[frame].cels[cel]
    }

    /// Follows a linked cel to the cel that owns the content
    pub fn resolve_cel(&self, frame: usize, cel: usize) -> &Cel {
        let c = self.cel(frame, cel);
        match c.content {
            CelContent::Linked { frame, cel } => self.cel(frame, cel),
            _ => c,
        }
    }

    /// A layer is visible when it and every group above it are visible
    pub fn is_layer_visible(&self, index: usize) -> bool {
        let mut current = Some(index);
        while let Some(i) = current {
            let layer = &self.layers[i];
            if !layer.is_visible() {
                return false;
            }
            current = layer.parent;
        }
        true
    }

    /// Composites one frame into a canvas sized RGBA buffer
    pub fn flatten_frame(&self, index: usize, options: &FlattenOptions) -> Vec<Color> {
        compositor::flatten_frame(self, index, options)
    }
}
