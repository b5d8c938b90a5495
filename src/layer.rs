use crate::blend::BlendMode;
use crate::user_data::UserData;
use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct LayerFlags: u16 {
        const VISIBLE = 1;
        const EDITABLE = 2;
        const LOCK_MOVEMENT = 4;
        const BACKGROUND = 8;
        const PREFER_LINKED_CELS = 16;
        const DISPLAY_COLLAPSED = 32;
        const REFERENCE = 64;
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LayerKind {
    Image,
    /// Direct children, in declaration order
    Group { children: Vec<usize> },
    /// Index into the document's tilesets
    Tilemap { tileset: usize },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Layer {
    pub name: String,
    pub flags: LayerFlags,
    pub kind: LayerKind,
    pub child_level: u16,
    pub parent: Option<usize>,
    pub blend_mode: BlendMode,
    /// Already forced to 255 when the file does not flag opacity as valid
    pub opacity: u8,
    pub uuid: Option<[u8; 16]>,
    pub user_data: Option<UserData>,
}

impl Layer {
    pub fn is_visible(&self) -> bool {
        self.flags.contains(LayerFlags::VISIBLE)
    }

    pub fn is_background(&self) -> bool {
        self.flags.contains(LayerFlags::BACKGROUND)
    }

    pub fn is_reference(&self) -> bool {
        self.flags.contains(LayerFlags::REFERENCE)
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, LayerKind::Group { .. })
    }

    pub fn tileset(&self) -> Option<usize> {
        match self.kind {
            LayerKind::Tilemap { tileset } => Some(tileset),
            _ => None,
        }
    }

    pub fn children(&self) -> &[usize] {
        match &self.kind {
            LayerKind::Group { children } => children.as_slice(),
            _ => &[],
        }
    }
}
