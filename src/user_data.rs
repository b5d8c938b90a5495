use crate::ase_file::UserDataChunk;
use crate::color::{self, Color};

/// Text and color attached to a sprite, layer, cel, tag, slice or tileset
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct UserData {
    pub text: Option<String>,
    pub color: Option<Color>,
}

impl UserData {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.color.is_none()
    }
}

impl From<&UserDataChunk<'_>> for UserData {
    fn from(chunk: &UserDataChunk<'_>) -> Self {
        Self {
            text: chunk.text.map(|s| s.value.to_owned()),
            color: chunk.color.map(color::from_rgba),
        }
    }
}
