use crate::error::FormatError;
use serde::{Deserialize, Serialize};

pub type Color = rgb::RGBA8;

/// Output of the transparent palette index and of empty canvas pixels
pub const TRANSPARENT: Color = Color {
    r: 0,
    g: 0,
    b: 0,
    a: 0,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorDepth {
    Indexed,
    Grayscale,
    Rgba,
}

impl ColorDepth {
    pub fn from_bits(bits: u16) -> Result<Self, FormatError> {
        match bits {
            8 => Ok(ColorDepth::Indexed),
            16 => Ok(ColorDepth::Grayscale),
            32 => Ok(ColorDepth::Rgba),
            other => Err(FormatError::UnknownColorDepth(other)),
        }
    }

    pub fn bits(self) -> u16 {
        match self {
            ColorDepth::Indexed => 8,
            ColorDepth::Grayscale => 16,
            ColorDepth::Rgba => 32,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        self.bits() as usize / 8
    }
}

pub(crate) fn from_rgba(rgba: [u8; 4]) -> Color {
    let [r, g, b, a] = rgba;
    Color { r, g, b, a }
}

pub(crate) fn from_rgb(rgb: [u8; 3]) -> Color {
    let [r, g, b] = rgb;
    Color { r, g, b, a: 255 }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn depth_bits() {
        assert_eq!(ColorDepth::from_bits(8), Ok(ColorDepth::Indexed));
        assert_eq!(ColorDepth::from_bits(16), Ok(ColorDepth::Grayscale));
        assert_eq!(ColorDepth::from_bits(32), Ok(ColorDepth::Rgba));
        assert_eq!(
            ColorDepth::from_bits(24),
            Err(FormatError::UnknownColorDepth(24))
        );
        assert_eq!(ColorDepth::Grayscale.bytes_per_pixel(), 2);
    }
}
