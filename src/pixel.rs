//! Conversion of raw pixel bytes into RGBA colors.

use crate::color::{Color, ColorDepth, TRANSPARENT};
use crate::error::FormatError;
use crate::palette::Palette;

/// Decodes `count` pixels of the given depth.
///
/// Indexed pixels equal to the palette's transparent index always decode
/// to [`TRANSPARENT`], whatever the palette holds at that slot.
pub fn decode_pixels(
    bytes: &[u8],
    depth: ColorDepth,
    palette: &Palette,
    count: usize,
) -> Result<Vec<Color>, FormatError> {
    let expected = count * depth.bytes_per_pixel();
    if bytes.len() != expected {
        return Err(FormatError::PixelDataSize {
            expected,
            found: bytes.len(),
        });
    }

    match depth {
        ColorDepth::Rgba => Ok(bytes
            .chunks_exact(4)
            .map(|p| Color::new(p[0], p[1], p[2], p[3]))
            .collect()),
        ColorDepth::Grayscale => Ok(bytes
            .chunks_exact(2)
            .map(|p| Color::new(p[0], p[0], p[0], p[1]))
            .collect()),
        ColorDepth::Indexed => bytes
            .iter()
            .map(|&index| decode_indexed(index, palette))
            .collect(),
    }
}

fn decode_indexed(index: u8, palette: &Palette) -> Result<Color, FormatError> {
    if index == palette.transparent_index() {
        return Ok(TRANSPARENT);
    }
    palette
        .get(index as usize)
        .copied()
        .ok_or(FormatError::PaletteIndexOutOfRange {
            index: index as usize,
            len: palette.len(),
        })
}

#[cfg(test)]
mod test {
    use super::*;

    fn palette(transparent: u8) -> Palette {
        let mut p = Palette::new(transparent);
        p.resize(3);
        p.set(0, Color::new(255, 0, 255, 255));
        p.set(1, Color::new(255, 0, 0, 255));
        p.set(2, Color::new(0, 255, 0, 128));
        p
    }

    #[test]
    fn rgba_is_copied() {
        let px = decode_pixels(&[1, 2, 3, 4, 5, 6, 7, 8], ColorDepth::Rgba, &Palette::default(), 2)
            .unwrap();
        assert_eq!(px, vec![Color::new(1, 2, 3, 4), Color::new(5, 6, 7, 8)]);
    }

    #[test]
    fn grayscale_uses_value_and_alpha() {
        let px = decode_pixels(&[9, 200], ColorDepth::Grayscale, &Palette::default(), 1).unwrap();
        assert_eq!(px, vec![Color::new(9, 9, 9, 200)]);
    }

    #[test]
    fn transparent_index_wins_over_palette_color() {
        for transparent in 0..3 {
            let p = palette(transparent);
            let px = decode_pixels(&[0, 1, 2], ColorDepth::Indexed, &p, 3).unwrap();
            for (i, color) in px.iter().enumerate() {
                if i == transparent as usize {
                    assert_eq!(*color, TRANSPARENT);
                } else {
                    assert_eq!(*color, p[i]);
                }
            }
        }
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let err = decode_pixels(&[1, 7], ColorDepth::Indexed, &palette(0), 2).unwrap_err();
        assert_eq!(err, FormatError::PaletteIndexOutOfRange { index: 7, len: 3 });
    }

    #[test]
    fn size_must_match() {
        let err = decode_pixels(&[1, 2, 3], ColorDepth::Rgba, &Palette::default(), 1).unwrap_err();
        assert_eq!(
            err,
            FormatError::PixelDataSize {
                expected: 4,
                found: 3
            }
        );
    }
}
