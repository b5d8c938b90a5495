//! Layer blend modes, using the same 8-bit integer math as Aseprite so
//! flattened frames match the editor pixel for pixel.

use crate::color::Color;
use crate::error::FormatError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
    Addition,
    Subtract,
    Divide,
}

impl BlendMode {
    pub fn from_u16(value: u16) -> Result<Self, FormatError> {
        use BlendMode::*;
        Ok(match value {
            0 => Normal,
            1 => Multiply,
            2 => Screen,
            3 => Overlay,
            4 => Darken,
            5 => Lighten,
            6 => ColorDodge,
            7 => ColorBurn,
            8 => HardLight,
            9 => SoftLight,
            10 => Difference,
            11 => Exclusion,
            12 => Hue,
            13 => Saturation,
            14 => Color,
            15 => Luminosity,
            16 => Addition,
            17 => Subtract,
            18 => Divide,
            other => return Err(FormatError::UnknownBlendMode(other)),
        })
    }
}

/// `a * b / 255` with rounding
pub fn mul_un8(a: u8, b: u8) -> u8 {
    let t = a as u32 * b as u32 + 0x80;
    (((t >> 8) + t) >> 8) as u8
}

/// `a * 255 / b` with rounding, `b` must be non zero
pub fn div_un8(a: u8, b: u8) -> u8 {
    ((a as u32 * 0xFF + b as u32 / 2) / b as u32) as u8
}

/// Composites `src` over `backdrop` at the given opacity.
pub fn blend(backdrop: Color, src: Color, opacity: u8, mode: BlendMode) -> Color {
    let src = match mode {
        BlendMode::Normal => src,
        BlendMode::Multiply => per_channel(backdrop, src, multiply),
        BlendMode::Screen => per_channel(backdrop, src, screen),
        BlendMode::Overlay => per_channel(backdrop, src, overlay),
        BlendMode::Darken => per_channel(backdrop, src, |b, s| b.min(s)),
        BlendMode::Lighten => per_channel(backdrop, src, |b, s| b.max(s)),
        BlendMode::ColorDodge => per_channel(backdrop, src, color_dodge),
        BlendMode::ColorBurn => per_channel(backdrop, src, color_burn),
        BlendMode::HardLight => per_channel(backdrop, src, hard_light),
        BlendMode::SoftLight => per_channel(backdrop, src, soft_light),
        BlendMode::Difference => per_channel(backdrop, src, |b, s| b.abs_diff(s)),
        BlendMode::Exclusion => per_channel(backdrop, src, exclusion),
        BlendMode::Hue => hsl_blend(backdrop, src, hue),
        BlendMode::Saturation => hsl_blend(backdrop, src, saturation),
        BlendMode::Color => hsl_blend(backdrop, src, color),
        BlendMode::Luminosity => hsl_blend(backdrop, src, luminosity),
        BlendMode::Addition => per_channel(backdrop, src, |b, s| b.saturating_add(s)),
        BlendMode::Subtract => per_channel(backdrop, src, |b, s| b.saturating_sub(s)),
        BlendMode::Divide => per_channel(backdrop, src, divide),
    };
    normal(backdrop, src, opacity)
}

fn normal(backdrop: Color, src: Color, opacity: u8) -> Color {
    if backdrop.a == 0 {
        return Color {
            a: mul_un8(src.a, opacity),
            ..src
        };
    }
    if src.a == 0 {
        return backdrop;
    }

    let src_a = mul_un8(src.a, opacity) as i32;
    let back_a = backdrop.a as i32;
    let res_a = src_a + back_a - mul_un8(back_a as u8, src_a as u8) as i32;
    if res_a == 0 {
        return backdrop;
    }
    let mix = |b: u8, s: u8| (b as i32 + (s as i32 - b as i32) * src_a / res_a) as u8;
    Color::new(
        mix(backdrop.r, src.r),
        mix(backdrop.g, src.g),
        mix(backdrop.b, src.b),
        res_a as u8,
    )
}

fn per_channel(backdrop: Color, src: Color, f: impl Fn(u8, u8) -> u8) -> Color {
    Color::new(
        f(backdrop.r, src.r),
        f(backdrop.g, src.g),
        f(backdrop.b, src.b),
        src.a,
    )
}

fn multiply(b: u8, s: u8) -> u8 {
    mul_un8(b, s)
}

fn screen(b: u8, s: u8) -> u8 {
    (b as i32 + s as i32 - mul_un8(b, s) as i32) as u8
}

fn overlay(b: u8, s: u8) -> u8 {
    hard_light(s, b)
}

fn hard_light(b: u8, s: u8) -> u8 {
    if s < 128 {
        multiply(b, s << 1)
    } else {
        screen(b, ((s as u32) << 1).saturating_sub(255) as u8)
    }
}

fn color_dodge(b: u8, s: u8) -> u8 {
    if b == 0 {
        return 0;
    }
    let s = 255 - s;
    if b >= s {
        255
    } else {
        div_un8(b, s)
    }
}

fn color_burn(b: u8, s: u8) -> u8 {
    if b == 255 {
        return 255;
    }
    let b = 255 - b;
    if b >= s {
        0
    } else {
        255 - div_un8(b, s)
    }
}

fn soft_light(b: u8, s: u8) -> u8 {
    let b = b as f64 / 255.0;
    let s = s as f64 / 255.0;
    let d = if b <= 0.25 {
        ((16.0 * b - 12.0) * b + 4.0) * b
    } else {
        b.sqrt()
    };
    let r = if s <= 0.5 {
        b - (1.0 - 2.0 * s) * b * (1.0 - b)
    } else {
        b + (2.0 * s - 1.0) * (d - b)
    };
    (r * 255.0 + 0.5) as u8
}

fn exclusion(b: u8, s: u8) -> u8 {
    (b as i32 + s as i32 - 2 * mul_un8(b, s) as i32) as u8
}

fn divide(b: u8, s: u8) -> u8 {
    if b == 0 {
        0
    } else if b >= s {
        255
    } else {
        div_un8(b, s)
    }
}

type Rgb = [f64; 3];

fn hsl_blend(backdrop: Color, src: Color, f: fn(Rgb, Rgb) -> Rgb) -> Color {
    let to_f = |c: Color| [c.r as f64 / 255.0, c.g as f64 / 255.0, c.b as f64 / 255.0];
    let [r, g, b] = f(to_f(backdrop), to_f(src));
    Color::new(
        (255.0 * r) as u8,
        (255.0 * g) as u8,
        (255.0 * b) as u8,
        src.a,
    )
}

fn hue(b: Rgb, s: Rgb) -> Rgb {
    set_lum(set_sat(s, sat(b)), lum(b))
}

fn saturation(b: Rgb, s: Rgb) -> Rgb {
    set_lum(set_sat(b, sat(s)), lum(b))
}

fn color(b: Rgb, s: Rgb) -> Rgb {
    set_lum(s, lum(b))
}

fn luminosity(b: Rgb, s: Rgb) -> Rgb {
    set_lum(b, lum(s))
}

fn lum([r, g, b]: Rgb) -> f64 {
    0.3 * r + 0.59 * g + 0.11 * b
}

fn sat([r, g, b]: Rgb) -> f64 {
    r.max(g).max(b) - r.min(g).min(b)
}

fn clip_color(c: Rgb) -> Rgb {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 {
        for v in out.iter_mut() {
            *v = l + (*v - l) * l / (l - n);
        }
    }
    if x > 1.0 {
        for v in out.iter_mut() {
            *v = l + (*v - l) * (1.0 - l) / (x - l);
        }
    }
    out
}

fn set_lum(c: Rgb, l: f64) -> Rgb {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

fn set_sat(c: Rgb, s: f64) -> Rgb {
    let mut order = [0, 1, 2];
    order.sort_by(|&a, &b| c[a].total_cmp(&c[b]));
    let [min, mid, max] = order;

    let mut out = [0.0; 3];
    if c[max] > c[min] {
        out[mid] = (c[mid] - c[min]) * s / (c[max] - c[min]);
        out[max] = s;
    }
    out
}
