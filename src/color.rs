use image::Rgb;
use std::iter;

pub type Color = Rgb<u8>;

pub const MAX_PALETTE_COLORS: usize = 256;

pub const BLACK: Color = Rgb([0, 0, 0]);
pub const WHITE: Color = Rgb([255, 255, 255]);

/// Squared euclidean distance in linear RGB.
#[inline]
pub fn distance_sq(a: Color, b: Color) -> u32 {
    iter::zip(a.0, b.0)
        .map(|(a, b)| {
            let d = a as i32 - b as i32;
            (d * d) as u32
        })
        .sum()
}

/// Builds a color from signed channels, clamping each to [0, 255].
#[inline]
pub fn clamped(rgb: [i32; 3]) -> Color {
    Rgb(rgb.map(|c| c.clamp(0, 255) as u8))
}
