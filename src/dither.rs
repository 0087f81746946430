//! Floyd-Steinberg error diffusion over a [`PixelSource`].
//!
//! Pixels are visited once in row-major order. Each pixel is replaced by its
//! nearest palette color and the signed per-channel error is pushed to the
//! four neighbours that are still ahead in scan order:
//!
//! ```text
//!          *    7/16
//!   3/16  5/16  1/16
//! ```
//!
//! Shares use truncating integer division and every write is clamped to
//! [0, 255]. Shares aimed outside the raster are dropped.

use crate::color::{clamped, Color};
use crate::error::{Error, Result};
use crate::nearest::NearestColor;
use crate::raster::PixelSource;
use log::debug;
use std::time::Instant;

/// `(dx, dy, weight)` in sixteenths.
const DIFFUSION: [(i64, i64, i32); 4] = [(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)];

#[inline]
fn quantization_error(original: Color, quantized: Color) -> [i32; 3] {
    [0, 1, 2].map(|i| original[i] as i32 - quantized[i] as i32)
}

fn diffuse<S>(img: &mut S, x: i64, y: i64, error: [i32; 3], weight: i32)
where
    S: PixelSource + ?Sized,
{
    let current = img.get_rgb(x, y);
    let rgb = [0, 1, 2].map(|i| current[i] as i32 + error[i] * weight / 16);
    img.set_rgb(x, y, clamped(rgb));
}

/// Quantizes pixel `(x, y)` and spreads its error. Returns the palette index.
fn dither_pixel<S, N>(img: &mut S, map: &N, x: i64, y: i64) -> Result<usize>
where
    S: PixelSource + ?Sized,
    N: NearestColor + ?Sized,
{
    let original = img.get_rgb(x, y);
    let index = map.nearest(original).ok_or(Error::EmptyPalette)?;
    let quantized = map.palette()[index];
    img.set_rgb(x, y, quantized);

    let error = quantization_error(original, quantized);
    if error != [0; 3] {
        for (dx, dy, weight) in DIFFUSION {
            diffuse(img, x + dx, y + dy, error, weight);
        }
    }
    Ok(index)
}

/// Dithers `img` in place against the palette of `map` and returns the
/// chosen palette index of every pixel in row-major order.
pub fn dither<S, N>(img: &mut S, map: &N) -> Result<Vec<usize>>
where
    S: PixelSource + ?Sized,
    N: NearestColor + ?Sized,
{
    if map.palette().is_empty() {
        return Err(Error::EmptyPalette);
    }
    let start_time = Instant::now();
    let (width, height) = (img.width() as i64, img.height() as i64);
    let mut indices = Vec::new();
    indices.try_reserve_exact((width * height) as usize)?;
    for y in 0..height {
        for x in 0..width {
            indices.push(dither_pixel(img, map, x, y)?);
        }
    }
    debug!(
        "dither: {width}x{height}, {} colors, {}ms",
        map.palette().len(),
        start_time.elapsed().as_millis()
    );
    Ok(indices)
}
