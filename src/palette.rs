//! Palette text files and the standard palettes.
//!
//! The text format is a stream of whitespace separated decimal `R G B`
//! triples. The writer puts one right-aligned triple per line.

use crate::color::{Color, MAX_PALETTE_COLORS};
use crate::error::{check_range, Error, Result};
use image::Rgb;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Fixed 16-entry gray table for 4-bit panels.
pub const GRAY16: [Color; 16] = [
    Rgb([0x00, 0x00, 0x00]),
    Rgb([0x00, 0x00, 0x00]),
    Rgb([0x00, 0x00, 0x00]),
    Rgb([0x00, 0x00, 0x00]),
    Rgb([0x01, 0x01, 0x01]),
    Rgb([0x00, 0x00, 0x00]),
    Rgb([0x00, 0x00, 0x00]),
    Rgb([0x00, 0x00, 0x00]),
    Rgb([0x00, 0x00, 0x00]),
    Rgb([0x00, 0x00, 0x00]),
    Rgb([0x00, 0x00, 0x00]),
    Rgb([0x6E, 0x6E, 0x6E]),
    Rgb([0x95, 0x95, 0x95]),
    Rgb([0xB4, 0xB4, 0xB4]),
    Rgb([0xCF, 0xCF, 0xCF]),
    Rgb([0xFF, 0xFF, 0xFF]),
];

fn levels(bits: usize) -> impl Iterator<Item = u8> {
    let step = 255 / ((1 << bits) - 1);
    (0..=255).step_by(step)
}

/// `2^bits` evenly spaced grays, `bits` in 1..=8.
pub fn gray(bits: usize) -> Result<Vec<Color>> {
    let bits = check_range("bits", bits, 1, 8)?;
    Ok(levels(bits).map(|c| Rgb([c, c, c])).collect())
}

/// `2^(3 * bits)` colors on an even RGB grid, `bits` in 1..=2.
pub fn color(bits: usize) -> Result<Vec<Color>> {
    let bits = check_range("bits", bits, 1, 2)?;
    let mut palette = Vec::with_capacity(1 << (3 * bits));
    for r in levels(bits) {
        for g in levels(bits) {
            for b in levels(bits) {
                palette.push(Rgb([r, g, b]));
            }
        }
    }
    Ok(palette)
}

pub fn parse(text: &str) -> Result<Vec<Color>> {
    let mut palette = Vec::new();
    let mut rgb = [0u8; 3];
    let mut filled = 0;
    for (line, tokens) in text.lines().enumerate() {
        for token in tokens.split_whitespace() {
            let value: u8 = token.parse().map_err(|_| Error::ParsePalette {
                line: line + 1,
                reason: format!("expected a value in 0..=255, got {token:?}"),
            })?;
            rgb[filled] = value;
            filled += 1;
            if filled == 3 {
                if palette.len() == MAX_PALETTE_COLORS {
                    return Err(Error::TooManyColors);
                }
                palette.push(Rgb(rgb));
                filled = 0;
            }
        }
    }
    if filled != 0 {
        return Err(Error::ParsePalette {
            line: text.lines().count(),
            reason: "incomplete color at end of file".to_string(),
        });
    }
    Ok(palette)
}

pub fn read<P: AsRef<Path>>(path: P) -> Result<Vec<Color>> {
    parse(&fs::read_to_string(path)?)
}

pub fn write<W: Write>(w: &mut W, palette: &[Color]) -> Result<()> {
    palette
        .iter()
        .try_for_each(|rgb| writeln!(w, "{:3} {:3} {:3}", rgb[0], rgb[1], rgb[2]))?;
    Ok(())
}
