mod adaptive;
mod index;
pub mod store;

pub use adaptive::{adaptive_palette, AdaptiveTree};
pub use index::StaticIndex;

use crate::color::Color;

pub const MAX_DEPTH: u8 = 8;

/// Child slot of `color` at `depth` (1..=8): one bit per channel, red in the
/// high bit and blue in the low bit. Depth 1 reads each channel's MSB.
#[inline]
pub fn child_index(color: Color, depth: u8) -> usize {
    let bit = |c: u8| ((c >> (MAX_DEPTH - depth)) & 1) as usize;
    let [r, g, b] = color.0;
    (bit(r) << 2) | (bit(g) << 1) | bit(b)
}
