use crate::color::{distance_sq, Color, MAX_PALETTE_COLORS};
use crate::error::{Error, Result};
use crate::octree::StaticIndex;
use image::imageops::ColorMap;

/// Maps colors to entries of a fixed palette.
pub trait NearestColor {
    fn palette(&self) -> &[Color];

    /// Index into [`palette`](Self::palette), `None` if the palette is empty.
    fn nearest(&self, color: Color) -> Option<usize>;
}

impl NearestColor for StaticIndex {
    #[inline]
    fn palette(&self) -> &[Color] {
        StaticIndex::palette(self)
    }

    #[inline]
    fn nearest(&self, color: Color) -> Option<usize> {
        self.find_nearest(color)
    }
}

/// Exhaustive search over a palette. Exact, first minimum wins.
#[derive(Debug, Clone)]
pub struct LinearPalette {
    colors: Vec<Color>,
}

impl LinearPalette {
    pub fn new(palette: &[Color]) -> Result<Self> {
        if palette.is_empty() {
            return Err(Error::EmptyPalette);
        }
        if palette.len() > MAX_PALETTE_COLORS {
            return Err(Error::TooManyColors);
        }
        Ok(Self {
            colors: palette.to_vec(),
        })
    }

    pub fn find_nearest(&self, color: Color) -> usize {
        let mut best = (u32::MAX, 0);
        for (i, &c) in self.colors.iter().enumerate() {
            let distance = distance_sq(color, c);
            if distance < best.0 {
                best = (distance, i);
            }
        }
        best.1
    }
}

impl NearestColor for LinearPalette {
    #[inline]
    fn palette(&self) -> &[Color] {
        &self.colors
    }

    #[inline]
    fn nearest(&self, color: Color) -> Option<usize> {
        Some(self.find_nearest(color))
    }
}

impl ColorMap for LinearPalette {
    type Color = Color;

    #[inline(always)]
    fn index_of(&self, color: &Self::Color) -> usize {
        self.find_nearest(*color)
    }

    #[inline(always)]
    fn lookup(&self, index: usize) -> Option<Self::Color> {
        self.colors.get(index).copied()
    }

    fn has_lookup(&self) -> bool {
        true
    }

    #[inline(always)]
    fn map_color(&self, color: &mut Self::Color) {
        *color = self.colors[self.find_nearest(*color)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, WHITE};
    use crate::palette::GRAY16;
    use image::Rgb;

    #[test]
    fn first_minimum_wins() {
        let palette = LinearPalette::new(&GRAY16).unwrap();
        assert_eq!(palette.find_nearest(Rgb([0, 0, 0])), 0);
        assert_eq!(palette.find_nearest(Rgb([1, 1, 1])), 4);
        assert_eq!(palette.find_nearest(Rgb([100, 100, 100])), 11);
        assert_eq!(palette.find_nearest(WHITE), 15);
    }

    #[test]
    fn exact_search_agrees_with_index_on_entries() {
        let colors = [BLACK, Rgb([255, 0, 0]), Rgb([0, 255, 0]), WHITE];
        let linear = LinearPalette::new(&colors).unwrap();
        let index = StaticIndex::build(&colors).unwrap();
        for &c in &colors {
            assert_eq!(linear.nearest(c), index.nearest(c));
        }
        assert_eq!(NearestColor::palette(&index), &colors);
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(LinearPalette::new(&[]), Err(Error::EmptyPalette)));
    }

    #[test]
    fn color_map() {
        let palette = LinearPalette::new(&[BLACK, WHITE]).unwrap();
        let mut color = Rgb([90, 90, 90]);
        palette.map_color(&mut color);
        assert_eq!(color, BLACK);
        assert_eq!(palette.index_of(&Rgb([200, 0, 255])), 1);
    }
}
