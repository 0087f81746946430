mod color;
mod dither;
mod error;
mod nearest;
pub mod octree;
pub mod palette;
mod raster;

pub use self::color::{distance_sq, Color, BLACK, MAX_PALETTE_COLORS, WHITE};
pub use self::dither::dither;
pub use self::error::{Error, Result};
pub use self::nearest::{LinearPalette, NearestColor};
pub use self::octree::{adaptive_palette, AdaptiveTree, StaticIndex};
pub use self::raster::PixelSource;

use image::imageops::ColorMap;
use image::{DynamicImage, ImageReader, RgbImage};
use log::info;
use std::path::Path;

/// An RGB image on its way to a smaller palette.
#[derive(Default)]
pub struct Quantizer {
    rgb8_img: RgbImage,
}

impl Quantizer {
    pub fn open<P: AsRef<Path>>(img_path: P) -> Result<Self> {
        let img = ImageReader::open(img_path)?.decode()?;
        Ok(Self::from_image(img))
    }

    pub fn from_image(img: DynamicImage) -> Self {
        Self {
            rgb8_img: img.to_rgb8(),
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.rgb8_img
    }

    /// Octree palette of at most `max_colors` colors drawn from the image.
    pub fn adaptive_palette(&self, max_colors: usize) -> Result<Vec<Color>> {
        adaptive_palette(self.rgb8_img.pixels().copied(), max_colors)
    }

    /// Error-diffusion dither against `palette`, returning the palette index
    /// of every pixel.
    pub fn dither(&mut self, palette: &[Color]) -> Result<Vec<usize>> {
        let index = StaticIndex::build(palette)?;
        info!(
            "Dither {}x{} with {} colors",
            self.rgb8_img.width(),
            self.rgb8_img.height(),
            palette.len()
        );
        dither(&mut self.rgb8_img, &index)
    }

    /// Replaces every pixel with its exact nearest palette color.
    pub fn remap(&mut self, palette: &[Color]) -> Result<()> {
        let map = LinearPalette::new(palette)?;
        self.rgb8_img.pixels_mut().for_each(|p| map.map_color(p));
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.rgb8_img.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn quantizer() -> Quantizer {
        Quantizer::from_image(DynamicImage::ImageRgb8(RgbImage::from_fn(8, 8, |x, y| {
            Rgb([(x * 32) as u8, (y * 32) as u8, 128])
        })))
    }

    #[test]
    fn dither_uses_only_palette_colors() {
        let mut q = quantizer();
        let palette = q.adaptive_palette(4).unwrap();
        assert!(!palette.is_empty() && palette.len() <= 4);
        let indices = q.dither(&palette).unwrap();
        assert_eq!(indices.len(), 64);
        for (p, &i) in q.image().pixels().zip(&indices) {
            assert_eq!(*p, palette[i]);
        }
    }

    #[test]
    fn remap_to_black_and_white() {
        let mut q = quantizer();
        q.remap(&[BLACK, WHITE]).unwrap();
        assert!(q.image().pixels().all(|p| *p == BLACK || *p == WHITE));
        assert_eq!(*q.image().get_pixel(0, 0), BLACK);
        assert_eq!(*q.image().get_pixel(7, 7), WHITE);
        assert!(matches!(q.remap(&[]), Err(Error::EmptyPalette)));
    }

    #[test]
    fn black_and_white_round_trip() {
        let img = RgbImage::from_fn(4, 4, |x, y| if (x + y) % 2 == 0 { BLACK } else { WHITE });
        let mut q = Quantizer::from_image(DynamicImage::ImageRgb8(img.clone()));
        let mut palette = q.adaptive_palette(2).unwrap();
        palette.sort_by_key(|c| c.0);
        assert_eq!(palette, [BLACK, WHITE]);
        q.dither(&palette).unwrap();
        assert_eq!(q.image(), &img);
    }
}
