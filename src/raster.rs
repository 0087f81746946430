use crate::color::{Color, BLACK};
use image::RgbImage;

/// Rectangular RGB raster with forgiving random access.
///
/// Coordinates are signed so that neighbours of edge pixels can be addressed
/// directly. Reads outside the raster return black, writes outside it are
/// dropped.
pub trait PixelSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn get_rgb(&self, x: i64, y: i64) -> Color;
    fn set_rgb(&mut self, x: i64, y: i64, color: Color);

    #[inline]
    fn in_raster(&self, x: i64, y: i64) -> bool {
        (0..self.width() as i64).contains(&x) && (0..self.height() as i64).contains(&y)
    }
}

impl PixelSource for RgbImage {
    #[inline]
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    #[inline]
    fn height(&self) -> u32 {
        self.dimensions().1
    }

    #[inline]
    fn get_rgb(&self, x: i64, y: i64) -> Color {
        if self.in_raster(x, y) {
            *self.get_pixel(x as u32, y as u32)
        } else {
            BLACK
        }
    }

    #[inline]
    fn set_rgb(&mut self, x: i64, y: i64, color: Color) {
        if self.in_raster(x, y) {
            self.put_pixel(x as u32, y as u32, color);
        }
    }
}
