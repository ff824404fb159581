//! Drawing surfaces.

use image::{Rgba, RgbaImage};

use crate::error::RenderError;

/// An owned RGBA pixel buffer the compositor draws into.
///
/// A surface always has a positive area.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Allocate a transparent surface.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        check_area(width, height)?;
        Ok(Self {
            pixels: RgbaImage::new(width, height),
        })
    }

    /// Resize to `width` x `height`. Pixel content is undefined afterwards
    /// until the next render.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        check_area(width, height)?;
        if self.pixels.dimensions() != (width, height) {
            self.pixels = RgbaImage::new(width, height);
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Reset every pixel to transparent black.
    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }
}

fn check_area(width: u32, height: u32) -> Result<(), RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::EmptySurface { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_area_is_rejected() {
        assert_eq!(
            Surface::new(0, 5),
            Err(RenderError::EmptySurface {
                width: 0,
                height: 5
            })
        );
        let mut surface = Surface::new(2, 2).unwrap();
        assert!(surface.resize(3, 0).is_err());
        assert_eq!(surface.dimensions(), (2, 2));
    }

    #[test]
    fn test_resize_and_clear() {
        let mut surface = Surface::new(2, 2).unwrap();
        surface.pixels_mut().put_pixel(0, 0, Rgba([9, 9, 9, 255]));
        surface.resize(2, 2).unwrap();
        assert_eq!(surface.pixels().get_pixel(0, 0), &Rgba([9, 9, 9, 255]));

        surface.clear();
        assert_eq!(surface.pixels().get_pixel(0, 0), &Rgba([0, 0, 0, 0]));

        surface.resize(8, 4).unwrap();
        assert_eq!(surface.dimensions(), (8, 4));
    }
}
