use thiserror::Error;

use crate::core::data::colour::Colour;
use crate::core::data::point::Point;
use crate::core::data::resolution::Resolution;

pub const BYTES_PER_PIXEL: usize = 4;

fn resolution_to_buffer_size(resolution: Resolution) -> usize {
    resolution.pixel_count() * BYTES_PER_PIXEL
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PixelBufferError {
    #[error("pixel at x:{}, y:{} outside of {}x{} image", .pixel.x, .pixel.y, .resolution.width(), .resolution.height())]
    PixelOutsideBounds { pixel: Point, resolution: Resolution },
    #[error("resolution size {resolution_size} does not match buffer size {buffer_size}")]
    BoundsMismatch {
        resolution_size: usize,
        buffer_size: usize,
    },
}

pub type PixelBufferData = Vec<u8>;

/// Packed RGBA8 pixels, row-major.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    resolution: Resolution,
    buffer: PixelBufferData,
}

impl PixelBuffer {
    #[must_use]
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            buffer: vec![0; resolution_to_buffer_size(resolution)],
        }
    }

    pub fn from_data(
        resolution: Resolution,
        buffer: PixelBufferData,
    ) -> Result<Self, PixelBufferError> {
        let resolution_size = resolution_to_buffer_size(resolution);

        if resolution_size != buffer.len() {
            return Err(PixelBufferError::BoundsMismatch {
                resolution_size,
                buffer_size: buffer.len(),
            });
        }

        Ok(Self { resolution, buffer })
    }

    #[must_use]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    #[must_use]
    pub fn buffer(&self) -> &PixelBufferData {
        &self.buffer
    }

    pub fn pixel(&self, pixel: Point) -> Result<Colour, PixelBufferError> {
        let index = self.index_of(pixel)?;

        Ok(Colour::rgba(
            self.buffer[index],
            self.buffer[index + 1],
            self.buffer[index + 2],
            self.buffer[index + 3],
        ))
    }

    pub fn set_pixel(&mut self, pixel: Point, colour: Colour) -> Result<(), PixelBufferError> {
        let index = self.index_of(pixel)?;

        self.buffer[index] = colour.r;
        self.buffer[index + 1] = colour.g;
        self.buffer[index + 2] = colour.b;
        self.buffer[index + 3] = colour.a;

        Ok(())
    }

    fn index_of(&self, pixel: Point) -> Result<usize, PixelBufferError> {
        if pixel.x >= self.resolution.width() || pixel.y >= self.resolution.height() {
            return Err(PixelBufferError::PixelOutsideBounds {
                pixel,
                resolution: self.resolution,
            });
        }

        Ok((pixel.y as usize * self.resolution.width() as usize + pixel.x as usize) * BYTES_PER_PIXEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolution(width: u32, height: u32) -> Resolution {
        Resolution::new(width, height).unwrap()
    }

    #[test]
    fn test_new_creates_zeroed_buffer() {
        let buffer = PixelBuffer::new(resolution(10, 10));

        assert_eq!(buffer.buffer().len(), 400);
        assert!(buffer.buffer().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_from_data_buffer_too_small() {
        let result = PixelBuffer::from_data(resolution(2, 2), vec![255, 0, 0, 255]);

        assert_eq!(
            result.unwrap_err(),
            PixelBufferError::BoundsMismatch {
                resolution_size: 16,
                buffer_size: 4
            }
        );
    }

    #[test]
    fn test_set_pixel_writes_rgba() {
        let mut buffer = PixelBuffer::new(resolution(3, 3));
        let red = Colour::rgba(255, 0, 0, 128);

        buffer.set_pixel(Point { x: 1, y: 1 }, red).unwrap();

        assert_eq!(&buffer.buffer()[16..20], &[255, 0, 0, 128]);
        assert_eq!(buffer.pixel(Point { x: 1, y: 1 }), Ok(red));
    }

    #[test]
    fn test_set_pixel_outside_bounds() {
        let mut buffer = PixelBuffer::new(resolution(3, 3));
        let result = buffer.set_pixel(Point { x: 3, y: 0 }, Colour::WHITE);

        assert_eq!(
            result,
            Err(PixelBufferError::PixelOutsideBounds {
                pixel: Point { x: 3, y: 0 },
                resolution: resolution(3, 3)
            })
        );
    }
}
