use rayon::prelude::*;
use thiserror::Error;

use crate::core::actions::generate_pixel_buffer::ports::colour_map::ColourMap;
use crate::core::data::image_buffer::{ImageBuffer, ImageError, PixelResult};
use crate::core::data::pixel_buffer::{BYTES_PER_PIXEL, PixelBuffer, PixelBufferError};

#[derive(Debug, Error)]
pub enum GeneratePixelBufferError<E> {
    #[error("colour map error: {0}")]
    ColourMap(E),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    PixelBuffer(#[from] PixelBufferError),
}

/// Colours every pixel of `image` through `mapper`, rows in parallel.
///
/// The first failing pixel fails the whole run; no partial buffer is returned.
pub fn generate_pixel_buffer<CMap>(
    image: &ImageBuffer,
    mapper: &CMap,
) -> Result<PixelBuffer, GeneratePixelBufferError<CMap::Failure>>
where
    CMap: ColourMap<T = PixelResult>,
    CMap::Failure: Send,
{
    let resolution = image.resolution().ok_or(ImageError::NoResolution)?;
    let row_pixels = resolution.width() as usize;
    let mut buffer = vec![0u8; resolution.pixel_count() * BYTES_PER_PIXEL];

    buffer
        .par_chunks_mut(row_pixels * BYTES_PER_PIXEL)
        .zip(image.pixels().par_chunks(row_pixels))
        .try_for_each(|(row_bytes, row)| {
            for (bytes, pixel) in row_bytes.chunks_exact_mut(BYTES_PER_PIXEL).zip(row) {
                let colour = mapper
                    .map(*pixel)
                    .map_err(GeneratePixelBufferError::ColourMap)?;
                bytes.copy_from_slice(&[colour.r, colour.g, colour.b, colour.a]);
            }

            Ok::<(), GeneratePixelBufferError<CMap::Failure>>(())
        })?;

    Ok(PixelBuffer::from_data(resolution, buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::colour::Colour;
    use crate::core::data::point::Point;

    #[derive(Debug, PartialEq, Error)]
    #[error("StubColourMapError")]
    struct StubError;

    #[derive(Debug)]
    struct StubColourMapSuccess;

    impl ColourMap for StubColourMapSuccess {
        type T = PixelResult;
        type Failure = StubError;

        fn map(&self, value: PixelResult) -> Result<Colour, StubError> {
            let v = value.iterations as u8;
            Ok(Colour::rgba(v, v, v, 255))
        }
    }

    #[derive(Debug)]
    struct StubColourMapFailure;

    impl ColourMap for StubColourMapFailure {
        type T = PixelResult;
        type Failure = StubError;

        fn map(&self, _: PixelResult) -> Result<Colour, StubError> {
            Err(StubError)
        }
    }

    fn image_with_rows(width: u32, height: u32) -> ImageBuffer {
        let mut image = ImageBuffer::with_resolution(width, height).unwrap();
        for mut band in image.split_bands(1).unwrap() {
            for row in 0..band.rows() {
                for (x, slot) in band.row_mut(row).iter_mut().enumerate() {
                    *slot = PixelResult::escaped(row * 10 + x as u32);
                }
            }
        }
        image
    }

    #[test]
    fn test_generates_pixel_buffer_correctly() {
        let image = image_with_rows(3, 2);
        let pixels = generate_pixel_buffer(&image, &StubColourMapSuccess).unwrap();

        assert_eq!(pixels.buffer().len(), 24);
        assert_eq!(pixels.pixel(Point { x: 2, y: 1 }), Ok(Colour::rgba(12, 12, 12, 255)));
        assert_eq!(pixels.pixel(Point { x: 0, y: 0 }), Ok(Colour::rgba(0, 0, 0, 255)));
    }

    #[test]
    fn test_propagates_colour_map_failure() {
        let image = image_with_rows(3, 2);
        let result = generate_pixel_buffer(&image, &StubColourMapFailure);

        assert!(matches!(result, Err(GeneratePixelBufferError::ColourMap(StubError))));
    }

    #[test]
    fn test_image_without_resolution_is_rejected() {
        let result = generate_pixel_buffer(&ImageBuffer::new(), &StubColourMapSuccess);

        assert!(matches!(
            result,
            Err(GeneratePixelBufferError::Image(ImageError::NoResolution))
        ));
    }
}
