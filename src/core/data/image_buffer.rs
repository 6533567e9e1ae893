use thiserror::Error;

use crate::core::data::point::Point;
use crate::core::data::resolution::{Resolution, ResolutionError};
use crate::core::util::calculate_bands::band_row_ranges;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("image has no resolution set")]
    NoResolution,
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

/// What happened to a point when it was iterated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Fate {
    /// Not written by any worker yet.
    #[default]
    Unset,
    Escaped,
    Inside,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PixelResult {
    pub iterations: u32,
    pub fate: Fate,
}

impl PixelResult {
    #[must_use]
    pub fn escaped(iterations: u32) -> Self {
        Self {
            iterations,
            fate: Fate::Escaped,
        }
    }

    #[must_use]
    pub fn inside(iterations: u32) -> Self {
        Self {
            iterations,
            fate: Fate::Inside,
        }
    }
}

/// Per-pixel iteration results for one calculation.
///
/// The resolution is fixed with [`ImageBuffer::set_resolution`] before a job
/// starts. While a job runs the buffer is mutably borrowed by
/// [`ImageBuffer::split_bands`], so it cannot be resized underneath the workers.
#[derive(Debug, Clone, Default)]
pub struct ImageBuffer {
    resolution: Option<Resolution>,
    pixels: Vec<PixelResult>,
}

impl ImageBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolution(width: u32, height: u32) -> Result<Self, ImageError> {
        let mut image = Self::new();
        image.set_resolution(width, height)?;
        Ok(image)
    }

    /// Allocates storage for `width` x `height` pixels, discarding earlier results.
    pub fn set_resolution(&mut self, width: u32, height: u32) -> Result<(), ImageError> {
        let resolution = Resolution::new(width, height)?;

        self.pixels = vec![PixelResult::default(); resolution.pixel_count()];
        self.resolution = Some(resolution);

        Ok(())
    }

    #[must_use]
    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    #[must_use]
    pub fn pixels(&self) -> &[PixelResult] {
        &self.pixels
    }

    #[must_use]
    pub fn get(&self, point: Point) -> Option<PixelResult> {
        let resolution = self.resolution?;

        if point.x >= resolution.width() || point.y >= resolution.height() {
            return None;
        }

        let index = point.y as usize * resolution.width() as usize + point.x as usize;
        self.pixels.get(index).copied()
    }

    /// Resets every pixel to [`Fate::Unset`], keeping the resolution.
    pub fn clear(&mut self) {
        self.pixels.fill(PixelResult::default());
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.resolution.is_some() && self.pixels.iter().all(|p| p.fate != Fate::Unset)
    }

    /// Splits the image into at most `bands` horizontal bands of whole rows.
    ///
    /// Bands are disjoint and cover every row; the last band takes any
    /// remainder rows. Fewer bands are returned when the image has fewer rows.
    pub fn split_bands(&mut self, bands: u32) -> Result<Vec<ImageBand<'_>>, ImageError> {
        let resolution = self.resolution.ok_or(ImageError::NoResolution)?;
        let width = resolution.width();
        let row_len = width as usize;

        let mut rest: &mut [PixelResult] = &mut self.pixels;
        let mut result = Vec::new();

        for (index, rows) in band_row_ranges(resolution.height(), bands).into_iter().enumerate() {
            let (band, tail) = rest.split_at_mut((rows.end - rows.start) as usize * row_len);
            rest = tail;

            result.push(ImageBand {
                index: index as u32,
                first_row: rows.start,
                width,
                pixels: band,
            });
        }

        Ok(result)
    }
}

/// Exclusive view of a run of whole rows of an [`ImageBuffer`].
#[derive(Debug)]
pub struct ImageBand<'a> {
    index: u32,
    first_row: u32,
    width: u32,
    pixels: &'a mut [PixelResult],
}

impl ImageBand<'_> {
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[must_use]
    pub fn first_row(&self) -> u32 {
        self.first_row
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn rows(&self) -> u32 {
        (self.pixels.len() / self.width as usize) as u32
    }

    /// Mutable access to the band-relative row `local_row`.
    pub fn row_mut(&mut self, local_row: u32) -> &mut [PixelResult] {
        let start = local_row as usize * self.width as usize;
        &mut self.pixels[start..start + self.width as usize]
    }
}
