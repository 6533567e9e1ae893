use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("resolution must be at least 1x1: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Result<Self, ResolutionError> {
        if width == 0 || height == 0 {
            return Err(ResolutionError::InvalidSize { width, height });
        }

        Ok(Self { width, height })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_dimensions() {
        let resolution = Resolution::new(640, 480).unwrap();

        assert_eq!(resolution.width(), 640);
        assert_eq!(resolution.height(), 480);
        assert_eq!(resolution.pixel_count(), 307_200);
    }

    #[test]
    fn test_resolution_rejects_zero_sides() {
        assert_eq!(
            Resolution::new(0, 10),
            Err(ResolutionError::InvalidSize { width: 0, height: 10 })
        );
        assert_eq!(
            Resolution::new(10, 0),
            Err(ResolutionError::InvalidSize { width: 10, height: 0 })
        );
    }

    #[test]
    fn test_single_pixel_resolution_is_valid() {
        assert!(Resolution::new(1, 1).is_ok());
    }
}
