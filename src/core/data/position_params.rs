use thiserror::Error;

/// Number of values in a position parameter list.
pub const N_PARAMS: usize = 11;

pub const XCENTER: usize = 0;
pub const YCENTER: usize = 1;
pub const ZCENTER: usize = 2;
pub const WCENTER: usize = 3;
pub const MAGNITUDE: usize = 4;
pub const XYANGLE: usize = 5;
pub const XZANGLE: usize = 6;
pub const XWANGLE: usize = 7;
pub const YZANGLE: usize = 8;
pub const YWANGLE: usize = 9;
pub const ZWANGLE: usize = 10;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("expected 11 position parameters, got {0}")]
    WrongLength(usize),
    #[error("position parameter {index} is not finite: {value}")]
    NotFinite { index: usize, value: f64 },
    #[error("view size must be positive, got {0}")]
    NonPositiveSize(f64),
}

/// View of the 4D parameter space: centre, size and six plane rotations.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PositionParams {
    values: [f64; N_PARAMS],
}

impl Default for PositionParams {
    /// Whole-set view: centred on the origin, size 4, no rotation.
    fn default() -> Self {
        let mut values = [0.0; N_PARAMS];
        values[MAGNITUDE] = 4.0;
        Self { values }
    }
}

impl PositionParams {
    #[must_use]
    pub fn new(values: [f64; N_PARAMS]) -> Self {
        Self { values }
    }

    pub fn from_slice(values: &[f64]) -> Result<Self, PositionError> {
        let values: [f64; N_PARAMS] = values
            .try_into()
            .map_err(|_| PositionError::WrongLength(values.len()))?;

        Ok(Self { values })
    }

    pub fn validate(&self) -> Result<(), PositionError> {
        if let Some((index, &value)) = self.values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(PositionError::NotFinite { index, value });
        }

        if self.size() <= 0.0 {
            return Err(PositionError::NonPositiveSize(self.size()));
        }

        Ok(())
    }

    #[must_use]
    pub fn centre(&self) -> [f64; 4] {
        [
            self.values[XCENTER],
            self.values[YCENTER],
            self.values[ZCENTER],
            self.values[WCENTER],
        ]
    }

    #[must_use]
    pub fn size(&self) -> f64 {
        self.values[MAGNITUDE]
    }

    /// Rotation angles in XY, XZ, XW, YZ, YW, ZW order.
    #[must_use]
    pub fn angles(&self) -> [f64; 6] {
        [
            self.values[XYANGLE],
            self.values[XZANGLE],
            self.values[XWANGLE],
            self.values[YZANGLE],
            self.values[YWANGLE],
            self.values[ZWANGLE],
        ]
    }

    #[must_use]
    pub fn as_array(&self) -> &[f64; N_PARAMS] {
        &self.values
    }
}
