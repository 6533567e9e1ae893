use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MandelbrotError {
    #[error("unknown bailout function {0}, expected 0 to 5")]
    UnknownBailFunc(i32),
    #[error("bailout must be positive and finite, got {0}")]
    InvalidBailout(f64),
    #[error("power must be between 2 and 8, got {0}")]
    PowerOutOfRange(i32),
}
