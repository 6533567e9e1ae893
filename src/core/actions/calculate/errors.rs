use thiserror::Error;

use crate::core::data::formula_param::FormulaParamKind;
use crate::core::data::image_buffer::ImageError;
use crate::core::data::point::Point;
use crate::core::data::position_params::PositionError;
use crate::protocol::errors::ChannelProtocolError;

/// The parameter list or position was rejected; nothing was computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PluginInitError {
    #[error("formula expects {expected} parameters, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("parameter {index} (`{name}`) must be {expected}, got {actual}")]
    KindMismatch {
        index: usize,
        name: String,
        expected: FormulaParamKind,
        actual: FormulaParamKind,
    },
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] PositionError),
    #[error("plugin is already initialized")]
    AlreadyInitialized,
    #[error("plugin rejected its parameters: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluateError {
    #[error("plugin is not initialized")]
    NotInitialized,
    #[error("plugin failed: {0}")]
    Plugin(String),
}

/// A worker stopped because evaluating one of its pixels failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerFailure {
    #[error("band {band} failed at x:{}, y:{}: {source}", .pixel.x, .pixel.y)]
    Evaluate {
        band: u32,
        pixel: Point,
        source: EvaluateError,
    },
    #[error("band {band} worker panicked")]
    Panicked { band: u32 },
}

#[derive(Debug, Error)]
pub enum CalculateError {
    #[error("image error: {0}")]
    Image(#[from] ImageError),
    #[error("progress channel error: {0}")]
    Channel(#[from] ChannelProtocolError),
    #[error("plugin is not initialized")]
    NotInitialized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_failure_names_pixel() {
        let failure = WorkerFailure::Evaluate {
            band: 2,
            pixel: Point { x: 5, y: 9 },
            source: EvaluateError::Plugin("overflow".to_string()),
        };

        assert_eq!(failure.to_string(), "band 2 failed at x:5, y:9: plugin failed: overflow");
    }

    #[test]
    fn test_arity_mismatch_message() {
        let err = PluginInitError::ArityMismatch {
            expected: 7,
            actual: 3,
        };

        assert_eq!(err.to_string(), "formula expects 7 parameters, got 3");
    }
}
