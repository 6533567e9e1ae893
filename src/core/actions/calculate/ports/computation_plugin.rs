use crate::core::actions::calculate::errors::{EvaluateError, PluginInitError};
use crate::core::data::formula_param::{FormulaParam, ParameterSpec};
use crate::core::data::image_buffer::PixelResult;
use crate::core::data::point::Point;
use crate::core::data::position_params::PositionParams;
use crate::core::util::pixel_to_view_coords::Point4;

/// Whether a plugin may be evaluated from several threads at once.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Concurrency {
    #[default]
    Shared,
    Serialized,
}

/// Per-pixel point function supplied by a formula.
///
/// `initialize` is called once before any `evaluate`, `teardown` once after
/// the last `evaluate` returned. After initialization `evaluate` takes
/// `&self` and may run on many workers at once unless the plugin reports
/// [`Concurrency::Serialized`].
pub trait ComputationPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn parameter_spec(&self) -> &ParameterSpec;

    fn concurrency(&self) -> Concurrency {
        Concurrency::Shared
    }

    fn initialize(
        &mut self,
        position: &PositionParams,
        params: &[FormulaParam],
    ) -> Result<(), PluginInitError>;

    fn evaluate(
        &self,
        point: Point4,
        pixel: Point,
        max_iterations: u32,
    ) -> Result<PixelResult, EvaluateError>;

    fn teardown(&mut self);
}
