use crate::core::actions::calculate::errors::{EvaluateError, PluginInitError};
use crate::core::actions::calculate::ports::computation_plugin::ComputationPlugin;
use crate::core::data::complex::Complex;
use crate::core::data::formula_param::{FormulaParam, ParameterSpec};
use crate::core::data::image_buffer::PixelResult;
use crate::core::data::point::Point;
use crate::core::data::position_params::PositionParams;
use crate::core::fractals::mandelbrot::params::{MandelbrotParams, mandelbrot_parameter_spec};
use crate::core::util::pixel_to_view_coords::Point4;

/// `z -> z^power + c`, with `c` from the first two coordinates of the point
/// and the starting `z` from the last two.
#[derive(Debug)]
pub struct MandelbrotAlgorithm {
    spec: ParameterSpec,
    params: Option<MandelbrotParams>,
}

impl Default for MandelbrotAlgorithm {
    fn default() -> Self {
        Self::new()
    }
}

impl MandelbrotAlgorithm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            spec: mandelbrot_parameter_spec(),
            params: None,
        }
    }

    #[must_use]
    pub fn iterate(params: &MandelbrotParams, point: Point4, max_iterations: u32) -> PixelResult {
        let c = Complex {
            real: point[0],
            imag: point[1],
        };
        let mut z = Complex {
            real: point[2],
            imag: point[3],
        };

        for iteration in 0..max_iterations {
            if params.bailfunc().measure(z) > params.bailout() {
                return PixelResult::escaped(iteration);
            }
            z = z.powi(params.power()) + c;
        }

        PixelResult::inside(max_iterations)
    }
}

impl ComputationPlugin for MandelbrotAlgorithm {
    fn name(&self) -> &str {
        "mandelbrot"
    }

    fn parameter_spec(&self) -> &ParameterSpec {
        &self.spec
    }

    fn initialize(
        &mut self,
        _position: &PositionParams,
        params: &[FormulaParam],
    ) -> Result<(), PluginInitError> {
        let params = MandelbrotParams::from_formula_params(params)
            .map_err(|err| PluginInitError::Rejected(err.to_string()))?;

        self.params = Some(params);
        Ok(())
    }

    fn evaluate(
        &self,
        point: Point4,
        _pixel: Point,
        max_iterations: u32,
    ) -> Result<PixelResult, EvaluateError> {
        let params = self.params.as_ref().ok_or(EvaluateError::NotInitialized)?;

        Ok(Self::iterate(params, point, max_iterations))
    }

    fn teardown(&mut self) {
        self.params = None;
    }
}
