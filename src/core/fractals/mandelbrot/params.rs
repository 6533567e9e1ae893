use crate::core::data::formula_param::{FormulaParam, FormulaParamKind, ParameterSpec};
use crate::core::fractals::mandelbrot::bailout::BailFunc;
use crate::core::fractals::mandelbrot::errors::MandelbrotError;

pub const DEFAULT_BAILOUT: f64 = 4.0;
pub const DEFAULT_POWER: u32 = 2;
pub const MAX_POWER: u32 = 8;

#[must_use]
pub fn mandelbrot_parameter_spec() -> ParameterSpec {
    ParameterSpec::new()
        .with("bailfunc", FormulaParamKind::Int)
        .with("bailout", FormulaParamKind::Real)
        .with("power", FormulaParamKind::Int)
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MandelbrotParams {
    bailfunc: BailFunc,
    bailout: f64,
    power: u32,
}

impl Default for MandelbrotParams {
    fn default() -> Self {
        Self {
            bailfunc: BailFunc::default(),
            bailout: DEFAULT_BAILOUT,
            power: DEFAULT_POWER,
        }
    }
}

impl MandelbrotParams {
    pub fn new(bailfunc: i32, bailout: f64, power: i32) -> Result<Self, MandelbrotError> {
        let bailfunc = BailFunc::from_index(bailfunc).ok_or(MandelbrotError::UnknownBailFunc(bailfunc))?;

        if !bailout.is_finite() || bailout <= 0.0 {
            return Err(MandelbrotError::InvalidBailout(bailout));
        }

        let power = u32::try_from(power)
            .ok()
            .filter(|p| (DEFAULT_POWER..=MAX_POWER).contains(p))
            .ok_or(MandelbrotError::PowerOutOfRange(power))?;

        Ok(Self {
            bailfunc,
            bailout,
            power,
        })
    }

    /// Reads a list already checked against [`mandelbrot_parameter_spec`].
    pub fn from_formula_params(params: &[FormulaParam]) -> Result<Self, MandelbrotError> {
        let defaults = Self::default();
        let bailfunc = params.first().and_then(FormulaParam::as_int).unwrap_or(0);
        let bailout = params.get(1).and_then(FormulaParam::as_real).unwrap_or(defaults.bailout);
        let power = params
            .get(2)
            .and_then(FormulaParam::as_int)
            .unwrap_or(defaults.power as i32);

        Self::new(bailfunc, bailout, power)
    }

    /// The list matching [`MandelbrotParams::default`].
    #[must_use]
    pub fn default_formula_params() -> Vec<FormulaParam> {
        vec![
            FormulaParam::Int(0),
            FormulaParam::Real(DEFAULT_BAILOUT),
            FormulaParam::Int(DEFAULT_POWER as i32),
        ]
    }

    #[must_use]
    pub fn bailfunc(&self) -> BailFunc {
        self.bailfunc
    }

    #[must_use]
    pub fn bailout(&self) -> f64 {
        self.bailout
    }

    #[must_use]
    pub fn power(&self) -> u32 {
        self.power
    }
}
