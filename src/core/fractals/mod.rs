pub mod mandelbrot;

use std::fmt;
use std::str::FromStr;

use crate::core::actions::calculate::handle::ComputationHandle;
use crate::core::data::formula_param::FormulaParam;
use crate::core::fractals::mandelbrot::algorithm::MandelbrotAlgorithm;
use crate::core::fractals::mandelbrot::params::MandelbrotParams;

/// Point functions compiled into the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuiltinPlugin {
    #[default]
    Mandelbrot,
}

impl BuiltinPlugin {
    pub const ALL: &'static [Self] = &[Self::Mandelbrot];

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Mandelbrot => "mandelbrot",
        }
    }

    #[must_use]
    pub fn default_params(self) -> Vec<FormulaParam> {
        match self {
            Self::Mandelbrot => MandelbrotParams::default_formula_params(),
        }
    }

    #[must_use]
    pub fn handle(self) -> ComputationHandle {
        match self {
            Self::Mandelbrot => ComputationHandle::new(Box::new(MandelbrotAlgorithm::new())),
        }
    }
}

impl fmt::Display for BuiltinPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for BuiltinPlugin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.display_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown builtin formula `{s}`"))
    }
}
