use crate::core::data::complex::Complex;

/// Measure compared against the bailout value to decide escape.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum BailFunc {
    /// `re² + im²`
    #[default]
    Mag,
    /// `(|re| + |im|)²`
    Manhattan,
    /// `re + im`
    Manhattanish,
    /// `max(re², im²)`
    MaxOfXY,
    /// `re²`
    Real,
    /// `im²`
    Imag,
}

impl BailFunc {
    #[must_use]
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::Mag),
            1 => Some(Self::Manhattan),
            2 => Some(Self::Manhattanish),
            3 => Some(Self::MaxOfXY),
            4 => Some(Self::Real),
            5 => Some(Self::Imag),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn measure(self, z: Complex) -> f64 {
        match self {
            Self::Mag => z.magnitude_squared(),
            Self::Manhattan => {
                let sum = z.real.abs() + z.imag.abs();
                sum * sum
            }
            Self::Manhattanish => z.real + z.imag,
            Self::MaxOfXY => (z.real * z.real).max(z.imag * z.imag),
            Self::Real => z.real * z.real,
            Self::Imag => z.imag * z.imag,
        }
    }
}
