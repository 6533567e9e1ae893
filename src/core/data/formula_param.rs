use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::core::actions::calculate::errors::PluginInitError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FormulaParamKind {
    Int,
    Real,
}

impl fmt::Display for FormulaParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Real => write!(f, "real"),
        }
    }
}

impl FromStr for FormulaParamKind {
    type Err = ParseFormulaParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "int" => Ok(Self::Int),
            "real" | "float" => Ok(Self::Real),
            other => Err(ParseFormulaParamError::UnknownKind(other.to_string())),
        }
    }
}

/// One value of a formula's parameter list.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FormulaParam {
    Int(i32),
    Real(f64),
}

impl FormulaParam {
    #[must_use]
    pub fn kind(&self) -> FormulaParamKind {
        match self {
            Self::Int(_) => FormulaParamKind::Int,
            Self::Real(_) => FormulaParamKind::Real,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Real(_) => None,
        }
    }

    #[must_use]
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(value) => Some(*value),
            Self::Int(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFormulaParamError {
    #[error("expected `kind:value`, got `{0}`")]
    MissingSeparator(String),
    #[error("unknown parameter kind `{0}`, expected `int` or `real`")]
    UnknownKind(String),
    #[error("invalid {kind} value `{value}`")]
    InvalidValue { kind: FormulaParamKind, value: String },
}

/// Parses `int:3` or `real:4.0`.
impl FromStr for FormulaParam {
    type Err = ParseFormulaParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, value) = s
            .split_once(':')
            .ok_or_else(|| ParseFormulaParamError::MissingSeparator(s.to_string()))?;
        let kind: FormulaParamKind = kind.parse()?;
        let invalid = || ParseFormulaParamError::InvalidValue {
            kind,
            value: value.to_string(),
        };

        match kind {
            FormulaParamKind::Int => value.trim().parse().map(Self::Int).map_err(|_| invalid()),
            FormulaParamKind::Real => value.trim().parse().map(Self::Real).map_err(|_| invalid()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: String,
    pub kind: FormulaParamKind,
}

/// Ordered parameter declaration of a formula.
///
/// A supplied parameter list must match it exactly, in count and in kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParameterSpec {
    decls: Vec<ParamDecl>,
}

impl ParameterSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, kind: FormulaParamKind) -> Self {
        self.decls.push(ParamDecl {
            name: name.into(),
            kind,
        });
        self
    }

    /// Declares one unnamed parameter per kind, named by position.
    #[must_use]
    pub fn from_kinds(kinds: &[FormulaParamKind]) -> Self {
        kinds
            .iter()
            .enumerate()
            .fold(Self::new(), |spec, (index, &kind)| spec.with(format!("p{index}"), kind))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    #[must_use]
    pub fn decls(&self) -> &[ParamDecl] {
        &self.decls
    }

    pub fn validate(&self, params: &[FormulaParam]) -> Result<(), PluginInitError> {
        if params.len() != self.decls.len() {
            return Err(PluginInitError::ArityMismatch {
                expected: self.decls.len(),
                actual: params.len(),
            });
        }

        for (index, (decl, param)) in self.decls.iter().zip(params).enumerate() {
            if decl.kind != param.kind() {
                return Err(PluginInitError::KindMismatch {
                    index,
                    name: decl.name.clone(),
                    expected: decl.kind,
                    actual: param.kind(),
                });
            }
        }

        Ok(())
    }
}
