use std::fmt;
use std::str::FromStr;

use crate::error::BTableError;

/// A single source value, before it is widened to `f64` for encoding.
///
/// Integers are accepted and widened; this widening is the only input
/// conversion the format performs. Values beyond 2^53 lose precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericInput {
    Float(f64),
    Integer(i64),
}

impl NumericInput {
    /// Widens the value to the `f64` that is stored on disk.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        match self {
            NumericInput::Float(f) => f,
            NumericInput::Integer(i) => i as f64,
        }
    }
}

impl From<f64> for NumericInput {
    fn from(v: f64) -> Self {
        NumericInput::Float(v)
    }
}

impl From<f32> for NumericInput {
    fn from(v: f32) -> Self {
        NumericInput::Float(f64::from(v))
    }
}

impl From<&f64> for NumericInput {
    fn from(v: &f64) -> Self {
        NumericInput::Float(*v)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for NumericInput {
                fn from(v: $t) -> Self {
                    NumericInput::Integer(i64::from(v))
                }
            }
        )*
    };
}

from_integer!(i64, i32, i16, i8, u32, u16, u8);

impl From<NumericInput> for f64 {
    fn from(v: NumericInput) -> Self {
        v.to_f64()
    }
}

/// Parses textual input. Integer literals become `Integer`, anything else
/// Rust accepts as an `f64` (including `NaN`, `inf`, `-0.0`) becomes `Float`.
impl FromStr for NumericInput {
    type Err = BTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(i) = s.parse::<i64>() {
            return Ok(NumericInput::Integer(i));
        }
        s.parse::<f64>()
            .map(NumericInput::Float)
            .map_err(|_| BTableError::InvalidValueType(format!("{:?} is not a number", s)))
    }
}

impl fmt::Display for NumericInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericInput::Float(v) => write!(f, "{}", v),
            NumericInput::Integer(v) => write!(f, "{}", v),
        }
    }
}
