/// The scalar result of one kernel invocation, kept for cross-checking variants.
///
/// Equality is strict, including for floating point: differences caused by the order in which
/// partial results were combined are reported, not hidden.
#[derive(Clone, Copy, Debug, derive_more::Display, PartialEq)]
#[expect(clippy::exhaustive_enums, reason = "kernels produce either integers or floats")]
pub enum Value {
    /// An integer result.
    #[display("{_0}")]
    Integer(i64),

    /// A floating-point result.
    #[display("{_0}")]
    Float(f64),
}

impl Value {
    /// `self - other`, wrapping for integers.
    #[must_use]
    pub fn difference(self, other: Self) -> Self {
        match (self, other) {
            (Self::Integer(left), Self::Integer(right)) => Self::Integer(left.wrapping_sub(right)),
            (left, right) => Self::Float(left.as_f64() - right.as_f64()),
        }
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "only used to report differences between mixed results, rounding is acceptable"
    )]
    fn as_f64(self) -> f64 {
        match self {
            Self::Integer(value) => value as f64,
            Self::Float(value) => value,
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_difference() {
        assert_eq!(Value::from(10).difference(Value::from(-3)), Value::Integer(13));
        assert_eq!(
            Value::from(i64::MIN).difference(Value::from(1_i64)),
            Value::Integer(i64::MAX)
        );
    }

    #[test]
    fn float_equality_is_strict() {
        let sum = 0.1 + 0.2;

        assert_ne!(Value::from(sum), Value::from(0.3));
        assert_eq!(Value::from(sum), Value::from(0.1 + 0.2));
    }

    #[test]
    fn display_is_plain_number() {
        assert_eq!(Value::from(-7).to_string(), "-7");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
    }
}
