//! Dimension checks on the arguments and results of numeric law functions.

use super::dimension::Dimension;
use super::quantity::{collect_expression_and_dimension, Quantity};
use crate::errors::{PhysicsError, Result};
use crate::symbolic::{Expr, Number};

/// Anything whose dimension can be checked.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionOperand {
    Dimension(Dimension),
    Quantity(Quantity),
    Expr(Expr),
}

impl DimensionOperand {
    /// The operand's dimension and whether it is a bare number, such as `3`
    /// or `2*pi`.
    fn reduce(&self) -> Result<(Dimension, bool)> {
        match self {
            DimensionOperand::Dimension(d) => Ok((*d, false)),
            DimensionOperand::Quantity(q) => Ok((q.dimension(), false)),
            DimensionOperand::Expr(expr) => {
                let (_, dimension) = collect_expression_and_dimension(expr)?;
                let bare = expr.free_symbols().is_empty()
                    && !expr.has_units()
                    && !expr.has_applied();
                Ok((dimension, bare))
            }
        }
    }
}

impl From<Dimension> for DimensionOperand {
    fn from(d: Dimension) -> Self {
        DimensionOperand::Dimension(d)
    }
}

impl From<Quantity> for DimensionOperand {
    fn from(q: Quantity) -> Self {
        DimensionOperand::Quantity(q)
    }
}

impl From<&Quantity> for DimensionOperand {
    fn from(q: &Quantity) -> Self {
        DimensionOperand::Quantity(q.clone())
    }
}

impl From<Expr> for DimensionOperand {
    fn from(e: Expr) -> Self {
        DimensionOperand::Expr(e)
    }
}

impl From<&Expr> for DimensionOperand {
    fn from(e: &Expr) -> Self {
        DimensionOperand::Expr(e.clone())
    }
}

impl From<Number> for DimensionOperand {
    fn from(n: Number) -> Self {
        DimensionOperand::Expr(Expr::Num(n))
    }
}

impl From<i64> for DimensionOperand {
    fn from(n: i64) -> Self {
        DimensionOperand::Expr(Expr::int(n))
    }
}

impl From<i32> for DimensionOperand {
    fn from(n: i32) -> Self {
        DimensionOperand::Expr(Expr::int(n as i64))
    }
}

impl From<f64> for DimensionOperand {
    fn from(f: f64) -> Self {
        DimensionOperand::Expr(Expr::from(f))
    }
}

/// Checks that `arg`, passed as parameter `param` of `func`, has a dimension
/// equivalent to `expected`.
///
/// The any-dimension sentinel on either side always passes, and angles count
/// as dimensionless. A bare number compared against a dimensioned expectation
/// is a [`PhysicsError::NotDimensionless`] error; any other mismatch is a
/// [`PhysicsError::UnitsMismatch`].
pub fn assert_equivalent_dimension(
    arg: impl Into<DimensionOperand>,
    param: &str,
    func: &str,
    expected: impl Into<DimensionOperand>,
) -> Result<()> {
    let (actual, bare_number) = arg.into().reduce()?;
    let (expected, _) = expected.into().reduce()?;
    if actual.is_any() || expected.is_any() {
        return Ok(());
    }
    let (actual, expected) = (actual.normalized(), expected.normalized());
    if bare_number {
        if expected.is_dimensionless() {
            return Ok(());
        }
        return Err(PhysicsError::NotDimensionless {
            param: param.to_string(),
            func: func.to_string(),
            expected: expected.to_string(),
        });
    }
    if actual == expected {
        return Ok(());
    }
    Err(PhysicsError::UnitsMismatch {
        param: param.to_string(),
        func: func.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

/// Checks every `(name, value, expected dimension)` argument of `func`.
pub fn validate_input(func: &str, args: &[(&str, DimensionOperand, Dimension)]) -> Result<()> {
    for (param, value, expected) in args {
        assert_equivalent_dimension(value.clone(), param, func, *expected)?;
    }
    Ok(())
}

/// Checks the dimension of the value returned by `func` and passes it on.
pub fn validate_output<T>(func: &str, expected: Dimension, value: T) -> Result<T>
where
    T: Clone + Into<DimensionOperand>,
{
    assert_equivalent_dimension(value.clone(), "return", func, expected)?;
    Ok(value)
}
