//! Dimensioned scalar values and the dimension collectors.

use super::dimension::{dimension_to_si_unit, Dimension};
use super::unit::Unit;
use crate::errors::{PhysicsError, Result};
use crate::symbolic::{Expr, Func, Number};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectMode {
    /// Only numbers, constants and units may appear.
    Strict,
    /// Free symbols, applied functions and derivative nodes are allowed.
    Tolerant,
}

/// Splits a numeric expression with units into its SI scale factor and
/// dimension.
///
/// Every leaf must be a number, a constant or a unit. Free symbols and
/// applied functions are invalid; derivative nodes are not implemented.
pub fn collect_quantity_factor_and_dimension(expr: &Expr) -> Result<(Expr, Dimension)> {
    collect(expr, CollectMode::Strict)
}

/// Like [`collect_quantity_factor_and_dimension`], but symbols contribute
/// their declared dimension and stay in the returned factor.
pub fn collect_expression_and_dimension(expr: &Expr) -> Result<(Expr, Dimension)> {
    collect(expr, CollectMode::Tolerant)
}

fn number_dimension(n: &Number) -> Dimension {
    if n.is_zero() || !n.is_finite() {
        Dimension::Any
    } else {
        Dimension::DIMENSIONLESS
    }
}

fn require_dimensionless(what: &str, dimension: &Dimension) -> Result<()> {
    if dimension.is_any() || dimension.is_dimensionless() {
        Ok(())
    } else {
        Err(PhysicsError::IncompatibleDimensions(format!(
            "{what} must be dimensionless, got {dimension}"
        )))
    }
}

/// Common dimension of operands that must agree (sums, min/max, atan2).
fn common_dimension<'a>(what: &str, dims: impl Iterator<Item = &'a Dimension>) -> Result<Dimension> {
    let mut common = Dimension::Any;
    for dim in dims {
        common = common.try_add(dim).map_err(|_| {
            PhysicsError::IncompatibleDimensions(format!(
                "operands of {what} have dimensions {common} and {dim}"
            ))
        })?;
    }
    Ok(common)
}

fn collect(expr: &Expr, mode: CollectMode) -> Result<(Expr, Dimension)> {
    match expr {
        Expr::Num(n) => Ok((expr.clone(), number_dimension(n))),
        Expr::Const(_) => Ok((expr.clone(), Dimension::DIMENSIONLESS)),
        Expr::Unit(unit) => Ok((Expr::Num(unit.scale()), unit.dimension())),
        Expr::Sym(symbol) => match mode {
            CollectMode::Tolerant => Ok((expr.clone(), symbol.dimension())),
            CollectMode::Strict => Err(PhysicsError::InvalidValue(format!(
                "free symbol '{symbol}' in a quantity"
            ))),
        },
        Expr::Mul(factors) => {
            let mut scale = Vec::with_capacity(factors.len());
            let mut dimension = Dimension::DIMENSIONLESS;
            for factor in factors {
                let (f, d) = collect(factor, mode)?;
                scale.push(f);
                dimension = dimension * d;
            }
            Ok((Expr::mul(scale), dimension))
        }
        Expr::Add(terms) => {
            let collected = terms
                .iter()
                .map(|t| collect(t, mode))
                .collect::<Result<Vec<_>>>()?;
            let dimension = common_dimension("a sum", collected.iter().map(|(_, d)| d))?;
            Ok((Expr::add(collected.into_iter().map(|(f, _)| f)), dimension))
        }
        Expr::Pow(base, exponent) => {
            let (base_factor, base_dim) = collect(base, mode)?;
            let (exp_factor, exp_dim) = collect(exponent, mode)?;
            require_dimensionless("an exponent", &exp_dim)?;
            let dimension = if base_dim.is_any() || base_dim.is_dimensionless() {
                // angle^x keeps its angle exponent only for numeric x
                match exp_factor.as_number() {
                    Some(n) => base_dim.pow(n),
                    None => Dimension::DIMENSIONLESS,
                }
            } else {
                let n = exp_factor.as_number().ok_or_else(|| {
                    PhysicsError::IncompatibleDimensions(format!(
                        "dimensioned base {base_dim} raised to non-numeric exponent {exp_factor}"
                    ))
                })?;
                base_dim.pow(n)
            };
            Ok((Expr::pow(base_factor, exp_factor), dimension))
        }
        Expr::Func(func, args) => {
            let collected = args
                .iter()
                .map(|a| collect(a, mode))
                .collect::<Result<Vec<_>>>()?;
            let (factors, dims): (Vec<Expr>, Vec<Dimension>) = collected.into_iter().unzip();
            let dimension = match func {
                Func::Abs => dims.first().copied().unwrap_or(Dimension::DIMENSIONLESS),
                Func::Min | Func::Max => common_dimension(func.name(), dims.iter())?,
                Func::Sign => Dimension::DIMENSIONLESS,
                Func::Atan2 => {
                    common_dimension("atan2", dims.iter())?;
                    Dimension::DIMENSIONLESS
                }
                _ => {
                    for dim in &dims {
                        require_dimensionless(&format!("the argument of {}", func.name()), dim)?;
                    }
                    Dimension::DIMENSIONLESS
                }
            };
            Ok((Expr::func(*func, factors), dimension))
        }
        Expr::Applied(func, args) => match mode {
            CollectMode::Tolerant => {
                for arg in args {
                    collect(arg, mode)?;
                }
                Ok((expr.clone(), func.dimension()))
            }
            CollectMode::Strict => Err(PhysicsError::InvalidValue(format!(
                "undefined function '{}' in a quantity",
                func.name()
            ))),
        },
        Expr::Derivative(inner, var) => match mode {
            CollectMode::Tolerant => {
                let (_, inner_dim) = collect(inner, mode)?;
                Ok((expr.clone(), inner_dim / var.dimension()))
            }
            CollectMode::Strict => Err(PhysicsError::NotImplemented(
                "derivatives inside quantities".to_string(),
            )),
        },
    }
}

/// A number tagged with a dimension. The scale factor is in SI units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    scale_factor: Expr,
    dimension: Dimension,
}

impl Quantity {
    /// Builds a quantity from an expression such as `3 * kilometer`.
    pub fn new(expr: impl Into<Expr>) -> Result<Self> {
        let (scale_factor, dimension) = collect_quantity_factor_and_dimension(&expr.into())?;
        Ok(Self::from_parts(scale_factor, dimension))
    }

    /// Builds a quantity from an SI scale factor and an explicit dimension.
    pub fn with_dimension(scale_factor: impl Into<Expr>, dimension: Dimension) -> Result<Self> {
        let scale_factor = scale_factor.into();
        if !scale_factor.free_symbols().is_empty() || scale_factor.has_units() {
            return Err(PhysicsError::InvalidValue(format!(
                "quantity scale factor must be a pure number, got {scale_factor}"
            )));
        }
        Ok(Self::from_parts(scale_factor, dimension))
    }

    fn from_parts(scale_factor: Expr, dimension: Dimension) -> Self {
        let dimension = match scale_factor.as_number() {
            Some(n) if n.is_zero() || !n.is_finite() => Dimension::Any,
            _ => dimension,
        };
        Self {
            scale_factor,
            dimension,
        }
    }

    pub fn scale_factor(&self) -> &Expr {
        &self.scale_factor
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Numeric SI value.
    pub fn value(&self) -> Result<f64> {
        self.scale_factor.eval_constant().ok_or_else(|| {
            PhysicsError::Evaluation(format!("{} is not numeric", self.scale_factor))
        })
    }

    pub fn try_add(&self, other: &Quantity) -> Result<Quantity> {
        let dimension = self.dimension.try_add(&other.dimension)?;
        Ok(Self::from_parts(
            Expr::add([self.scale_factor.clone(), other.scale_factor.clone()]),
            dimension,
        ))
    }

    pub fn try_sub(&self, other: &Quantity) -> Result<Quantity> {
        let dimension = self.dimension.try_add(&other.dimension)?;
        Ok(Self::from_parts(
            Expr::sub(self.scale_factor.clone(), other.scale_factor.clone()),
            dimension,
        ))
    }

    /// Raises to a dimensionless power.
    pub fn pow(&self, exponent: &Quantity) -> Result<Quantity> {
        require_dimensionless("an exponent", &exponent.dimension)?;
        let dimension = match exponent.scale_factor.as_number() {
            Some(n) => self.dimension.pow(n),
            None if self.dimension.is_dimensionless() => self.dimension,
            None => {
                return Err(PhysicsError::IncompatibleDimensions(format!(
                    "{} raised to non-numeric exponent {}",
                    self.dimension, exponent.scale_factor
                )))
            }
        };
        Ok(Self::from_parts(
            Expr::pow(self.scale_factor.clone(), exponent.scale_factor.clone()),
            dimension,
        ))
    }

    pub fn powi(&self, exponent: i64) -> Quantity {
        Self::from_parts(
            Expr::powi(self.scale_factor.clone(), exponent),
            self.dimension.pow(Number::int(exponent)),
        )
    }

    /// Re-expresses the quantity as a multiple of `unit`.
    pub fn convert_to(&self, unit: &Unit) -> Result<Expr> {
        if !self.dimension.is_equivalent(&unit.dimension()) {
            return Err(PhysicsError::IncompatibleDimensions(format!(
                "cannot convert {} to {}",
                self.dimension,
                unit.name()
            )));
        }
        let value = Expr::div(self.scale_factor.clone(), Expr::Num(unit.scale()));
        Ok(Expr::mul([value, unit.to_expr()]))
    }

    /// The quantity as `scale * SI unit`.
    pub fn to_expr(&self) -> Expr {
        match dimension_to_si_unit(&self.dimension) {
            Ok(unit) => Expr::mul([self.scale_factor.clone(), unit]),
            Err(_) => self.scale_factor.clone(),
        }
    }
}

impl std::ops::Mul for &Quantity {
    type Output = Quantity;

    fn mul(self, rhs: &Quantity) -> Quantity {
        Quantity::from_parts(
            Expr::mul([self.scale_factor.clone(), rhs.scale_factor.clone()]),
            self.dimension * rhs.dimension,
        )
    }
}

impl std::ops::Mul for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        &self * &rhs
    }
}

impl std::ops::Div for &Quantity {
    type Output = Quantity;

    fn div(self, rhs: &Quantity) -> Quantity {
        Quantity::from_parts(
            Expr::div(self.scale_factor.clone(), rhs.scale_factor.clone()),
            self.dimension / rhs.dimension,
        )
    }
}

impl std::ops::Div for Quantity {
    type Output = Quantity;

    fn div(self, rhs: Quantity) -> Quantity {
        &self / &rhs
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_expr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::Symbol;
    use crate::units::unit::{self, of};

    #[test]
    fn scaled_units_collect_to_si() {
        let q = Quantity::new(of(3, unit::kilometer())).expect("quantity");
        assert_eq!(q.scale_factor(), &Expr::int(3000));
        assert_eq!(q.dimension(), Dimension::LENGTH);
    }

    #[test]
    fn composite_expression() {
        // (6 m) / (2 s)^2
        let expr = Expr::div(
            of(6, unit::meter()),
            Expr::powi(of(2, unit::second()), 2),
        );
        let q = Quantity::new(expr).expect("quantity");
        assert_eq!(q.scale_factor(), &Expr::rational(3, 2));
        assert_eq!(q.dimension(), Dimension::ACCELERATION);
    }

    #[test]
    fn mismatched_sum_fails() {
        let expr = of(1, unit::meter()) + of(1, unit::second());
        let err = Quantity::new(expr).expect_err("meter + second");
        assert!(err.is_units_error());
    }

    #[test]
    fn zero_has_any_dimension() {
        let zero = Quantity::with_dimension(0, Dimension::LENGTH).expect("quantity");
        assert!(zero.dimension().is_any());
        let sum = zero
            .try_add(&Quantity::new(of(2, unit::second())).expect("quantity"))
            .expect("zero + time");
        assert_eq!(sum.dimension(), Dimension::TIME);
    }

    #[test]
    fn strict_rejects_symbols_tolerant_keeps_them() {
        let x = Symbol::new("x", Dimension::LENGTH);
        let expr = Expr::from(&x) * Expr::int(2);
        assert!(matches!(
            collect_quantity_factor_and_dimension(&expr),
            Err(PhysicsError::InvalidValue(_))
        ));
        let (factor, dim) = collect_expression_and_dimension(&expr).expect("tolerant");
        assert_eq!(factor, expr);
        assert_eq!(dim, Dimension::LENGTH);
    }

    #[test]
    fn derivative_dimension_divides() {
        let t = Symbol::new("t", Dimension::TIME);
        let x = crate::symbolic::AppliedFunction::new("x", Dimension::LENGTH);
        let velocity = Expr::derivative(x.apply(vec![Expr::from(&t)]), t);
        let (_, dim) = collect_expression_and_dimension(&velocity).expect("tolerant");
        assert_eq!(dim, Dimension::VELOCITY);
        assert!(matches!(
            collect_quantity_factor_and_dimension(&velocity),
            Err(PhysicsError::NotImplemented(_))
        ));
    }

    #[test]
    fn transcendental_arguments_must_be_dimensionless() {
        let ok = Expr::sin(of(2, unit::radian()));
        assert!(Quantity::new(ok).is_ok());
        let bad = Expr::exp(of(2, unit::meter()));
        assert!(Quantity::new(bad).expect_err("exp(meter)").is_units_error());
    }

    #[test]
    fn convert_between_units() {
        let q = Quantity::new(of(2, unit::hour())).expect("quantity");
        assert_eq!(
            q.convert_to(&unit::minute()).expect("convert"),
            of(120, unit::minute())
        );
        assert!(q.convert_to(&unit::meter()).is_err());
    }

    #[test]
    fn arithmetic_derives_dimensions() {
        let m = Quantity::new(of(2, unit::kilogram())).expect("mass");
        let a = Quantity::new(of(3, unit::meter()) / Expr::powi(Expr::Unit(unit::second()), 2))
            .expect("acceleration");
        let f = &m * &a;
        assert_eq!(f.dimension(), Dimension::FORCE);
        assert_eq!(f.value().expect("value"), 6.0);
        let half = Quantity::with_dimension(Expr::rational(1, 2), Dimension::DIMENSIONLESS)
            .expect("exponent");
        let root = Quantity::new(of(4, unit::meter()) * Expr::Unit(unit::meter()))
            .expect("area")
            .pow(&half)
            .expect("sqrt");
        assert_eq!(root.dimension(), Dimension::LENGTH);
        assert_eq!(root.scale_factor(), &Expr::int(2));
    }
}
