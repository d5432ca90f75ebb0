//! Physical dimensions as exponent vectors over the base dimensions.

use crate::errors::{PhysicsError, Result};
use crate::symbolic::{Expr, Number};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Div, Mul};

/// Number of tracked base dimensions, including the angle pseudo-dimension.
pub const BASE_DIMENSION_COUNT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseDimension {
    Length,
    Mass,
    Time,
    Current,
    Temperature,
    AmountOfSubstance,
    LuminousIntensity,
    /// Treated as dimensionless when comparing dimensions.
    Angle,
}

impl BaseDimension {
    pub const ALL: [BaseDimension; BASE_DIMENSION_COUNT] = [
        BaseDimension::Length,
        BaseDimension::Mass,
        BaseDimension::Time,
        BaseDimension::Current,
        BaseDimension::Temperature,
        BaseDimension::AmountOfSubstance,
        BaseDimension::LuminousIntensity,
        BaseDimension::Angle,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            BaseDimension::Length => "length",
            BaseDimension::Mass => "mass",
            BaseDimension::Time => "time",
            BaseDimension::Current => "current",
            BaseDimension::Temperature => "temperature",
            BaseDimension::AmountOfSubstance => "amount_of_substance",
            BaseDimension::LuminousIntensity => "luminous_intensity",
            BaseDimension::Angle => "angle",
        }
    }
}

/// A physical dimension.
///
/// `Any` is the dimension of zero and of infinite values: it is equivalent to
/// every dimension and absorbs under multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    Any,
    Exponents([Number; BASE_DIMENSION_COUNT]),
}

impl Dimension {
    pub const DIMENSIONLESS: Dimension = Dimension::from_integers([0, 0, 0, 0, 0, 0, 0, 0]);
    pub const LENGTH: Dimension = Dimension::from_integers([1, 0, 0, 0, 0, 0, 0, 0]);
    pub const MASS: Dimension = Dimension::from_integers([0, 1, 0, 0, 0, 0, 0, 0]);
    pub const TIME: Dimension = Dimension::from_integers([0, 0, 1, 0, 0, 0, 0, 0]);
    pub const CURRENT: Dimension = Dimension::from_integers([0, 0, 0, 1, 0, 0, 0, 0]);
    pub const TEMPERATURE: Dimension = Dimension::from_integers([0, 0, 0, 0, 1, 0, 0, 0]);
    pub const AMOUNT_OF_SUBSTANCE: Dimension = Dimension::from_integers([0, 0, 0, 0, 0, 1, 0, 0]);
    pub const LUMINOUS_INTENSITY: Dimension = Dimension::from_integers([0, 0, 0, 0, 0, 0, 1, 0]);
    pub const ANGLE: Dimension = Dimension::from_integers([0, 0, 0, 0, 0, 0, 0, 1]);

    pub const AREA: Dimension = Dimension::from_integers([2, 0, 0, 0, 0, 0, 0, 0]);
    pub const VOLUME: Dimension = Dimension::from_integers([3, 0, 0, 0, 0, 0, 0, 0]);
    pub const VELOCITY: Dimension = Dimension::from_integers([1, 0, -1, 0, 0, 0, 0, 0]);
    pub const ACCELERATION: Dimension = Dimension::from_integers([1, 0, -2, 0, 0, 0, 0, 0]);
    pub const FREQUENCY: Dimension = Dimension::from_integers([0, 0, -1, 0, 0, 0, 0, 0]);
    pub const FORCE: Dimension = Dimension::from_integers([1, 1, -2, 0, 0, 0, 0, 0]);
    pub const ENERGY: Dimension = Dimension::from_integers([2, 1, -2, 0, 0, 0, 0, 0]);
    pub const POWER: Dimension = Dimension::from_integers([2, 1, -3, 0, 0, 0, 0, 0]);
    pub const PRESSURE: Dimension = Dimension::from_integers([-1, 1, -2, 0, 0, 0, 0, 0]);
    pub const CHARGE: Dimension = Dimension::from_integers([0, 0, 1, 1, 0, 0, 0, 0]);
    pub const VOLTAGE: Dimension = Dimension::from_integers([2, 1, -3, -1, 0, 0, 0, 0]);
    pub const ELECTRIC_FIELD: Dimension = Dimension::from_integers([1, 1, -3, -1, 0, 0, 0, 0]);
    pub const MAGNETIC_FLUX_DENSITY: Dimension =
        Dimension::from_integers([0, 1, -2, -1, 0, 0, 0, 0]);
    pub const ANGULAR_VELOCITY: Dimension = Dimension::from_integers([0, 0, -1, 0, 0, 0, 0, 1]);

    pub const fn from_integers(exponents: [i64; BASE_DIMENSION_COUNT]) -> Self {
        let mut out = [Number::ZERO; BASE_DIMENSION_COUNT];
        let mut i = 0;
        while i < BASE_DIMENSION_COUNT {
            out[i] = Number::int(exponents[i]);
            i += 1;
        }
        Dimension::Exponents(out)
    }

    pub fn base(base: BaseDimension) -> Self {
        let mut exponents = [Number::ZERO; BASE_DIMENSION_COUNT];
        exponents[base.index()] = Number::ONE;
        Dimension::Exponents(exponents)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Dimension::Any)
    }

    /// Exponent of a base dimension; `None` for the any-dimension sentinel.
    pub fn exponent(&self, base: BaseDimension) -> Option<Number> {
        match self {
            Dimension::Any => None,
            Dimension::Exponents(e) => Some(e[base.index()]),
        }
    }

    /// The single place where angles are treated as dimensionless.
    pub fn normalized(&self) -> Dimension {
        match self {
            Dimension::Any => Dimension::Any,
            Dimension::Exponents(e) => {
                let mut e = *e;
                e[BaseDimension::Angle.index()] = Number::ZERO;
                Dimension::Exponents(e)
            }
        }
    }

    /// Dimensionless after angle normalization. `Any` is not dimensionless.
    pub fn is_dimensionless(&self) -> bool {
        match self.normalized() {
            Dimension::Any => false,
            Dimension::Exponents(e) => e.iter().all(Number::is_zero),
        }
    }

    /// Equivalence up to the any-dimension sentinel and angle normalization.
    pub fn is_equivalent(&self, other: &Dimension) -> bool {
        if self.is_any() || other.is_any() {
            return true;
        }
        self.normalized() == other.normalized()
    }

    pub fn pow(&self, exponent: Number) -> Dimension {
        match self {
            Dimension::Any => Dimension::Any,
            Dimension::Exponents(e) => {
                let mut out = *e;
                for slot in out.iter_mut() {
                    *slot = *slot * exponent;
                }
                Dimension::Exponents(out)
            }
        }
    }

    pub fn recip(&self) -> Dimension {
        self.pow(Number::int(-1))
    }

    /// Combines the dimensions of two addends.
    pub fn try_add(&self, other: &Dimension) -> Result<Dimension> {
        match (self, other) {
            (Dimension::Any, d) | (d, Dimension::Any) => Ok(*d),
            (a, b) if a.is_equivalent(b) => Ok(*a),
            (a, b) => Err(PhysicsError::IncompatibleDimensions(format!(
                "cannot add {a} and {b}"
            ))),
        }
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Dimension::DIMENSIONLESS
    }
}

impl Mul for Dimension {
    type Output = Dimension;

    fn mul(self, rhs: Dimension) -> Dimension {
        match (self, rhs) {
            (Dimension::Exponents(a), Dimension::Exponents(b)) => {
                let mut out = a;
                for (slot, other) in out.iter_mut().zip(b) {
                    *slot = *slot + other;
                }
                Dimension::Exponents(out)
            }
            _ => Dimension::Any,
        }
    }
}

impl Div for Dimension {
    type Output = Dimension;

    fn div(self, rhs: Dimension) -> Dimension {
        self * rhs.recip()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exponents = match self {
            Dimension::Any => return write!(f, "any"),
            Dimension::Exponents(e) => e,
        };
        let mut numerator = Vec::new();
        let mut denominator = Vec::new();
        for base in BaseDimension::ALL {
            let e = exponents[base.index()];
            if e.is_zero() {
                continue;
            }
            let target = if e.is_negative() {
                &mut denominator
            } else {
                &mut numerator
            };
            let e = e.abs();
            if e.is_one() {
                target.push(base.name().to_string());
            } else {
                target.push(format!("{}^{}", base.name(), e));
            }
        }
        match (numerator.is_empty(), denominator.is_empty()) {
            (true, true) => write!(f, "dimensionless"),
            (false, true) => write!(f, "{}", numerator.join("*")),
            (true, false) => write!(f, "1/{}", denominator.join("/")),
            (false, false) => write!(f, "{}/{}", numerator.join("*"), denominator.join("/")),
        }
    }
}

/// The SI unit of `dimension`, as a product of SI base units.
///
/// Angles map to radians; the any-dimension sentinel has no unit.
pub fn dimension_to_si_unit(dimension: &Dimension) -> Result<Expr> {
    let exponents = match dimension {
        Dimension::Any => {
            return Err(PhysicsError::InvalidValue(
                "the any-dimension sentinel has no SI unit".to_string(),
            ))
        }
        Dimension::Exponents(e) => e,
    };
    let factors = BaseDimension::ALL.iter().filter_map(|base| {
        let e = exponents[base.index()];
        (!e.is_zero()).then(|| Expr::pow(Expr::Unit(super::unit::si_base_unit(*base)), Expr::Num(e)))
    });
    Ok(Expr::mul(factors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::unit;

    #[test]
    fn composition_follows_exponent_rules() {
        assert_eq!(Dimension::LENGTH / Dimension::TIME, Dimension::VELOCITY);
        assert_eq!(Dimension::MASS * Dimension::ACCELERATION, Dimension::FORCE);
        assert_eq!(Dimension::AREA.pow(Number::rational(1, 2)), Dimension::LENGTH);
    }

    #[test]
    fn any_absorbs_and_matches() {
        assert_eq!(Dimension::Any * Dimension::LENGTH, Dimension::Any);
        assert!(Dimension::Any.is_equivalent(&Dimension::TIME));
        assert_eq!(Dimension::Any.try_add(&Dimension::TIME), Ok(Dimension::TIME));
    }

    #[test]
    fn angle_is_dimensionless_for_comparison() {
        assert!(Dimension::ANGLE.is_dimensionless());
        assert!(Dimension::ANGULAR_VELOCITY.is_equivalent(&Dimension::FREQUENCY));
        assert_ne!(Dimension::ANGULAR_VELOCITY, Dimension::FREQUENCY);
    }

    #[test]
    fn incompatible_addends_are_rejected() {
        let err = Dimension::LENGTH
            .try_add(&Dimension::TIME)
            .expect_err("length + time");
        assert!(err.is_units_error());
    }

    #[test]
    fn si_unit_of_force() {
        let unit = dimension_to_si_unit(&Dimension::FORCE).expect("si unit");
        let expected = Expr::mul([
            Expr::Unit(unit::kilogram()),
            Expr::Unit(unit::meter()),
            Expr::powi(Expr::Unit(unit::second()), -2),
        ]);
        assert_eq!(unit, expected);
        assert!(dimension_to_si_unit(&Dimension::Any).is_err());
    }

    #[test]
    fn display_lists_exponents() {
        assert_eq!(Dimension::ACCELERATION.to_string(), "length/time^2");
        assert_eq!(Dimension::DIMENSIONLESS.to_string(), "dimensionless");
    }
}
