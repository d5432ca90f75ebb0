//! Named units and the unit catalogue.

use super::dimension::{BaseDimension, Dimension};
use crate::symbolic::{Expr, Number};
use serde::{Deserialize, Serialize};

/// A named unit: its SI scale factor and dimension.
///
/// Units appear as atoms inside expressions; `3 * meter` is a product of a
/// number and the `meter` atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Unit {
    name: String,
    scale: Number,
    dimension: Dimension,
}

impl Unit {
    pub fn new(name: impl Into<String>, scale: Number, dimension: Dimension) -> Self {
        Self {
            name: name.into(),
            scale,
            dimension,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scale(&self) -> Number {
        self.scale
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn to_expr(&self) -> Expr {
        Expr::Unit(self.clone())
    }
}

/// `value * unit` as an expression.
pub fn of(value: impl Into<Expr>, unit: Unit) -> Expr {
    Expr::mul([value.into(), Expr::Unit(unit)])
}

pub(crate) fn si_base_unit(base: BaseDimension) -> Unit {
    match base {
        BaseDimension::Length => meter(),
        BaseDimension::Mass => kilogram(),
        BaseDimension::Time => second(),
        BaseDimension::Current => ampere(),
        BaseDimension::Temperature => kelvin(),
        BaseDimension::AmountOfSubstance => mole(),
        BaseDimension::LuminousIntensity => candela(),
        BaseDimension::Angle => radian(),
    }
}

macro_rules! catalogue {
    ($($(#[$doc:meta])* $fn_name:ident => ($name:literal, $scale:expr, $dim:expr);)*) => {
        $(
            $(#[$doc])*
            pub fn $fn_name() -> Unit {
                Unit::new($name, $scale, $dim)
            }
        )*
    };
}

catalogue! {
    meter => ("meter", Number::ONE, Dimension::LENGTH);
    kilogram => ("kilogram", Number::ONE, Dimension::MASS);
    second => ("second", Number::ONE, Dimension::TIME);
    ampere => ("ampere", Number::ONE, Dimension::CURRENT);
    kelvin => ("kelvin", Number::ONE, Dimension::TEMPERATURE);
    mole => ("mole", Number::ONE, Dimension::AMOUNT_OF_SUBSTANCE);
    candela => ("candela", Number::ONE, Dimension::LUMINOUS_INTENSITY);
    radian => ("radian", Number::ONE, Dimension::ANGLE);
    /// Scale is the float value of pi/180.
    degree => ("degree", Number::Float(std::f64::consts::PI / 180.0), Dimension::ANGLE);
    kilometer => ("kilometer", Number::int(1000), Dimension::LENGTH);
    centimeter => ("centimeter", Number::rational(1, 100), Dimension::LENGTH);
    millimeter => ("millimeter", Number::rational(1, 1000), Dimension::LENGTH);
    gram => ("gram", Number::rational(1, 1000), Dimension::MASS);
    minute => ("minute", Number::int(60), Dimension::TIME);
    hour => ("hour", Number::int(3600), Dimension::TIME);
    hertz => ("hertz", Number::ONE, Dimension::FREQUENCY);
    newton => ("newton", Number::ONE, Dimension::FORCE);
    joule => ("joule", Number::ONE, Dimension::ENERGY);
    watt => ("watt", Number::ONE, Dimension::POWER);
    pascal => ("pascal", Number::ONE, Dimension::PRESSURE);
    coulomb => ("coulomb", Number::ONE, Dimension::CHARGE);
    volt => ("volt", Number::ONE, Dimension::VOLTAGE);
    tesla => ("tesla", Number::ONE, Dimension::MAGNETIC_FLUX_DENSITY);
}
