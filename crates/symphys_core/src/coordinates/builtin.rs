//! Built-in coordinate systems.

use super::system::{BaseCoordinateSystem, SystemId, SystemKind};
use crate::errors::Result;
use crate::symbolic::{Expr, Number, Symbol};
use crate::units::Dimension;
use std::sync::Arc;

impl SystemKind {
    /// A fresh system instance of this family.
    pub fn instantiate(self) -> Arc<dyn BaseCoordinateSystem> {
        match self {
            SystemKind::Cartesian => Arc::new(CartesianSystem::new()),
            SystemKind::Cylindrical => Arc::new(CylindricalSystem::new()),
            SystemKind::Spherical => Arc::new(SphericalSystem::new()),
        }
    }
}

fn sym(symbol: &Symbol) -> Expr {
    Expr::symbol(symbol)
}

/// Rectangular coordinates `x, y, z`.
#[derive(Debug, Clone)]
pub struct CartesianSystem {
    id: SystemId,
    scalars: [Symbol; 3],
}

impl CartesianSystem {
    pub fn new() -> Self {
        let id = SystemId::fresh();
        let scalars = ["x", "y", "z"].map(|name| Symbol::tagged(name, id.get(), Dimension::LENGTH));
        Self { id, scalars }
    }
}

impl Default for CartesianSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseCoordinateSystem for CartesianSystem {
    fn id(&self) -> SystemId {
        self.id
    }

    fn kind(&self) -> Option<SystemKind> {
        Some(SystemKind::Cartesian)
    }

    fn type_name(&self) -> &'static str {
        "cartesian"
    }

    fn base_scalars(&self) -> [Symbol; 3] {
        self.scalars.clone()
    }

    fn cartesian_transform(&self) -> [Expr; 3] {
        self.scalars.each_ref().map(sym)
    }

    fn inverse_cartesian_transform(&self, cartesian: &[Expr; 3]) -> Result<[Expr; 3]> {
        Ok(cartesian.clone())
    }

    fn scale_position(&self, factor: &Expr, coordinates: &[Expr; 3]) -> Result<[Expr; 3]> {
        Ok(coordinates
            .clone()
            .map(|c| Expr::mul([factor.clone(), c])))
    }

    fn dot_positions(&self, lhs: &[Expr; 3], rhs: &[Expr; 3]) -> Expr {
        Expr::add(
            lhs.iter()
                .zip(rhs)
                .map(|(a, b)| Expr::mul([a.clone(), b.clone()])),
        )
    }
}

/// Cylindrical coordinates `r, theta, z` with `x = r cos(theta)`,
/// `y = r sin(theta)`.
#[derive(Debug, Clone)]
pub struct CylindricalSystem {
    id: SystemId,
    scalars: [Symbol; 3],
}

impl CylindricalSystem {
    pub fn new() -> Self {
        let id = SystemId::fresh();
        let scalars = [
            Symbol::tagged("r", id.get(), Dimension::LENGTH).positive(),
            Symbol::tagged("theta", id.get(), Dimension::ANGLE),
            Symbol::tagged("z", id.get(), Dimension::LENGTH),
        ];
        Self { id, scalars }
    }
}

impl Default for CylindricalSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseCoordinateSystem for CylindricalSystem {
    fn id(&self) -> SystemId {
        self.id
    }

    fn kind(&self) -> Option<SystemKind> {
        Some(SystemKind::Cylindrical)
    }

    fn type_name(&self) -> &'static str {
        "cylindrical"
    }

    fn base_scalars(&self) -> [Symbol; 3] {
        self.scalars.clone()
    }

    fn cartesian_transform(&self) -> [Expr; 3] {
        let [r, theta, z] = self.scalars.each_ref().map(sym);
        [
            Expr::mul([r.clone(), Expr::cos(theta.clone())]),
            Expr::mul([r, Expr::sin(theta)]),
            z,
        ]
    }

    fn inverse_cartesian_transform(&self, cartesian: &[Expr; 3]) -> Result<[Expr; 3]> {
        let [x, y, z] = cartesian.clone();
        let r = Expr::sqrt(Expr::add([Expr::powi(x.clone(), 2), Expr::powi(y.clone(), 2)]));
        Ok([r, Expr::atan2(y, x), z])
    }

    /// Scales the radial and height components; the angle is unchanged.
    fn scale_position(&self, factor: &Expr, coordinates: &[Expr; 3]) -> Result<[Expr; 3]> {
        let [r, theta, z] = coordinates.clone();
        Ok([
            Expr::mul([factor.clone(), r]),
            theta,
            Expr::mul([factor.clone(), z]),
        ])
    }

    fn dot_positions(&self, lhs: &[Expr; 3], rhs: &[Expr; 3]) -> Expr {
        let [r1, theta1, z1] = lhs.clone();
        let [r2, theta2, z2] = rhs.clone();
        Expr::add([
            Expr::mul([r1, r2, Expr::cos(Expr::sub(theta1, theta2))]),
            Expr::mul([z1, z2]),
        ])
    }
}

/// Spherical coordinates `r, theta, phi` with `theta` the polar angle from
/// the z axis and `phi` the azimuth.
#[derive(Debug, Clone)]
pub struct SphericalSystem {
    id: SystemId,
    scalars: [Symbol; 3],
}

impl SphericalSystem {
    pub fn new() -> Self {
        let id = SystemId::fresh();
        let scalars = [
            Symbol::tagged("r", id.get(), Dimension::LENGTH).positive(),
            Symbol::tagged("theta", id.get(), Dimension::ANGLE).polar_angle(),
            Symbol::tagged("phi", id.get(), Dimension::ANGLE),
        ];
        Self { id, scalars }
    }
}

impl Default for SphericalSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseCoordinateSystem for SphericalSystem {
    fn id(&self) -> SystemId {
        self.id
    }

    fn kind(&self) -> Option<SystemKind> {
        Some(SystemKind::Spherical)
    }

    fn type_name(&self) -> &'static str {
        "spherical"
    }

    fn base_scalars(&self) -> [Symbol; 3] {
        self.scalars.clone()
    }

    fn cartesian_transform(&self) -> [Expr; 3] {
        let [r, theta, phi] = self.scalars.each_ref().map(sym);
        [
            Expr::mul([r.clone(), Expr::sin(theta.clone()), Expr::cos(phi.clone())]),
            Expr::mul([r.clone(), Expr::sin(theta.clone()), Expr::sin(phi)]),
            Expr::mul([r, Expr::cos(theta)]),
        ]
    }

    fn inverse_cartesian_transform(&self, cartesian: &[Expr; 3]) -> Result<[Expr; 3]> {
        let [x, y, z] = cartesian.clone();
        let r = Expr::sqrt(Expr::add([
            Expr::powi(x.clone(), 2),
            Expr::powi(y.clone(), 2),
            Expr::powi(z.clone(), 2),
        ]));
        let theta = Expr::acos(Expr::div(z, r.clone()));
        Ok([r, theta, Expr::atan2(y, x)])
    }

    /// Scales the radial component only.
    fn scale_position(&self, factor: &Expr, coordinates: &[Expr; 3]) -> Result<[Expr; 3]> {
        let [r, theta, phi] = coordinates.clone();
        Ok([Expr::mul([factor.clone(), r]), theta, phi])
    }

    fn dot_positions(&self, lhs: &[Expr; 3], rhs: &[Expr; 3]) -> Expr {
        let [r1, theta1, phi1] = lhs.clone();
        let [r2, theta2, phi2] = rhs.clone();
        let angular = Expr::add([
            Expr::mul([
                Expr::sin(theta1.clone()),
                Expr::sin(theta2.clone()),
                Expr::cos(Expr::sub(phi1, phi2)),
            ]),
            Expr::mul([Expr::cos(theta1), Expr::cos(theta2)]),
        ]);
        Expr::mul([r1, r2, angular])
    }
}

/// Parabolic cylinder coordinates `u, v, z` with `x = (u^2 - v^2)/2` and
/// `y = u v`.
///
/// The inverse map is multi-valued, so only the forward transform is given.
#[derive(Debug, Clone)]
pub struct ParabolicSystem {
    id: SystemId,
    scalars: [Symbol; 3],
}

impl ParabolicSystem {
    pub fn new() -> Self {
        let id = SystemId::fresh();
        let root_length = Dimension::LENGTH.pow(Number::rational(1, 2));
        let scalars = [
            Symbol::tagged("u", id.get(), root_length),
            Symbol::tagged("v", id.get(), root_length),
            Symbol::tagged("z", id.get(), Dimension::LENGTH),
        ];
        Self { id, scalars }
    }
}

impl Default for ParabolicSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseCoordinateSystem for ParabolicSystem {
    fn id(&self) -> SystemId {
        self.id
    }

    fn kind(&self) -> Option<SystemKind> {
        None
    }

    fn type_name(&self) -> &'static str {
        "parabolic"
    }

    fn base_scalars(&self) -> [Symbol; 3] {
        self.scalars.clone()
    }

    fn cartesian_transform(&self) -> [Expr; 3] {
        let [u, v, z] = self.scalars.each_ref().map(sym);
        [
            Expr::mul([
                Expr::rational(1, 2),
                Expr::sub(Expr::powi(u.clone(), 2), Expr::powi(v.clone(), 2)),
            ]),
            Expr::mul([u, v]),
            z,
        ]
    }
}
