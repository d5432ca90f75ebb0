//! Points and parametrized trajectories.

use super::coordinate_system::CoordinateSystem;
use crate::coordinates::system::three_components;
use crate::errors::Result;
use crate::symbolic::Expr;

/// Up to three coordinates, optionally tagged with the frame they are
/// expressed in.
///
/// Coordinates may be symbolic; a point whose coordinates depend on free
/// parameters stands for a whole curve or surface.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPoint {
    coordinates: [Expr; 3],
    system: Option<CoordinateSystem>,
}

impl FieldPoint {
    /// An untagged point; missing coordinates are zero.
    pub fn new<I, E>(coordinates: I) -> Result<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Ok(Self {
            coordinates: three_components(coordinates, "point")?,
            system: None,
        })
    }

    /// A point tagged with the frame its coordinates refer to.
    pub fn in_system<I, E>(system: &CoordinateSystem, coordinates: I) -> Result<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Ok(Self::new(coordinates)?.tagged(system))
    }

    /// The generic point of `system`: its own base scalars, tagged.
    pub fn at_base_scalars(system: &CoordinateSystem) -> Self {
        Self {
            coordinates: system.base_scalars().map(|s| Expr::from(&s)),
            system: Some(system.clone()),
        }
    }

    pub fn tagged(mut self, system: &CoordinateSystem) -> Self {
        self.system = Some(system.clone());
        self
    }

    pub fn system(&self) -> Option<&CoordinateSystem> {
        self.system.as_ref()
    }

    pub fn coordinates(&self) -> &[Expr; 3] {
        &self.coordinates
    }

    /// The coordinate at `index`; zero past the third.
    pub fn coordinate(&self, index: usize) -> Expr {
        self.coordinates.get(index).cloned().unwrap_or_else(Expr::zero)
    }

    pub fn as_cartesian(&self) -> CartesianPoint<'_> {
        CartesianPoint(self)
    }

    pub fn as_cylinder(&self) -> CylinderPoint<'_> {
        CylinderPoint(self)
    }

    pub fn as_sphere(&self) -> SpherePoint<'_> {
        SpherePoint(self)
    }
}

/// `x, y, z` view of a point.
#[derive(Debug, Clone, Copy)]
pub struct CartesianPoint<'a>(&'a FieldPoint);

impl CartesianPoint<'_> {
    pub fn x(&self) -> Expr {
        self.0.coordinate(0)
    }

    pub fn y(&self) -> Expr {
        self.0.coordinate(1)
    }

    pub fn z(&self) -> Expr {
        self.0.coordinate(2)
    }
}

/// `r, theta, z` view of a point.
#[derive(Debug, Clone, Copy)]
pub struct CylinderPoint<'a>(&'a FieldPoint);

impl CylinderPoint<'_> {
    pub fn r(&self) -> Expr {
        self.0.coordinate(0)
    }

    pub fn theta(&self) -> Expr {
        self.0.coordinate(1)
    }

    pub fn z(&self) -> Expr {
        self.0.coordinate(2)
    }
}

/// `r, theta, phi` view of a point.
#[derive(Debug, Clone, Copy)]
pub struct SpherePoint<'a>(&'a FieldPoint);

impl SpherePoint<'_> {
    pub fn r(&self) -> Expr {
        self.0.coordinate(0)
    }

    pub fn theta(&self) -> Expr {
        self.0.coordinate(1)
    }

    pub fn phi(&self) -> Expr {
        self.0.coordinate(2)
    }
}
