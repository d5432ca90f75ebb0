//! Vectors attached to an applied point.
//!
//! A [`CoordinateVector`] stores its components in the orthonormal basis of
//! the point it is attached to. Operations between vectors go through
//! Cartesian components, so vectors at different points or in different
//! systems combine by substitution alone.

use super::system::{
    bind, matrix_vector, three_components, transpose_vector, BaseCoordinateSystem,
};
use crate::errors::Result;
use crate::symbolic::Expr;
use crate::units::{Dimension, Quantity};
use nalgebra::Matrix3;
use std::fmt;
use std::sync::Arc;

/// A point given by its coordinates in a system.
#[derive(Debug, Clone)]
pub struct AppliedPoint {
    system: Arc<dyn BaseCoordinateSystem>,
    coordinates: [Expr; 3],
}

impl PartialEq for AppliedPoint {
    fn eq(&self, other: &Self) -> bool {
        self.system.id() == other.system.id() && self.coordinates == other.coordinates
    }
}

impl AppliedPoint {
    pub fn new<I, E>(system: &Arc<dyn BaseCoordinateSystem>, coordinates: I) -> Result<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Ok(Self {
            system: Arc::clone(system),
            coordinates: three_components(coordinates, "point")?,
        })
    }

    /// The generic point whose coordinates are the system's base scalars.
    pub fn at_base_scalars(system: &Arc<dyn BaseCoordinateSystem>) -> Self {
        Self {
            system: Arc::clone(system),
            coordinates: system.base_scalars().map(|s| Expr::from(&s)),
        }
    }

    pub fn system(&self) -> &Arc<dyn BaseCoordinateSystem> {
        &self.system
    }

    pub fn coordinates(&self) -> &[Expr; 3] {
        &self.coordinates
    }

    pub fn cartesian_position(&self) -> [Expr; 3] {
        self.system.position_to_cartesian(&self.coordinates)
    }

    /// The orthonormal basis of the system evaluated at this point.
    pub fn basis(&self) -> Matrix3<Expr> {
        let bindings = bind(&self.system.base_scalars(), &self.coordinates);
        self.system
            .base_vector_matrix()
            .map(|entry| entry.subs(&bindings).simplify())
    }

    /// The same physical point in `target` coordinates.
    pub fn rebase(&self, target: &Arc<dyn BaseCoordinateSystem>) -> Result<AppliedPoint> {
        if target.id() == self.system.id() {
            return Ok(self.clone());
        }
        let coordinates = target.position_from_cartesian(&self.cartesian_position())?;
        Ok(AppliedPoint {
            system: Arc::clone(target),
            coordinates,
        })
    }
}

impl fmt::Display for AppliedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = &self.coordinates;
        write!(f, "{}({a}, {b}, {c})", self.system.type_name())
    }
}

/// A vector attached to an applied point, with components in the point's
/// orthonormal basis.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateVector {
    components: [Expr; 3],
    point: AppliedPoint,
}

impl CoordinateVector {
    pub fn new<I, E>(components: I, point: AppliedPoint) -> Result<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Ok(Self {
            components: three_components(components, "vector")?,
            point,
        })
    }

    pub fn components(&self) -> &[Expr; 3] {
        &self.components
    }

    pub fn point(&self) -> &AppliedPoint {
        &self.point
    }

    pub fn cartesian_components(&self) -> [Expr; 3] {
        matrix_vector(&self.point.basis(), &self.components).map(|c| c.simplify())
    }

    /// Components of `other` in this vector's basis.
    fn aligned(&self, other: &CoordinateVector) -> [Expr; 3] {
        if self.point == other.point {
            return other.components.clone();
        }
        transpose_vector(&self.point.basis(), &other.cartesian_components())
    }

    fn with_components(&self, components: [Expr; 3]) -> CoordinateVector {
        CoordinateVector {
            components: components.map(|c| c.simplify()),
            point: self.point.clone(),
        }
    }

    /// Sum attached to `self`'s point.
    pub fn add(&self, other: &CoordinateVector) -> CoordinateVector {
        let rhs = self.aligned(other);
        let sum = [0usize, 1, 2].map(|i| Expr::add([self.components[i].clone(), rhs[i].clone()]));
        self.with_components(sum)
    }

    pub fn scale(&self, factor: impl Into<Expr>) -> CoordinateVector {
        let factor = factor.into();
        self.with_components(self.components.clone().map(|c| Expr::mul([factor.clone(), c])))
    }

    pub fn dot(&self, other: &CoordinateVector) -> Expr {
        let rhs = self.aligned(other);
        Expr::add(
            self.components
                .iter()
                .zip(rhs)
                .map(|(a, b)| Expr::mul([a.clone(), b])),
        )
        .simplify()
    }

    /// Cross product attached to `self`'s point. Every built-in basis is
    /// right-handed.
    pub fn cross(&self, other: &CoordinateVector) -> CoordinateVector {
        let [a1, a2, a3] = self.components.clone();
        let [b1, b2, b3] = self.aligned(other);
        self.with_components([
            Expr::mul([a2.clone(), b3.clone()]) - Expr::mul([a3.clone(), b2.clone()]),
            Expr::mul([a3, b1.clone()]) - Expr::mul([a1.clone(), b3]),
            Expr::mul([a1, b2]) - Expr::mul([a2, b1]),
        ])
    }

    pub fn magnitude(&self) -> Expr {
        let squares = Expr::add(self.components.iter().map(|c| Expr::powi(c.clone(), 2)));
        Expr::sqrt(squares.simplify()).simplify()
    }

    /// The same physical vector at the same physical point, in `target`.
    pub fn rebase(&self, target: &Arc<dyn BaseCoordinateSystem>) -> Result<CoordinateVector> {
        let point = self.point.rebase(target)?;
        let components = transpose_vector(&point.basis(), &self.cartesian_components());
        Ok(CoordinateVector {
            components: components.map(|c| c.simplify()),
            point,
        })
    }
}

impl fmt::Display for CoordinateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = &self.components;
        write!(f, "[{a}, {b}, {c}] at {}", self.point)
    }
}

/// A coordinate vector whose components are quantities of one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityCoordinateVector {
    vector: CoordinateVector,
    dimension: Dimension,
}

impl QuantityCoordinateVector {
    pub fn new(
        components: impl IntoIterator<Item = Quantity>,
        point: AppliedPoint,
    ) -> Result<Self> {
        let components: Vec<Quantity> = components.into_iter().collect();
        let mut dimension = Dimension::Any;
        for component in &components {
            dimension = dimension.try_add(&component.dimension())?;
        }
        let values = components.iter().map(|q| q.scale_factor().clone());
        let vector = CoordinateVector::new(values, point)?;
        Ok(Self { vector, dimension })
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn vector(&self) -> &CoordinateVector {
        &self.vector
    }

    pub fn components(&self) -> Result<[Quantity; 3]> {
        let [a, b, c] = self.vector.components.clone();
        Ok([
            Quantity::with_dimension(a, self.dimension)?,
            Quantity::with_dimension(b, self.dimension)?,
            Quantity::with_dimension(c, self.dimension)?,
        ])
    }

    pub fn add(&self, other: &QuantityCoordinateVector) -> Result<QuantityCoordinateVector> {
        let dimension = self.dimension.try_add(&other.dimension)?;
        Ok(Self {
            vector: self.vector.add(&other.vector),
            dimension,
        })
    }

    pub fn scale(&self, factor: &Quantity) -> QuantityCoordinateVector {
        Self {
            vector: self.vector.scale(factor.scale_factor().clone()),
            dimension: self.dimension * factor.dimension(),
        }
    }

    pub fn dot(&self, other: &QuantityCoordinateVector) -> Result<Quantity> {
        Quantity::with_dimension(self.vector.dot(&other.vector), self.dimension * other.dimension)
    }

    pub fn cross(&self, other: &QuantityCoordinateVector) -> QuantityCoordinateVector {
        Self {
            vector: self.vector.cross(&other.vector),
            dimension: self.dimension * other.dimension,
        }
    }

    pub fn magnitude(&self) -> Result<Quantity> {
        Quantity::with_dimension(self.vector.magnitude(), self.dimension)
    }

    pub fn rebase(
        &self,
        target: &Arc<dyn BaseCoordinateSystem>,
    ) -> Result<QuantityCoordinateVector> {
        Ok(Self {
            vector: self.vector.rebase(target)?,
            dimension: self.dimension,
        })
    }
}
