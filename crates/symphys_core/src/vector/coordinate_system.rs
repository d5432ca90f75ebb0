//! Coordinate frames placed in space.
//!
//! A [`CoordinateSystem`] wraps a base-scalar system with a placement (origin
//! and orientation relative to the root frame). Two systems are the same
//! frame only when their keys match; a rotated, translated or retyped copy is
//! always a new frame.

use super::algebra::Vector;
use crate::coordinates::system::{
    identity_matrix, matrix_product, matrix_vector, transpose_vector,
};
use crate::coordinates::{BaseCoordinateSystem, SystemId, SystemKind};
use crate::errors::{PhysicsError, Result};
use crate::symbolic::{Expr, Symbol};
use log::trace;
use nalgebra::Matrix3;
use std::fmt;
use std::sync::Arc;

/// Origin and axes of a frame, both expressed in the root Cartesian frame.
#[derive(Debug, Clone, PartialEq)]
struct Placement {
    origin: [Expr; 3],
    /// Column `j` is this frame's `j`-th Cartesian axis.
    orientation: Matrix3<Expr>,
}

impl Placement {
    fn root() -> Self {
        Self {
            origin: [Expr::zero(), Expr::zero(), Expr::zero()],
            orientation: identity_matrix(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoordinateSystem {
    base: Arc<dyn BaseCoordinateSystem>,
    placement: Arc<Placement>,
}

impl PartialEq for CoordinateSystem {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for CoordinateSystem {}

impl CoordinateSystem {
    /// A fresh frame of the given kind at the root placement.
    pub fn new(kind: SystemKind) -> Self {
        Self::from_base(kind.instantiate())
    }

    pub fn cartesian() -> Self {
        Self::new(SystemKind::Cartesian)
    }

    pub fn cylindrical() -> Self {
        Self::new(SystemKind::Cylindrical)
    }

    pub fn spherical() -> Self {
        Self::new(SystemKind::Spherical)
    }

    /// A frame over a user-defined system, at the root placement.
    pub fn from_base(base: Arc<dyn BaseCoordinateSystem>) -> Self {
        Self {
            base,
            placement: Arc::new(Placement::root()),
        }
    }

    pub fn id(&self) -> SystemId {
        self.base.id()
    }

    pub fn kind(&self) -> Option<SystemKind> {
        self.base.kind()
    }

    pub fn is_cartesian(&self) -> bool {
        self.kind() == Some(SystemKind::Cartesian)
    }

    pub fn base(&self) -> &Arc<dyn BaseCoordinateSystem> {
        &self.base
    }

    pub fn base_scalars(&self) -> [Symbol; 3] {
        self.base.base_scalars()
    }

    pub fn origin(&self) -> &[Expr; 3] {
        &self.placement.origin
    }

    pub fn orientation(&self) -> &Matrix3<Expr> {
        &self.placement.orientation
    }

    pub fn type_name(&self) -> &'static str {
        self.base.type_name()
    }

    /// The coordinates of a `target` system at the same origin, as
    /// expressions of this system's base scalars.
    pub fn transformation_to_system(&self, target: SystemKind) -> Result<[Expr; 3]> {
        if self.kind() == Some(target) {
            return Ok(self.base_scalars().map(|s| Expr::from(&s)));
        }
        let target_system = target.instantiate();
        target_system
            .position_from_cartesian(&self.base.cartesian_transform())
            .map_err(|err| {
                PhysicsError::InvalidValue(format!(
                    "transformation from {} to {} is not supported: {err}",
                    self.type_name(),
                    target
                ))
            })
    }

    /// A new frame of kind `target` sharing this frame's placement.
    pub fn coordinates_transform(&self, target: SystemKind) -> CoordinateSystem {
        CoordinateSystem {
            base: target.instantiate(),
            placement: Arc::clone(&self.placement),
        }
    }

    fn require_cartesian(&self, operation: &str) -> Result<()> {
        if self.is_cartesian() {
            Ok(())
        } else {
            Err(PhysicsError::InvalidValue(format!(
                "{operation} is only defined for cartesian frames, got {}",
                self.type_name()
            )))
        }
    }

    fn axis_in_this_frame(&self, vector: &Vector) -> Result<[Expr; 3]> {
        if let Some(system) = vector.system() {
            if system != self {
                return Err(PhysicsError::TypeMismatch(format!(
                    "vector is in {} frame {}, expected frame {}",
                    system.type_name(),
                    system.id(),
                    self.id()
                )));
            }
        }
        Ok(vector.components().clone())
    }

    /// A new Cartesian frame rotated by `angle` about `axis` (a vector in
    /// this frame), right-handed.
    pub fn coordinates_rotate(
        &self,
        angle: impl Into<Expr>,
        axis: &Vector,
    ) -> Result<CoordinateSystem> {
        self.require_cartesian("rotation")?;
        let axis = self.axis_in_this_frame(axis)?;
        let norm = Expr::sqrt(Expr::add(axis.iter().map(|c| Expr::powi(c.clone(), 2)))).simplify();
        if norm.is_zero() {
            return Err(PhysicsError::InvalidValue("rotation axis is the zero vector".to_string()));
        }
        let k = axis.map(|c| Expr::div(c, norm.clone()).simplify());
        let angle = angle.into();
        let (cos, sin) = (Expr::cos(angle.clone()), Expr::sin(angle));
        let versine = Expr::sub(Expr::one(), cos.clone());
        // R = cos I + sin [k]x + (1 - cos) k k^T
        let skew = |i: usize, j: usize| -> Expr {
            match (i, j) {
                (0, 1) => -k[2].clone(),
                (0, 2) => k[1].clone(),
                (1, 0) => k[2].clone(),
                (1, 2) => -k[0].clone(),
                (2, 0) => -k[1].clone(),
                (2, 1) => k[0].clone(),
                _ => Expr::zero(),
            }
        };
        let rotation = Matrix3::from_fn(|i, j| {
            let diagonal = if i == j { cos.clone() } else { Expr::zero() };
            Expr::add([
                diagonal,
                Expr::mul([sin.clone(), skew(i, j)]),
                Expr::mul([versine.clone(), k[i].clone(), k[j].clone()]),
            ])
            .simplify()
        });
        Ok(CoordinateSystem {
            base: SystemKind::Cartesian.instantiate(),
            placement: Arc::new(Placement {
                origin: self.placement.origin.clone(),
                orientation: matrix_product(&self.placement.orientation, &rotation),
            }),
        })
    }

    /// A new Cartesian frame whose origin is moved by `offset` (a vector in
    /// this frame).
    pub fn coordinates_translate(&self, offset: &Vector) -> Result<CoordinateSystem> {
        self.require_cartesian("translation")?;
        let offset = self.axis_in_this_frame(offset)?;
        let shift = matrix_vector(&self.placement.orientation, &offset);
        let origin = [0usize, 1, 2]
            .map(|i| Expr::add([self.placement.origin[i].clone(), shift[i].clone()]).simplify());
        Ok(CoordinateSystem {
            base: SystemKind::Cartesian.instantiate(),
            placement: Arc::new(Placement {
                origin,
                orientation: self.placement.orientation.clone(),
            }),
        })
    }

    /// Position in the root frame of the point with coordinates
    /// `coordinates` in this frame.
    pub fn root_position(&self, coordinates: &[Expr; 3]) -> [Expr; 3] {
        let local = self.base.position_to_cartesian(coordinates);
        let rotated = matrix_vector(&self.placement.orientation, &local);
        let origin = &self.placement.origin;
        [0usize, 1, 2].map(|i| Expr::add([origin[i].clone(), rotated[i].clone()]).simplify())
    }

    /// Coordinates in this frame of a point given by its root position.
    pub fn coordinates_of(&self, root: &[Expr; 3]) -> Result<[Expr; 3]> {
        let origin = &self.placement.origin;
        let relative = [0usize, 1, 2].map(|i| Expr::sub(root[i].clone(), origin[i].clone()));
        let local = transpose_vector(&self.placement.orientation, &relative).map(|c| c.simplify());
        self.base.position_from_cartesian(&local)
    }

    /// Maps each of this frame's base scalars to an expression in the base
    /// scalars of `from`, describing the same point.
    pub fn express_base_scalars(&self, from: &CoordinateSystem) -> Result<Vec<(Symbol, Expr)>> {
        let scalars = self.base_scalars();
        if self == from {
            return Ok(scalars.iter().map(|s| (s.clone(), Expr::from(s))).collect());
        }
        let generic = from.base_scalars().map(|s| Expr::from(&s));
        let coordinates = self.coordinates_of(&from.root_position(&generic))?;
        trace!(
            "expressed {} frame {} in terms of {} frame {}",
            self.type_name(),
            self.id(),
            from.type_name(),
            from.id()
        );
        Ok(scalars.into_iter().zip(coordinates).collect())
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} frame {}", self.type_name(), self.id())
    }
}
