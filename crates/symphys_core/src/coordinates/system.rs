//! The base-scalar coordinate system contract.
//!
//! A coordinate system is three base scalars plus the map from those scalars
//! to Cartesian coordinates. The Jacobian, Lamé coefficients and orthonormal
//! basis are derived from that map, so a new curvilinear system only has to
//! supply `cartesian_transform` (and, where it is single valued,
//! `inverse_cartesian_transform`).

use crate::errors::{PhysicsError, Result};
use crate::symbolic::{AppliedFunction, Expr, Symbol};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SYSTEM_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique key of a coordinate system instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SystemId(u64);

impl SystemId {
    pub fn fresh() -> Self {
        SystemId(NEXT_SYSTEM_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The registered system families. Conversions exist between every pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemKind {
    Cartesian,
    Cylindrical,
    Spherical,
}

impl SystemKind {
    pub const ALL: [SystemKind; 3] = [
        SystemKind::Cartesian,
        SystemKind::Cylindrical,
        SystemKind::Spherical,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SystemKind::Cartesian => "cartesian",
            SystemKind::Cylindrical => "cylindrical",
            SystemKind::Spherical => "spherical",
        }
    }
}

impl fmt::Display for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An orthogonal coordinate system given by its base scalars and the map to
/// Cartesian coordinates.
pub trait BaseCoordinateSystem: fmt::Debug + Send + Sync {
    fn id(&self) -> SystemId;

    /// The registered family, or `None` for a user-defined system.
    fn kind(&self) -> Option<SystemKind>;

    fn type_name(&self) -> &'static str;

    fn base_scalars(&self) -> [Symbol; 3];

    /// Cartesian `x, y, z` as expressions of the base scalars.
    fn cartesian_transform(&self) -> [Expr; 3];

    /// The base scalars as expressions of the given Cartesian coordinates.
    fn inverse_cartesian_transform(&self, cartesian: &[Expr; 3]) -> Result<[Expr; 3]> {
        let _ = cartesian;
        Err(PhysicsError::NotImplemented(format!(
            "inverse transform of {} coordinates: several solutions exist",
            self.type_name()
        )))
    }

    /// Jacobian `J[i, j] = d(cartesian_i) / d(q_j)`.
    fn cartesian_derivative_matrix(&self) -> Matrix3<Expr> {
        let transform = self.cartesian_transform();
        let scalars = self.base_scalars();
        Matrix3::from_fn(|i, j| transform[i].diff(&scalars[j]))
    }

    /// Column norms of the Jacobian.
    fn lame_coefficients(&self) -> [Expr; 3] {
        let jacobian = self.cartesian_derivative_matrix();
        [0usize, 1, 2].map(|j| {
            let squares = Expr::add((0..3usize).map(|i| Expr::powi(jacobian[(i, j)].clone(), 2)));
            Expr::sqrt(squares.simplify()).simplify()
        })
    }

    /// Orthonormal basis: column `j` is the unit vector along `q_j` in
    /// Cartesian components.
    fn base_vector_matrix(&self) -> Matrix3<Expr> {
        let jacobian = self.cartesian_derivative_matrix();
        let lame = self.lame_coefficients();
        Matrix3::from_fn(|i, j| Expr::div(jacobian[(i, j)].clone(), lame[j].clone()).simplify())
    }

    /// Derivative of the basis with respect to `t`, treating every base
    /// scalar as an unknown function of `t`.
    fn diff_base_vector_matrix(&self, t: &Symbol) -> Matrix3<Expr> {
        let time = Expr::symbol(t);
        let trajectory: Vec<(Symbol, Expr)> = self
            .base_scalars()
            .into_iter()
            .map(|q| {
                let function = AppliedFunction::new(q.name(), q.dimension());
                let applied = function.apply(vec![time.clone()]);
                (q, applied)
            })
            .collect();
        let basis = self.base_vector_matrix();
        Matrix3::from_fn(|i, j| basis[(i, j)].subs(&trajectory).diff(t).simplify())
    }

    /// Cartesian position of the point with the given coordinates.
    fn position_to_cartesian(&self, coordinates: &[Expr; 3]) -> [Expr; 3] {
        let bindings = bind(&self.base_scalars(), coordinates);
        self.cartesian_transform().map(|e| e.subs(&bindings).simplify())
    }

    fn position_from_cartesian(&self, cartesian: &[Expr; 3]) -> Result<[Expr; 3]> {
        Ok(self.inverse_cartesian_transform(cartesian)?.map(|e| e.simplify()))
    }

    /// Coordinates of the position vector scaled by `factor`.
    fn scale_position(&self, factor: &Expr, coordinates: &[Expr; 3]) -> Result<[Expr; 3]> {
        let cartesian = self
            .position_to_cartesian(coordinates)
            .map(|c| Expr::mul([factor.clone(), c]));
        self.position_from_cartesian(&cartesian)
    }

    /// Dot product of two position vectors given by their coordinates.
    fn dot_positions(&self, lhs: &[Expr; 3], rhs: &[Expr; 3]) -> Expr {
        let a = self.position_to_cartesian(lhs);
        let b = self.position_to_cartesian(rhs);
        Expr::add(a.into_iter().zip(b).map(|(a, b)| Expr::mul([a, b]))).simplify()
    }
}

pub(crate) fn bind(scalars: &[Symbol; 3], values: &[Expr; 3]) -> Vec<(Symbol, Expr)> {
    scalars.iter().cloned().zip(values.iter().cloned()).collect()
}

pub(crate) fn matrix_vector(matrix: &Matrix3<Expr>, vector: &[Expr; 3]) -> [Expr; 3] {
    [0usize, 1, 2].map(|i| {
        Expr::add((0..3usize).map(|k| Expr::mul([matrix[(i, k)].clone(), vector[k].clone()])))
    })
}

/// `matrix^T * vector`; the inverse of `matrix_vector` for orthonormal
/// matrices.
pub(crate) fn transpose_vector(matrix: &Matrix3<Expr>, vector: &[Expr; 3]) -> [Expr; 3] {
    matrix_vector(&matrix.transpose(), vector)
}

pub(crate) fn matrix_product(lhs: &Matrix3<Expr>, rhs: &Matrix3<Expr>) -> Matrix3<Expr> {
    Matrix3::from_fn(|i, j| {
        Expr::add((0..3usize).map(|k| Expr::mul([lhs[(i, k)].clone(), rhs[(k, j)].clone()]))).simplify()
    })
}

pub(crate) fn identity_matrix() -> Matrix3<Expr> {
    Matrix3::from_fn(|i, j| if i == j { Expr::one() } else { Expr::zero() })
}

/// Pads `values` with zeros to three slots; more than three is an error.
pub(crate) fn three_components<I, E>(values: I, what: &str) -> Result<[Expr; 3]>
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    let mut slots = [Expr::zero(), Expr::zero(), Expr::zero()];
    for (index, value) in values.into_iter().enumerate() {
        if index >= slots.len() {
            return Err(PhysicsError::InvalidValue(format!(
                "{what} has more than 3 components"
            )));
        }
        slots[index] = value.into();
    }
    Ok(slots)
}
