//! Vector arithmetic in a single frame.
//!
//! A [`Vector`] holds the coordinates of a position vector in its frame, so
//! in a cylindrical frame `[r, theta, z]` is the point reached from the
//! origin. Binary operations require both operands to share one frame.

use super::coordinate_system::CoordinateSystem;
use crate::coordinates::system::{matrix_vector, three_components, transpose_vector};
use crate::errors::{PhysicsError, Result};
use crate::settings::IntegrationSettings;
use crate::symbolic::{Expr, Symbol};
use log::warn;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    components: [Expr; 3],
    system: Option<CoordinateSystem>,
}

impl Vector {
    /// A vector in `system`; missing components are zero.
    pub fn new<I, E>(components: I, system: &CoordinateSystem) -> Result<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Ok(Self {
            components: three_components(components, "vector")?,
            system: Some(system.clone()),
        })
    }

    /// A vector of plain components not tied to any frame.
    pub fn untyped<I, E>(components: I) -> Result<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Ok(Self {
            components: three_components(components, "vector")?,
            system: None,
        })
    }

    pub(crate) fn from_parts(components: [Expr; 3], system: Option<CoordinateSystem>) -> Self {
        Self { components, system }
    }

    pub fn components(&self) -> &[Expr; 3] {
        &self.components
    }

    pub fn component(&self, index: usize) -> Expr {
        self.components.get(index).cloned().unwrap_or_else(Expr::zero)
    }

    pub fn system(&self) -> Option<&CoordinateSystem> {
        self.system.as_ref()
    }

    fn map(&self, f: impl Fn(&Expr) -> Expr) -> Vector {
        Vector {
            components: self.components.each_ref().map(|c| f(c).simplify()),
            system: self.system.clone(),
        }
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = &self.components;
        write!(f, "[{a}, {b}, {c}]")?;
        if let Some(system) = &self.system {
            write!(f, " in {system}")?;
        }
        Ok(())
    }
}

/// The frame shared by both operands.
fn common_system(lhs: &Vector, rhs: &Vector) -> Result<Option<CoordinateSystem>> {
    match (&lhs.system, &rhs.system) {
        (None, None) => Ok(None),
        (Some(a), Some(b)) if a == b => Ok(Some(a.clone())),
        (a, b) => Err(PhysicsError::TypeMismatch(format!(
            "vectors must share a coordinate system, got {} and {}",
            describe(a.as_ref()),
            describe(b.as_ref())
        ))),
    }
}

fn describe(system: Option<&CoordinateSystem>) -> String {
    system.map_or_else(|| "no system".to_string(), ToString::to_string)
}

fn require_cartesian(vector: &Vector, operation: &str) -> Result<()> {
    match &vector.system {
        Some(system) if !system.is_cartesian() => Err(PhysicsError::InvalidValue(format!(
            "{operation} is only defined for cartesian vectors, got {system}"
        ))),
        _ => Ok(()),
    }
}

fn zip_components(lhs: &Vector, rhs: &Vector, f: impl Fn(Expr, Expr) -> Expr) -> [Expr; 3] {
    [0usize, 1, 2].map(|i| f(lhs.components[i].clone(), rhs.components[i].clone()).simplify())
}

pub fn add_cartesian_vectors(lhs: &Vector, rhs: &Vector) -> Result<Vector> {
    let system = common_system(lhs, rhs)?;
    require_cartesian(lhs, "addition")?;
    Ok(Vector::from_parts(zip_components(lhs, rhs, |a, b| a + b), system))
}

pub fn subtract_cartesian_vectors(lhs: &Vector, rhs: &Vector) -> Result<Vector> {
    let system = common_system(lhs, rhs)?;
    require_cartesian(lhs, "subtraction")?;
    Ok(Vector::from_parts(zip_components(lhs, rhs, |a, b| a - b), system))
}

/// Scales the vector's length by `factor`. Angular coordinates of
/// cylindrical and spherical vectors are left unchanged.
pub fn scale_vector(factor: impl Into<Expr>, vector: &Vector) -> Result<Vector> {
    let factor = factor.into();
    let components = match &vector.system {
        Some(system) => system.base().scale_position(&factor, &vector.components)?,
        None => vector.components.clone().map(|c| Expr::mul([factor.clone(), c])),
    };
    Ok(Vector::from_parts(components.map(|c| c.simplify()), vector.system.clone()))
}

pub fn dot_vectors(lhs: &Vector, rhs: &Vector) -> Result<Expr> {
    let dot = match common_system(lhs, rhs)? {
        Some(system) => system.base().dot_positions(&lhs.components, &rhs.components),
        None => Expr::add(zip_components(lhs, rhs, |a, b| a * b)),
    };
    Ok(dot.simplify())
}

pub fn cross_cartesian_vectors(lhs: &Vector, rhs: &Vector) -> Result<Vector> {
    let system = common_system(lhs, rhs)?;
    require_cartesian(lhs, "cross product")?;
    let [a1, a2, a3] = lhs.components.clone();
    let [b1, b2, b3] = rhs.components.clone();
    let components = [
        a2.clone() * b3.clone() - a3.clone() * b2.clone(),
        a3 * b1.clone() - a1.clone() * b3,
        a1 * b2 - a2 * b1,
    ];
    Ok(Vector::from_parts(components.map(|c| c.simplify()), system))
}

pub fn vector_magnitude(vector: &Vector) -> Result<Expr> {
    Ok(Expr::sqrt(dot_vectors(vector, vector)?).simplify())
}

pub fn vector_unit(vector: &Vector) -> Result<Vector> {
    require_cartesian(vector, "unit vector")?;
    let magnitude = vector_magnitude(vector)?;
    if magnitude.is_zero() {
        return Err(PhysicsError::InvalidValue("zero vector has no direction".to_string()));
    }
    Ok(vector.map(|c| Expr::div(c.clone(), magnitude.clone())))
}

/// Component of `vector` along `onto`.
pub fn project_vector(vector: &Vector, onto: &Vector) -> Result<Vector> {
    common_system(vector, onto)?;
    require_cartesian(vector, "projection")?;
    let norm_squared = dot_vectors(onto, onto)?;
    if norm_squared.is_zero() {
        return Err(PhysicsError::InvalidValue("cannot project onto the zero vector".to_string()));
    }
    let ratio = Expr::div(dot_vectors(vector, onto)?, norm_squared);
    Ok(onto.map(|c| Expr::mul([ratio.clone(), c.clone()])))
}

/// Component of `vector` orthogonal to `from`.
pub fn reject_cartesian_vector(vector: &Vector, from: &Vector) -> Result<Vector> {
    let projection = project_vector(vector, from)?;
    subtract_cartesian_vectors(vector, &projection)
}

pub fn diff_cartesian_vector(vector: &Vector, var: &Symbol) -> Result<Vector> {
    require_cartesian(vector, "differentiation")?;
    Ok(vector.map(|c| c.diff(var)))
}

/// Component-wise antiderivative with respect to `var`.
pub fn integrate_cartesian_vector(
    vector: &Vector,
    var: &Symbol,
    settings: &IntegrationSettings,
) -> Result<Vector> {
    require_cartesian(vector, "integration")?;
    let [a, b, c] = &vector.components;
    Ok(Vector::from_parts(
        [
            a.antiderivative_with(var, settings)?,
            b.antiderivative_with(var, settings)?,
            c.antiderivative_with(var, settings)?,
        ],
        vector.system.clone(),
    ))
}

/// Re-expresses the vector in `target`.
///
/// The vector is read as the displacement from its frame's origin, so frame
/// origins drop out: a translation leaves Cartesian components unchanged and
/// a rotation rotates them. A vector or target without a frame is only
/// retagged.
pub fn vector_rebase(vector: &Vector, target: Option<&CoordinateSystem>) -> Result<Vector> {
    let (Some(source), Some(target)) = (vector.system.as_ref(), target) else {
        warn!("rebasing a vector without both frames only replaces its tag");
        return Ok(Vector::from_parts(vector.components.clone(), target.cloned()));
    };
    if source == target {
        return Ok(vector.clone());
    }
    let local = source.base().position_to_cartesian(&vector.components);
    let root = matrix_vector(source.orientation(), &local);
    let target_local = transpose_vector(target.orientation(), &root).map(|c| c.simplify());
    let components = target
        .base()
        .position_from_cartesian(&target_local)?
        .map(|c| c.simplify());
    Ok(Vector::from_parts(components, Some(target.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::SystemKind;

    fn symbols(names: [&str; 3]) -> [Expr; 3] {
        names.map(|name| Expr::from(Symbol::dimensionless(name)))
    }

    fn cartesian_pair() -> (Vector, Vector) {
        let frame = CoordinateSystem::cartesian();
        let u = Vector::new(symbols(["u1", "u2", "u3"]), &frame).expect("u");
        let v = Vector::new(symbols(["v1", "v2", "v3"]), &frame).expect("v");
        (u, v)
    }

    #[test]
    fn dot_product_is_symmetric() {
        let (u, v) = cartesian_pair();
        assert_eq!(dot_vectors(&u, &v).expect("u.v"), dot_vectors(&v, &u).expect("v.u"));
    }

    #[test]
    fn cross_product_is_antisymmetric() {
        let (u, v) = cartesian_pair();
        let uv = cross_cartesian_vectors(&u, &v).expect("u x v");
        let vu = cross_cartesian_vectors(&v, &u).expect("v x u");
        assert_eq!(uv, scale_vector(-1, &vu).expect("scale"));
    }

    #[test]
    fn cross_product_is_orthogonal_to_both_factors() {
        let (u, v) = cartesian_pair();
        let w = cross_cartesian_vectors(&u, &v).expect("u x v");
        assert!(dot_vectors(&w, &u).expect("w.u").is_zero());
        assert!(dot_vectors(&w, &v).expect("w.v").is_zero());
    }

    #[test]
    fn lagrange_identity() {
        let (u, v) = cartesian_pair();
        let w = cross_cartesian_vectors(&u, &v).expect("u x v");
        let lhs = dot_vectors(&w, &w).expect("|w|^2");
        let uv = dot_vectors(&u, &v).expect("u.v");
        let rhs = dot_vectors(&u, &u).expect("|u|^2") * dot_vectors(&v, &v).expect("|v|^2")
            - Expr::powi(uv, 2);
        assert!(lhs.equivalent(&rhs));
    }

    #[test]
    fn scaling_multiplies_the_magnitude() {
        let (u, _) = cartesian_pair();
        let k = Symbol::dimensionless("k");
        let scaled = scale_vector(Expr::from(&k), &u).expect("scale");
        let expected = Expr::abs(Expr::from(&k)) * vector_magnitude(&u).expect("|u|");
        assert!(vector_magnitude(&scaled).expect("|ku|").equivalent(&expected));
    }

    #[test]
    fn positive_scaling_keeps_the_direction() {
        let (u, _) = cartesian_pair();
        let k = Symbol::dimensionless("k").positive();
        let scaled = vector_unit(&scale_vector(Expr::from(&k), &u).expect("scale")).expect("unit");
        let unit = vector_unit(&u).expect("unit");
        for (a, b) in scaled.components().iter().zip(unit.components()) {
            assert!(a.equivalent(b));
        }
    }

    #[test]
    fn cylindrical_scaling_keeps_the_angle() {
        let frame = CoordinateSystem::cylindrical();
        let v = Vector::new([Expr::int(2), Expr::pi(), Expr::int(1)], &frame).expect("v");
        let scaled = scale_vector(3, &v).expect("scale");
        assert_eq!(scaled.components(), &[Expr::int(6), Expr::pi(), Expr::int(3)]);
        let spherical = CoordinateSystem::spherical();
        let w = Vector::new([Expr::int(2), Expr::pi(), Expr::int(1)], &spherical).expect("w");
        assert_eq!(
            scale_vector(3, &w).expect("scale").components(),
            &[Expr::int(6), Expr::pi(), Expr::int(1)]
        );
    }

    #[test]
    fn perpendicular_cylindrical_vectors() {
        let frame = CoordinateSystem::cylindrical();
        let a = Vector::new([1, 0], &frame).expect("a");
        let b = Vector::new([Expr::one(), Expr::pi() / Expr::int(2)], &frame).expect("b");
        assert!(dot_vectors(&a, &b).expect("dot").is_zero());
    }

    #[test]
    fn spherical_magnitude_is_the_radius() {
        let frame = CoordinateSystem::spherical();
        let r = Symbol::dimensionless("R").positive();
        let v = Vector::new([Expr::from(&r), Expr::pi() / Expr::int(3), Expr::one()], &frame)
            .expect("v");
        assert_eq!(vector_magnitude(&v).expect("|v|"), Expr::from(&r));
    }

    #[test]
    fn mixed_frames_are_a_type_error() {
        let a = Vector::new([1, 0, 0], &CoordinateSystem::cartesian()).expect("a");
        let b = Vector::new([1, 0, 0], &CoordinateSystem::cartesian()).expect("b");
        let err = dot_vectors(&a, &b).expect_err("distinct frames");
        assert!(err.is_type_error());
    }

    #[test]
    fn cartesian_only_operations_reject_other_frames() {
        let frame = CoordinateSystem::cylindrical();
        let a = Vector::new([1, 0, 0], &frame).expect("a");
        let t = Symbol::dimensionless("t");
        for err in [
            cross_cartesian_vectors(&a, &a).expect_err("cross"),
            vector_unit(&a).expect_err("unit"),
            diff_cartesian_vector(&a, &t).expect_err("diff"),
            integrate_cartesian_vector(&a, &t, &IntegrationSettings::default()).expect_err("integrate"),
        ] {
            assert!(matches!(err, PhysicsError::InvalidValue(_)), "{err}");
        }
    }

    #[test]
    fn projection_and_rejection_decompose() {
        let frame = CoordinateSystem::cartesian();
        let v = Vector::new([3, 4, 0], &frame).expect("v");
        let axis = Vector::new([1, 0, 0], &frame).expect("axis");
        let projection = project_vector(&v, &axis).expect("projection");
        let rejection = reject_cartesian_vector(&v, &axis).expect("rejection");
        assert_eq!(projection.components(), &[Expr::int(3), Expr::zero(), Expr::zero()]);
        assert_eq!(rejection.components(), &[Expr::zero(), Expr::int(4), Expr::zero()]);
        let zero = Vector::new([0, 0, 0], &frame).expect("zero");
        assert!(project_vector(&v, &zero).is_err());
    }

    #[test]
    fn differentiate_and_integrate_a_trajectory() {
        let frame = CoordinateSystem::cartesian();
        let t = Symbol::dimensionless("t");
        let te = Expr::from(&t);
        let position = Vector::new([Expr::cos(te.clone()), Expr::sin(te.clone()), te.clone()], &frame)
            .expect("helix");
        let velocity = diff_cartesian_vector(&position, &t).expect("velocity");
        assert_eq!(
            velocity.components(),
            &[-Expr::sin(te.clone()), Expr::cos(te.clone()), Expr::one()]
        );
        let back = integrate_cartesian_vector(&velocity, &t, &IntegrationSettings::default())
            .expect("integral");
        assert_eq!(back.component(0), Expr::cos(te.clone()));
        assert_eq!(back.component(2), te);
    }

    #[test]
    fn rebase_round_trip() {
        let cartesian = CoordinateSystem::cartesian();
        let components = symbols(["a", "b", "c"]);
        let v = Vector::new(components.clone(), &cartesian).expect("v");
        for kind in SystemKind::ALL {
            let target = CoordinateSystem::new(kind);
            let there = vector_rebase(&v, Some(&target)).expect("there");
            let back = vector_rebase(&there, Some(&cartesian)).expect("back");
            assert_eq!(back.system(), Some(&cartesian));
            for (a, b) in back.components().iter().zip(components.iter()) {
                assert!(a.equivalent(b), "{kind}: {a} != {b}");
            }
        }
    }

    #[test]
    fn cylindrical_rebase_round_trip_is_structural() {
        let cylindrical = CoordinateSystem::cylindrical();
        let cartesian = CoordinateSystem::cartesian();
        let r = Symbol::dimensionless("R").positive();
        let [_, theta, z] = symbols(["_", "theta0", "z0"]);
        let v = Vector::new([Expr::from(&r), theta.clone(), z.clone()], &cylindrical).expect("v");
        let there = vector_rebase(&v, Some(&cartesian)).expect("there");
        let back = vector_rebase(&there, Some(&cylindrical)).expect("back");
        assert_eq!(back.components(), &[Expr::from(&r), theta, z]);
    }

    #[test]
    fn rebase_without_frame_retags() {
        let v = Vector::untyped([1, 2, 3]).expect("v");
        let frame = CoordinateSystem::spherical();
        let rebased = vector_rebase(&v, Some(&frame)).expect("retag");
        assert_eq!(rebased.system(), Some(&frame));
        assert_eq!(rebased.components(), v.components());
    }

    #[test]
    fn translation_leaves_cartesian_components_alone() {
        let parent = CoordinateSystem::cartesian();
        let offset = Vector::new([1, 2, 0], &parent).expect("offset");
        let moved = parent.coordinates_translate(&offset).expect("translation");
        let force = Vector::new([1, 0, 0], &parent).expect("force");
        let rebased = vector_rebase(&force, Some(&moved)).expect("rebase");
        assert_eq!(rebased.system(), Some(&moved));
        assert_eq!(rebased.components(), &[Expr::one(), Expr::zero(), Expr::zero()]);
    }

    #[test]
    fn rotation_rotates_cartesian_components() {
        let parent = CoordinateSystem::cartesian();
        let axis = Vector::new([0, 0, 1], &parent).expect("axis");
        let rotated = parent
            .coordinates_rotate(Expr::pi() / Expr::int(2), &axis)
            .expect("rotation");
        let v = Vector::new([1, 0, 0], &parent).expect("v");
        let rebased = vector_rebase(&v, Some(&rotated)).expect("rebase");
        assert_eq!(rebased.components(), &[Expr::zero(), Expr::int(-1), Expr::zero()]);
    }
}
