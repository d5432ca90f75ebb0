//! Scalar and vector fields.
//!
//! A field maps a [`FieldPoint`] to a value and remembers the frame its
//! formula is written in. Applying a field to a point tagged with another
//! frame is a type error; use [`field_rebase`] or [`vector_field_rebase`] to
//! move the field first.

use super::algebra::Vector;
use super::coordinate_system::CoordinateSystem;
use super::point::FieldPoint;
use crate::coordinates::system::{bind, matrix_vector, transpose_vector};
use crate::errors::{PhysicsError, Result};
use crate::symbolic::{Expr, Symbol};
use log::warn;
use std::fmt;
use std::sync::Arc;

pub type FieldFunction = Arc<dyn Fn(&FieldPoint) -> Expr + Send + Sync>;

/// A constant value or a function of the point.
#[derive(Clone)]
pub enum FieldComponent {
    Constant(Expr),
    Function(FieldFunction),
}

impl FieldComponent {
    pub fn function(f: impl Fn(&FieldPoint) -> Expr + Send + Sync + 'static) -> Self {
        FieldComponent::Function(Arc::new(f))
    }

    /// A function substituting `scalars` by the point's coordinates in
    /// `expr`.
    fn from_expression(expr: Expr, scalars: [Symbol; 3]) -> Self {
        FieldComponent::function(move |point| {
            let bindings = bind(&scalars, point.coordinates());
            expr.subs(&bindings)
        })
    }

    fn at(&self, point: &FieldPoint) -> Expr {
        match self {
            FieldComponent::Constant(value) => value.clone(),
            FieldComponent::Function(f) => f(point),
        }
    }
}

impl fmt::Debug for FieldComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldComponent::Constant(value) => write!(f, "Constant({value})"),
            FieldComponent::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<Expr> for FieldComponent {
    fn from(value: Expr) -> Self {
        FieldComponent::Constant(value)
    }
}

fn check_point(system: Option<&CoordinateSystem>, point: &FieldPoint) -> Result<()> {
    match (system, point.system()) {
        (Some(field), Some(tag)) if field != tag => Err(PhysicsError::TypeMismatch(format!(
            "field in {field} applied to a point in {tag}"
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn require_system<'a>(
    system: Option<&'a CoordinateSystem>,
    operation: &str,
) -> Result<&'a CoordinateSystem> {
    system.ok_or_else(|| {
        PhysicsError::InvalidValue(format!("{operation} needs a field with a coordinate system"))
    })
}

#[derive(Debug, Clone)]
pub struct ScalarField {
    component: FieldComponent,
    system: Option<CoordinateSystem>,
}

impl ScalarField {
    pub fn new(
        f: impl Fn(&FieldPoint) -> Expr + Send + Sync + 'static,
        system: Option<&CoordinateSystem>,
    ) -> Self {
        Self {
            component: FieldComponent::function(f),
            system: system.cloned(),
        }
    }

    pub fn constant(value: impl Into<Expr>, system: Option<&CoordinateSystem>) -> Self {
        Self {
            component: FieldComponent::Constant(value.into()),
            system: system.cloned(),
        }
    }

    /// A field given by an expression in `system`'s base scalars.
    pub fn from_expression(expr: Expr, system: &CoordinateSystem) -> Self {
        Self {
            component: FieldComponent::from_expression(expr, system.base_scalars()),
            system: Some(system.clone()),
        }
    }

    pub fn system(&self) -> Option<&CoordinateSystem> {
        self.system.as_ref()
    }

    pub fn apply(&self, point: &FieldPoint) -> Result<Expr> {
        check_point(self.system(), point)?;
        Ok(self.component.at(point))
    }

    /// Applies the field to a literal or symbolic coordinate tuple in the
    /// field's own frame.
    pub fn apply_coordinates<I, E>(&self, coordinates: I) -> Result<Expr>
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        self.apply(&FieldPoint::new(coordinates)?)
    }

    /// The field over the whole space, as an expression in its base scalars.
    pub fn apply_to_basis(&self) -> Result<Expr> {
        let system = require_system(self.system(), "applying a field to its basis")?;
        self.apply(&FieldPoint::at_base_scalars(system))
    }
}

#[derive(Debug, Clone)]
pub struct VectorField {
    components: [FieldComponent; 3],
    system: Option<CoordinateSystem>,
}

impl VectorField {
    /// One component per axis; missing components are zero.
    pub fn new(
        components: impl IntoIterator<Item = FieldComponent>,
        system: Option<&CoordinateSystem>,
    ) -> Result<Self> {
        let mut slots = [
            FieldComponent::Constant(Expr::zero()),
            FieldComponent::Constant(Expr::zero()),
            FieldComponent::Constant(Expr::zero()),
        ];
        for (index, component) in components.into_iter().enumerate() {
            if index >= slots.len() {
                return Err(PhysicsError::InvalidValue(
                    "vector field has more than 3 components".to_string(),
                ));
            }
            slots[index] = component;
        }
        Ok(Self {
            components: slots,
            system: system.cloned(),
        })
    }

    /// The same vector at every point.
    pub fn constant(vector: &Vector) -> Self {
        Self {
            components: vector.components().clone().map(FieldComponent::Constant),
            system: vector.system().cloned(),
        }
    }

    /// A field given by expressions in `system`'s base scalars.
    pub fn from_expressions(
        expressions: impl IntoIterator<Item = Expr>,
        system: &CoordinateSystem,
    ) -> Result<Self> {
        let scalars = system.base_scalars();
        let components = expressions
            .into_iter()
            .map(|expr| FieldComponent::from_expression(expr, scalars.clone()));
        Self::new(components, Some(system))
    }

    pub fn system(&self) -> Option<&CoordinateSystem> {
        self.system.as_ref()
    }

    /// The same components under another tag, without re-expressing them.
    pub(crate) fn retagged(&self, system: Option<&CoordinateSystem>) -> VectorField {
        VectorField {
            components: self.components.clone(),
            system: system.cloned(),
        }
    }

    pub fn apply(&self, point: &FieldPoint) -> Result<Vector> {
        check_point(self.system(), point)?;
        let components = self.components.each_ref().map(|c| c.at(point));
        Ok(Vector::from_parts(components, self.system.clone()))
    }

    pub fn apply_coordinates<I, E>(&self, coordinates: I) -> Result<Vector>
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        self.apply(&FieldPoint::new(coordinates)?)
    }

    pub fn apply_to_basis(&self) -> Result<Vector> {
        let system = require_system(self.system(), "applying a field to its basis")?;
        self.apply(&FieldPoint::at_base_scalars(system))
    }
}

/// Re-expresses a scalar field in `target`.
///
/// When the field or the target has no frame only the tag is replaced, and
/// the field is then only meaningful if both frames coincide.
pub fn field_rebase(field: &ScalarField, target: Option<&CoordinateSystem>) -> Result<ScalarField> {
    let (Some(source), Some(target)) = (field.system(), target) else {
        warn!("rebasing a scalar field without both frames only replaces its tag");
        return Ok(ScalarField {
            component: field.component.clone(),
            system: target.cloned(),
        });
    };
    if source == target {
        return Ok(field.clone());
    }
    let mapping = source.express_base_scalars(target)?;
    let expr = field.apply_to_basis()?.subs(&mapping).simplify();
    Ok(ScalarField::from_expression(expr, target))
}

/// Re-expresses a vector field in `target`, rotating its components into the
/// target basis so that it describes the same physical field.
pub fn vector_field_rebase(
    field: &VectorField,
    target: Option<&CoordinateSystem>,
) -> Result<VectorField> {
    let (Some(source), Some(target)) = (field.system(), target) else {
        warn!("rebasing a vector field without both frames only replaces its tag");
        return Ok(field.retagged(target));
    };
    if source == target {
        return Ok(field.clone());
    }
    let mapping = source.express_base_scalars(target)?;
    let local = field.apply_to_basis()?.components().clone();
    let source_basis = source.base().base_vector_matrix();
    let root = matrix_vector(source.orientation(), &matrix_vector(&source_basis, &local));
    let target_local = transpose_vector(target.orientation(), &root);
    let target_components = transpose_vector(&target.base().base_vector_matrix(), &target_local)
        .map(|c| c.subs(&mapping).simplify());
    VectorField::from_expressions(target_components, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::SystemKind;

    fn scalars(system: &CoordinateSystem) -> [Expr; 3] {
        system.base_scalars().map(|s| Expr::from(&s))
    }

    #[test]
    fn scalar_field_applies_to_points_and_basis() {
        let frame = CoordinateSystem::cartesian();
        let [x, y, _] = scalars(&frame);
        let field = ScalarField::from_expression(x.clone() * y.clone(), &frame);
        assert_eq!(field.apply_coordinates([2, 3]).expect("value"), Expr::int(6));
        assert_eq!(field.apply_to_basis().expect("basis"), x * y);
    }

    #[test]
    fn callable_field_sees_the_point() {
        let field = ScalarField::new(|p| p.as_cartesian().x() + p.as_cartesian().z(), None);
        assert_eq!(field.apply_coordinates([1, 5, 2]).expect("value"), Expr::int(3));
        let err = field.apply_to_basis().expect_err("no frame");
        assert!(matches!(err, PhysicsError::InvalidValue(_)));
    }

    #[test]
    fn applying_to_a_foreign_point_is_a_type_error() {
        let frame = CoordinateSystem::cylindrical();
        let other = CoordinateSystem::cylindrical();
        let field = ScalarField::constant(1, Some(&frame));
        let point = FieldPoint::in_system(&other, [1, 0, 0]).expect("point");
        assert!(field.apply(&point).expect_err("foreign frame").is_type_error());
        let own = FieldPoint::in_system(&frame, [1, 0, 0]).expect("point");
        assert_eq!(field.apply(&own).expect("own frame"), Expr::one());
    }

    #[test]
    fn vector_field_rejects_a_fourth_component() {
        let components = (0..4).map(|_| FieldComponent::from(Expr::one()));
        let err = VectorField::new(components, None).expect_err("four components");
        assert!(matches!(err, PhysicsError::InvalidValue(_)));
    }

    #[test]
    fn constant_vector_field() {
        let frame = CoordinateSystem::cartesian();
        let v = Vector::new([1, 2, 3], &frame).expect("v");
        let field = VectorField::constant(&v);
        assert_eq!(field.apply_coordinates([9, 9, 9]).expect("value"), v);
    }

    #[test]
    fn scalar_field_rebase_keeps_values() {
        let cartesian = CoordinateSystem::cartesian();
        let cylindrical = cartesian.coordinates_transform(SystemKind::Cylindrical);
        let [x, y, z] = scalars(&cartesian);
        let field = ScalarField::from_expression(
            Expr::powi(x, 2) + Expr::powi(y, 2) + z,
            &cartesian,
        );
        let rebased = field_rebase(&field, Some(&cylindrical)).expect("rebase");
        let [r, _, z] = scalars(&cylindrical);
        assert_eq!(rebased.apply_to_basis().expect("basis"), Expr::powi(r, 2) + z);
        assert_eq!(rebased.system(), Some(&cylindrical));
    }

    #[test]
    fn radial_field_rebases_to_unit_radial_component() {
        let cartesian = CoordinateSystem::cartesian();
        let cylindrical = CoordinateSystem::cylindrical();
        let [x, y, _] = scalars(&cartesian);
        let field =
            VectorField::from_expressions([x, y, Expr::zero()], &cartesian).expect("field");
        let rebased = vector_field_rebase(&field, Some(&cylindrical)).expect("rebase");
        let [r, _, _] = scalars(&cylindrical);
        assert_eq!(
            rebased.apply_to_basis().expect("basis").components(),
            &[r, Expr::zero(), Expr::zero()]
        );
    }

    #[test]
    fn rebase_without_frame_retags() {
        let field = ScalarField::constant(5, None);
        let frame = CoordinateSystem::spherical();
        let rebased = field_rebase(&field, Some(&frame)).expect("retag");
        assert_eq!(rebased.system(), Some(&frame));
        assert_eq!(rebased.apply_to_basis().expect("value"), Expr::int(5));
    }
}
