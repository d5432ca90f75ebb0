//! Small physics laws written against the public API, the way formula
//! modules consume the core: symbolic law, then a dimension-checked numeric
//! wrapper.

use symphys_core::coordinates::{CartesianSystem, CoordinateVector, QuantityCoordinateVector};
use symphys_core::coordinates::{AppliedPoint, BaseCoordinateSystem};
use symphys_core::symbolic::{Expr, Symbol};
use symphys_core::units::unit::{self, of};
use symphys_core::units::{validate_input, validate_output, Dimension, Quantity};
use symphys_core::vector::{
    circulation_along_curve, divergence_operator, gradient_operator, vector_field_rebase,
    CoordinateSystem, FieldPoint, ParameterRange, ScalarField, VectorField,
};
use symphys_core::{IntegrationSettings, Result};
use std::sync::Arc;

/// Work done by a constant force `(F, 0, 0)` along the straight path from
/// the origin to `(d, 0, 0)`.
struct WorkLaw {
    force: Symbol,
    distance: Symbol,
    work: Expr,
}

impl WorkLaw {
    fn new() -> Result<Self> {
        let force = Symbol::new("F", Dimension::FORCE);
        let distance = Symbol::new("d", Dimension::LENGTH).positive();
        let s = Symbol::new("s", Dimension::LENGTH);
        let frame = CoordinateSystem::cartesian();
        let field = VectorField::from_expressions([Expr::from(&force)], &frame)?;
        let path = FieldPoint::new([Expr::from(&s)])?;
        let range = ParameterRange::new(&s, 0, Expr::from(&distance));
        let work = circulation_along_curve(&field, &path, &range, &IntegrationSettings::default())?;
        Ok(Self {
            force,
            distance,
            work,
        })
    }

    fn calculate_work(&self, force: &Quantity, distance: &Quantity) -> Result<Quantity> {
        validate_input(
            "calculate_work",
            &[
                ("force", force.into(), Dimension::FORCE),
                ("distance", distance.into(), Dimension::LENGTH),
            ],
        )?;
        let value = self.work.subs(&[
            (self.force.clone(), force.scale_factor().clone()),
            (self.distance.clone(), distance.scale_factor().clone()),
        ]);
        let result = Quantity::with_dimension(
            value.simplify(),
            force.dimension() * distance.dimension(),
        )?;
        validate_output("calculate_work", Dimension::ENERGY, result)
    }
}

#[test]
fn work_is_force_times_distance() {
    let law = WorkLaw::new().expect("law");
    let expected = Expr::from(&law.force) * Expr::from(&law.distance);
    assert!(law.work.equivalent(&expected), "{}", law.work);

    let force = Quantity::new(of(3, unit::newton())).expect("force");
    let distance = Quantity::new(of(2, unit::kilometer())).expect("distance");
    let work = law.calculate_work(&force, &distance).expect("work");
    assert_eq!(work.value().expect("numeric"), 6000.0);
    assert!(work.dimension().is_equivalent(&Dimension::ENERGY));
}

#[test]
fn work_rejects_a_duration_for_the_distance() {
    let law = WorkLaw::new().expect("law");
    let force = Quantity::new(of(3, unit::newton())).expect("force");
    let duration = Quantity::new(of(2, unit::second())).expect("duration");
    let err = law.calculate_work(&force, &duration).expect_err("time is not length");
    assert!(err.is_units_error());
    assert!(err.to_string().contains("'distance'"));
}

#[test]
fn point_source_potential() {
    let frame = CoordinateSystem::spherical();
    let [r, _, _] = frame.base_scalars().map(|s| Expr::from(&s));
    let q = Symbol::dimensionless("q");
    let potential = ScalarField::from_expression(Expr::div(Expr::from(&q), r.clone()), &frame);
    let gradient = gradient_operator(&potential).expect("gradient");

    let radial = gradient.apply_to_basis().expect("basis").component(0);
    assert!(radial.equivalent(&-(Expr::from(&q) * Expr::powi(r, -2))), "{radial}");

    let laplacian = divergence_operator(&gradient).expect("divergence");
    assert!(laplacian.apply_to_basis().expect("basis").equivalent(&Expr::zero()));

    let cartesian = CoordinateSystem::cartesian();
    let rebased = vector_field_rebase(&gradient, Some(&cartesian)).expect("rebase");
    assert_eq!(rebased.system(), Some(&cartesian));
    let at_point = rebased.apply_coordinates([3, 0, 4]).expect("apply");
    let expected = [
        Expr::rational(-3, 125) * Expr::from(&q),
        Expr::zero(),
        Expr::rational(-4, 125) * Expr::from(&q),
    ];
    for (actual, expected) in at_point.components().iter().zip(&expected) {
        assert!(actual.equivalent(expected), "{actual} != {expected}");
    }
}

#[test]
fn momenta_on_an_applied_point() {
    let system: Arc<dyn BaseCoordinateSystem> = Arc::new(CartesianSystem::new());
    let point = AppliedPoint::new(&system, [1, 2, 0]).expect("point");
    let kilogram_meter_per_second = |n: i64| {
        Quantity::with_dimension(n, Dimension::MASS * Dimension::VELOCITY).expect("momentum")
    };
    let p1 = QuantityCoordinateVector::new(
        [kilogram_meter_per_second(3), kilogram_meter_per_second(4)],
        point.clone(),
    )
    .expect("p1");
    let p2 = QuantityCoordinateVector::new([kilogram_meter_per_second(1)], point.clone())
        .expect("p2");
    let total = p1.add(&p2).expect("sum");
    assert_eq!(
        total.vector(),
        &CoordinateVector::new([4, 4, 0], point).expect("expected")
    );
    let magnitude = p1.magnitude().expect("magnitude");
    assert_eq!(magnitude.value().expect("numeric"), 5.0);
    assert!(magnitude.dimension().is_equivalent(&(Dimension::MASS * Dimension::VELOCITY)));

    let length = Quantity::new(of(1, unit::meter())).expect("length");
    let mismatched = QuantityCoordinateVector::new([length], p1.vector().point().clone())
        .expect("length vector");
    assert!(p1.add(&mismatched).expect_err("momentum + length").is_units_error());
}
