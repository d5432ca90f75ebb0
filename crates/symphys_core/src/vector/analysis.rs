//! Circulation and flux of vector fields along parametrized curves and
//! surfaces.
//!
//! Trajectories are [`FieldPoint`]s whose coordinates depend on the
//! integration parameters. Fields must be Cartesian or frameless.

use super::coordinate_system::CoordinateSystem;
use super::field::VectorField;
use super::operators::curl_operator;
use super::point::FieldPoint;
use crate::errors::{PhysicsError, Result};
use crate::settings::IntegrationSettings;
use crate::symbolic::{Expr, Symbol};
use log::debug;

/// Integration variable and bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRange {
    pub parameter: Symbol,
    pub from: Expr,
    pub to: Expr,
}

impl ParameterRange {
    pub fn new(parameter: &Symbol, from: impl Into<Expr>, to: impl Into<Expr>) -> Self {
        Self {
            parameter: parameter.clone(),
            from: from.into(),
            to: to.into(),
        }
    }

    fn integrate(&self, integrand: &Expr, settings: &IntegrationSettings) -> Result<Expr> {
        integrand.integrate(&self.parameter, &self.from, &self.to, settings)
    }
}

fn require_cartesian(field: &VectorField, operation: &str) -> Result<()> {
    match field.system() {
        Some(system) if !system.is_cartesian() => Err(PhysicsError::InvalidValue(format!(
            "{operation} needs a cartesian field, got one in {system}"
        ))),
        _ => Ok(()),
    }
}

fn tangent(trajectory: &FieldPoint, parameter: &Symbol) -> [Expr; 3] {
    trajectory.coordinates().clone().map(|c| c.diff(parameter).simplify())
}

fn dot(lhs: &[Expr; 3], rhs: &[Expr; 3]) -> Expr {
    Expr::add(lhs.iter().zip(rhs).map(|(a, b)| Expr::mul([a.clone(), b.clone()]))).simplify()
}

fn cross(lhs: &[Expr; 3], rhs: &[Expr; 3]) -> [Expr; 3] {
    [0usize, 1, 2].map(|i| {
        let (j, k) = ((i + 1) % 3, (i + 2) % 3);
        Expr::sub(
            Expr::mul([lhs[j].clone(), rhs[k].clone()]),
            Expr::mul([lhs[k].clone(), rhs[j].clone()]),
        )
        .simplify()
    })
}

/// Line integral of the tangential component of `field` along `trajectory`.
pub fn circulation_along_curve(
    field: &VectorField,
    trajectory: &FieldPoint,
    range: &ParameterRange,
    settings: &IntegrationSettings,
) -> Result<Expr> {
    require_cartesian(field, "circulation")?;
    let value = field.apply(trajectory)?;
    let integrand = dot(value.components(), &tangent(trajectory, &range.parameter));
    debug!("circulation integrand {integrand} over {}", range.parameter);
    Ok(range.integrate(&integrand, settings)?.simplify())
}

/// Circulation around the boundary of `surface`, computed as the flux of the
/// curl of `field` across the surface.
///
/// The boundary is traversed counter-clockwise when seen from the side the
/// normal `d(surface)/d(first) x d(surface)/d(second)` points to. A
/// frameless field is read as Cartesian.
pub fn circulation_along_surface_boundary(
    field: &VectorField,
    surface: &FieldPoint,
    first: &ParameterRange,
    second: &ParameterRange,
    settings: &IntegrationSettings,
) -> Result<Expr> {
    require_cartesian(field, "circulation")?;
    let curl = match field.system() {
        Some(_) => curl_operator(field)?,
        None => {
            let frame = CoordinateSystem::cartesian();
            curl_operator(&field.retagged(Some(&frame)))?.retagged(None)
        }
    };
    flux_across_surface(&curl, surface, first, second, settings)
}

/// Flux of a planar field across a curve in the `xy` plane.
///
/// The normal is the tangent rotated clockwise by a right angle, so it
/// points outwards for a counter-clockwise closed curve.
pub fn flux_across_curve(
    field: &VectorField,
    trajectory: &FieldPoint,
    range: &ParameterRange,
    settings: &IntegrationSettings,
) -> Result<Expr> {
    require_cartesian(field, "flux across a curve")?;
    if !trajectory.coordinate(2).simplify().is_zero() {
        return Err(PhysicsError::InvalidValue(format!(
            "flux across a curve is only defined in the plane, got trajectory with z = {}",
            trajectory.coordinate(2)
        )));
    }
    let [dx, dy, _] = tangent(trajectory, &range.parameter);
    let normal = [dy, -dx, Expr::zero()];
    let value = field.apply(trajectory)?;
    let integrand = dot(value.components(), &normal);
    debug!("flux integrand {integrand} over {}", range.parameter);
    Ok(range.integrate(&integrand, settings)?.simplify())
}

/// Flux of `field` across `surface`, oriented by
/// `d(surface)/d(first) x d(surface)/d(second)`.
///
/// The `first` parameter is integrated innermost, so its bounds may depend
/// on the `second` parameter.
pub fn flux_across_surface(
    field: &VectorField,
    surface: &FieldPoint,
    first: &ParameterRange,
    second: &ParameterRange,
    settings: &IntegrationSettings,
) -> Result<Expr> {
    require_cartesian(field, "flux across a surface")?;
    let normal = cross(
        &tangent(surface, &first.parameter),
        &tangent(surface, &second.parameter),
    );
    let value = field.apply(surface)?;
    let integrand = dot(value.components(), &normal);
    debug!(
        "flux integrand {integrand} over {} and {}",
        first.parameter, second.parameter
    );
    let inner = first.integrate(&integrand, settings)?.simplify();
    Ok(second.integrate(&inner, settings)?.simplify())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::FieldComponent;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    struct Disk {
        rho: Symbol,
        t: Symbol,
    }

    impl Disk {
        fn new() -> Self {
            Self {
                rho: Symbol::dimensionless("rho").positive(),
                t: Symbol::dimensionless("t"),
            }
        }

        fn boundary(&self) -> FieldPoint {
            let t = Expr::from(&self.t);
            FieldPoint::new([Expr::cos(t.clone()), Expr::sin(t)]).expect("circle")
        }

        fn surface(&self) -> FieldPoint {
            let (rho, t) = (Expr::from(&self.rho), Expr::from(&self.t));
            FieldPoint::new([rho.clone() * Expr::cos(t.clone()), rho * Expr::sin(t)])
                .expect("disk")
        }

        fn turn(&self) -> ParameterRange {
            ParameterRange::new(&self.t, 0, Expr::int(2) * Expr::pi())
        }

        fn radius(&self) -> ParameterRange {
            ParameterRange::new(&self.rho, 0, 1)
        }
    }

    fn rotation_field(frame: &CoordinateSystem) -> VectorField {
        let [x, y, _] = frame.base_scalars().map(|s| Expr::from(&s));
        VectorField::from_expressions([y, -x, Expr::zero()], frame).expect("field")
    }

    fn value(expr: &Expr) -> f64 {
        expr.eval_constant().expect("numeric result")
    }

    #[test]
    fn circulation_of_a_rotation_field_around_the_unit_circle() {
        let disk = Disk::new();
        let field = rotation_field(&CoordinateSystem::cartesian());
        let settings = IntegrationSettings::default();
        let direct =
            circulation_along_curve(&field, &disk.boundary(), &disk.turn(), &settings)
                .expect("direct");
        assert!(direct.equivalent(&(Expr::int(-2) * Expr::pi())), "{direct}");
        assert_relative_eq!(value(&direct), -2.0 * PI, epsilon = 1e-9);
    }

    #[test]
    fn stokes_route_agrees_with_the_line_integral() {
        let disk = Disk::new();
        let field = rotation_field(&CoordinateSystem::cartesian());
        let settings = IntegrationSettings::default();
        let direct =
            circulation_along_curve(&field, &disk.boundary(), &disk.turn(), &settings)
                .expect("direct");
        let stokes = circulation_along_surface_boundary(
            &field,
            &disk.surface(),
            &disk.radius(),
            &disk.turn(),
            &settings,
        )
        .expect("stokes");
        assert_relative_eq!(value(&stokes), value(&direct), epsilon = 1e-9);
    }

    #[test]
    fn outward_flux_of_the_radial_field() {
        let disk = Disk::new();
        let frame = CoordinateSystem::cartesian();
        let [x, y, _] = frame.base_scalars().map(|s| Expr::from(&s));
        let field = VectorField::from_expressions([x, y], &frame).expect("field");
        let flux = flux_across_curve(
            &field,
            &disk.boundary(),
            &disk.turn(),
            &IntegrationSettings::default(),
        )
        .expect("flux");
        assert_relative_eq!(value(&flux), 2.0 * PI, epsilon = 1e-9);
    }

    #[test]
    fn flux_of_a_uniform_field_through_a_square() {
        let (u, v) = (Symbol::dimensionless("u"), Symbol::dimensionless("v"));
        let square = FieldPoint::new([Expr::from(&u), Expr::from(&v)]).expect("square");
        let field = VectorField::new(
            [Expr::zero(), Expr::zero(), Expr::int(3)].map(FieldComponent::from),
            None,
        )
        .expect("field");
        let flux = flux_across_surface(
            &field,
            &square,
            &ParameterRange::new(&u, 0, 2),
            &ParameterRange::new(&v, 0, 1),
            &IntegrationSettings::default(),
        )
        .expect("flux");
        assert!(flux.equivalent(&Expr::int(6)), "{flux}");
    }

    #[test]
    fn curves_must_stay_in_the_plane() {
        let disk = Disk::new();
        let t = Expr::from(&disk.t);
        let helix =
            FieldPoint::new([Expr::cos(t.clone()), Expr::sin(t.clone()), t]).expect("helix");
        let field = rotation_field(&CoordinateSystem::cartesian());
        let err = flux_across_curve(&field, &helix, &disk.turn(), &IntegrationSettings::default())
            .expect_err("helix leaves the plane");
        assert!(matches!(err, PhysicsError::InvalidValue(_)));
    }

    #[test]
    fn curvilinear_fields_are_rejected() {
        let disk = Disk::new();
        let frame = CoordinateSystem::cylindrical();
        let field = VectorField::from_expressions([Expr::one()], &frame).expect("field");
        let err = circulation_along_curve(
            &field,
            &disk.boundary(),
            &disk.turn(),
            &IntegrationSettings::default(),
        )
        .expect_err("cylindrical field");
        assert!(matches!(err, PhysicsError::InvalidValue(_)));
    }

    #[test]
    fn frameless_field_agrees_by_both_routes() {
        let disk = Disk::new();
        let field = VectorField::new(
            [
                FieldComponent::function(|p| p.as_cartesian().y()),
                FieldComponent::function(|p| -p.as_cartesian().x()),
            ],
            None,
        )
        .expect("field");
        let settings = IntegrationSettings::default();
        let direct = circulation_along_curve(&field, &disk.boundary(), &disk.turn(), &settings)
            .expect("direct");
        let stokes = circulation_along_surface_boundary(
            &field,
            &disk.surface(),
            &disk.radius(),
            &disk.turn(),
            &settings,
        )
        .expect("stokes");
        assert_relative_eq!(value(&direct), -2.0 * PI, epsilon = 1e-9);
        assert_relative_eq!(value(&stokes), value(&direct), epsilon = 1e-9);
    }
}
