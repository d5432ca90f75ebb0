//! Gradient, divergence and curl in orthogonal coordinates.
//!
//! Every operator is written once in terms of the Lamé coefficients
//! `h1, h2, h3` of the field's frame; the Cartesian, cylindrical and
//! spherical formulas all follow from it. Results keep the input frame.

use super::field::{require_system, ScalarField, VectorField};
use crate::errors::Result;
use crate::symbolic::Expr;

/// `(df/dq_i) / h_i` for each axis.
pub fn gradient_operator(field: &ScalarField) -> Result<VectorField> {
    let system = require_system(field.system(), "gradient")?;
    let f = field.apply_to_basis()?;
    let scalars = system.base_scalars();
    let lame = system.base().lame_coefficients();
    let components =
        [0usize, 1, 2].map(|i| Expr::div(f.diff(&scalars[i]), lame[i].clone()).simplify());
    VectorField::from_expressions(components, system)
}

/// `1/(h1 h2 h3) * sum_i d(h1 h2 h3 / h_i * F_i)/dq_i`.
pub fn divergence_operator(field: &VectorField) -> Result<ScalarField> {
    let system = require_system(field.system(), "divergence")?;
    let components = field.apply_to_basis()?.components().clone();
    let scalars = system.base_scalars();
    let lame = system.base().lame_coefficients();
    let volume = Expr::mul(lame.iter().cloned());
    let flux_terms = (0..3).map(|i| {
        let weighted =
            Expr::mul([Expr::div(volume.clone(), lame[i].clone()), components[i].clone()]);
        weighted.simplify().diff(&scalars[i])
    });
    let divergence = Expr::div(Expr::add(flux_terms), volume).simplify();
    Ok(ScalarField::from_expression(divergence, system))
}

/// Component `i` is `1/(h_j h_k) * (d(h_k F_k)/dq_j - d(h_j F_j)/dq_k)` with
/// `(i, j, k)` cyclic.
pub fn curl_operator(field: &VectorField) -> Result<VectorField> {
    let system = require_system(field.system(), "curl")?;
    let components = field.apply_to_basis()?.components().clone();
    let scalars = system.base_scalars();
    let lame = system.base().lame_coefficients();
    let scaled: Vec<Expr> = (0..3)
        .map(|i| Expr::mul([lame[i].clone(), components[i].clone()]).simplify())
        .collect();
    let curl = [0usize, 1, 2].map(|i| {
        let (j, k) = ((i + 1) % 3, (i + 2) % 3);
        let circulation = Expr::sub(scaled[k].diff(&scalars[j]), scaled[j].diff(&scalars[k]));
        let area = Expr::mul([lame[j].clone(), lame[k].clone()]);
        Expr::div(circulation, area).simplify()
    });
    VectorField::from_expressions(curl, system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PhysicsError;
    use crate::vector::{CoordinateSystem, FieldComponent};

    fn scalars(system: &CoordinateSystem) -> [Expr; 3] {
        system.base_scalars().map(|s| Expr::from(&s))
    }

    fn components_of(field: &VectorField) -> [Expr; 3] {
        field.apply_to_basis().expect("basis").components().clone()
    }

    fn assert_components(field: &VectorField, expected: [Expr; 3]) {
        for (actual, expected) in components_of(field).iter().zip(&expected) {
            assert!(actual.equivalent(expected), "{actual} != {expected}");
        }
    }

    #[test]
    fn cartesian_gradient_is_the_partials() {
        let frame = CoordinateSystem::cartesian();
        let [x, y, z] = scalars(&frame);
        let field = ScalarField::from_expression(
            Expr::powi(x.clone(), 2) * y.clone() + z.clone(),
            &frame,
        );
        let gradient = gradient_operator(&field).expect("gradient");
        assert_eq!(gradient.system(), Some(&frame));
        assert_components(
            &gradient,
            [Expr::int(2) * x.clone() * y, Expr::powi(x, 2), Expr::one()],
        );
    }

    #[test]
    fn gradient_of_inverse_distance_is_irrotational() {
        let frame = CoordinateSystem::cartesian();
        let [x, y, z] = scalars(&frame);
        let distance = Expr::sqrt(Expr::powi(x, 2) + Expr::powi(y, 2) + Expr::powi(z, 2));
        let potential = ScalarField::from_expression(Expr::powi(distance, -1), &frame);
        let gradient = gradient_operator(&potential).expect("gradient");
        let curl = curl_operator(&gradient).expect("curl");
        assert_eq!(curl.system(), Some(&frame));
        assert_components(&curl, [Expr::zero(), Expr::zero(), Expr::zero()]);
    }

    #[test]
    fn spherical_gradient_of_inverse_radius() {
        let frame = CoordinateSystem::spherical();
        let [r, _, _] = scalars(&frame);
        let potential = ScalarField::from_expression(Expr::powi(r.clone(), -1), &frame);
        let gradient = gradient_operator(&potential).expect("gradient");
        assert_components(&gradient, [-Expr::powi(r, -2), Expr::zero(), Expr::zero()]);
    }

    #[test]
    fn divergence_of_the_position_field() {
        let cartesian = CoordinateSystem::cartesian();
        let [x, y, z] = scalars(&cartesian);
        let field = VectorField::from_expressions([x, y, z], &cartesian).expect("field");
        let divergence = divergence_operator(&field).expect("divergence");
        assert!(divergence.apply_to_basis().expect("basis").equivalent(&Expr::int(3)));

        let spherical = CoordinateSystem::spherical();
        let [r, _, _] = scalars(&spherical);
        let radial = VectorField::from_expressions([r], &spherical).expect("field");
        let divergence = divergence_operator(&radial).expect("divergence");
        assert!(divergence.apply_to_basis().expect("basis").equivalent(&Expr::int(3)));
        assert_eq!(divergence.system(), Some(&spherical));
    }

    #[test]
    fn cylindrical_divergence_has_the_extra_term() {
        let frame = CoordinateSystem::cylindrical();
        let [r, _, _] = scalars(&frame);
        let field = VectorField::from_expressions([Expr::one()], &frame).expect("field");
        let divergence = divergence_operator(&field).expect("divergence");
        assert!(divergence.apply_to_basis().expect("basis").equivalent(&Expr::powi(r, -1)));
    }

    #[test]
    fn curl_of_a_rotation_field() {
        let frame = CoordinateSystem::cartesian();
        let [x, y, _] = scalars(&frame);
        let field = VectorField::from_expressions([y, -x, Expr::zero()], &frame).expect("field");
        let curl = curl_operator(&field).expect("curl");
        assert_components(&curl, [Expr::zero(), Expr::zero(), Expr::int(-2)]);
    }

    #[test]
    fn cylindrical_curl_of_azimuthal_field() {
        let frame = CoordinateSystem::cylindrical();
        let [r, _, _] = scalars(&frame);
        let field = VectorField::from_expressions([Expr::zero(), r], &frame).expect("field");
        let curl = curl_operator(&field).expect("curl");
        assert_components(&curl, [Expr::zero(), Expr::zero(), Expr::int(2)]);
    }

    #[test]
    fn operators_need_a_frame() {
        let field = ScalarField::constant(1, None);
        let err = gradient_operator(&field).expect_err("no frame");
        assert!(matches!(err, PhysicsError::InvalidValue(_)));
        let vector_field =
            VectorField::new([FieldComponent::from(Expr::one())], None).expect("field");
        assert!(divergence_operator(&vector_field).is_err());
        assert!(curl_operator(&vector_field).is_err());
    }
}
