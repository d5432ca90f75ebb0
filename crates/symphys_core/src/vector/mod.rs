//! Vectors and fields over named coordinate frames.
//!
//! A [`CoordinateSystem`] is a frame key: two values compare equal only when
//! they were derived from the same construction. Vectors and fields carry the
//! key of the frame their components are written in, and binary operations
//! reject operands from different frames.

pub mod algebra;
pub mod analysis;
pub mod coordinate_system;
pub mod field;
pub mod operators;
pub mod point;

pub use algebra::{
    add_cartesian_vectors, cross_cartesian_vectors, diff_cartesian_vector, dot_vectors,
    integrate_cartesian_vector, project_vector, reject_cartesian_vector, scale_vector,
    subtract_cartesian_vectors, vector_magnitude, vector_rebase, vector_unit, Vector,
};
pub use analysis::{
    circulation_along_curve, circulation_along_surface_boundary, flux_across_curve,
    flux_across_surface, ParameterRange,
};
pub use coordinate_system::CoordinateSystem;
pub use field::{
    field_rebase, vector_field_rebase, FieldComponent, FieldFunction, ScalarField, VectorField,
};
pub use operators::{curl_operator, divergence_operator, gradient_operator};
pub use point::{CartesianPoint, CylinderPoint, FieldPoint, SpherePoint};
