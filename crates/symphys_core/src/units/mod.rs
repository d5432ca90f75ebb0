//! Dimensions, units and dimension-checked quantities.

pub mod dimension;
pub mod quantity;
pub mod unit;
pub mod validation;

pub use dimension::{dimension_to_si_unit, BaseDimension, Dimension};
pub use quantity::{collect_expression_and_dimension, collect_quantity_factor_and_dimension, Quantity};
pub use unit::Unit;
pub use validation::{assert_equivalent_dimension, validate_input, validate_output, DimensionOperand};
