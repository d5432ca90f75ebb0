/// The `symphys_core` crate is the symbolic engine behind dimension-checked physics formulas.
/// Every value is an exact expression tree, so results stay symbolic until a caller asks
/// for a number.
///
/// Key components:
/// - **Symbolic**: canonical expressions, simplification, calculus and a bytecode VM.
/// - **Units**: dimensions, units and `Quantity` values with call-time dimension validation.
/// - **Vector**: frames, vectors, scalar and vector fields, gradient/divergence/curl,
///   circulation and flux.
/// - **Coordinates**: coordinate systems described by base scalars and a Cartesian transform,
///   with Lamé coefficients and vectors attached to applied points.
pub mod coordinates;
pub mod errors;
pub mod settings;
pub mod symbolic;
pub mod units;
pub mod vector;

pub use errors::{PhysicsError, Result};
pub use settings::{EquivalenceSettings, IntegrationSettings};
