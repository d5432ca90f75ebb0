//! Coordinate systems as base scalars plus a Cartesian transform, and
//! vectors attached to applied points.

pub mod builtin;
pub mod conversion;
pub mod system;
pub mod vector;

pub use builtin::{CartesianSystem, CylindricalSystem, ParabolicSystem, SphericalSystem};
pub use conversion::convert_base_scalars;
pub use system::{BaseCoordinateSystem, SystemId, SystemKind};
pub use vector::{AppliedPoint, CoordinateVector, QuantityCoordinateVector};
