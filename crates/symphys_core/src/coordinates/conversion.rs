//! Substitutions between the base scalars of two coordinate systems.

use super::system::BaseCoordinateSystem;
use crate::errors::{PhysicsError, Result};
use crate::symbolic::{Expr, Symbol};
use log::trace;

/// Maps every base scalar of `source` to an expression in the base scalars
/// of `target`.
///
/// The identical instance maps to itself and two instances of one family
/// map scalar to scalar. Distinct registered families go through Cartesian
/// coordinates. A user-defined system only converts to itself.
pub fn convert_base_scalars(
    target: &dyn BaseCoordinateSystem,
    source: &dyn BaseCoordinateSystem,
) -> Result<Vec<(Symbol, Expr)>> {
    let source_scalars = source.base_scalars();
    if target.id() == source.id() {
        return Ok(source_scalars.iter().map(|s| (s.clone(), Expr::from(s))).collect());
    }
    let (Some(target_kind), Some(source_kind)) = (target.kind(), source.kind()) else {
        return Err(PhysicsError::TypeMismatch(format!(
            "no conversion registered from {} to {} coordinates",
            source.type_name(),
            target.type_name()
        )));
    };
    let expressions = if target_kind == source_kind {
        target.base_scalars().map(|s| Expr::from(&s))
    } else {
        source.position_from_cartesian(&target.cartesian_transform())?
    };
    trace!(
        "converting {} {} scalars into {} {}",
        source_kind,
        source.id(),
        target_kind,
        target.id()
    );
    Ok(source_scalars.into_iter().zip(expressions).collect())
}
