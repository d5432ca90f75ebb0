//! Symbolic expression engine: exact numbers, canonical expression trees,
//! calculus, simplification and bytecode evaluation.

mod calculus;
mod expr;
mod functions;
mod number;
pub mod numeric;
pub mod simplify;
pub mod vm;

pub use expr::{AppliedFunction, Constant, Expr, Func, Symbol};
pub use number::Number;
pub use numeric::{integrate_numeric, CompiledExpr};
pub use simplify::{SimplifyPass, Simplifier};
