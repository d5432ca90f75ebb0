//! Stack-based evaluation of expressions.
//!
//! An [`Expr`] is compiled once into [`Bytecode`] against an ordered list of
//! free symbols and can then be evaluated repeatedly without walking the tree.

use super::expr::{Constant, Expr, Func};
use crate::errors::{PhysicsError, Result};
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Numeric types the VM can evaluate over.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    /// Pushes a constant onto the stack.
    LoadConst(f64),
    /// Pushes the value of a symbol, by its index in the compile order.
    LoadVar(usize),
    /// Pops `n` values and pushes their sum.
    Sum(usize),
    /// Pops `n` values and pushes their product.
    Product(usize),
    /// Pops (b, a), pushes a ^ b.
    Pow,
    /// Pops (x, y), pushes atan2(y, x).
    Atan2,
    /// Pops `n` values and pushes the smallest.
    Min(usize),
    /// Pops `n` values and pushes the largest.
    Max(usize),
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Exp,
    Log,
    Abs,
    Sign,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    pub ops: Vec<OpCode>,
}

pub struct VM;

impl VM {
    /// Executes the bytecode with `vars` bound to the compiled symbol order.
    pub fn execute<T: Scalar>(bytecode: &Bytecode, vars: &[T], stack: &mut Vec<T>) -> Result<T> {
        stack.clear();
        for op in &bytecode.ops {
            let value = match *op {
                OpCode::LoadConst(val) => constant(val)?,
                OpCode::LoadVar(idx) => *vars.get(idx).ok_or_else(|| {
                    PhysicsError::Evaluation(format!("missing value for variable #{idx}"))
                })?,
                OpCode::Sum(n) => pop_n(stack, n)?.into_iter().fold(T::zero(), |a, b| a + b),
                OpCode::Product(n) => pop_n(stack, n)?.into_iter().fold(T::one(), |a, b| a * b),
                OpCode::Min(n) => pop_n(stack, n)?
                    .into_iter()
                    .fold(T::infinity(), |a, b| a.min(b)),
                OpCode::Max(n) => pop_n(stack, n)?
                    .into_iter()
                    .fold(T::neg_infinity(), |a, b| a.max(b)),
                OpCode::Pow => {
                    let b = pop(stack)?;
                    let a = pop(stack)?;
                    a.powf(b)
                }
                OpCode::Atan2 => {
                    let x = pop(stack)?;
                    let y = pop(stack)?;
                    y.atan2(x)
                }
                OpCode::Sin => pop(stack)?.sin(),
                OpCode::Cos => pop(stack)?.cos(),
                OpCode::Tan => pop(stack)?.tan(),
                OpCode::Asin => pop(stack)?.asin(),
                OpCode::Acos => pop(stack)?.acos(),
                OpCode::Atan => pop(stack)?.atan(),
                OpCode::Exp => pop(stack)?.exp(),
                OpCode::Log => pop(stack)?.ln(),
                OpCode::Abs => pop(stack)?.abs(),
                OpCode::Sign => {
                    let a = pop(stack)?;
                    if a.is_zero() {
                        T::zero()
                    } else {
                        a.signum()
                    }
                }
            };
            stack.push(value);
        }
        pop(stack)
    }
}

fn constant<T: Scalar>(value: f64) -> Result<T> {
    T::from_f64(value)
        .ok_or_else(|| PhysicsError::Evaluation(format!("constant {value} is not representable")))
}

fn pop<T: Scalar>(stack: &mut Vec<T>) -> Result<T> {
    stack
        .pop()
        .ok_or_else(|| PhysicsError::Evaluation("stack underflow".to_string()))
}

fn pop_n<T: Scalar>(stack: &mut Vec<T>, n: usize) -> Result<Vec<T>> {
    if stack.len() < n {
        return Err(PhysicsError::Evaluation("stack underflow".to_string()));
    }
    Ok(stack.split_off(stack.len() - n))
}

/// Compiles expressions into `Bytecode`, resolving symbols by name and tag to
/// their position in `vars`.
pub struct Compiler<'a> {
    vars: &'a [super::expr::Symbol],
}

impl<'a> Compiler<'a> {
    pub fn new(vars: &'a [super::expr::Symbol]) -> Self {
        Self { vars }
    }

    pub fn compile(&self, expr: &Expr) -> Result<Bytecode> {
        let mut ops = Vec::new();
        self.compile_recursive(expr, &mut ops)?;
        Ok(Bytecode { ops })
    }

    fn compile_recursive(&self, expr: &Expr, ops: &mut Vec<OpCode>) -> Result<()> {
        match expr {
            Expr::Num(n) => ops.push(OpCode::LoadConst(n.to_f64())),
            Expr::Const(Constant::Pi) => ops.push(OpCode::LoadConst(std::f64::consts::PI)),
            Expr::Const(Constant::E) => ops.push(OpCode::LoadConst(std::f64::consts::E)),
            // Units evaluate to their SI scale
            Expr::Unit(unit) => ops.push(OpCode::LoadConst(unit.scale().to_f64())),
            Expr::Sym(symbol) => {
                let idx = self
                    .vars
                    .iter()
                    .position(|v| v == symbol)
                    .ok_or_else(|| {
                        PhysicsError::Evaluation(format!("unbound symbol '{symbol}'"))
                    })?;
                ops.push(OpCode::LoadVar(idx));
            }
            Expr::Add(terms) => {
                for term in terms {
                    self.compile_recursive(term, ops)?;
                }
                ops.push(OpCode::Sum(terms.len()));
            }
            Expr::Mul(factors) => {
                for factor in factors {
                    self.compile_recursive(factor, ops)?;
                }
                ops.push(OpCode::Product(factors.len()));
            }
            Expr::Pow(base, exponent) => {
                self.compile_recursive(base, ops)?;
                self.compile_recursive(exponent, ops)?;
                ops.push(OpCode::Pow);
            }
            Expr::Func(func, args) => {
                for arg in args {
                    self.compile_recursive(arg, ops)?;
                }
                ops.push(match func {
                    Func::Sin => OpCode::Sin,
                    Func::Cos => OpCode::Cos,
                    Func::Tan => OpCode::Tan,
                    Func::Asin => OpCode::Asin,
                    Func::Acos => OpCode::Acos,
                    Func::Atan => OpCode::Atan,
                    Func::Atan2 => OpCode::Atan2,
                    Func::Exp => OpCode::Exp,
                    Func::Log => OpCode::Log,
                    Func::Abs => OpCode::Abs,
                    Func::Sign => OpCode::Sign,
                    Func::Min => OpCode::Min(args.len()),
                    Func::Max => OpCode::Max(args.len()),
                });
            }
            Expr::Applied(func, _) => {
                return Err(PhysicsError::Evaluation(format!(
                    "cannot evaluate undefined function '{}'",
                    func.name()
                )))
            }
            Expr::Derivative(inner, var) => {
                return Err(PhysicsError::Evaluation(format!(
                    "cannot evaluate unevaluated derivative of {inner} with respect to {var}"
                )))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::Symbol;

    #[test]
    fn evaluates_polynomial() {
        let x = Symbol::dimensionless("x");
        let y = Symbol::dimensionless("y");
        let expr = Expr::powi(Expr::from(&x), 2) * Expr::int(3) - Expr::from(&y) / Expr::int(2);
        let vars = [x, y];
        let bytecode = Compiler::new(&vars).compile(&expr).expect("compile");
        let mut stack = Vec::new();
        let value = VM::execute(&bytecode, &[2.0_f64, 4.0], &mut stack).expect("execute");
        assert!((value - 10.0).abs() < 1e-12);
    }

    #[test]
    fn evaluates_in_f32() {
        let x = Symbol::dimensionless("x");
        let expr = Expr::sin(Expr::from(&x));
        let vars = [x];
        let bytecode = Compiler::new(&vars).compile(&expr).expect("compile");
        let mut stack = Vec::new();
        let value = VM::execute(&bytecode, &[0.5_f32], &mut stack).expect("execute");
        assert!((value - 0.5_f32.sin()).abs() < 1e-6);
    }

    #[test]
    fn unbound_symbol_is_a_compile_error() {
        let x = Symbol::dimensionless("x");
        let err = Compiler::new(&[]).compile(&Expr::from(&x)).expect_err("unbound");
        assert!(err.to_string().contains("unbound symbol 'x'"));
    }
}
