//! Numeric evaluation on top of the VM: compiled expressions, quadrature and
//! the sampling test behind [`Expr::equivalent`].

use super::expr::{Expr, Symbol};
use super::vm::{Bytecode, Compiler, VM};
use crate::errors::{PhysicsError, Result};
use crate::settings::{EquivalenceSettings, IntegrationSettings};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

/// An expression compiled against a fixed symbol order.
pub struct CompiledExpr {
    bytecode: Bytecode,
    symbols: Vec<Symbol>,
    // Reused between evaluations; makes the type !Sync.
    stack: RefCell<Vec<f64>>,
}

impl CompiledExpr {
    pub fn new(expr: &Expr, symbols: Vec<Symbol>) -> Result<Self> {
        let bytecode = Compiler::new(&symbols).compile(expr)?;
        Ok(Self {
            bytecode,
            symbols,
            stack: RefCell::new(Vec::with_capacity(32)),
        })
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn eval(&self, values: &[f64]) -> Result<f64> {
        if values.len() != self.symbols.len() {
            return Err(PhysicsError::InvalidValue(format!(
                "expected {} values, got {}",
                self.symbols.len(),
                values.len()
            )));
        }
        let mut stack = self.stack.borrow_mut();
        VM::execute(&self.bytecode, values, &mut stack)
    }
}

impl Expr {
    /// Evaluates the expression with the given symbol values.
    pub fn evaluate(&self, values: &[(Symbol, f64)]) -> Result<f64> {
        let symbols: Vec<Symbol> = values.iter().map(|(s, _)| s.clone()).collect();
        let numbers: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
        CompiledExpr::new(self, symbols)?.eval(&numbers)
    }
}

/// Adaptive Simpson quadrature of `expr` over `var` in `[from, to]`.
///
/// Every free symbol other than `var` must be bound in `bound`.
pub fn integrate_numeric(
    expr: &Expr,
    var: &Symbol,
    from: f64,
    to: f64,
    bound: &[(Symbol, f64)],
    settings: &IntegrationSettings,
) -> Result<f64> {
    let mut symbols = vec![var.clone()];
    let mut values = vec![0.0];
    for (symbol, value) in bound {
        symbols.push(symbol.clone());
        values.push(*value);
    }
    let compiled = CompiledExpr::new(expr, symbols)?;
    let mut f = |t: f64| -> Result<f64> {
        values[0] = t;
        let value = compiled.eval(&values)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(PhysicsError::Evaluation(format!(
                "integrand {expr} is not finite at {var} = {t}"
            )))
        }
    };

    let fa = f(from)?;
    let fb = f(to)?;
    let mid = 0.5 * (from + to);
    let fm = f(mid)?;
    let whole = (to - from) / 6.0 * (fa + 4.0 * fm + fb);
    let result = simpson_step(
        &mut f,
        (from, fa),
        (mid, fm),
        (to, fb),
        whole,
        settings.tolerance,
        settings.max_depth,
    )?;
    debug!("numeric quadrature of {expr} over {var} in [{from}, {to}] = {result}");
    Ok(result)
}

fn simpson_step<F>(
    f: &mut F,
    (a, fa): (f64, f64),
    (m, fm): (f64, f64),
    (b, fb): (f64, f64),
    whole: f64,
    tolerance: f64,
    depth: usize,
) -> Result<f64>
where
    F: FnMut(f64) -> Result<f64>,
{
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = f(lm)?;
    let frm = f(rm)?;
    let left = (m - a) / 6.0 * (fa + 4.0 * flm + fm);
    let right = (b - m) / 6.0 * (fm + 4.0 * frm + fb);
    let delta = left + right - whole;
    if depth == 0 || delta.abs() <= 15.0 * tolerance {
        return Ok(left + right + delta / 15.0);
    }
    let half = 0.5 * tolerance;
    Ok(simpson_step(f, (a, fa), (lm, flm), (m, fm), left, half, depth - 1)?
        + simpson_step(f, (m, fm), (rm, frm), (b, fb), right, half, depth - 1)?)
}

/// Whether `expr` vanishes at every sample point.
///
/// Positive symbols are sampled in `[0.5, 2)`, others in `[-1.5, 1.5)`.
/// Sample points where the expression is undefined are skipped; `None` is
/// returned when no point could be evaluated at all.
pub(crate) fn vanishes_numerically(expr: &Expr, settings: &EquivalenceSettings) -> Option<bool> {
    let symbols: Vec<Symbol> = expr.free_symbols().into_iter().collect();
    let compiled = CompiledExpr::new(&expr.strip_units(), symbols.clone()).ok()?;
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut evaluated = 0;
    let mut values = vec![0.0; symbols.len()];
    for _ in 0..settings.samples {
        for (slot, symbol) in values.iter_mut().zip(&symbols) {
            *slot = if symbol.is_positive() {
                rng.gen_range(0.5..2.0)
            } else {
                rng.gen_range(-1.5..1.5)
            };
        }
        let value = match compiled.eval(&values) {
            Ok(v) if v.is_finite() => v,
            _ => continue,
        };
        evaluated += 1;
        if value.abs() > settings.tolerance {
            trace!("{expr} is {value} at sample {values:?}");
            return Some(false);
        }
    }
    (evaluated > 0).then_some(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quadrature_of_gaussian_bump() {
        let x = Symbol::dimensionless("x");
        let integrand = Expr::exp(-Expr::powi(Expr::from(&x), 2));
        let value = integrate_numeric(&integrand, &x, -6.0, 6.0, &[], &IntegrationSettings::default())
            .expect("quadrature");
        assert_relative_eq!(value, std::f64::consts::PI.sqrt(), epsilon = 1e-8);
    }

    #[test]
    fn quadrature_binds_extra_symbols() {
        let x = Symbol::dimensionless("x");
        let a = Symbol::dimensionless("a");
        let integrand = Expr::from(&a) * Expr::from(&x);
        let value = integrate_numeric(
            &integrand,
            &x,
            0.0,
            2.0,
            &[(a, 3.0)],
            &IntegrationSettings::default(),
        )
        .expect("quadrature");
        assert_relative_eq!(value, 6.0, epsilon = 1e-10);
    }

    #[test]
    fn evaluate_reports_unbound_symbols() {
        let x = Symbol::dimensionless("x");
        let err = Expr::from(&x).evaluate(&[]).expect_err("unbound");
        assert!(matches!(err, PhysicsError::Evaluation(_)));
    }

    #[test]
    fn sampling_detects_nonzero_and_respects_the_seed() {
        let x = Symbol::dimensionless("x");
        let r = Symbol::dimensionless("r").positive();
        let settings = EquivalenceSettings::default();
        let identity = Expr::powi(Expr::sin(Expr::from(&x)), 2)
            + Expr::powi(Expr::cos(Expr::from(&x)), 2)
            - Expr::one();
        assert_eq!(vanishes_numerically(&identity, &settings), Some(true));

        let not_zero = Expr::from(&x) * Expr::from(&r) - Expr::from(&r);
        let reseeded = EquivalenceSettings { seed: 7, ..settings };
        assert_eq!(vanishes_numerically(&not_zero, &settings), Some(false));
        assert_eq!(vanishes_numerically(&not_zero, &reseeded), Some(false));

        let undefined = Expr::log(-Expr::powi(Expr::from(&r), 2));
        assert_eq!(vanishes_numerically(&undefined, &settings), None);
    }
}
