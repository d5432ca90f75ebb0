//! Differentiation and integration.

use super::expr::{Expr, Func, Symbol};
use super::number::Number;
use super::numeric::{integrate_numeric, CompiledExpr};
use crate::errors::{PhysicsError, Result};
use crate::settings::IntegrationSettings;
use log::debug;

impl Expr {
    /// Derivative with respect to `var`.
    ///
    /// Applied functions differentiate to unevaluated `Derivative` nodes, so
    /// `d/dt cos(q(t))` becomes `-sin(q(t)) * Derivative(q(t), t)`.
    pub fn diff(&self, var: &Symbol) -> Expr {
        if !self.contains(var) {
            return Expr::zero();
        }
        match self {
            Expr::Sym(_) => Expr::one(),
            Expr::Num(_) | Expr::Const(_) | Expr::Unit(_) => Expr::zero(),
            Expr::Add(terms) => Expr::add(terms.iter().map(|t| t.diff(var))),
            Expr::Mul(factors) => Expr::add((0..factors.len()).map(|i| {
                Expr::mul(factors.iter().enumerate().map(|(j, f)| {
                    if i == j {
                        f.diff(var)
                    } else {
                        f.clone()
                    }
                }))
            })),
            Expr::Pow(base, exponent) => {
                let (b, e) = (base.as_ref().clone(), exponent.as_ref().clone());
                if !e.contains(var) {
                    let reduced = Expr::pow(b.clone(), Expr::sub(e.clone(), Expr::one()));
                    Expr::mul([e, reduced, b.diff(var)])
                } else if !b.contains(var) {
                    Expr::mul([self.clone(), Expr::log(b), e.diff(var)])
                } else {
                    let inner = Expr::add([
                        Expr::mul([e.diff(var), Expr::log(b.clone())]),
                        Expr::mul([e, b.diff(var), Expr::powi(b, -1)]),
                    ]);
                    Expr::mul([self.clone(), inner])
                }
            }
            Expr::Func(func, args) => diff_func(self, *func, args, var),
            Expr::Applied(..) | Expr::Derivative(..) => {
                Expr::Derivative(Box::new(self.clone()), var.clone())
            }
        }
    }

    /// An antiderivative with respect to `var`, without integration constant.
    pub fn antiderivative(&self, var: &Symbol) -> Result<Expr> {
        self.antiderivative_with(var, &IntegrationSettings::default())
    }

    pub fn antiderivative_with(&self, var: &Symbol, settings: &IntegrationSettings) -> Result<Expr> {
        integrate_term(self, var, settings.max_parts_depth).ok_or_else(|| {
            PhysicsError::NotImplemented(format!("no antiderivative of {self} with respect to {var}"))
        })
    }

    /// Definite integral of `self` over `var` from `from` to `to`.
    ///
    /// Uses an antiderivative when one is found; otherwise, when both bounds
    /// and the integrand reduce to numbers, falls back to adaptive quadrature.
    /// A numeric interval containing a pole of the integrand is an
    /// [`PhysicsError::InvalidValue`] error.
    pub fn integrate(
        &self,
        var: &Symbol,
        from: &Expr,
        to: &Expr,
        settings: &IntegrationSettings,
    ) -> Result<Expr> {
        let integrand = self.simplify();
        match integrand.antiderivative_with(var, settings) {
            Ok(primitive) => {
                check_no_pole(&integrand, var, from, to)?;
                let upper = primitive.subs_one(var, to);
                let lower = primitive.subs_one(var, from);
                Ok(Expr::sub(upper, lower).simplify())
            }
            Err(err) if settings.numeric_fallback => {
                let others: Vec<Symbol> = integrand
                    .free_symbols()
                    .into_iter()
                    .filter(|s| s != var)
                    .collect();
                match (from.eval_constant(), to.eval_constant()) {
                    (Some(a), Some(b)) if others.is_empty() => {
                        debug!("{err}; integrating {integrand} numerically");
                        let value =
                            integrate_numeric(&integrand.strip_units(), var, a, b, &[], settings)?;
                        Ok(Expr::float(value))
                    }
                    _ => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }
}

const POLE_SAMPLES: usize = 64;

/// A subexpression that blows up where `base` vanishes: `base^-order`, or
/// `log(base)` with order zero.
struct Singularity {
    base: Expr,
    order: f64,
}

fn collect_singularities(expr: &Expr, var: &Symbol, out: &mut Vec<Singularity>) {
    if !expr.contains(var) {
        return;
    }
    match expr {
        Expr::Pow(base, exponent) => {
            if let Some(e) = exponent.as_number().filter(Number::is_negative) {
                out.push(Singularity {
                    base: base.as_ref().clone(),
                    order: e.abs().to_f64(),
                });
            }
            collect_singularities(base, var, out);
            collect_singularities(exponent, var, out);
        }
        Expr::Func(func, args) => {
            if *func == Func::Log {
                out.extend(args.iter().map(|arg| Singularity {
                    base: arg.clone(),
                    order: 0.0,
                }));
            }
            for arg in args {
                collect_singularities(arg, var, out);
            }
        }
        Expr::Add(items) | Expr::Mul(items) | Expr::Applied(_, items) => {
            for item in items {
                collect_singularities(item, var, out);
            }
        }
        Expr::Derivative(inner, _) => collect_singularities(inner, var, out),
        Expr::Num(_) | Expr::Const(_) | Expr::Sym(_) | Expr::Unit(_) => {}
    }
}

/// Rejects numeric intervals over which `integrand` has a pole.
///
/// Each singular base that depends on `var` alone is sampled on a grid; a
/// zero or a sign change strictly inside the interval is a pole, and so is a
/// zero at an endpoint when the order is at least one.
fn check_no_pole(integrand: &Expr, var: &Symbol, from: &Expr, to: &Expr) -> Result<()> {
    let (Some(a), Some(b)) = (from.eval_constant(), to.eval_constant()) else {
        return Ok(());
    };
    let mut singularities = Vec::new();
    collect_singularities(integrand, var, &mut singularities);
    for Singularity { base, order } in singularities {
        let base = base.strip_units();
        if base.free_symbols().iter().any(|s| s != var) {
            continue;
        }
        let Ok(compiled) = CompiledExpr::new(&base, vec![var.clone()]) else {
            continue;
        };
        let mut previous: Option<f64> = None;
        for k in 0..=POLE_SAMPLES {
            let t = a + (b - a) * k as f64 / POLE_SAMPLES as f64;
            let value = match compiled.eval(&[t]) {
                Ok(v) if v.is_finite() => v,
                _ => {
                    previous = None;
                    continue;
                }
            };
            let interior = k > 0 && k < POLE_SAMPLES;
            let vanishes = value.abs() <= 1e-12 && (interior || order >= 1.0);
            let crosses = previous.is_some_and(|p| p * value < 0.0);
            if vanishes || crosses {
                return Err(PhysicsError::InvalidValue(format!(
                    "integrand {integrand} is singular in [{from}, {to}] near {var} = {t}"
                )));
            }
            previous = Some(value);
        }
    }
    Ok(())
}

fn diff_func(expr: &Expr, func: Func, args: &[Expr], var: &Symbol) -> Expr {
    let u = match args.first() {
        Some(u) => u.clone(),
        None => return Expr::zero(),
    };
    let du = u.diff(var);
    let one_minus_square = || Expr::sub(Expr::one(), Expr::powi(u.clone(), 2));
    match func {
        Func::Sin => Expr::mul([Expr::cos(u), du]),
        Func::Cos => Expr::neg(Expr::mul([Expr::sin(u), du])),
        Func::Tan => Expr::mul([Expr::add([Expr::one(), Expr::powi(expr.clone(), 2)]), du]),
        Func::Asin => Expr::div(du, Expr::sqrt(one_minus_square())),
        Func::Acos => Expr::neg(Expr::div(du, Expr::sqrt(one_minus_square()))),
        Func::Atan => Expr::div(du, Expr::add([Expr::one(), Expr::powi(u, 2)])),
        Func::Atan2 => {
            let (y, x) = (u, args.get(1).cloned().unwrap_or_else(Expr::one));
            let numerator = Expr::sub(
                Expr::mul([x.clone(), y.diff(var)]),
                Expr::mul([y.clone(), x.diff(var)]),
            );
            Expr::div(numerator, Expr::add([Expr::powi(x, 2), Expr::powi(y, 2)]))
        }
        Func::Exp => Expr::mul([expr.clone(), du]),
        Func::Log => Expr::div(du, u),
        Func::Abs => Expr::mul([Expr::func(Func::Sign, vec![u]), du]),
        Func::Sign => Expr::zero(),
        Func::Min | Func::Max => Expr::Derivative(Box::new(expr.clone()), var.clone()),
    }
}

/// `(a, b)` with `expr == a*var + b`, both free of `var`.
fn linear_coefficients(expr: &Expr, var: &Symbol) -> Option<(Expr, Expr)> {
    let slope = expr.diff(var).simplify();
    if slope.is_zero() || slope.contains(var) {
        return None;
    }
    let intercept = Expr::sub(expr.clone(), Expr::mul([slope.clone(), Expr::from(var)])).simplify();
    if intercept.contains(var) {
        return None;
    }
    Some((slope, intercept))
}

fn integrate_term(expr: &Expr, var: &Symbol, depth: usize) -> Option<Expr> {
    if !expr.contains(var) {
        return Some(Expr::mul([expr.clone(), Expr::from(var)]));
    }
    match expr {
        Expr::Sym(_) => Some(Expr::div(Expr::powi(Expr::from(var), 2), Expr::int(2))),
        Expr::Add(terms) => {
            let parts: Option<Vec<Expr>> = terms.iter().map(|t| integrate_term(t, var, depth)).collect();
            parts.map(Expr::add)
        }
        Expr::Mul(factors) => integrate_product(expr, factors, var, depth),
        Expr::Pow(base, exponent) => integrate_power(expr, base, exponent, var),
        Expr::Func(func, args) if args.len() == 1 => {
            let (a, _) = linear_coefficients(&args[0], var)?;
            let u = args[0].clone();
            let primitive = match func {
                Func::Sin => Expr::neg(Expr::cos(u)),
                Func::Cos => Expr::sin(u),
                Func::Exp => Expr::exp(u),
                _ => return None,
            };
            Some(Expr::div(primitive, a))
        }
        _ => None,
    }
}

fn integrate_power(expr: &Expr, base: &Expr, exponent: &Expr, var: &Symbol) -> Option<Expr> {
    if !exponent.contains(var) {
        if let Expr::Func(func @ (Func::Sin | Func::Cos), args) = base {
            if exponent.as_number() == Some(Number::int(2)) && args.len() == 1 {
                // sin^2 u = (1 - cos 2u)/2, cos^2 u = (1 + cos 2u)/2
                let (a, _) = linear_coefficients(&args[0], var)?;
                let half = Expr::div(Expr::from(var), Expr::int(2));
                let wave = Expr::div(
                    Expr::sin(Expr::mul([Expr::int(2), args[0].clone()])),
                    Expr::mul([Expr::int(4), a]),
                );
                return Some(match func {
                    Func::Sin => Expr::sub(half, wave),
                    _ => Expr::add([half, wave]),
                });
            }
        }
        if let Some((a, _)) = linear_coefficients(base, var) {
            if exponent.as_number() == Some(Number::int(-1)) {
                return Some(Expr::div(Expr::log(base.clone()), a));
            }
            let raised = Expr::add([exponent.clone(), Expr::one()]);
            return Some(Expr::div(
                Expr::pow(base.clone(), raised.clone()),
                Expr::mul([raised, a]),
            ));
        }
        if let Some(n) = exponent.as_number().and_then(|n| n.as_integer()) {
            if n >= 2 && matches!(base, Expr::Add(_)) {
                let expanded = expr.expand();
                if &expanded != expr {
                    return integrate_term(&expanded, var, 0);
                }
            }
        }
        return None;
    }
    if !base.contains(var) {
        let (a, _) = linear_coefficients(exponent, var)?;
        return Some(Expr::div(expr.clone(), Expr::mul([a, Expr::log(base.clone())])));
    }
    None
}

fn integrate_product(expr: &Expr, factors: &[Expr], var: &Symbol, depth: usize) -> Option<Expr> {
    let (constant, dependent): (Vec<Expr>, Vec<Expr>) =
        factors.iter().cloned().partition(|f| !f.contains(var));
    if !constant.is_empty() {
        let inner = integrate_term(&Expr::mul(dependent), var, depth)?;
        return Some(Expr::mul(constant.into_iter().chain(std::iter::once(inner))));
    }

    if let [first, second] = dependent.as_slice() {
        if let Some(result) = integrate_sin_cos(first, second, var) {
            return Some(result);
        }
        if depth > 0 {
            if let Some(result) = integrate_by_parts(first, second, var, depth)
                .or_else(|| integrate_by_parts(second, first, var, depth))
            {
                return Some(result);
            }
        }
    }

    let expanded = expr.expand();
    if &expanded != expr && !matches!(expanded, Expr::Mul(_)) {
        return integrate_term(&expanded, var, depth);
    }
    None
}

/// `sin(u)*cos(u)` integrates to `sin(u)^2/(2a)` for linear `u = a*var + b`.
fn integrate_sin_cos(first: &Expr, second: &Expr, var: &Symbol) -> Option<Expr> {
    match (first, second) {
        (Expr::Func(Func::Cos, c), Expr::Func(Func::Sin, s))
        | (Expr::Func(Func::Sin, s), Expr::Func(Func::Cos, c))
            if c.len() == 1 && c == s =>
        {
            let (a, _) = linear_coefficients(&s[0], var)?;
            Some(Expr::div(
                Expr::powi(Expr::sin(s[0].clone()), 2),
                Expr::mul([Expr::int(2), a]),
            ))
        }
        _ => None,
    }
}

/// `u * dv` with polynomial `u`: `u*v - integral(u' * v)`.
fn integrate_by_parts(u: &Expr, dv: &Expr, var: &Symbol, depth: usize) -> Option<Expr> {
    let polynomial = match u {
        Expr::Sym(_) => true,
        Expr::Pow(base, exponent) => {
            matches!(base.as_ref(), Expr::Sym(s) if s == var)
                && matches!(exponent.as_number(), Some(n) if n.is_integer() && !n.is_negative())
        }
        _ => false,
    };
    if !polynomial || !matches!(dv, Expr::Func(..)) {
        return None;
    }
    let v = integrate_term(dv, var, 0)?;
    let rest = integrate_term(&Expr::mul([u.diff(var), v.clone()]), var, depth - 1)?;
    Some(Expr::sub(Expr::mul([u.clone(), v]), rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> Symbol {
        Symbol::dimensionless("t")
    }

    #[test]
    fn product_and_chain_rules() {
        let t = t();
        let x = Expr::from(&t);
        let expr = Expr::mul([x.clone(), Expr::sin(Expr::int(2) * x.clone())]);
        let expected = Expr::sin(Expr::int(2) * x.clone())
            + Expr::int(2) * x.clone() * Expr::cos(Expr::int(2) * x);
        assert!(expr.diff(&t).equivalent(&expected));
    }

    #[test]
    fn applied_functions_leave_derivative_nodes() {
        let t = t();
        let q = crate::symbolic::AppliedFunction::new("q", crate::units::Dimension::ANGLE);
        let qt = q.apply(vec![Expr::from(&t)]);
        let derivative = Expr::cos(qt.clone()).diff(&t);
        let expected = Expr::neg(Expr::mul([
            Expr::sin(qt.clone()),
            Expr::Derivative(Box::new(qt), t),
        ]));
        assert_eq!(derivative, expected);
    }

    #[test]
    fn polynomial_antiderivative() {
        let t = t();
        let x = Expr::from(&t);
        let expr = Expr::int(3) * Expr::powi(x.clone(), 2) + Expr::int(2);
        let primitive = expr.antiderivative(&t).expect("antiderivative");
        assert!(primitive.equivalent(&(Expr::powi(x.clone(), 3) + Expr::int(2) * x)));
    }

    #[test]
    fn by_parts_antiderivative() {
        let t = t();
        let x = Expr::from(&t);
        let expr = x.clone() * Expr::cos(x.clone());
        let primitive = expr.antiderivative(&t).expect("antiderivative");
        assert!(primitive.diff(&t).equivalent(&expr));
    }

    #[test]
    fn definite_integral_of_trig_square() {
        let t = t();
        let expr = Expr::powi(Expr::sin(Expr::from(&t)), 2);
        let two_pi = Expr::int(2) * Expr::pi();
        let value = expr
            .integrate(&t, &Expr::zero(), &two_pi, &IntegrationSettings::default())
            .expect("integral");
        assert_eq!(value, Expr::pi());
    }

    #[test]
    fn numeric_fallback_for_unknown_primitive() {
        let t = t();
        let expr = Expr::exp(Expr::neg(Expr::powi(Expr::from(&t), 2)));
        let value = expr
            .integrate(&t, &Expr::zero(), &Expr::int(1), &IntegrationSettings::default())
            .expect("integral");
        let numeric = value.eval_constant().expect("number");
        assert!((numeric - 0.746_824_132_812_427).abs() < 1e-9);
    }

    #[test]
    fn no_fallback_reports_not_implemented() {
        let t = t();
        let settings = IntegrationSettings {
            numeric_fallback: false,
            ..Default::default()
        };
        let expr = Expr::exp(Expr::neg(Expr::powi(Expr::from(&t), 2)));
        let err = expr
            .integrate(&t, &Expr::zero(), &Expr::int(1), &settings)
            .expect_err("no primitive");
        assert!(matches!(err, PhysicsError::NotImplemented(_)));
    }

    #[test]
    fn pole_inside_the_interval_is_rejected() {
        let t = t();
        let x = Expr::from(&t);
        let settings = IntegrationSettings::default();
        let err = Expr::powi(x.clone(), -2)
            .integrate(&t, &Expr::int(-1), &Expr::one(), &settings)
            .expect_err("divergent");
        assert!(matches!(err, PhysicsError::InvalidValue(_)));
        let err = Expr::powi(x.clone(), -1)
            .integrate(&t, &Expr::zero(), &Expr::one(), &settings)
            .expect_err("pole at the endpoint");
        assert!(matches!(err, PhysicsError::InvalidValue(_)));

        let value = Expr::powi(x, -2)
            .integrate(&t, &Expr::one(), &Expr::int(2), &settings)
            .expect("regular interval");
        assert!(value.equivalent(&Expr::rational(1, 2)), "{value}");
    }
}
