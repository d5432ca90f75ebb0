//! Staged simplification.
//!
//! The canonical constructors already collect like terms; the passes here add
//! rewrites that change the shape of an expression: expanding products over
//! sums, removing `sin^2 + cos^2` pairs, merging square roots whose product
//! cancels and folding floating constants. The pipeline is iterated until the
//! expression stops changing.

use super::expr::{Expr, Func};
use super::number::Number;
use super::numeric::vanishes_numerically;
use crate::settings::EquivalenceSettings;
use log::trace;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimplifyPass {
    /// Distribute products over sums and expand small integer powers of sums.
    Expand,
    /// Rewrite `a*R*sin(u)^2 + b*R*cos(u)^2` as `b*R + (a - b)*R*sin(u)^2`,
    /// and `sqrt(a)*sqrt(b)` as `sqrt(a*b)` when the merged radicand reduces.
    Pythagorean,
    /// Evaluate float-carrying constant subtrees.
    FoldNumeric,
}

/// Largest power of a sum that `Expand` multiplies out.
const MAX_EXPANDED_POWER: i64 = 6;

#[derive(Debug, Clone)]
pub struct Simplifier {
    passes: Vec<SimplifyPass>,
    max_rounds: usize,
}

impl Default for Simplifier {
    fn default() -> Self {
        Self::new(vec![
            SimplifyPass::Expand,
            SimplifyPass::Pythagorean,
            SimplifyPass::FoldNumeric,
        ])
    }
}

impl Simplifier {
    pub fn new(passes: Vec<SimplifyPass>) -> Self {
        Self {
            passes,
            max_rounds: 8,
        }
    }

    pub fn simplify(&self, expr: &Expr) -> Expr {
        let mut current = expr.clone();
        for round in 0..self.max_rounds {
            let next = self.passes.iter().fold(current.clone(), |e, pass| apply_pass(&e, *pass));
            if next == current {
                trace!("simplified in {round} rounds: {next}");
                return next;
            }
            current = next;
        }
        current
    }
}

/// Rebuilds `expr` bottom-up, applying `f` to every node after its children.
fn rewrite(expr: &Expr, f: &impl Fn(Expr) -> Expr) -> Expr {
    let rebuilt = match expr {
        Expr::Num(_) | Expr::Const(_) | Expr::Sym(_) | Expr::Unit(_) => expr.clone(),
        Expr::Add(terms) => Expr::add(terms.iter().map(|t| rewrite(t, f))),
        Expr::Mul(factors) => Expr::mul(factors.iter().map(|t| rewrite(t, f))),
        Expr::Pow(base, exponent) => Expr::pow(rewrite(base, f), rewrite(exponent, f)),
        Expr::Func(func, args) => Expr::func(*func, args.iter().map(|a| rewrite(a, f)).collect()),
        Expr::Applied(func, args) => {
            Expr::Applied(func.clone(), args.iter().map(|a| rewrite(a, f)).collect())
        }
        Expr::Derivative(inner, var) => Expr::Derivative(Box::new(rewrite(inner, f)), var.clone()),
    };
    f(rebuilt)
}

fn apply_pass(expr: &Expr, pass: SimplifyPass) -> Expr {
    match pass {
        SimplifyPass::Expand => rewrite(expr, &expand_node),
        SimplifyPass::Pythagorean => rewrite(expr, &pythagorean_node),
        SimplifyPass::FoldNumeric => rewrite(expr, &Expr::fold_if_float),
    }
}

fn as_terms(expr: Expr) -> Vec<Expr> {
    match expr {
        Expr::Add(terms) => terms,
        other => vec![other],
    }
}

fn expand_product(lhs: Vec<Expr>, rhs: &[Expr]) -> Vec<Expr> {
    let mut out = Vec::with_capacity(lhs.len() * rhs.len());
    for a in &lhs {
        for b in rhs {
            out.push(Expr::mul([a.clone(), b.clone()]));
        }
    }
    out
}

fn expand_node(expr: Expr) -> Expr {
    match expr {
        Expr::Mul(factors) if factors.iter().any(|f| matches!(f, Expr::Add(_))) => {
            let mut terms = vec![Expr::one()];
            for factor in factors {
                terms = expand_product(terms, &as_terms(factor));
            }
            Expr::add(terms)
        }
        Expr::Pow(base, exponent) => match (*base, exponent.as_number().and_then(|n| n.as_integer())) {
            (Expr::Add(sum), Some(n)) if (2..=MAX_EXPANDED_POWER).contains(&n) => {
                let mut terms = sum.clone();
                for _ in 1..n {
                    terms = expand_product(terms, &sum);
                }
                Expr::add(terms)
            }
            (base, _) => Expr::Pow(Box::new(base), exponent),
        },
        other => other,
    }
}

/// Every way of splitting `c*rest*f(u)^2` into `(c, u, rest)`.
fn split_squares(term: &Expr, func: Func) -> Vec<(Number, Expr, Vec<Expr>)> {
    let (coefficient, rest) = term.clone().into_coefficient_and_rest();
    let factors = match rest {
        Expr::Mul(factors) => factors,
        other => vec![other],
    };
    let mut splits = Vec::new();
    for (position, factor) in factors.iter().enumerate() {
        let Expr::Pow(base, exponent) = factor else {
            continue;
        };
        if exponent.as_number() != Some(Number::int(2)) {
            continue;
        }
        match base.as_ref() {
            Expr::Func(f, args) if *f == func && args.len() == 1 => {
                let mut rest = factors.clone();
                rest.remove(position);
                splits.push((coefficient, args[0].clone(), rest));
            }
            _ => {}
        }
    }
    splits
}

fn node_count(expr: &Expr) -> usize {
    1 + match expr {
        Expr::Add(items) | Expr::Mul(items) | Expr::Func(_, items) | Expr::Applied(_, items) => {
            items.iter().map(node_count).sum()
        }
        Expr::Pow(base, exponent) => node_count(base) + node_count(exponent),
        Expr::Derivative(inner, _) => node_count(inner),
        Expr::Num(_) | Expr::Const(_) | Expr::Sym(_) | Expr::Unit(_) => 0,
    }
}

fn square_root_base(expr: &Expr) -> Option<&Expr> {
    match expr {
        Expr::Pow(base, exponent) if exponent.as_number() == Some(Number::rational(1, 2)) => {
            Some(base)
        }
        _ => None,
    }
}

/// Multiplies the other factors of a product into one of its sums, keeping
/// whichever choice leaves the smallest expression.
fn distribute_into_sum(expr: Expr) -> Expr {
    let Expr::Mul(factors) = &expr else {
        return expr;
    };
    let mut best: Option<Expr> = None;
    for (i, factor) in factors.iter().enumerate() {
        let Expr::Add(terms) = factor else {
            continue;
        };
        let rest: Vec<Expr> = factors
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, f)| f.clone())
            .collect();
        let candidate = Expr::add(
            terms
                .iter()
                .map(|t| Expr::mul(std::iter::once(t.clone()).chain(rest.iter().cloned()))),
        );
        let current = best.as_ref().unwrap_or(&expr);
        if node_count(&candidate) < node_count(current) {
            best = Some(candidate);
        }
    }
    best.unwrap_or(expr)
}

/// `sqrt(a)*sqrt(b) == sqrt(a*b)` holds for reals as long as at most one
/// radicand can be negative.
fn combine_square_roots(expr: Expr) -> Expr {
    let Expr::Mul(factors) = &expr else {
        return expr;
    };
    let (radicals, others): (Vec<&Expr>, Vec<&Expr>) =
        factors.iter().partition(|f| square_root_base(f).is_some());
    if radicals.len() < 2 {
        return expr;
    }
    let radicands: Vec<Expr> = radicals
        .iter()
        .filter_map(|f| square_root_base(f))
        .cloned()
        .collect();
    if radicands.iter().filter(|r| !r.is_nonnegative()).count() > 1 {
        return expr;
    }
    let naive = Expr::sqrt(Expr::mul(radicands.iter().cloned()));
    let combined = Expr::sqrt(distribute_into_sum(Expr::mul(radicands)));
    let separate: usize = radicals.iter().map(|r| node_count(r)).sum();
    if node_count(&combined) >= node_count(&naive) || node_count(&combined) >= separate {
        return expr;
    }
    Expr::mul(others.into_iter().cloned().chain([combined]))
}

fn pythagorean_node(expr: Expr) -> Expr {
    let mut terms = match expr {
        Expr::Add(terms) => terms,
        product @ Expr::Mul(_) => return combine_square_roots(product),
        other => return other,
    };
    let mut changed = false;
    for i in 0..terms.len() {
        'term: for (a, u, rest) in split_squares(&terms[i], Func::Sin) {
            for j in 0..terms.len() {
                if i == j {
                    continue;
                }
                for (b, v, other_rest) in split_squares(&terms[j], Func::Cos) {
                    if u != v || rest != other_rest {
                        continue;
                    }
                    let r = Expr::mul(rest.clone());
                    let sin_squared = Expr::powi(Expr::sin(u.clone()), 2);
                    terms[i] = Expr::mul([Expr::Num(a - b), r.clone(), sin_squared]);
                    terms[j] = Expr::mul([Expr::Num(b), r]);
                    changed = true;
                    break 'term;
                }
            }
        }
    }
    if changed {
        Expr::add(terms)
    } else {
        Expr::Add(terms)
    }
}

impl Expr {
    pub fn simplify(&self) -> Expr {
        Simplifier::default().simplify(self)
    }

    /// Multiplies out products of sums without the other passes.
    pub fn expand(&self) -> Expr {
        Simplifier::new(vec![SimplifyPass::Expand]).simplify(self)
    }

    /// Whether `self - other` simplifies to zero, falling back to a numeric
    /// zero test at sample points when simplification is inconclusive.
    pub fn equivalent(&self, other: &Expr) -> bool {
        self.equivalent_with(other, &EquivalenceSettings::default())
    }

    pub fn equivalent_with(&self, other: &Expr, settings: &EquivalenceSettings) -> bool {
        if self == other {
            return true;
        }
        let difference = Expr::sub(self.clone(), other.clone()).simplify();
        if difference.is_zero() {
            return true;
        }
        if difference.has_applied() {
            return false;
        }
        vanishes_numerically(&difference, settings).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::Symbol;

    fn sym(name: &str) -> Expr {
        Expr::from(Symbol::dimensionless(name))
    }

    #[test]
    fn expands_square_of_sum() {
        let (x, y) = (sym("x"), sym("y"));
        let expanded = Expr::powi(x.clone() + y.clone(), 2).expand();
        let expected = Expr::powi(x.clone(), 2)
            + Expr::int(2) * x.clone() * y.clone()
            + Expr::powi(y, 2);
        assert_eq!(expanded, expected);
    }

    #[test]
    fn pythagorean_identity_collapses() {
        let (r, t) = (sym("r"), sym("t"));
        let expr = Expr::powi(r.clone(), 2) * Expr::powi(Expr::cos(t.clone()), 2)
            + Expr::powi(r.clone(), 2) * Expr::powi(Expr::sin(t), 2);
        assert_eq!(expr.simplify(), Expr::powi(r, 2));
    }

    #[test]
    fn pythagorean_identity_inside_products() {
        let t = sym("t");
        let expr = (Expr::cos(t.clone()) - Expr::sin(t.clone()))
            * (Expr::cos(t.clone()) + Expr::sin(t.clone()))
            + Expr::int(2) * Expr::powi(Expr::sin(t.clone()), 2);
        assert_eq!(expr.simplify(), Expr::one());
    }

    #[test]
    fn square_roots_merge_when_the_radicand_cancels() {
        let r = Expr::from(Symbol::dimensionless("R").positive());
        let shifted = Expr::int(4) + Expr::powi(r.clone(), 2);
        let expr = Expr::sqrt(Expr::one() - Expr::div(Expr::int(4), shifted.clone()))
            * Expr::sqrt(shifted);
        assert_eq!(expr.simplify(), r);
    }

    #[test]
    fn square_roots_of_unknown_sign_stay_apart() {
        let (x, y) = (sym("x"), sym("y"));
        let expr = Expr::sqrt(x.clone() - y.clone()) * Expr::sqrt(y.clone() - x.clone());
        assert_eq!(expr.simplify(), expr);
        let plain = Expr::sqrt(x) * Expr::sqrt(y);
        assert_eq!(plain.simplify(), plain);
    }

    #[test]
    fn equivalence_falls_back_to_sampling() {
        let x = sym("x");
        // cos(2x) = cos(x)^2 - sin(x)^2 is outside the rewrite set
        let lhs = Expr::cos(Expr::int(2) * x.clone());
        let rhs = Expr::powi(Expr::cos(x.clone()), 2) - Expr::powi(Expr::sin(x.clone()), 2);
        assert!(lhs.equivalent(&rhs));
        assert!(!lhs.equivalent(&Expr::cos(x)));
    }
}
