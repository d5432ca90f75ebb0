//! Expression trees.
//!
//! Expressions are built through canonicalizing constructors (`Expr::add`,
//! `Expr::mul`, `Expr::pow`, `Expr::func`) so that two expressions which are
//! trivially equal (`x + x` and `2*x`, `x*y` and `y*x`) compare equal
//! structurally. Deeper rewrites live in [`crate::symbolic::simplify`].

use super::number::Number;
use crate::units::{Dimension, Unit};
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A named scalar variable.
///
/// Symbols compare by name, tag, dimension and assumptions. The tag keeps
/// base scalars of distinct coordinate systems apart even when they share a
/// display name; user symbols have tag zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol {
    name: String,
    tag: u64,
    dimension: Dimension,
    positive: bool,
    polar: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>, dimension: Dimension) -> Self {
        Self {
            name: name.into(),
            tag: 0,
            dimension,
            positive: false,
            polar: false,
        }
    }

    pub fn dimensionless(name: impl Into<String>) -> Self {
        Self::new(name, Dimension::DIMENSIONLESS)
    }

    pub(crate) fn tagged(name: impl Into<String>, tag: u64, dimension: Dimension) -> Self {
        Self {
            name: name.into(),
            tag,
            dimension,
            positive: false,
            polar: false,
        }
    }

    /// Marks the symbol as strictly positive.
    pub fn positive(mut self) -> Self {
        self.positive = true;
        self
    }

    /// Marks the symbol as a polar angle in `(0, pi)`, which implies positivity
    /// and a non-negative sine.
    pub fn polar_angle(mut self) -> Self {
        self.positive = true;
        self.polar = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> u64 {
        self.tag
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn is_positive(&self) -> bool {
        self.positive
    }

    pub fn is_polar_angle(&self) -> bool {
        self.polar
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn value(&self) -> f64 {
        match self {
            Constant::Pi => std::f64::consts::PI,
            Constant::E => std::f64::consts::E,
        }
    }
}

/// Built-in functions understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Exp,
    Log,
    Abs,
    Sign,
    Min,
    Max,
}

impl Func {
    pub fn name(&self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Atan2 => "atan2",
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Abs => "abs",
            Func::Sign => "sign",
            Func::Min => "min",
            Func::Max => "max",
        }
    }

    /// Required argument count; `None` for variadic functions.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Func::Atan2 => Some(2),
            Func::Min | Func::Max => None,
            _ => Some(1),
        }
    }
}

/// An undefined function such as `q(t)`, carrying the dimension of its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppliedFunction {
    name: String,
    dimension: Dimension,
}

impl AppliedFunction {
    pub fn new(name: impl Into<String>, dimension: Dimension) -> Self {
        Self {
            name: name.into(),
            dimension,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn apply(&self, args: Vec<Expr>) -> Expr {
        Expr::Applied(self.clone(), args)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Expr {
    Num(Number),
    Const(Constant),
    Sym(Symbol),
    Unit(Unit),
    /// Invariant (when built via `Expr::add`): at least two terms, no nested
    /// sums, numeric term first, like terms collected.
    Add(Vec<Expr>),
    /// Invariant (when built via `Expr::mul`): at least two factors, no nested
    /// products, numeric coefficient first, like bases collected.
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Func(Func, Vec<Expr>),
    Applied(AppliedFunction, Vec<Expr>),
    /// Unevaluated derivative, only kept around applied functions.
    Derivative(Box<Expr>, Symbol),
}

impl Expr {
    pub fn int(n: i64) -> Expr {
        Expr::Num(Number::int(n))
    }

    pub fn rational(num: i64, den: i64) -> Expr {
        Expr::Num(Number::rational(num, den))
    }

    pub fn float(value: f64) -> Expr {
        Expr::Num(Number::Float(value))
    }

    pub fn zero() -> Expr {
        Expr::Num(Number::ZERO)
    }

    pub fn one() -> Expr {
        Expr::Num(Number::ONE)
    }

    pub fn pi() -> Expr {
        Expr::Const(Constant::Pi)
    }

    pub fn e() -> Expr {
        Expr::Const(Constant::E)
    }

    pub fn symbol(symbol: &Symbol) -> Expr {
        Expr::Sym(symbol.clone())
    }

    pub fn unit(unit: Unit) -> Expr {
        Expr::Unit(unit)
    }

    // --- Canonicalizing constructors ---

    pub fn add(terms: impl IntoIterator<Item = Expr>) -> Expr {
        let mut flat = Vec::new();
        for term in terms {
            match term {
                Expr::Add(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        let mut constant = Number::ZERO;
        let mut collected: Vec<(Expr, Number)> = Vec::new();
        for term in flat {
            if let Expr::Num(n) = term {
                constant = constant + n;
                continue;
            }
            let (coefficient, rest) = term.into_coefficient_and_rest();
            match collected.iter_mut().find(|(base, _)| *base == rest) {
                Some(entry) => entry.1 = entry.1 + coefficient,
                None => collected.push((rest, coefficient)),
            }
        }

        let mut out: Vec<Expr> = collected
            .into_iter()
            .filter(|(_, coefficient)| !coefficient.is_zero())
            .map(|(rest, coefficient)| Expr::scaled(coefficient, rest))
            .collect();
        out.sort_by(compare_terms);
        if !constant.is_zero() {
            out.insert(0, Expr::Num(constant));
        }
        match out.len() {
            0 => Expr::zero(),
            1 => out.remove(0),
            _ => Expr::Add(out),
        }
    }

    pub fn mul(factors: impl IntoIterator<Item = Expr>) -> Expr {
        let mut coefficient = Number::ONE;
        let mut bases: Vec<(Expr, Expr)> = Vec::new();
        let mut pending: Vec<Expr> = factors.into_iter().collect();
        while let Some(factor) = pending.pop() {
            match factor {
                Expr::Num(n) => coefficient = coefficient * n,
                Expr::Mul(inner) => pending.extend(inner),
                Expr::Pow(base, exponent) => push_base(&mut bases, *base, *exponent),
                other => push_base(&mut bases, other, Expr::one()),
            }
        }
        if coefficient.is_zero() {
            return Expr::zero();
        }

        let mut out = Vec::with_capacity(bases.len());
        let mut regroup = false;
        for (base, exponent) in bases {
            match Expr::pow(base, exponent) {
                Expr::Num(n) => coefficient = coefficient * n,
                Expr::Mul(inner) => {
                    regroup = true;
                    out.extend(inner);
                }
                other => out.push(other),
            }
        }
        if regroup {
            out.push(Expr::Num(coefficient));
            return Expr::mul(out);
        }
        if coefficient.is_zero() {
            return Expr::zero();
        }

        out.sort();
        if out.is_empty() {
            return Expr::Num(coefficient);
        }
        if out.len() == 1 {
            if coefficient.is_one() {
                return out.remove(0);
            }
            if let Expr::Add(terms) = &out[0] {
                // Numeric coefficients distribute over sums
                return Expr::add(
                    terms
                        .iter()
                        .map(|t| Expr::mul([Expr::Num(coefficient), t.clone()])),
                );
            }
        }
        if !coefficient.is_one() {
            out.insert(0, Expr::Num(coefficient));
        }
        Expr::Mul(out)
    }

    pub fn pow(base: Expr, exponent: Expr) -> Expr {
        if exponent.is_zero() || base.is_one() {
            return Expr::one();
        }
        if exponent.is_one() {
            return base;
        }
        if let (Expr::Num(b), Expr::Num(e)) = (&base, &exponent) {
            return match b.pow(e) {
                Some(value) => Expr::Num(value),
                None => Expr::Pow(Box::new(base), Box::new(exponent)),
            };
        }
        if base.is_zero() {
            if let Expr::Num(e) = &exponent {
                if !e.is_negative() {
                    return Expr::zero();
                }
            }
        }

        match base {
            Expr::Pow(inner, inner_exp) => {
                if let Expr::Num(e) = &exponent {
                    if e.is_integer() {
                        return Expr::pow(*inner, Expr::mul([*inner_exp, exponent]));
                    }
                    if let Expr::Num(a) = inner_exp.as_ref() {
                        // (b^(2k))^e == |b|^(2k*e) for real b
                        if a.is_even_integer() {
                            return Expr::pow(Expr::abs(*inner), Expr::Num(*a * *e));
                        }
                    }
                }
                if inner.is_nonnegative() {
                    return Expr::pow(*inner, Expr::mul([*inner_exp, exponent]));
                }
                Expr::Pow(Box::new(Expr::Pow(inner, inner_exp)), Box::new(exponent))
            }
            Expr::Mul(factors) => {
                let integral = matches!(&exponent, Expr::Num(e) if e.is_integer());
                if integral || factors.iter().all(Expr::is_nonnegative) {
                    Expr::mul(factors.into_iter().map(|f| Expr::pow(f, exponent.clone())))
                } else {
                    Expr::Pow(Box::new(Expr::Mul(factors)), Box::new(exponent))
                }
            }
            Expr::Func(Func::Exp, mut args) if args.len() == 1 => {
                let arg = args.remove(0);
                Expr::exp(Expr::mul([arg, exponent]))
            }
            Expr::Func(Func::Abs, mut args)
                if args.len() == 1 && matches!(&exponent, Expr::Num(e) if e.is_even_integer()) =>
            {
                Expr::pow(args.remove(0), exponent)
            }
            other => Expr::Pow(Box::new(other), Box::new(exponent)),
        }
    }

    pub fn neg(expr: Expr) -> Expr {
        Expr::mul([Expr::int(-1), expr])
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Expr {
        Expr::add([lhs, Expr::neg(rhs)])
    }

    pub fn div(lhs: Expr, rhs: Expr) -> Expr {
        Expr::mul([lhs, Expr::pow(rhs, Expr::int(-1))])
    }

    pub fn powi(base: Expr, exponent: i64) -> Expr {
        Expr::pow(base, Expr::int(exponent))
    }

    pub fn sqrt(expr: Expr) -> Expr {
        Expr::pow(expr, Expr::rational(1, 2))
    }

    pub fn sin(arg: Expr) -> Expr {
        Expr::func(Func::Sin, vec![arg])
    }

    pub fn cos(arg: Expr) -> Expr {
        Expr::func(Func::Cos, vec![arg])
    }

    pub fn tan(arg: Expr) -> Expr {
        Expr::func(Func::Tan, vec![arg])
    }

    pub fn acos(arg: Expr) -> Expr {
        Expr::func(Func::Acos, vec![arg])
    }

    pub fn atan2(y: Expr, x: Expr) -> Expr {
        Expr::func(Func::Atan2, vec![y, x])
    }

    pub fn exp(arg: Expr) -> Expr {
        Expr::func(Func::Exp, vec![arg])
    }

    pub fn log(arg: Expr) -> Expr {
        Expr::func(Func::Log, vec![arg])
    }

    pub fn abs(arg: Expr) -> Expr {
        Expr::func(Func::Abs, vec![arg])
    }

    pub fn min(args: Vec<Expr>) -> Expr {
        Expr::func(Func::Min, args)
    }

    pub fn max(args: Vec<Expr>) -> Expr {
        Expr::func(Func::Max, args)
    }

    /// `d(expr)/d(var)`, kept unevaluated only around applied functions.
    pub fn derivative(expr: Expr, var: Symbol) -> Expr {
        if !expr.contains(&var) {
            return Expr::zero();
        }
        match expr {
            Expr::Applied(..) | Expr::Derivative(..) => Expr::Derivative(Box::new(expr), var),
            other => other.diff(&var),
        }
    }

    fn scaled(coefficient: Number, rest: Expr) -> Expr {
        if coefficient.is_one() {
            return rest;
        }
        match rest {
            Expr::Mul(mut factors) => {
                factors.insert(0, Expr::Num(coefficient));
                Expr::Mul(factors)
            }
            other => Expr::Mul(vec![Expr::Num(coefficient), other]),
        }
    }

    /// Splits `c*rest` into its numeric coefficient and the remaining factors.
    pub fn into_coefficient_and_rest(self) -> (Number, Expr) {
        match self {
            Expr::Mul(mut factors) if matches!(factors.first(), Some(Expr::Num(_))) => {
                let coefficient = match factors.remove(0) {
                    Expr::Num(n) => n,
                    _ => Number::ONE,
                };
                let rest = if factors.len() == 1 {
                    factors.remove(0)
                } else {
                    Expr::Mul(factors)
                };
                (coefficient, rest)
            }
            Expr::Num(n) => (n, Expr::one()),
            other => (Number::ONE, other),
        }
    }

    // --- Queries ---

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Num(n) if n.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Num(n) if n.is_one())
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Expr::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Expr::Sym(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the expression starts with a negative numeric factor.
    pub fn could_extract_minus_sign(&self) -> bool {
        match self {
            Expr::Num(n) => n.is_negative(),
            Expr::Mul(factors) => matches!(factors.first(), Some(Expr::Num(n)) if n.is_negative()),
            _ => false,
        }
    }

    /// Conservative sign analysis: `true` only when the expression is provably
    /// non-negative for every real value of its symbols.
    pub fn is_nonnegative(&self) -> bool {
        match self {
            Expr::Num(n) => !n.is_negative(),
            Expr::Const(_) | Expr::Unit(_) => true,
            Expr::Sym(s) => s.is_positive(),
            Expr::Add(terms) => terms.iter().all(Expr::is_nonnegative),
            Expr::Mul(factors) => factors.iter().all(Expr::is_nonnegative),
            Expr::Pow(base, exponent) => {
                base.is_nonnegative()
                    || matches!(exponent.as_ref(), Expr::Num(e) if e.is_even_integer())
            }
            Expr::Func(Func::Abs | Func::Exp | Func::Acos, _) => true,
            Expr::Func(Func::Sin, args) => {
                matches!(args.as_slice(), [Expr::Sym(s)] if s.is_polar_angle())
            }
            _ => false,
        }
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        match self {
            Expr::Sym(s) => s == symbol,
            Expr::Num(_) | Expr::Const(_) | Expr::Unit(_) => false,
            Expr::Add(items) | Expr::Mul(items) | Expr::Func(_, items) | Expr::Applied(_, items) => {
                items.iter().any(|e| e.contains(symbol))
            }
            Expr::Pow(base, exponent) => base.contains(symbol) || exponent.contains(symbol),
            Expr::Derivative(inner, _) => inner.contains(symbol),
        }
    }

    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols(&self, out: &mut BTreeSet<Symbol>) {
        match self {
            Expr::Sym(s) => {
                out.insert(s.clone());
            }
            Expr::Num(_) | Expr::Const(_) | Expr::Unit(_) => {}
            Expr::Add(items) | Expr::Mul(items) | Expr::Func(_, items) | Expr::Applied(_, items) => {
                items.iter().for_each(|e| e.collect_symbols(out))
            }
            Expr::Pow(base, exponent) => {
                base.collect_symbols(out);
                exponent.collect_symbols(out);
            }
            Expr::Derivative(inner, _) => inner.collect_symbols(out),
        }
    }

    /// Whether the expression contains applied functions or derivative nodes.
    pub fn has_applied(&self) -> bool {
        match self {
            Expr::Applied(..) | Expr::Derivative(..) => true,
            Expr::Add(items) | Expr::Mul(items) | Expr::Func(_, items) => {
                items.iter().any(Expr::has_applied)
            }
            Expr::Pow(base, exponent) => base.has_applied() || exponent.has_applied(),
            _ => false,
        }
    }

    pub fn has_units(&self) -> bool {
        match self {
            Expr::Unit(_) => true,
            Expr::Add(items) | Expr::Mul(items) | Expr::Func(_, items) | Expr::Applied(_, items) => {
                items.iter().any(Expr::has_units)
            }
            Expr::Pow(base, exponent) => base.has_units() || exponent.has_units(),
            Expr::Derivative(inner, _) => inner.has_units(),
            _ => false,
        }
    }

    fn has_float(&self) -> bool {
        match self {
            Expr::Num(n) => n.is_float(),
            Expr::Add(items) | Expr::Mul(items) | Expr::Func(_, items) => {
                items.iter().any(Expr::has_float)
            }
            Expr::Pow(base, exponent) => base.has_float() || exponent.has_float(),
            _ => false,
        }
    }

    /// Numeric value of a symbol-free expression; units count as their SI
    /// scale factor.
    pub fn eval_constant(&self) -> Option<f64> {
        let value = match self {
            Expr::Num(n) => n.to_f64(),
            Expr::Const(c) => c.value(),
            Expr::Unit(u) => u.scale().to_f64(),
            Expr::Sym(_) | Expr::Applied(..) | Expr::Derivative(..) => return None,
            Expr::Add(terms) => {
                let mut sum = 0.0;
                for term in terms {
                    sum += term.eval_constant()?;
                }
                sum
            }
            Expr::Mul(factors) => {
                let mut product = 1.0;
                for factor in factors {
                    product *= factor.eval_constant()?;
                }
                product
            }
            Expr::Pow(base, exponent) => base.eval_constant()?.powf(exponent.eval_constant()?),
            Expr::Func(func, args) => {
                let values: Option<Vec<f64>> = args.iter().map(Expr::eval_constant).collect();
                super::functions::apply_numeric(*func, &values?)?
            }
        };
        Some(value)
    }

    /// Folds float-carrying constant subexpressions into a single float.
    pub(crate) fn fold_if_float(expr: Expr) -> Expr {
        if expr.has_float() && expr.free_symbols().is_empty() && !expr.has_applied() {
            if let Some(value) = expr.eval_constant() {
                return Expr::Num(Number::from_f64(value));
            }
        }
        expr
    }

    // --- Substitution ---

    /// Simultaneous substitution of symbols.
    pub fn subs(&self, map: &[(Symbol, Expr)]) -> Expr {
        if map.is_empty() {
            return self.clone();
        }
        match self {
            Expr::Sym(s) => map
                .iter()
                .find(|(key, _)| key == s)
                .map(|(_, value)| value.clone())
                .unwrap_or_else(|| self.clone()),
            Expr::Num(_) | Expr::Const(_) | Expr::Unit(_) => self.clone(),
            Expr::Add(terms) => Expr::add(terms.iter().map(|t| t.subs(map))),
            Expr::Mul(factors) => Expr::mul(factors.iter().map(|f| f.subs(map))),
            Expr::Pow(base, exponent) => Expr::pow(base.subs(map), exponent.subs(map)),
            Expr::Func(func, args) => Expr::func(*func, args.iter().map(|a| a.subs(map)).collect()),
            Expr::Applied(func, args) => {
                Expr::Applied(func.clone(), args.iter().map(|a| a.subs(map)).collect())
            }
            Expr::Derivative(inner, var) => {
                // The variable of differentiation is bound
                let free: Vec<(Symbol, Expr)> =
                    map.iter().filter(|(key, _)| key != var).cloned().collect();
                Expr::derivative(inner.subs(&free), var.clone())
            }
        }
    }

    pub fn subs_one(&self, symbol: &Symbol, value: &Expr) -> Expr {
        self.subs(&[(symbol.clone(), value.clone())])
    }

    /// Replaces every unit atom by its SI scale factor.
    pub fn strip_units(&self) -> Expr {
        match self {
            Expr::Unit(u) => Expr::Num(u.scale()),
            Expr::Num(_) | Expr::Const(_) | Expr::Sym(_) => self.clone(),
            Expr::Add(terms) => Expr::add(terms.iter().map(Expr::strip_units)),
            Expr::Mul(factors) => Expr::mul(factors.iter().map(Expr::strip_units)),
            Expr::Pow(base, exponent) => Expr::pow(base.strip_units(), exponent.strip_units()),
            Expr::Func(func, args) => Expr::func(*func, args.iter().map(Expr::strip_units).collect()),
            Expr::Applied(func, args) => {
                Expr::Applied(func.clone(), args.iter().map(Expr::strip_units).collect())
            }
            Expr::Derivative(inner, var) => {
                Expr::Derivative(Box::new(inner.strip_units()), var.clone())
            }
        }
    }
}

/// Orders sum terms by their non-numeric part, so `x/2 - y` keeps `x` first.
fn compare_terms(a: &Expr, b: &Expr) -> std::cmp::Ordering {
    fn rest(e: &Expr) -> &[Expr] {
        match e {
            Expr::Mul(factors) if matches!(factors.first(), Some(Expr::Num(_))) => &factors[1..],
            other => std::slice::from_ref(other),
        }
    }
    rest(a).cmp(rest(b)).then_with(|| a.cmp(b))
}

fn push_base(bases: &mut Vec<(Expr, Expr)>, base: Expr, exponent: Expr) {
    match bases.iter_mut().find(|(b, _)| *b == base) {
        Some(entry) => {
            let previous = std::mem::replace(&mut entry.1, Expr::zero());
            entry.1 = Expr::add([previous, exponent]);
        }
        None => bases.push((base, exponent)),
    }
}

// --- Conversions ---

impl From<Number> for Expr {
    fn from(n: Number) -> Self {
        Expr::Num(n)
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::int(n)
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Expr::int(n as i64)
    }
}

impl From<f64> for Expr {
    fn from(f: f64) -> Self {
        Expr::Num(Number::from_f64(f))
    }
}

impl From<Symbol> for Expr {
    fn from(s: Symbol) -> Self {
        Expr::Sym(s)
    }
}

impl From<&Symbol> for Expr {
    fn from(s: &Symbol) -> Self {
        Expr::Sym(s.clone())
    }
}

impl From<Unit> for Expr {
    fn from(u: Unit) -> Self {
        Expr::Unit(u)
    }
}

impl From<Constant> for Expr {
    fn from(c: Constant) -> Self {
        Expr::Const(c)
    }
}

// --- Operators ---

fn add_pair(lhs: Expr, rhs: Expr) -> Expr {
    Expr::add([lhs, rhs])
}

fn mul_pair(lhs: Expr, rhs: Expr) -> Expr {
    Expr::mul([lhs, rhs])
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $ctor:path) => {
        impl std::ops::$trait for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $ctor(self, rhs)
            }
        }

        impl std::ops::$trait<&Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $ctor(self, rhs.clone())
            }
        }

        impl std::ops::$trait<Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                $ctor(self.clone(), rhs)
            }
        }

        impl std::ops::$trait<&Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                $ctor(self.clone(), rhs.clone())
            }
        }
    };
}

impl_binary_op!(Add, add, add_pair);
impl_binary_op!(Sub, sub, Expr::sub);
impl_binary_op!(Mul, mul, mul_pair);
impl_binary_op!(Div, div, Expr::div);

impl std::ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::neg(self)
    }
}

impl std::ops::Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::neg(self.clone())
    }
}

impl Zero for Expr {
    fn zero() -> Self {
        Expr::Num(Number::ZERO)
    }

    fn is_zero(&self) -> bool {
        matches!(self, Expr::Num(n) if n.is_zero())
    }
}

impl One for Expr {
    fn one() -> Self {
        Expr::Num(Number::ONE)
    }
}

// --- Display ---

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Add(_) => 1,
        Expr::Mul(_) => 2,
        Expr::Num(n) if n.is_negative() || !n.is_integer() => 2,
        Expr::Pow(..) => 3,
        _ => 4,
    }
}

fn write_wrapped(f: &mut fmt::Formatter<'_>, expr: &Expr, min_precedence: u8) -> fmt::Result {
    if precedence(expr) < min_precedence {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

fn write_product(f: &mut fmt::Formatter<'_>, factors: &[Expr]) -> fmt::Result {
    let mut coefficient = Number::ONE;
    let mut numerator = Vec::new();
    let mut denominator = Vec::new();
    for factor in factors {
        match factor {
            Expr::Num(n) => coefficient = coefficient * *n,
            Expr::Pow(base, exponent) if exponent.could_extract_minus_sign() => {
                denominator.push(Expr::pow(base.as_ref().clone(), Expr::neg(exponent.as_ref().clone())))
            }
            other => numerator.push(other.clone()),
        }
    }
    if coefficient.is_negative() {
        write!(f, "-")?;
        coefficient = -coefficient;
    }
    let (num_coeff, den_coeff) = match coefficient {
        Number::Rational(n, d) => (Number::int(n), Number::int(d)),
        other => (other, Number::ONE),
    };
    let mut first = true;
    if !num_coeff.is_one() || numerator.is_empty() {
        write!(f, "{}", num_coeff)?;
        first = false;
    }
    for factor in &numerator {
        if !first {
            write!(f, "*")?;
        }
        write_wrapped(f, factor, 3)?;
        first = false;
    }
    if !den_coeff.is_one() {
        denominator.insert(0, Expr::Num(den_coeff));
    }
    match denominator.len() {
        0 => Ok(()),
        1 => {
            write!(f, "/")?;
            write_wrapped(f, &denominator[0], 3)
        }
        _ => {
            write!(f, "/(")?;
            for (i, factor) in denominator.iter().enumerate() {
                if i > 0 {
                    write!(f, "*")?;
                }
                write_wrapped(f, factor, 3)?;
            }
            write!(f, ")")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(n) => write!(f, "{}", n),
            Expr::Const(Constant::Pi) => write!(f, "pi"),
            Expr::Const(Constant::E) => write!(f, "E"),
            Expr::Sym(s) => write!(f, "{}", s),
            Expr::Unit(u) => write!(f, "{}", u.name()),
            Expr::Add(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i == 0 {
                        write!(f, "{}", term)?;
                    } else if term.could_extract_minus_sign() {
                        write!(f, " - {}", Expr::neg(term.clone()))?;
                    } else {
                        write!(f, " + {}", term)?;
                    }
                }
                Ok(())
            }
            Expr::Mul(factors) => write_product(f, factors),
            Expr::Pow(base, exponent) => {
                if exponent.as_number() == Some(Number::rational(1, 2)) {
                    return write!(f, "sqrt({})", base);
                }
                if exponent.could_extract_minus_sign() {
                    return write_product(f, std::slice::from_ref(self));
                }
                write_wrapped(f, base, 4)?;
                write!(f, "^")?;
                write_wrapped(f, exponent, 4)
            }
            Expr::Applied(func, args) => {
                write!(f, "{}(", func.name())?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::Func(func, args) => {
                write!(f, "{}(", func.name())?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::Derivative(inner, var) => write!(f, "Derivative({}, {})", inner, var),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::from(Symbol::dimensionless("x"))
    }

    fn y() -> Expr {
        Expr::from(Symbol::dimensionless("y"))
    }

    #[test]
    fn like_terms_collect() {
        let sum = x() + x() + Expr::int(3) - Expr::int(1);
        assert_eq!(sum, Expr::add([Expr::int(2), Expr::int(2) * x()]));
    }

    #[test]
    fn products_commute_structurally() {
        assert_eq!(x() * y(), y() * x());
        assert_eq!(x() + y(), y() + x());
    }

    #[test]
    fn cancelling_terms_vanish() {
        assert!((x() - x()).is_zero());
        assert!((x() * y() - y() * x()).is_zero());
        assert!((x() / x()).is_one());
    }

    #[test]
    fn like_bases_combine_exponents() {
        let product = x() * x() * Expr::powi(x(), -3);
        assert_eq!(product, Expr::powi(x(), -1));
    }

    #[test]
    fn numeric_coefficient_distributes_over_sum() {
        let expr = Expr::int(2) * (x() + y());
        assert_eq!(expr, Expr::int(2) * x() + Expr::int(2) * y());
    }

    #[test]
    fn square_root_of_square_needs_positivity() {
        let r = Expr::from(Symbol::dimensionless("r").positive());
        assert_eq!(Expr::sqrt(Expr::powi(r.clone(), 2)), r);
        assert_eq!(Expr::sqrt(Expr::powi(x(), 2)), Expr::abs(x()));
    }

    #[test]
    fn substitution_is_simultaneous() {
        let xs = Symbol::dimensionless("x");
        let ys = Symbol::dimensionless("y");
        let swapped = (x() - y()).subs(&[(xs, y()), (ys, x())]);
        assert_eq!(swapped, y() - x());
    }

    #[test]
    fn display_is_readable() {
        let expr = Expr::div(x(), Expr::int(2)) - y();
        assert_eq!(expr.to_string(), "x/2 - y");
        assert_eq!(Expr::sqrt(x()).to_string(), "sqrt(x)");
    }
}
