//! Exact rational numbers with a floating-point fallback.
//!
//! Arithmetic stays exact while numerators and denominators fit in `i64`
//! and silently degrades to `f64` on overflow or for irrational results.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

fn gcd(a: i64, b: i64) -> u64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// The exact value of a finite float as a reduced `(num, den)` pair, when
/// both fit in `i64`.
fn exact_ratio(f: f64) -> Option<(i64, i64)> {
    if !f.is_finite() {
        return None;
    }
    let (mut value, mut den) = (f, 1i64);
    for _ in 0..63 {
        if value.fract() == 0.0 {
            // Odd numerator once den > 1, so the pair is already reduced.
            let fits = (-9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0)
                .contains(&value);
            return fits.then(|| (value as i64, den));
        }
        value *= 2.0;
        den = den.checked_mul(2)?;
    }
    None
}

/// Exact integer `n`-th root, if one exists.
fn integer_root(value: i64, n: u32) -> Option<i64> {
    if value < 0 {
        return None;
    }
    if value < 2 || n == 1 {
        return Some(value);
    }
    let guess = (value as f64).powf(1.0 / n as f64).round() as i64;
    for candidate in [guess - 1, guess, guess + 1] {
        if candidate >= 0 && candidate.checked_pow(n) == Some(value) {
            return Some(candidate);
        }
    }
    None
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Number {
    /// Invariant: denominator > 0, gcd(num, den) == 1.
    Rational(i64, i64),
    Float(f64),
}

impl Number {
    pub const ZERO: Number = Number::Rational(0, 1);
    pub const ONE: Number = Number::Rational(1, 1);

    pub const fn int(n: i64) -> Self {
        Number::Rational(n, 1)
    }

    pub fn rational(num: i64, den: i64) -> Self {
        if den == 0 {
            return Number::Float(if num >= 0 {
                f64::INFINITY
            } else {
                f64::NEG_INFINITY
            });
        }
        let g = i128::from(gcd(num, den));
        let (mut n, mut d) = (i128::from(num) / g, i128::from(den) / g);
        if d < 0 {
            n = -n;
            d = -d;
        }
        match (i64::try_from(n), i64::try_from(d)) {
            (Ok(n), Ok(d)) => Number::Rational(n, d),
            _ => Number::Float(num as f64 / den as f64),
        }
    }

    /// Integral floats become exact integers.
    pub fn from_f64(f: f64) -> Self {
        if f.fract() == 0.0 && f.is_finite() && f.abs() < 9.0e15 {
            Number::int(f as i64)
        } else {
            Number::Float(f)
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Rational(n, _) => *n == 0,
            Number::Float(f) => *f == 0.0,
        }
    }

    pub fn is_one(&self) -> bool {
        match self {
            Number::Rational(n, d) => *n == 1 && *d == 1,
            Number::Float(f) => *f == 1.0,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Number::Rational(n, _) => *n < 0,
            Number::Float(f) => *f < 0.0,
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Number::Rational(_, d) => *d == 1,
            Number::Float(f) => f.fract() == 0.0 && f.is_finite(),
        }
    }

    pub fn is_even_integer(&self) -> bool {
        matches!(self, Number::Rational(n, 1) if n % 2 == 0)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Number::Rational(..) => true,
            Number::Float(f) => f.is_finite(),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Number::Rational(n, 1) => Some(*n),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Rational(n, d) => *n as f64 / *d as f64,
            Number::Float(f) => *f,
        }
    }

    pub fn abs(&self) -> Self {
        match self {
            Number::Rational(n, d) => match n.checked_abs() {
                Some(n) => Number::Rational(n, *d),
                None => Number::Float((*n as f64).abs() / *d as f64),
            },
            Number::Float(f) => Number::Float(f.abs()),
        }
    }

    pub fn recip(&self) -> Self {
        Number::ONE / *self
    }

    fn pow_int(&self, exp: i64) -> Self {
        if exp == 0 {
            return Number::ONE;
        }
        if exp < 0 {
            return match exp.checked_neg() {
                Some(exp) => self.pow_int(exp).recip(),
                None => Number::Float(self.to_f64().powf(exp as f64)),
            };
        }
        match self {
            Number::Rational(n, d) => {
                let e = match u32::try_from(exp) {
                    Ok(e) => e,
                    Err(_) => return Number::Float(self.to_f64().powf(exp as f64)),
                };
                match (n.checked_pow(e), d.checked_pow(e)) {
                    (Some(num), Some(den)) => Number::Rational(num, den),
                    _ => Number::Float(self.to_f64().powi(e as i32)),
                }
            }
            Number::Float(f) => Number::Float(f.powf(exp as f64)),
        }
    }

    /// `self ^ exp`, or `None` when the result is not representable without
    /// loss (an irrational root of a rational, or a complex value).
    pub fn pow(&self, exp: &Number) -> Option<Self> {
        match (self, exp) {
            (_, Number::Rational(n, 1)) => {
                if self.is_zero() && *n < 0 {
                    return None;
                }
                Some(self.pow_int(*n))
            }
            (Number::Rational(bn, bd), Number::Rational(en, ed)) => {
                let root = u32::try_from(*ed).ok()?;
                let num = integer_root(*bn, root)?;
                let den = integer_root(*bd, root)?;
                Some(Number::Rational(num, den).pow_int(*en))
            }
            _ => {
                let value = self.to_f64().powf(exp.to_f64());
                if value.is_nan() {
                    None
                } else {
                    Some(Number::Float(value))
                }
            }
        }
    }

    pub fn min(self, other: Self) -> Self {
        if other < self {
            other
        } else {
            self
        }
    }

    pub fn max(self, other: Self) -> Self {
        if other > self {
            other
        } else {
            self
        }
    }
}

/// Equality is exact: a float equals a rational only when it has exactly
/// that value, and NaN equals NaN.
impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Rational(n1, d1), Number::Rational(n2, d2)) => n1 == n2 && d1 == d2,
            (Number::Float(f1), Number::Float(f2)) => f1 == f2 || (f1.is_nan() && f2.is_nan()),
            (Number::Rational(n, d), Number::Float(f))
            | (Number::Float(f), Number::Rational(n, d)) => exact_ratio(*f) == Some((*n, *d)),
        }
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// NaN sorts above every other value. Values that only coincide after
/// rounding to `f64` put the rational first.
impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        let exact = |n: &Number| match n {
            Number::Rational(num, den) => Some((*num, *den)),
            Number::Float(f) => exact_ratio(*f),
        };
        if let (Some((n1, d1)), Some((n2, d2))) = (exact(self), exact(other)) {
            return (i128::from(n1) * i128::from(d2)).cmp(&(i128::from(n2) * i128::from(d1)));
        }
        let (a, b) = (self.to_f64(), other.to_f64());
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match a.partial_cmp(&b) {
                Some(Ordering::Equal) if self != other => {
                    if matches!(self, Number::Rational(..)) {
                        Ordering::Less
                    } else {
                        Ordering::Greater
                    }
                }
                Some(ordering) => ordering,
                None => Ordering::Equal,
            },
        }
    }
}

/// Hashes the exact rational value when there is one, so equal numbers hash
/// alike across the two representations.
impl std::hash::Hash for Number {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let ratio = match self {
            Number::Rational(n, d) => Some((*n, *d)),
            Number::Float(f) => exact_ratio(*f),
        };
        match (ratio, self) {
            (Some((n, d)), _) => {
                state.write_u8(0);
                n.hash(state);
                d.hash(state);
            }
            (None, Number::Float(f)) if f.is_nan() => state.write_u8(2),
            (None, _) => {
                state.write_u8(1);
                self.to_f64().to_bits().hash(state);
            }
        }
    }
}

impl Default for Number {
    fn default() -> Self {
        Number::ZERO
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::int(n)
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::int(n as i64)
    }
}

impl From<f64> for Number {
    fn from(f: f64) -> Self {
        Number::from_f64(f)
    }
}

impl Neg for Number {
    type Output = Number;

    fn neg(self) -> Self::Output {
        match self {
            Number::Rational(n, d) => match n.checked_neg() {
                Some(n) => Number::Rational(n, d),
                None => Number::Float(-(n as f64) / d as f64),
            },
            Number::Float(f) => Number::Float(-f),
        }
    }
}

impl Add for Number {
    type Output = Number;

    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Number::Rational(n1, d1), Number::Rational(n2, d2)) => {
                if let (Some(nd1), Some(nd2), Some(dd)) =
                    (n1.checked_mul(d2), n2.checked_mul(d1), d1.checked_mul(d2))
                {
                    if let Some(num) = nd1.checked_add(nd2) {
                        return Number::rational(num, dd);
                    }
                }
                Number::Float(n1 as f64 / d1 as f64 + n2 as f64 / d2 as f64)
            }
            (a, b) => Number::Float(a.to_f64() + b.to_f64()),
        }
    }
}

impl Sub for Number {
    type Output = Number;

    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

impl Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Number::Rational(n1, d1), Number::Rational(n2, d2)) => {
                // Cross-reduce before multiplying to keep intermediates small
                let g1 = gcd(n1, d2).max(1) as i64;
                let g2 = gcd(n2, d1).max(1) as i64;
                let (n1, d2) = (n1 / g1, d2 / g1);
                let (n2, d1) = (n2 / g2, d1 / g2);
                match (n1.checked_mul(n2), d1.checked_mul(d2)) {
                    (Some(num), Some(den)) => Number::rational(num, den),
                    _ => Number::Float(n1 as f64 * n2 as f64 / (d1 as f64 * d2 as f64)),
                }
            }
            (a, b) => Number::Float(a.to_f64() * b.to_f64()),
        }
    }
}

impl Div for Number {
    type Output = Number;

    fn div(self, rhs: Self) -> Self::Output {
        match rhs {
            Number::Rational(n, d) => {
                if n == 0 {
                    return Number::Float(self.to_f64() / 0.0);
                }
                self * Number::rational(d, n)
            }
            Number::Float(f) => Number::Float(self.to_f64() / f),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Rational(n, 1) => write!(f, "{}", n),
            Number::Rational(n, d) => write!(f, "{}/{}", n, d),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}
