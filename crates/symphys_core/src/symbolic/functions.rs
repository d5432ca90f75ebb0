//! Construction and special values of built-in functions.

use super::expr::{Constant, Expr, Func};
use super::number::Number;

/// Numeric value of `func` applied to real arguments.
pub(crate) fn apply_numeric(func: Func, args: &[f64]) -> Option<f64> {
    let first = *args.first()?;
    let value = match func {
        Func::Sin => first.sin(),
        Func::Cos => first.cos(),
        Func::Tan => first.tan(),
        Func::Asin => first.asin(),
        Func::Acos => first.acos(),
        Func::Atan => first.atan(),
        Func::Atan2 => first.atan2(*args.get(1)?),
        Func::Exp => first.exp(),
        Func::Log => first.ln(),
        Func::Abs => first.abs(),
        Func::Sign => {
            if first > 0.0 {
                1.0
            } else if first < 0.0 {
                -1.0
            } else {
                0.0
            }
        }
        Func::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
        Func::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// `q` such that `expr == q*pi`, for exact rational `q`.
fn pi_multiple(expr: &Expr) -> Option<Number> {
    match expr {
        Expr::Num(n) if n.is_zero() => Some(Number::ZERO),
        Expr::Const(Constant::Pi) => Some(Number::ONE),
        Expr::Mul(factors) => match factors.as_slice() {
            [Expr::Num(q @ Number::Rational(..)), Expr::Const(Constant::Pi)] => Some(*q),
            _ => None,
        },
        _ => None,
    }
}

/// Exact sine of `q*pi` for multiples of pi/12 that have a closed form.
fn exact_sin(q: Number) -> Option<Expr> {
    // Reduce to k*pi/12 with 0 <= k < 24
    let twelfths = q * Number::int(12);
    let k = twelfths.as_integer()?.rem_euclid(24);
    let (magnitude_k, negate) = if k >= 12 { (k - 12, true) } else { (k, false) };
    let folded = if magnitude_k > 6 {
        12 - magnitude_k
    } else {
        magnitude_k
    };
    let magnitude = match folded {
        0 => Expr::zero(),
        2 => Expr::rational(1, 2),
        3 => Expr::div(Expr::sqrt(Expr::int(2)), Expr::int(2)),
        4 => Expr::div(Expr::sqrt(Expr::int(3)), Expr::int(2)),
        6 => Expr::one(),
        _ => return None,
    };
    Some(if negate {
        Expr::neg(magnitude)
    } else {
        magnitude
    })
}

fn single(func: Func, arg: Expr) -> Expr {
    Expr::Func(func, vec![arg])
}

impl Expr {
    /// Applies a built-in function, evaluating known special values.
    ///
    /// Arguments of the wrong count are kept unevaluated.
    pub fn func(func: Func, mut args: Vec<Expr>) -> Expr {
        if let Some(arity) = func.arity() {
            if args.len() != arity {
                return Expr::Func(func, args);
            }
        }

        // Float arguments evaluate eagerly
        if !args.is_empty()
            && args.iter().any(|a| matches!(a, Expr::Num(n) if n.is_float()))
            && args.iter().all(|a| a.as_number().is_some())
        {
            let values: Vec<f64> = args
                .iter()
                .filter_map(Expr::as_number)
                .map(|n| n.to_f64())
                .collect();
            if let Some(value) = apply_numeric(func, &values) {
                return Expr::Num(Number::Float(value));
            }
        }

        match func {
            Func::Sin => sin(args.remove(0)),
            Func::Cos => cos(args.remove(0)),
            Func::Tan => {
                let arg = args.remove(0);
                if arg.could_extract_minus_sign() {
                    return Expr::neg(Expr::tan(Expr::neg(arg)));
                }
                let exact = pi_multiple(&arg).and_then(|q| {
                    Some((exact_sin(q)?, exact_sin(q + Number::rational(1, 2))?))
                });
                match exact {
                    Some((s, c)) if !c.is_zero() => Expr::div(s, c),
                    _ => single(Func::Tan, arg),
                }
            }
            Func::Asin => {
                let arg = args.remove(0);
                if arg.could_extract_minus_sign() {
                    return Expr::neg(Expr::func(Func::Asin, vec![Expr::neg(arg)]));
                }
                match arg.as_number() {
                    Some(n) if n.is_zero() => Expr::zero(),
                    Some(n) if n.is_one() => Expr::div(Expr::pi(), Expr::int(2)),
                    Some(n) if n == Number::rational(1, 2) => Expr::div(Expr::pi(), Expr::int(6)),
                    _ => single(Func::Asin, arg),
                }
            }
            Func::Acos => {
                let arg = args.remove(0);
                if let Expr::Func(Func::Cos, inner) = &arg {
                    if let [Expr::Sym(s)] = inner.as_slice() {
                        if s.is_polar_angle() {
                            return Expr::Sym(s.clone());
                        }
                    }
                }
                match arg.as_number() {
                    Some(n) if n.is_one() => Expr::zero(),
                    Some(n) if n.is_zero() => Expr::div(Expr::pi(), Expr::int(2)),
                    Some(n) if n == Number::int(-1) => Expr::pi(),
                    Some(n) if n == Number::rational(1, 2) => Expr::div(Expr::pi(), Expr::int(3)),
                    _ => single(Func::Acos, arg),
                }
            }
            Func::Atan => {
                let arg = args.remove(0);
                if arg.could_extract_minus_sign() {
                    return Expr::neg(Expr::func(Func::Atan, vec![Expr::neg(arg)]));
                }
                match arg.as_number() {
                    Some(n) if n.is_zero() => Expr::zero(),
                    Some(n) if n.is_one() => Expr::div(Expr::pi(), Expr::int(4)),
                    _ => single(Func::Atan, arg),
                }
            }
            Func::Atan2 => {
                let x = args.remove(1);
                let y = args.remove(0);
                atan2(y, x)
            }
            Func::Exp => {
                let arg = args.remove(0);
                match arg {
                    Expr::Num(n) if n.is_zero() => Expr::one(),
                    Expr::Num(n) if n.is_one() => Expr::e(),
                    Expr::Func(Func::Log, mut inner) if inner.len() == 1 => inner.remove(0),
                    other => single(Func::Exp, other),
                }
            }
            Func::Log => {
                let arg = args.remove(0);
                match arg {
                    Expr::Num(n) if n.is_one() => Expr::zero(),
                    Expr::Const(Constant::E) => Expr::one(),
                    Expr::Func(Func::Exp, mut inner) if inner.len() == 1 => inner.remove(0),
                    other => single(Func::Log, other),
                }
            }
            Func::Abs => {
                let arg = args.remove(0);
                if let Expr::Num(n) = &arg {
                    return Expr::Num(n.abs());
                }
                if arg.is_nonnegative() {
                    return arg;
                }
                if arg.could_extract_minus_sign() {
                    return Expr::abs(Expr::neg(arg));
                }
                single(Func::Abs, arg)
            }
            Func::Sign => {
                let arg = args.remove(0);
                if let Some(n) = arg.as_number() {
                    return if n.is_zero() {
                        Expr::zero()
                    } else if n.is_negative() {
                        Expr::int(-1)
                    } else {
                        Expr::one()
                    };
                }
                if arg.could_extract_minus_sign() {
                    return Expr::neg(Expr::func(Func::Sign, vec![Expr::neg(arg)]));
                }
                single(Func::Sign, arg)
            }
            Func::Min | Func::Max => extremum(func, args),
        }
    }
}

fn sin(arg: Expr) -> Expr {
    if let Some(value) = pi_multiple(&arg).and_then(exact_sin) {
        return value;
    }
    if let Expr::Func(Func::Acos, inner) = &arg {
        if let [w] = inner.as_slice() {
            return Expr::sqrt(Expr::sub(Expr::one(), Expr::powi(w.clone(), 2)));
        }
    }
    if arg.could_extract_minus_sign() {
        return Expr::neg(sin(Expr::neg(arg)));
    }
    single(Func::Sin, arg)
}

fn cos(arg: Expr) -> Expr {
    if let Some(value) = pi_multiple(&arg).and_then(|q| exact_sin(q + Number::rational(1, 2))) {
        return value;
    }
    if let Expr::Func(Func::Acos, mut inner) = arg {
        if inner.len() == 1 {
            return inner.remove(0);
        }
        return single(Func::Cos, Expr::Func(Func::Acos, inner));
    }
    if arg.could_extract_minus_sign() {
        return cos(Expr::neg(arg));
    }
    single(Func::Cos, arg)
}

fn atan2(y: Expr, x: Expr) -> Expr {
    if let (Some(yn), Some(xn)) = (y.as_number(), x.as_number()) {
        if yn.is_zero() && xn.is_zero() {
            return Expr::Func(Func::Atan2, vec![y, x]);
        }
        if yn.is_zero() {
            return if xn.is_negative() {
                Expr::pi()
            } else {
                Expr::zero()
            };
        }
        if xn.is_zero() {
            let half_pi = Expr::div(Expr::pi(), Expr::int(2));
            return if yn.is_negative() {
                Expr::neg(half_pi)
            } else {
                half_pi
            };
        }
        if !xn.is_negative() {
            return Expr::func(Func::Atan, vec![Expr::Num(yn / xn)]);
        }
    }
    if let Some(angle) = polar_angle_of(&y, &x) {
        return angle;
    }
    if y.is_zero() && x.is_nonnegative() {
        return Expr::zero();
    }
    if x.is_zero() && y.is_nonnegative() {
        return Expr::div(Expr::pi(), Expr::int(2));
    }
    Expr::Func(Func::Atan2, vec![y, x])
}

/// `u` when `y = k*sin(u)` and `x = k*cos(u)` for some non-negative `k`.
fn polar_angle_of(y: &Expr, x: &Expr) -> Option<Expr> {
    let factors = match y {
        Expr::Mul(factors) => factors.as_slice(),
        other => std::slice::from_ref(other),
    };
    factors.iter().find_map(|factor| {
        let u = match factor {
            Expr::Func(Func::Sin, args) if args.len() == 1 => &args[0],
            _ => return None,
        };
        let k_y = Expr::div(y.clone(), Expr::sin(u.clone()));
        let k_x = Expr::div(x.clone(), Expr::cos(u.clone()));
        (k_y == k_x && k_y.is_nonnegative()).then(|| u.clone())
    })
}

fn extremum(func: Func, args: Vec<Expr>) -> Expr {
    let mut flat = Vec::new();
    for arg in args {
        match arg {
            Expr::Func(inner, nested) if inner == func => flat.extend(nested),
            other => flat.push(other),
        }
    }
    let mut numeric: Option<Number> = None;
    let mut symbolic: Vec<Expr> = Vec::new();
    for arg in flat {
        match arg {
            Expr::Num(n) => {
                numeric = Some(match (numeric, func) {
                    (None, _) => n,
                    (Some(acc), Func::Min) => acc.min(n),
                    (Some(acc), _) => acc.max(n),
                })
            }
            other => {
                if !symbolic.contains(&other) {
                    symbolic.push(other);
                }
            }
        }
    }
    if let Some(n) = numeric {
        symbolic.push(Expr::Num(n));
    }
    symbolic.sort();
    match symbolic.len() {
        0 => Expr::Func(func, symbolic),
        1 => symbolic.remove(0),
        _ => Expr::Func(func, symbolic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::Symbol;

    #[test]
    fn sine_and_cosine_of_pi_multiples_are_exact() {
        assert!(Expr::sin(Expr::pi()).is_zero());
        assert_eq!(Expr::cos(Expr::pi()), Expr::int(-1));
        assert_eq!(
            Expr::sin(Expr::div(Expr::pi(), Expr::int(6))),
            Expr::rational(1, 2)
        );
        assert_eq!(
            Expr::cos(Expr::mul([Expr::rational(3, 2), Expr::pi()])),
            Expr::zero()
        );
    }

    #[test]
    fn parity_is_normalized() {
        let x = Expr::from(Symbol::dimensionless("x"));
        assert_eq!(Expr::sin(-x.clone()), -Expr::sin(x.clone()));
        assert_eq!(Expr::cos(-x.clone()), Expr::cos(x));
    }

    #[test]
    fn exp_and_log_cancel() {
        let x = Expr::from(Symbol::dimensionless("x"));
        assert_eq!(Expr::log(Expr::exp(x.clone())), x);
        assert_eq!(Expr::exp(Expr::log(x.clone())), x);
        assert!(Expr::log(Expr::one()).is_zero());
    }

    #[test]
    fn atan2_on_axes() {
        assert_eq!(Expr::atan2(Expr::zero(), Expr::int(-2)), Expr::pi());
        assert_eq!(
            Expr::atan2(Expr::int(1), Expr::zero()),
            Expr::div(Expr::pi(), Expr::int(2))
        );
        assert_eq!(
            Expr::atan2(Expr::int(3), Expr::int(3)),
            Expr::div(Expr::pi(), Expr::int(4))
        );
    }

    #[test]
    fn min_of_numbers_folds() {
        let x = Expr::from(Symbol::dimensionless("x"));
        assert_eq!(Expr::min(vec![Expr::int(3), Expr::int(1)]), Expr::int(1));
        assert_eq!(
            Expr::max(vec![x.clone(), Expr::int(1), Expr::int(2), x.clone()]),
            Expr::max(vec![Expr::int(2), x])
        );
    }

    #[test]
    fn float_arguments_evaluate() {
        let value = Expr::sin(Expr::float(0.5));
        assert_eq!(value, Expr::float(0.5f64.sin()));
    }
}
