//! Operator semantics driven by dominance tables.
//!
//! Each table is indexed by `(left.index(), right.index())` over the scalar
//! kinds in `DataType` order: Integer, Decimal, Boolean, Char, String, Null.
//! `None` marks an illegal combination.

use crate::error::SemanticError;
use crate::value::Value;
use aula_types::ast::{ArithOp, LogicOp, RelOp};
use aula_types::DataType;
use std::cmp::Ordering;

type Table = [[Option<DataType>; DataType::SCALARS]; DataType::SCALARS];

const I: Option<DataType> = Some(DataType::Integer);
const D: Option<DataType> = Some(DataType::Decimal);
const S: Option<DataType> = Some(DataType::String);
const X: Option<DataType> = None;

// ══════════════════════════════════════════════════════════════════════════════
// Dominance tables
// ══════════════════════════════════════════════════════════════════════════════

/// `+`: numeric promotion, or concatenation with a String on either side.
pub const ADDITION: Table = [
    //  I  D  B  C  S  N
    [I, D, X, X, S, X], // Integer
    [D, D, X, X, S, X], // Decimal
    [X, X, X, X, S, X], // Boolean
    [X, X, X, X, S, X], // Char
    [S, S, S, S, S, S], // String
    [X, X, X, X, S, X], // Null
];

/// `-`, `*`, `^` and `%`: Integer only when both sides are Integer.
pub const ARITHMETIC: Table = [
    [I, D, X, X, X, X],
    [D, D, X, X, X, X],
    [X, X, X, X, X, X],
    [X, X, X, X, X, X],
    [X, X, X, X, X, X],
    [X, X, X, X, X, X],
];

/// `/` and `√`: always Decimal.
pub const QUOTIENT: Table = [
    [D, D, X, X, X, X],
    [D, D, X, X, X, X],
    [X, X, X, X, X, X],
    [X, X, X, X, X, X],
    [X, X, X, X, X, X],
    [X, X, X, X, X, X],
];

/// Which pairs `==` / `!=` may compare. Null compares with anything.
pub const COMPARABLE: [[bool; DataType::SCALARS]; DataType::SCALARS] = [
    //  I      D      B      C      S      N
    [true, true, false, true, false, true],
    [true, true, false, true, false, true],
    [false, false, true, false, false, true],
    [true, true, false, true, false, true],
    [false, false, false, false, true, true],
    [true, true, true, true, true, true],
];

fn table_for(op: ArithOp) -> &'static Table {
    match op {
        ArithOp::Add => &ADDITION,
        ArithOp::Sub | ArithOp::Mul | ArithOp::Pow | ArithOp::Mod => &ARITHMETIC,
        ArithOp::Div | ArithOp::Root => &QUOTIENT,
    }
}

/// Result kind of `left op right`, or `None` if the pair is illegal.
pub fn result_kind(op: ArithOp, left: DataType, right: DataType) -> Option<DataType> {
    let (l, r) = (left.index()?, right.index()?);
    table_for(op)[l][r]
}

// ══════════════════════════════════════════════════════════════════════════════
// Arithmetic
// ══════════════════════════════════════════════════════════════════════════════

pub fn arithmetic(op: ArithOp, left: &Value, right: &Value) -> Result<Value, SemanticError> {
    let incompatible = || {
        SemanticError::IncompatibleTypes(format!(
            "cannot apply `{}` to {} and {}",
            op.as_str(),
            left.data_type(),
            right.data_type()
        ))
    };
    let kind = result_kind(op, left.data_type(), right.data_type()).ok_or_else(incompatible)?;

    if kind == DataType::String {
        return Ok(Value::String(format!("{left}{right}")));
    }

    // Past the table only Integer and Decimal operands remain.
    let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) else {
        return Err(incompatible());
    };

    match (op, left, right) {
        (ArithOp::Div | ArithOp::Mod, _, _) if r == 0.0 => Err(SemanticError::DivisionByZero),
        (_, Value::Integer(a), Value::Integer(b)) => integer_arithmetic(op, *a, *b),
        _ => {
            let result = match op {
                ArithOp::Add => l + r,
                ArithOp::Sub => l - r,
                ArithOp::Mul => l * r,
                ArithOp::Div => l / r,
                ArithOp::Pow => l.powf(r),
                ArithOp::Mod => l % r,
                ArithOp::Root => return root(l, r),
            };
            decimal(result, op.as_str())
        }
    }
}

fn integer_arithmetic(op: ArithOp, a: i64, b: i64) -> Result<Value, SemanticError> {
    let result = match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Sub => a.checked_sub(b),
        ArithOp::Mul => a.checked_mul(b),
        ArithOp::Mod => a.checked_rem(b),
        ArithOp::Pow if b >= 0 => u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
        // Negative exponents truncate toward zero.
        ArithOp::Pow => return to_integer((a as f64).powf(b as f64)).map(Value::Integer),
        ArithOp::Div => return decimal(a as f64 / b as f64, "/"),
        ArithOp::Root => return root(a as f64, b as f64),
    };
    result.map(Value::Integer).ok_or_else(|| {
        SemanticError::ArithmeticTrap(format!("{a} {} {b} overflows Integer", op.as_str()))
    })
}

fn root(radicand: f64, index: f64) -> Result<Value, SemanticError> {
    if index <= 0.0 {
        return Err(SemanticError::InvalidRootIndex { index });
    }
    // Odd integral roots of negative numbers are real.
    let odd = index.fract() == 0.0 && index % 2.0 == 1.0;
    let result = if radicand < 0.0 && odd {
        -(-radicand).powf(1.0 / index)
    } else {
        radicand.powf(1.0 / index)
    };
    decimal(result, "√")
}

fn decimal(result: f64, op: &str) -> Result<Value, SemanticError> {
    if result.is_finite() {
        Ok(Value::Decimal(result))
    } else {
        Err(SemanticError::ArithmeticTrap(format!(
            "`{op}` produced a non-finite result"
        )))
    }
}

/// Convert an already-rounded Decimal to Integer, rejecting out-of-range values.
pub fn to_integer(d: f64) -> Result<i64, SemanticError> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if d.is_finite() && d >= i64::MIN as f64 && d < i64::MAX as f64 {
        Ok(d as i64)
    } else {
        Err(SemanticError::ArithmeticTrap(format!(
            "{d} does not fit in Integer"
        )))
    }
}

pub fn negate(value: &Value) -> Result<Value, SemanticError> {
    match value {
        Value::Integer(n) => n.checked_neg().map(Value::Integer).ok_or_else(|| {
            SemanticError::ArithmeticTrap(format!("-({n}) overflows Integer"))
        }),
        Value::Decimal(d) => Ok(Value::Decimal(-d)),
        other => Err(SemanticError::IncompatibleTypes(format!(
            "cannot negate {}",
            other.data_type()
        ))),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Relational
// ══════════════════════════════════════════════════════════════════════════════

pub fn relational(op: RelOp, left: &Value, right: &Value) -> Result<Value, SemanticError> {
    if op.is_equality() {
        let equal = values_equal(left, right).ok_or_else(|| {
            SemanticError::IncompatibleTypes(format!(
                "cannot compare {} and {} with `{}`",
                left.data_type(),
                right.data_type(),
                op.as_str()
            ))
        })?;
        return Ok(Value::Boolean(if op == RelOp::Eq { equal } else { !equal }));
    }

    let ordering = order(left, right).ok_or_else(|| {
        SemanticError::UnsupportedOperator(format!(
            "`{}` requires numeric operands, found {} and {}",
            op.as_str(),
            left.data_type(),
            right.data_type()
        ))
    })?;
    let result = match op {
        RelOp::Less => ordering == Ordering::Less,
        RelOp::Greater => ordering == Ordering::Greater,
        RelOp::LessEq => ordering != Ordering::Greater,
        RelOp::GreaterEq => ordering != Ordering::Less,
        RelOp::Eq => ordering == Ordering::Equal,
        RelOp::NotEq => ordering != Ordering::Equal,
    };
    Ok(Value::Boolean(result))
}

/// Value equality, or `None` when the two kinds are not comparable.
pub fn values_equal(left: &Value, right: &Value) -> Option<bool> {
    match (left, right) {
        (Value::Array(a), Value::Array(b)) => return Some(a == b),
        (Value::Array(_), Value::Null) | (Value::Null, Value::Array(_)) => return Some(false),
        (Value::Array(_), _) | (_, Value::Array(_)) => return None,
        _ => {}
    }
    let (l, r) = (left.data_type().index()?, right.data_type().index()?);
    if !COMPARABLE[l][r] {
        return None;
    }
    let equal = match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        _ => order(left, right) == Some(Ordering::Equal),
    };
    Some(equal)
}

/// Ordering of two Integer/Decimal/Char values; `None` for anything else.
pub fn order(left: &Value, right: &Value) -> Option<Ordering> {
    if !left.data_type().is_ordered() || !right.data_type().is_ordered() {
        return None;
    }
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
        _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Logical
// ══════════════════════════════════════════════════════════════════════════════

pub fn logical(op: LogicOp, left: &Value, right: &Value) -> Result<Value, SemanticError> {
    match (left, right) {
        (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(match op {
            LogicOp::And => *a && *b,
            LogicOp::Or => *a || *b,
        })),
        _ => Err(SemanticError::TypeMismatch(format!(
            "`{}` requires Boolean operands, found {} and {}",
            op.as_str(),
            left.data_type(),
            right.data_type()
        ))),
    }
}

pub fn not(value: &Value) -> Result<Value, SemanticError> {
    match value {
        Value::Boolean(b) => Ok(Value::Boolean(!b)),
        other => Err(SemanticError::TypeMismatch(format!(
            "`not` requires a Boolean operand, found {}",
            other.data_type()
        ))),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Casts
// ══════════════════════════════════════════════════════════════════════════════

pub fn cast(value: &Value, target: DataType) -> Result<Value, SemanticError> {
    let unsupported = || SemanticError::UnsupportedCast {
        from: value.data_type(),
        to: target,
    };
    match (value, target) {
        (Value::Integer(n), DataType::Decimal) => Ok(Value::Decimal(*n as f64)),
        (Value::Integer(n), DataType::String) => Ok(Value::String(n.to_string())),
        (Value::Integer(n), DataType::Char) => u32::try_from(*n)
            .ok()
            .and_then(char::from_u32)
            .map(Value::Char)
            .ok_or_else(unsupported),
        (Value::Decimal(d), DataType::Integer) => to_integer(d.floor()).map(Value::Integer),
        (Value::Decimal(_), DataType::String) => Ok(Value::String(value.to_string())),
        (Value::Char(c), DataType::Integer) => Ok(Value::Integer(i64::from(u32::from(*c)))),
        (Value::Char(c), DataType::Decimal) => Ok(Value::Decimal(f64::from(u32::from(*c)))),
        _ => Err(unsupported()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::Integer(n)
    }

    fn dec(d: f64) -> Value {
        Value::Decimal(d)
    }

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    // ── Tables ──

    #[test]
    fn test_addition_table() {
        use DataType::*;
        assert_eq!(result_kind(ArithOp::Add, Integer, Integer), Some(Integer));
        assert_eq!(result_kind(ArithOp::Add, Integer, Decimal), Some(Decimal));
        assert_eq!(result_kind(ArithOp::Add, Decimal, String), Some(String));
        assert_eq!(result_kind(ArithOp::Add, Boolean, String), Some(String));
        assert_eq!(result_kind(ArithOp::Add, Boolean, Integer), None);
        assert_eq!(result_kind(ArithOp::Add, Char, Char), None);
        assert_eq!(result_kind(ArithOp::Add, Null, Integer), None);
        assert_eq!(result_kind(ArithOp::Add, Array, Integer), None);
    }

    #[test]
    fn test_arithmetic_tables_never_produce_string() {
        use DataType::*;
        for op in [ArithOp::Sub, ArithOp::Mul, ArithOp::Pow, ArithOp::Mod] {
            assert_eq!(result_kind(op, String, String), None);
            assert_eq!(result_kind(op, Integer, Integer), Some(Integer));
            assert_eq!(result_kind(op, Decimal, Integer), Some(Decimal));
        }
        for op in [ArithOp::Div, ArithOp::Root] {
            assert_eq!(result_kind(op, Integer, Integer), Some(Decimal));
            assert_eq!(result_kind(op, Char, Integer), None);
        }
    }

    #[test]
    fn test_comparable_is_symmetric() {
        for l in 0..DataType::SCALARS {
            for r in 0..DataType::SCALARS {
                assert_eq!(COMPARABLE[l][r], COMPARABLE[r][l]);
            }
        }
    }

    // ── Arithmetic ──

    #[test]
    fn test_integer_division_is_true_division() {
        assert_eq!(arithmetic(ArithOp::Div, &int(6), &int(3)), Ok(dec(2.0)));
        assert_eq!(arithmetic(ArithOp::Div, &int(7), &int(2)), Ok(dec(3.5)));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            arithmetic(ArithOp::Div, &int(1), &int(0)),
            Err(SemanticError::DivisionByZero)
        );
        assert_eq!(
            arithmetic(ArithOp::Mod, &dec(1.5), &dec(0.0)),
            Err(SemanticError::DivisionByZero)
        );
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(arithmetic(ArithOp::Add, &s("n = "), &int(4)), Ok(s("n = 4")));
        assert_eq!(arithmetic(ArithOp::Add, &dec(2.5), &s("!")), Ok(s("2.5!")));
        assert_eq!(
            arithmetic(ArithOp::Add, &s("x"), &Value::Boolean(true)),
            Ok(s("xtrue"))
        );
    }

    #[test]
    fn test_incompatible_operands() {
        assert!(matches!(
            arithmetic(ArithOp::Sub, &s("a"), &int(1)),
            Err(SemanticError::IncompatibleTypes(_))
        ));
        assert!(matches!(
            arithmetic(ArithOp::Mul, &Value::Boolean(true), &int(1)),
            Err(SemanticError::IncompatibleTypes(_))
        ));
    }

    #[test]
    fn test_power() {
        assert_eq!(arithmetic(ArithOp::Pow, &int(2), &int(10)), Ok(int(1024)));
        assert_eq!(arithmetic(ArithOp::Pow, &int(2), &int(-1)), Ok(int(0)));
        assert_eq!(arithmetic(ArithOp::Pow, &dec(4.0), &dec(0.5)), Ok(dec(2.0)));
        assert!(matches!(
            arithmetic(ArithOp::Pow, &int(10), &int(40)),
            Err(SemanticError::ArithmeticTrap(_))
        ));
    }

    #[test]
    fn test_root() {
        assert_eq!(arithmetic(ArithOp::Root, &int(16), &int(2)), Ok(dec(4.0)));
        match arithmetic(ArithOp::Root, &int(-8), &int(3)) {
            Ok(Value::Decimal(d)) => assert!((d + 2.0).abs() < 1e-12, "got {d}"),
            other => panic!("expected a Decimal, got {other:?}"),
        }
        assert_eq!(
            arithmetic(ArithOp::Root, &int(9), &int(0)),
            Err(SemanticError::InvalidRootIndex { index: 0.0 })
        );
        assert!(matches!(
            arithmetic(ArithOp::Root, &int(-4), &int(2)),
            Err(SemanticError::ArithmeticTrap(_))
        ));
    }

    #[test]
    fn test_modulo() {
        assert_eq!(arithmetic(ArithOp::Mod, &int(7), &int(3)), Ok(int(1)));
        assert_eq!(arithmetic(ArithOp::Mod, &int(-7), &int(3)), Ok(int(-1)));
        assert_eq!(arithmetic(ArithOp::Mod, &dec(7.5), &int(2)), Ok(dec(1.5)));
    }

    #[test]
    fn test_integer_overflow_traps() {
        assert!(matches!(
            arithmetic(ArithOp::Add, &int(i64::MAX), &int(1)),
            Err(SemanticError::ArithmeticTrap(_))
        ));
        assert!(matches!(
            negate(&int(i64::MIN)),
            Err(SemanticError::ArithmeticTrap(_))
        ));
    }

    #[test]
    fn test_negate() {
        assert_eq!(negate(&int(3)), Ok(int(-3)));
        assert_eq!(negate(&dec(1.5)), Ok(dec(-1.5)));
        assert!(matches!(
            negate(&Value::Char('a')),
            Err(SemanticError::IncompatibleTypes(_))
        ));
    }

    // ── Relational ──

    #[test]
    fn test_mixed_numeric_comparison() {
        assert_eq!(relational(RelOp::Eq, &int(2), &dec(2.0)), Ok(Value::Boolean(true)));
        assert_eq!(relational(RelOp::Less, &Value::Char('A'), &int(66)), Ok(Value::Boolean(true)));
        assert_eq!(relational(RelOp::GreaterEq, &dec(1.5), &int(2)), Ok(Value::Boolean(false)));
    }

    #[test]
    fn test_null_equality() {
        assert_eq!(relational(RelOp::Eq, &Value::Null, &Value::Null), Ok(Value::Boolean(true)));
        assert_eq!(relational(RelOp::NotEq, &s("a"), &Value::Null), Ok(Value::Boolean(true)));
        assert_eq!(relational(RelOp::Eq, &Value::Boolean(false), &Value::Null), Ok(Value::Boolean(false)));
    }

    #[test]
    fn test_illegal_equality() {
        assert!(matches!(
            relational(RelOp::Eq, &Value::Boolean(true), &int(1)),
            Err(SemanticError::IncompatibleTypes(_))
        ));
        assert!(matches!(
            relational(RelOp::NotEq, &s("1"), &int(1)),
            Err(SemanticError::IncompatibleTypes(_))
        ));
    }

    #[test]
    fn test_ordering_requires_numbers() {
        assert!(matches!(
            relational(RelOp::Less, &s("a"), &s("b")),
            Err(SemanticError::UnsupportedOperator(_))
        ));
        assert!(matches!(
            relational(RelOp::Greater, &Value::Boolean(true), &Value::Boolean(false)),
            Err(SemanticError::UnsupportedOperator(_))
        ));
    }

    // ── Logical ──

    #[test]
    fn test_logical() {
        let t = Value::Boolean(true);
        let f = Value::Boolean(false);
        assert_eq!(logical(LogicOp::And, &t, &f), Ok(f.clone()));
        assert_eq!(logical(LogicOp::Or, &t, &f), Ok(t.clone()));
        assert_eq!(not(&f), Ok(t));
        assert!(matches!(
            logical(LogicOp::Or, &int(1), &f),
            Err(SemanticError::TypeMismatch(_))
        ));
        assert!(matches!(not(&int(0)), Err(SemanticError::TypeMismatch(_))));
    }

    // ── Casts ──

    #[test]
    fn test_documented_casts() {
        assert_eq!(cast(&int(65), DataType::Char), Ok(Value::Char('A')));
        assert_eq!(cast(&int(3), DataType::Decimal), Ok(dec(3.0)));
        assert_eq!(cast(&int(3), DataType::String), Ok(s("3")));
        assert_eq!(cast(&dec(-2.5), DataType::Integer), Ok(int(-3)));
        assert_eq!(cast(&dec(2.5), DataType::String), Ok(s("2.5")));
        assert_eq!(cast(&Value::Char('a'), DataType::Integer), Ok(int(97)));
        assert_eq!(cast(&Value::Char('a'), DataType::Decimal), Ok(dec(97.0)));
    }

    #[test]
    fn test_unsupported_casts() {
        for (value, target) in [
            (Value::Boolean(true), DataType::Integer),
            (s("12"), DataType::Integer),
            (int(1), DataType::Integer),
            (Value::Char('a'), DataType::String),
            (int(-1), DataType::Char),
        ] {
            assert_eq!(
                cast(&value, target),
                Err(SemanticError::UnsupportedCast {
                    from: value.data_type(),
                    to: target
                })
            );
        }
    }
}
