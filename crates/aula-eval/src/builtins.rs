//! Native functions: array aggregates and scalar conversions.

use crate::array::{Array, ArrayStore, Shape};
use crate::error::SemanticError;
use crate::ops;
use crate::value::{ArrayRef, Value};
use aula_types::ast::Builtin;
use aula_types::DataType;
use std::cmp::Ordering;

/// Apply `func` to already-evaluated arguments. Every builtin takes one.
pub fn apply(
    store: &mut ArrayStore,
    func: Builtin,
    args: Vec<Value>,
) -> Result<Value, SemanticError> {
    let name = func.as_str();
    if args.len() > 1 {
        return Err(SemanticError::TooManyArguments {
            name: name.to_string(),
            expected: 1,
            received: args.len(),
        });
    }
    let Some(arg) = args.into_iter().next() else {
        return Err(SemanticError::MissingArgument {
            name: name.to_string(),
            param: "value".to_string(),
        });
    };

    match func {
        Builtin::Sum => sum(store.get(array_arg(name, &arg)?)),
        Builtin::Average => average(store.get(array_arg(name, &arg)?)),
        Builtin::Min => extreme(store.get(array_arg(name, &arg)?), name, Ordering::Less),
        Builtin::Max => extreme(store.get(array_arg(name, &arg)?), name, Ordering::Greater),
        Builtin::Reverse => {
            let handle = array_arg(name, &arg)?;
            store.get_mut(handle).reverse();
            Ok(Value::Array(handle))
        }
        Builtin::Length => length(store, &arg),
        Builtin::Round => decimal_arg(name, &arg)
            .and_then(|d| ops::to_integer(d.round()))
            .map(Value::Integer),
        Builtin::Truncate => decimal_arg(name, &arg)
            .and_then(|d| ops::to_integer(d.trunc()))
            .map(Value::Integer),
        Builtin::Upper => string_arg(name, &arg).map(|s| Value::String(s.to_uppercase())),
        Builtin::Lower => string_arg(name, &arg).map(|s| Value::String(s.to_lowercase())),
        Builtin::ToString => match &arg {
            Value::Integer(_) | Value::Decimal(_) | Value::Boolean(_) | Value::Char(_) => {
                Ok(Value::String(arg.to_string()))
            }
            other => Err(wrong_kind(name, "a scalar", other)),
        },
        Builtin::ToCharArray => {
            let chars = string_arg(name, &arg)?.chars().map(Value::Char).collect();
            let array = Array::vector("", DataType::Char, chars)?;
            Ok(Value::Array(store.insert(array)))
        }
    }
}

fn wrong_kind(name: &str, expected: &str, found: &Value) -> SemanticError {
    SemanticError::TypeMismatch(format!(
        "`{name}` expects {expected}, found {}",
        found.data_type()
    ))
}

fn array_arg(name: &str, arg: &Value) -> Result<ArrayRef, SemanticError> {
    match arg {
        Value::Array(handle) => Ok(*handle),
        other => Err(wrong_kind(name, "an array", other)),
    }
}

fn decimal_arg(name: &str, arg: &Value) -> Result<f64, SemanticError> {
    match arg {
        Value::Decimal(d) => Ok(*d),
        other => Err(wrong_kind(name, "a Decimal", other)),
    }
}

fn string_arg<'a>(name: &str, arg: &'a Value) -> Result<&'a str, SemanticError> {
    match arg {
        Value::String(s) => Ok(s),
        other => Err(wrong_kind(name, "a String", other)),
    }
}

// ── Aggregates ────────────────────────────────────────────────────────────────

fn sum(array: &Array) -> Result<Value, SemanticError> {
    let values = array.values();
    match array.elem_type() {
        DataType::Integer => values
            .iter()
            .try_fold(0i64, |acc, v| match v {
                Value::Integer(n) => acc.checked_add(*n),
                _ => Some(acc),
            })
            .map(Value::Integer)
            .ok_or_else(|| SemanticError::ArithmeticTrap("`sum` overflows Integer".into())),
        DataType::Decimal => {
            let total: f64 = values.iter().filter_map(Value::as_f64).sum();
            if total.is_finite() {
                Ok(Value::Decimal(total))
            } else {
                Err(SemanticError::ArithmeticTrap(
                    "`sum` produced a non-finite result".into(),
                ))
            }
        }
        DataType::Char => Ok(Value::Integer(
            values.iter().filter_map(Value::as_f64).map(|c| c as i64).sum(),
        )),
        DataType::Boolean => Ok(Value::Integer(
            values
                .iter()
                .filter(|v| matches!(v, Value::Boolean(true)))
                .count() as i64,
        )),
        DataType::String => Ok(Value::String(
            values.iter().map(ToString::to_string).collect(),
        )),
        other => Err(SemanticError::UnsupportedOperator(format!(
            "`sum` is not defined for {other} arrays"
        ))),
    }
}

fn average(array: &Array) -> Result<Value, SemanticError> {
    let numbers: Vec<f64> = match array.elem_type() {
        DataType::Integer | DataType::Decimal | DataType::Char => {
            array.values().iter().filter_map(Value::as_f64).collect()
        }
        DataType::Boolean => array
            .values()
            .iter()
            .map(|v| if matches!(v, Value::Boolean(true)) { 1.0 } else { 0.0 })
            .collect(),
        other => {
            return Err(SemanticError::UnsupportedOperator(format!(
                "`average` is not defined for {other} arrays"
            )))
        }
    };
    if numbers.is_empty() {
        return Err(SemanticError::EmptyArray { func: "average" });
    }
    Ok(Value::Decimal(
        numbers.iter().sum::<f64>() / numbers.len() as f64,
    ))
}

/// Smallest (`Less`) or largest (`Greater`) element.
fn extreme(array: &Array, name: &'static str, wanted: Ordering) -> Result<Value, SemanticError> {
    let mut best: Option<&Value> = None;
    for value in array.values() {
        let better = match best {
            None => true,
            Some(current) => element_order(value, current).ok_or_else(|| {
                SemanticError::UnsupportedOperator(format!(
                    "`{name}` is not defined for {} arrays",
                    array.elem_type()
                ))
            })? == wanted,
        };
        if better {
            best = Some(value);
        }
    }
    best.cloned().ok_or(SemanticError::EmptyArray { func: name })
}

fn element_order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Boolean(x), Value::Boolean(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => ops::order(a, b),
    }
}

fn length(store: &ArrayStore, arg: &Value) -> Result<Value, SemanticError> {
    let len = match arg {
        Value::String(s) => s.chars().count(),
        Value::Array(handle) => match store.get(*handle).shape() {
            Shape::Vector(len) => len,
            Shape::Matrix(rows, _) => rows,
        },
        other => return Err(wrong_kind("length", "a String or an array", other)),
    };
    Ok(Value::Integer(len as i64))
}
