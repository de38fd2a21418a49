//! Arithmetic, comparison and indexing on runtime values.

use std::cmp::Ordering;

use super::{ArithOp, ComparisonOp, Fault, Value};

fn arith_symbol(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "+",
        ArithOp::Sub => "-",
        ArithOp::Mul => "*",
        ArithOp::Div => "/",
        ArithOp::Rem => "%",
    }
}

fn comparison_symbol(op: ComparisonOp) -> &'static str {
    match op {
        ComparisonOp::Eq => "==",
        ComparisonOp::Ne => "!=",
        ComparisonOp::Lt => "<",
        ComparisonOp::Gt => ">",
        ComparisonOp::Le => "<=",
        ComparisonOp::Ge => ">=",
    }
}

/// `+` also concatenates two strings or two lists.
pub(super) fn arith(op: ArithOp, left: &Value, right: &Value) -> Result<Value, Fault> {
    match (op, left, right) {
        (ArithOp::Add, Value::Str(a), Value::Str(b)) => {
            let mut joined = a.clone();
            joined.push_str(b);
            return Ok(Value::Str(joined));
        }
        (ArithOp::Add, Value::List(a), Value::List(b)) => {
            // Borrow both before building, `a` and `b` may alias.
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            return Ok(Value::list(items));
        }
        _ => {}
    }

    let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
        return Err(Fault::BinaryOperands {
            op: arith_symbol(op),
            left: left.type_name(),
            right: right.type_name(),
        });
    };
    let n = match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div if b == 0.0 => return Err(Fault::DivisionByZero),
        ArithOp::Div => a / b,
        ArithOp::Rem if b == 0.0 => return Err(Fault::DivisionByZero),
        // The result takes the sign of the divisor.
        ArithOp::Rem => a - b * (a / b).floor(),
    };
    Ok(Value::Number(n))
}

/// Equality is defined for every pair of values; ordering only for two
/// numbers or two strings.
pub(super) fn compare(op: ComparisonOp, left: &Value, right: &Value) -> Result<Value, Fault> {
    let ordering = match op {
        ComparisonOp::Eq => return Ok(Value::Bool(left == right)),
        ComparisonOp::Ne => return Ok(Value::Bool(left != right)),
        _ => match (left, right) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => match (left.as_number(), right.as_number()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => {
                    return Err(Fault::BinaryOperands {
                        op: comparison_symbol(op),
                        left: left.type_name(),
                        right: right.type_name(),
                    });
                }
            },
        },
    };
    // NaN orders against nothing.
    let result = ordering.is_some_and(|ordering| match op {
        ComparisonOp::Lt => ordering == Ordering::Less,
        ComparisonOp::Gt => ordering == Ordering::Greater,
        ComparisonOp::Le => ordering != Ordering::Greater,
        ComparisonOp::Ge => ordering != Ordering::Less,
        ComparisonOp::Eq | ComparisonOp::Ne => false,
    });
    Ok(Value::Bool(result))
}

pub(super) fn negate(operand: &Value) -> Result<Value, Fault> {
    operand
        .as_number()
        .map(|n| Value::Number(-n))
        .ok_or(Fault::UnaryOperand {
            op: "-",
            operand: operand.type_name(),
        })
}

/// Resolves a list index: fractions truncate, negatives count from the end.
fn list_position(index: &Value, len: usize) -> Result<usize, Fault> {
    let Some(n) = index.as_number() else {
        return Err(Fault::NotIndexable {
            container: "list",
            index: index.type_name(),
        });
    };
    if !n.is_finite() {
        return Err(Fault::NotIndexable {
            container: "list",
            index: "non-finite number",
        });
    }
    let requested = n.trunc() as i64;
    let resolved = if requested < 0 {
        requested + len as i64
    } else {
        requested
    };
    if resolved < 0 || resolved >= len as i64 {
        return Err(Fault::IndexOutOfRange {
            index: requested,
            len,
        });
    }
    Ok(resolved as usize)
}

pub(super) fn index_get(container: &Value, index: &Value) -> Result<Value, Fault> {
    match container {
        Value::List(items) => {
            let items = items.borrow();
            let at = list_position(index, items.len())?;
            Ok(items[at].clone())
        }
        Value::Map(dict) => dict
            .borrow()
            .get(index)?
            .cloned()
            .ok_or_else(|| Fault::KeyNotFound(index.to_string())),
        _ => Err(Fault::NotIndexable {
            container: container.type_name(),
            index: index.type_name(),
        }),
    }
}

pub(super) fn index_set(container: &Value, index: &Value, value: Value) -> Result<(), Fault> {
    match container {
        Value::List(items) => {
            let at = list_position(index, items.borrow().len())?;
            items.borrow_mut()[at] = value;
            Ok(())
        }
        Value::Map(dict) => dict.borrow_mut().insert(index.clone(), value),
        _ => Err(Fault::NotIndexable {
            container: container.type_name(),
            index: index.type_name(),
        }),
    }
}
