use crate::runtime::{RuntimeError, Value};
use lazy_static::lazy_static;

lazy_static! {
    /// Names the reader recognizes as primitive-operation references.
    /// Everything else parses as a plain variable reference; in
    /// particular `get` and `dict` are NOT primitives.
    pub static ref PRIM_OPS: Vec<&'static str> = vec![
        "+", "-", "*", "/", ">", "<", "=", "not", "and", "or", "eq?", "string=?", "cons", "car",
        "cdr", "list", "pair?", "number?", "boolean?", "symbol?", "string?",
    ];
}

pub fn is_prim_op(name: &str) -> bool {
    PRIM_OPS.contains(&name)
}

fn num(op: &str, v: &Value) -> Result<f64, RuntimeError> {
    match v {
        Value::Num(n) => Ok(*n),
        other => Err(RuntimeError::TypeMismatch(
            op.to_owned(),
            format!("{}", other),
        )),
    }
}

fn bool_arg(op: &str, v: &Value) -> Result<bool, RuntimeError> {
    match v {
        Value::Bool(b) => Ok(*b),
        other => Err(RuntimeError::TypeMismatch(
            op.to_owned(),
            format!("{}", other),
        )),
    }
}

fn binary<'a>(op: &str, args: &'a [Value]) -> Result<(&'a Value, &'a Value), RuntimeError> {
    match args {
        [lhs, rhs] => Ok((lhs, rhs)),
        _ => Err(RuntimeError::BadArity(op.to_owned(), args.len())),
    }
}

fn unary<'a>(op: &str, args: &'a [Value]) -> Result<&'a Value, RuntimeError> {
    match args {
        [arg] => Ok(arg),
        _ => Err(RuntimeError::BadArity(op.to_owned(), args.len())),
    }
}

fn proper_list(items: &[Value]) -> Value {
    items.iter().rev().fold(Value::Empty, |tail, head| {
        Value::Pair(Box::new(head.clone()), Box::new(tail))
    })
}

/// Apply a primitive operation to already-evaluated arguments.
pub fn apply_prim(op: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    match op {
        "+" => args
            .iter()
            .try_fold(0.0, |acc, v| Ok(acc + num(op, v)?))
            .map(Value::Num),
        "*" => args
            .iter()
            .try_fold(1.0, |acc, v| Ok(acc * num(op, v)?))
            .map(Value::Num),
        "-" => {
            let (lhs, rhs) = binary(op, args)?;
            Ok(Value::Num(num(op, lhs)? - num(op, rhs)?))
        }
        "/" => {
            let (lhs, rhs) = binary(op, args)?;
            let rhs = num(op, rhs)?;
            if rhs == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Ok(Value::Num(num(op, lhs)? / rhs))
        }
        ">" => {
            let (lhs, rhs) = binary(op, args)?;
            Ok(Value::Bool(num(op, lhs)? > num(op, rhs)?))
        }
        "<" => {
            let (lhs, rhs) = binary(op, args)?;
            Ok(Value::Bool(num(op, lhs)? < num(op, rhs)?))
        }
        "=" => {
            let (lhs, rhs) = binary(op, args)?;
            Ok(Value::Bool(num(op, lhs)? == num(op, rhs)?))
        }
        "not" => Ok(Value::Bool(matches!(
            unary(op, args)?,
            Value::Bool(false)
        ))),
        "and" => {
            let (lhs, rhs) = binary(op, args)?;
            Ok(Value::Bool(bool_arg(op, lhs)? && bool_arg(op, rhs)?))
        }
        "or" => {
            let (lhs, rhs) = binary(op, args)?;
            Ok(Value::Bool(bool_arg(op, lhs)? || bool_arg(op, rhs)?))
        }
        "eq?" => {
            let (lhs, rhs) = binary(op, args)?;
            Ok(Value::Bool(lhs == rhs))
        }
        "string=?" => {
            let (lhs, rhs) = binary(op, args)?;
            match (lhs, rhs) {
                (Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a == b)),
                (Value::Str(_), other) | (other, _) => Err(RuntimeError::TypeMismatch(
                    op.to_owned(),
                    format!("{}", other),
                )),
            }
        }
        "cons" => {
            let (car, cdr) = binary(op, args)?;
            Ok(Value::Pair(Box::new(car.clone()), Box::new(cdr.clone())))
        }
        "car" => match unary(op, args)? {
            Value::Pair(car, _) => Ok((**car).clone()),
            other => Err(RuntimeError::TypeMismatch(
                op.to_owned(),
                format!("{}", other),
            )),
        },
        "cdr" => match unary(op, args)? {
            Value::Pair(_, cdr) => Ok((**cdr).clone()),
            other => Err(RuntimeError::TypeMismatch(
                op.to_owned(),
                format!("{}", other),
            )),
        },
        "list" => Ok(proper_list(args)),
        "pair?" => Ok(Value::Bool(matches!(unary(op, args)?, Value::Pair(_, _)))),
        "number?" => Ok(Value::Bool(matches!(unary(op, args)?, Value::Num(_)))),
        "boolean?" => Ok(Value::Bool(matches!(unary(op, args)?, Value::Bool(_)))),
        "symbol?" => Ok(Value::Bool(matches!(unary(op, args)?, Value::Sym(_)))),
        "string?" => Ok(Value::Bool(matches!(unary(op, args)?, Value::Str(_)))),
        _ => Err(RuntimeError::UnknownPrim(op.to_owned())),
    }
}
