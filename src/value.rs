//! Runtime values and the polymorphic operator table (§4.6) both engines
//! dispatch through. `Value` stays a single tagged union shared by the
//! interpreter and the VM; only the two function variants are
//! engine-specific, each engine simply never constructs the other's.
use std::fmt;
use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::ast::statement::FunctionDef;
use crate::diagnostics::EngineError;
use crate::position::Position;

pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, EngineError>>;

#[derive(Clone)]
pub enum Value {
    Void,
    Integer(BigInt),
    Bool(bool),
    String(Rc<String>),
    /// Interpreter-only: a function value closing over its definition node.
    Function(Rc<FunctionDef>),
    /// VM-only: a function value referring to its entry point in the code
    /// vector. Carries its declared arity and name so `Call` can check
    /// argument count the same way the interpreter does (§4.4/§4.7).
    CompiledFunction {
        address: usize,
        arity: usize,
        name: Rc<str>,
    },
    NativeFunction(NativeFn),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "Void"),
            Value::Integer(n) => write!(f, "Integer({n})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Function(def) => write!(f, "Function({})", def.name.text),
            Value::CompiledFunction { address, name, .. } => {
                write!(f, "CompiledFunction({name}@{address})")
            }
            Value::NativeFunction(_) => write!(f, "NativeFunction(..)"),
        }
    }
}

/// The shape of a `Value`, stripped of payload, for `TypeError` reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Void,
    Integer,
    Bool,
    String,
    Function,
    NativeFunction,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Void => "void",
            Kind::Integer => "integer",
            Kind::Bool => "bool",
            Kind::String => "string",
            Kind::Function => "function",
            Kind::NativeFunction => "native function",
        };
        write!(f, "{name}")
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Void => Kind::Void,
            Value::Integer(_) => Kind::Integer,
            Value::Bool(_) => Kind::Bool,
            Value::String(_) => Kind::String,
            Value::Function(_) => Kind::Function,
            Value::CompiledFunction { .. } => Kind::Function,
            Value::NativeFunction(_) => Kind::NativeFunction,
        }
    }

    pub fn as_bool(&self, position: Position) -> Result<bool, EngineError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(EngineError::TypeError {
                expected: Kind::Bool,
                got: other.kind(),
                position,
            }),
        }
    }

    /// Formatting used by the `print`/`println` native functions (§6.3).
    pub fn display_for_print(&self) -> String {
        match self {
            Value::Void => "void".to_owned(),
            Value::Integer(n) => n.to_string(),
            Value::Bool(true) => "true".to_owned(),
            Value::Bool(false) => "false".to_owned(),
            Value::String(s) => s.as_str().to_owned(),
            Value::Function(_) | Value::CompiledFunction { .. } => "<function>".to_owned(),
            Value::NativeFunction(_) => "<native function>".to_owned(),
        }
    }
}

fn type_error(expected: Kind, got: &Value, position: Position) -> EngineError {
    EngineError::TypeError {
        expected,
        got: got.kind(),
        position,
    }
}

fn runtime_error(message: impl Into<String>, position: Position) -> EngineError {
    EngineError::Runtime {
        message: message.into(),
        position,
    }
}

fn expect_integer(value: &Value, position: Position) -> Result<&BigInt, EngineError> {
    match value {
        Value::Integer(n) => Ok(n),
        other => Err(type_error(Kind::Integer, other, position)),
    }
}

pub fn add(left: &Value, right: &Value, position: Position) -> Result<Value, EngineError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a + b)),
        (Value::String(a), Value::Integer(b)) => {
            Ok(Value::String(Rc::new(format!("{a}{b}"))))
        }
        (Value::Integer(a), Value::String(b)) => {
            Ok(Value::String(Rc::new(format!("{a}{b}"))))
        }
        (Value::String(a), Value::String(b)) => {
            Ok(Value::String(Rc::new(format!("{a}{b}"))))
        }
        _ => Err(type_error(Kind::Integer, blame(left, right), position)),
    }
}

/// `add`/`mul`'s fallback case can't attribute the error to `right`
/// unconditionally: when `left` isn't a valid anchor for either operator,
/// `left` is the actual offender even if `right` is a fine `Integer`.
fn blame<'a>(left: &'a Value, right: &'a Value) -> &'a Value {
    match left {
        Value::Integer(_) | Value::String(_) => right,
        _ => left,
    }
}

pub fn sub(left: &Value, right: &Value, position: Position) -> Result<Value, EngineError> {
    let a = expect_integer(left, position)?;
    let b = expect_integer(right, position)?;
    Ok(Value::Integer(a - b))
}

pub fn mul(left: &Value, right: &Value, position: Position) -> Result<Value, EngineError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a * b)),
        (Value::String(s), Value::Integer(count)) | (Value::Integer(count), Value::String(s)) => {
            repeat_string(s, count, position)
        }
        _ => Err(type_error(Kind::Integer, blame(left, right), position)),
    }
}

fn repeat_string(s: &Rc<String>, count: &BigInt, position: Position) -> Result<Value, EngineError> {
    if count.is_negative() {
        return Err(runtime_error(
            "string repeat count must not be negative",
            position,
        ));
    }
    let count = count
        .to_string()
        .parse::<usize>()
        .map_err(|_| runtime_error("string repeat count is too large", position))?;
    Ok(Value::String(Rc::new(s.repeat(count))))
}

pub fn div(left: &Value, right: &Value, position: Position) -> Result<Value, EngineError> {
    let a = expect_integer(left, position)?;
    let b = expect_integer(right, position)?;
    if b.is_zero() {
        return Err(runtime_error("divide by zero", position));
    }
    Ok(Value::Integer(a / b))
}

pub fn modulo(left: &Value, right: &Value, position: Position) -> Result<Value, EngineError> {
    let a = expect_integer(left, position)?;
    let b = expect_integer(right, position)?;
    if b.is_zero() {
        return Err(runtime_error("divide by zero", position));
    }
    Ok(Value::Integer(a % b))
}

pub fn less(left: &Value, right: &Value, position: Position) -> Result<Value, EngineError> {
    let a = expect_integer(left, position)?;
    let b = expect_integer(right, position)?;
    Ok(Value::Bool(a < b))
}

pub fn less_eq(left: &Value, right: &Value, position: Position) -> Result<Value, EngineError> {
    let a = expect_integer(left, position)?;
    let b = expect_integer(right, position)?;
    Ok(Value::Bool(a <= b))
}

pub fn greater(left: &Value, right: &Value, position: Position) -> Result<Value, EngineError> {
    let a = expect_integer(left, position)?;
    let b = expect_integer(right, position)?;
    Ok(Value::Bool(a > b))
}

pub fn greater_eq(left: &Value, right: &Value, position: Position) -> Result<Value, EngineError> {
    let a = expect_integer(left, position)?;
    let b = expect_integer(right, position)?;
    Ok(Value::Bool(a >= b))
}

/// Cross-kind equality is a type error, not `false` (§9 open question).
pub fn eq(left: &Value, right: &Value, position: Position) -> Result<Value, EngineError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Bool(a == b)),
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a == b)),
        (Value::String(a), Value::String(b)) => Ok(Value::Bool(a == b)),
        _ => Err(type_error(left.kind(), right, position)),
    }
}

pub fn not_eq(left: &Value, right: &Value, position: Position) -> Result<Value, EngineError> {
    match eq(left, right, position)? {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        _ => unreachable!("eq always returns Bool"),
    }
}

pub fn neg(value: &Value, position: Position) -> Result<Value, EngineError> {
    let n = expect_integer(value, position)?;
    Ok(Value::Integer(-n))
}

pub fn pos(value: &Value, position: Position) -> Result<Value, EngineError> {
    expect_integer(value, position)?;
    Ok(value.clone())
}

pub fn not(value: &Value, position: Position) -> Result<Value, EngineError> {
    Ok(Value::Bool(!value.as_bool(position)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::Integer(BigInt::from(n))
    }

    fn string(s: &str) -> Value {
        Value::String(Rc::new(s.to_owned()))
    }

    const HERE: Position = Position {
        line: 0,
        character: 0,
    };

    #[test]
    fn add_mixes_integer_and_string_by_stringifying() {
        let result = add(&string("a"), &int(1), HERE).unwrap();
        assert!(matches!(result, Value::String(s) if *s == "a1"));
    }

    #[test]
    fn mul_repeats_string_by_integer() {
        let result = mul(&string("ab"), &int(3), HERE).unwrap();
        assert!(matches!(result, Value::String(s) if *s == "ababab"));
    }

    #[test]
    fn mul_rejects_negative_repeat_count() {
        let err = mul(&string("ab"), &int(-1), HERE).unwrap_err();
        assert!(matches!(err, EngineError::Runtime { .. }));
    }

    #[test]
    fn div_by_zero_is_runtime_error() {
        let err = div(&int(1), &int(0), HERE).unwrap_err();
        assert!(matches!(err, EngineError::Runtime { .. }));
    }

    #[test]
    fn add_blames_the_actual_offending_operand() {
        let err = add(&Value::Bool(true), &int(1), HERE).unwrap_err();
        assert!(matches!(
            err,
            EngineError::TypeError {
                got: Kind::Bool,
                ..
            }
        ));
    }

    #[test]
    fn cross_kind_equality_is_type_error() {
        let err = eq(&int(1), &string("1"), HERE).unwrap_err();
        assert!(matches!(err, EngineError::TypeError { .. }));
    }

    #[test]
    fn integer_arithmetic_is_arbitrary_precision() {
        let huge = BigInt::parse_bytes(b"999999999999999999999999999999", 10).unwrap();
        let result = add(&Value::Integer(huge.clone()), &int(1), HERE).unwrap();
        assert_eq!(result.display_for_print(), (huge + 1).to_string());
    }
}
