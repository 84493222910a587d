//! The `Value` model shared by the tree-walking interpreter and the VM,
//! plus the arithmetic/comparison/truthiness rules both engines apply
//! identically.

use loks_util::error::ErrorKind;
use loks_util::symbol::Symbol;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A numeric value, keeping track of whether it was produced as an integer
/// or a double literal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Double(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Double(d) => d,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Integer(n) => n == 0,
            Number::Double(d) => d == 0.0,
        }
    }

    /// Numeric equality across representations: `1 == 1.0` is `true`.
    fn numerically_eq(self, other: Number) -> bool {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }

    fn partial_cmp(self, other: Number) -> std::cmp::Ordering {
        self.as_f64().partial_cmp(&other.as_f64()).unwrap_or(std::cmp::Ordering::Equal)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{n}"),
            Number::Double(d) => write!(f, "{d}"),
        }
    }
}

/// A user-defined function as a runtime value: the closure the tree-walking
/// interpreter captures at definition time, giving it lexical scoping. The
/// VM never constructs this variant:
/// its opcode table has no instruction that loads a bare function reference,
/// only `CALL_FUNCTION`/`CALL_NATIVE`, which invoke by pool index directly.
#[derive(Debug)]
pub struct LoksFunction {
    pub name: Symbol,
    pub params: Vec<Symbol>,
    pub body: Rc<loks_parser::ast::Block>,
    pub closure: crate::environment::Environment,
}

/// The tagged union shared by both execution engines.
/// `Array` is a shared, interior-mutable reference; every other variant is
/// immutable.
#[derive(Clone, Debug)]
pub enum Value {
    Nil,
    Number(Number),
    Boolean(bool),
    String(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Function(Rc<LoksFunction>),
}

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn array(elems: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(elems)))
    }

    /// The tag name used in diagnostic messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Number(_) => "Number",
            Value::Boolean(_) => "Boolean",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Function(_) => "Function",
        }
    }
}

/// Truthiness, exhaustive over every kind: `Nil` → false; `false` → false;
/// zero `Number` → false; empty `String`/`Array` → false; `Function` →
/// false; everything else → true.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Boolean(b) => *b,
        Value::Number(n) => !n.is_zero(),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.borrow().is_empty(),
        Value::Function(_) => false,
    }
}

/// The internal, quoted-string printable form: used for `Array` elements,
/// `str()`, and anywhere a value is rendered that is not the direct
/// top-level argument to `print`/`println`.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Array(a) => {
            let items: Vec<String> = a.borrow().iter().map(display_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Function(f) => {
            let params: Vec<&str> = f.params.iter().map(|p| p.as_str()).collect();
            format!("<function {}: {}>", f.name, params.join(", "))
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_value(self))
    }
}

fn type_error(msg: impl Into<String>) -> ErrorKind {
    ErrorKind::TypeError(msg.into())
}

/// `+`: `Number + Number` promotes to `Double` if either side is; `String +
/// String` concatenates. Any other pairing is a `TypeError`.
pub fn add(a: &Value, b: &Value) -> Result<Value, ErrorKind> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(numeric_binop(*x, *y, |a, b| a + b))),
        (Value::String(x), Value::String(y)) => Ok(Value::string(format!("{x}{y}"))),
        _ => Err(type_error(format!(
            "cannot add {} and {}",
            a.kind_name(),
            b.kind_name()
        ))),
    }
}

pub fn sub(a: &Value, b: &Value) -> Result<Value, ErrorKind> {
    numeric_op(a, b, "subtract", |x, y| numeric_binop(x, y, |a, b| a - b))
}

pub fn mul(a: &Value, b: &Value) -> Result<Value, ErrorKind> {
    numeric_op(a, b, "multiply", |x, y| numeric_binop(x, y, |a, b| a * b))
}

/// `/` always promotes to `Double`, even for two integers: `1/2` yields
/// `0.5`. Division by zero is `ZeroDivisionError`.
pub fn div(a: &Value, b: &Value) -> Result<Value, ErrorKind> {
    let (x, y) = numeric_operands(a, b, "divide")?;
    if y.is_zero() {
        return Err(ErrorKind::ZeroDivisionError("division by zero".into()));
    }
    Ok(Value::Number(Number::Double(x.as_f64() / y.as_f64())))
}

pub fn modulo(a: &Value, b: &Value) -> Result<Value, ErrorKind> {
    let (x, y) = numeric_operands(a, b, "take the modulo of")?;
    if y.is_zero() {
        return Err(ErrorKind::ZeroDivisionError("modulo by zero".into()));
    }
    Ok(Value::Number(match (x, y) {
        (Number::Integer(a), Number::Integer(b)) => Number::Integer(a % b),
        _ => Number::Double(x.as_f64() % y.as_f64()),
    }))
}

pub fn negate(a: &Value) -> Result<Value, ErrorKind> {
    match a {
        Value::Number(Number::Integer(n)) => Ok(Value::Number(Number::Integer(-n))),
        Value::Number(Number::Double(d)) => Ok(Value::Number(Number::Double(-d))),
        _ => Err(type_error(format!("cannot negate {}", a.kind_name()))),
    }
}

pub fn not(a: &Value) -> Value {
    Value::Boolean(!truthy(a))
}

fn numeric_operands(a: &Value, b: &Value, verb: &str) -> Result<(Number, Number), ErrorKind> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok((*x, *y)),
        _ => Err(type_error(format!(
            "cannot {verb} {} and {}",
            a.kind_name(),
            b.kind_name()
        ))),
    }
}

fn numeric_op(
    a: &Value,
    b: &Value,
    verb: &str,
    f: impl FnOnce(Number, Number) -> Number,
) -> Result<Value, ErrorKind> {
    let (x, y) = numeric_operands(a, b, verb)?;
    Ok(Value::Number(f(x, y)))
}

fn numeric_binop(a: Number, b: Number, f: impl Fn(f64, f64) -> f64) -> Number {
    match (a, b) {
        (Number::Integer(x), Number::Integer(y)) => {
            Number::Integer(f(x as f64, y as f64) as i64)
        }
        _ => Number::Double(f(a.as_f64(), b.as_f64())),
    }
}

/// The kinds `==`/`!=` may compare without raising: pairs outside `{Nil,
/// Number, Boolean, String}` are a `TypeError`. A pairing within this set
/// that differs in kind (e.g. `1 == "1"`) is not an error, just `false`.
fn is_comparable_kind(v: &Value) -> bool {
    matches!(v, Value::Nil | Value::Number(_) | Value::Boolean(_) | Value::String(_))
}

pub fn equals(a: &Value, b: &Value) -> Result<bool, ErrorKind> {
    if !is_comparable_kind(a) || !is_comparable_kind(b) {
        return Err(type_error(format!(
            "cannot compare {} and {} with '=='",
            a.kind_name(),
            b.kind_name()
        )));
    }
    Ok(match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Number(x), Value::Number(y)) => x.numerically_eq(*y),
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        _ => false,
    })
}

pub fn not_equals(a: &Value, b: &Value) -> Result<bool, ErrorKind> {
    equals(a, b).map(|eq| !eq)
}

fn ordered_operands(a: &Value, b: &Value) -> Result<(Number, Number), ErrorKind> {
    numeric_operands(a, b, "compare")
}

pub fn greater_than(a: &Value, b: &Value) -> Result<bool, ErrorKind> {
    let (x, y) = ordered_operands(a, b)?;
    Ok(x.partial_cmp(y) == std::cmp::Ordering::Greater)
}

pub fn greater_equal(a: &Value, b: &Value) -> Result<bool, ErrorKind> {
    let (x, y) = ordered_operands(a, b)?;
    Ok(x.partial_cmp(y) != std::cmp::Ordering::Less)
}

pub fn less_than(a: &Value, b: &Value) -> Result<bool, ErrorKind> {
    let (x, y) = ordered_operands(a, b)?;
    Ok(x.partial_cmp(y) == std::cmp::Ordering::Less)
}

pub fn less_equal(a: &Value, b: &Value) -> Result<bool, ErrorKind> {
    let (x, y) = ordered_operands(a, b)?;
    Ok(x.partial_cmp(y) != std::cmp::Ordering::Greater)
}

/// `arr[idx]`: `arr` must be an `Array`, `idx` an integral `Number` in
/// bounds, or a `TypeError`/`IndexError` is raised.
pub fn index_get(arr: &Value, idx: &Value) -> Result<Value, ErrorKind> {
    let Value::Array(items) = arr else {
        return Err(type_error(format!("cannot subscript a {}", arr.kind_name())));
    };
    let i = integer_index(idx)?;
    let items = items.borrow();
    items.get(i).cloned().ok_or_else(|| {
        ErrorKind::IndexError(format!("index {i} out of bounds (length {})", items.len()))
    })
}

pub fn index_set(arr: &Value, idx: &Value, value: Value) -> Result<(), ErrorKind> {
    let Value::Array(items) = arr else {
        return Err(type_error(format!("cannot subscript a {}", arr.kind_name())));
    };
    let i = integer_index(idx)?;
    let mut items = items.borrow_mut();
    let len = items.len();
    let slot = items
        .get_mut(i)
        .ok_or_else(|| ErrorKind::IndexError(format!("index {i} out of bounds (length {len})")))?;
    *slot = value;
    Ok(())
}

fn integer_index(idx: &Value) -> Result<usize, ErrorKind> {
    match idx {
        Value::Number(Number::Integer(n)) if *n >= 0 => Ok(*n as usize),
        Value::Number(_) => Err(type_error("array index must be a non-negative integer")),
        other => Err(type_error(format!("array index must be a Number, got {}", other.kind_name()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_table_covers_every_kind() {
        assert!(!truthy(&Value::Nil));
        assert!(!truthy(&Value::Boolean(false)));
        assert!(truthy(&Value::Boolean(true)));
        assert!(!truthy(&Value::Number(Number::Integer(0))));
        assert!(truthy(&Value::Number(Number::Integer(1))));
        assert!(!truthy(&Value::string("")));
        assert!(truthy(&Value::string("x")));
        assert!(!truthy(&Value::array(vec![])));
        assert!(truthy(&Value::array(vec![Value::Nil])));
    }

    #[test]
    fn division_always_promotes_to_double() {
        let result = div(&Value::Number(Number::Integer(1)), &Value::Number(Number::Integer(2))).unwrap();
        assert_eq!(result.to_string(), "0.5");
    }

    #[test]
    fn division_by_zero_is_zero_division_error() {
        let err = div(&Value::Number(Number::Integer(1)), &Value::Number(Number::Integer(0))).unwrap_err();
        assert!(matches!(err, ErrorKind::ZeroDivisionError(_)));
    }

    #[test]
    fn modulo_by_zero_is_zero_division_error() {
        let err = modulo(&Value::Number(Number::Integer(1)), &Value::Number(Number::Integer(0))).unwrap_err();
        assert!(matches!(err, ErrorKind::ZeroDivisionError(_)));
    }

    #[test]
    fn cross_numeric_equality_compares_by_value() {
        let int_one = Value::Number(Number::Integer(1));
        let double_one = Value::Number(Number::Double(1.0));
        assert!(equals(&int_one, &double_one).unwrap());
    }

    #[test]
    fn differing_allowed_kinds_compare_false_not_error() {
        let n = Value::Number(Number::Integer(1));
        let s = Value::string("1");
        assert!(!equals(&n, &s).unwrap());
    }

    #[test]
    fn comparing_an_array_with_equals_is_a_type_error() {
        let err = equals(&Value::array(vec![]), &Value::Nil).unwrap_err();
        assert!(matches!(err, ErrorKind::TypeError(_)));
    }

    #[test]
    fn subscripting_a_non_array_is_a_type_error() {
        let err = index_get(&Value::Nil, &Value::Number(Number::Integer(0))).unwrap_err();
        assert!(matches!(err, ErrorKind::TypeError(_)));
    }

    #[test]
    fn out_of_bounds_index_is_an_index_error() {
        let arr = Value::array(vec![Value::Nil]);
        let err = index_get(&arr, &Value::Number(Number::Integer(5))).unwrap_err();
        assert!(matches!(err, ErrorKind::IndexError(_)));
    }

    #[test]
    fn array_display_quotes_nested_strings() {
        let arr = Value::array(vec![Value::string("hi"), Value::Number(Number::Integer(1))]);
        assert_eq!(display_value(&arr), "[\"hi\", 1]");
    }
}
