use std::{fmt, rc::Rc};

use crate::{
    error::Result,
    memory::{Gc, Trace, Visitor},
    object::Object,
    vm::VM,
};

/// Host function usable as an accessor. Receives the `this` value and the
/// call arguments.
#[derive(Clone, Copy)]
pub struct NativeFunction(pub fn(&mut VM, Value, &[Value]) -> Result<Value>);

impl NativeFunction {
    pub fn call(self, vm: &mut VM, this: Value, args: &[Value]) -> Result<Value> {
        (self.0)(vm, this, args)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.0 as usize == other.0 as usize
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native {:#x}>", self.0 as usize)
    }
}

#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Int32(i32),
    Number(f64),
    Str(Rc<str>),
    Object(Gc<Object>),
    Native(NativeFunction),
    /// Hole marker. Never observable by script code.
    Empty,
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Int32(_) | Self::Number(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Native(_))
    }

    pub fn from_u32(value: u32) -> Self {
        match i32::try_from(value) {
            Ok(int) => Self::Int32(int),
            Err(_) => Self::Number(f64::from(value)),
        }
    }

    pub fn from_f64(value: f64) -> Self {
        let int = value as i32;
        if f64::from(int) == value && !(value == 0.0 && value.is_sign_negative()) {
            Self::Int32(int)
        } else {
            Self::Number(value)
        }
    }

    pub fn string(s: &str) -> Self {
        Self::Str(Rc::from(s))
    }

    pub fn as_object(&self) -> Option<Gc<Object>> {
        match self {
            Self::Object(object) => Some(*object),
            _ => None,
        }
    }

    /// ToNumber for primitives. Objects yield NaN since ToPrimitive needs an
    /// interpreter.
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined | Self::Empty => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Int32(int) => f64::from(*int),
            Self::Number(number) => *number,
            Self::Str(s) => string_to_number(s),
            Self::Object(_) | Self::Native(_) => f64::NAN,
        }
    }

    /// SameValue: like `===`, except NaN equals NaN and `+0` differs from `-0`.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined)
            | (Self::Null, Self::Null)
            | (Self::Empty, Self::Empty) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Native(a), Self::Native(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => {
                let (x, y) = (a.to_number(), b.to_number());
                if x.is_nan() && y.is_nan() {
                    return true;
                }
                x == y && x.is_sign_negative() == y.is_sign_negative()
            }
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Undefined
    }
}

impl From<i32> for Value {
    fn from(int: i32) -> Self {
        Self::Int32(int)
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Self::Number(number)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Gc<Object>> for Value {
    fn from(object: Gc<Object>) -> Self {
        Self::Object(object)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int32(int) => write!(f, "{}", int),
            Self::Number(number) => write!(f, "{}", number),
            Self::Str(s) => write!(f, "{:?}", s),
            Self::Object(object) => write!(f, "object({:?})", object),
            Self::Native(native) => write!(f, "{:?}", native),
            Self::Empty => write!(f, "<empty>"),
        }
    }
}

impl Trace for Value {
    fn trace(&self, visitor: &mut dyn Visitor) {
        if let Self::Object(object) = self {
            visitor.visit_object(*object);
        }
    }
}

/// ECMAScript ToUint32.
pub fn to_uint32(number: f64) -> u32 {
    if !number.is_finite() {
        return 0;
    }
    number.trunc().rem_euclid(4294967296.0) as u32
}

fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    let radix = match s.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &s[2..];
        if digits.is_empty() {
            return f64::NAN;
        }
        let mut result = 0.0f64;
        for c in digits.chars() {
            match c.to_digit(radix) {
                Some(digit) => result = result * f64::from(radix) + f64::from(digit),
                None => return f64::NAN,
            }
        }
        return result;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    // `str::parse` also accepts "inf" and "nan", which are not numeric literals.
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}
