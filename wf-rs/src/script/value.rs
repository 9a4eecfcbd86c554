//! Runtime value type for workflow variables.
//!
//! Scalars coerce freely between numbers and strings the way shell-ish
//! scripts expect; `List` and `Map` hold structured backend payloads.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A value bound in the workflow scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Str(String::new())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            // Structured values print as compact JSON.
            Value::List(_) | Value::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                write!(f, "{json}")
            }
        }
    }
}

impl Value {
    /// Truthiness: `false`, `0`, `""`, `"0"`, `"false"` and empty
    /// collections are falsy.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false"),
            Value::List(items) => !items.is_empty(),
            Value::Map(fields) => !fields.is_empty(),
        }
    }

    /// Numeric view, if this value is (or parses as) a number.
    pub fn as_number(&self) -> Option<f64> {
        self.as_num().map(Num::to_f64)
    }

    fn as_num(&self) -> Option<Num> {
        match self {
            Value::Int(n) => Some(Num::Int(*n)),
            Value::Float(x) => Some(Num::Float(*x)),
            Value::Str(s) => parse_number(s),
            Value::Bool(_) | Value::List(_) | Value::Map(_) => None,
        }
    }

    /// Name of the type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "real",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Look up a field of a `Map`, or an index of a `List` given as digits.
    pub fn field(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(fields) => fields.get(key),
            Value::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    // ── Arithmetic helpers ────────────────────────────────────────────────────

    fn numeric_pair(&self, rhs: &Value, op: &str) -> Result<(Num, Num), String> {
        match (self.as_num(), rhs.as_num()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(format!(
                "cannot apply '{op}' to {} and {}",
                self.type_name(),
                rhs.type_name()
            )),
        }
    }

    /// Integer operands use checked `int_op`; anything else goes through
    /// `f64`.
    fn arith(
        &self,
        rhs: &Value,
        op: &str,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Result<Value, String> {
        match self.numeric_pair(rhs, op)? {
            (Num::Int(a), Num::Int(b)) => int_op(a, b)
                .map(Value::Int)
                .ok_or_else(|| format!("integer overflow in {a} {op} {b}")),
            (a, b) => Ok(Value::Float(float_op(a.to_f64(), b.to_f64()))),
        }
    }

    pub fn arith_add(&self, rhs: &Value) -> Result<Value, String> {
        self.arith(rhs, "+", i64::checked_add, |a, b| a + b)
    }

    pub fn arith_sub(&self, rhs: &Value) -> Result<Value, String> {
        self.arith(rhs, "-", i64::checked_sub, |a, b| a - b)
    }

    pub fn arith_mul(&self, rhs: &Value) -> Result<Value, String> {
        self.arith(rhs, "*", i64::checked_mul, |a, b| a * b)
    }

    pub fn arith_div(&self, rhs: &Value) -> Result<Value, String> {
        if self.numeric_pair(rhs, "/")?.1.is_zero() {
            return Err("division by zero".into());
        }
        self.arith(rhs, "/", i64::checked_div, |a, b| a / b)
    }

    pub fn arith_rem(&self, rhs: &Value) -> Result<Value, String> {
        if self.numeric_pair(rhs, "%")?.1.is_zero() {
            return Err("modulo by zero".into());
        }
        self.arith(rhs, "%", i64::checked_rem, |a, b| a % b)
    }

    pub fn arith_neg(&self) -> Result<Value, String> {
        match self.as_num() {
            Some(Num::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| format!("integer overflow in -({n})")),
            Some(Num::Float(x)) => Ok(Value::Float(-x)),
            None => Err(format!("cannot negate {}", self.type_name())),
        }
    }

    /// Equality used by `=`/`==`: numeric when both sides are numbers,
    /// otherwise structural, with scalars compared by their text.
    pub fn loose_eq(&self, rhs: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_num(), rhs.as_num()) {
            return a == b;
        }
        match (self, rhs) {
            (Value::List(_) | Value::Map(_), _) | (_, Value::List(_) | Value::Map(_)) => {
                self == rhs
            }
            _ => self.to_string() == rhs.to_string(),
        }
    }

    /// Ordering used by `<`, `<=`, `>`, `>=`.  Numbers compare numerically,
    /// strings lexically; anything else is incomparable.
    pub fn cmp_value(&self, rhs: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_num(), rhs.as_num()) {
            return a.partial_cmp(&b);
        }
        match (self, rhs) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::default(),
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(fields) => {
                Value::Map(fields.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Interpret a textual setting as a number when it looks like one.
pub fn parse_scalar(s: &str) -> Value {
    let t = s.trim();
    match parse_number(t) {
        Some(Num::Int(n)) => Value::Int(n),
        Some(Num::Float(x)) => Value::Float(x),
        None if t == "true" || t == "false" => Value::Bool(t == "true"),
        None => Value::Str(s.to_owned()),
    }
}

// ── Numbers ───────────────────────────────────────────────────────────────────

/// A numeric operand.  Integers stay exact until a float joins in.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn to_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(x) => x,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::Int(n) => n == 0,
            Num::Float(x) => x == 0.0,
        }
    }
}

impl PartialEq for Num {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Num {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (*self, *other) {
            (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
        }
    }
}

/// Parse decimal number text.  Words `f64` also accepts (`nan`, `inf`,
/// `infinity`) and non-finite results stay text.
fn parse_number(s: &str) -> Option<Num> {
    let t = s.trim();
    if !t.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Ok(n) = t.parse::<i64>() {
        return Some(Num::Int(n));
    }
    t.parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .map(Num::Float)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
