use crate::core::forcefield::predicate::LinkPredicate;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// String-keyed attribute set carried by atoms, interactions and molecules.
pub type Attributes = BTreeMap<String, Value>;

static UNDEFINED: Value = Value::Undefined;

/// A single attribute or parameter value.
///
/// Values are opaque to the graph; only the matching functions interpret them.
/// `Undefined` is the explicit "no value" sentinel, and a key missing from an
/// [`Attributes`] map reads as `Undefined` (see [`lookup`]). `Predicate` only
/// carries meaning inside template attribute sets, where it replaces the
/// default equality test.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Undefined,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Position(Point3<f64>),
    List(Vec<Value>),
    Predicate(Box<LinkPredicate>),
}

impl Value {
    /// Truthiness used by metadata flags such as `edge` and `version`.
    ///
    /// `Undefined`, `false`, zero, and empty strings or lists are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Position(_) | Self::Predicate(_) => true,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_position(&self) -> Option<&Point3<f64>> {
        match self {
            Self::Position(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_predicate(&self) -> Option<&LinkPredicate> {
        match self {
            Self::Predicate(p) => Some(p),
            _ => None,
        }
    }
}

/// Integers and floats compare numerically; every other pairing compares
/// structurally within the same variant.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => *a as f64 == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Position(a), Self::Position(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Predicate(a), Self::Predicate(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Str(s) => write!(f, "{}", s),
            Self::Position(p) => write!(f, "({}, {}, {})", p.x, p.y, p.z),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::Predicate(p) => write!(f, "{}", p),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Point3<f64>> for Value {
    fn from(p: Point3<f64>) -> Self {
        Self::Position(p)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<LinkPredicate> for Value {
    fn from(p: LinkPredicate) -> Self {
        Self::Predicate(Box::new(p))
    }
}

/// Reads `key` from `attributes`, treating a missing key as [`Value::Undefined`].
pub fn lookup<'a>(attributes: &'a Attributes, key: &str) -> &'a Value {
    attributes.get(key).unwrap_or(&UNDEFINED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_and_floats_compare_numerically() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_eq!(Value::Float(2.0), Value::Int(2));
        assert_ne!(Value::Int(2), Value::Float(2.5));
    }

    #[test]
    fn different_variants_are_not_equal() {
        assert_ne!(Value::from("1"), Value::Int(1));
        assert_ne!(Value::Bool(true), Value::Int(1));
        assert_ne!(Value::Undefined, Value::Int(0));
    }

    #[test]
    fn truthiness_follows_emptiness_and_zero() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Int(2).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::from(Point3::origin()).is_truthy());
    }

    #[test]
    fn lookup_reads_missing_keys_as_undefined() {
        let mut attributes = Attributes::new();
        attributes.insert("resid".to_string(), Value::Int(4));
        assert_eq!(lookup(&attributes, "resid"), &Value::Int(4));
        assert!(lookup(&attributes, "resname").is_undefined());
    }

    #[test]
    fn as_float_widens_integers() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::from("3").as_float(), None);
    }

    #[test]
    fn display_renders_lists_and_positions() {
        let list = Value::List(vec![Value::Int(1), Value::from("a")]);
        assert_eq!(list.to_string(), "[1, a]");
        assert_eq!(
            Value::from(Point3::new(1.0, 2.0, 3.0)).to_string(),
            "(1, 2, 3)"
        );
    }
}
