use crate::core::models::value::{Attributes, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison rule usable in place of an exact value in a template attribute set.
///
/// By default a template attribute matches a molecule attribute when both values
/// are equal. Some correspondences must be broader for a link to be usable; those
/// are expressed by storing a predicate as the template value. The set of rules is
/// fixed by the force-field vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LinkPredicate {
    /// The attribute must be defined and be one of the listed values.
    Choice(Vec<Value>),
    /// The attribute must be absent, or differ from the reference value.
    ///
    /// When the reference is [`Value::Undefined`], an attribute explicitly set to
    /// `Undefined` does not pass; only true absence does.
    NotDefinedOrNot(Value),
}

impl LinkPredicate {
    /// Applies the rule to `attributes[key]`.
    pub fn matches(&self, attributes: &Attributes, key: &str) -> bool {
        match self {
            Self::Choice(values) => attributes
                .get(key)
                .is_some_and(|value| values.contains(value)),
            Self::NotDefinedOrNot(reference) => attributes
                .get(key)
                .is_none_or(|value| value != reference),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Choice(_) => "Choice",
            Self::NotDefinedOrNot(_) => "NotDefinedOrNot",
        }
    }
}

impl fmt::Display for LinkPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Choice(values) => {
                write!(f, "<{} value={}>", self.name(), Value::List(values.clone()))
            }
            Self::NotDefinedOrNot(value) => write!(f, "<{} value={}>", self.name(), value),
        }
    }
}
