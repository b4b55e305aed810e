use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies an atom within a single graph.
///
/// Instantiated molecules use sequential integer ids while templates refer to
/// their atoms by name. Integer keys sort before named keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AtomKey {
    Index(u64),
    Name(String),
}

impl AtomKey {
    pub fn as_index(&self) -> Option<u64> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Index(_) => None,
            Self::Name(name) => Some(name),
        }
    }
}

impl From<u64> for AtomKey {
    fn from(index: u64) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for AtomKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for AtomKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for AtomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{}", index),
            Self::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Maps template atom keys to molecule atom keys.
pub type Correspondence = std::collections::HashMap<AtomKey, AtomKey>;
