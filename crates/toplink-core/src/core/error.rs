//! Error types for topology construction, matching and composition.
//!
//! Every fallible operation of the crate reports one [`TopologyError`] variant.
//! All failures are synchronous and carry the keys or values needed to tell
//! them apart; aggregation and reporting are left to the caller.

use super::models::ids::AtomKey;
use thiserror::Error;

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Errors that can occur while building, matching or merging topologies.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TopologyError {
    /// An operation referenced an atom that is not a node of the graph.
    #[error("unknown atom {key}")]
    AtomNotFound { key: AtomKey },

    /// An effector was created with the wrong number of atom keys.
    #[error("{effector} expects {expected} atom keys, but {found} were provided")]
    InvalidArity {
        effector: &'static str,
        expected: usize,
        found: usize,
    },

    /// A required attribute is absent from an atom.
    ///
    /// `atom` is `None` when the atom has no key yet.
    #[error("atom {} has no '{attribute}' attribute", describe_atom(.atom))]
    MissingAttribute {
        atom: Option<AtomKey>,
        attribute: String,
    },

    /// An attribute exists but holds a value of the wrong kind.
    ///
    /// `atom` is `None` when the atom has no key yet.
    #[error("attribute '{attribute}' of atom {} is not {expected}", describe_atom(.atom))]
    InvalidAttributeType {
        atom: Option<AtomKey>,
        attribute: String,
        expected: &'static str,
    },

    /// A template key has no counterpart in the match correspondence.
    #[error("template atom {key} is not part of the correspondence")]
    UnresolvedKey { key: AtomKey },

    /// No interaction satisfied the removal criteria.
    #[error("cannot find a matching interaction of type '{interaction_type}' between atoms {atoms:?}")]
    NoMatchFound {
        interaction_type: String,
        atoms: Vec<AtomKey>,
    },

    /// Merged molecules are described with different force fields.
    #[error("cannot merge molecules with different force fields ({expected:?} vs {found:?})")]
    ForceFieldMismatch {
        expected: Option<String>,
        found: Option<String>,
    },

    /// Merged molecules disagree on the exclusion distance.
    #[error("cannot merge molecules with different nrexcl ({expected:?} vs {found:?})")]
    NrexclMismatch {
        expected: Option<u32>,
        found: Option<u32>,
    },

    /// An interaction type name is outside the known vocabulary.
    #[error("unknown interaction type '{0}'")]
    UnknownInteractionType(String),

    /// A numeric format specification could not be parsed.
    #[error("invalid number format '{0}'")]
    InvalidFormat(String),
}

fn describe_atom(atom: &Option<AtomKey>) -> String {
    match atom {
        Some(key) => key.to_string(),
        None => "<unnamed>".to_string(),
    }
}
