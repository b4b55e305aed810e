//! # Force Field Rules Module
//!
//! Template rules that force fields attach to blocks and links, and the pure
//! functions that evaluate them against a concrete molecule.
//!
//! ## Key Components
//!
//! - [`predicate`] - Attribute comparison rules usable in place of exact values
//! - [`effector`] - Interaction parameters computed from atom positions
//! - [`matching`] - Attribute-set and interaction matching against templates
//!
//! None of these functions mutate the molecule or the template they inspect.

pub mod effector;
pub mod matching;
pub mod predicate;
