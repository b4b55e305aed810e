//! # toplink Core Library
//!
//! A library for describing molecular topologies as attributed graphs and applying
//! force-field block and link templates to them.
//!
//! ## Architectural Philosophy
//!
//! The library is split into two layers to keep data and procedures apart.
//!
//! - **[`core`]: The Foundation.** Contains the graph data model (`Molecule`, `Block`, `Link`),
//!   the interaction registry, the closed predicate and effector vocabularies, the pure
//!   matching functions, and small geometry and residue-grouping utilities.
//!
//! - **[`workflows`]: The Public API.** Ties the `core` pieces together into complete
//!   procedures, such as validating a candidate link correspondence and applying the link's
//!   deletions, additions and parameter resolution to a molecule.
//!
//! The library performs no I/O and never searches for matches itself: an external driver
//! enumerates candidate correspondences and calls into this crate to validate and apply them.

pub mod core;
pub mod workflows;
