//! # Core Module
//!
//! This module provides the fundamental building blocks for describing molecular
//! topologies and matching force-field templates against them.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atom keys, attribute values, interactions,
//!   molecules and the block/link templates built on them
//! - **Template Rules** ([`forcefield`]) - Link predicates, parameter effectors and the
//!   matching functions that use them
//! - **Derived Structure** ([`topology`]) - Edges, angle and dihedral candidates derived
//!   from interactions, and residue grouping
//! - **Utilities** ([`utils`]) - Geometry primitives used by the effectors
//! - **Errors** ([`error`]) - The error taxonomy shared by every operation
//!
//! ## Key Capabilities
//!
//! - **Insertion-ordered attributed graphs** with an interaction registry per molecule
//! - **Template instantiation** turning a residue block into a concrete molecule
//! - **Append-only composition** of molecules with consistent re-indexing
//! - **Pure matching** of interactions and attribute sets against templates

pub mod error;
pub mod forcefield;
pub mod models;
pub mod topology;
pub mod utils;
