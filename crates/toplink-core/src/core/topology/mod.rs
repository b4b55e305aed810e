//! # Topology Module
//!
//! Structural derivations over a molecule graph.
//!
//! ## Key Components
//!
//! - [`connectivity`] - Edges derived from interactions, and angle and dihedral
//!   candidates derived from edges
//! - [`residues`] - Grouping of atoms into residues
//!
//! Both modules extend [`Molecule`](crate::core::models::molecule::Molecule) with
//! additional methods rather than introducing new types.

pub mod connectivity;
pub mod residues;
