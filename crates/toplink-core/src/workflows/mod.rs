//! # Workflows Module
//!
//! High-level procedures that tie the core models and matching rules together.
//!
//! ## Overview
//!
//! The crate never searches for template matches itself. An external driver enumerates
//! candidate correspondences between template atoms and molecule atoms; the workflows
//! here decide whether a candidate is valid and carry out its effects on the molecule.
//!
//! ## Architecture
//!
//! - **Link Workflow** ([`link`]) - Validation of a link correspondence, followed by the
//!   link's interaction deletions, interaction additions with computed parameters, new
//!   edges and atom attribute updates.

pub mod link;
