//! # Core Models Module
//!
//! This module contains the data structures used to describe molecular topologies
//! and the force-field templates applied to them.
//!
//! ## Overview
//!
//! A topology is an attributed, undirected graph of atoms together with a registry of
//! typed interactions (bonds, angles, dihedrals, ...) over ordered atom tuples. The same
//! graph substrate carries three roles:
//!
//! - **Instances** - concrete molecules keyed by sequential integer ids
//! - **Residue templates** - blocks keyed by atom names, instantiated into molecules
//! - **Link templates** - cross-residue patterns that add, remove or parametrize
//!   interactions at residue junctions
//!
//! ## Key Components
//!
//! - [`ids`] - Atom keys and template-to-molecule correspondences
//! - [`value`] - The closed attribute value type and attribute maps
//! - [`interaction`] - Interactions, interactions to delete, and the per-type registry
//! - [`molecule`] - The graph substrate, interaction bookkeeping and merging
//! - [`block`] - Residue templates and their instantiation options
//! - [`link`] - Link templates with their pattern constraints
//!
//! ## Usage
//!
//! ```ignore
//! use toplink::core::models::block::{Block, InstantiateOptions};
//!
//! let mut block = Block::named("ALA");
//! block.add_atom(atom("BB"))?;
//! block.add_atom(atom("SC1"))?;
//! block.add_interaction("bonds", vec!["BB".into(), "SC1".into()], vec![], Default::default())?;
//! block.make_edges_from_interactions();
//!
//! let mut molecule = block.to_molecule(&InstantiateOptions::default())?;
//! molecule.merge_molecule(&block.to_molecule(&InstantiateOptions::default())?)?;
//! ```

pub mod block;
pub mod ids;
pub mod interaction;
pub mod link;
pub mod molecule;
pub mod value;
