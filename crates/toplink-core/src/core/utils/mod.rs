//! Small numeric helpers shared by the rest of the crate.

pub mod geometry;
