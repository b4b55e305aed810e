use super::block::Block;
use super::ids::AtomKey;
use super::interaction::DeleteInteraction;
use super::value::Attributes;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// The constraints and side effects a link adds on top of its template graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPattern {
    /// Atom pairs that must *not* be bonded for the link to apply.
    pub non_edges: Vec<(AtomKey, AtomKey)>,
    /// Interactions, per type, that applying the link deletes.
    pub removed_interactions: BTreeMap<String, Vec<DeleteInteraction>>,
    /// Constraints on the molecule-level metadata.
    pub molecule_meta: Attributes,
    /// Alternative atom patterns, passed through to the match driver.
    pub patterns: Vec<Vec<(AtomKey, Attributes)>>,
    /// Feature names the link is conditional on, passed through to the match driver.
    pub features: Vec<String>,
}

/// A cross-residue template that adds, removes or parametrizes interactions.
///
/// The template graph (atoms with attribute constraints, edges, interactions
/// to add) is a [`Block`] and is reachable through `Deref`; the pattern-only
/// data lives in [`Link::pattern`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Link {
    template: Block,
    pub pattern: LinkPattern,
}

impl Link {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            template: Block::named(name),
            pattern: LinkPattern::default(),
        }
    }

    pub fn from_parts(template: Block, pattern: LinkPattern) -> Self {
        Self { template, pattern }
    }

    pub fn template(&self) -> &Block {
        &self.template
    }

    pub fn non_edges(&self) -> &[(AtomKey, AtomKey)] {
        &self.pattern.non_edges
    }

    pub fn add_non_edge(&mut self, a: impl Into<AtomKey>, b: impl Into<AtomKey>) {
        self.pattern.non_edges.push((a.into(), b.into()));
    }

    /// Registers an interaction the link deletes when applied.
    ///
    /// Atom keys refer to link atoms but are not required to be nodes.
    pub fn add_removed_interaction(&mut self, interaction_type: &str, interaction: DeleteInteraction) {
        self.pattern
            .removed_interactions
            .entry(interaction_type.to_string())
            .or_default()
            .push(interaction);
    }

    pub fn removed_interactions(&self, interaction_type: &str) -> &[DeleteInteraction] {
        self.pattern
            .removed_interactions
            .get(interaction_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn molecule_meta(&self) -> &Attributes {
        &self.pattern.molecule_meta
    }
}

impl Deref for Link {
    type Target = Block;

    fn deref(&self) -> &Block {
        &self.template
    }
}

impl DerefMut for Link {
    fn deref_mut(&mut self) -> &mut Block {
        &mut self.template
    }
}
