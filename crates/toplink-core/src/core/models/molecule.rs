use super::ids::{AtomKey, Correspondence};
use super::interaction::{
    Interaction, InteractionKind, InteractionRegistry, InteractionTemplate, Parameter,
    meta_version,
};
use super::value::{Attributes, Value};
use crate::core::error::{Result, TopologyError};
use crate::core::forcefield::matching::{attributes_match, interaction_match};
use petgraph::graph::UnGraph;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument, trace, warn};

pub(crate) const RESID_ATTRIBUTE: &str = "resid";
pub(crate) const CHARGE_GROUP_ATTRIBUTE: &str = "charge_group";

#[derive(Debug, Clone, PartialEq)]
struct Node {
    key: AtomKey,
    attributes: Attributes,
}

/// An attributed, undirected molecule graph with its interaction registry.
///
/// Atoms are stored in insertion order and addressed by [`AtomKey`]. Edges carry
/// no attributes. Every interaction refers only to atoms that exist as nodes.
/// The same structure is the substrate of the [`Block`](super::block::Block) and
/// [`Link`](super::link::Link) templates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    /// Primary node storage, in insertion order.
    nodes: Vec<Node>,
    /// Lookup from atom key to its position in `nodes`.
    node_index: HashMap<AtomKey, usize>,
    /// Neighbor positions per node, in edge insertion order.
    adjacency: Vec<Vec<usize>>,
    /// Edges as node position pairs, in insertion order.
    edges: Vec<(usize, usize)>,
    interactions: InteractionRegistry,
    force_field: Option<String>,
    nrexcl: Option<u32>,
    /// Free-form molecule-level metadata.
    pub meta: Attributes,
}

impl Molecule {
    /// Creates a new, empty molecule with no force field and no exclusion distance.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force_field(mut self, force_field: impl Into<String>) -> Self {
        self.force_field = Some(force_field.into());
        self
    }

    pub fn with_nrexcl(mut self, nrexcl: u32) -> Self {
        self.nrexcl = Some(nrexcl);
        self
    }

    /// The name of the force field the molecule is described for.
    pub fn force_field(&self) -> Option<&str> {
        self.force_field.as_deref()
    }

    pub fn set_force_field(&mut self, force_field: Option<String>) {
        self.force_field = force_field;
    }

    /// The exclusion distance, in bonds.
    pub fn nrexcl(&self) -> Option<u32> {
        self.nrexcl
    }

    pub fn set_nrexcl(&mut self, nrexcl: Option<u32>) {
        self.nrexcl = nrexcl;
    }

    /// Number of atoms (nodes) in the molecule.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, key: &AtomKey) -> bool {
        self.node_index.contains_key(key)
    }

    /// Adds an atom, or merges `attributes` into an existing atom with the same key.
    ///
    /// Existing atoms keep their position in the insertion order.
    pub fn add_node(&mut self, key: impl Into<AtomKey>, attributes: Attributes) {
        let key = key.into();
        match self.node_index.get(&key) {
            Some(&position) => self.nodes[position].attributes.extend(attributes),
            None => {
                self.node_index.insert(key.clone(), self.nodes.len());
                self.nodes.push(Node { key, attributes });
                self.adjacency.push(Vec::new());
            }
        }
    }

    /// The attributes of an atom, or `None` if the key is unknown.
    pub fn node(&self, key: &AtomKey) -> Option<&Attributes> {
        self.node_index
            .get(key)
            .map(|&position| &self.nodes[position].attributes)
    }

    pub fn node_mut(&mut self, key: &AtomKey) -> Option<&mut Attributes> {
        let position = *self.node_index.get(key)?;
        Some(&mut self.nodes[position].attributes)
    }

    /// Atom keys in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &AtomKey> {
        self.nodes.iter().map(|node| &node.key)
    }

    /// `(key, attributes)` pairs in insertion order.
    pub fn atoms(&self) -> impl Iterator<Item = (&AtomKey, &Attributes)> {
        self.nodes.iter().map(|node| (&node.key, &node.attributes))
    }

    /// Adds an undirected edge, creating placeholder atoms for unknown endpoints.
    ///
    /// Placeholders have an empty attribute set. Self-loops and duplicate edges
    /// are ignored.
    ///
    /// # Return
    ///
    /// `true` if a new edge was stored.
    pub fn add_edge(&mut self, a: impl Into<AtomKey>, b: impl Into<AtomKey>) -> bool {
        let (a, b) = (a.into(), b.into());
        if a == b {
            warn!(atom = %a, "Ignoring self-loop edge.");
            return false;
        }
        let i = self.ensure_node(a);
        let j = self.ensure_node(b);
        if self.adjacency[i].contains(&j) {
            return false;
        }
        self.adjacency[i].push(j);
        self.adjacency[j].push(i);
        self.edges.push((i, j));
        true
    }

    fn ensure_node(&mut self, key: AtomKey) -> usize {
        if let Some(&position) = self.node_index.get(&key) {
            return position;
        }
        self.add_node(key, Attributes::new());
        self.nodes.len() - 1
    }

    pub fn has_edge(&self, a: &AtomKey, b: &AtomKey) -> bool {
        match (self.node_index.get(a), self.node_index.get(b)) {
            (Some(&i), Some(&j)) => self.adjacency[i].contains(&j),
            _ => false,
        }
    }

    /// Edges in insertion order, each reported with its endpoints as inserted.
    pub fn edges(&self) -> impl Iterator<Item = (&AtomKey, &AtomKey)> {
        self.edges
            .iter()
            .map(|&(i, j)| (&self.nodes[i].key, &self.nodes[j].key))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Neighbors of an atom in edge insertion order; empty for unknown atoms.
    pub fn neighbors<'a>(&'a self, key: &AtomKey) -> impl Iterator<Item = &'a AtomKey> + 'a {
        self.node_index
            .get(key)
            .into_iter()
            .flat_map(move |&i| self.adjacency[i].iter().map(move |&j| &self.nodes[j].key))
    }

    /// The full interaction registry.
    pub fn interactions(&self) -> &InteractionRegistry {
        &self.interactions
    }

    /// Registered interaction type names, in first-use order.
    pub fn interaction_types(&self) -> impl Iterator<Item = &str> {
        self.interactions.types()
    }

    fn check_atoms(&self, atoms: &[AtomKey]) -> Result<()> {
        match atoms.iter().find(|atom| !self.contains(atom)) {
            Some(missing) => Err(TopologyError::AtomNotFound {
                key: missing.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Appends an interaction of `interaction_type`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::AtomNotFound`] if any atom is not a node; the
    /// registry is left untouched in that case.
    pub fn add_interaction(
        &mut self,
        interaction_type: &str,
        atoms: Vec<AtomKey>,
        parameters: Vec<Parameter>,
        meta: Attributes,
    ) -> Result<()> {
        self.check_atoms(&atoms)?;
        self.interactions
            .get_mut(interaction_type)
            .push(Interaction::new(atoms, parameters, meta));
        Ok(())
    }

    /// Replaces the interaction with the same atoms and `version`, or appends a new one.
    ///
    /// The version is read from `meta["version"]` and defaults to `0` on both
    /// sides. A replaced interaction keeps its position in the list.
    pub fn add_or_replace_interaction(
        &mut self,
        interaction_type: &str,
        atoms: Vec<AtomKey>,
        parameters: Vec<Parameter>,
        meta: Attributes,
    ) -> Result<()> {
        self.check_atoms(&atoms)?;
        let version = meta_version(&meta);
        let list = self.interactions.get_mut(interaction_type);
        let existing = list
            .iter()
            .position(|interaction| interaction.atoms == atoms && interaction.version() == version);
        let new_interaction = Interaction::new(atoms, parameters, meta);
        match existing {
            Some(position) => list[position] = new_interaction,
            None => list.push(new_interaction),
        }
        Ok(())
    }

    /// The interactions of `interaction_type`, empty if the type is unused.
    pub fn get_interaction(&self, interaction_type: &str) -> &[Interaction] {
        self.interactions.get(interaction_type)
    }

    /// Live, mutable access to the list of `interaction_type`.
    ///
    /// Callers are responsible for keeping the atoms of edited interactions in the graph.
    pub fn get_interaction_mut(&mut self, interaction_type: &str) -> &mut Vec<Interaction> {
        self.interactions.get_mut(interaction_type)
    }

    /// Removes the first interaction with the given atoms.
    ///
    /// Only interactions whose stored `version` metadata is truthy are
    /// candidates, so an interaction with the default version `0` is never
    /// removed. `version` only appears in the error.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NoMatchFound`] when no candidate exists.
    pub fn remove_interaction(
        &mut self,
        interaction_type: &str,
        atoms: &[AtomKey],
        version: &Value,
    ) -> Result<Interaction> {
        // TODO: compare the stored version against `version` once versionless
        // interactions no longer need to be immune to removal.
        let list = self.interactions.get_mut(interaction_type);
        let position = list
            .iter()
            .position(|interaction| {
                interaction.atoms == atoms && interaction.version().is_truthy()
            })
            .ok_or_else(|| TopologyError::NoMatchFound {
                interaction_type: interaction_type.to_string(),
                atoms: atoms.to_vec(),
            })?;
        trace!(%interaction_type, %version, "Removing interaction.");
        Ok(list.remove(position))
    }

    /// Removes the first interaction of `interaction_type` that matches `template`.
    ///
    /// Matching follows [`interaction_match`].
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NoMatchFound`] when nothing matches.
    pub fn remove_matching_interaction<T>(
        &mut self,
        interaction_type: &str,
        template: &T,
    ) -> Result<Interaction>
    where
        T: InteractionTemplate + ?Sized,
    {
        let position = self
            .get_interaction(interaction_type)
            .iter()
            .position(|interaction| interaction_match(self, interaction, template))
            .ok_or_else(|| TopologyError::NoMatchFound {
                interaction_type: interaction_type.to_string(),
                atoms: template.atoms().to_vec(),
            })?;
        Ok(self.interactions.get_mut(interaction_type).remove(position))
    }

    /// The interactions of a kind from the known vocabulary.
    pub fn interactions_of(&self, kind: InteractionKind) -> &[Interaction] {
        self.get_interaction(kind.as_str())
    }

    pub fn add_interaction_of(
        &mut self,
        kind: InteractionKind,
        atoms: Vec<AtomKey>,
        parameters: Vec<Parameter>,
        meta: Attributes,
    ) -> Result<()> {
        self.add_interaction(kind.as_str(), atoms, parameters, meta)
    }

    pub fn bonds(&self) -> &[Interaction] {
        self.interactions_of(InteractionKind::Bonds)
    }

    pub fn angles(&self) -> &[Interaction] {
        self.interactions_of(InteractionKind::Angles)
    }

    pub fn dihedrals(&self) -> &[Interaction] {
        self.interactions_of(InteractionKind::Dihedrals)
    }

    pub fn impropers(&self) -> &[Interaction] {
        self.interactions_of(InteractionKind::Impropers)
    }

    /// Keys of the atoms whose attributes match `template`, in insertion order.
    pub fn find_atoms<'a>(
        &'a self,
        template: &'a Attributes,
    ) -> impl Iterator<Item = &'a AtomKey> + 'a {
        self.nodes
            .iter()
            .filter(move |node| attributes_match(&node.attributes, template, &[]))
            .map(|node| &node.key)
    }

    /// All edges with one end in `first` and the other in `second`.
    ///
    /// Each pair is reported as `(atom from first, atom from second)`.
    pub fn edges_between(&self, first: &[AtomKey], second: &[AtomKey]) -> Vec<(AtomKey, AtomKey)> {
        first
            .iter()
            .flat_map(|a| second.iter().map(move |b| (a, b)))
            .filter(|(a, b)| self.has_edge(a, b))
            .map(|(a, b)| (a.clone(), b.clone()))
            .collect()
    }

    /// A new molecule restricted to `keys`.
    ///
    /// Keeps the selected atoms in their original order, the edges between them,
    /// and the interactions whose atoms are all selected. Force field, exclusion
    /// distance and metadata are copied.
    pub fn subgraph(&self, keys: &[AtomKey]) -> Molecule {
        let selected: HashSet<&AtomKey> = keys.iter().filter(|key| self.contains(key)).collect();
        let mut sub = Molecule {
            force_field: self.force_field.clone(),
            nrexcl: self.nrexcl,
            meta: self.meta.clone(),
            ..Molecule::default()
        };
        for node in self.nodes.iter().filter(|node| selected.contains(&node.key)) {
            sub.add_node(node.key.clone(), node.attributes.clone());
        }
        for (a, b) in self.edges() {
            if selected.contains(a) && selected.contains(b) {
                sub.add_edge(a.clone(), b.clone());
            }
        }
        for (interaction_type, list) in self.interactions.iter() {
            for interaction in list {
                if interaction.atoms.iter().all(|atom| selected.contains(atom)) {
                    sub.interactions
                        .get_mut(interaction_type)
                        .push(interaction.clone());
                }
            }
        }
        sub
    }

    fn to_petgraph(&self) -> UnGraph<(), ()> {
        let mut graph = UnGraph::with_capacity(self.nodes.len(), self.edges.len());
        let indices: Vec<_> = self.nodes.iter().map(|_| graph.add_node(())).collect();
        for &(i, j) in &self.edges {
            graph.add_edge(indices[i], indices[j], ());
        }
        graph
    }

    /// Best-effort test that two molecules describe the same molecule type.
    ///
    /// Only the graph structure is compared; attributes and interactions are not.
    pub fn share_moltype_with(&self, other: &Molecule) -> bool {
        self.len() == other.len()
            && self.edge_count() == other.edge_count()
            && petgraph::algo::is_isomorphic(&self.to_petgraph(), &other.to_petgraph())
    }

    /// Appends `other` at the end of this molecule.
    ///
    /// Atoms of `other` receive consecutive integer keys after the largest
    /// integer key of this molecule, and their `resid` and `charge_group` are
    /// offset by those of this molecule's last atom (both default to 1).
    /// Interactions are remapped and appended; edges are remapped, skipping
    /// any that would become self-loops.
    ///
    /// An empty molecule adopts the exclusion distance of `other`.
    ///
    /// # Return
    ///
    /// The correspondence from the keys of `other` to their new keys.
    ///
    /// # Errors
    ///
    /// - [`TopologyError::ForceFieldMismatch`] if the force fields differ.
    /// - [`TopologyError::NrexclMismatch`] if the exclusion distances differ.
    /// - [`TopologyError::InvalidAttributeType`] if a `resid` or `charge_group` is not an integer.
    /// - [`TopologyError::AtomNotFound`] if an interaction of `other` refers to an atom it lacks.
    ///
    /// All checks happen before this molecule is modified.
    #[instrument(skip_all, fields(incoming_atoms = other.len()))]
    pub fn merge_molecule(&mut self, other: &Molecule) -> Result<Correspondence> {
        if self.force_field != other.force_field {
            return Err(TopologyError::ForceFieldMismatch {
                expected: self.force_field.clone(),
                found: other.force_field.clone(),
            });
        }
        let nrexcl = if self.is_empty() { other.nrexcl } else { self.nrexcl };
        if nrexcl != other.nrexcl {
            return Err(TopologyError::NrexclMismatch {
                expected: self.nrexcl,
                found: other.nrexcl,
            });
        }

        let offset = self
            .nodes
            .iter()
            .filter_map(|node| node.key.as_index())
            .max()
            .unwrap_or(0);
        let (residue_offset, charge_group_offset) = match self.last_atom(offset) {
            Some((key, attributes)) => (
                integer_attribute(key, attributes, RESID_ATTRIBUTE, 1)?,
                integer_attribute(key, attributes, CHARGE_GROUP_ATTRIBUTE, 1)?,
            ),
            None => (0, 0),
        };

        let mut correspondence = Correspondence::with_capacity(other.len());
        let mut new_atoms = Vec::with_capacity(other.len());
        for (position, (key, attributes)) in other.atoms().enumerate() {
            let new_key = AtomKey::Index(offset + 1 + position as u64);
            let mut new_attributes = attributes.clone();
            let resid = integer_attribute(key, attributes, RESID_ATTRIBUTE, 1)?;
            let charge_group = integer_attribute(key, attributes, CHARGE_GROUP_ATTRIBUTE, 1)?;
            new_attributes.insert(RESID_ATTRIBUTE.to_string(), Value::Int(resid + residue_offset));
            new_attributes.insert(
                CHARGE_GROUP_ATTRIBUTE.to_string(),
                Value::Int(charge_group + charge_group_offset),
            );
            correspondence.insert(key.clone(), new_key.clone());
            new_atoms.push((new_key, new_attributes));
        }

        let mut new_interactions = Vec::with_capacity(other.interactions.len());
        for (interaction_type, list) in other.interactions.iter() {
            for interaction in list {
                let atoms = remap(&interaction.atoms, &correspondence)?;
                new_interactions.push((
                    interaction_type,
                    Interaction::new(atoms, interaction.parameters.clone(), interaction.meta.clone()),
                ));
            }
        }

        self.nrexcl = nrexcl;
        for (key, attributes) in new_atoms {
            self.add_node(key, attributes);
        }
        for (interaction_type, interaction) in new_interactions {
            self.interactions.get_mut(interaction_type).push(interaction);
        }
        for (a, b) in other.edges() {
            let (new_a, new_b) = (&correspondence[a], &correspondence[b]);
            if new_a != new_b {
                self.add_edge(new_a.clone(), new_b.clone());
            }
        }

        debug!(
            offset,
            residue_offset,
            total_atoms = self.len(),
            "Merged molecule."
        );
        Ok(correspondence)
    }

    fn last_atom(&self, largest_index: u64) -> Option<(&AtomKey, &Attributes)> {
        let node = match self.node_index.get(&AtomKey::Index(largest_index)) {
            Some(&position) => &self.nodes[position],
            None => self.nodes.last()?,
        };
        Some((&node.key, &node.attributes))
    }
}

/// Reads an integer attribute, using `default` when it is absent.
pub(crate) fn integer_attribute(
    key: &AtomKey,
    attributes: &Attributes,
    attribute: &str,
    default: i64,
) -> Result<i64> {
    match attributes.get(attribute) {
        None | Some(Value::Undefined) => Ok(default),
        Some(value) => value.as_int().ok_or_else(|| TopologyError::InvalidAttributeType {
            atom: Some(key.clone()),
            attribute: attribute.to_string(),
            expected: "an integer",
        }),
    }
}

/// Translates atom keys through `correspondence`.
pub(crate) fn remap(atoms: &[AtomKey], correspondence: &Correspondence) -> Result<Vec<AtomKey>> {
    atoms
        .iter()
        .map(|atom| {
            correspondence
                .get(atom)
                .cloned()
                .ok_or_else(|| TopologyError::AtomNotFound { key: atom.clone() })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn keys(indices: &[u64]) -> Vec<AtomKey> {
        indices.iter().map(|i| AtomKey::Index(*i)).collect()
    }

    fn versioned(version: i64) -> Attributes {
        attrs(&[("version", Value::Int(version))])
    }

    fn chain(length: u64) -> Molecule {
        let mut molecule = Molecule::new().with_force_field("ff").with_nrexcl(1);
        for i in 1..=length {
            molecule.add_node(i, attrs(&[("atomname", Value::from(format!("A{i}"))), ("resid", Value::Int(1))]));
        }
        for i in 1..length {
            molecule.add_edge(i, i + 1);
        }
        molecule
    }

    mod graph {
        use super::*;

        #[test]
        fn add_node_merges_attributes_of_existing_atom() {
            let mut molecule = Molecule::new();
            molecule.add_node(1u64, attrs(&[("atomname", Value::from("BB"))]));
            molecule.add_node(2u64, Attributes::new());
            molecule.add_node(1u64, attrs(&[("resid", Value::Int(4))]));

            assert_eq!(molecule.len(), 2);
            assert_eq!(molecule.nodes().cloned().collect::<Vec<_>>(), keys(&[1, 2]));
            let node = molecule.node(&AtomKey::Index(1)).unwrap();
            assert_eq!(node["atomname"], Value::from("BB"));
            assert_eq!(node["resid"], Value::Int(4));
        }

        #[test]
        fn add_edge_creates_placeholder_atoms() {
            let mut molecule = Molecule::new();
            assert!(molecule.add_edge("A", "B"));
            assert_eq!(molecule.len(), 2);
            assert_eq!(molecule.node(&AtomKey::from("B")), Some(&Attributes::new()));
            assert!(molecule.has_edge(&AtomKey::from("B"), &AtomKey::from("A")));
        }

        #[test]
        fn self_loops_and_duplicates_are_ignored() {
            let mut molecule = chain(2);
            assert!(!molecule.add_edge(1u64, 1u64));
            assert!(!molecule.add_edge(2u64, 1u64));
            assert_eq!(molecule.edge_count(), 1);
        }

        #[test]
        fn neighbors_follow_edge_insertion_order() {
            let mut molecule = chain(3);
            molecule.add_edge(2u64, 4u64);
            let neighbors: Vec<_> = molecule.neighbors(&AtomKey::Index(2)).cloned().collect();
            assert_eq!(neighbors, keys(&[1, 3, 4]));
            assert_eq!(molecule.neighbors(&AtomKey::Index(9)).count(), 0);
        }

        #[test]
        fn find_atoms_filters_by_template() {
            let mut molecule = chain(3);
            molecule
                .node_mut(&AtomKey::Index(3))
                .unwrap()
                .insert("resid".to_string(), Value::Int(2));
            let template = attrs(&[("resid", Value::Int(1))]);
            let found: Vec<_> = molecule.find_atoms(&template).cloned().collect();
            assert_eq!(found, keys(&[1, 2]));
        }

        #[test]
        fn edges_between_reports_crossing_edges_only() {
            let molecule = chain(4);
            let crossing = molecule.edges_between(&keys(&[1, 2]), &keys(&[3, 4]));
            assert_eq!(crossing, vec![(AtomKey::Index(2), AtomKey::Index(3))]);
            assert!(molecule.edges_between(&keys(&[1]), &keys(&[4])).is_empty());
        }

        #[test]
        fn subgraph_keeps_selected_atoms_edges_and_interactions() {
            let mut molecule = chain(3);
            molecule
                .add_interaction("bonds", keys(&[1, 2]), vec![], Attributes::new())
                .unwrap();
            molecule
                .add_interaction("bonds", keys(&[2, 3]), vec![], Attributes::new())
                .unwrap();

            let sub = molecule.subgraph(&keys(&[2, 1, 7]));
            assert_eq!(sub.nodes().cloned().collect::<Vec<_>>(), keys(&[1, 2]));
            assert_eq!(sub.edge_count(), 1);
            assert_eq!(sub.bonds().len(), 1);
            assert_eq!(sub.bonds()[0].atoms, keys(&[1, 2]));
            assert_eq!(sub.force_field(), Some("ff"));
            assert_eq!(sub.nrexcl(), Some(1));
        }

        #[test]
        fn share_moltype_compares_graph_structure() {
            let linear = chain(3);
            let mut relabelled = Molecule::new();
            relabelled.add_edge("x", "y");
            relabelled.add_edge("z", "x");
            let mut triangle = chain(3);
            triangle.add_edge(3u64, 1u64);

            assert!(linear.share_moltype_with(&relabelled));
            assert!(!linear.share_moltype_with(&triangle));
            assert!(!linear.share_moltype_with(&chain(4)));
        }
    }

    mod registry {
        use super::*;

        #[test]
        fn add_interaction_appends_exactly_one_entry() {
            let mut molecule = chain(3);
            molecule
                .add_interaction("bonds", keys(&[1, 2]), vec![Parameter::from("1")], Attributes::new())
                .unwrap();
            molecule
                .add_interaction("bonds", keys(&[2, 3]), vec![Parameter::from("1")], Attributes::new())
                .unwrap();

            let bonds = molecule.get_interaction("bonds");
            assert_eq!(bonds.len(), 2);
            assert_eq!(bonds[1].atoms, keys(&[2, 3]));
            assert_eq!(bonds[1].parameters, vec![Parameter::from("1")]);
        }

        #[test]
        fn add_interaction_with_unknown_atom_leaves_registry_untouched() {
            let mut molecule = chain(2);
            let result = molecule.add_interaction("bonds", keys(&[1, 5]), vec![], Attributes::new());
            assert_eq!(
                result,
                Err(TopologyError::AtomNotFound {
                    key: AtomKey::Index(5)
                })
            );
            assert!(molecule.interactions().is_empty());
            assert!(!molecule.interactions().contains_type("bonds"));
        }

        #[test]
        fn get_interaction_on_unused_type_is_empty() {
            let molecule = chain(2);
            assert!(molecule.get_interaction("cmap").is_empty());
            assert!(molecule.impropers().is_empty());
        }

        #[test]
        fn add_or_replace_keeps_position_and_latest_parameters() {
            let mut molecule = chain(3);
            molecule
                .add_interaction("bonds", keys(&[1, 2]), vec![Parameter::from(0.1)], Attributes::new())
                .unwrap();
            molecule
                .add_interaction("bonds", keys(&[2, 3]), vec![Parameter::from(0.2)], Attributes::new())
                .unwrap();

            molecule
                .add_or_replace_interaction("bonds", keys(&[1, 2]), vec![Parameter::from(0.3)], Attributes::new())
                .unwrap();

            let bonds = molecule.bonds();
            assert_eq!(bonds.len(), 2);
            assert_eq!(bonds[0].atoms, keys(&[1, 2]));
            assert_eq!(bonds[0].parameters, vec![Parameter::from(0.3)]);
        }

        #[test]
        fn add_or_replace_with_new_version_appends() {
            let mut molecule = chain(2);
            molecule
                .add_or_replace_interaction("bonds", keys(&[1, 2]), vec![], Attributes::new())
                .unwrap();
            molecule
                .add_or_replace_interaction("bonds", keys(&[1, 2]), vec![], versioned(1))
                .unwrap();
            molecule
                .add_or_replace_interaction("bonds", keys(&[1, 2]), vec![Parameter::from("x")], versioned(1))
                .unwrap();

            let bonds = molecule.bonds();
            assert_eq!(bonds.len(), 2);
            assert_eq!(bonds[1].parameters, vec![Parameter::from("x")]);
        }

        #[test]
        fn remove_interaction_only_sees_truthy_versions() {
            let mut molecule = chain(2);
            molecule
                .add_interaction("bonds", keys(&[1, 2]), vec![], Attributes::new())
                .unwrap();

            let result = molecule.remove_interaction("bonds", &keys(&[1, 2]), &Value::Int(0));
            assert_eq!(
                result,
                Err(TopologyError::NoMatchFound {
                    interaction_type: "bonds".to_string(),
                    atoms: keys(&[1, 2]),
                })
            );

            molecule
                .add_interaction("bonds", keys(&[1, 2]), vec![], versioned(3))
                .unwrap();
            let removed = molecule
                .remove_interaction("bonds", &keys(&[1, 2]), &Value::Int(1))
                .unwrap();
            assert_eq!(removed.version(), Value::Int(3));
            assert_eq!(molecule.bonds().len(), 1);
        }

        #[test]
        fn remove_matching_interaction_removes_exactly_one() {
            let mut molecule = chain(2);
            molecule
                .add_interaction("bonds", keys(&[1, 2]), vec![Parameter::from("a")], Attributes::new())
                .unwrap();
            molecule
                .add_interaction("bonds", keys(&[1, 2]), vec![Parameter::from("b")], Attributes::new())
                .unwrap();

            let template = Interaction::new(keys(&[1, 2]), vec![], Attributes::new());
            let removed = molecule.remove_matching_interaction("bonds", &template).unwrap();
            assert_eq!(removed.parameters, vec![Parameter::from("a")]);
            assert_eq!(molecule.bonds().len(), 1);
            assert_eq!(molecule.bonds()[0].parameters, vec![Parameter::from("b")]);
        }

        #[test]
        fn remove_matching_interaction_without_match_fails() {
            let mut molecule = chain(2);
            molecule
                .add_interaction("bonds", keys(&[1, 2]), vec![], Attributes::new())
                .unwrap();
            let template = Interaction::new(keys(&[2, 1]), vec![], Attributes::new());
            assert!(matches!(
                molecule.remove_matching_interaction("bonds", &template),
                Err(TopologyError::NoMatchFound { .. })
            ));
            assert_eq!(molecule.bonds().len(), 1);
        }
    }

    mod merge {
        use super::*;

        #[test]
        fn merge_offsets_keys_and_residues() {
            let mut target = Molecule::new().with_force_field("ff");
            target.add_node(1u64, attrs(&[("resid", Value::Int(1))]));
            target.add_node(2u64, attrs(&[("resid", Value::Int(1))]));
            let mut incoming = Molecule::new().with_force_field("ff");
            incoming.add_node("x", attrs(&[("resid", Value::Int(1))]));

            let correspondence = target.merge_molecule(&incoming).unwrap();

            assert_eq!(correspondence[&AtomKey::from("x")], AtomKey::Index(3));
            let merged = target.node(&AtomKey::Index(3)).unwrap();
            assert_eq!(merged["resid"], Value::Int(2));
            assert_eq!(merged["charge_group"], Value::Int(2));
        }

        #[test]
        fn merge_remaps_interactions_and_edges() {
            let mut target = chain(2);
            let mut incoming = Molecule::new().with_force_field("ff").with_nrexcl(1);
            incoming.add_node("a", Attributes::new());
            incoming.add_node("b", Attributes::new());
            incoming.add_edge("a", "b");
            incoming
                .add_interaction("bonds", vec![AtomKey::from("a"), AtomKey::from("b")], vec![], versioned(1))
                .unwrap();

            target.merge_molecule(&incoming).unwrap();

            assert_eq!(target.len(), 4);
            assert!(target.has_edge(&AtomKey::Index(3), &AtomKey::Index(4)));
            assert!(!target.has_edge(&AtomKey::Index(2), &AtomKey::Index(3)));
            assert_eq!(target.bonds()[0].atoms, keys(&[3, 4]));
            assert_eq!(target.bonds()[0].version(), Value::Int(1));
        }

        #[test]
        fn merge_into_empty_molecule_starts_at_one_and_adopts_nrexcl() {
            let mut target = Molecule::new().with_force_field("ff");
            let incoming = chain(2);

            let correspondence = target.merge_molecule(&incoming).unwrap();

            assert_eq!(target.nrexcl(), Some(1));
            assert_eq!(correspondence[&AtomKey::Index(1)], AtomKey::Index(1));
            assert_eq!(correspondence[&AtomKey::Index(2)], AtomKey::Index(2));
            assert_eq!(target.node(&AtomKey::Index(1)).unwrap()["resid"], Value::Int(1));
        }

        #[test]
        fn merge_rejects_force_field_mismatch() {
            let mut target = Molecule::new().with_force_field("ff-a");
            target.add_node(1u64, Attributes::new());
            let incoming = Molecule::new().with_force_field("ff-b");

            assert_eq!(
                target.merge_molecule(&incoming),
                Err(TopologyError::ForceFieldMismatch {
                    expected: Some("ff-a".to_string()),
                    found: Some("ff-b".to_string()),
                })
            );
            assert_eq!(target.len(), 1);
        }

        #[test]
        fn merge_rejects_nrexcl_mismatch() {
            let mut target = chain(1);
            let incoming = Molecule::new().with_force_field("ff").with_nrexcl(3);
            assert_eq!(
                target.merge_molecule(&incoming),
                Err(TopologyError::NrexclMismatch {
                    expected: Some(1),
                    found: Some(3),
                })
            );
        }

        #[test]
        fn merge_rejects_non_integer_resid_without_modifying_target() {
            let mut target = chain(1);
            let mut incoming = Molecule::new().with_force_field("ff").with_nrexcl(1);
            incoming.add_node("x", attrs(&[("resid", Value::from("one"))]));

            assert!(matches!(
                target.merge_molecule(&incoming),
                Err(TopologyError::InvalidAttributeType { .. })
            ));
            assert_eq!(target.len(), 1);
        }
    }
}
