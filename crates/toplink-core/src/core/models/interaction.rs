use super::ids::{AtomKey, Correspondence};
use super::molecule::Molecule;
use super::value::{Attributes, Value};
use crate::core::error::{Result, TopologyError};
use crate::core::forcefield::effector::ParamEffector;
use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed vocabulary of interaction sections known to the force fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InteractionKind {
    Bonds,
    Angles,
    Dihedrals,
    Impropers,
    Cmap,
    Constraints,
    Pairs,
    Exclusions,
    Settles,
    VirtualSites2,
    VirtualSites3,
    VirtualSitesN,
    PositionRestraints,
    DistanceRestraints,
    DihedralRestraints,
}

static INTERACTION_KINDS: Map<&'static str, InteractionKind> = phf_map! {
    "bonds" => InteractionKind::Bonds,
    "angles" => InteractionKind::Angles,
    "dihedrals" => InteractionKind::Dihedrals,
    "impropers" => InteractionKind::Impropers,
    "cmap" => InteractionKind::Cmap,
    "constraints" => InteractionKind::Constraints,
    "pairs" => InteractionKind::Pairs,
    "exclusions" => InteractionKind::Exclusions,
    "settles" => InteractionKind::Settles,
    "virtual_sites2" => InteractionKind::VirtualSites2,
    "virtual_sites3" => InteractionKind::VirtualSites3,
    "virtual_sitesn" => InteractionKind::VirtualSitesN,
    "position_restraints" => InteractionKind::PositionRestraints,
    "distance_restraints" => InteractionKind::DistanceRestraints,
    "dihedral_restraints" => InteractionKind::DihedralRestraints,
};

/// Interaction types whose consecutive atoms are bonded, in edge-creation order.
pub const EDGE_INTERACTION_KINDS: [InteractionKind; 5] = [
    InteractionKind::Bonds,
    InteractionKind::Angles,
    InteractionKind::Dihedrals,
    InteractionKind::Cmap,
    InteractionKind::Constraints,
];

impl InteractionKind {
    /// Every kind, in declaration order.
    pub const ALL: [InteractionKind; 15] = [
        Self::Bonds,
        Self::Angles,
        Self::Dihedrals,
        Self::Impropers,
        Self::Cmap,
        Self::Constraints,
        Self::Pairs,
        Self::Exclusions,
        Self::Settles,
        Self::VirtualSites2,
        Self::VirtualSites3,
        Self::VirtualSitesN,
        Self::PositionRestraints,
        Self::DistanceRestraints,
        Self::DihedralRestraints,
    ];

    /// The registry key used for this kind, looked up in the name table.
    pub fn as_str(self) -> &'static str {
        INTERACTION_KINDS
            .entries()
            .find_map(|(name, kind)| (*kind == self).then_some(*name))
            .unwrap_or_default()
    }

    pub fn creates_edges(self) -> bool {
        EDGE_INTERACTION_KINDS.contains(&self)
    }
}

impl FromStr for InteractionKind {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        INTERACTION_KINDS
            .get(s)
            .copied()
            .ok_or_else(|| TopologyError::UnknownInteractionType(s.to_string()))
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single interaction parameter: a literal, or a rule evaluated on a matched molecule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Parameter {
    Value(Value),
    Effector(ParamEffector),
}

impl Parameter {
    /// Produces the concrete value of this parameter for `molecule`.
    ///
    /// Literals are returned as they are; effectors are evaluated through
    /// `correspondence`.
    pub fn resolve(&self, molecule: &Molecule, correspondence: &Correspondence) -> Result<Value> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Effector(effector) => effector.apply(molecule, correspondence),
        }
    }
}

impl From<Value> for Parameter {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Parameter {
    fn from(s: &str) -> Self {
        Self::Value(Value::from(s))
    }
}

impl From<f64> for Parameter {
    fn from(f: f64) -> Self {
        Self::Value(Value::Float(f))
    }
}

impl From<i64> for Parameter {
    fn from(i: i64) -> Self {
        Self::Value(Value::Int(i))
    }
}

impl From<ParamEffector> for Parameter {
    fn from(effector: ParamEffector) -> Self {
        Self::Effector(effector)
    }
}

/// A typed relation (bond, angle, dihedral, ...) over an ordered tuple of atoms.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Interaction {
    pub atoms: Vec<AtomKey>,
    pub parameters: Vec<Parameter>,
    pub meta: Attributes,
}

impl Interaction {
    pub fn new(atoms: Vec<AtomKey>, parameters: Vec<Parameter>, meta: Attributes) -> Self {
        Self {
            atoms,
            parameters,
            meta,
        }
    }

    /// The `version` metadata, defaulting to `0`.
    pub fn version(&self) -> Value {
        meta_version(&self.meta)
    }
}

/// An interaction a link must delete, with per-atom attribute constraints.
///
/// `atom_attrs` holds one constraint set per atom position and is only used
/// for matching; it is never stored in a molecule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeleteInteraction {
    pub atoms: Vec<AtomKey>,
    pub atom_attrs: Vec<Attributes>,
    pub parameters: Vec<Parameter>,
    pub meta: Attributes,
}

impl DeleteInteraction {
    pub fn new(
        atoms: Vec<AtomKey>,
        atom_attrs: Vec<Attributes>,
        parameters: Vec<Parameter>,
        meta: Attributes,
    ) -> Self {
        Self {
            atoms,
            atom_attrs,
            parameters,
            meta,
        }
    }
}

/// Read access shared by the interaction shapes a molecule interaction can be matched against.
pub trait InteractionTemplate {
    fn atoms(&self) -> &[AtomKey];
    fn parameters(&self) -> &[Parameter];
    fn meta(&self) -> &Attributes;

    /// Per-atom attribute constraints, when the template carries any.
    fn atom_attrs(&self) -> Option<&[Attributes]> {
        None
    }
}

impl InteractionTemplate for Interaction {
    fn atoms(&self) -> &[AtomKey] {
        &self.atoms
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn meta(&self) -> &Attributes {
        &self.meta
    }
}

impl InteractionTemplate for DeleteInteraction {
    fn atoms(&self) -> &[AtomKey] {
        &self.atoms
    }

    fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    fn meta(&self) -> &Attributes {
        &self.meta
    }

    fn atom_attrs(&self) -> Option<&[Attributes]> {
        Some(&self.atom_attrs)
    }
}

pub(crate) fn meta_version(meta: &Attributes) -> Value {
    meta.get("version").cloned().unwrap_or(Value::Int(0))
}

/// Ordered lists of interactions keyed by type name.
///
/// Types are kept in first-use order and each list keeps insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InteractionRegistry {
    lists: Vec<(String, Vec<Interaction>)>,
}

impl InteractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The interactions of `interaction_type`, empty if the type is unused.
    pub fn get(&self, interaction_type: &str) -> &[Interaction] {
        self.lists
            .iter()
            .find(|(name, _)| name == interaction_type)
            .map(|(_, list)| list.as_slice())
            .unwrap_or(&[])
    }

    /// The live list for `interaction_type`, registering the type if needed.
    pub fn get_mut(&mut self, interaction_type: &str) -> &mut Vec<Interaction> {
        let position = match self
            .lists
            .iter()
            .position(|(name, _)| name == interaction_type)
        {
            Some(position) => position,
            None => {
                self.lists.push((interaction_type.to_string(), Vec::new()));
                self.lists.len() - 1
            }
        };
        &mut self.lists[position].1
    }

    pub fn contains_type(&self, interaction_type: &str) -> bool {
        self.lists.iter().any(|(name, _)| name == interaction_type)
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.lists.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Interaction])> {
        self.lists
            .iter()
            .map(|(name, list)| (name.as_str(), list.as_slice()))
    }

    /// Total number of interactions across all types.
    pub fn len(&self) -> usize {
        self.lists.iter().map(|(_, list)| list.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
