use super::ids::{AtomKey, Correspondence};
use super::molecule::{CHARGE_GROUP_ATTRIBUTE, Molecule, RESID_ATTRIBUTE, integer_attribute, remap};
use super::value::{Attributes, Value};
use crate::core::error::{Result, TopologyError};
use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use tracing::debug;

const ATOMNAME_ATTRIBUTE: &str = "atomname";
const RESNAME_ATTRIBUTE: &str = "resname";

/// Controls how a [`Block`] is turned into a concrete [`Molecule`].
///
/// Every field has a neutral default, so the options can be embedded in a
/// larger configuration file and only the relevant keys given.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct InstantiateOptions {
    /// Integer id of the first instantiated atom.
    pub atom_offset: u64,
    /// Added to the `resid` of every atom.
    pub offset_resid: i64,
    /// Added to the `charge_group` of every atom.
    pub offset_charge_group: i64,
    /// Force field of the new molecule; the block's own when `None`.
    pub force_field: Option<String>,
}

impl InstantiateOptions {
    pub fn builder() -> InstantiateOptionsBuilder {
        InstantiateOptionsBuilder::new()
    }
}

#[derive(Debug, Default)]
pub struct InstantiateOptionsBuilder {
    atom_offset: Option<u64>,
    offset_resid: Option<i64>,
    offset_charge_group: Option<i64>,
    force_field: Option<String>,
}

impl InstantiateOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom_offset(mut self, offset: u64) -> Self {
        self.atom_offset = Some(offset);
        self
    }
    pub fn offset_resid(mut self, offset: i64) -> Self {
        self.offset_resid = Some(offset);
        self
    }
    pub fn offset_charge_group(mut self, offset: i64) -> Self {
        self.offset_charge_group = Some(offset);
        self
    }
    pub fn force_field(mut self, force_field: impl Into<String>) -> Self {
        self.force_field = Some(force_field.into());
        self
    }

    pub fn build(self) -> InstantiateOptions {
        InstantiateOptions {
            atom_offset: self.atom_offset.unwrap_or_default(),
            offset_resid: self.offset_resid.unwrap_or_default(),
            offset_charge_group: self.offset_charge_group.unwrap_or_default(),
            force_field: self.force_field,
        }
    }
}

/// A residue template: a molecule graph keyed by atom names.
///
/// Nodes with an empty attribute set stand for atoms of neighbouring residues
/// referenced by the template's interactions; they are not part of
/// [`Block::atoms`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub name: Option<String>,
    molecule: Molecule,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            molecule: Molecule::new(),
        }
    }

    /// Wraps an existing graph as a residue template.
    pub fn from_molecule(name: Option<String>, molecule: Molecule) -> Self {
        Self { name, molecule }
    }

    pub fn molecule(&self) -> &Molecule {
        &self.molecule
    }

    pub fn into_molecule(self) -> Molecule {
        self.molecule
    }

    /// Adds an atom keyed by its `atomname` attribute.
    ///
    /// # Errors
    ///
    /// - [`TopologyError::MissingAttribute`] if `atom` has no `atomname`.
    /// - [`TopologyError::InvalidAttributeType`] if the `atomname` is not a string.
    pub fn add_atom(&mut self, atom: Attributes) -> Result<()> {
        let name = match atom.get(ATOMNAME_ATTRIBUTE) {
            None | Some(Value::Undefined) => {
                return Err(TopologyError::MissingAttribute {
                    atom: None,
                    attribute: ATOMNAME_ATTRIBUTE.to_string(),
                });
            }
            Some(Value::Str(name)) => name.clone(),
            Some(_) => {
                return Err(TopologyError::InvalidAttributeType {
                    atom: None,
                    attribute: ATOMNAME_ATTRIBUTE.to_string(),
                    expected: "a string",
                });
            }
        };
        self.molecule.add_node(name, atom);
        Ok(())
    }

    /// The atoms that belong to the residue, skipping placeholder nodes.
    pub fn atoms(&self) -> impl Iterator<Item = (&AtomKey, &Attributes)> {
        self.molecule
            .atoms()
            .filter(|(_, attributes)| !attributes.is_empty())
    }

    /// Instantiates the template as a molecule with sequential integer atom ids.
    ///
    /// Every node, placeholders included, becomes an atom. `resid` and
    /// `charge_group` default to 1 before the offsets are applied, and `resname`
    /// defaults to the block name. Interactions keep their parameters and
    /// metadata; interactions and edges are remapped to the new ids. `nrexcl`
    /// is copied.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidAttributeType`] if a `resid` or
    /// `charge_group` is not an integer.
    pub fn to_molecule(&self, options: &InstantiateOptions) -> Result<Molecule> {
        let force_field = options
            .force_field
            .clone()
            .or_else(|| self.molecule.force_field().map(str::to_string));
        let mut molecule = Molecule::new();
        molecule.set_force_field(force_field);
        molecule.set_nrexcl(self.molecule.nrexcl());

        let mut name_to_index = Correspondence::with_capacity(self.molecule.len());
        for (position, (key, attributes)) in self.molecule.atoms().enumerate() {
            let index = AtomKey::Index(options.atom_offset + position as u64);
            let mut new_atom = attributes.clone();
            let resid = integer_attribute(key, attributes, RESID_ATTRIBUTE, 1)?;
            let charge_group = integer_attribute(key, attributes, CHARGE_GROUP_ATTRIBUTE, 1)?;
            new_atom.insert(
                RESID_ATTRIBUTE.to_string(),
                Value::Int(resid + options.offset_resid),
            );
            new_atom.insert(
                CHARGE_GROUP_ATTRIBUTE.to_string(),
                Value::Int(charge_group + options.offset_charge_group),
            );
            if let Some(name) = &self.name {
                new_atom
                    .entry(RESNAME_ATTRIBUTE.to_string())
                    .or_insert_with(|| Value::from(name.as_str()));
            }
            molecule.add_node(index.clone(), new_atom);
            name_to_index.insert(key.clone(), index);
        }

        for (interaction_type, interactions) in self.molecule.interactions().iter() {
            for interaction in interactions {
                molecule.add_interaction(
                    interaction_type,
                    remap(&interaction.atoms, &name_to_index)?,
                    interaction.parameters.clone(),
                    interaction.meta.clone(),
                )?;
            }
        }
        for (a, b) in self.molecule.edges() {
            molecule.add_edge(name_to_index[a].clone(), name_to_index[b].clone());
        }

        debug!(
            block = self.name.as_deref().unwrap_or("Unnamed"),
            atoms = molecule.len(),
            atom_offset = options.atom_offset,
            "Instantiated block."
        );
        Ok(molecule)
    }
}

impl Deref for Block {
    type Target = Molecule;

    fn deref(&self) -> &Molecule {
        &self.molecule
    }
}

impl DerefMut for Block {
    fn deref_mut(&mut self) -> &mut Molecule {
        &mut self.molecule
    }
}
