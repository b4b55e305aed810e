use crate::core::models::ids::AtomKey;
use crate::core::models::molecule::Molecule;
use crate::core::models::value::{Attributes, lookup};
use std::collections::{HashMap, VecDeque};

/// Attributes that together identify the residue an atom belongs to.
pub const RESIDUE_IDENTITY: [&str; 4] = ["chain", "resid", "resname", "insertion_code"];

fn same_residue(a: &Attributes, b: &Attributes) -> bool {
    RESIDUE_IDENTITY
        .iter()
        .all(|attribute| lookup(a, attribute) == lookup(b, attribute))
}

/// Splits the atoms of `molecule` into residues.
///
/// A residue is a connected set of atoms sharing the same [`RESIDUE_IDENTITY`]
/// values, so two disconnected copies of a residue stay separate. Atoms inside
/// a residue, and residues themselves, follow the molecule's atom order.
pub fn residue_groups(molecule: &Molecule) -> Vec<Vec<AtomKey>> {
    let order: HashMap<&AtomKey, usize> = molecule
        .nodes()
        .enumerate()
        .map(|(position, key)| (key, position))
        .collect();
    let mut assigned = vec![false; molecule.len()];
    let mut groups = Vec::new();

    for (seed_position, (seed, seed_attributes)) in molecule.atoms().enumerate() {
        if assigned[seed_position] {
            continue;
        }
        assigned[seed_position] = true;
        let mut members = vec![(seed_position, seed)];
        let mut queue = VecDeque::from([seed]);
        while let Some(current) = queue.pop_front() {
            for neighbor in molecule.neighbors(current) {
                let position = order[neighbor];
                if assigned[position] {
                    continue;
                }
                let Some(attributes) = molecule.node(neighbor) else {
                    continue;
                };
                if same_residue(seed_attributes, attributes) {
                    assigned[position] = true;
                    members.push((position, neighbor));
                    queue.push_back(neighbor);
                }
            }
        }
        members.sort_unstable_by_key(|(position, _)| *position);
        groups.push(members.into_iter().map(|(_, key)| key.clone()).collect());
    }
    groups
}

impl Molecule {
    /// The atom keys of each residue, in atom order. See [`residue_groups`].
    pub fn iter_residues(&self) -> impl Iterator<Item = Vec<AtomKey>> {
        residue_groups(self).into_iter()
    }
}
