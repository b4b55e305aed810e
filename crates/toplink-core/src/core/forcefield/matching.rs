use crate::core::models::interaction::{Interaction, InteractionTemplate};
use crate::core::models::molecule::Molecule;
use crate::core::models::value::{Attributes, Value, lookup};

/// Compares a molecule attribute set with a template attribute set.
///
/// Every template entry whose key is not in `ignore_keys` must match: a
/// [`Value::Predicate`] delegates to the predicate, any other value requires the
/// molecule value to be equal (a missing key reads as [`Value::Undefined`]).
/// An empty template matches anything.
pub fn attributes_match(attributes: &Attributes, template: &Attributes, ignore_keys: &[&str]) -> bool {
    template
        .iter()
        .filter(|(key, _)| !ignore_keys.contains(&key.as_str()))
        .all(|(key, expected)| match expected {
            Value::Predicate(predicate) => predicate.matches(attributes, key),
            _ => lookup(attributes, key) == expected,
        })
}

/// Decides whether a molecule interaction satisfies an interaction template.
///
/// All of the following must hold:
/// - the atom tuples are equal, order included;
/// - the template has no parameters, or exactly the interaction's parameters;
/// - each per-atom constraint set of the template matches the attributes of the
///   corresponding molecule atom;
/// - the interaction's metadata matches the template's metadata.
pub fn interaction_match<T>(molecule: &Molecule, interaction: &Interaction, template: &T) -> bool
where
    T: InteractionTemplate + ?Sized,
{
    if template.atoms() != interaction.atoms.as_slice() {
        return false;
    }
    let parameters = template.parameters();
    if !parameters.is_empty() && parameters != interaction.parameters.as_slice() {
        return false;
    }

    if let Some(atom_attrs) = template.atom_attrs() {
        let empty = Attributes::new();
        let all_atoms_match = interaction
            .atoms
            .iter()
            .zip(atom_attrs)
            .all(|(atom, constraints)| {
                let attributes = molecule.node(atom).unwrap_or(&empty);
                attributes_match(attributes, constraints, &[])
            });
        if !all_atoms_match {
            return false;
        }
    }

    attributes_match(&interaction.meta, template.meta(), &[])
}
