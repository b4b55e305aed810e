use crate::core::error::{Result, TopologyError};
use crate::core::forcefield::matching::attributes_match;
use crate::core::models::ids::{AtomKey, Correspondence};
use crate::core::models::interaction::{DeleteInteraction, Parameter};
use crate::core::models::link::Link;
use crate::core::models::molecule::Molecule;
use crate::core::models::value::{Attributes, Value};
use tracing::{debug, instrument, trace};

/// Link atom attributes consumed by the match driver rather than compared.
const DRIVER_KEYS: [&str; 1] = ["order"];

fn resolve(key: &AtomKey, correspondence: &Correspondence) -> Result<AtomKey> {
    correspondence
        .get(key)
        .cloned()
        .ok_or_else(|| TopologyError::UnresolvedKey { key: key.clone() })
}

fn resolve_all(keys: &[AtomKey], correspondence: &Correspondence) -> Result<Vec<AtomKey>> {
    keys.iter().map(|key| resolve(key, correspondence)).collect()
}

/// Checks a candidate correspondence from link atoms to molecule atoms.
///
/// The candidate is valid when every link atom is mapped onto a molecule atom
/// whose attributes match the link atom's constraints, every link edge exists
/// in the molecule, no `non_edge` whose two ends are mapped exists in the
/// molecule, and the molecule metadata matches the link's `molecule_meta`.
pub fn link_matches(molecule: &Molecule, link: &Link, correspondence: &Correspondence) -> bool {
    let atoms_match = link.molecule().atoms().all(|(key, constraints)| {
        correspondence
            .get(key)
            .and_then(|target| molecule.node(target))
            .is_some_and(|attributes| attributes_match(attributes, constraints, &DRIVER_KEYS))
    });
    if !atoms_match {
        return false;
    }

    let edges_present = link.edges().all(|(a, b)| {
        match (correspondence.get(a), correspondence.get(b)) {
            (Some(a), Some(b)) => molecule.has_edge(a, b),
            _ => false,
        }
    });
    if !edges_present {
        return false;
    }

    let non_edges_absent = link.non_edges().iter().all(|(a, b)| {
        match (correspondence.get(a), correspondence.get(b)) {
            (Some(a), Some(b)) => !molecule.has_edge(a, b),
            _ => true,
        }
    });

    non_edges_absent && attributes_match(&molecule.meta, link.molecule_meta(), &[])
}

/// Applies a matched link to `molecule`.
///
/// In order:
/// 1. each removed interaction, remapped onto the molecule, deletes the first
///    molecule interaction it matches;
/// 2. each link interaction is remapped, its parameters resolved against the
///    molecule, and added or replaced (same atoms and `version`);
/// 3. link edges are added between the mapped atoms;
/// 4. the mapped atoms receive the link atoms' attributes, except predicates.
///
/// # Errors
///
/// - [`TopologyError::UnresolvedKey`] if a link atom is missing from `correspondence`.
/// - [`TopologyError::AtomNotFound`] if a mapped atom is not in the molecule.
/// - Any error of [`ParamEffector::apply`](crate::core::forcefield::effector::ParamEffector::apply).
/// - [`TopologyError::NoMatchFound`] if a removed interaction is absent.
///
/// Key resolution and parameter computation happen before the molecule is
/// modified. A missing removed interaction is only detected while removing, so
/// earlier removals are kept when it fails.
#[instrument(skip_all, fields(link = ?link.name))]
pub fn apply_link(molecule: &mut Molecule, link: &Link, correspondence: &Correspondence) -> Result<()> {
    let mut removals = Vec::new();
    for (interaction_type, templates) in &link.pattern.removed_interactions {
        for template in templates {
            let remapped = DeleteInteraction::new(
                resolve_all(&template.atoms, correspondence)?,
                template.atom_attrs.clone(),
                template.parameters.clone(),
                template.meta.clone(),
            );
            removals.push((interaction_type.as_str(), remapped));
        }
    }

    let mut additions = Vec::new();
    for (interaction_type, interactions) in link.interactions().iter() {
        for interaction in interactions {
            let atoms = resolve_all(&interaction.atoms, correspondence)?;
            let parameters = interaction
                .parameters
                .iter()
                .map(|parameter| parameter.resolve(molecule, correspondence).map(Parameter::Value))
                .collect::<Result<Vec<_>>>()?;
            additions.push((interaction_type, atoms, parameters, interaction.meta.clone()));
        }
    }

    let mut edges = Vec::with_capacity(link.edge_count());
    for (a, b) in link.edges() {
        edges.push((resolve(a, correspondence)?, resolve(b, correspondence)?));
    }

    let mut updates = Vec::new();
    for (key, attributes) in link.molecule().atoms() {
        let target = resolve(key, correspondence)?;
        if !molecule.contains(&target) {
            return Err(TopologyError::AtomNotFound { key: target });
        }
        let copied: Attributes = attributes
            .iter()
            .filter(|(name, value)| {
                !matches!(value, Value::Predicate(_) | Value::Undefined)
                    && !DRIVER_KEYS.contains(&name.as_str())
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        updates.push((target, copied));
    }

    for (interaction_type, template) in &removals {
        molecule.remove_matching_interaction(interaction_type, template)?;
        trace!(%interaction_type, atoms = ?template.atoms, "Removed interaction.");
    }
    for (interaction_type, atoms, parameters, meta) in additions {
        trace!(%interaction_type, ?atoms, "Adding interaction.");
        molecule.add_or_replace_interaction(interaction_type, atoms, parameters, meta)?;
    }
    let new_edges = edges
        .into_iter()
        .filter(|(a, b)| !molecule.has_edge(a, b))
        .collect::<Vec<_>>();
    let edge_count = new_edges.len();
    for (a, b) in new_edges {
        molecule.add_edge(a, b);
    }
    for (target, attributes) in updates {
        molecule.add_node(target, attributes);
    }

    debug!(
        removed = removals.len(),
        added_edges = edge_count,
        "Applied link."
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::effector::{EffectorKind, ParamEffector};
    use crate::core::forcefield::predicate::LinkPredicate;
    use nalgebra::Point3;

    fn attrs(pairs: &[(&str, Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn bead(resid: i64, resname: &str, position: Point3<f64>) -> Attributes {
        attrs(&[
            ("atomname", Value::from("BB")),
            ("resid", Value::Int(resid)),
            ("resname", Value::from(resname)),
            ("position", Value::from(position)),
        ])
    }

    fn key(name: &str) -> AtomKey {
        AtomKey::from(name)
    }

    /// Two backbone beads joined by a bond that the link replaces.
    fn dipeptide() -> Molecule {
        let mut molecule = Molecule::new().with_force_field("martini");
        molecule.add_node(0u64, bead(1, "ALA", Point3::origin()));
        molecule.add_node(1u64, bead(2, "GLY", Point3::new(3.0, 4.0, 0.0)));
        molecule.add_node(2u64, bead(3, "GLY", Point3::new(6.0, 8.0, 0.0)));
        molecule.add_edge(0u64, 1u64);
        molecule
            .add_interaction(
                "bonds",
                vec![AtomKey::Index(0), AtomKey::Index(1)],
                vec![Parameter::from("1"), Parameter::from(0.1)],
                Attributes::new(),
            )
            .unwrap();
        molecule
    }

    fn backbone_link() -> Link {
        let mut link = Link::named("backbone");
        link.add_node(
            "BB",
            attrs(&[("atomname", Value::from("BB")), ("order", Value::Int(0))]),
        );
        link.add_node(
            "+BB",
            attrs(&[
                ("atomname", Value::from("BB")),
                (
                    "resname",
                    Value::from(LinkPredicate::Choice(vec![Value::from("GLY"), Value::from("ALA")])),
                ),
                ("order", Value::Int(1)),
                ("backbone", Value::Bool(true)),
            ]),
        );
        link.add_edge("BB", "+BB");

        let distance = ParamEffector::new(
            EffectorKind::Distance,
            vec![key("BB"), key("+BB")],
            Some(".3f".parse().unwrap()),
        )
        .unwrap();
        link.add_interaction(
            "bonds",
            vec![key("BB"), key("+BB")],
            vec![Parameter::from("1"), Parameter::from(distance)],
            attrs(&[("version", Value::Int(1))]),
        )
        .unwrap();

        link.add_removed_interaction(
            "bonds",
            DeleteInteraction::new(
                vec![key("BB"), key("+BB")],
                vec![
                    attrs(&[("atomname", Value::from("BB"))]),
                    attrs(&[("atomname", Value::from("BB"))]),
                ],
                vec![],
                Attributes::new(),
            ),
        );
        link.add_non_edge("BB", "++BB");
        link
    }

    fn correspondence(pairs: &[(&str, u64)]) -> Correspondence {
        pairs
            .iter()
            .map(|(name, index)| (key(name), AtomKey::Index(*index)))
            .collect()
    }

    mod matching {
        use super::*;

        #[test]
        fn valid_candidate_matches() {
            let molecule = dipeptide();
            let link = backbone_link();
            assert!(link_matches(&molecule, &link, &correspondence(&[("BB", 0), ("+BB", 1)])));
        }

        #[test]
        fn predicate_failure_rejects_candidate() {
            let mut molecule = dipeptide();
            molecule
                .node_mut(&AtomKey::Index(1))
                .unwrap()
                .insert("resname".to_string(), Value::from("PRO"));
            let link = backbone_link();
            assert!(!link_matches(&molecule, &link, &correspondence(&[("BB", 0), ("+BB", 1)])));
        }

        #[test]
        fn missing_edge_rejects_candidate() {
            let molecule = dipeptide();
            let link = backbone_link();
            assert!(!link_matches(&molecule, &link, &correspondence(&[("BB", 0), ("+BB", 2)])));
        }

        #[test]
        fn unmapped_link_atom_rejects_candidate() {
            let molecule = dipeptide();
            let link = backbone_link();
            assert!(!link_matches(&molecule, &link, &correspondence(&[("BB", 0)])));
        }

        #[test]
        fn present_non_edge_rejects_candidate() {
            let mut molecule = dipeptide();
            let link = backbone_link();
            let candidate = correspondence(&[("BB", 0), ("+BB", 1), ("++BB", 2)]);
            assert!(link_matches(&molecule, &link, &candidate));

            molecule.add_edge(0u64, 2u64);
            assert!(!link_matches(&molecule, &link, &candidate));
        }

        #[test]
        fn molecule_meta_must_match() {
            let mut molecule = dipeptide();
            let mut link = backbone_link();
            link.pattern
                .molecule_meta
                .insert("cyclic".to_string(), Value::Bool(true));
            let candidate = correspondence(&[("BB", 0), ("+BB", 1)]);
            assert!(!link_matches(&molecule, &link, &candidate));

            molecule.meta.insert("cyclic".to_string(), Value::Bool(true));
            assert!(link_matches(&molecule, &link, &candidate));
        }
    }

    mod application {
        use super::*;

        #[test]
        fn apply_replaces_bond_with_computed_parameters() {
            let mut molecule = dipeptide();
            let link = backbone_link();
            apply_link(&mut molecule, &link, &correspondence(&[("BB", 0), ("+BB", 1)])).unwrap();

            let bonds = molecule.bonds();
            assert_eq!(bonds.len(), 1);
            assert_eq!(bonds[0].atoms, vec![AtomKey::Index(0), AtomKey::Index(1)]);
            assert_eq!(
                bonds[0].parameters,
                vec![Parameter::from("1"), Parameter::from("5.000")]
            );
            assert_eq!(bonds[0].version(), Value::Int(1));
        }

        #[test]
        fn apply_copies_plain_attributes_only() {
            let mut molecule = dipeptide();
            let link = backbone_link();
            apply_link(&mut molecule, &link, &correspondence(&[("BB", 0), ("+BB", 1)])).unwrap();

            let target = molecule.node(&AtomKey::Index(1)).unwrap();
            assert_eq!(target["backbone"], Value::Bool(true));
            assert_eq!(target["resname"], Value::from("GLY"));
            assert!(!target.contains_key("order"));
        }

        #[test]
        fn apply_leaves_undefined_attributes_absent() {
            let mut molecule = dipeptide();
            let mut link = backbone_link();
            link.add_node("+BB", attrs(&[("chain", Value::Undefined)]));
            apply_link(&mut molecule, &link, &correspondence(&[("BB", 0), ("+BB", 1)])).unwrap();

            let target = molecule.node(&AtomKey::Index(1)).unwrap();
            assert!(!target.contains_key("chain"));
            assert!(LinkPredicate::NotDefinedOrNot(Value::Undefined).matches(target, "chain"));
        }

        #[test]
        fn apply_adds_missing_link_edges() {
            let mut molecule = dipeptide();
            molecule
                .add_interaction(
                    "bonds",
                    vec![AtomKey::Index(1), AtomKey::Index(2)],
                    vec![],
                    Attributes::new(),
                )
                .unwrap();
            let link = backbone_link();
            apply_link(&mut molecule, &link, &correspondence(&[("BB", 1), ("+BB", 2)])).unwrap();
            assert!(molecule.has_edge(&AtomKey::Index(1), &AtomKey::Index(2)));
        }

        #[test]
        fn missing_removed_interaction_fails() {
            let mut molecule = dipeptide();
            let link = backbone_link();
            let result = apply_link(&mut molecule, &link, &correspondence(&[("BB", 1), ("+BB", 2)]));
            assert_eq!(
                result,
                Err(TopologyError::NoMatchFound {
                    interaction_type: "bonds".to_string(),
                    atoms: vec![AtomKey::Index(1), AtomKey::Index(2)],
                })
            );
        }

        #[test]
        fn unresolved_key_fails_before_modifying() {
            let mut molecule = dipeptide();
            let link = backbone_link();
            let result = apply_link(&mut molecule, &link, &correspondence(&[("BB", 0)]));
            assert_eq!(result, Err(TopologyError::UnresolvedKey { key: key("+BB") }));
            assert_eq!(molecule.bonds()[0].parameters[1], Parameter::from(0.1));
        }
    }
}
