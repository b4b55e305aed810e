use crate::core::models::ids::AtomKey;
use crate::core::models::interaction::{EDGE_INTERACTION_KINDS, Interaction, InteractionKind};
use crate::core::models::molecule::Molecule;
use crate::core::models::value::Value;
use tracing::trace;

const EDGE_FLAG: &str = "edge";

fn creates_edges(interaction: &Interaction) -> bool {
    interaction.meta.get(EDGE_FLAG).is_none_or(Value::is_truthy)
}

/// The atoms of an interaction without its first and last atom.
fn central_atoms(atoms: &[AtomKey]) -> &[AtomKey] {
    atoms.get(1..atoms.len().saturating_sub(1)).unwrap_or(&[])
}

impl Molecule {
    /// Bonds every pair of consecutive atoms of each `interaction_type` interaction.
    ///
    /// Interactions whose `edge` metadata is present and falsy are skipped, as
    /// are unused types. Endpoints missing from the graph become placeholders.
    pub fn make_edges_from_interaction_type(&mut self, interaction_type: &str) {
        let pairs: Vec<(AtomKey, AtomKey)> = self
            .get_interaction(interaction_type)
            .iter()
            .filter(|interaction| creates_edges(interaction))
            .flat_map(|interaction| {
                interaction
                    .atoms
                    .windows(2)
                    .map(|pair| (pair[0].clone(), pair[1].clone()))
            })
            .collect();
        let mut added = 0usize;
        for (a, b) in pairs {
            if self.add_edge(a, b) {
                added += 1;
            }
        }
        trace!(%interaction_type, added, "Derived edges from interactions.");
    }

    /// Derives edges from every interaction type that describes bonded chains:
    /// bonds, angles, dihedrals, cmap and constraints, in that order.
    pub fn make_edges_from_interactions(&mut self) {
        for kind in EDGE_INTERACTION_KINDS {
            self.make_edges_from_interaction_type(kind.as_str());
        }
    }

    /// Every walk `(a, b, c)` of two edges with `c != a`.
    ///
    /// Both directions of each angle are reported.
    pub fn guess_angles(&self) -> Vec<[AtomKey; 3]> {
        let mut angles = Vec::new();
        for a in self.nodes() {
            for b in self.neighbors(a) {
                for c in self.neighbors(b).filter(|c| *c != a) {
                    angles.push([a.clone(), b.clone(), c.clone()]);
                }
            }
        }
        angles
    }

    /// Extends each angle `(a, b, c)` by every neighbour `d` of `c` outside `{a, b}`.
    ///
    /// Uses [`Molecule::guess_angles`] when no angles are given. Duplicates are
    /// not removed.
    pub fn guess_dihedrals(&self, angles: Option<&[[AtomKey; 3]]>) -> Vec<[AtomKey; 4]> {
        let guessed;
        let angles = match angles {
            Some(angles) => angles,
            None => {
                guessed = self.guess_angles();
                guessed.as_slice()
            }
        };
        let mut dihedrals = Vec::new();
        for [a, b, c] in angles {
            for d in self.neighbors(c).filter(|d| *d != a && *d != b) {
                dihedrals.push([a.clone(), b.clone(), c.clone(), d.clone()]);
            }
        }
        dihedrals
    }

    /// Whether a dihedral has exactly `center` as its central atoms, in this order.
    pub fn has_dihedral_around(&self, center: &[AtomKey]) -> bool {
        self.has_interaction_around(InteractionKind::Dihedrals, center)
    }

    /// Whether an improper has exactly `center` as its central atoms, in this order.
    pub fn has_improper_around(&self, center: &[AtomKey]) -> bool {
        self.has_interaction_around(InteractionKind::Impropers, center)
    }

    fn has_interaction_around(&self, kind: InteractionKind, center: &[AtomKey]) -> bool {
        self.interactions_of(kind)
            .iter()
            .any(|interaction| central_atoms(&interaction.atoms) == center)
    }
}
