//! Split reversible reactions into forward and backward irreversible reactions
//!
//! The irreversible system keeps the columns of irreversible reactions first, in their
//! original order, followed by forward copies of the reversible reactions and finally by
//! the negated (backward) copies of the same reversible reactions:
//!
//! ```text
//! S' = [ S_irrev | S_rev | -S_rev ]
//! ```
//!
//! Reactions which can only run backwards (`lb < 0`, `ub <= 0`) are not split. Their column
//! is negated in place within `S_irrev` and their bounds become `(-ub, -lb)`, so every
//! irreversible reaction carries a non-negative flux.
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use tracing::debug;

use crate::metabolic_model::reaction::{forward_id, reverse_id};
use crate::optimize::system::{StoichiometricSystem, SystemError};
use crate::reconstruction::ReconstructionError;

/// Where an original reaction lives in the irreversible system
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReactionSlots {
    /// Irreversible reaction, moved to a new index
    Single(usize),
    /// Reaction which only runs backwards, moved to a new index as a negated column
    Reversed(usize),
    /// Reversible reaction split into two irreversible halves
    Split { forward: usize, backward: usize },
}

impl ReactionSlots {
    /// Indices of the one or two irreversible reactions
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        let (first, second) = match *self {
            ReactionSlots::Single(index) | ReactionSlots::Reversed(index) => (index, None),
            ReactionSlots::Split { forward, backward } => (forward, Some(backward)),
        };
        std::iter::once(first).chain(second)
    }

    pub fn is_split(&self) -> bool {
        matches!(self, ReactionSlots::Split { .. })
    }
}

/// Direction an irreversible reaction carries relative to its original reaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Reaction was not split
    Unchanged,
    /// Forward half of a split reaction
    Forward,
    /// Negated column, the backward half of a split reaction or a reaction which only runs
    /// backwards
    Backward,
}

/// Origin of an irreversible reaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotOrigin {
    /// Index of the original reaction
    pub reaction: usize,
    pub direction: Direction,
}

/// Bidirectional index between original and irreversible reactions
///
/// Built once per run and immutable afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct IrreversibilityMap {
    /// Original reaction -> irreversible slot(s)
    slots: Vec<ReactionSlots>,
    /// Irreversible reaction -> original reaction
    origins: Vec<SlotOrigin>,
}

impl IrreversibilityMap {
    /// Map for a system which is already irreversible, every reaction keeps its index
    pub fn identity(num_reactions: usize) -> Self {
        Self {
            slots: (0..num_reactions).map(ReactionSlots::Single).collect(),
            origins: (0..num_reactions)
                .map(|reaction| SlotOrigin {
                    reaction,
                    direction: Direction::Unchanged,
                })
                .collect(),
        }
    }

    /// `backward_only` flags the irreversible reactions which only run backwards
    fn from_partition(irreversible: &[usize], reversible: &[usize], backward_only: &[bool]) -> Self {
        let num_original = irreversible.len() + reversible.len();
        let offset = irreversible.len();
        let mut slots = vec![ReactionSlots::Single(0); num_original];
        let mut origins = Vec::with_capacity(offset + 2 * reversible.len());
        for (new, &original) in irreversible.iter().enumerate() {
            let (slot, direction) = if backward_only[original] {
                (ReactionSlots::Reversed(new), Direction::Backward)
            } else {
                (ReactionSlots::Single(new), Direction::Unchanged)
            };
            slots[original] = slot;
            origins.push(SlotOrigin {
                reaction: original,
                direction,
            });
        }
        for (n, &original) in reversible.iter().enumerate() {
            slots[original] = ReactionSlots::Split {
                forward: offset + n,
                backward: offset + reversible.len() + n,
            };
            origins.push(SlotOrigin {
                reaction: original,
                direction: Direction::Forward,
            });
        }
        for &original in reversible {
            origins.push(SlotOrigin {
                reaction: original,
                direction: Direction::Backward,
            });
        }
        Self { slots, origins }
    }

    /// Number of reactions in the original system
    pub fn num_original(&self) -> usize {
        self.slots.len()
    }

    /// Number of reactions in the irreversible system
    pub fn num_irreversible(&self) -> usize {
        self.origins.len()
    }

    /// Number of split reactions
    pub fn num_split(&self) -> usize {
        self.slots.iter().filter(|s| s.is_split()).count()
    }

    pub fn slots(&self, reaction: usize) -> Option<ReactionSlots> {
        self.slots.get(reaction).copied()
    }

    pub fn origin(&self, irreversible_reaction: usize) -> Option<SlotOrigin> {
        self.origins.get(irreversible_reaction).copied()
    }

    /// Iterate over (original reaction, slots) pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, ReactionSlots)> + '_ {
        self.slots.iter().copied().enumerate()
    }

    /// Ids of the irreversible reactions, derived from the original reaction ids
    ///
    /// Unsplit reactions keep their id, split reactions use the forward and reverse ids of
    /// [`crate::metabolic_model::reaction::Reaction`]. Reactions which only run backwards use
    /// the reverse id.
    pub fn irreversible_ids(
        &self,
        reaction_ids: &[String],
    ) -> Result<Vec<String>, ReconstructionError> {
        if reaction_ids.len() != self.num_original() {
            return Err(SystemError::DimensionMismatch {
                what: "reaction ids",
                expected: self.num_original(),
                found: reaction_ids.len(),
            }
            .into());
        }
        Ok(self
            .origins
            .iter()
            .map(|origin| {
                let id = &reaction_ids[origin.reaction];
                match origin.direction {
                    Direction::Unchanged => id.clone(),
                    Direction::Forward => forward_id(id),
                    Direction::Backward => reverse_id(id),
                }
            })
            .collect())
    }
}

/// Irreversible system along with the map back to the original reactions
#[derive(Clone, Debug)]
pub struct IrreversibleSystem {
    pub system: StoichiometricSystem,
    pub map: IrreversibilityMap,
}

/// Check every reaction's bounds, they must be ordered and not NaN
fn check_bounds(system: &StoichiometricSystem) -> Result<(), ReconstructionError> {
    let lower = system.lower_bounds();
    let upper = system.upper_bounds();
    for reaction in 0..system.num_reactions() {
        let (lb, ub) = (lower[reaction], upper[reaction]);
        if lb.is_nan() || ub.is_nan() || lb > ub {
            return Err(ReconstructionError::ModelBounds {
                reaction,
                lower: lb,
                upper: ub,
            });
        }
    }
    Ok(())
}

/// Split every reversible reaction (`lb < 0 < ub`) of the system
///
/// A split reaction with bounds `(lb, ub)` becomes a forward reaction with bounds `(0, ub)`
/// and a backward reaction with bounds `(0, -lb)`. A reaction with `lb < 0` and `ub <= 0` is
/// negated with bounds `(-ub, -lb)`. Other irreversible reactions keep their bounds.
pub fn make_irreversible(
    system: &StoichiometricSystem,
) -> Result<IrreversibleSystem, ReconstructionError> {
    check_bounds(system)?;
    let lower = system.lower_bounds();
    let upper = system.upper_bounds();
    let (reversible, irreversible): (Vec<usize>, Vec<usize>) =
        (0..system.num_reactions()).partition(|&i| system.is_reversible(i));
    let backward_only: Vec<bool> = (0..system.num_reactions())
        .map(|i| lower[i] < 0. && upper[i] <= 0.)
        .collect();
    let map = IrreversibilityMap::from_partition(&irreversible, &reversible, &backward_only);

    let s = system.stoichiometry();
    let n_new = map.num_irreversible();
    let mut coo = CooMatrix::new(s.nrows(), n_new);
    let mut new_lower = DVector::zeros(n_new);
    let mut new_upper = DVector::zeros(n_new);
    for (new, origin) in map.origins.iter().enumerate() {
        let (sign, lb, ub) = match origin.direction {
            Direction::Unchanged => (1., lower[origin.reaction], upper[origin.reaction]),
            Direction::Forward => (1., 0., upper[origin.reaction]),
            Direction::Backward if backward_only[origin.reaction] => {
                (-1., -upper[origin.reaction], -lower[origin.reaction])
            }
            Direction::Backward => (-1., 0., -lower[origin.reaction]),
        };
        let column = s.col(origin.reaction);
        for (row, value) in column.row_indices().iter().zip(column.values()) {
            coo.push(*row, new, sign * value);
        }
        new_lower[new] = lb;
        new_upper[new] = ub;
    }

    debug!(
        reactions = system.num_reactions(),
        irreversible = irreversible.len(),
        reversible = reversible.len(),
        backward_only = backward_only.iter().filter(|b| **b).count(),
        irreversible_reactions = n_new,
        "Split reversible reactions"
    );
    let system = StoichiometricSystem::new(CscMatrix::from(&coo), new_lower, new_upper)?;
    Ok(IrreversibleSystem { system, map })
}

/// Use a system as is, every reaction must already be irreversible (`lb >= 0`)
pub fn assume_irreversible(
    system: &StoichiometricSystem,
) -> Result<IrreversibleSystem, ReconstructionError> {
    check_bounds(system)?;
    if let Some(reaction) = system.lower_bounds().iter().position(|lb| *lb < 0.) {
        return Err(ReconstructionError::NotIrreversible { reaction });
    }
    Ok(IrreversibleSystem {
        system: system.clone(),
        map: IrreversibilityMap::identity(system.num_reactions()),
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn bounds() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec(
            (-100.0_f64..100.0, 0.0_f64..200.0).prop_map(|(lb, width)| (lb, lb + width)),
            1..20,
        )
    }

    fn system(bounds: &[(f64, f64)]) -> StoichiometricSystem {
        let n = bounds.len();
        let mut coo = CooMatrix::new(2, n);
        for j in 0..n {
            coo.push(j % 2, j, 1. + j as f64);
        }
        StoichiometricSystem::new(
            CscMatrix::from(&coo),
            DVector::from_iterator(n, bounds.iter().map(|b| b.0)),
            DVector::from_iterator(n, bounds.iter().map(|b| b.1)),
        )
        .unwrap()
    }

    proptest! {
        #[test]
        fn reaction_count(bounds in bounds()) {
            let original = system(&bounds);
            let reversible = (0..bounds.len()).filter(|&i| original.is_reversible(i)).count();
            let irreversible = make_irreversible(&original).unwrap();
            let map = &irreversible.map;
            prop_assert_eq!(map.num_irreversible(), bounds.len() + reversible);
            prop_assert_eq!(irreversible.system.num_reactions(), map.num_irreversible());

            // Every new index is claimed by exactly one original reaction
            let mut claimed = vec![0; map.num_irreversible()];
            for (original_index, slots) in map.iter() {
                for index in slots.indices() {
                    claimed[index] += 1;
                    prop_assert_eq!(map.origin(index).unwrap().reaction, original_index);
                }
            }
            prop_assert!(claimed.iter().all(|&c| c == 1));
        }

        #[test]
        fn bound_signs(bounds in bounds()) {
            let original = system(&bounds);
            let irreversible = make_irreversible(&original).unwrap();
            let lower = irreversible.system.lower_bounds();
            let upper = irreversible.system.upper_bounds();
            prop_assert!(upper.iter().all(|ub| *ub >= 0.));
            prop_assert!(lower.iter().all(|lb| *lb >= 0.));
            for (original_index, slots) in irreversible.map.iter() {
                match slots {
                    ReactionSlots::Split { forward, backward } => {
                        prop_assert_eq!(lower[forward], 0.);
                        prop_assert_eq!(lower[backward], 0.);
                        prop_assert!(upper[forward] > 0.);
                        prop_assert!(upper[backward] > 0.);
                    }
                    ReactionSlots::Single(index) => {
                        prop_assert_eq!(lower[index], bounds[original_index].0);
                        prop_assert_eq!(upper[index], bounds[original_index].1);
                    }
                    ReactionSlots::Reversed(index) => {
                        prop_assert!(bounds[original_index].1 <= 0.);
                        prop_assert_eq!(lower[index], -bounds[original_index].1);
                        prop_assert_eq!(upper[index], -bounds[original_index].0);
                    }
                }
            }
        }
    }
}
