//! Move per reaction data between the original and the irreversible reaction space
use nalgebra::DVector;

use crate::optimize::system::SystemError;
use crate::reconstruction::irreversible::{IrreversibilityMap, ReactionSlots};
use crate::reconstruction::ReconstructionError;

/// Evidence value reserved for reactions without data
pub const NO_EVIDENCE: f64 = -1.;

/// Value given to irreversible reactions whose original reaction has no evidence entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EvidenceDefault {
    /// Missing evidence counts as zero evidence
    Zero,
    /// Missing evidence is marked with [`NO_EVIDENCE`]
    #[default]
    NoData,
}

impl EvidenceDefault {
    pub fn value(&self) -> f64 {
        match self {
            EvidenceDefault::Zero => 0.,
            EvidenceDefault::NoData => NO_EVIDENCE,
        }
    }
}

/// How the objective weight of a split reaction is placed on its two halves
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ObjectiveSplit {
    /// Only the forward half carries the weight
    #[default]
    ForwardOnly,
    /// Both halves carry the full weight
    Replicate,
}

/// Project evidence over original reactions onto the irreversible reactions
///
/// Both halves of a split reaction receive the evidence of the original reaction.
pub fn map_evidence<I>(
    evidence: I,
    map: &IrreversibilityMap,
    default: EvidenceDefault,
) -> Result<DVector<f64>, ReconstructionError>
where
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut mapped = DVector::from_element(map.num_irreversible(), default.value());
    for (reaction, value) in evidence {
        let slots = map
            .slots(reaction)
            .ok_or(ReconstructionError::ReactionIndexOutOfRange {
                index: reaction,
                len: map.num_original(),
            })?;
        for index in slots.indices() {
            mapped[index] = value;
        }
    }
    Ok(mapped)
}

/// Rewrite an objective over original reactions into one over irreversible reactions
///
/// The weight of a reaction which only runs backwards is negated along with its column.
pub fn adapt_objective(
    objective: &DVector<f64>,
    map: &IrreversibilityMap,
    split: ObjectiveSplit,
) -> Result<DVector<f64>, ReconstructionError> {
    if objective.len() != map.num_original() {
        return Err(SystemError::DimensionMismatch {
            what: "objective",
            expected: map.num_original(),
            found: objective.len(),
        }
        .into());
    }
    let mut adapted = DVector::zeros(map.num_irreversible());
    for (reaction, weight) in objective.iter().enumerate() {
        if *weight == 0. {
            continue;
        }
        match (map.slots(reaction), split) {
            (Some(ReactionSlots::Single(index)), _) => adapted[index] = *weight,
            (Some(ReactionSlots::Reversed(index)), _) => adapted[index] = -*weight,
            (Some(ReactionSlots::Split { forward, .. }), ObjectiveSplit::ForwardOnly) => {
                adapted[forward] = *weight
            }
            (Some(ReactionSlots::Split { forward, backward }), ObjectiveSplit::Replicate) => {
                adapted[forward] = *weight;
                adapted[backward] = *weight;
            }
            (None, _) => {
                return Err(ReconstructionError::ReactionIndexOutOfRange {
                    index: reaction,
                    len: map.num_original(),
                })
            }
        }
    }
    Ok(adapted)
}

/// Fold values over irreversible reactions back to the original reactions, taking the
/// largest value of the halves of a split reaction
pub fn fold_back<T: PartialOrd + Copy>(
    values: &[T],
    map: &IrreversibilityMap,
) -> Result<Vec<T>, ReconstructionError> {
    if values.len() != map.num_irreversible() {
        return Err(SystemError::DimensionMismatch {
            what: "irreversible values",
            expected: map.num_irreversible(),
            found: values.len(),
        }
        .into());
    }
    Ok(map
        .iter()
        .map(|(_, slots)| match slots {
            ReactionSlots::Single(index) | ReactionSlots::Reversed(index) => values[index],
            ReactionSlots::Split { forward, backward } => {
                if values[backward] > values[forward] {
                    values[backward]
                } else {
                    values[forward]
                }
            }
        })
        .collect())
}

/// Net flux of every original reaction, `v_forward - v_backward` for split reactions
pub fn net_fluxes(fluxes: &DVector<f64>, map: &IrreversibilityMap) -> DVector<f64> {
    DVector::from_iterator(
        map.num_original(),
        map.iter().map(|(_, slots)| match slots {
            ReactionSlots::Single(index) => fluxes[index],
            ReactionSlots::Reversed(index) => -fluxes[index],
            ReactionSlots::Split { forward, backward } => fluxes[forward] - fluxes[backward],
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::system::StoichiometricSystem;
    use crate::reconstruction::irreversible::make_irreversible;
    use crate::reconstruction::Activity;
    use nalgebra_sparse::{CooMatrix, CscMatrix};

    /// Reactions: irreversible, reversible, irreversible
    fn map() -> IrreversibilityMap {
        let coo: CooMatrix<f64> = CooMatrix::new(1, 3);
        let system = StoichiometricSystem::new(
            CscMatrix::from(&coo),
            DVector::from_vec(vec![0., -10., 0.]),
            DVector::from_vec(vec![10., 10., 10.]),
        )
        .unwrap();
        make_irreversible(&system).unwrap().map
    }

    #[test]
    fn evidence_is_replicated() {
        let map = map();
        // New layout: r0 -> 0, r2 -> 1, r1 -> (2, 3)
        let evidence = map_evidence(vec![(1, 5.), (2, 0.5)], &map, EvidenceDefault::NoData).unwrap();
        assert_eq!(evidence.as_slice(), &[-1., 0.5, 5., 5.]);
        let evidence = map_evidence(vec![(0, 2.)], &map, EvidenceDefault::Zero).unwrap();
        assert_eq!(evidence.as_slice(), &[2., 0., 0., 0.]);
        match map_evidence(vec![(3, 1.)], &map, EvidenceDefault::Zero) {
            Err(ReconstructionError::ReactionIndexOutOfRange { index, len }) => {
                assert_eq!(index, 3);
                assert_eq!(len, 3);
            }
            _ => panic!("Out of range reaction not reported"),
        }
    }

    #[test]
    fn objective_split_policies() {
        let map = map();
        let objective = DVector::from_vec(vec![0., 2., 1.]);
        let forward = adapt_objective(&objective, &map, ObjectiveSplit::ForwardOnly).unwrap();
        assert_eq!(forward.as_slice(), &[0., 1., 2., 0.]);
        let replicated = adapt_objective(&objective, &map, ObjectiveSplit::Replicate).unwrap();
        assert_eq!(replicated.as_slice(), &[0., 1., 2., 2.]);
        assert!(adapt_objective(&DVector::zeros(4), &map, ObjectiveSplit::Replicate).is_err());
    }

    #[test]
    fn fold_back_takes_maximum() {
        let map = map();
        let activity = [
            Activity::Evidence,
            Activity::Inactive,
            Activity::Inactive,
            Activity::Flux,
        ];
        let folded = fold_back(&activity, &map).unwrap();
        assert_eq!(
            folded,
            vec![Activity::Evidence, Activity::Flux, Activity::Inactive]
        );
        assert!(fold_back(&activity[..3], &map).is_err());
    }

    #[test]
    fn net_flux() {
        let map = map();
        let fluxes = DVector::from_vec(vec![1., 2., 3., 7.]);
        assert_eq!(net_fluxes(&fluxes, &map).as_slice(), &[1., -4., 2.]);
    }

    #[test]
    fn backward_only_reaction() {
        // Uptake bounded [-10, 0], then an irreversible reaction
        let coo: CooMatrix<f64> = CooMatrix::new(1, 2);
        let system = StoichiometricSystem::new(
            CscMatrix::from(&coo),
            DVector::from_vec(vec![-10., 0.]),
            DVector::from_vec(vec![0., 10.]),
        )
        .unwrap();
        let map = make_irreversible(&system).unwrap().map;
        let objective = DVector::from_vec(vec![2., 1.]);
        let adapted = adapt_objective(&objective, &map, ObjectiveSplit::ForwardOnly).unwrap();
        assert_eq!(adapted.as_slice(), &[-2., 1.]);
        let fluxes = DVector::from_vec(vec![4., 4.]);
        assert_eq!(net_fluxes(&fluxes, &map).as_slice(), &[-4., 4.]);
        let evidence = map_evidence(vec![(0, 3.)], &map, EvidenceDefault::NoData).unwrap();
        assert_eq!(evidence.as_slice(), &[3., -1.]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::optimize::system::StoichiometricSystem;
    use crate::reconstruction::irreversible::make_irreversible;
    use nalgebra_sparse::{CooMatrix, CscMatrix};
    use proptest::prelude::*;

    fn map(reversible: &[bool]) -> IrreversibilityMap {
        let n = reversible.len();
        let coo: CooMatrix<f64> = CooMatrix::new(1, n);
        let lower = reversible.iter().map(|r| if *r { -10. } else { 0. });
        let system = StoichiometricSystem::new(
            CscMatrix::from(&coo),
            DVector::from_iterator(n, lower),
            DVector::from_element(n, 10.),
        )
        .unwrap();
        make_irreversible(&system).unwrap().map
    }

    proptest! {
        #[test]
        fn evidence_symmetry(
            data in prop::collection::vec((any::<bool>(), -1.0_f64..100.0), 1..30)
        ) {
            let reversible: Vec<bool> = data.iter().map(|d| d.0).collect();
            let map = map(&reversible);
            let evidence = map_evidence(
                data.iter().map(|d| d.1).enumerate(),
                &map,
                EvidenceDefault::NoData,
            ).unwrap();
            for (reaction, slots) in map.iter() {
                for index in slots.indices() {
                    prop_assert_eq!(evidence[index], data[reaction].1);
                }
            }
        }

        #[test]
        fn fold_back_idempotence(
            data in prop::collection::vec((any::<bool>(), -1.0_f64..100.0), 1..30)
        ) {
            let reversible: Vec<bool> = data.iter().map(|d| d.0).collect();
            let original: Vec<f64> = data.iter().map(|d| d.1).collect();
            let map = map(&reversible);
            let expanded = map_evidence(
                original.iter().copied().enumerate(),
                &map,
                EvidenceDefault::Zero,
            ).unwrap();
            let folded = fold_back(expanded.as_slice(), &map).unwrap();
            prop_assert_eq!(folded, original);
        }
    }
}
