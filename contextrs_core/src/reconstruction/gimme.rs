//! GIMME: Gene Inactivity Moderated by Metabolism and Expression
//!
//! The engine runs two linear programs over the irreversible form of a system:
//!
//! 1. Capacity: for every objective `o_k`, maximize `o_k . v` and record the optimum `f_k`.
//! 2. Penalty: raise the lower bounds of the objective reactions to `sum_k o_k * f_k`, and
//!    minimize the flux through reactions whose evidence is below the flux threshold,
//!    weighted by how far below the threshold the evidence is.
//!
//! Reactions carrying flux in the penalty solution, or with evidence above the threshold,
//! are kept in the reconstruction.
use derive_builder::Builder;
use indexmap::IndexMap;
use nalgebra::DVector;
use tracing::debug;

use crate::configuration::{self, Solver};
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::solvers::{new_solver, LinearSolver, SolverError};
use crate::optimize::system::StoichiometricSystem;
use crate::optimize::{OptimizationStatus, ProblemSolution};
use crate::reconstruction::irreversible::{
    assume_irreversible, make_irreversible, IrreversibilityMap,
};
use crate::reconstruction::mapping::{
    adapt_objective, fold_back, map_evidence, net_fluxes, EvidenceDefault, ObjectiveSplit,
    NO_EVIDENCE,
};
use crate::reconstruction::omics::IntegratedScores;
use crate::reconstruction::properties::{PropertyValidationError, Validator};
use crate::reconstruction::{
    Activity, AlgorithmKind, Phase, Reconstruction, ReconstructionError,
};

/// Fraction of each objective's optimum used when none is given
pub const DEFAULT_OBJ_FRAC: f64 = 0.9;

/// Validated GIMME properties
///
/// Built through [`GimmePropertiesBuilder`], whose `build` reports every invalid field at
/// once.
///
/// # Examples
/// ```rust
/// use contextrs_core::reconstruction::gimme::GimmePropertiesBuilder;
/// use nalgebra::DVector;
///
/// let properties = GimmePropertiesBuilder::default()
///     .exp_vector(vec![5., 0., -1.])
///     .objectives(vec![DVector::from_vec(vec![0., 0., 1.])])
///     .flux_threshold(1.)
///     .build()
///     .unwrap();
/// assert_eq!(properties.obj_frac(), &[0.9]);
/// assert!(properties.preprocess());
/// ```
#[derive(Builder, Clone, Debug, PartialEq)]
#[builder(build_fn(skip))]
pub struct GimmeProperties {
    /// Evidence for every reaction of the model, `-1` marks a reaction without data
    exp_vector: Vec<f64>,
    /// Objective weight vectors over the model's reactions
    objectives: Vec<DVector<f64>>,
    /// Fraction of every objective's optimum, validated and carried but not applied
    obj_frac: Vec<f64>,
    /// Whether to split reversible reactions before solving
    preprocess: bool,
    /// Evidence threshold, reactions with evidence below it are penalized
    flux_threshold: f64,
    /// Placement of objective weights on split reactions
    objective_split: ObjectiveSplit,
    /// Linear program backend
    solver: Solver,
    /// Flux above which a reaction counts as carrying flux
    flux_tolerance: f64,
}

impl GimmePropertiesBuilder {
    /// Validate the fields and build the properties
    ///
    /// Optional fields take their defaults: `obj_frac` is 0.9 for every objective,
    /// `preprocess` is true, and the flux threshold and solver come from
    /// [`configuration::current`]. The flux tolerance is 0 for the simplex backends and the
    /// configured tolerance for Clarabel.
    pub fn build(&self) -> Result<GimmeProperties, PropertyValidationError> {
        let config = configuration::current();
        let mut validator = Validator::new(AlgorithmKind::Gimme);

        let exp_vector = self.exp_vector.clone().unwrap_or_default();
        match &self.exp_vector {
            None => validator.violate("exp_vector", "is required"),
            Some(values) if values.is_empty() => validator.violate("exp_vector", "is empty"),
            Some(values) => {
                if let Some(index) = values.iter().position(|v| !v.is_finite()) {
                    validator.violate(
                        "exp_vector",
                        format!("value for reaction {} is not finite", index),
                    );
                }
            }
        }

        let objectives = self.objectives.clone().unwrap_or_default();
        match &self.objectives {
            None => validator.violate("objectives", "is required"),
            Some(list) if list.is_empty() => validator.violate("objectives", "is empty"),
            Some(list) => {
                for (k, objective) in list.iter().enumerate() {
                    if objective.is_empty() {
                        validator.violate("objectives", format!("objective {} is empty", k));
                    } else if objective.iter().any(|w| !w.is_finite()) {
                        validator.violate(
                            "objectives",
                            format!("objective {} has a weight which is not finite", k),
                        );
                    } else if objective.iter().all(|w| *w == 0.) {
                        validator.violate(
                            "objectives",
                            format!("objective {} has no nonzero weight", k),
                        );
                    }
                }
            }
        }

        let obj_frac = self
            .obj_frac
            .clone()
            .unwrap_or_else(|| vec![DEFAULT_OBJ_FRAC; objectives.len()]);
        validator.check(
            obj_frac.len() == objectives.len(),
            "obj_frac",
            format!(
                "has {} values for {} objectives",
                obj_frac.len(),
                objectives.len()
            ),
        );
        validator.check(
            obj_frac.iter().all(|f| (0. ..=1.).contains(f)),
            "obj_frac",
            "values must be within [0, 1]",
        );

        let flux_threshold = self.flux_threshold.unwrap_or(config.flux_threshold);
        validator.check(
            flux_threshold.is_finite() && flux_threshold > 0.,
            "flux_threshold",
            format!("must be finite and positive, found {}", flux_threshold),
        );

        let solver = self.solver.unwrap_or(config.solver);
        let flux_tolerance = self
            .flux_tolerance
            .unwrap_or_else(|| default_flux_tolerance(solver, config.tolerance));
        validator.check(
            flux_tolerance.is_finite() && flux_tolerance >= 0.,
            "flux_tolerance",
            format!("must be finite and non-negative, found {}", flux_tolerance),
        );

        validator.finish()?;
        Ok(GimmeProperties {
            exp_vector,
            objectives,
            obj_frac,
            preprocess: self.preprocess.unwrap_or(true),
            flux_threshold,
            objective_split: self.objective_split.unwrap_or_default(),
            solver,
            flux_tolerance,
        })
    }
}

/// Simplex backends return vertex solutions with exact zeros, interior point solutions
/// need the configured tolerance
fn default_flux_tolerance(solver: Solver, tolerance: f64) -> f64 {
    match solver {
        Solver::Microlp | Solver::Highs => 0.,
        Solver::Clarabel => tolerance,
    }
}

/// GIMME options with objectives given by reaction id
///
/// Used when the evidence comes from omics data rather than a ready made evidence vector.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GimmeOptions {
    /// Objectives as reaction id -> weight
    pub objectives: Vec<IndexMap<String, f64>>,
    pub obj_frac: Option<Vec<f64>>,
    pub preprocess: Option<bool>,
    pub flux_threshold: Option<f64>,
    pub objective_split: Option<ObjectiveSplit>,
    pub solver: Option<Solver>,
    pub flux_tolerance: Option<f64>,
}

impl GimmeOptions {
    /// Options with a single objective of weight 1 on `reaction_id`
    pub fn maximizing(reaction_id: &str) -> Self {
        Self {
            objectives: vec![IndexMap::from([(reaction_id.to_string(), 1.)])],
            ..Default::default()
        }
    }
}

impl GimmeProperties {
    /// Create properties from integrated omics scores
    ///
    /// Reactions without a score receive the no evidence value `-1`. Objective reaction ids
    /// are resolved against `reaction_ids` (the model's reaction order).
    pub fn from_integrated_scores(
        scores: &IntegratedScores,
        options: &GimmeOptions,
        reaction_ids: &[String],
    ) -> Result<GimmeProperties, ReconstructionError> {
        let exp_vector: Vec<f64> = match scores {
            IntegratedScores::Continuous(values) => values
                .iter()
                .map(|score| score.unwrap_or(NO_EVIDENCE))
                .collect(),
            IntegratedScores::Selection(_) => {
                return Err(PropertyValidationError::single(
                    AlgorithmKind::Gimme,
                    "exp_vector",
                    "requires continuous scores, found a reaction selection",
                )
                .into())
            }
        };

        let mut objectives = Vec::with_capacity(options.objectives.len());
        for weights in &options.objectives {
            let mut objective = DVector::zeros(reaction_ids.len());
            for (id, weight) in weights {
                let index = reaction_ids
                    .iter()
                    .position(|r| r == id)
                    .ok_or_else(|| ReconstructionError::UnknownReaction(id.clone()))?;
                objective[index] = *weight;
            }
            objectives.push(objective);
        }

        let mut builder = GimmePropertiesBuilder::default();
        builder.exp_vector(exp_vector).objectives(objectives);
        if let Some(obj_frac) = &options.obj_frac {
            builder.obj_frac(obj_frac.clone());
        }
        if let Some(preprocess) = options.preprocess {
            builder.preprocess(preprocess);
        }
        if let Some(threshold) = options.flux_threshold {
            builder.flux_threshold(threshold);
        }
        if let Some(split) = options.objective_split {
            builder.objective_split(split);
        }
        if let Some(solver) = options.solver {
            builder.solver(solver);
        }
        if let Some(tolerance) = options.flux_tolerance {
            builder.flux_tolerance(tolerance);
        }
        Ok(builder.build()?)
    }

    pub fn exp_vector(&self) -> &[f64] {
        &self.exp_vector
    }

    pub fn objectives(&self) -> &[DVector<f64>] {
        &self.objectives
    }

    pub fn obj_frac(&self) -> &[f64] {
        &self.obj_frac
    }

    pub fn preprocess(&self) -> bool {
        self.preprocess
    }

    pub fn flux_threshold(&self) -> f64 {
        self.flux_threshold
    }

    pub fn objective_split(&self) -> ObjectiveSplit {
        self.objective_split
    }

    pub fn solver(&self) -> Solver {
        self.solver
    }

    pub fn flux_tolerance(&self) -> f64 {
        self.flux_tolerance
    }

    /// Check the per reaction lengths against a system with `num_reactions` reactions
    fn check_dimensions(&self, num_reactions: usize) -> Result<(), PropertyValidationError> {
        let mut validator = Validator::new(AlgorithmKind::Gimme);
        validator.check(
            self.exp_vector.len() == num_reactions,
            "exp_vector",
            format!(
                "has {} values but the model has {} reactions",
                self.exp_vector.len(),
                num_reactions
            ),
        );
        for (k, objective) in self.objectives.iter().enumerate() {
            validator.check(
                objective.len() == num_reactions,
                "objectives",
                format!(
                    "objective {} has {} weights but the model has {} reactions",
                    k,
                    objective.len(),
                    num_reactions
                ),
            );
        }
        validator.finish()
    }
}

// region Pure Functions
/// Penalty weight of every reaction
///
/// `threshold - evidence` for evidence strictly between the no evidence value and the
/// threshold, zero otherwise.
pub fn penalty_objective(evidence: &DVector<f64>, threshold: f64) -> DVector<f64> {
    evidence.map(|e| {
        if e > NO_EVIDENCE && e < threshold {
            threshold - e
        } else {
            0.
        }
    })
}

/// Raise the lower bounds of objective reactions to `sum_k o_k * f_k`
///
/// Bounds are only ever raised. A raised bound which overshoots the upper bound by no more
/// than `tolerance` is clamped to the upper bound. Returns the new lower bounds and the
/// number of raised bounds.
pub fn tighten_lower_bounds(
    lower: &DVector<f64>,
    upper: &DVector<f64>,
    objectives: &[DVector<f64>],
    optima: &[f64],
    tolerance: f64,
) -> (DVector<f64>, usize) {
    let mut objective_lb = DVector::zeros(lower.len());
    for (objective, optimum) in objectives.iter().zip(optima) {
        objective_lb += objective * *optimum;
    }
    let mut tightened = lower.clone();
    let mut count = 0;
    for (index, candidate) in objective_lb.iter().enumerate() {
        if *candidate == 0. || *candidate <= lower[index] {
            continue;
        }
        let overshoot = *candidate - upper[index];
        tightened[index] = if overshoot > 0. && overshoot <= tolerance {
            upper[index]
        } else {
            *candidate
        };
        count += 1;
    }
    (tightened, count)
}

/// Activity of every irreversible reaction given its evidence and penalty flux
///
/// A reaction carries flux when its flux is above `flux_tolerance`.
pub fn derive_activity(
    evidence: &DVector<f64>,
    fluxes: &DVector<f64>,
    threshold: f64,
    flux_tolerance: f64,
) -> Vec<Activity> {
    evidence
        .iter()
        .zip(fluxes.iter())
        .map(|(e, v)| {
            if *v > flux_tolerance {
                Activity::Flux
            } else if *e > threshold || *e == NO_EVIDENCE {
                Activity::Evidence
            } else {
                Activity::Inactive
            }
        })
        .collect()
}
// endregion Pure Functions

/// Result of a GIMME run
#[derive(Clone, Debug)]
pub struct GimmeSolution {
    /// Activity of the original reactions
    pub activity: Vec<Activity>,
    /// Activity of the irreversible reactions
    pub irreversible_activity: Vec<Activity>,
    /// Optimum of every objective in the capacity phase
    pub objective_values: Vec<f64>,
    /// Optimum of the penalty phase
    pub penalty_value: f64,
    /// Fluxes through the irreversible reactions in the penalty solution
    pub fluxes: DVector<f64>,
    /// Net flux through the original reactions
    pub net_fluxes: DVector<f64>,
    /// Map between original and irreversible reactions
    pub map: IrreversibilityMap,
}

impl GimmeSolution {
    pub fn reconstruction(&self) -> Reconstruction {
        Reconstruction {
            algorithm: AlgorithmKind::Gimme,
            activity: self.activity.clone(),
        }
    }
}

/// GIMME engine over a borrowed system
pub struct Gimme<'a> {
    system: &'a StoichiometricSystem,
    properties: &'a GimmeProperties,
}

impl<'a> Gimme<'a> {
    pub fn new(system: &'a StoichiometricSystem, properties: &'a GimmeProperties) -> Self {
        Self { system, properties }
    }

    /// Run with a new session of the solver named in the properties
    pub fn run(&self) -> Result<GimmeSolution, ReconstructionError> {
        let mut solver = new_solver(self.properties.solver)?;
        self.run_with_solver(solver.as_mut())
    }

    /// Run with the given solver session
    pub fn run_with_solver(
        &self,
        solver: &mut dyn LinearSolver,
    ) -> Result<GimmeSolution, ReconstructionError> {
        let properties = self.properties;
        properties.check_dimensions(self.system.num_reactions())?;
        let tolerance = configuration::current().tolerance;
        let threshold = properties.flux_threshold;

        let irreversible = if properties.preprocess {
            make_irreversible(self.system)?
        } else {
            assume_irreversible(self.system)?
        };
        let map = irreversible.map;
        let evidence = map_evidence(
            properties.exp_vector.iter().copied().enumerate(),
            &map,
            EvidenceDefault::NoData,
        )?;
        let objectives = properties
            .objectives
            .iter()
            .map(|objective| adapt_objective(objective, &map, properties.objective_split))
            .collect::<Result<Vec<_>, _>>()?;

        // Capacity phase
        let mut optima = Vec::with_capacity(objectives.len());
        for (k, objective) in objectives.iter().enumerate() {
            let problem = Problem::new_maximization(&irreversible.system, objective.clone())
                .map_err(SolverError::from)?;
            let solution = solver.solve(&problem)?;
            let optimum = match (solution.is_usable(), solution.objective_value) {
                (true, Some(value)) => value,
                _ => {
                    return Err(ReconstructionError::ReconstructionInfeasible {
                        phase: Phase::Capacity,
                        objective: Some(k),
                        status: solution.status,
                    })
                }
            };
            debug!(solver = solver.name(), objective = k, optimum, "Capacity optimum");
            optima.push(optimum);
        }

        let (lower, tightened) = tighten_lower_bounds(
            irreversible.system.lower_bounds(),
            irreversible.system.upper_bounds(),
            &objectives,
            &optima,
            tolerance,
        );
        debug!(tightened, "Raised objective lower bounds");
        let system = irreversible.system.with_lower_bounds(lower)?;

        // Penalty phase
        let penalty = penalty_objective(&evidence, threshold);
        let problem = match Problem::new_minimization(&system, penalty) {
            Ok(problem) => problem,
            Err(ProblemError::InvalidVariableBounds { .. }) => {
                return Err(ReconstructionError::ReconstructionInfeasible {
                    phase: Phase::Penalty,
                    objective: None,
                    status: OptimizationStatus::Infeasible,
                })
            }
            Err(err) => return Err(SolverError::from(err).into()),
        };
        let (penalty_value, fluxes) = match solver.solve(&problem)? {
            ProblemSolution {
                status,
                objective_value: Some(value),
                variable_values: Some(fluxes),
            } if status.is_usable() => (value, fluxes),
            failed => {
                return Err(ReconstructionError::ReconstructionInfeasible {
                    phase: Phase::Penalty,
                    objective: None,
                    status: failed.status,
                })
            }
        };
        debug!(solver = solver.name(), penalty = penalty_value, "Penalty optimum");

        let irreversible_activity =
            derive_activity(&evidence, &fluxes, threshold, properties.flux_tolerance);
        let activity = fold_back(&irreversible_activity, &map)?;
        let net_fluxes = net_fluxes(&fluxes, &map);
        Ok(GimmeSolution {
            activity,
            irreversible_activity,
            objective_values: optima,
            penalty_value,
            fluxes,
            net_fluxes,
            map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::solvers::test_problems;
    use nalgebra_sparse::{CooMatrix, CscMatrix};
    use std::collections::VecDeque;

    fn properties(exp_vector: Vec<f64>, objectives: Vec<Vec<f64>>, threshold: f64) -> GimmeProperties {
        GimmePropertiesBuilder::default()
            .exp_vector(exp_vector)
            .objectives(objectives.into_iter().map(DVector::from_vec).collect())
            .flux_threshold(threshold)
            .solver(Solver::Microlp)
            .build()
            .unwrap()
    }

    /// Returns scripted solutions in order, counting the solves
    struct ScriptedSolver {
        responses: VecDeque<ProblemSolution>,
        calls: usize,
    }

    impl LinearSolver for ScriptedSolver {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn solve(&mut self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
            self.calls += 1;
            Ok(self.responses.pop_front().unwrap_or_else(|| {
                ProblemSolution::solved(
                    OptimizationStatus::Optimal,
                    0.,
                    DVector::zeros(problem.num_variables()),
                )
            }))
        }
    }

    #[test]
    fn builder_defaults() {
        let properties = properties(vec![1., 2.], vec![vec![1., 0.], vec![0., 1.]], 1.);
        assert_eq!(properties.obj_frac(), &[0.9, 0.9]);
        assert!(properties.preprocess());
        assert_eq!(properties.objective_split(), ObjectiveSplit::ForwardOnly);
        assert_eq!(properties.flux_tolerance(), 0.);
        let properties = GimmePropertiesBuilder::default()
            .exp_vector(vec![1.])
            .objectives(vec![DVector::from_vec(vec![1.])])
            .build()
            .unwrap();
        assert!((properties.flux_threshold() - configuration::current().flux_threshold).abs() < 1e-25);
    }

    #[test]
    fn flux_tolerance_follows_solver() {
        let interior_point = GimmePropertiesBuilder::default()
            .exp_vector(vec![1.])
            .objectives(vec![DVector::from_vec(vec![1.])])
            .solver(Solver::Clarabel)
            .build()
            .unwrap();
        assert!(
            (interior_point.flux_tolerance() - configuration::current().tolerance).abs() < 1e-25
        );
        let explicit = GimmePropertiesBuilder::default()
            .exp_vector(vec![1.])
            .objectives(vec![DVector::from_vec(vec![1.])])
            .solver(Solver::Clarabel)
            .flux_tolerance(1e-3)
            .build()
            .unwrap();
        assert_eq!(explicit.flux_tolerance(), 1e-3);
        let err = GimmePropertiesBuilder::default()
            .exp_vector(vec![1.])
            .objectives(vec![DVector::from_vec(vec![1.])])
            .flux_tolerance(-1.)
            .build()
            .unwrap_err();
        assert!(err.violates("flux_tolerance"));

        // Any positive flux counts with a zero tolerance
        let evidence = DVector::from_vec(vec![0., 0.]);
        let fluxes = DVector::from_vec(vec![1e-9, 0.]);
        assert_eq!(
            derive_activity(&evidence, &fluxes, 1., 0.),
            vec![Activity::Flux, Activity::Inactive]
        );
    }

    #[test]
    fn builder_reports_every_violation() {
        let err = GimmePropertiesBuilder::default()
            .objectives(vec![DVector::zeros(2)])
            .obj_frac(vec![1.5])
            .flux_threshold(-1.)
            .build()
            .unwrap_err();
        assert!(err.violates("exp_vector"));
        assert!(err.violates("objectives"));
        assert!(err.violates("obj_frac"));
        assert!(err.violates("flux_threshold"));
        assert!(!err.violates("preprocess"));

        let err = GimmePropertiesBuilder::default()
            .exp_vector(vec![f64::NAN])
            .objectives(vec![DVector::from_vec(vec![1.]), DVector::from_vec(vec![1.])])
            .obj_frac(vec![0.9])
            .build()
            .unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(err.violates("exp_vector"));
        assert!(err.violates("obj_frac"));
    }

    #[test]
    fn penalty_weights() {
        let evidence = DVector::from_vec(vec![-1., 0., 0.5, 1., 2., -3.]);
        let penalty = penalty_objective(&evidence, 1.);
        assert_eq!(penalty.as_slice(), &[0., 1., 0.5, 0., 0., 0.]);
    }

    #[test]
    fn evidence_at_threshold() {
        let threshold = 1e-4;
        let evidence = DVector::from_vec(vec![threshold]);
        assert_eq!(penalty_objective(&evidence, threshold)[0], 0.);
        let activity = derive_activity(&evidence, &DVector::zeros(1), threshold, 1e-7);
        assert_eq!(activity, vec![Activity::Inactive]);
    }

    #[test]
    fn activity_without_data() {
        let evidence = DVector::from_vec(vec![NO_EVIDENCE, NO_EVIDENCE, 0.]);
        let fluxes = DVector::from_vec(vec![0., 3., 1e-9]);
        let activity = derive_activity(&evidence, &fluxes, 1., 1e-7);
        assert_eq!(
            activity,
            vec![Activity::Evidence, Activity::Flux, Activity::Inactive]
        );
    }

    #[test]
    fn tightening_keeps_larger_bounds() {
        let lower = DVector::from_vec(vec![0., 5., 0., -2.]);
        let upper = DVector::from_vec(vec![10., 10., 10., 10.]);
        let objectives = vec![
            DVector::from_vec(vec![1., 0., 0., 0.]),
            DVector::from_vec(vec![0., 1., 0., 0.]),
            DVector::from_vec(vec![1., 0., 0., 0.]),
        ];
        let (tightened, count) =
            tighten_lower_bounds(&lower, &upper, &objectives, &[4., 3., 6.], 1e-7);
        assert_eq!(tightened.as_slice(), &[10., 5., 0., -2.]);
        assert_eq!(count, 1);

        // Round off above the upper bound is clamped
        let (tightened, _) =
            tighten_lower_bounds(&lower, &upper, &objectives[..1], &[10. + 1e-9], 1e-7);
        assert_eq!(tightened[0], 10.);
    }

    #[test]
    fn single_irreversible_reaction() {
        let coo: CooMatrix<f64> = CooMatrix::new(1, 1);
        let system = StoichiometricSystem::new(
            CscMatrix::from(&coo),
            DVector::from_vec(vec![0.]),
            DVector::from_vec(vec![10.]),
        )
        .unwrap();
        let properties = properties(vec![0.], vec![vec![1.]], 1e-4);
        let solution = Gimme::new(&system, &properties).run().unwrap();
        assert!((solution.objective_values[0] - 10.).abs() < 1e-9);
        assert!((solution.fluxes[0] - 10.).abs() < 1e-9);
        assert_eq!(solution.activity, vec![Activity::Flux]);
        assert!((solution.penalty_value - 1e-3).abs() < 1e-9);
    }

    #[test]
    fn pathway_prefers_supported_reaction() {
        // EX_A, R1 (A -> B), R2 (A <-> B), BIO
        let system = test_problems::pathway();
        let properties = properties(vec![NO_EVIDENCE, 10., 0., NO_EVIDENCE], vec![vec![0., 0., 0., 1.]], 1.);
        let solution = Gimme::new(&system, &properties).run().unwrap();
        assert!((solution.objective_values[0] - 10.).abs() < 1e-9);
        assert_eq!(solution.map.num_split(), 1);
        assert_eq!(
            solution.activity,
            vec![Activity::Flux, Activity::Flux, Activity::Inactive, Activity::Flux]
        );
        assert!((solution.net_fluxes[1] - 10.).abs() < 1e-9);
        assert!(solution.net_fluxes[2].abs() < 1e-9);
        assert_eq!(solution.reconstruction().included(), vec![true, true, false, true]);
    }

    #[test]
    fn uptake_reaction_carries_flux() {
        // EX_A takes up A with bounds [-10, 0], R1 (A -> B), BIO drains B
        let mut coo = CooMatrix::new(2, 3);
        coo.push(0, 0, -1.);
        coo.push(0, 1, -1.);
        coo.push(1, 1, 1.);
        coo.push(1, 2, -1.);
        let system = StoichiometricSystem::new(
            CscMatrix::from(&coo),
            DVector::from_vec(vec![-10., 0., 0.]),
            DVector::from_vec(vec![0., 1000., 1000.]),
        )
        .unwrap();
        let properties = properties(vec![0., 10., NO_EVIDENCE], vec![vec![0., 0., 1.]], 1.);
        let solution = Gimme::new(&system, &properties).run().unwrap();
        assert!((solution.objective_values[0] - 10.).abs() < 1e-9);
        assert!((solution.penalty_value - 10.).abs() < 1e-9);
        assert!(solution.fluxes.iter().all(|v| *v >= -1e-9));
        assert!((solution.net_fluxes[0] + 10.).abs() < 1e-9);
        assert!((solution.net_fluxes[2] - 10.).abs() < 1e-9);
        assert_eq!(
            solution.activity,
            vec![Activity::Flux, Activity::Flux, Activity::Flux]
        );
    }

    #[test]
    fn preprocess_disabled() {
        let system = test_problems::pathway();
        let mut builder = GimmePropertiesBuilder::default();
        builder
            .exp_vector(vec![1.; 4])
            .objectives(vec![DVector::from_vec(vec![0., 0., 0., 1.])])
            .preprocess(false);
        let properties = builder.build().unwrap();
        match Gimme::new(&system, &properties).run() {
            Err(ReconstructionError::NotIrreversible { reaction }) => assert_eq!(reaction, 2),
            _ => panic!("Reversible reaction accepted without preprocessing"),
        }
    }

    #[test]
    fn dimension_mismatch() {
        let system = test_problems::pathway();
        let properties = properties(vec![1.; 3], vec![vec![1.; 5]], 1.);
        match Gimme::new(&system, &properties).run() {
            Err(ReconstructionError::PropertyValidation(err)) => {
                assert!(err.violates("exp_vector"));
                assert!(err.violates("objectives"));
            }
            _ => panic!("Length mismatch not reported"),
        }
    }

    #[test]
    fn infeasible_objective_fails_run() {
        let system = test_problems::pathway();
        let properties = properties(
            vec![1.; 4],
            vec![vec![0., 0., 0., 1.], vec![1., 0., 0., 0.], vec![0., 1., 0., 0.]],
            1.,
        );
        let mut solver = ScriptedSolver {
            responses: VecDeque::from([
                ProblemSolution::solved(OptimizationStatus::Optimal, 10., DVector::zeros(5)),
                ProblemSolution::failed(OptimizationStatus::Infeasible),
            ]),
            calls: 0,
        };
        match Gimme::new(&system, &properties).run_with_solver(&mut solver) {
            Err(ReconstructionError::ReconstructionInfeasible {
                phase,
                objective,
                status,
            }) => {
                assert_eq!(phase, Phase::Capacity);
                assert_eq!(objective, Some(1));
                assert_eq!(status, OptimizationStatus::Infeasible);
            }
            _ => panic!("Infeasible objective skipped"),
        }
        assert_eq!(solver.calls, 2);
    }

    #[test]
    fn infeasible_penalty_phase() {
        let system = test_problems::pathway();
        let properties = properties(vec![1.; 4], vec![vec![0., 0., 0., 1.]], 1.);
        let mut solver = ScriptedSolver {
            responses: VecDeque::from([
                ProblemSolution::solved(OptimizationStatus::Optimal, 10., DVector::zeros(5)),
                ProblemSolution::failed(OptimizationStatus::Unbounded),
            ]),
            calls: 0,
        };
        match Gimme::new(&system, &properties).run_with_solver(&mut solver) {
            Err(ReconstructionError::ReconstructionInfeasible {
                phase, objective, ..
            }) => {
                assert_eq!(phase, Phase::Penalty);
                assert_eq!(objective, None);
            }
            _ => panic!("Failed penalty phase not reported"),
        }
    }

    #[test]
    fn unreachable_objective_bound() {
        // A capacity optimum above the upper bound leaves no feasible penalty problem
        let system = test_problems::pathway();
        let properties = properties(vec![1.; 4], vec![vec![0., 0., 0., 1.]], 1.);
        let mut solver = ScriptedSolver {
            responses: VecDeque::from([ProblemSolution::solved(
                OptimizationStatus::Optimal,
                5000.,
                DVector::zeros(5),
            )]),
            calls: 0,
        };
        match Gimme::new(&system, &properties).run_with_solver(&mut solver) {
            Err(ReconstructionError::ReconstructionInfeasible { phase, status, .. }) => {
                assert_eq!(phase, Phase::Penalty);
                assert_eq!(status, OptimizationStatus::Infeasible);
            }
            _ => panic!("Unreachable bound not reported"),
        }
        assert_eq!(solver.calls, 1);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn penalty_non_negative(
            evidence in prop::collection::vec(-5.0_f64..5.0, 1..50),
            threshold in 0.001_f64..4.0,
        ) {
            let evidence = DVector::from_vec(evidence);
            let penalty = penalty_objective(&evidence, threshold);
            for (p, e) in penalty.iter().zip(evidence.iter()) {
                prop_assert!(*p >= 0.);
                if *e >= threshold || *e == NO_EVIDENCE {
                    prop_assert_eq!(*p, 0.);
                }
            }
        }

        #[test]
        fn monotonic_tightening(
            bounds in prop::collection::vec(
                (-50.0_f64..50.0, 0.0_f64..100.0).prop_map(|(lb, w)| (lb, lb + w)),
                1..20,
            ),
            weights in prop::collection::vec(-2.0_f64..2.0, 20),
            optimum in -100.0_f64..100.0,
        ) {
            let n = bounds.len();
            let lower = DVector::from_iterator(n, bounds.iter().map(|b| b.0));
            let upper = DVector::from_iterator(n, bounds.iter().map(|b| b.1));
            let objective = DVector::from_iterator(n, weights.iter().copied().take(n));
            let (tightened, _) =
                tighten_lower_bounds(&lower, &upper, &[objective], &[optimum], 1e-7);
            for index in 0..n {
                prop_assert!(tightened[index] >= lower[index]);
            }
        }
    }
}
