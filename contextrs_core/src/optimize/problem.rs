//! Provides struct representing a flux balance linear program
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::system::StoichiometricSystem;
use nalgebra::DVector;
use thiserror::Error;

/// A validated linear program over a stoichiometric system
///
/// maximize/minimize `c . v` subject to `S v = 0` and `lb <= v <= ub`. The problem borrows
/// the system, so several objectives can be solved against the same system without copying
/// the matrix.
#[derive(Debug, Clone)]
pub struct Problem<'a> {
    /// Constraints of the optimization problem
    system: &'a StoichiometricSystem,
    /// Objective to optimize
    objective: Objective,
}

impl<'a> Problem<'a> {
    // region Creation Functions
    /// Create a new optimization problem, checking the variable bounds and objective
    pub fn new(
        system: &'a StoichiometricSystem,
        objective: Objective,
    ) -> Result<Self, ProblemError> {
        Problem::validate(system, &objective)?;
        Ok(Self { system, objective })
    }

    /// Create a new maximization problem
    pub fn new_maximization(
        system: &'a StoichiometricSystem,
        coefficients: DVector<f64>,
    ) -> Result<Self, ProblemError> {
        Self::new(system, Objective::new_maximize(coefficients))
    }

    /// Create a new minimization problem
    pub fn new_minimization(
        system: &'a StoichiometricSystem,
        coefficients: DVector<f64>,
    ) -> Result<Self, ProblemError> {
        Self::new(system, Objective::new_minimize(coefficients))
    }
    // endregion Creation Functions

    pub fn system(&self) -> &StoichiometricSystem {
        self.system
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.objective.sense()
    }

    /// Number of variables (one flux per reaction)
    pub fn num_variables(&self) -> usize {
        self.system.num_reactions()
    }

    /// Number of equality constraints (one mass balance per metabolite)
    pub fn num_constraints(&self) -> usize {
        self.system.num_metabolites()
    }

    // region Validation Functions
    fn validate(system: &StoichiometricSystem, objective: &Objective) -> Result<(), ProblemError> {
        let n = system.num_reactions();
        if objective.len() != n {
            return Err(ProblemError::DimensionMismatch {
                expected: n,
                found: objective.len(),
            });
        }
        let lower = system.lower_bounds();
        let upper = system.upper_bounds();
        for index in 0..n {
            let (lb, ub) = (lower[index], upper[index]);
            // NaN fails both comparisons so it has to be checked on its own
            if lb.is_nan() || ub.is_nan() || lb > ub {
                return Err(ProblemError::InvalidVariableBounds {
                    index,
                    lower: lb,
                    upper: ub,
                });
            }
        }
        if let Some(index) = objective.coefficients().iter().position(|c| !c.is_finite()) {
            return Err(ProblemError::NonFiniteObjective { index });
        }
        Ok(())
    }
    // endregion Validation Functions
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// Error when a variable has invalid bounds
    #[error("Variable {index} has lower_bound ({lower}) > upper_bound ({upper})")]
    InvalidVariableBounds { index: usize, lower: f64, upper: f64 },
    /// Error when the objective length differs from the number of variables
    #[error("Objective has {found} coefficients but the problem has {expected} variables")]
    DimensionMismatch { expected: usize, found: usize },
    /// Error when an objective coefficient is infinite or NaN
    #[error("Objective coefficient {index} is not finite")]
    NonFiniteObjective { index: usize },
}
