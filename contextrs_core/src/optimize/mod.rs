//! Module for constructing and solving flux balance linear programs

pub mod objective;
pub mod problem;
pub mod solvers;
pub mod system;

use std::fmt::{Display, Formatter};

use nalgebra::DVector;

/// Struct representing the solution to an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemSolution {
    /// The status of the optimization problem, representing if the optimization was
    /// completed successfully
    pub status: OptimizationStatus,
    /// Optimized value of the objective
    ///
    /// Some(f64) if the optimization was completed successfully, None otherwise
    pub objective_value: Option<f64>,
    /// Values of the variables at the optimum, in variable order
    ///
    /// Some(DVector) if the problem could be solved, None otherwise
    pub variable_values: Option<DVector<f64>>,
}

impl ProblemSolution {
    /// Solution with a value for every variable
    pub fn solved(
        status: OptimizationStatus,
        objective_value: f64,
        variable_values: DVector<f64>,
    ) -> Self {
        Self {
            status,
            objective_value: Some(objective_value),
            variable_values: Some(variable_values),
        }
    }

    /// Solution of a problem which could not be solved
    pub fn failed(status: OptimizationStatus) -> Self {
        Self {
            status,
            objective_value: None,
            variable_values: None,
        }
    }

    /// Whether the values in this solution can be used
    pub fn is_usable(&self) -> bool {
        self.status.is_usable() && self.variable_values.is_some()
    }
}

/// Status of an optimization problem
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OptimizationStatus {
    /// Problem has been optimized
    Optimal,
    /// Problem can't be optimized because objective value is not bounded
    Unbounded,
    /// Problem can't be solved because it is infeasible (conflicting constraints)
    Infeasible,
    /// An approximate solution has been found
    AlmostOptimal,
    /// A numerical error occurred during solving
    NumericalError,
    /// The solver hit the maximum allowed iterations, or max time, or made insufficient progress
    SolverHalted,
}

impl OptimizationStatus {
    pub fn is_usable(&self) -> bool {
        matches!(
            self,
            OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal
        )
    }
}

impl Display for OptimizationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            OptimizationStatus::Optimal => "optimal",
            OptimizationStatus::Unbounded => "unbounded",
            OptimizationStatus::Infeasible => "infeasible",
            OptimizationStatus::AlmostOptimal => "almost optimal",
            OptimizationStatus::NumericalError => "numerical error",
            OptimizationStatus::SolverHalted => "solver halted",
        };
        write!(f, "{}", status)
    }
}
