//! Solver interface for HiGHS
use highs::{ColProblem, HighsModelStatus, Row, Sense};
use nalgebra::DVector;
use tracing::debug;

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{nonempty_rows, LinearSolver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// HiGHS dual simplex / interior point solver
#[derive(Clone, Debug, Default)]
pub struct HighsSolver {}

impl HighsSolver {
    pub fn new() -> Self {
        Self {}
    }
}

impl LinearSolver for HighsSolver {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(&mut self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let system = problem.system();
        let lower = system.lower_bounds();
        let upper = system.upper_bounds();
        let coefficients = problem.objective().coefficients();

        let mut lp = ColProblem::default();
        let (row_index, num_rows) = nonempty_rows(problem);
        let rows: Vec<Row> = (0..num_rows).map(|_| lp.add_row(0.0..=0.0)).collect();
        for j in 0..problem.num_variables() {
            let column = system.stoichiometry().col(j);
            let factors: Vec<(Row, f64)> = column
                .row_indices()
                .iter()
                .zip(column.values())
                .filter(|(_, value)| **value != 0.)
                .filter_map(|(row, value)| row_index[*row].map(|r| (rows[r], *value)))
                .collect();
            lp.add_column(coefficients[j], lower[j]..=upper[j], factors);
        }
        debug!(
            solver = self.name(),
            variables = problem.num_variables(),
            constraints = num_rows,
            "Solving linear program"
        );

        let sense = match problem.sense() {
            ObjectiveSense::Maximize => Sense::Maximise,
            ObjectiveSense::Minimize => Sense::Minimise,
        };
        let mut model = lp.optimise(sense);
        model.set_option("output_flag", false);
        let solved = model.solve();

        let status = match solved.status() {
            HighsModelStatus::Optimal => OptimizationStatus::Optimal,
            HighsModelStatus::Infeasible => OptimizationStatus::Infeasible,
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                OptimizationStatus::Unbounded
            }
            HighsModelStatus::SolveError | HighsModelStatus::PostsolveError => {
                OptimizationStatus::NumericalError
            }
            _ => OptimizationStatus::SolverHalted,
        };
        if !status.is_usable() {
            return Ok(ProblemSolution::failed(status));
        }
        let solution = solved.get_solution();
        let values = DVector::from_column_slice(solution.columns());
        Ok(ProblemSolution::solved(
            status,
            problem.objective().value_at(&values),
            values,
        ))
    }
}
