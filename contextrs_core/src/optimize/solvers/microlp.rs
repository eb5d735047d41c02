//! Solver interface for the microlp simplex solver
use microlp::{ComparisonOp, LinearExpr, OptimizationDirection};
use nalgebra::DVector;
use tracing::debug;

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{nonempty_rows, LinearSolver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Pure rust dense simplex solver, returns vertex solutions
#[derive(Clone, Debug, Default)]
pub struct MicrolpSolver {}

impl MicrolpSolver {
    pub fn new() -> Self {
        Self {}
    }
}

impl LinearSolver for MicrolpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&mut self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let system = problem.system();
        let direction = match problem.sense() {
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
        };
        let mut lp = microlp::Problem::new(direction);

        let coefficients = problem.objective().coefficients();
        let lower = system.lower_bounds();
        let upper = system.upper_bounds();
        let variables: Vec<microlp::Variable> = (0..problem.num_variables())
            .map(|j| lp.add_var(coefficients[j], (lower[j], upper[j])))
            .collect();

        // One mass balance row per metabolite which appears in some reaction
        let (row_index, num_rows) = nonempty_rows(problem);
        let mut rows: Vec<LinearExpr> = (0..num_rows).map(|_| LinearExpr::empty()).collect();
        for (row, column, value) in system.stoichiometry().triplet_iter() {
            if let Some(new_row) = row_index[row] {
                if *value != 0. {
                    rows[new_row].add(variables[column], *value);
                }
            }
        }
        for expr in rows {
            lp.add_constraint(expr, ComparisonOp::Eq, 0.);
        }
        debug!(
            solver = self.name(),
            variables = variables.len(),
            constraints = num_rows,
            "Solving linear program"
        );

        let solution = match lp.solve() {
            Ok(solution) => solution,
            Err(microlp::Error::Infeasible) => {
                return Ok(ProblemSolution::failed(OptimizationStatus::Infeasible))
            }
            Err(microlp::Error::Unbounded) => {
                return Ok(ProblemSolution::failed(OptimizationStatus::Unbounded))
            }
            Err(err) => return Err(SolverError::Backend(err.to_string())),
        };
        let values = DVector::from_iterator(
            variables.len(),
            variables.iter().map(|variable| solution[*variable]),
        );
        Ok(ProblemSolution::solved(
            OptimizationStatus::Optimal,
            problem.objective().value_at(&values),
            values,
        ))
    }
}
