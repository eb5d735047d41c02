//! Implements a solver interface for Clarabel
use clarabel::algebra::CscMatrix;
use clarabel::solver::{DefaultSettings, DefaultSolver, IPSolver, SolverStatus, SupportedConeT};
use nalgebra::DVector;
use tracing::debug;

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{nonempty_rows, LinearSolver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Interior point conic solver
///
/// The linear program is written in Clarabel's `A x + s = b, s in K` form: mass balance rows
/// go in the zero cone, finite upper bounds (`x + s = ub`) and finite lower bounds
/// (`-x + s = -lb`) go in the nonnegative cone.
#[derive(Clone, Debug, Default)]
pub struct ClarabelSolver {
    /// Print solver progress
    pub verbose: bool,
}

impl ClarabelSolver {
    pub fn new() -> Self {
        Self { verbose: false }
    }
}

impl LinearSolver for ClarabelSolver {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn solve(&mut self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let system = problem.system();
        let n = problem.num_variables();
        let lower = system.lower_bounds();
        let upper = system.upper_bounds();

        // Clarabel minimizes
        let coefficients = problem.objective().coefficients().iter();
        let q: Vec<f64> = match problem.sense() {
            ObjectiveSense::Minimize => coefficients.copied().collect(),
            ObjectiveSense::Maximize => coefficients.map(|c| -c).collect(),
        };

        // Row numbering: mass balance rows, then upper bound rows, then lower bound rows, which
        // keeps the row indices of each column sorted
        let (row_index, num_balance) = nonempty_rows(problem);
        let mut upper_row = vec![None; n];
        let mut num_upper = 0;
        for (j, ub) in upper.iter().enumerate() {
            if ub.is_finite() {
                upper_row[j] = Some(num_balance + num_upper);
                num_upper += 1;
            }
        }
        let mut lower_row = vec![None; n];
        let mut num_lower = 0;
        for (j, lb) in lower.iter().enumerate() {
            if lb.is_finite() {
                lower_row[j] = Some(num_balance + num_upper + num_lower);
                num_lower += 1;
            }
        }
        let num_rows = num_balance + num_upper + num_lower;
        if num_rows == 0 {
            return Ok(unconstrained(problem));
        }

        let mut colptr = Vec::with_capacity(n + 1);
        let mut rowval = Vec::new();
        let mut nzval = Vec::new();
        let mut b = vec![0.; num_rows];
        colptr.push(0);
        for j in 0..n {
            let column = system.stoichiometry().col(j);
            let mut entries: Vec<(usize, f64)> = column
                .row_indices()
                .iter()
                .zip(column.values())
                .filter(|(_, value)| **value != 0.)
                .filter_map(|(row, value)| row_index[*row].map(|r| (r, *value)))
                .collect();
            entries.sort_by_key(|(row, _)| *row);
            for (row, value) in entries {
                rowval.push(row);
                nzval.push(value);
            }
            if let Some(row) = upper_row[j] {
                rowval.push(row);
                nzval.push(1.);
                b[row] = upper[j];
            }
            if let Some(row) = lower_row[j] {
                rowval.push(row);
                nzval.push(-1.);
                b[row] = -lower[j];
            }
            colptr.push(rowval.len());
        }
        let a = CscMatrix::new(num_rows, n, colptr, rowval, nzval);
        let p = CscMatrix::<f64>::zeros((n, n));

        let mut cones = Vec::new();
        if num_balance > 0 {
            cones.push(SupportedConeT::ZeroConeT(num_balance));
        }
        if num_upper + num_lower > 0 {
            cones.push(SupportedConeT::NonnegativeConeT(num_upper + num_lower));
        }
        let settings = DefaultSettings {
            verbose: self.verbose,
            ..DefaultSettings::default()
        };
        debug!(
            solver = self.name(),
            variables = n,
            constraints = num_rows,
            "Solving linear program"
        );

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = match solver.solution.status {
            SolverStatus::Solved => OptimizationStatus::Optimal,
            SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                OptimizationStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                OptimizationStatus::Unbounded
            }
            SolverStatus::NumericalError => OptimizationStatus::NumericalError,
            _ => OptimizationStatus::SolverHalted,
        };
        if !status.is_usable() {
            return Ok(ProblemSolution::failed(status));
        }
        let values = DVector::from_column_slice(&solver.solution.x);
        Ok(ProblemSolution::solved(
            status,
            problem.objective().value_at(&values),
            values,
        ))
    }
}

/// A problem with no finite bound and no mass balance: zero is optimal only for a zero
/// objective
fn unconstrained(problem: &Problem) -> ProblemSolution {
    if problem.objective().coefficients().iter().all(|c| *c == 0.) {
        let values = DVector::zeros(problem.num_variables());
        ProblemSolution::solved(OptimizationStatus::Optimal, 0., values)
    } else {
        ProblemSolution::failed(OptimizationStatus::Unbounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::solvers::test_problems;

    #[test]
    fn bounds_only_problem() {
        // Columns without any stoichiometry are constrained by their bounds alone
        let system = test_problems::unbounded();
        let problem = Problem::new_minimization(&system, DVector::from_vec(vec![1.])).unwrap();
        let solution = ClarabelSolver::new().solve(&problem).unwrap();
        assert!(solution.is_usable());
        assert!(solution.variable_values.unwrap()[0].abs() < 1e-5);
    }

    #[test]
    fn unbounded_problem() {
        let system = test_problems::unbounded();
        let problem = Problem::new_maximization(&system, DVector::from_vec(vec![1.])).unwrap();
        let solution = ClarabelSolver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Unbounded);
    }
}
