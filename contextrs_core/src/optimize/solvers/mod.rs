//! Linear program backends
//!
//! Every backend implements [`LinearSolver`]. A solver value is a session: solving needs
//! `&mut self`, so a single session never has more than one solve in flight.
use thiserror::Error;

use crate::configuration::Solver;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::ProblemSolution;

pub mod clarabel;
pub mod microlp;

cfg_if::cfg_if! {
    if #[cfg(feature = "highs")] {
        pub mod highs;

        fn highs_solver() -> Result<Box<dyn LinearSolver>, SolverError> {
            Ok(Box::new(highs::HighsSolver::new()))
        }
    } else {
        fn highs_solver() -> Result<Box<dyn LinearSolver>, SolverError> {
            Err(SolverError::Unavailable("highs"))
        }
    }
}

/// Interface to a linear program backend
///
/// Infeasible and unbounded problems are not errors, they are reported through the
/// [`crate::optimize::OptimizationStatus`] of the returned solution. Errors are reserved for
/// problems the backend could not be asked to solve at all.
pub trait LinearSolver {
    /// Name of the backend, used for logging
    fn name(&self) -> &'static str;

    /// Solve the problem
    fn solve(&mut self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

/// Create a new solver session for the requested backend
pub fn new_solver(solver: Solver) -> Result<Box<dyn LinearSolver>, SolverError> {
    match solver {
        Solver::Microlp => Ok(Box::new(microlp::MicrolpSolver::new())),
        Solver::Clarabel => Ok(Box::new(clarabel::ClarabelSolver::new())),
        Solver::Highs => highs_solver(),
    }
}

/// Keep only the rows of the stoichiometric matrix which have at least one nonzero entry,
/// returning the new index of every original row
pub(crate) fn nonempty_rows(problem: &Problem) -> (Vec<Option<usize>>, usize) {
    let s = problem.system().stoichiometry();
    let mut used = vec![false; s.nrows()];
    for (row, _, value) in s.triplet_iter() {
        if *value != 0. {
            used[row] = true;
        }
    }
    let mut count = 0;
    let new_index = used
        .into_iter()
        .map(|is_used| {
            if is_used {
                count += 1;
                Some(count - 1)
            } else {
                None
            }
        })
        .collect();
    (new_index, count)
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Invalid problem: {0}")]
    Problem(#[from] ProblemError),
    #[error("The {0} solver is not available, enable the {0} feature")]
    Unavailable(&'static str),
    #[error("Solver backend failed: {0}")]
    Backend(String),
}

#[cfg(test)]
pub(crate) mod test_problems {
    //! Small problems shared by the backend tests
    use crate::optimize::system::StoichiometricSystem;
    use nalgebra::DVector;
    use nalgebra_sparse::{CooMatrix, CscMatrix};

    /// Linear pathway: EX_A (-> A, 0..10), R1 (A -> B), R2 (A <-> B), BIO (B ->)
    pub(crate) fn pathway() -> StoichiometricSystem {
        let mut coo = CooMatrix::new(2, 4);
        coo.push(0, 0, 1.);
        coo.push(0, 1, -1.);
        coo.push(1, 1, 1.);
        coo.push(0, 2, -1.);
        coo.push(1, 2, 1.);
        coo.push(1, 3, -1.);
        StoichiometricSystem::new(
            CscMatrix::from(&coo),
            DVector::from_vec(vec![0., 0., -1000., 0.]),
            DVector::from_vec(vec![10., 1000., 1000., 1000.]),
        )
        .unwrap()
    }

    /// Pathway with an unused metabolite row and a demand which can't be met
    pub(crate) fn infeasible() -> StoichiometricSystem {
        let mut coo = CooMatrix::new(3, 2);
        coo.push(0, 0, 1.);
        coo.push(0, 1, -1.);
        StoichiometricSystem::new(
            CscMatrix::from(&coo),
            DVector::from_vec(vec![0., 20.]),
            DVector::from_vec(vec![10., 30.]),
        )
        .unwrap()
    }

    /// Single free exchange, unbounded when maximized
    pub(crate) fn unbounded() -> StoichiometricSystem {
        let coo: CooMatrix<f64> = CooMatrix::new(1, 1);
        StoichiometricSystem::new(
            CscMatrix::from(&coo),
            DVector::from_vec(vec![0.]),
            DVector::from_vec(vec![f64::INFINITY]),
        )
        .unwrap()
    }
}
