//! Provides the stoichiometric system `S v = 0, lb <= v <= ub` shared by all linear programs
use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;
use thiserror::Error;

/// Steady state flux system over a set of reactions
///
/// Columns of the stoichiometric matrix are reactions and rows are metabolites, the bound
/// vectors have one entry per reaction.
#[derive(Debug, Clone)]
pub struct StoichiometricSystem {
    /// Stoichiometric matrix (metabolites x reactions)
    stoichiometry: CscMatrix<f64>,
    /// Lower flux bound of each reaction
    lower_bounds: DVector<f64>,
    /// Upper flux bound of each reaction
    upper_bounds: DVector<f64>,
}

impl StoichiometricSystem {
    /// Create a new system, checking that the bound vectors match the number of reactions
    ///
    /// Bound ordering (`lb <= ub`) is not checked here, it is checked where the bounds are
    /// consumed (the irreversibility transform and [`crate::optimize::problem::Problem`]).
    pub fn new(
        stoichiometry: CscMatrix<f64>,
        lower_bounds: DVector<f64>,
        upper_bounds: DVector<f64>,
    ) -> Result<Self, SystemError> {
        let n = stoichiometry.ncols();
        if lower_bounds.len() != n {
            return Err(SystemError::DimensionMismatch {
                what: "lower bounds",
                expected: n,
                found: lower_bounds.len(),
            });
        }
        if upper_bounds.len() != n {
            return Err(SystemError::DimensionMismatch {
                what: "upper bounds",
                expected: n,
                found: upper_bounds.len(),
            });
        }
        Ok(Self {
            stoichiometry,
            lower_bounds,
            upper_bounds,
        })
    }

    pub fn stoichiometry(&self) -> &CscMatrix<f64> {
        &self.stoichiometry
    }

    pub fn lower_bounds(&self) -> &DVector<f64> {
        &self.lower_bounds
    }

    pub fn upper_bounds(&self) -> &DVector<f64> {
        &self.upper_bounds
    }

    /// Number of reactions (columns)
    pub fn num_reactions(&self) -> usize {
        self.stoichiometry.ncols()
    }

    /// Number of metabolites (rows)
    pub fn num_metabolites(&self) -> usize {
        self.stoichiometry.nrows()
    }

    /// A reaction is reversible when it can carry flux in both directions
    pub fn is_reversible(&self, reaction: usize) -> bool {
        self.lower_bounds[reaction] < 0. && self.upper_bounds[reaction] > 0.
    }

    /// Replace the lower bounds, keeping the dimension of the system
    pub fn with_lower_bounds(self, lower_bounds: DVector<f64>) -> Result<Self, SystemError> {
        StoichiometricSystem::new(self.stoichiometry, lower_bounds, self.upper_bounds)
    }

    /// Replace the bounds of a single reaction
    pub(crate) fn set_bounds(&mut self, reaction: usize, lower: f64, upper: f64) {
        self.lower_bounds[reaction] = lower;
        self.upper_bounds[reaction] = upper;
    }
}

/// Errors associated with building a stoichiometric system
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SystemError {
    #[error("Length of {what} ({found}) does not match the number of reactions ({expected})")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra_sparse::CooMatrix;

    fn single_metabolite(columns: &[f64]) -> CscMatrix<f64> {
        let mut coo = CooMatrix::new(1, columns.len());
        for (j, value) in columns.iter().enumerate() {
            coo.push(0, j, *value);
        }
        CscMatrix::from(&coo)
    }

    #[test]
    fn new_system() {
        let system = StoichiometricSystem::new(
            single_metabolite(&[1., -1.]),
            DVector::from_vec(vec![0., -5.]),
            DVector::from_vec(vec![10., 5.]),
        )
        .unwrap();
        assert_eq!(system.num_reactions(), 2);
        assert_eq!(system.num_metabolites(), 1);
        assert!(!system.is_reversible(0));
        assert!(system.is_reversible(1));
    }

    #[test]
    fn dimension_mismatch() {
        let res = StoichiometricSystem::new(
            single_metabolite(&[1., -1.]),
            DVector::from_vec(vec![0.]),
            DVector::from_vec(vec![10., 5.]),
        );
        match res {
            Err(SystemError::DimensionMismatch {
                what,
                expected,
                found,
            }) => {
                assert_eq!(what, "lower bounds");
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            _ => panic!("Dimension mismatch not caught"),
        }
    }

    #[test]
    fn zero_bounds_are_not_reversible() {
        let system = StoichiometricSystem::new(
            single_metabolite(&[1., 1., 1.]),
            DVector::from_vec(vec![-5., 0., -3.]),
            DVector::from_vec(vec![0., 0., -1.]),
        )
        .unwrap();
        assert!((0..3).all(|i| !system.is_reversible(i)));
    }
}
