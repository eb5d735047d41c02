//! Provides struct for representing a linear program's objective
use nalgebra::DVector;

/// Linear objective `c . v`, with one coefficient per variable
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Coefficient of each variable in the objective
    coefficients: DVector<f64>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    sense: ObjectiveSense,
}

impl Objective {
    /// Create a new objective with a given sense
    pub fn new(coefficients: DVector<f64>, sense: ObjectiveSense) -> Self {
        Self {
            coefficients,
            sense,
        }
    }

    /// Create a new maximization objective
    pub fn new_maximize(coefficients: DVector<f64>) -> Self {
        Self::new(coefficients, ObjectiveSense::Maximize)
    }

    /// Create a new minimization objective
    pub fn new_minimize(coefficients: DVector<f64>) -> Self {
        Self::new(coefficients, ObjectiveSense::Minimize)
    }

    /// Change the sense of the objective
    pub fn set_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub fn coefficients(&self) -> &DVector<f64> {
        &self.coefficients
    }

    /// Number of variables the objective is defined over
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Evaluate the objective at a point
    pub fn value_at(&self, values: &DVector<f64>) -> f64 {
        self.coefficients.dot(values)
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}
