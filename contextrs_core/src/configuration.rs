//! Process wide defaults used when building models and running reconstructions
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::{LazyLock, RwLock};

use thiserror::Error;

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    /// Default lower bound given to new reactions
    pub lower_bound: f64,
    /// Default upper bound given to new reactions
    pub upper_bound: f64,
    /// Flux magnitude above which a reaction is considered to carry flux
    pub tolerance: f64,
    /// Default threshold separating low and high evidence in GIMME
    pub flux_threshold: f64,
    /// Default linear program backend
    pub solver: Solver,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            flux_threshold: 1e-4,
            solver: Solver::Microlp,
        }
    }
}

/// Get a snapshot of the current configuration
///
/// A poisoned lock still holds a valid configuration (writers only assign plain values), so
/// the inner value is read in that case.
pub fn current() -> Configuration {
    match CONFIGURATION.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Replace the default solver used for new reconstruction runs
pub fn set_solver(solver: Solver) {
    match CONFIGURATION.write() {
        Ok(mut config) => config.solver = solver,
        Err(poisoned) => poisoned.into_inner().solver = solver,
    }
}

pub(crate) fn default_lower_bound() -> f64 {
    current().lower_bound
}

pub(crate) fn default_upper_bound() -> f64 {
    current().upper_bound
}

/// Enum used to specify the default solver to use
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Solver {
    /// Use the microlp simplex solver (pure rust, exact vertex solutions)
    Microlp,
    /// Use the Clarabel interior point solver
    Clarabel,
    /// Use the HiGHS solver, requires the highs feature to be enabled
    Highs,
}

impl Display for Solver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Solver::Microlp => write!(f, "microlp"),
            Solver::Clarabel => write!(f, "clarabel"),
            Solver::Highs => write!(f, "highs"),
        }
    }
}

impl FromStr for Solver {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "microlp" | "minilp" => Ok(Solver::Microlp),
            "clarabel" => Ok(Solver::Clarabel),
            "highs" => Ok(Solver::Highs),
            other => Err(ConfigurationError::UnknownSolver(other.to_string())),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Unknown solver `{0}`, expected one of microlp, clarabel, highs")]
    UnknownSolver(String),
}
