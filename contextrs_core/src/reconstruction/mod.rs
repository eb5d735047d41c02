//! Context specific reconstruction of metabolic models
//!
//! A reconstruction takes a stoichiometric system and per reaction evidence, and decides
//! which reactions of the model take part in the context specific network. Each reaction
//! receives an [`Activity`], reactions with any activity other than
//! [`Activity::Inactive`] are included.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

use crate::io::IoError;
use crate::metabolic_model::model::ModelError;
use crate::optimize::solvers::SolverError;
use crate::optimize::system::SystemError;
use crate::optimize::OptimizationStatus;
use crate::reconstruction::gimme::GimmeProperties;
use crate::reconstruction::properties::PropertyValidationError;

pub mod gimme;
pub mod irreversible;
pub mod mapping;
pub mod omics;
pub mod properties;
pub mod wrapper;

/// Activity call for a single reaction
///
/// Ordered so that folding split reactions back together is a maximum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Activity {
    /// No flux, and evidence below the threshold
    Inactive = 0,
    /// Evidence above the threshold (or no data), but no flux
    Evidence = 1,
    /// Carries flux in the reconstructed flux distribution
    Flux = 2,
}

impl Activity {
    /// Numeric activity code (0, 1 or 2)
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Whether the reaction is part of the reconstructed network
    pub fn is_included(&self) -> bool {
        *self != Activity::Inactive
    }
}

/// Reconstruction algorithms sharing the wrapper interface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlgorithmKind {
    Fastcore,
    Gimme,
    Imat,
    Tinit,
    Corda,
    Swiftcore,
}

impl Display for AlgorithmKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AlgorithmKind::Fastcore => "fastcore",
            AlgorithmKind::Gimme => "gimme",
            AlgorithmKind::Imat => "imat",
            AlgorithmKind::Tinit => "tinit",
            AlgorithmKind::Corda => "corda",
            AlgorithmKind::Swiftcore => "swiftcore",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for AlgorithmKind {
    type Err = ReconstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fastcore" => Ok(AlgorithmKind::Fastcore),
            "gimme" => Ok(AlgorithmKind::Gimme),
            "imat" => Ok(AlgorithmKind::Imat),
            "tinit" => Ok(AlgorithmKind::Tinit),
            "corda" => Ok(AlgorithmKind::Corda),
            "swiftcore" => Ok(AlgorithmKind::Swiftcore),
            _ => Err(ReconstructionError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Validated properties of one of the implemented algorithms
///
/// The variant selects the algorithm which is run.
#[derive(Clone, Debug, PartialEq)]
pub enum ReconstructionProperties {
    Gimme(GimmeProperties),
}

impl ReconstructionProperties {
    pub fn algorithm(&self) -> AlgorithmKind {
        match self {
            ReconstructionProperties::Gimme(_) => AlgorithmKind::Gimme,
        }
    }
}

impl From<GimmeProperties> for ReconstructionProperties {
    fn from(properties: GimmeProperties) -> Self {
        ReconstructionProperties::Gimme(properties)
    }
}

/// Result of a reconstruction over the original reactions
#[derive(Clone, Debug, PartialEq)]
pub struct Reconstruction {
    /// Algorithm which produced the result
    pub algorithm: AlgorithmKind,
    /// Activity of every reaction, in model order
    pub activity: Vec<Activity>,
}

impl Reconstruction {
    /// Inclusion flag of every reaction, in model order
    pub fn included(&self) -> Vec<bool> {
        self.activity.iter().map(Activity::is_included).collect()
    }

    /// Indices of the included reactions
    pub fn included_indices(&self) -> Vec<usize> {
        self.activity
            .iter()
            .enumerate()
            .filter(|(_, activity)| activity.is_included())
            .map(|(index, _)| index)
            .collect()
    }
}

/// Linear program stage of a two phase reconstruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Maximal objective flux
    Capacity,
    /// Evidence penalty minimization
    Penalty,
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Capacity => write!(f, "capacity"),
            Phase::Penalty => write!(f, "penalty"),
        }
    }
}

fn objective_suffix(objective: &Option<usize>) -> String {
    match objective {
        Some(index) => format!(" for objective {}", index),
        None => String::new(),
    }
}

#[derive(Error, Debug)]
pub enum ReconstructionError {
    #[error("Reaction {reaction} has invalid bounds ({lower}, {upper})")]
    ModelBounds {
        reaction: usize,
        lower: f64,
        upper: f64,
    },
    #[error(transparent)]
    PropertyValidation(#[from] PropertyValidationError),
    #[error("The {phase} linear program is {status}{}", objective_suffix(.objective))]
    ReconstructionInfeasible {
        phase: Phase,
        objective: Option<usize>,
        status: OptimizationStatus,
    },
    #[error("No model reader supports {0}")]
    UnsupportedModelReader(String),
    #[error("Unknown reconstruction algorithm `{0}`")]
    UnknownAlgorithm(String),
    #[error("Unknown integration strategy `{0}`")]
    UnknownIntegrationStrategy(String),
    #[error("Unknown and/or functions `{0}`, expected minmax or minsum")]
    UnknownAndOrFunctions(String),
    #[error("The {0} algorithm is not implemented")]
    AlgorithmUnavailable(AlgorithmKind),
    #[error("Reaction {0} is not in the model")]
    UnknownReaction(String),
    #[error("Reaction index {index} is out of range for {len} reactions")]
    ReactionIndexOutOfRange { index: usize, len: usize },
    #[error("Reaction {reaction} is reversible, but preprocessing is disabled")]
    NotIrreversible { reaction: usize },
    #[error("Invalid stoichiometric system: {0}")]
    System(#[from] SystemError),
    #[error("Linear program could not be solved: {0}")]
    Solver(#[from] SolverError),
    #[error("Invalid model: {0}")]
    Model(#[from] ModelError),
    #[error("Unable to read model: {0}")]
    Io(#[from] IoError),
}
