//! Run reconstructions against a model, translating between reaction ids and indices
use std::path::Path;

use indexmap::IndexMap;
use nalgebra::DVector;
use nalgebra_sparse::CscMatrix;
use tracing::{info, warn};

use crate::io::{read_model, IoError};
use crate::metabolic_model::model::{Gpr, Model};
use crate::optimize::system::StoichiometricSystem;
use crate::reconstruction::gimme::{Gimme, GimmeOptions, GimmeProperties, GimmeSolution};
use crate::reconstruction::omics::{AndOrFunctions, IntegrationStrategy, OmicsEvidence};
use crate::reconstruction::properties::PropertyValidationError;
use crate::reconstruction::{
    AlgorithmKind, Reconstruction, ReconstructionError, ReconstructionProperties,
};

/// Source of the linear system and identifiers of a metabolic model
pub trait ModelReader {
    /// Reaction ids, in column order
    fn reaction_ids(&self) -> Vec<String>;
    /// Column of the reaction with the given id
    fn reaction_index(&self, id: &str) -> Option<usize>;
    /// Metabolite ids, in row order
    fn metabolite_ids(&self) -> Vec<String>;
    fn stoichiometric_matrix(&self) -> Result<CscMatrix<f64>, ReconstructionError>;
    /// Lower and upper flux bounds of every reaction
    fn bounds(&self) -> Result<(DVector<f64>, DVector<f64>), ReconstructionError>;
    /// Gene reaction rule of every reaction, `None` for reactions without one
    fn gene_reaction_rules(&self) -> Vec<Option<Gpr>>;
}

impl ModelReader for Model {
    fn reaction_ids(&self) -> Vec<String> {
        self.reactions.keys().cloned().collect()
    }

    fn reaction_index(&self, id: &str) -> Option<usize> {
        Model::reaction_index(self, id)
    }

    fn metabolite_ids(&self) -> Vec<String> {
        self.metabolites.keys().cloned().collect()
    }

    fn stoichiometric_matrix(&self) -> Result<CscMatrix<f64>, ReconstructionError> {
        Ok(Model::stoichiometric_matrix(self)?)
    }

    fn bounds(&self) -> Result<(DVector<f64>, DVector<f64>), ReconstructionError> {
        Ok(self.flux_bounds()?)
    }

    fn gene_reaction_rules(&self) -> Vec<Option<Gpr>> {
        self.reactions.values().map(|r| r.gpr.clone()).collect()
    }
}

/// What to do when a reconstruction run fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Return the error
    #[default]
    Raise,
    /// Log the error and report no reaction as included
    Suppress,
}

/// Per algorithm options for reconstructions from omics evidence
#[derive(Clone, Debug, PartialEq)]
pub enum AlgorithmOptions {
    Gimme(GimmeOptions),
}

impl AlgorithmOptions {
    pub fn algorithm(&self) -> AlgorithmKind {
        match self {
            AlgorithmOptions::Gimme(_) => AlgorithmKind::Gimme,
        }
    }
}

/// Inclusion of every reaction after a run from omics evidence
#[derive(Debug)]
pub enum ReconstructionOutcome {
    /// The run succeeded
    Reconstructed(IndexMap<String, bool>),
    /// The run failed and the failure was suppressed, no reaction is included
    Failed {
        cause: ReconstructionError,
        inclusion: IndexMap<String, bool>,
    },
}

impl ReconstructionOutcome {
    /// Reaction id -> included
    pub fn inclusion(&self) -> &IndexMap<String, bool> {
        match self {
            ReconstructionOutcome::Reconstructed(inclusion) => inclusion,
            ReconstructionOutcome::Failed { inclusion, .. } => inclusion,
        }
    }

    pub fn is_reconstructed(&self) -> bool {
        matches!(self, ReconstructionOutcome::Reconstructed(_))
    }
}

/// Runs reconstruction algorithms on the system read from a model
///
/// The system and identifiers are read from the model once, when the wrapper is created.
pub struct ReconstructionWrapper<R: ModelReader> {
    reader: R,
    reaction_ids: Vec<String>,
    system: StoichiometricSystem,
}

impl ReconstructionWrapper<Model> {
    /// Read a model file and wrap it
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReconstructionError> {
        let model = read_model(path).map_err(|err| match err {
            IoError::UnsupportedFormat(path) => ReconstructionError::UnsupportedModelReader(path),
            err => ReconstructionError::Io(err),
        })?;
        Self::new(model)
    }
}

impl<R: ModelReader> ReconstructionWrapper<R> {
    pub fn new(reader: R) -> Result<Self, ReconstructionError> {
        let (lower, upper) = reader.bounds()?;
        let system = StoichiometricSystem::new(reader.stoichiometric_matrix()?, lower, upper)?;
        Ok(Self {
            reaction_ids: reader.reaction_ids(),
            reader,
            system,
        })
    }

    /// Override the bounds of the named reactions
    pub fn with_environment(
        mut self,
        conditions: &IndexMap<String, (f64, f64)>,
    ) -> Result<Self, ReconstructionError> {
        for (id, (lower, upper)) in conditions {
            let reaction = self.reaction_index(id)?;
            if lower.is_nan() || upper.is_nan() || lower > upper {
                return Err(ReconstructionError::ModelBounds {
                    reaction,
                    lower: *lower,
                    upper: *upper,
                });
            }
            self.system.set_bounds(reaction, *lower, *upper);
        }
        Ok(self)
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn system(&self) -> &StoichiometricSystem {
        &self.system
    }

    pub fn reaction_ids(&self) -> &[String] {
        &self.reaction_ids
    }

    fn reaction_index(&self, id: &str) -> Result<usize, ReconstructionError> {
        self.reader
            .reaction_index(id)
            .ok_or_else(|| ReconstructionError::UnknownReaction(id.to_string()))
    }

    /// Run the algorithm selected by the properties
    pub fn run(
        &self,
        properties: &ReconstructionProperties,
    ) -> Result<Reconstruction, ReconstructionError> {
        let algorithm = properties.algorithm();
        info!(
            %algorithm,
            reactions = self.system.num_reactions(),
            "Starting reconstruction"
        );
        let reconstruction = match properties {
            ReconstructionProperties::Gimme(gimme) => self.run_gimme(gimme)?.reconstruction(),
        };
        info!(
            %algorithm,
            reactions = self.system.num_reactions(),
            active = reconstruction.included_indices().len(),
            "Finished reconstruction"
        );
        Ok(reconstruction)
    }

    /// Run GIMME, keeping the full solution
    pub fn run_gimme(
        &self,
        properties: &GimmeProperties,
    ) -> Result<GimmeSolution, ReconstructionError> {
        Gimme::new(&self.system, properties).run()
    }

    /// Reaction id -> included, in model order
    pub fn inclusion_map(&self, reconstruction: &Reconstruction) -> IndexMap<String, bool> {
        self.reaction_ids
            .iter()
            .cloned()
            .zip(reconstruction.included())
            .collect()
    }

    /// Integrate omics evidence, build the algorithm's properties and run it
    ///
    /// Errors raised before the run (unknown reactions, invalid properties) are always
    /// returned. A failed run is returned as an error, or reported as a
    /// [`ReconstructionOutcome::Failed`] under [`ErrorPolicy::Suppress`].
    pub fn run_from_omics(
        &self,
        evidence: &OmicsEvidence,
        algorithm: AlgorithmKind,
        strategy: &IntegrationStrategy,
        and_or: AndOrFunctions,
        options: &AlgorithmOptions,
        policy: ErrorPolicy,
    ) -> Result<ReconstructionOutcome, ReconstructionError> {
        if algorithm != AlgorithmKind::Gimme {
            return Err(ReconstructionError::AlgorithmUnavailable(algorithm));
        }
        if options.algorithm() != algorithm {
            return Err(PropertyValidationError::single(
                algorithm,
                "options",
                &format!("given for {}", options.algorithm()),
            )
            .into());
        }

        let rules = self.reader.gene_reaction_rules();
        let scores = strategy.integrate(evidence, &self.reaction_ids, &rules, and_or)?;
        let properties: ReconstructionProperties = match options {
            AlgorithmOptions::Gimme(options) => {
                GimmeProperties::from_integrated_scores(&scores, options, &self.reaction_ids)?
                    .into()
            }
        };

        match (self.run(&properties), policy) {
            (Ok(reconstruction), _) => Ok(ReconstructionOutcome::Reconstructed(
                self.inclusion_map(&reconstruction),
            )),
            (Err(cause), ErrorPolicy::Raise) => Err(cause),
            (Err(cause), ErrorPolicy::Suppress) => {
                warn!(%algorithm, error = %cause, "Reconstruction failed, no reaction is included");
                Ok(ReconstructionOutcome::Failed {
                    cause,
                    inclusion: self
                        .reaction_ids
                        .iter()
                        .map(|id| (id.clone(), false))
                        .collect(),
                })
            }
        }
    }
}
