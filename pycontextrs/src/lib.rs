use contextrs_core::metabolic_model::model::Model;
use contextrs_core::reconstruction::gimme::GimmeOptions;
use contextrs_core::reconstruction::omics::{AndOrFunctions, IntegrationStrategy, OmicsEvidence};
use contextrs_core::reconstruction::wrapper::{AlgorithmOptions, ErrorPolicy};
use contextrs_core::reconstruction::{wrapper, AlgorithmKind, ReconstructionError};
use indexmap::IndexMap;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn to_py_err(err: ReconstructionError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Reconstruct context specific models from a model file
#[pyclass]
struct ReconstructionWrapper {
    inner: wrapper::ReconstructionWrapper<Model>,
}

#[pymethods]
impl ReconstructionWrapper {
    #[new]
    fn new(model_path: &str) -> PyResult<Self> {
        let inner = wrapper::ReconstructionWrapper::from_path(model_path).map_err(to_py_err)?;
        Ok(ReconstructionWrapper { inner })
    }

    fn reaction_ids(&self) -> Vec<String> {
        self.inner.reaction_ids().to_vec()
    }

    /// Run GIMME with reaction scores, returning reaction id -> included
    #[pyo3(signature = (expression, objectives, flux_threshold=None, raise_errors=true))]
    fn run_gimme(
        &self,
        expression: IndexMap<String, f64>,
        objectives: Vec<IndexMap<String, f64>>,
        flux_threshold: Option<f64>,
        raise_errors: bool,
    ) -> PyResult<IndexMap<String, bool>> {
        let options = AlgorithmOptions::Gimme(GimmeOptions {
            objectives,
            flux_threshold,
            ..Default::default()
        });
        let policy = if raise_errors {
            ErrorPolicy::Raise
        } else {
            ErrorPolicy::Suppress
        };
        let outcome = self
            .inner
            .run_from_omics(
                &OmicsEvidence::ReactionScores(expression),
                AlgorithmKind::Gimme,
                &IntegrationStrategy::Continuous,
                AndOrFunctions::MinMax,
                &options,
                policy,
            )
            .map_err(to_py_err)?;
        Ok(outcome.inclusion().clone())
    }
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ReconstructionWrapper>()?;
    Ok(())
}
