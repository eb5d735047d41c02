//! Module for reading and writing Models
use std::path::Path;

use thiserror::Error;

use crate::io::json::JsonError;
use crate::metabolic_model::model::Model;

pub mod gpr_parse;
pub mod json;

/// Read a model from a file, choosing the format from the file extension
///
/// Only COBRA JSON (`.json`) is currently supported.
pub fn read_model<P: AsRef<Path>>(path: P) -> Result<Model, IoError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "json" => Ok(Model::read_json(path)?),
        _ => Err(IoError::UnsupportedFormat(path.display().to_string())),
    }
}

#[derive(Error, Debug)]
pub enum IoError {
    #[error("No model reader available for {0}")]
    UnsupportedFormat(String),
    #[error("Unable to read JSON model: {0}")]
    Json(#[from] JsonError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension() {
        match read_model("model.xml") {
            Err(IoError::UnsupportedFormat(path)) => assert_eq!(path, "model.xml"),
            _ => panic!("Unsupported format not reported"),
        }
        match read_model("model") {
            Err(IoError::UnsupportedFormat(_)) => {}
            _ => panic!("Missing extension not reported"),
        }
    }

    #[test]
    fn json_dispatch() {
        let path = std::env::temp_dir().join("contextrs_read_model_dispatch.JSON");
        std::fs::write(&path, json::json_tests::TOY_MODEL).unwrap();
        let model = read_model(&path).unwrap();
        assert_eq!(model.reactions.len(), 4);
        std::fs::remove_file(&path).unwrap();
    }
}
