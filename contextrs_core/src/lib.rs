//! Core rust implementation of contextrs, a crate for reconstructing context specific
//! metabolic models from a genome scale model and omics derived evidence.

pub mod configuration;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
pub mod reconstruction;
mod utils;
