//! This module provides a struct for representing reactions
use super::model::Gpr;
use crate::configuration::{default_lower_bound, default_upper_bound};
use crate::metabolic_model::gene::GeneActivity;
use crate::utils::hashing::short_hex_hash;
use derive_builder::Builder;
use indexmap::IndexMap;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene Protein Reaction rule to determine if reaction is active
    #[builder(default = "None")]
    pub gpr: Option<Gpr>,
    /// Lower flux bound
    #[builder(default = "default_lower_bound()")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "default_upper_bound()")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Reaction Annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
    /// Reaction Activity
    #[builder(default = "ReactionActivity::Active")]
    pub activity: ReactionActivity,
}

impl Reaction {
    /// Whether the reaction can carry flux in both directions
    pub fn is_reversible(&self) -> bool {
        self.lower_bound < 0. && self.upper_bound > 0.
    }

    /// Determine the id associated with the forward half of a split reversible reaction
    ///
    /// # Note:
    /// The forward id is "{reaction_id}_forward"
    pub fn get_forward_id(&self) -> String {
        forward_id(&self.id)
    }

    /// Determine the id associated with the backward half of a split reversible reaction
    ///
    /// # Note:
    /// The reverse id is "{reaction_id}_reverse_{hexidecimal hash of reaction_id}", the hash
    /// keeps the id from colliding with a reaction already named "{reaction_id}_reverse"
    pub fn get_reverse_id(&self) -> String {
        reverse_id(&self.id)
    }
}

pub(crate) fn forward_id(reaction_id: &str) -> String {
    format!("{}_forward", reaction_id)
}

pub(crate) fn reverse_id(reaction_id: &str) -> String {
    format!("{}_reverse_{}", reaction_id, short_hex_hash(reaction_id, 5))
}

/// Whether a Reaction is active or inactive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReactionActivity {
    /// The Reaction is active and can carry flux
    Active,
    /// The Reaction is inactive and can't carry flux
    Inactive,
}

impl From<GeneActivity> for ReactionActivity {
    fn from(value: GeneActivity) -> Self {
        match value {
            GeneActivity::Active => ReactionActivity::Active,
            GeneActivity::Inactive => ReactionActivity::Inactive,
        }
    }
}
