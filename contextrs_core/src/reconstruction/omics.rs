//! Turn omics evidence into per reaction scores
//!
//! Gene level scores are carried to reactions through the reaction GPRs, combining the two
//! sides of every `and`/`or` node with a pair of [`AndOrFunctions`]. An
//! [`IntegrationStrategy`] then either keeps the continuous scores or turns them into a
//! selection of reactions.
use std::str::FromStr;

use indexmap::IndexMap;
use tracing::warn;

use crate::metabolic_model::model::Gpr;
use crate::reconstruction::ReconstructionError;

/// Evidence supplied by the caller
#[derive(Clone, Debug, PartialEq)]
pub enum OmicsEvidence {
    /// Scores already given per reaction id
    ReactionScores(IndexMap<String, f64>),
    /// Scores per gene id, carried to reactions through their GPRs
    GeneScores(IndexMap<String, f64>),
    /// Reactions known to be active
    ReactionSelection(Vec<String>),
}

/// Functions combining the scores of the two sides of a GPR node
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AndOrFunctions {
    /// `and` takes the minimum, `or` the maximum
    #[default]
    MinMax,
    /// `and` takes the minimum, `or` the sum
    MinSum,
}

impl AndOrFunctions {
    pub fn and(&self) -> fn(f64, f64) -> f64 {
        f64::min
    }

    pub fn or(&self) -> fn(f64, f64) -> f64 {
        match self {
            AndOrFunctions::MinMax => f64::max,
            AndOrFunctions::MinSum => |a, b| a + b,
        }
    }
}

impl FromStr for AndOrFunctions {
    type Err = ReconstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minmax" => Ok(AndOrFunctions::MinMax),
            "minsum" => Ok(AndOrFunctions::MinSum),
            _ => Err(ReconstructionError::UnknownAndOrFunctions(s.to_string())),
        }
    }
}

/// Scores in the model's reaction order, ready to build algorithm properties from
#[derive(Clone, Debug, PartialEq)]
pub enum IntegratedScores {
    /// One score per reaction, `None` for reactions without evidence
    Continuous(Vec<Option<f64>>),
    /// Indices of the selected reactions
    Selection(Vec<usize>),
}

/// How per reaction scores become algorithm input
#[derive(Clone, Debug, Default, PartialEq)]
pub enum IntegrationStrategy {
    /// Keep the scores as they are
    #[default]
    Continuous,
    /// Select reactions scoring at least the threshold
    Threshold(f64),
    /// Select the named reactions
    Custom(Vec<String>),
}

impl FromStr for IntegrationStrategy {
    type Err = ReconstructionError;

    /// Parse `continuous`, `threshold=<value>` or `custom=<id>,<id>,...`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ReconstructionError::UnknownIntegrationStrategy(s.to_string());
        let (name, argument) = match s.split_once('=') {
            Some((name, argument)) => (name.trim(), Some(argument.trim())),
            None => (s.trim(), None),
        };
        match (name.to_ascii_lowercase().as_str(), argument) {
            ("continuous", None) => Ok(IntegrationStrategy::Continuous),
            ("threshold", Some(value)) => value
                .parse::<f64>()
                .ok()
                .filter(|t| !t.is_nan())
                .map(IntegrationStrategy::Threshold)
                .ok_or_else(unknown),
            ("custom", Some(ids)) => Ok(IntegrationStrategy::Custom(
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect(),
            )),
            _ => Err(unknown()),
        }
    }
}

fn reaction_position(reaction_ids: &[String], id: &str) -> Result<usize, ReconstructionError> {
    reaction_ids
        .iter()
        .position(|r| r == id)
        .ok_or_else(|| ReconstructionError::UnknownReaction(id.to_string()))
}

fn selection(reaction_ids: &[String], ids: &[String]) -> Result<Vec<usize>, ReconstructionError> {
    let mut selected = ids
        .iter()
        .map(|id| reaction_position(reaction_ids, id))
        .collect::<Result<Vec<_>, _>>()?;
    selected.sort_unstable();
    selected.dedup();
    Ok(selected)
}

/// Score every reaction, in model order
///
/// Reaction scores keyed by ids which are not in the model are skipped with a warning.
pub fn reaction_scores(
    evidence: &OmicsEvidence,
    reaction_ids: &[String],
    rules: &[Option<Gpr>],
    and_or: AndOrFunctions,
) -> Vec<Option<f64>> {
    match evidence {
        OmicsEvidence::ReactionScores(scores) => {
            let unknown = scores
                .keys()
                .filter(|id| !reaction_ids.contains(id))
                .count();
            if unknown > 0 {
                warn!(unknown, "Skipping scores of reactions which are not in the model");
            }
            reaction_ids
                .iter()
                .map(|id| scores.get(id).copied())
                .collect()
        }
        OmicsEvidence::GeneScores(scores) => rules
            .iter()
            .map(|rule| {
                rule.as_ref()
                    .and_then(|gpr| gpr.eval_score(scores, and_or.and(), and_or.or()))
            })
            .collect(),
        OmicsEvidence::ReactionSelection(_) => vec![None; reaction_ids.len()],
    }
}

impl IntegrationStrategy {
    /// Integrate the evidence for a model with the given reaction ids and GPRs
    ///
    /// A reaction selection is already integrated, it yields a selection for every strategy
    /// other than [`IntegrationStrategy::Custom`], whose ids take precedence.
    pub fn integrate(
        &self,
        evidence: &OmicsEvidence,
        reaction_ids: &[String],
        rules: &[Option<Gpr>],
        and_or: AndOrFunctions,
    ) -> Result<IntegratedScores, ReconstructionError> {
        if let IntegrationStrategy::Custom(ids) = self {
            return Ok(IntegratedScores::Selection(selection(reaction_ids, ids)?));
        }
        if let OmicsEvidence::ReactionSelection(ids) = evidence {
            return Ok(IntegratedScores::Selection(selection(reaction_ids, ids)?));
        }
        let scores = reaction_scores(evidence, reaction_ids, rules, and_or);
        Ok(match self {
            IntegrationStrategy::Threshold(threshold) => IntegratedScores::Selection(
                scores
                    .iter()
                    .enumerate()
                    .filter(|(_, score)| score.is_some_and(|s| s >= *threshold))
                    .map(|(index, _)| index)
                    .collect(),
            ),
            _ => IntegratedScores::Continuous(scores),
        })
    }
}
