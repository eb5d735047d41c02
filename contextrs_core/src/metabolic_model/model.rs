//! This module provides the Model struct for representing an entire metabolic model
use std::fmt::{Display, Formatter};

use crate::metabolic_model::gene::{Gene, GeneActivity};
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::{Reaction, ReactionActivity};

use indexmap::IndexMap;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CscMatrix};
use thiserror::Error;

/// Represents a Genome Scale Metabolic Model
#[derive(Clone, Debug)]
pub struct Model {
    /// Map of reaction ids to Reaction Objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Gene Objects
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolite Objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            id: None,
            compartments: None,
            version: None,
        }
    }

    /// Add a reaction to the model
    ///
    /// # Parameters
    /// - reaction: Reaction to add
    ///
    /// # Examples
    /// ```rust
    /// use contextrs_core::metabolic_model::model::Model;
    /// use contextrs_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty();
    /// let new_reaction = ReactionBuilder::default().id("new_reaction".to_string()).build().unwrap();
    /// model.add_reaction(new_reaction);
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a gene to the model
    ///
    /// # Examples
    /// ```rust
    /// use contextrs_core::metabolic_model::gene::GeneBuilder;
    /// use contextrs_core::metabolic_model::model::Model;
    /// let mut model=Model::new_empty();
    /// let new_gene = GeneBuilder::default().id("new_gene".to_string()).build().unwrap();
    /// model.add_gene(new_gene);
    /// ```
    pub fn add_gene(&mut self, gene: Gene) {
        let id = gene.id.clone();
        self.genes.insert(id, gene);
    }

    /// Add a metabolite to the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Set a gene as inactive, reactions depending on it through their GPR lose their flux
    /// capacity when bounds are next read
    pub fn knock_out_gene(&mut self, gene_id: &str) -> Result<(), ModelError> {
        match self.genes.get_mut(gene_id) {
            Some(gene) => {
                gene.knock_out();
                Ok(())
            }
            None => Err(ModelError::UnknownGene(gene_id.to_string())),
        }
    }

    /// Position of a reaction in the model's reaction order
    pub fn reaction_index(&self, reaction_id: &str) -> Option<usize> {
        self.reactions.get_index_of(reaction_id)
    }

    // region Linear System
    /// Build the stoichiometric matrix (metabolites x reactions, in model order)
    pub fn stoichiometric_matrix(&self) -> Result<CscMatrix<f64>, ModelError> {
        let mut coo = CooMatrix::new(self.metabolites.len(), self.reactions.len());
        for (column, (_, reaction)) in self.reactions.iter().enumerate() {
            for (metabolite, coefficient) in &reaction.metabolites {
                let row = match self.metabolites.get_index_of(metabolite) {
                    Some(row) => row,
                    None => {
                        return Err(ModelError::UnknownMetabolite {
                            reaction: reaction.id.clone(),
                            metabolite: metabolite.clone(),
                        })
                    }
                };
                if *coefficient != 0. {
                    coo.push(row, column, *coefficient);
                }
            }
        }
        Ok(CscMatrix::from(&coo))
    }

    /// Lower and upper flux bounds of every reaction, in model order
    ///
    /// Reactions which are inactive, either directly or because their GPR evaluates to
    /// inactive, are given bounds of (0, 0).
    pub fn flux_bounds(&self) -> Result<(DVector<f64>, DVector<f64>), ModelError> {
        let n = self.reactions.len();
        let mut lower = DVector::zeros(n);
        let mut upper = DVector::zeros(n);
        for (index, (_, reaction)) in self.reactions.iter().enumerate() {
            if self.reaction_activity(reaction)? == ReactionActivity::Active {
                lower[index] = reaction.lower_bound;
                upper[index] = reaction.upper_bound;
            }
        }
        Ok((lower, upper))
    }

    /// Determine whether a reaction can carry flux given its own activity and its GPR
    pub fn reaction_activity(&self, reaction: &Reaction) -> Result<ReactionActivity, GprError> {
        if reaction.activity == ReactionActivity::Inactive {
            return Ok(ReactionActivity::Inactive);
        }
        match &reaction.gpr {
            Some(gpr) => Ok(self.eval_gpr(gpr)?.into()),
            None => Ok(ReactionActivity::Active),
        }
    }
    // endregion Linear System
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Reaction {reaction} refers to metabolite {metabolite} which is not in the model")]
    UnknownMetabolite { reaction: String, metabolite: String },
    #[error("Gene {0} is not in the model")]
    UnknownGene(String),
    #[error("Unable to evaluate GPR: {0}")]
    Gpr(#[from] GprError),
}

// region GPR Functionality
/// Representation of a Gene Protein Reaction Rule as an AST
#[derive(Clone, Debug, PartialEq)]
pub enum Gpr {
    /// Operation on two genes (see [`GprOperation`])
    Operation(GprOperation),
    /// A terminal gene Node, holding the gene id
    GeneNode(String),
}

impl Display for Gpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_id())
    }
}

impl Gpr {
    /// Create a new binary operation node
    pub fn new_binary_operation(
        left: Gpr,
        operator: GprOperatorType,
        right: Gpr,
    ) -> Result<Gpr, GprError> {
        let op = match operator {
            GprOperatorType::Or => GprOperation::Or {
                left: Box::new(left),
                right: Box::new(right),
            },
            GprOperatorType::And => GprOperation::And {
                left: Box::new(left),
                right: Box::new(right),
            },
            GprOperatorType::Not => return Err(GprError::InvalidBinaryOp),
        };
        Ok(Gpr::Operation(op))
    }

    /// Create a new unary operation node
    pub fn new_unary_operation(operator: GprOperatorType, operand: Gpr) -> Result<Gpr, GprError> {
        let op = match operator {
            GprOperatorType::Not => GprOperation::Not {
                val: Box::new(operand),
            },
            _ => return Err(GprError::InvalidUnaryOp),
        };
        Ok(Gpr::Operation(op))
    }

    /// Create a new gene node
    pub fn new_gene_node(gene: &str) -> Gpr {
        Gpr::GeneNode(gene.to_string())
    }

    /// Generate a GPR string with gene ids from the GPR AST
    pub fn to_string_id(&self) -> String {
        match self {
            Gpr::Operation(op) => match op {
                GprOperation::Or { left, right } => {
                    format!("({} or {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::And { left, right } => {
                    format!("({} and {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::Not { val } => {
                    format!("(not {})", val)
                }
            },
            Gpr::GeneNode(gene_ref) => gene_ref.to_string(),
        }
    }

    /// Evaluate the rule over continuous gene scores
    ///
    /// `and` combines the two sides of an AND node, `or` the two sides of an OR node. Genes
    /// without a score are skipped, so a node only yields `None` when neither side has a
    /// score. `not` nodes carry no quantitative meaning and yield `None`.
    pub fn eval_score(
        &self,
        scores: &IndexMap<String, f64>,
        and: fn(f64, f64) -> f64,
        or: fn(f64, f64) -> f64,
    ) -> Option<f64> {
        let combine = |l: Option<f64>, r: Option<f64>, f: fn(f64, f64) -> f64| match (l, r) {
            (Some(l), Some(r)) => Some(f(l, r)),
            (Some(v), None) | (None, Some(v)) => Some(v),
            (None, None) => None,
        };
        match self {
            Gpr::Operation(GprOperation::And { left, right }) => combine(
                left.eval_score(scores, and, or),
                right.eval_score(scores, and, or),
                and,
            ),
            Gpr::Operation(GprOperation::Or { left, right }) => combine(
                left.eval_score(scores, and, or),
                right.eval_score(scores, and, or),
                or,
            ),
            Gpr::Operation(GprOperation::Not { .. }) => None,
            Gpr::GeneNode(gene) => scores.get(gene).copied(),
        }
    }
}

/// Possible operations on genes
#[derive(Clone, Debug, PartialEq)]
pub enum GprOperation {
    Or { left: Box<Gpr>, right: Box<Gpr> },
    And { left: Box<Gpr>, right: Box<Gpr> },
    Not { val: Box<Gpr> },
}

/// Types of Allowed GPR Operations
pub enum GprOperatorType {
    /// Or, results in active if either left or right are active
    Or,
    /// And, results in active if both left and right are active
    And,
    /// Not, results in active if val is inactive
    Not,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum GprError {
    #[error("Invalid Binary Operation")]
    InvalidBinaryOp,
    #[error("Invalid Unary Operation")]
    InvalidUnaryOp,
    #[error("Gene {0} in GPR is not present in the model")]
    GeneNotFound(String),
}

// Model associated functions for working with GPRs
impl Model {
    /// Evaluate whether a GPR evaluates to Active or Inactive
    pub fn eval_gpr(&self, gpr: &Gpr) -> Result<GeneActivity, GprError> {
        match gpr {
            Gpr::Operation(op) => match op {
                GprOperation::Or { left, right } => {
                    let l = self.eval_gpr(left)?;
                    let r = self.eval_gpr(right)?;
                    if l == GeneActivity::Active || r == GeneActivity::Active {
                        Ok(GeneActivity::Active)
                    } else {
                        Ok(GeneActivity::Inactive)
                    }
                }
                GprOperation::And { left, right } => {
                    let l = self.eval_gpr(left)?;
                    let r = self.eval_gpr(right)?;
                    if l == GeneActivity::Active && r == GeneActivity::Active {
                        Ok(GeneActivity::Active)
                    } else {
                        Ok(GeneActivity::Inactive)
                    }
                }
                GprOperation::Not { val } => match self.eval_gpr(val)? {
                    GeneActivity::Active => Ok(GeneActivity::Inactive),
                    GeneActivity::Inactive => Ok(GeneActivity::Active),
                },
            },
            Gpr::GeneNode(gene) => match self.genes.get(gene) {
                Some(g) => Ok(g.activity),
                None => Err(GprError::GeneNotFound(gene.clone())),
            },
        }
    }
}

// endregion GPR Functionality
