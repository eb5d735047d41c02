//! Module for parsing Gene Protein Reaction strings into AST values

use crate::io::gpr_parse::lexer::LexerError;
use crate::io::gpr_parse::parser::ParseError;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::model::Gpr;
use indexmap::IndexMap;
use thiserror::Error;

pub mod lexer;
pub mod parser;
pub mod token;

/// Parse a Gene Protein Reaction string into a GPR Tree
///
/// # Parameters
/// - `input`: &str representing the gene protein reaction rule
/// - `gene_map`: map of gene id strings to genes, genes first seen in the rule are added
///
/// # Returns
/// Parse result which is
/// - `Ok`: The root node of the GPR tree
/// - `Err`: Returns the GprParseError describing the issue with the GPR rule which
///     was being parsed.
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use contextrs_core::io::gpr_parse::parse_gpr;
/// let gpr: &str = "Rv0001 and Rv0002";
/// let mut gene_map = IndexMap::new();
/// let gpr_tree = parse_gpr(gpr, &mut gene_map).unwrap();
/// ```
pub fn parse_gpr(
    input: &str,
    gene_map: &mut IndexMap<String, Gene>,
) -> Result<Gpr, GprParseError> {
    // Start by creating a lexer
    let mut lexer = lexer::Lexer::new(input);
    // Convert the GPR string into tokens
    let tokens = lexer.lex()?;

    // Now parse those tokens into a GPR tree
    // Create the parser
    let mut parser = parser::GPRParser::new(tokens, gene_map);
    // Parse the expression
    let gpr = parser.parse()?;
    Ok(gpr)
}

/// Enum representing possible lex and parse errors
#[derive(Debug, Error)]
pub enum GprParseError {
    /// Lexing Error
    #[error("Error occurred during lexing (conversion of GPR string to tokens)")]
    LexingError(#[from] LexerError),
    /// Parsing Error
    #[error("Error occurred during parsing (conversion of tokens to GPR tree)")]
    ParsingError(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::gene::GeneActivity;
    use crate::metabolic_model::model::GprOperation;

    #[test]
    fn test_parse_gpr() {
        let gpr = "Rv0001 and (Rv0002 or Rv0003)";
        let mut gene_map: IndexMap<String, Gene> = IndexMap::new();
        let mut inactive = Gene::active("Rv0001");
        inactive.knock_out();
        gene_map.insert("Rv0001".to_string(), inactive);

        let gpr_tree = parse_gpr(gpr, &mut gene_map).unwrap();
        match gpr_tree {
            Gpr::Operation(GprOperation::And { left, right }) => {
                assert_eq!(*left, Gpr::new_gene_node("Rv0001"));
                match *right {
                    Gpr::Operation(GprOperation::Or { left, right }) => {
                        assert_eq!(*left, Gpr::new_gene_node("Rv0002"));
                        assert_eq!(*right, Gpr::new_gene_node("Rv0003"));
                    }
                    _ => panic!("Incorrect Parse"),
                }
            }
            _ => panic!("Incorrect operation"),
        }
        // Existing genes are left untouched, new ones are added as active
        assert_eq!(gene_map.len(), 3);
        assert_eq!(gene_map["Rv0001"].activity, GeneActivity::Inactive);
        assert_eq!(gene_map["Rv0003"].activity, GeneActivity::Active);
    }

    #[test]
    fn errors() {
        let mut gene_map = IndexMap::new();
        match parse_gpr("Rv0001 & Rv0002", &mut gene_map) {
            Err(GprParseError::LexingError(_)) => {}
            _ => panic!("Invalid character not reported"),
        }
        match parse_gpr("Rv0001 and", &mut gene_map) {
            Err(GprParseError::ParsingError(ParseError::ExpectedExpression)) => {}
            _ => panic!("Dangling operator not reported"),
        }
    }
}
