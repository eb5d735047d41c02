//! Validation errors for typed algorithm properties
use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::reconstruction::AlgorithmKind;

/// A single invalid or missing property
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyViolation {
    /// Name of the property
    pub property: &'static str,
    /// What is wrong with it
    pub reason: String,
}

impl Display for PropertyViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.property, self.reason)
    }
}

fn describe(violations: &[PropertyViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Every property violation found while building an algorithm's properties
#[derive(Error, Clone, Debug, PartialEq)]
#[error("Invalid {algorithm} properties: {}", describe(.violations))]
pub struct PropertyValidationError {
    pub algorithm: AlgorithmKind,
    pub violations: Vec<PropertyViolation>,
}

impl PropertyValidationError {
    /// Error with a single violation
    pub fn single(algorithm: AlgorithmKind, property: &'static str, reason: &str) -> Self {
        Self {
            algorithm,
            violations: vec![PropertyViolation {
                property,
                reason: reason.to_string(),
            }],
        }
    }

    /// Whether a property is among the violations
    pub fn violates(&self, property: &str) -> bool {
        self.violations.iter().any(|v| v.property == property)
    }
}

/// Collects violations so that every problem is reported at once
pub(crate) struct Validator {
    algorithm: AlgorithmKind,
    violations: Vec<PropertyViolation>,
}

impl Validator {
    pub(crate) fn new(algorithm: AlgorithmKind) -> Self {
        Self {
            algorithm,
            violations: Vec::new(),
        }
    }

    /// Record a violation of `property` unless `valid` holds
    pub(crate) fn check(&mut self, valid: bool, property: &'static str, reason: impl Into<String>) {
        if !valid {
            self.violate(property, reason);
        }
    }

    pub(crate) fn violate(&mut self, property: &'static str, reason: impl Into<String>) {
        self.violations.push(PropertyViolation {
            property,
            reason: reason.into(),
        });
    }

    pub(crate) fn finish(self) -> Result<(), PropertyValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(PropertyValidationError {
                algorithm: self.algorithm,
                violations: self.violations,
            })
        }
    }
}
