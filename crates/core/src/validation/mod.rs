//! Listing validation engine.
//!
//! Provides the declarative rule table and a pure-logic evaluator that
//! computes field errors and completion percentages for the wizard.

pub mod evaluator;
pub mod rules;

pub use evaluator::ValidationEngine;
pub use rules::{FieldError, StepValidation, ValidationRule};
