//! Rule evaluator: pure logic, recomputed from scratch on every call.

use crate::error::CoreError;
use crate::listing::ListingDraft;
use crate::listing_wizard::{ListingStep, MAX_STEP, MIN_STEP};
use crate::session::Session;

use super::rules::{listing_rules, FieldError, StepValidation, ValidationRule};

/// Evaluates a draft against a fixed rule table.
///
/// Holds no state besides the rules and the session it was built with, so
/// identical drafts always produce identical results.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    rules: Vec<ValidationRule>,
    session: Session,
    step_count: u8,
}

impl ValidationEngine {
    /// Engine over the standard listing rule table.
    pub fn new(session: Session) -> Self {
        Self::with_rules(listing_rules(), session)
    }

    /// Engine over a custom rule table, covering the wizard's steps.
    pub fn with_rules(rules: Vec<ValidationRule>, session: Session) -> Self {
        Self {
            rules,
            session,
            step_count: MAX_STEP,
        }
    }

    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    /// Evaluate the rule for `field`. `None` means it passes (or that no
    /// rule targets the field).
    pub fn validate_field(&self, field: &str, draft: &ListingDraft) -> Option<FieldError> {
        let rule = self.rules.iter().find(|r| r.field == field)?;
        self.evaluate(rule, draft)
    }

    /// Evaluate every rule owned by `step_id`.
    ///
    /// A step without rules is vacuously complete.
    pub fn validate_step(&self, step_id: u8, draft: &ListingDraft) -> StepValidation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut total = 0usize;
        let mut passed = 0usize;

        for rule in self.rules.iter().filter(|r| r.step == step_id) {
            total += 1;
            match self.evaluate(rule, draft) {
                None => passed += 1,
                Some(err) if rule.required => errors.push(err),
                Some(err) => warnings.push(err),
            }
        }

        StepValidation {
            step_id,
            is_valid: errors.is_empty(),
            errors,
            warnings,
            completion_percentage: compute_completion_pct(total, passed),
        }
    }

    /// All required-rule failures across the wizard, in step order.
    pub fn validate_form(&self, draft: &ListingDraft) -> Vec<FieldError> {
        (MIN_STEP..=self.step_count)
            .flat_map(|step| self.validate_step(step, draft).errors)
            .collect()
    }

    /// Gate used before publishing.
    pub fn ensure_publishable(&self, draft: &ListingDraft) -> Result<(), CoreError> {
        let errors = self.validate_form(draft);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::ValidationFailed(errors))
        }
    }

    /// First step whose required rules do not all pass, if any.
    pub fn first_incomplete_step(&self, draft: &ListingDraft) -> Option<u8> {
        (MIN_STEP..=self.step_count).find(|&step| !self.validate_step(step, draft).is_valid)
    }

    /// Per-step completion percentages, indexed by step number - 1.
    pub fn step_percentages(&self, draft: &ListingDraft) -> Vec<u8> {
        (MIN_STEP..=self.step_count)
            .map(|step| self.validate_step(step, draft).completion_percentage)
            .collect()
    }

    /// Unweighted mean of every step's completion percentage.
    pub fn form_completion_percentage(&self, draft: &ListingDraft) -> u8 {
        let pcts = self.step_percentages(draft);
        if pcts.is_empty() {
            return 100;
        }
        let sum: u32 = pcts.iter().map(|&p| u32::from(p)).sum();
        (f64::from(sum) / pcts.len() as f64).round() as u8
    }

    fn evaluate(&self, rule: &ValidationRule, draft: &ListingDraft) -> Option<FieldError> {
        if (rule.check)(draft, &self.session) {
            return None;
        }
        let step_title = ListingStep::from_number(rule.step)
            .map(|s| s.label().to_string())
            .unwrap_or_else(|_| format!("Step {}", rule.step));
        Some(FieldError {
            field: rule.field.to_string(),
            step_id: rule.step,
            step_title,
            label: rule.label.to_string(),
            message: rule.message.to_string(),
            help_text: rule.help_text.map(str::to_string),
            required: rule.required,
        })
    }
}

/// Compute a completion percentage from total and passing rule counts.
///
/// Returns 100 if `total` is 0.
pub fn compute_completion_pct(total: usize, passed: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (passed as f64 / total as f64 * 100.0).round() as u8;
    pct.min(100)
}
