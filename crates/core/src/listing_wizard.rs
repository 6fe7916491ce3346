//! Listing wizard steps and navigation.
//!
//! Defines the ten steps of the listing creation flow and the
//! [`StepSequencer`] that tracks the active step and which steps the
//! progress indicator may jump to.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Listing steps
// ---------------------------------------------------------------------------

/// The steps of the listing wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStep {
    Role,
    Contact,
    ListingType,
    HorseBasics,
    Details,
    SaleTerms,
    Profile,
    Media,
    Documentation,
    Preview,
}

/// Total number of steps in the wizard.
pub const TOTAL_STEPS: u8 = 10;

/// Minimum step number (1-based).
pub const MIN_STEP: u8 = 1;

/// Maximum step number (1-based).
pub const MAX_STEP: u8 = 10;

impl ListingStep {
    /// Every step, in wizard order.
    pub const ALL: [ListingStep; TOTAL_STEPS as usize] = [
        Self::Role,
        Self::Contact,
        Self::ListingType,
        Self::HorseBasics,
        Self::Details,
        Self::SaleTerms,
        Self::Profile,
        Self::Media,
        Self::Documentation,
        Self::Preview,
    ];

    /// Convert a 1-based step number to a `ListingStep`.
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        validate_step_number(n)?;
        Ok(Self::ALL[(n - 1) as usize])
    }

    /// Convert to a 1-based step number.
    pub fn to_number(self) -> u8 {
        match self {
            Self::Role => 1,
            Self::Contact => 2,
            Self::ListingType => 3,
            Self::HorseBasics => 4,
            Self::Details => 5,
            Self::SaleTerms => 6,
            Self::Profile => 7,
            Self::Media => 8,
            Self::Documentation => 9,
            Self::Preview => 10,
        }
    }

    /// Human-readable title for the step.
    pub fn label(self) -> &'static str {
        match self {
            Self::Role => "Your Role",
            Self::Contact => "Contact Details",
            Self::ListingType => "Listing Type",
            Self::HorseBasics => "Horse Basics",
            Self::Details => "Physical Details",
            Self::SaleTerms => "Sale Terms",
            Self::Profile => "Horse Profile",
            Self::Media => "Photos & Videos",
            Self::Documentation => "Documentation",
            Self::Preview => "Preview & Publish",
        }
    }
}

/// Validate that a step number is within the valid range.
pub fn validate_step_number(step: u8) -> Result<(), CoreError> {
    if !(MIN_STEP..=MAX_STEP).contains(&step) {
        return Err(CoreError::Validation(format!(
            "Step {step} is out of range ({MIN_STEP}..{MAX_STEP})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Step sequencer
// ---------------------------------------------------------------------------

/// Result of moving forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the given step.
    Moved(u8),
    /// Already on the last step; the caller hands over to preview/publish.
    ReadyForPreview,
}

/// Linear step state machine with an unlock high-water mark.
///
/// `highest_completed_step` only ever grows. Direct jumps are allowed to any
/// step at or below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSequencer {
    current_step: u8,
    highest_completed_step: u8,
    total_steps: u8,
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new(TOTAL_STEPS)
    }
}

impl StepSequencer {
    /// Start on step 1 of `total_steps` (at least one step).
    pub fn new(total_steps: u8) -> Self {
        Self {
            current_step: MIN_STEP,
            highest_completed_step: MIN_STEP,
            total_steps: total_steps.max(MIN_STEP),
        }
    }

    /// Continue an edit at `current` with steps up to `highest` unlocked.
    ///
    /// Both values are clamped to the valid range, and `highest` is raised
    /// to `current` if it lags behind.
    pub fn resume(total_steps: u8, current: u8, highest: u8) -> Self {
        let total_steps = total_steps.max(MIN_STEP);
        let current_step = current.clamp(MIN_STEP, total_steps);
        let highest_completed_step = highest.clamp(MIN_STEP, total_steps).max(current_step);
        Self {
            current_step,
            highest_completed_step,
            total_steps,
        }
    }

    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    pub fn highest_completed_step(&self) -> u8 {
        self.highest_completed_step
    }

    pub fn total_steps(&self) -> u8 {
        self.total_steps
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == self.total_steps
    }

    /// Move one step forward, unlocking the new step.
    pub fn next(&mut self) -> Advance {
        if self.is_last_step() {
            return Advance::ReadyForPreview;
        }
        self.current_step += 1;
        self.highest_completed_step = self.highest_completed_step.max(self.current_step);
        Advance::Moved(self.current_step)
    }

    /// Move one step back. Never changes the unlock mark.
    pub fn prev(&mut self) -> u8 {
        if self.current_step > MIN_STEP {
            self.current_step -= 1;
        }
        self.current_step
    }

    /// Whether the progress indicator may jump to `step`.
    pub fn can_go_to(&self, step: u8) -> bool {
        step >= MIN_STEP && step <= self.highest_completed_step
    }

    /// Jump directly to an unlocked step.
    pub fn go_to(&mut self, step: u8) -> Result<u8, CoreError> {
        if !self.can_go_to(step) {
            return Err(CoreError::Validation(format!(
                "Cannot jump to step {step}: only steps {MIN_STEP}..={} are unlocked",
                self.highest_completed_step
            )));
        }
        self.current_step = step;
        Ok(step)
    }

    /// Unlock every step, used when editing an already published listing.
    pub fn unlock_all(&mut self) {
        self.highest_completed_step = self.total_steps;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- ListingStep --

    #[test]
    fn step_from_number_valid() {
        assert_eq!(ListingStep::from_number(1).unwrap(), ListingStep::Role);
        assert_eq!(
            ListingStep::from_number(4).unwrap(),
            ListingStep::HorseBasics
        );
        assert_eq!(ListingStep::from_number(10).unwrap(), ListingStep::Preview);
    }

    #[test]
    fn step_from_number_invalid() {
        assert!(ListingStep::from_number(0).is_err());
        assert!(ListingStep::from_number(11).is_err());
    }

    #[test]
    fn step_to_number_roundtrip() {
        for n in MIN_STEP..=MAX_STEP {
            assert_eq!(ListingStep::from_number(n).unwrap().to_number(), n);
        }
    }

    #[test]
    fn step_labels_are_nonempty() {
        for step in ListingStep::ALL {
            assert!(!step.label().is_empty());
        }
    }

    // -- StepSequencer --

    #[test]
    fn starts_on_first_step() {
        let seq = StepSequencer::default();
        assert_eq!(seq.current_step(), 1);
        assert_eq!(seq.highest_completed_step(), 1);
        assert_eq!(seq.total_steps(), TOTAL_STEPS);
    }

    #[test]
    fn next_raises_highest_completed() {
        let mut seq = StepSequencer::new(5);
        assert_eq!(seq.next(), Advance::Moved(2));
        assert_eq!(seq.next(), Advance::Moved(3));
        assert_eq!(seq.highest_completed_step(), 3);
    }

    #[test]
    fn next_k_times_unlocks_at_least_k_plus_one() {
        for k in 0..15u8 {
            let mut seq = StepSequencer::new(TOTAL_STEPS);
            for _ in 0..k {
                seq.next();
            }
            assert!(seq.highest_completed_step() >= (k + 1).min(TOTAL_STEPS));
        }
    }

    #[test]
    fn next_on_last_step_hands_over_to_preview() {
        let mut seq = StepSequencer::new(2);
        seq.next();
        assert_eq!(seq.next(), Advance::ReadyForPreview);
        assert_eq!(seq.current_step(), 2);
    }

    #[test]
    fn prev_never_lowers_highest_completed() {
        let mut seq = StepSequencer::new(TOTAL_STEPS);
        seq.next();
        seq.next();
        seq.next();
        assert_eq!(seq.prev(), 3);
        assert_eq!(seq.prev(), 2);
        assert_eq!(seq.highest_completed_step(), 4);
    }

    #[test]
    fn prev_stops_at_first_step() {
        let mut seq = StepSequencer::default();
        assert_eq!(seq.prev(), 1);
        assert_eq!(seq.current_step(), 1);
    }

    #[test]
    fn go_to_unlocked_step() {
        let mut seq = StepSequencer::default();
        seq.next();
        seq.next();
        seq.prev();
        seq.prev();
        assert_eq!(seq.go_to(3).unwrap(), 3);
        assert_eq!(seq.current_step(), 3);
    }

    #[test]
    fn go_to_locked_step_is_rejected() {
        let mut seq = StepSequencer::default();
        seq.next();
        assert!(seq.go_to(3).is_err());
        assert!(seq.go_to(0).is_err());
        assert_eq!(seq.current_step(), 2);
    }

    #[test]
    fn resume_clamps_values() {
        let seq = StepSequencer::resume(TOTAL_STEPS, 12, 3);
        assert_eq!(seq.current_step(), TOTAL_STEPS);
        assert_eq!(seq.highest_completed_step(), TOTAL_STEPS);

        let seq = StepSequencer::resume(TOTAL_STEPS, 2, 6);
        assert_eq!(seq.current_step(), 2);
        assert!(seq.can_go_to(6));
        assert!(!seq.can_go_to(7));
    }

    #[test]
    fn unlock_all_opens_every_step() {
        let mut seq = StepSequencer::default();
        seq.unlock_all();
        assert!(seq.can_go_to(TOTAL_STEPS));
    }

    #[test]
    fn validate_step_number_bounds() {
        assert!(validate_step_number(1).is_ok());
        assert!(validate_step_number(10).is_ok());
        assert!(validate_step_number(0).is_err());
        assert!(validate_step_number(11).is_err());
    }
}
