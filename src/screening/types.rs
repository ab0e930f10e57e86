use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::enums::{ConfirmationVerdict, Disposition, NegativeSeverity, ScreenResult};
use crate::models::{BreathalyzerReading, MedicationSnapshotEntry};

// ---------------------------------------------------------------------------
// Classifier input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningInput {
    pub detected_substances: Vec<String>,
    #[serde(default)]
    pub medications: Vec<MedicationSnapshotEntry>,
    #[serde(default)]
    pub breathalyzer: BreathalyzerReading,
    pub collection_date: NaiveDate,
}

// ---------------------------------------------------------------------------
// Classifier output
// ---------------------------------------------------------------------------

/// An expected substance that did not show up on the screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnexpectedNegative {
    pub substance: String,
    pub severity: NegativeSeverity,
    /// Names of the active medications that expect this substance.
    pub medications: Vec<String>,
}

/// Result of the initial screen. All substance lists are sorted and normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    pub expected_positives: Vec<String>,
    pub unexpected_positives: Vec<String>,
    pub unexpected_negatives: Vec<UnexpectedNegative>,
    pub confirmed_negatives: Vec<String>,
    pub initial_screen_result: ScreenResult,
    pub breathalyzer_positive: bool,
    pub disposition: Disposition,
}

impl ClassificationOutcome {
    /// Lab confirmation is indicated whenever something unexplained was detected.
    /// Staff may still elect it by hand when this is false.
    pub fn requires_confirmation(&self) -> bool {
        !self.unexpected_positives.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Resolver input / output
// ---------------------------------------------------------------------------

/// Verdict for one substance as submitted by staff or the lab interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabVerdict {
    pub substance: String,
    pub verdict: ConfirmationVerdict,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Final status after lab confirmation (or after accepting the screen as-is).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationOutcome {
    pub expected_positives: Vec<String>,
    /// Unexpected positives still failing after confirmation.
    pub unexpected_positives: Vec<String>,
    pub unexpected_negatives: Vec<UnexpectedNegative>,
    pub confirmed_negatives: Vec<String>,
    /// Flagged substances whose lab verdict was inconclusive.
    pub inconclusive: Vec<String>,
    pub final_screen_result: ScreenResult,
    pub breathalyzer_positive: bool,
    pub disposition: Disposition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum Resolution {
    /// At least one flagged substance has no verdict yet.
    Pending { awaiting: Vec<String> },
    Final(ConfirmationOutcome),
}

impl Resolution {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final(_))
    }
}
