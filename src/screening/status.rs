use crate::models::enums::{ConfirmationDecision, ScreeningStatus};

use super::ScreeningError;

impl ScreeningStatus {
    /// Allowed lifecycle edges:
    /// pending → collected → screened → [confirmation-pending →] complete.
    pub fn can_transition_to(&self, next: ScreeningStatus) -> bool {
        use ScreeningStatus::*;
        matches!(
            (self, next),
            (Pending, Collected)
                | (Collected, Screened)
                | (Screened, ConfirmationPending)
                | (Screened, Complete)
                | (ConfirmationPending, Complete)
        )
    }

    pub fn transition_to(self, next: ScreeningStatus) -> Result<ScreeningStatus, ScreeningError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ScreeningError::InvalidTransition { from: self, to: next })
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == ScreeningStatus::Complete
    }
}

/// Where a screened test goes once staff record their confirmation decision.
pub fn status_after_decision(decision: ConfirmationDecision) -> ScreeningStatus {
    match decision {
        ConfirmationDecision::RequestConfirmation => ScreeningStatus::ConfirmationPending,
        ConfirmationDecision::AcceptAsIs => ScreeningStatus::Complete,
    }
}
