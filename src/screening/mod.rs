//! Drug-test screening rules.
//!
//! Pure decision logic with no I/O:
//! 1. Catalog: substance codes, labels and panel membership
//! 2. Policy: severity of a missing expected substance
//! 3. Classifier: initial screen partitions and result
//! 4. Resolver: final status after lab confirmation
//! 5. Status: drug-test lifecycle transitions
//! 6. Report: client- and referral-facing summaries

mod catalog;
mod classifier;
mod policy;
mod report;
mod resolver;
mod status;
mod types;

use thiserror::Error;

use crate::models::enums::ScreeningStatus;

// ═══════════════════════════════════════════════════════════════════════════
// Error type
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum ScreeningError {
    #[error("Invalid screening transition: {from} -> {to}")]
    InvalidTransition {
        from: ScreeningStatus,
        to: ScreeningStatus,
    },

    #[error("Confirmation still pending for: {}", .0.join(", "))]
    ConfirmationPending(Vec<String>),

    #[error("Drug test has not been screened yet")]
    NotScreened,
}

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use catalog::*;
pub use classifier::classify;
pub use policy::*;
pub use report::*;
pub use resolver::*;
pub use status::*;
pub use types::*;
