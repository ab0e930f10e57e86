//! Expectation policy: how a missing expected substance is flagged.
//!
//! | `require_confirmation` | clinically mandatory substance | missing substance |
//! |------------------------|--------------------------------|-------------------|
//! | any                    | yes                            | critical          |
//! | true                   | no                             | warning           |
//! | false                  | no                             | not flagged       |
//!
//! Clinically mandatory substances are the medication-assisted treatment
//! (MAT) drugs: a client on MAT who screens negative for it is either not
//! taking it or diverting it.

use crate::models::enums::NegativeSeverity;

use super::catalog::normalize_code;

pub const CLINICALLY_MANDATORY: &[&str] = &["buprenorphine", "methadone", "naltrexone"];

pub fn is_clinically_mandatory(code: &str) -> bool {
    let code = normalize_code(code);
    CLINICALLY_MANDATORY.contains(&code.as_str())
}

/// Severity of `substance` going undetected for a medication with the given flag.
/// `None` means the miss is incidental and not reported.
pub fn missing_substance_severity(
    substance: &str,
    require_confirmation: bool,
) -> Option<NegativeSeverity> {
    if is_clinically_mandatory(substance) {
        Some(NegativeSeverity::Critical)
    } else if require_confirmation {
        Some(NegativeSeverity::Warning)
    } else {
        None
    }
}
