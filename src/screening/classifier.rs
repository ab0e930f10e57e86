use std::collections::BTreeMap;

use crate::models::enums::{Disposition, NegativeSeverity, ScreenResult};

use super::catalog::normalize_codes;
use super::policy::missing_substance_severity;
use super::types::{ClassificationOutcome, ScreeningInput, UnexpectedNegative};

#[derive(Default)]
struct Expectation {
    severity: Option<NegativeSeverity>,
    medications: Vec<String>,
}

/// Classify an initial screen against the client's medication snapshot.
///
/// Pure: the same input always yields the same outcome.
pub fn classify(input: &ScreeningInput) -> ClassificationOutcome {
    let detected = normalize_codes(&input.detected_substances);

    let mut expected: BTreeMap<String, Expectation> = BTreeMap::new();
    for med in input
        .medications
        .iter()
        .filter(|m| m.is_active_on(input.collection_date))
    {
        for code in normalize_codes(&med.detected_as) {
            let severity = missing_substance_severity(&code, med.require_confirmation);
            let entry = expected.entry(code).or_default();
            entry.severity = entry.severity.max(severity);
            entry.medications.push(med.name.clone());
        }
    }

    let (expected_positives, unexpected_positives): (Vec<String>, Vec<String>) = detected
        .iter()
        .cloned()
        .partition(|code| expected.contains_key(code));

    let unexpected_negatives: Vec<UnexpectedNegative> = expected
        .into_iter()
        .filter(|(code, _)| !detected.contains(code))
        .filter_map(|(substance, exp)| {
            exp.severity.map(|severity| UnexpectedNegative {
                substance,
                severity,
                medications: exp.medications,
            })
        })
        .collect();

    let initial_screen_result =
        derive_screen_result(&expected_positives, &unexpected_positives, &unexpected_negatives);
    let breathalyzer_positive = input.breathalyzer.is_positive();

    ClassificationOutcome {
        disposition: derive_disposition(initial_screen_result, breathalyzer_positive),
        expected_positives,
        unexpected_positives,
        unexpected_negatives,
        confirmed_negatives: Vec::new(),
        initial_screen_result,
        breathalyzer_positive,
    }
}

/// Screen result from the substance partitions. Shared with the confirmation resolver
/// so that the initial and final statuses follow the same rules.
pub(crate) fn derive_screen_result(
    expected_positives: &[String],
    unexpected_positives: &[String],
    unexpected_negatives: &[UnexpectedNegative],
) -> ScreenResult {
    let worst_negative = unexpected_negatives.iter().map(|n| n.severity).max();

    match (unexpected_positives.is_empty(), worst_negative) {
        (false, Some(_)) => ScreenResult::MixedUnexpected,
        (false, None) => ScreenResult::UnexpectedPositive,
        (true, Some(NegativeSeverity::Critical)) => ScreenResult::UnexpectedNegativeCritical,
        (true, Some(NegativeSeverity::Warning)) => ScreenResult::UnexpectedNegativeWarning,
        (true, None) if !expected_positives.is_empty() => ScreenResult::ExpectedPositive,
        (true, None) => ScreenResult::Negative,
    }
}

/// A positive breathalyzer fails the test regardless of the substance result.
pub(crate) fn derive_disposition(result: ScreenResult, breathalyzer_positive: bool) -> Disposition {
    if breathalyzer_positive {
        return Disposition::Fail;
    }
    match result {
        ScreenResult::Negative
        | ScreenResult::ExpectedPositive
        | ScreenResult::UnexpectedNegativeWarning => Disposition::Pass,
        ScreenResult::UnexpectedPositive
        | ScreenResult::UnexpectedNegativeCritical
        | ScreenResult::MixedUnexpected => Disposition::Fail,
    }
}
