use std::collections::{BTreeMap, BTreeSet};

use crate::models::enums::ConfirmationVerdict;
use crate::models::ConfirmationResult;

use super::catalog::{normalize_code, normalize_codes};
use super::classifier::{classify, derive_disposition, derive_screen_result};
use super::types::{ClassificationOutcome, ConfirmationOutcome, Resolution, ScreeningInput};

/// Apply lab verdicts to the unexpected positives of an initial screen.
///
/// `confirmed-negative` clears a substance; `confirmed-positive` and
/// `inconclusive` keep it failing. A flagged substance without a verdict makes
/// the whole resolution `Pending`; no verdict is ever assumed. Codes on both
/// sides are compared in normalized form.
pub fn resolve_confirmation(
    outcome: &ClassificationOutcome,
    verdicts: &BTreeMap<String, ConfirmationVerdict>,
) -> Resolution {
    let mut awaiting = Vec::new();
    let mut remaining = Vec::new();
    let mut inconclusive = Vec::new();
    let mut confirmed_negatives: BTreeSet<String> = normalize_codes(&outcome.confirmed_negatives);

    for substance in normalize_codes(&outcome.unexpected_positives) {
        match lookup_verdict(verdicts, &substance) {
            Some(ConfirmationVerdict::ConfirmedPositive) => remaining.push(substance),
            Some(ConfirmationVerdict::ConfirmedNegative) => {
                confirmed_negatives.insert(substance);
            }
            Some(ConfirmationVerdict::Inconclusive) => {
                inconclusive.push(substance.clone());
                remaining.push(substance);
            }
            None => awaiting.push(substance),
        }
    }

    if !awaiting.is_empty() {
        return Resolution::Pending { awaiting };
    }

    let expected_positives: Vec<String> = normalize_codes(&outcome.expected_positives)
        .into_iter()
        .collect();
    let final_screen_result = derive_screen_result(
        &expected_positives,
        &remaining,
        &outcome.unexpected_negatives,
    );

    Resolution::Final(ConfirmationOutcome {
        expected_positives,
        unexpected_positives: remaining,
        unexpected_negatives: outcome.unexpected_negatives.clone(),
        confirmed_negatives: confirmed_negatives.into_iter().collect(),
        inconclusive,
        final_screen_result,
        breathalyzer_positive: outcome.breathalyzer_positive,
        disposition: derive_disposition(final_screen_result, outcome.breathalyzer_positive),
    })
}

/// Detected substances that a manual confirmation election sends to the lab
/// when the screen had no unexpected positives: those explained by an active
/// medication marked `require_confirmation`.
pub fn elected_targets(input: &ScreeningInput) -> Vec<String> {
    let detected = normalize_codes(&input.detected_substances);
    let mut targets = BTreeSet::new();
    for med in input
        .medications
        .iter()
        .filter(|m| m.require_confirmation && m.is_active_on(input.collection_date))
    {
        targets.extend(
            normalize_codes(&med.detected_as)
                .into_iter()
                .filter(|code| detected.contains(code)),
        );
    }
    targets.into_iter().collect()
}

/// Resolve a manual election against the screen it was made on.
///
/// A `confirmed-negative` on an elected substance means the lab did not find
/// it, so the screen is classified again without it: a medication that should
/// have shown up then surfaces as an unexpected negative under the usual
/// policy. `confirmed-positive` and `inconclusive` leave the screen as it was.
pub fn resolve_elected(
    input: &ScreeningInput,
    verdicts: &BTreeMap<String, ConfirmationVerdict>,
) -> Resolution {
    let mut awaiting = Vec::new();
    let mut cleared = Vec::new();
    let mut inconclusive = Vec::new();

    for substance in elected_targets(input) {
        match lookup_verdict(verdicts, &substance) {
            Some(ConfirmationVerdict::ConfirmedPositive) => {}
            Some(ConfirmationVerdict::ConfirmedNegative) => cleared.push(substance),
            Some(ConfirmationVerdict::Inconclusive) => inconclusive.push(substance),
            None => awaiting.push(substance),
        }
    }

    if !awaiting.is_empty() {
        return Resolution::Pending { awaiting };
    }

    let reclassified = classify(&ScreeningInput {
        detected_substances: normalize_codes(&input.detected_substances)
            .into_iter()
            .filter(|code| !cleared.contains(code))
            .collect(),
        ..input.clone()
    });

    Resolution::Final(ConfirmationOutcome {
        expected_positives: reclassified.expected_positives,
        unexpected_positives: reclassified.unexpected_positives,
        unexpected_negatives: reclassified.unexpected_negatives,
        confirmed_negatives: cleared,
        inconclusive,
        final_screen_result: reclassified.initial_screen_result,
        breathalyzer_positive: reclassified.breathalyzer_positive,
        disposition: reclassified.disposition,
    })
}

fn lookup_verdict(
    verdicts: &BTreeMap<String, ConfirmationVerdict>,
    substance: &str,
) -> Option<ConfirmationVerdict> {
    verdicts.get(substance).copied().or_else(|| {
        verdicts
            .iter()
            .find(|(code, _)| normalize_code(code) == substance)
            .map(|(_, verdict)| *verdict)
    })
}

/// Final outcome when staff accept the initial screen without lab confirmation.
pub fn accept_screen(outcome: &ClassificationOutcome) -> ConfirmationOutcome {
    ConfirmationOutcome {
        expected_positives: outcome.expected_positives.clone(),
        unexpected_positives: outcome.unexpected_positives.clone(),
        unexpected_negatives: outcome.unexpected_negatives.clone(),
        confirmed_negatives: outcome.confirmed_negatives.clone(),
        inconclusive: Vec::new(),
        final_screen_result: outcome.initial_screen_result,
        breathalyzer_positive: outcome.breathalyzer_positive,
        disposition: outcome.disposition,
    }
}

/// Index stored confirmation rows by normalized substance code.
pub fn verdict_map(results: &[ConfirmationResult]) -> BTreeMap<String, ConfirmationVerdict> {
    results
        .iter()
        .map(|r| (normalize_code(&r.substance), r.verdict))
        .collect()
}
