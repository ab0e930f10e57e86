use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::enums::{Disposition, NegativeSeverity, RecipientKind, ScreenResult, TestType};

use super::catalog::display_label;
use super::types::ConfirmationOutcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    pub code: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingLine {
    pub code: String,
    pub label: String,
    pub severity: NegativeSeverity,
    /// Only filled on the client-facing report.
    pub medications: Vec<String>,
}

/// Audience-specific summary of a finalized test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub drug_test_id: Uuid,
    pub audience: RecipientKind,
    pub client_name: String,
    pub collection_date: NaiveDate,
    pub test_type: TestType,
    pub headline: String,
    pub final_screen_result: ScreenResult,
    pub disposition: Disposition,
    pub breathalyzer_positive: bool,
    pub expected_positives: Vec<ReportLine>,
    pub unexpected_positives: Vec<ReportLine>,
    pub unexpected_negatives: Vec<MissingLine>,
    pub confirmed_negatives: Vec<ReportLine>,
    pub inconclusive: Vec<ReportLine>,
}

pub struct ReportContext<'a> {
    pub drug_test_id: Uuid,
    pub client_name: &'a str,
    pub collection_date: NaiveDate,
    pub test_type: TestType,
}

/// Build the report for one audience. Referral parties do not see which
/// medications a client is prescribed.
pub fn build_report(
    ctx: &ReportContext<'_>,
    outcome: &ConfirmationOutcome,
    audience: RecipientKind,
) -> TestReport {
    let lines = |codes: &[String]| -> Vec<ReportLine> {
        codes
            .iter()
            .map(|c| ReportLine { code: c.clone(), label: display_label(c) })
            .collect()
    };

    let unexpected_negatives = outcome
        .unexpected_negatives
        .iter()
        .map(|n| MissingLine {
            code: n.substance.clone(),
            label: display_label(&n.substance),
            severity: n.severity,
            medications: match audience {
                RecipientKind::Client => n.medications.clone(),
                RecipientKind::Referral => Vec::new(),
            },
        })
        .collect();

    TestReport {
        drug_test_id: ctx.drug_test_id,
        audience,
        client_name: ctx.client_name.to_string(),
        collection_date: ctx.collection_date,
        test_type: ctx.test_type,
        headline: headline(outcome),
        final_screen_result: outcome.final_screen_result,
        disposition: outcome.disposition,
        breathalyzer_positive: outcome.breathalyzer_positive,
        expected_positives: lines(&outcome.expected_positives),
        unexpected_positives: lines(&outcome.unexpected_positives),
        unexpected_negatives,
        confirmed_negatives: lines(&outcome.confirmed_negatives),
        inconclusive: lines(&outcome.inconclusive),
    }
}

/// One-line summary, e.g. "Unexpected positive: Cocaine, Marijuana (THC)".
pub fn headline(outcome: &ConfirmationOutcome) -> String {
    let labels = |codes: &[String]| {
        codes.iter().map(|c| display_label(c)).collect::<Vec<_>>().join(", ")
    };
    let missing: Vec<String> = outcome
        .unexpected_negatives
        .iter()
        .map(|n| n.substance.clone())
        .collect();

    let base = match outcome.final_screen_result {
        ScreenResult::Negative => "Negative".to_string(),
        ScreenResult::ExpectedPositive => {
            format!("Expected positive: {}", labels(&outcome.expected_positives))
        }
        ScreenResult::UnexpectedPositive => {
            format!("Unexpected positive: {}", labels(&outcome.unexpected_positives))
        }
        ScreenResult::UnexpectedNegativeCritical | ScreenResult::UnexpectedNegativeWarning => {
            format!("Expected medication not detected: {}", labels(&missing))
        }
        ScreenResult::MixedUnexpected => format!(
            "Unexpected positive: {}; not detected: {}",
            labels(&outcome.unexpected_positives),
            labels(&missing)
        ),
    };

    if outcome.breathalyzer_positive {
        format!("{base} (breathalyzer positive)")
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screening::UnexpectedNegative;

    fn outcome() -> ConfirmationOutcome {
        ConfirmationOutcome {
            expected_positives: vec![],
            unexpected_positives: vec!["cocaine".into()],
            unexpected_negatives: vec![UnexpectedNegative {
                substance: "buprenorphine".into(),
                severity: NegativeSeverity::Critical,
                medications: vec!["Suboxone".into()],
            }],
            confirmed_negatives: vec!["thc".into()],
            inconclusive: vec![],
            final_screen_result: ScreenResult::MixedUnexpected,
            breathalyzer_positive: false,
            disposition: Disposition::Fail,
        }
    }

    fn ctx() -> ReportContext<'static> {
        ReportContext {
            drug_test_id: Uuid::nil(),
            client_name: "Jordan Reyes",
            collection_date: NaiveDate::from_ymd_opt(2025, 6, 7).unwrap(),
            test_type: TestType::Instant15Panel,
        }
    }

    #[test]
    fn client_report_names_medications() {
        let report = build_report(&ctx(), &outcome(), RecipientKind::Client);
        assert_eq!(report.unexpected_negatives[0].medications, vec!["Suboxone"]);
        assert_eq!(report.confirmed_negatives[0].label, "Marijuana (THC)");
    }

    #[test]
    fn referral_report_hides_medications() {
        let report = build_report(&ctx(), &outcome(), RecipientKind::Referral);
        assert!(report.unexpected_negatives[0].medications.is_empty());
        assert_eq!(report.unexpected_negatives[0].label, "Buprenorphine");
    }

    #[test]
    fn headline_lists_labels() {
        assert_eq!(
            headline(&outcome()),
            "Unexpected positive: Cocaine; not detected: Buprenorphine"
        );
        let mut drunk = outcome();
        drunk.final_screen_result = ScreenResult::Negative;
        drunk.breathalyzer_positive = true;
        assert_eq!(headline(&drunk), "Negative (breathalyzer positive)");
    }
}
