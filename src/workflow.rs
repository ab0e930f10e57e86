//! Drug-test workflow.
//!
//! Drives a persisted drug test through its lifecycle: snapshot capture at
//! creation, collection with technician auto-assignment, the initial screen,
//! the confirmation decision, lab verdicts and finalization. Entering
//! `complete` dispatches result notifications once per test.

use chrono::NaiveDate;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError, SqliteSchedule};
use crate::duty::{self, DutyError};
use crate::models::enums::{ConfirmationDecision, ScreeningStatus, TestType};
use crate::models::{BreathalyzerReading, ConfirmationResult, DrugTest, MedicationSnapshot};
use crate::notifications::{self, DispatchSummary, Notifier};
use crate::screening::{
    self, accept_screen, classify, elected_targets, resolve_confirmation, resolve_elected,
    status_after_decision, verdict_map, ClassificationOutcome, ConfirmationOutcome, LabVerdict,
    Resolution, ScreeningError, ScreeningInput,
};

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Screening(#[from] ScreeningError),

    #[error(transparent)]
    Duty(#[from] DutyError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Invalid request: {0}")]
    Validation(String),
}

impl From<rusqlite::Error> for WorkflowError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(DatabaseError::Sqlite(e))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDrugTest {
    pub client_id: Uuid,
    pub test_type: TestType,
    pub collection_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionEntry {
    /// Clock time as entered by staff, e.g. "11:10 AM".
    pub collection_time: String,
    /// Explicit assignment; when absent the on-duty technician is looked up.
    #[serde(default)]
    pub technician_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScreenEntry {
    pub detected_substances: Vec<String>,
    #[serde(default)]
    pub breathalyzer: BreathalyzerReading,
}

#[derive(Debug, Clone, Serialize)]
pub struct DrugTestDetail {
    #[serde(flatten)]
    pub test: DrugTest,
    pub confirmations: Vec<ConfirmationResult>,
}

/// Result of a step that may have completed the test.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub test: DrugTest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<DispatchSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TechnicianAssignment {
    pub technician_id: Uuid,
}

/// Every step reads the test and writes it back under one write lock, so a
/// concurrent request on the same test sees the committed status.
fn begin_step(conn: &Connection) -> Result<Transaction<'_>, WorkflowError> {
    Ok(Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?)
}

fn load_test(conn: &Connection, id: &Uuid) -> Result<DrugTest, WorkflowError> {
    db::get_drug_test(conn, id)?.ok_or(WorkflowError::NotFound {
        entity: "Drug test",
        id: *id,
    })
}

fn screening_input(test: &DrugTest) -> ScreeningInput {
    ScreeningInput {
        detected_substances: test.detected_substances.clone(),
        medications: test.medication_snapshot.medications.clone(),
        breathalyzer: test.breathalyzer,
        collection_date: test.collection_date,
    }
}

/// Substances the lab must rule on before the test can be finalized.
fn awaited_substances(test: &DrugTest, screen: &ClassificationOutcome) -> Vec<String> {
    if screen.requires_confirmation() {
        screen.unexpected_positives.clone()
    } else {
        elected_targets(&screening_input(test))
    }
}

pub fn get_detail(conn: &Connection, id: &Uuid) -> Result<DrugTestDetail, WorkflowError> {
    let test = load_test(conn, id)?;
    let confirmations = db::get_confirmation_results(conn, id)?;
    Ok(DrugTestDetail { test, confirmations })
}

/// Create a test in `pending`, freezing the client's medications as of now.
pub fn create_drug_test(conn: &Connection, new: &NewDrugTest) -> Result<DrugTest, WorkflowError> {
    if db::get_client(conn, &new.client_id)?.is_none() {
        return Err(WorkflowError::NotFound {
            entity: "Client",
            id: new.client_id,
        });
    }

    let now = db::now();
    let medications = db::get_client_medications(conn, &new.client_id)?;
    let test = DrugTest {
        id: Uuid::new_v4(),
        client_id: new.client_id,
        test_type: new.test_type,
        collection_date: new.collection_date,
        collection_time: None,
        technician_id: None,
        status: ScreeningStatus::Pending,
        detected_substances: Vec::new(),
        breathalyzer: BreathalyzerReading::default(),
        medication_snapshot: MedicationSnapshot::capture(&medications, now),
        screen_outcome: None,
        confirmation_decision: None,
        final_outcome: None,
        notified_at: None,
        created_at: now,
        updated_at: now,
    };
    db::insert_drug_test(conn, &test)?;

    tracing::info!(
        test_id = %test.id,
        client_id = %test.client_id,
        medications = test.medication_snapshot.medications.len(),
        "Drug test created"
    );
    Ok(test)
}

/// `pending → collected`. Assigns the on-duty technician unless one is given.
pub fn record_collection(
    conn: &Connection,
    id: &Uuid,
    entry: &CollectionEntry,
) -> Result<DrugTest, WorkflowError> {
    let time = duty::parse_clock_time(&entry.collection_time)?;
    let tx = begin_step(conn)?;
    let mut test = load_test(&tx, id)?;
    let from = test.status;
    let status = from.transition_to(ScreeningStatus::Collected)?;

    let technician_id = match entry.technician_id {
        Some(tech_id) => {
            if db::get_technician(&tx, &tech_id)?.is_none() {
                return Err(WorkflowError::NotFound {
                    entity: "Technician",
                    id: tech_id,
                });
            }
            Some(tech_id)
        }
        None => duty::find_on_duty_at(&SqliteSchedule::new(&tx), test.collection_date, time)?
            .map(|m| m.technician.id),
    };

    if technician_id.is_none() {
        tracing::warn!(test_id = %test.id, %time, "Collected without a technician assigned");
    }

    test.status = status;
    test.collection_time = Some(time);
    test.technician_id = technician_id;
    test.updated_at = db::now();
    db::update_drug_test(&tx, &test, from)?;
    tx.commit()?;
    Ok(test)
}

/// Assign a technician by hand. Clears the test from the unassigned queue.
pub fn assign_technician(
    conn: &Connection,
    id: &Uuid,
    assignment: &TechnicianAssignment,
) -> Result<DrugTest, WorkflowError> {
    let tx = begin_step(conn)?;
    let mut test = load_test(&tx, id)?;
    if test.status == ScreeningStatus::Pending {
        return Err(WorkflowError::Validation(
            "a technician can only be assigned once the sample is collected".into(),
        ));
    }
    if db::get_technician(&tx, &assignment.technician_id)?.is_none() {
        return Err(WorkflowError::NotFound {
            entity: "Technician",
            id: assignment.technician_id,
        });
    }

    let previous = test.technician_id.replace(assignment.technician_id);
    test.updated_at = db::now();
    db::update_drug_test(&tx, &test, test.status)?;
    tx.commit()?;

    tracing::info!(
        test_id = %test.id,
        technician_id = %assignment.technician_id,
        reassigned = previous.is_some(),
        "Technician assigned"
    );
    Ok(test)
}

/// `collected → screened`. Classifies against the snapshot taken at creation.
pub fn record_screen(
    conn: &Connection,
    id: &Uuid,
    entry: &ScreenEntry,
) -> Result<DrugTest, WorkflowError> {
    let tx = begin_step(conn)?;
    let mut test = load_test(&tx, id)?;
    let from = test.status;
    let status = from.transition_to(ScreeningStatus::Screened)?;

    let detected: Vec<String> = screening::normalize_codes(&entry.detected_substances)
        .into_iter()
        .collect();
    for code in detected.iter().filter(|c| !screening::is_on_panel(c, test.test_type)) {
        tracing::warn!(
            test_id = %test.id,
            substance = %code,
            panel = test.test_type.as_str(),
            "Detected substance is not on this panel"
        );
    }

    test.detected_substances = detected;
    test.breathalyzer = entry.breathalyzer;
    let outcome = classify(&screening_input(&test));

    tracing::info!(
        test_id = %test.id,
        result = outcome.initial_screen_result.as_str(),
        disposition = outcome.disposition.as_str(),
        "Initial screen classified"
    );

    test.status = status;
    test.screen_outcome = Some(outcome);
    test.updated_at = db::now();
    db::update_drug_test(&tx, &test, from)?;
    tx.commit()?;
    Ok(test)
}

/// Staff decision after the screen. `accept-as-is` completes the test with the
/// initial result; `request-confirmation` waits for lab verdicts, on the
/// unexpected positives or, when staff elect it on a clean screen, on the
/// positives of medications that require confirmation.
pub fn record_confirmation_decision(
    conn: &Connection,
    notifier: &dyn Notifier,
    id: &Uuid,
    decision: ConfirmationDecision,
) -> Result<StepOutcome, WorkflowError> {
    let tx = begin_step(conn)?;
    let mut test = load_test(&tx, id)?;
    let next = test.status.transition_to(status_after_decision(decision))?;
    let screen = test.screen_outcome.clone().ok_or(ScreeningError::NotScreened)?;

    test.confirmation_decision = Some(decision);
    match next {
        ScreeningStatus::Complete => complete(conn, tx, notifier, test, accept_screen(&screen)),
        _ => {
            let from = test.status;
            test.status = next;
            test.updated_at = db::now();
            db::update_drug_test(&tx, &test, from)?;
            tx.commit()?;
            tracing::info!(
                test_id = %test.id,
                elected = !screen.requires_confirmation(),
                substances = ?awaited_substances(&test, &screen),
                "Lab confirmation requested"
            );
            Ok(StepOutcome {
                test,
                notifications: None,
            })
        }
    }
}

/// Store lab verdicts. All verdicts in one call are written together.
pub fn record_confirmation_results(
    conn: &Connection,
    id: &Uuid,
    verdicts: &[LabVerdict],
) -> Result<Vec<ConfirmationResult>, WorkflowError> {
    if verdicts.iter().any(|v| screening::normalize_code(&v.substance).is_empty()) {
        return Err(WorkflowError::Validation("verdict without a substance".into()));
    }

    let tx = begin_step(conn)?;
    let test = load_test(&tx, id)?;
    if test.status != ScreeningStatus::ConfirmationPending {
        return Err(WorkflowError::Validation(format!(
            "verdicts can only be recorded while confirmation is pending (status is {})",
            test.status
        )));
    }

    let recorded_at = db::now();
    for verdict in verdicts {
        db::upsert_confirmation_result(
            &tx,
            &ConfirmationResult {
                id: Uuid::new_v4(),
                drug_test_id: test.id,
                substance: screening::normalize_code(&verdict.substance),
                verdict: verdict.verdict,
                notes: verdict.notes.clone(),
                recorded_at,
            },
        )?;
    }
    tx.commit()?;

    tracing::info!(test_id = %test.id, count = verdicts.len(), "Confirmation results recorded");
    Ok(db::get_confirmation_results(conn, id)?)
}

/// `confirmation-pending → complete`, once every flagged substance has a verdict.
pub fn finalize(
    conn: &Connection,
    notifier: &dyn Notifier,
    id: &Uuid,
) -> Result<StepOutcome, WorkflowError> {
    let tx = begin_step(conn)?;
    let test = load_test(&tx, id)?;
    if test.status != ScreeningStatus::ConfirmationPending {
        return Err(ScreeningError::InvalidTransition {
            from: test.status,
            to: ScreeningStatus::Complete,
        }
        .into());
    }
    let screen = test.screen_outcome.clone().ok_or(ScreeningError::NotScreened)?;

    let verdicts = verdict_map(&db::get_confirmation_results(&tx, id)?);
    let resolution = if screen.requires_confirmation() {
        resolve_confirmation(&screen, &verdicts)
    } else {
        resolve_elected(&screening_input(&test), &verdicts)
    };

    match resolution {
        Resolution::Pending { awaiting } => {
            tracing::info!(test_id = %test.id, ?awaiting, "Finalization blocked on lab verdicts");
            Err(ScreeningError::ConfirmationPending(awaiting).into())
        }
        Resolution::Final(outcome) => complete(conn, tx, notifier, test, outcome),
    }
}

/// Tests collected without a technician, for manual assignment.
pub fn unassigned_tests(conn: &Connection) -> Result<Vec<DrugTest>, WorkflowError> {
    Ok(db::list_unassigned_drug_tests(conn)?)
}

/// Write the terminal state inside `tx`, commit, then send results.
fn complete(
    conn: &Connection,
    tx: Transaction<'_>,
    notifier: &dyn Notifier,
    mut test: DrugTest,
    outcome: ConfirmationOutcome,
) -> Result<StepOutcome, WorkflowError> {
    let from = test.status;
    test.status = from.transition_to(ScreeningStatus::Complete)?;
    let result = outcome.final_screen_result;
    let disposition = outcome.disposition;
    test.final_outcome = Some(outcome);
    test.updated_at = db::now();
    db::update_drug_test(&tx, &test, from)?;
    tx.commit()?;

    tracing::info!(
        test_id = %test.id,
        result = result.as_str(),
        disposition = disposition.as_str(),
        "Drug test complete"
    );

    let notifications = notify_once(conn, notifier, &mut test);
    Ok(StepOutcome {
        test,
        notifications,
    })
}

/// Completion is already committed here; nothing below may undo it.
fn notify_once(
    conn: &Connection,
    notifier: &dyn Notifier,
    test: &mut DrugTest,
) -> Option<DispatchSummary> {
    let claimed_at = db::now();
    match db::claim_drug_test_notification(conn, &test.id, claimed_at) {
        Ok(true) => test.notified_at = Some(claimed_at),
        Ok(false) => {
            tracing::warn!(test_id = %test.id, "Results were already sent for this test");
            return None;
        }
        Err(e) => {
            tracing::error!(test_id = %test.id, error = %e, "Failed to claim result notification");
            return None;
        }
    }

    match send_results(conn, notifier, test) {
        Ok(summary) => Some(summary),
        Err(e) => {
            tracing::error!(test_id = %test.id, error = %e, "Result notification dispatch failed");
            if let Err(e) = db::release_drug_test_notification(conn, &test.id) {
                tracing::error!(test_id = %test.id, error = %e, "Failed to release notification claim");
            }
            test.notified_at = None;
            None
        }
    }
}

fn send_results(
    conn: &Connection,
    notifier: &dyn Notifier,
    test: &DrugTest,
) -> Result<DispatchSummary, WorkflowError> {
    let outcome = test
        .final_outcome
        .as_ref()
        .ok_or(ScreeningError::NotScreened)?;
    let client = db::get_client(conn, &test.client_id)?.ok_or(WorkflowError::NotFound {
        entity: "Client",
        id: test.client_id,
    })?;
    let routed = notifications::route_notifications(&client, test, outcome);
    Ok(notifications::dispatch(conn, notifier, &routed)?)
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use chrono::{NaiveTime, Weekday};

    use super::*;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::{
        ConfirmationVerdict, Disposition, RecipientKind, ScreenResult, TimeSlot,
    };
    use crate::notifications::testing::RecordingNotifier;

    fn new_test(conn: &Connection, client_id: Uuid) -> DrugTest {
        create_drug_test(
            conn,
            &NewDrugTest {
                client_id,
                test_type: TestType::Instant15Panel,
                collection_date: fixtures::date("2025-06-07"),
            },
        )
        .unwrap()
    }

    fn collect(conn: &Connection, id: &Uuid) -> DrugTest {
        record_collection(
            conn,
            id,
            &CollectionEntry {
                collection_time: "11:10 AM".into(),
                technician_id: None,
            },
        )
        .unwrap()
    }

    fn screen(conn: &Connection, id: &Uuid, detected: &[&str]) -> DrugTest {
        record_screen(
            conn,
            id,
            &ScreenEntry {
                detected_substances: detected.iter().map(|s| s.to_string()).collect(),
                breathalyzer: BreathalyzerReading::default(),
            },
        )
        .unwrap()
    }

    fn verdict(substance: &str, verdict: ConfirmationVerdict) -> LabVerdict {
        LabVerdict {
            substance: substance.into(),
            verdict,
            notes: None,
        }
    }

    #[test]
    fn snapshot_is_frozen_at_creation() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, false);
        let med = fixtures::medication(&conn, client.id, "Suboxone", &["buprenorphine"], true);
        let test = new_test(&conn, client.id);

        db::discontinue_medication(&conn, &med.id, fixtures::date("2025-06-01")).unwrap();
        collect(&conn, &test.id);
        let screened = screen(&conn, &test.id, &[]);

        let outcome = screened.screen_outcome.unwrap();
        assert_eq!(outcome.initial_screen_result, ScreenResult::UnexpectedNegativeCritical);
        assert_eq!(outcome.unexpected_negatives[0].substance, "buprenorphine");
    }

    #[test]
    fn collection_assigns_on_duty_technician() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, false);
        let tech = fixtures::technician(&conn, "Technician A", &[(Weekday::Sat, TimeSlot::LateMorning)]);
        let test = new_test(&conn, client.id);

        let collected = collect(&conn, &test.id);
        assert_eq!(collected.status, ScreeningStatus::Collected);
        assert_eq!(collected.technician_id, Some(tech.id));
        assert_eq!(collected.collection_time, NaiveTime::from_hms_opt(11, 10, 0));
        assert!(unassigned_tests(&conn).unwrap().is_empty());
    }

    #[test]
    fn uncovered_collection_lands_in_unassigned_queue() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, false);
        let test = new_test(&conn, client.id);

        let collected = collect(&conn, &test.id);
        assert_eq!(collected.technician_id, None);
        let queue = unassigned_tests(&conn).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, test.id);
    }

    #[test]
    fn screen_before_collection_is_rejected() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, false);
        let test = new_test(&conn, client.id);

        let err = record_screen(
            &conn,
            &test.id,
            &ScreenEntry {
                detected_substances: vec![],
                breathalyzer: BreathalyzerReading::default(),
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Screening(ScreeningError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn screen_normalizes_detected_codes() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, false);
        let test = new_test(&conn, client.id);
        collect(&conn, &test.id);

        let screened = screen(&conn, &test.id, &[" Cocaine", "THC", "cocaine"]);
        assert_eq!(screened.detected_substances, vec!["cocaine", "thc"]);
    }

    #[test]
    fn accept_as_is_completes_and_notifies() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, true);
        let test = new_test(&conn, client.id);
        collect(&conn, &test.id);
        screen(&conn, &test.id, &[]);
        let notifier = RecordingNotifier::default();

        let step = record_confirmation_decision(
            &conn,
            &notifier,
            &test.id,
            ConfirmationDecision::AcceptAsIs,
        )
        .unwrap();

        assert_eq!(step.test.status, ScreeningStatus::Complete);
        assert_eq!(step.notifications.unwrap().delivered, 2);
        let stored = db::get_drug_test(&conn, &test.id).unwrap().unwrap();
        assert!(stored.notified_at.is_some());
        assert_eq!(
            stored.final_outcome.unwrap().final_screen_result,
            ScreenResult::Negative
        );
    }

    #[test]
    fn manual_election_waits_for_medication_positive() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, false);
        fixtures::medication(&conn, client.id, "Suboxone", &["buprenorphine"], true);
        let test = new_test(&conn, client.id);
        collect(&conn, &test.id);
        screen(&conn, &test.id, &["buprenorphine"]);
        let notifier = RecordingNotifier::default();

        let step = record_confirmation_decision(
            &conn,
            &notifier,
            &test.id,
            ConfirmationDecision::RequestConfirmation,
        )
        .unwrap();
        assert_eq!(step.test.status, ScreeningStatus::ConfirmationPending);

        match finalize(&conn, &notifier, &test.id).unwrap_err() {
            WorkflowError::Screening(ScreeningError::ConfirmationPending(awaiting)) => {
                assert_eq!(awaiting, vec!["buprenorphine"]);
            }
            other => panic!("expected pending confirmation, got {other:?}"),
        }

        record_confirmation_results(
            &conn,
            &test.id,
            &[verdict("buprenorphine", ConfirmationVerdict::ConfirmedNegative)],
        )
        .unwrap();
        let outcome = finalize(&conn, &notifier, &test.id)
            .unwrap()
            .test
            .final_outcome
            .unwrap();
        assert_eq!(outcome.final_screen_result, ScreenResult::UnexpectedNegativeCritical);
        assert_eq!(outcome.disposition, Disposition::Fail);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[test]
    fn manual_election_on_clean_screen_finalizes_without_verdicts() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, false);
        let test = new_test(&conn, client.id);
        collect(&conn, &test.id);
        screen(&conn, &test.id, &[]);
        let notifier = RecordingNotifier::default();

        record_confirmation_decision(
            &conn,
            &notifier,
            &test.id,
            ConfirmationDecision::RequestConfirmation,
        )
        .unwrap();
        let step = finalize(&conn, &notifier, &test.id).unwrap();
        assert_eq!(step.test.status, ScreeningStatus::Complete);
        assert_eq!(
            step.test.final_outcome.unwrap().final_screen_result,
            ScreenResult::Negative
        );
    }

    #[test]
    fn manual_assignment_clears_unassigned_queue() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, false);
        let tech = fixtures::technician(&conn, "Technician B", &[(Weekday::Mon, TimeSlot::LateMorning)]);
        let test = new_test(&conn, client.id);
        collect(&conn, &test.id);
        assert_eq!(unassigned_tests(&conn).unwrap().len(), 1);

        let assigned = assign_technician(
            &conn,
            &test.id,
            &TechnicianAssignment { technician_id: tech.id },
        )
        .unwrap();
        assert_eq!(assigned.technician_id, Some(tech.id));
        assert_eq!(assigned.status, ScreeningStatus::Collected);
        assert!(unassigned_tests(&conn).unwrap().is_empty());
    }

    #[test]
    fn assignment_needs_collection_and_known_technician() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, false);
        let tech = fixtures::technician(&conn, "Technician B", &[]);
        let test = new_test(&conn, client.id);

        let err = assign_technician(
            &conn,
            &test.id,
            &TechnicianAssignment { technician_id: tech.id },
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));

        collect(&conn, &test.id);
        let err = assign_technician(
            &conn,
            &test.id,
            &TechnicianAssignment { technician_id: Uuid::new_v4() },
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound { entity: "Technician", .. }));
    }

    #[test]
    fn confirmed_negative_clears_cocaine() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, false);
        let test = new_test(&conn, client.id);
        collect(&conn, &test.id);
        screen(&conn, &test.id, &["cocaine"]);
        let notifier = RecordingNotifier::default();

        record_confirmation_decision(
            &conn,
            &notifier,
            &test.id,
            ConfirmationDecision::RequestConfirmation,
        )
        .unwrap();

        let err = finalize(&conn, &notifier, &test.id).unwrap_err();
        match err {
            WorkflowError::Screening(ScreeningError::ConfirmationPending(awaiting)) => {
                assert_eq!(awaiting, vec!["cocaine"]);
            }
            other => panic!("expected pending confirmation, got {other:?}"),
        }
        assert!(notifier.sent().is_empty());

        record_confirmation_results(
            &conn,
            &test.id,
            &[verdict("Cocaine", ConfirmationVerdict::ConfirmedNegative)],
        )
        .unwrap();
        let step = finalize(&conn, &notifier, &test.id).unwrap();

        let outcome = step.test.final_outcome.unwrap();
        assert_eq!(outcome.final_screen_result, ScreenResult::Negative);
        assert_eq!(outcome.disposition, Disposition::Pass);
        assert_eq!(outcome.confirmed_negatives, vec!["cocaine"]);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[test]
    fn complete_is_terminal_and_notifies_once() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, false);
        let test = new_test(&conn, client.id);
        collect(&conn, &test.id);
        screen(&conn, &test.id, &["cocaine"]);
        let notifier = RecordingNotifier::default();

        record_confirmation_decision(
            &conn,
            &notifier,
            &test.id,
            ConfirmationDecision::RequestConfirmation,
        )
        .unwrap();
        record_confirmation_results(
            &conn,
            &test.id,
            &[verdict("cocaine", ConfirmationVerdict::ConfirmedPositive)],
        )
        .unwrap();
        finalize(&conn, &notifier, &test.id).unwrap();

        assert!(finalize(&conn, &notifier, &test.id).is_err());
        assert!(matches!(
            record_confirmation_results(
                &conn,
                &test.id,
                &[verdict("cocaine", ConfirmationVerdict::ConfirmedNegative)],
            ),
            Err(WorkflowError::Validation(_))
        ));
        assert_eq!(notifier.sent().len(), 1);
    }

    fn confirmation_pending_with_verdict(conn: &Connection, client_id: Uuid) -> DrugTest {
        let test = new_test(conn, client_id);
        collect(conn, &test.id);
        screen(conn, &test.id, &["cocaine"]);
        record_confirmation_decision(
            conn,
            &RecordingNotifier::default(),
            &test.id,
            ConfirmationDecision::RequestConfirmation,
        )
        .unwrap();
        record_confirmation_results(
            conn,
            &test.id,
            &[verdict("cocaine", ConfirmationVerdict::ConfirmedPositive)],
        )
        .unwrap();
        test
    }

    #[test]
    fn stale_copy_cannot_complete_twice() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, false);
        let test = confirmation_pending_with_verdict(&conn, client.id);
        let notifier = RecordingNotifier::default();

        // Loaded by a second request before the first one finalized.
        let stale = db::get_drug_test(&conn, &test.id).unwrap().unwrap();
        let verdicts = verdict_map(&db::get_confirmation_results(&conn, &test.id).unwrap());
        let outcome = match resolve_confirmation(stale.screen_outcome.as_ref().unwrap(), &verdicts) {
            Resolution::Final(outcome) => outcome,
            other => panic!("expected a final resolution, got {other:?}"),
        };

        finalize(&conn, &notifier, &test.id).unwrap();
        assert_eq!(notifier.sent().len(), 1);

        let tx = begin_step(&conn).unwrap();
        let err = complete(&conn, tx, &notifier, stale.clone(), outcome).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Database(DatabaseError::StatusChanged { .. })
        ));

        let mut stale = stale;
        assert!(notify_once(&conn, &notifier, &mut stale).is_none());
        assert_eq!(notifier.sent().len(), 1);
    }

    #[test]
    fn concurrent_finalize_completes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screenline.db");
        let conn = db::open_database(&path).unwrap();
        let client = fixtures::client(&conn, false);
        let test = confirmation_pending_with_verdict(&conn, client.id);

        let notifier = RecordingNotifier::default();
        let barrier = Barrier::new(2);
        let connections = vec![
            db::open_database(&path).unwrap(),
            db::open_database(&path).unwrap(),
        ];

        let results: Vec<Result<StepOutcome, WorkflowError>> = thread::scope(|scope| {
            let handles: Vec<_> = connections
                .into_iter()
                .map(|request_conn| {
                    let (barrier, notifier, id) = (&barrier, &notifier, test.id);
                    scope.spawn(move || {
                        barrier.wait();
                        finalize(&request_conn, notifier, &id)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(WorkflowError::Screening(ScreeningError::InvalidTransition { .. }))
        )));
        assert_eq!(notifier.sent().len(), 1);
        let stored = db::get_drug_test(&conn, &test.id).unwrap().unwrap();
        assert_eq!(stored.status, ScreeningStatus::Complete);
        assert!(stored.notified_at.is_some());
    }

    #[test]
    fn verdicts_rejected_after_completion() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, false);
        let test = confirmation_pending_with_verdict(&conn, client.id);
        finalize(&conn, &RecordingNotifier::default(), &test.id).unwrap();

        let err = record_confirmation_results(
            &conn,
            &test.id,
            &[verdict("cocaine", ConfirmationVerdict::ConfirmedNegative)],
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        let stored = db::get_confirmation_results(&conn, &test.id).unwrap();
        assert_eq!(stored[0].verdict, ConfirmationVerdict::ConfirmedPositive);
    }

    #[test]
    fn delivery_failure_does_not_roll_back_completion() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, true);
        let test = new_test(&conn, client.id);
        collect(&conn, &test.id);
        screen(&conn, &test.id, &["thc"]);
        let notifier = RecordingNotifier::rejecting(RecipientKind::Referral);

        let step = record_confirmation_decision(
            &conn,
            &notifier,
            &test.id,
            ConfirmationDecision::AcceptAsIs,
        )
        .unwrap();

        assert_eq!(step.test.status, ScreeningStatus::Complete);
        assert_eq!(step.notifications.unwrap().failed, 1);
        let stored = db::get_drug_test(&conn, &test.id).unwrap().unwrap();
        assert_eq!(stored.status, ScreeningStatus::Complete);
        assert_eq!(db::list_unresolved_notification_alerts(&conn).unwrap().len(), 1);
    }

    #[test]
    fn detail_includes_confirmations() {
        let conn = open_memory_database().unwrap();
        let client = fixtures::client(&conn, false);
        let test = new_test(&conn, client.id);
        collect(&conn, &test.id);
        screen(&conn, &test.id, &["cocaine", "thc"]);
        record_confirmation_decision(
            &conn,
            &RecordingNotifier::default(),
            &test.id,
            ConfirmationDecision::RequestConfirmation,
        )
        .unwrap();
        record_confirmation_results(
            &conn,
            &test.id,
            &[verdict("thc", ConfirmationVerdict::Inconclusive)],
        )
        .unwrap();

        let detail = get_detail(&conn, &test.id).unwrap();
        assert_eq!(detail.confirmations.len(), 1);
        assert_eq!(detail.test.status, ScreeningStatus::ConfirmationPending);
    }

    #[test]
    fn unknown_client_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = create_drug_test(
            &conn,
            &NewDrugTest {
                client_id: Uuid::new_v4(),
                test_type: TestType::Lab11Panel,
                collection_date: fixtures::date("2025-06-07"),
            },
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound { entity: "Client", .. }));
    }
}
