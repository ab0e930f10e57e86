use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::MedicationStatus;

/// A client medication as maintained by clinic staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: MedicationStatus,
    /// Substance codes this medication is expected to trigger on a screen.
    pub detected_as: Vec<String>,
    pub require_confirmation: bool,
}

/// One medication as frozen into a drug test at creation time.
///
/// Deserialization is lenient: a stored entry missing `detected_as` yields an
/// empty set, which means the medication explains no substances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationSnapshotEntry {
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub status: MedicationStatus,
    #[serde(default)]
    pub detected_as: Vec<String>,
    #[serde(default)]
    pub require_confirmation: bool,
}

impl MedicationSnapshotEntry {
    /// Active at test time: status is active and the date range covers `date`.
    /// A missing start date is treated as open-ended.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.status == MedicationStatus::Active
            && self.start_date.map_or(true, |start| start <= date)
            && self.end_date.map_or(true, |end| end >= date)
    }
}

impl From<&Medication> for MedicationSnapshotEntry {
    fn from(med: &Medication) -> Self {
        Self {
            name: med.name.clone(),
            start_date: Some(med.start_date),
            end_date: med.end_date,
            status: med.status,
            detected_as: med.detected_as.clone(),
            require_confirmation: med.require_confirmation,
        }
    }
}

/// Immutable copy of a client's medications attached to a drug test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationSnapshot {
    pub captured_at: NaiveDateTime,
    #[serde(default)]
    pub medications: Vec<MedicationSnapshotEntry>,
}

impl MedicationSnapshot {
    pub fn capture(medications: &[Medication], captured_at: NaiveDateTime) -> Self {
        Self {
            captured_at,
            medications: medications.iter().map(MedicationSnapshotEntry::from).collect(),
        }
    }
}
