//! Medication recognition history.
//!
//! Newest first. Entries are never edited; the only removal is clearing the
//! whole history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp_id, Named, Record};
use crate::error::{Error, Result};

/// One capture-and-recognise result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRecognition {
    /// `rec-<millis>`.
    pub id: String,

    /// When the photo was taken.
    pub timestamp: DateTime<Utc>,

    /// The captured image, usually a data URI.
    pub image_url: String,

    /// Id of the medication the image was matched against.
    pub medication_id: String,

    /// Name of that medication at the time of recognition.
    pub medication_name: String,

    /// Whether the image was judged to show that medication.
    pub matched: bool,

    /// Confidence percentage, 0 to 100.
    pub confidence: u8,
}

impl MedicationRecognition {
    /// Create a record stamped at `timestamp`, with an id unique in `existing`.
    #[must_use]
    pub fn new(
        existing: &[MedicationRecognition],
        timestamp: DateTime<Utc>,
        image_url: String,
        medication_id: String,
        medication_name: String,
        matched: bool,
        confidence: u8,
    ) -> Self {
        let id = timestamp_id("rec", timestamp.timestamp_millis(), |id| {
            existing.iter().any(|r| r.id == id)
        });
        Self {
            id,
            timestamp,
            image_url,
            medication_id,
            medication_name,
            matched,
            confidence,
        }
    }
}

impl Record for MedicationRecognition {
    const KEY: &'static str = "medicationRecognitions";

    fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::validation("id", "must not be empty"));
        }
        if self.medication_id.is_empty() {
            return Err(Error::validation("medicationId", "must not be empty"));
        }
        if self.confidence > 100 {
            return Err(Error::validation(
                "confidence",
                format!("{} is not a percentage", self.confidence),
            ));
        }
        Ok(())
    }
}

impl Named for MedicationRecognition {
    fn display_name(&self) -> &str {
        &self.medication_name
    }
}

/// Put `record` at the front of the history.
#[must_use]
pub fn append_recognition(
    mut records: Vec<MedicationRecognition>,
    record: MedicationRecognition,
) -> Vec<MedicationRecognition> {
    records.insert(0, record);
    records
}

/// Find a recognition by id, e.g. for the result page.
#[must_use]
pub fn find_recognition<'a>(
    records: &'a [MedicationRecognition],
    id: &str,
) -> Option<&'a MedicationRecognition> {
    records.iter().find(|r| r.id == id)
}
