//! Medications on the user's plan.
//!
//! The `medications` key is maintained elsewhere; this crate only reads it.
//! Until something has been stored there the built-in sample plan is used.

use serde::{Deserialize, Serialize};

use super::{Named, Record, RecordStore};
use crate::error::{Error, Result};

/// A medication on the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    /// Stable id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Amount per dose, e.g. `100mg`.
    #[serde(default)]
    pub dosage: String,
    /// How often, e.g. `once daily`.
    #[serde(default)]
    pub frequency: String,
    /// Times of day as `HH:MM`.
    #[serde(default)]
    pub times: Vec<String>,
    /// Free-text notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Record for Medication {
    const KEY: &'static str = "medications";

    fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::validation("id", "must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }
        for time in &self.times {
            if chrono::NaiveTime::parse_from_str(time, "%H:%M").is_err() {
                return Err(Error::validation("times", format!("'{time}' is not HH:MM")));
            }
        }
        Ok(())
    }
}

impl Named for Medication {
    fn display_name(&self) -> &str {
        &self.name
    }
}

fn medication(id: &str, name: &str, dosage: &str, frequency: &str, times: &[&str]) -> Medication {
    Medication {
        id: id.to_string(),
        name: name.to_string(),
        dosage: dosage.to_string(),
        frequency: frequency.to_string(),
        times: times.iter().map(|t| (*t).to_string()).collect(),
        notes: None,
    }
}

/// The sample plan shown before any medications are stored.
#[must_use]
pub fn sample_medications() -> Vec<Medication> {
    vec![
        medication("med-1", "Aspirin Enteric-Coated Tablets", "100mg", "once daily", &["08:00"]),
        medication("med-2", "Metformin Hydrochloride", "500mg", "twice daily", &["08:00", "18:00"]),
        medication("med-3", "Amlodipine Besylate", "5mg", "once daily", &["07:30"]),
        medication("med-4", "Atorvastatin Calcium", "20mg", "once nightly", &["21:00"]),
        Medication {
            notes: Some("Take with a full glass of water".to_string()),
            ..medication("med-5", "Calcium Carbonate D3", "600mg", "once daily", &["12:00"])
        },
    ]
}

/// Load the medication plan, falling back to the sample plan.
///
/// # Errors
///
/// Returns an error only if the underlying store cannot be read.
pub fn load_medications(records: &RecordStore<'_>) -> Result<Vec<Medication>> {
    let stored: Vec<Medication> = records.load()?;
    if stored.is_empty() {
        Ok(sample_medications())
    } else {
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::filter_by_name_substring;
    use crate::storage::{KeyValueStore, MemoryStore};

    #[test]
    fn test_sample_medications_are_valid() {
        let meds = sample_medications();
        assert!(!meds.is_empty());
        for med in &meds {
            assert!(med.validate().is_ok(), "{} invalid", med.id);
        }
    }

    #[test]
    fn test_load_falls_back_to_sample() {
        let store = MemoryStore::new();
        let meds = load_medications(&RecordStore::new(&store)).unwrap();
        assert_eq!(meds, sample_medications());
    }

    #[test]
    fn test_load_prefers_stored_plan() {
        let store = MemoryStore::new();
        store
            .set(
                Medication::KEY,
                r#"[{"id":"m1","name":"Warfarin","dosage":"3mg","frequency":"daily","times":["19:00"]}]"#,
            )
            .unwrap();

        let meds = load_medications(&RecordStore::new(&store)).unwrap();
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].name, "Warfarin");
    }

    #[test]
    fn test_bad_time_rejected() {
        let mut med = sample_medications().remove(0);
        med.times = vec!["8 o'clock".to_string()];
        assert!(med.validate().is_err());
    }

    #[test]
    fn test_filter_medications() {
        let meds = sample_medications();
        let found = filter_by_name_substring(&meds, "CALCIUM");
        let ids: Vec<_> = found.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["med-4", "med-5"]);
    }
}
