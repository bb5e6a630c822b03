//! `hospnav` - Core of a hospital navigation assistant
//!
//! This library provides route-to-zone classification, locally persisted
//! family member profiles and medication recognition history, the
//! photograph-and-recognise workflow, and the client for the remote
//! medication dispenser.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod directory;
pub mod dispenser;
pub mod error;
pub mod logging;
pub mod recognition;
pub mod records;
pub mod storage;
pub mod validation;
pub mod zone;

pub use config::Config;
pub use dispenser::DispenserClient;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use recognition::{CaptureSession, CaptureState, Recognizer, SampleRecognizer};
pub use records::{FamilyMember, Medication, MedicationRecognition, RecordStore};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use zone::{classify_zone, title_for_path, Zone};
