//! Photograph-and-recognise workflow for medications.
//!
//! A [`CaptureSession`] walks through
//! `Idle -> Capturing -> Captured -> Recognizing -> Done`. The camera is held
//! only while capturing and is released on every way out of that state:
//! after the snapshot (whether or not it worked), on [`CaptureSession::stop`],
//! and when the session is dropped.
//!
//! Recognition itself sits behind [`Recognizer`]. [`SampleRecognizer`] picks a
//! random medication from the plan; a real image classifier can replace it.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::RecognitionConfig;
use crate::error::{Error, Result};
use crate::records::recognition::append_recognition;
use crate::records::{Medication, MedicationRecognition, RecordStore};

/// A still frame taken by the camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    /// The image as a data URI.
    pub data_url: String,
    /// When the frame was taken.
    pub captured_at: DateTime<Utc>,
}

/// What a recognizer concluded about an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOutcome {
    /// Id of the medication the image was compared with.
    pub medication_id: String,
    /// Name of that medication.
    pub medication_name: String,
    /// Confidence percentage, 0 to 100.
    pub confidence: u8,
    /// Whether the image shows that medication.
    pub matched: bool,
}

/// Identifies the medication in a photo.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Classify a captured image.
    ///
    /// # Errors
    ///
    /// Returns an error if no result can be produced.
    async fn classify(&self, image: &CapturedImage) -> Result<RecognitionOutcome>;
}

/// Stand-in recognizer that answers with a random medication from the plan.
pub struct SampleRecognizer {
    medications: Vec<Medication>,
    delay: Duration,
    confidence: RangeInclusive<u8>,
    match_probability: f64,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for SampleRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleRecognizer")
            .field("medications", &self.medications.len())
            .field("delay", &self.delay)
            .field("confidence", &self.confidence)
            .field("match_probability", &self.match_probability)
            .finish_non_exhaustive()
    }
}

impl SampleRecognizer {
    /// Create a recognizer choosing from `medications`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if `config` has an inverted
    /// confidence range or a probability outside `[0, 1]`.
    pub fn new(medications: Vec<Medication>, config: &RecognitionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            medications,
            delay: Duration::from_millis(config.delay_ms),
            confidence: config.min_confidence..=config.max_confidence,
            match_probability: config.match_probability,
            rng: Mutex::new(StdRng::from_entropy()),
        })
    }

    /// Use a fixed seed so results are reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    fn pick(&self) -> Result<RecognitionOutcome> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| Error::internal("recognizer rng lock poisoned"))?;
        let medication = self
            .medications
            .choose(&mut *rng)
            .ok_or_else(|| Error::recognition("no medications to compare against"))?;

        Ok(RecognitionOutcome {
            medication_id: medication.id.clone(),
            medication_name: medication.name.clone(),
            confidence: rng.gen_range(self.confidence.clone()),
            matched: rng.gen_bool(self.match_probability),
        })
    }
}

#[async_trait]
impl Recognizer for SampleRecognizer {
    async fn classify(&self, image: &CapturedImage) -> Result<RecognitionOutcome> {
        debug!(
            "Classifying {} byte image after {:?}",
            image.data_url.len(),
            self.delay
        );
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.pick()
    }
}

/// A capture device.
pub trait Camera: Send {
    /// Start the device. Called when entering the capturing state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceUnavailable`] if the device cannot be opened.
    fn acquire(&mut self) -> Result<()>;

    /// Take one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if no frame could be read.
    fn snapshot(&mut self) -> Result<CapturedImage>;

    /// Stop the device. Must be safe to call when already released.
    fn release(&mut self);

    /// Whether the device is currently held.
    fn is_active(&self) -> bool;
}

/// A camera whose frames are read from an image file.
#[derive(Debug)]
pub struct FileCamera {
    path: PathBuf,
    active: bool,
}

impl FileCamera {
    /// Create a camera that will read `path` on every snapshot.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            active: false,
        }
    }

    fn mime_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "image/jpeg",
        }
    }
}

impl Camera for FileCamera {
    fn acquire(&mut self) -> Result<()> {
        if !self.path.is_file() {
            return Err(Error::device_unavailable(
                "camera",
                format!("no image at {}", self.path.display()),
            ));
        }
        self.active = true;
        Ok(())
    }

    fn snapshot(&mut self) -> Result<CapturedImage> {
        if !self.active {
            return Err(Error::device_unavailable("camera", "camera is not started"));
        }
        let bytes = std::fs::read(&self.path).map_err(|e| {
            Error::device_unavailable("camera", format!("{}: {e}", self.path.display()))
        })?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(CapturedImage {
            data_url: format!("data:{};base64,{encoded}", Self::mime_type(&self.path)),
            captured_at: Utc::now(),
        })
    }

    fn release(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Where a capture session is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    /// Nothing happening; the camera is released.
    Idle,
    /// The camera is live.
    Capturing,
    /// A frame was taken; the camera is released.
    Captured(CapturedImage),
    /// The frame is being classified.
    Recognizing,
    /// The result was saved.
    Done(MedicationRecognition),
}

impl CaptureState {
    /// Short lowercase name, for messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Capturing => "capturing",
            Self::Captured(_) => "captured",
            Self::Recognizing => "recognizing",
            Self::Done(_) => "done",
        }
    }
}

/// One pass through the capture-and-recognise screen.
#[derive(Debug)]
pub struct CaptureSession<C: Camera> {
    camera: C,
    state: CaptureState,
}

impl<C: Camera> CaptureSession<C> {
    /// Create an idle session.
    #[must_use]
    pub fn new(camera: C) -> Self {
        Self {
            camera,
            state: CaptureState::Idle,
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// The camera, for inspection.
    #[must_use]
    pub fn camera(&self) -> &C {
        &self.camera
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }

    /// `Idle -> Capturing`: acquire the camera.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] outside `Idle`, or the camera's
    /// error (the session stays `Idle`).
    pub fn start(&mut self) -> Result<()> {
        if self.state != CaptureState::Idle {
            return Err(self.invalid("start capturing"));
        }
        if let Err(e) = self.camera.acquire() {
            self.camera.release();
            return Err(e);
        }
        debug!("Camera acquired");
        self.state = CaptureState::Capturing;
        Ok(())
    }

    /// `Capturing -> Captured`: take a frame and release the camera.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] outside `Capturing`. If the frame
    /// cannot be read the camera is still released and the session goes back
    /// to `Idle`.
    pub fn take_snapshot(&mut self) -> Result<&CapturedImage> {
        if self.state != CaptureState::Capturing {
            return Err(self.invalid("take a photo"));
        }
        let frame = self.camera.snapshot();
        self.camera.release();

        match frame {
            Ok(image) => self.state = CaptureState::Captured(image),
            Err(e) => {
                self.state = CaptureState::Idle;
                return Err(e);
            }
        }
        let CaptureState::Captured(image) = &self.state else {
            unreachable!("state was just set to captured");
        };
        Ok(image)
    }

    /// `Captured -> Idle -> Capturing`: discard the frame and start again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] outside `Captured`, or the
    /// camera's error (the session is then `Idle`).
    pub fn retake(&mut self) -> Result<()> {
        if !matches!(self.state, CaptureState::Captured(_)) {
            return Err(self.invalid("retake"));
        }
        self.state = CaptureState::Idle;
        self.start()
    }

    /// Leave the screen: release the camera and return to `Idle`.
    ///
    /// A finished session stays `Done`.
    pub fn stop(&mut self) {
        if self.camera.is_active() {
            self.camera.release();
            debug!("Camera released on stop");
        }
        if !matches!(self.state, CaptureState::Done(_)) {
            self.state = CaptureState::Idle;
        }
    }

    /// `Captured -> Recognizing -> Done`: classify the frame and save the result.
    ///
    /// Once started this runs to completion. On failure the session goes back
    /// to `Captured` with the same frame so the user can try again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] outside `Captured`, the
    /// recognizer's error, or the store's error if the history can't be saved.
    pub async fn recognize(
        &mut self,
        recognizer: &dyn Recognizer,
        records: &RecordStore<'_>,
    ) -> Result<MedicationRecognition> {
        let image = match std::mem::replace(&mut self.state, CaptureState::Recognizing) {
            CaptureState::Captured(image) => image,
            other => {
                self.state = other;
                return Err(self.invalid("recognize"));
            }
        };

        match classify_and_store(&image, recognizer, records).await {
            Ok(record) => {
                info!(
                    "Recognised {} ({}%, matched: {})",
                    record.medication_name, record.confidence, record.matched
                );
                self.state = CaptureState::Done(record.clone());
                Ok(record)
            }
            Err(e) => {
                warn!("Recognition failed: {e}");
                self.state = CaptureState::Captured(image);
                Err(e)
            }
        }
    }
}

impl<C: Camera> Drop for CaptureSession<C> {
    fn drop(&mut self) {
        if self.camera.is_active() {
            self.camera.release();
            debug!("Camera released on drop");
        }
    }
}

async fn classify_and_store(
    image: &CapturedImage,
    recognizer: &dyn Recognizer,
    records: &RecordStore<'_>,
) -> Result<MedicationRecognition> {
    let outcome = recognizer.classify(image).await?;
    if outcome.confidence > 100 {
        return Err(Error::recognition(format!(
            "confidence {} out of range",
            outcome.confidence
        )));
    }

    let history: Vec<MedicationRecognition> = records.load()?;
    let record = MedicationRecognition::new(
        &history,
        image.captured_at,
        image.data_url.clone(),
        outcome.medication_id,
        outcome.medication_name,
        outcome.matched,
        outcome.confidence,
    );
    let history = append_recognition(history, record.clone());
    records.save(&history)?;
    Ok(record)
}
