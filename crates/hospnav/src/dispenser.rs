//! Client for the remote medication dispenser.
//!
//! The dispenser exposes one endpoint that opens the box. Requests go either
//! straight to the device or through a same-origin proxy path, depending on
//! [`DispenserMode`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{DispenserConfig, DispenserMode};
use crate::error::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    medication_id: Option<&'a str>,
    timestamp: String,
    action: &'static str,
}

impl<'a> OpenRequest<'a> {
    fn new(medication_id: Option<&'a str>, at: DateTime<Utc>) -> Self {
        Self {
            medication_id,
            timestamp: at.to_rfc3339(),
            action: "open",
        }
    }
}

/// Sends open commands to the dispenser.
#[derive(Debug, Clone)]
pub struct DispenserClient {
    client: reqwest::Client,
    target: Url,
}

impl DispenserClient {
    /// Build a client posting to `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(target: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, target })
    }

    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if the configured URLs don't parse.
    pub fn from_config(config: &DispenserConfig) -> Result<Self> {
        let target = resolve_target(config)?;
        Self::new(target, Duration::from_secs(config.timeout_secs))
    }

    /// Where open requests are sent.
    #[must_use]
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Ask the dispenser to open, optionally for a specific medication.
    ///
    /// # Errors
    ///
    /// - [`Error::Network`] if the endpoint cannot be reached or times out
    /// - [`Error::DeviceUnavailable`] if it answers with a non-success status
    /// - [`Error::Json`] if a success response is not JSON
    pub async fn open(&self, medication_id: Option<&str>) -> Result<serde_json::Value> {
        let body = OpenRequest::new(medication_id, Utc::now());
        debug!("POST {} {:?}", self.target, body);

        let response = self
            .client
            .post(self.target.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!("Dispenser answered {status}: {detail}");
            return Err(Error::device_unavailable(
                "dispenser",
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let text = response.text().await?;
        let value = serde_json::from_str(&text)?;
        info!(
            "Dispenser opened{}",
            medication_id.map(|id| format!(" for {id}")).unwrap_or_default()
        );
        Ok(value)
    }
}

/// Work out the URL open requests go to.
///
/// # Errors
///
/// Returns [`Error::ConfigValidation`] if a URL does not parse.
pub fn resolve_target(config: &DispenserConfig) -> Result<Url> {
    let invalid = |what: &str, e: url::ParseError| Error::ConfigValidation {
        message: format!("dispenser {what} is not a valid URL: {e}"),
    };
    match config.mode {
        DispenserMode::Direct => Url::parse(&config.endpoint).map_err(|e| invalid("endpoint", e)),
        DispenserMode::Proxy => Url::parse(&config.proxy_origin)
            .and_then(|origin| origin.join(&config.proxy_path))
            .map_err(|e| invalid("proxy", e)),
    }
}
