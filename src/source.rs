//! # Gauge Source
//!
//! Fetches the current reading from the gauge's public endpoint.
//!
//! ## Data Format
//! The gauge publishes a tiny XML document:
//! ```text
//! <Hochwasserpegel>
//!   <Datum>01.05.2024</Datum>
//!   <Uhrzeit>13:00</Uhrzeit>
//!   <Pegel>3,45</Pegel>
//!   <Grafik>https://...</Grafik>
//! </Hochwasserpegel>
//! ```
//! Only the raw `Pegel` string is handed on; turning it into centimeters is the
//! job of [`crate::measurement`]. `Datum` and `Uhrzeit` are kept for logging.
//! The document goes through `quick-xml`, so comments are skipped while CDATA
//! sections and entities are decoded.

use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SourceError {
    /// Network, TLS, or protocol failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gauge answered with a non-success status
    #[error("gauge returned status {0}")]
    Status(u16),

    /// Body is not a well-formed gauge document
    #[error("invalid gauge document: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// Document did not contain the expected element
    #[error("gauge document has no <{0}> element")]
    MissingField(&'static str),
}

/// One raw reading as published by the gauge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaugeReading {
    /// Level in meters, comma decimal, e.g. `"3,45"`
    pub level: String,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// Wire shape of the `<Hochwasserpegel>` document. Unknown elements are ignored.
#[derive(Debug, Deserialize)]
struct Hochwasserpegel {
    #[serde(rename = "Pegel", default)]
    pegel: Option<String>,
    #[serde(rename = "Datum", default)]
    datum: Option<String>,
    #[serde(rename = "Uhrzeit", default)]
    uhrzeit: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl GaugeReading {
    /// Extract the reading from a gauge XML document.
    pub fn from_xml(body: &str) -> Result<Self, SourceError> {
        let doc: Hochwasserpegel = quick_xml::de::from_str(body)?;
        let level = trimmed(doc.pegel).ok_or(SourceError::MissingField("Pegel"))?;
        Ok(GaugeReading {
            level,
            date: trimmed(doc.datum),
            time: trimmed(doc.uhrzeit),
        })
    }
}

/// Where readings come from. Implemented by [`HttpGauge`] and by test fakes.
pub trait LevelSource {
    fn fetch(&self) -> impl Future<Output = Result<GaugeReading, SourceError>> + Send;
}

/// Gauge endpoint reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGauge {
    client: reqwest::Client,
    url: String,
}

impl HttpGauge {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pegel-tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl LevelSource for HttpGauge {
    async fn fetch(&self) -> Result<GaugeReading, SourceError> {
        debug!(url = %self.url, "querying gauge");
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        GaugeReading::from_xml(&body)
    }
}
