//! HTTP client for the Mantova Ambiente API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{Collection, ZoneMeta};
use crate::ports::{FetchError, ScheduleSource};

const RECYCLINGS_URL: &str = "https://www.mantovaambiente.it/api/recyclings";
const ZONES_URL: &str = "https://www.mantovaambiente.it/api/zones";
const API_TIMEOUT: Duration = Duration::from_secs(10);
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Response envelope used by both endpoints.
///
/// Usually `{"data": [...]}`, but a bare array is accepted as well since the
/// envelope shape is not fully trusted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope {
    Wrapped { data: Vec<Value> },
    Bare(Vec<Value>),
}

impl Envelope {
    fn into_items(self) -> Vec<Value> {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(items) => items,
        }
    }
}

/// One schedule item as sent by the recyclings endpoint.
#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    id: RawId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    collections: Vec<String>,
}

/// Item ids arrive as strings or numbers depending on the endpoint version.
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
    #[default]
    Missing,
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
            RawId::Missing => String::new(),
        }
    }
}

/// Client for the Mantova Ambiente schedule and zone endpoints.
pub struct AmbienteClient {
    http: Client,
}

impl AmbienteClient {
    /// Create a client bound to the given HTTP client.
    #[must_use]
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    async fn fetch_envelope(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<Value>, FetchError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .timeout(API_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        let envelope: Envelope = serde_json::from_str(&body)?;
        Ok(envelope.into_items())
    }
}

#[async_trait]
impl ScheduleSource for AmbienteClient {
    async fn fetch_collections(&self, zone: &str) -> Result<Vec<Collection>, FetchError> {
        let items = self
            .fetch_envelope(RECYCLINGS_URL, &[("zone", zone), ("from", "today")])
            .await?;
        debug!(zone, items = items.len(), "API response received");
        Ok(parse_items(items))
    }

    async fn fetch_zones(&self) -> Result<Vec<ZoneMeta>, FetchError> {
        let items = self.fetch_envelope(ZONES_URL, &[]).await?;
        let zones = items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ZoneMeta>, _>>()?;
        debug!(count = zones.len(), "retrieved zones from API");
        Ok(zones)
    }
}

/// Normalize raw schedule items into [`Collection`] values.
///
/// Recovery is per item: a malformed item or date only shrinks the result.
/// An item with no parseable dates, or an empty `collections` array, is
/// dropped entirely.
fn parse_items(items: Vec<Value>) -> Vec<Collection> {
    let mut collections = Vec::new();

    for item in items {
        let raw: RawItem = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%err, "could not parse collection item");
                continue;
            }
        };

        if raw.collections.is_empty() {
            continue;
        }

        let mut instants = Vec::new();
        for date_text in &raw.collections {
            match NaiveDateTime::parse_from_str(date_text, DATE_FORMAT) {
                Ok(instant) => instants.push(instant),
                Err(err) => warn!(date = %date_text, %err, "could not parse collection date"),
            }
        }

        if instants.is_empty() {
            continue;
        }

        collections.push(Collection::new(raw.id.into_string(), raw.title, instants));
    }

    collections
}
