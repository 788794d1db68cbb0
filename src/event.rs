//! Event and wire-response definitions for the Rita client.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::value::RawValue;

/// A single event delivered on a Rita channel.
///
/// Immutable once decoded. The `data` payload is carried as raw JSON,
/// preserved byte for byte; decode it with [`Event::data_as`] once the
/// concrete shape is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Server-assigned event id. Doubles as a resumption cursor for the
    /// `*_since` calls.
    pub id: String,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Arbitrary JSON payload.
    pub data: Box<RawValue>,
}

impl Event {
    /// Decodes the raw `data` payload into a concrete type.
    pub fn data_as<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(self.data.get())
    }
}

/// Body of the cursor-fetch and event-send responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CursorResponse {
    pub event_id: String,
}

/// Body of the historical-fetch response.
#[derive(Debug, Deserialize)]
pub(crate) struct EventsResponse {
    #[serde(default)]
    pub events: Vec<Event>,
}
