use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{SyncError, SyncErrorPayload};

/// Aggregate counters keyed by status value.
pub type Stats = BTreeMap<String, u64>;

/// Partial field update applied to an item (shallow merge).
pub type ItemPatch = Map<String, Value>;

/// Name of the status-like field counters are derived from.
pub const STATUS_FIELD: &str = "status";

/// A single record managed by the dashboard: an email in the triage inbox,
/// a property, a project.
///
/// Only `id` and `status` are interpreted; everything else rides along in
/// `fields` and is merged verbatim on patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Item {
    pub fn new(id: impl Into<String>, status: Option<&str>) -> Self {
        Self {
            id: id.into(),
            status: status.map(str::to_string),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

/// Successful body of `GET {endpoint}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboxPayload {
    pub items: Vec<Item>,
    #[serde(default)]
    pub stats: Stats,
}

/// Any body the endpoint may answer with.
///
/// `{ "error": "..." }` is checked first so a handled backend failure is never
/// mistaken for an empty payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InboxResponse {
    Failure { error: String },
    Payload(InboxPayload),
}

impl InboxResponse {
    pub fn into_result(self) -> Result<InboxPayload, SyncError> {
        match self {
            InboxResponse::Payload(payload) => Ok(payload),
            InboxResponse::Failure { error } => Err(SyncError::Backend(error)),
        }
    }
}

/// Externally observable fetch state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Refreshing,
    Error,
}

/// Point-in-time view of the synchronizer handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot {
    pub items: Vec<Item>,
    pub stats: Stats,
    pub state: FetchState,
    pub is_loading: bool,
    pub is_refreshing: bool,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<SyncError>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Cached data is being shown because the last refresh failed.
    pub stale: bool,
}

fn serialize_error<S: Serializer>(error: &Option<SyncError>, s: S) -> Result<S::Ok, S::Error> {
    error.as_ref().map(SyncErrorPayload::from).serialize(s)
}
