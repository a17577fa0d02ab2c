//! Server-side POD record for a trip/client pair.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Document;

/// Identifies the trip/client pair a POD workflow belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PodKey {
    pub trip_id: String,
    pub client_id: String,
}

impl PodKey {
    pub fn new(trip_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            trip_id: trip_id.into(),
            client_id: client_id.into(),
        }
    }
}

impl fmt::Display for PodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trip {} / client {}", self.trip_id, self.client_id)
    }
}

/// Durable state of one trip/client POD workflow as the authority reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientPodRecord {
    pub trip_id: String,

    pub client_id: String,

    /// Persisted step key; may be absent or unknown to this client
    #[serde(default)]
    pub status: Option<String>,

    /// Version token checked on every transition
    #[serde(default)]
    pub version: u64,

    /// Evidence documents in upload order
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl ClientPodRecord {
    pub fn key(&self) -> PodKey {
        PodKey::new(&self.trip_id, &self.client_id)
    }
}
