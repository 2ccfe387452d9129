//! Cluster health snapshot as returned by `/_cluster/health`.

use serde::{Deserialize, Deserializer};

/// The closed set of status colors a cluster can report, in emission order.
///
/// `green` is healthy, `yellow` degraded (replicas unassigned), `red`
/// critical (primaries unassigned).
pub const STATUS_COLORS: [&str; 3] = ["green", "yellow", "red"];

/// One decoded health response.
///
/// Missing and `null` fields fall back to zero values and unknown fields
/// are ignored, so older and newer cluster versions decode alike.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClusterHealth {
    #[serde(deserialize_with = "null_as_default")]
    pub cluster_name: String,
    /// Raw status string. Not validated against [`STATUS_COLORS`].
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timed_out: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub number_of_nodes: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub number_of_data_nodes: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub active_primary_shards: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub active_shards: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub relocating_shards: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub initializing_shards: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub unassigned_shards: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub delayed_unassigned_shards: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub number_of_pending_tasks: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub number_of_in_flight_fetch: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub task_max_waiting_in_queue_millis: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub active_shards_percent_as_number: f64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl ClusterHealth {
    /// Decode a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Whether the reported status equals `color` exactly.
    pub fn is_status(&self, color: &str) -> bool {
        self.status == color
    }
}
