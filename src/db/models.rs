//! Database model types.

use serde::{Deserialize, Serialize};

/// A monitored endpoint as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub id: i64,
    pub url: String,
    /// Seconds between two probes
    pub check_interval_secs: u32,
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>, check_interval_secs: u32) -> Self {
        Self {
            id: 0,
            url: url.into(),
            check_interval_secs,
        }
    }
}
