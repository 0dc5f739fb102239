//! Probe module for endpoint health checks.

mod http;

pub use http::*;

use crate::monitor::ProbeResult;

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Probe error types.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// What a successful probe observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeOutcome {
    pub status_code: u16,
    pub elapsed_ms: f64,
}

impl From<ProbeOutcome> for ProbeResult {
    fn from(outcome: ProbeOutcome) -> Self {
        ProbeResult::new(outcome.status_code, outcome.elapsed_ms)
    }
}

/// Something that can check a URL once.
///
/// Implementations must finish or fail within a bounded time.
pub trait Prober: Send + Sync + 'static {
    fn probe(&self, url: &str) -> impl Future<Output = Result<ProbeOutcome, ProbeError>> + Send;
}

/// Sleep a random 0-99ms so endpoints sharing an interval don't fire together.
pub async fn jitter() {
    let jitter = rand::random::<u64>() % 100;
    tokio::time::sleep(Duration::from_millis(jitter)).await;
}
