//! Scheduler module for probing endpoints and feeding their monitors.

use crate::db::EndpointConfig;
use crate::monitor::{Endpoint, ProbeResult};
use crate::probe::{jitter, ProbeError, Prober};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};

/// Status recorded when a probe gets no HTTP response at all.
pub const UNREACHABLE_STATUS: u16 = 503;

/// Shared handle to one endpoint's monitor. Readers take the read lock.
pub type EndpointHandle = Arc<RwLock<Endpoint>>;

struct Running {
    config: EndpointConfig,
    endpoint: EndpointHandle,
    stop_tx: broadcast::Sender<()>,
}

/// Runs one probe loop per endpoint.
pub struct Scheduler<P: Prober> {
    prober: Arc<P>,
    running: Arc<RwLock<HashMap<i64, Running>>>,
}

impl<P: Prober> Scheduler<P> {
    pub fn new(prober: P) -> Self {
        Self {
            prober: Arc::new(prober),
            running: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start monitoring all the given endpoints.
    pub async fn start(&self, endpoints: Vec<EndpointConfig>) {
        tracing::info!("Starting scheduler with {} endpoints", endpoints.len());

        for config in endpoints {
            self.add_endpoint(config).await;
        }
    }

    /// Add an endpoint to be monitored and return its handle.
    ///
    /// If an endpoint with the same id is already running, its existing handle
    /// is returned and nothing new is started.
    pub async fn add_endpoint(&self, config: EndpointConfig) -> EndpointHandle {
        let mut running = self.running.write().await;

        if let Some(existing) = running.get(&config.id) {
            return existing.endpoint.clone();
        }

        let endpoint = Arc::new(RwLock::new(Endpoint::new(
            config.url.clone(),
            u64::from(config.check_interval_secs),
        )));
        let (stop_tx, stop_rx) = broadcast::channel(1);
        running.insert(
            config.id,
            Running {
                config: config.clone(),
                endpoint: endpoint.clone(),
                stop_tx,
            },
        );
        drop(running);

        tracing::info!(
            "Scheduler: Adding endpoint {} (every {}s)",
            config.url,
            config.check_interval_secs
        );

        let prober = self.prober.clone();
        let handle = endpoint.clone();
        let running = self.running.clone();
        let id = config.id;

        tokio::spawn(async move {
            run_probe_loop(config, handle.clone(), prober, stop_rx).await;

            // Leave a re-added endpoint with the same id alone
            let mut running = running.write().await;
            if running.get(&id).is_some_and(|r| Arc::ptr_eq(&r.endpoint, &handle)) {
                running.remove(&id);
            }
        });

        endpoint
    }

    /// Stop monitoring an endpoint.
    pub async fn remove_endpoint(&self, id: i64) -> bool {
        let mut running = self.running.write().await;

        match running.remove(&id) {
            Some(entry) => {
                let _ = entry.stop_tx.send(());
                tracing::info!("Scheduler: Removed endpoint {}", entry.config.url);
                true
            }
            None => false,
        }
    }

    /// Handles of every running endpoint, in id order.
    pub async fn endpoints(&self) -> Vec<EndpointHandle> {
        let running = self.running.read().await;
        let mut ids: Vec<_> = running.keys().copied().collect();
        ids.sort_unstable();
        ids.iter().map(|id| running[id].endpoint.clone()).collect()
    }

    /// Stop every probe loop.
    pub async fn shutdown(&self) {
        let mut running = self.running.write().await;
        for (_, entry) in running.drain() {
            let _ = entry.stop_tx.send(());
        }
    }
}

/// Run the probe loop for a single endpoint.
///
/// Each tick probes, records and checks in sequence; a slow probe delays the
/// next tick instead of overlapping with it.
async fn run_probe_loop<P: Prober>(
    config: EndpointConfig,
    endpoint: EndpointHandle,
    prober: Arc<P>,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let interval_duration = Duration::from_secs(u64::from(config.check_interval_secs.max(1)));

    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + interval_duration, interval_duration);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            _ = interval.tick() => {
                let result = tokio::select! {
                    _ = stop_rx.recv() => break,
                    result = probe_once(prober.as_ref(), &config.url) => result,
                };

                let Some(result) = result else {
                    continue;
                };

                let mut endpoint = endpoint.write().await;
                endpoint.record(result);
                if let Some(alert) = endpoint.check_alert_transition() {
                    if alert.is_down {
                        tracing::warn!(
                            "Endpoint {} is down, availability {:.1}%",
                            alert.url,
                            alert.availability
                        );
                    } else {
                        tracing::info!(
                            "Endpoint {} is up again, availability {:.1}%",
                            alert.url,
                            alert.availability
                        );
                    }
                }
            }
        }
    }

    tracing::debug!("Probe loop for {} stopped", config.url);
}

/// Probe once and turn the outcome into something to record.
///
/// Timeouts and network failures count as an unavailable response; a
/// misconfigured probe is skipped.
async fn probe_once<P: Prober>(prober: &P, url: &str) -> Option<ProbeResult> {
    jitter().await;

    let start = Instant::now();
    match prober.probe(url).await {
        Ok(outcome) => Some(outcome.into()),
        Err(e @ (ProbeError::Timeout(_) | ProbeError::Network(_))) => {
            tracing::debug!("Probe failed for {}: {}", url, e);
            Some(ProbeResult::new(
                UNREACHABLE_STATUS,
                start.elapsed().as_secs_f64() * 1000.0,
            ))
        }
        Err(e) => {
            tracing::error!("Probe failed for {}: {}", url, e);
            None
        }
    }
}
