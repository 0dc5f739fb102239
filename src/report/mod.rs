//! Console reporting.
//!
//! Prints per-endpoint statistics tables and the merged alert feed on their
//! own timers, independent of the probe loops.

mod table;

pub use table::*;

use crate::monitor::{Alert, Window};
use crate::probe::Prober;
use crate::scheduler::{EndpointHandle, Scheduler};

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Snapshot every endpoint's alerts and merge them oldest-first.
pub async fn collect_alerts(endpoints: &[EndpointHandle]) -> Vec<Alert> {
    let mut alerts = Vec::new();
    for handle in endpoints {
        alerts.extend_from_slice(handle.read().await.alerts());
    }
    alerts.sort_by_key(|a| a.timestamp);
    alerts
}

/// One line per alert, as shown in the console feed.
pub fn render_alert(alert: &Alert) -> String {
    let time = alert.timestamp.format("%d/%m/%Y, %H:%M:%S");
    if alert.is_down {
        format!(
            "Website {} is down! Availability={}%, Time={} UTC",
            alert.url, alert.availability, time
        )
    } else {
        format!(
            "Website {} is up again! Availability={}%, Time={} UTC",
            alert.url, alert.availability, time
        )
    }
}

/// Periodically prints stats tables and alerts to stdout.
pub struct Reporter {
    short_interval: Duration,
    long_interval: Duration,
}

impl Reporter {
    pub fn new(short_interval: Duration, long_interval: Duration) -> Self {
        Self {
            short_interval,
            long_interval,
        }
    }

    /// Render the short-cadence report: the 10-minute table and every alert so far.
    pub async fn short_report(&self, endpoints: &[EndpointHandle]) -> String {
        let mut out = render_stats_table(endpoints, Window::Medium, Utc::now()).await;
        out.push('\n');
        for alert in collect_alerts(endpoints).await {
            out.push_str(&render_alert(&alert));
            out.push('\n');
        }
        out
    }

    /// Render the long-cadence report: the 60-minute table.
    pub async fn long_report(&self, endpoints: &[EndpointHandle]) -> String {
        render_stats_table(endpoints, Window::Long, Utc::now()).await
    }

    /// Print reports until the task is cancelled.
    ///
    /// Endpoints are re-read from the scheduler on every tick, so endpoints
    /// added or removed while running show up in the next report.
    pub async fn run<P: Prober>(&self, scheduler: Arc<Scheduler<P>>) {
        let mut short = tokio::time::interval_at(
            tokio::time::Instant::now() + self.short_interval,
            self.short_interval,
        );
        let mut long = tokio::time::interval_at(
            tokio::time::Instant::now() + self.long_interval,
            self.long_interval,
        );
        short.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        long.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = short.tick() => {
                    let endpoints = scheduler.endpoints().await;
                    println!("{}\n", self.short_report(&endpoints).await);
                }
                _ = long.tick() => {
                    let endpoints = scheduler.endpoints().await;
                    println!("{}\n", self.long_report(&endpoints).await);
                }
            }
        }
    }
}
