//! Per-endpoint health tracking and up/down alerting.

use super::history::BoundedHistory;
use super::window::{ResponseTimeStats, StatusDistribution, Window, WindowStats};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Availability (percent) below which an endpoint is considered down.
pub const ALERT_THRESHOLD: f64 = 80.0;

/// Window the alert state machine looks at.
pub const ALERT_WINDOW: Window = Window::Short;

/// Outcome of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub status_code: u16,
    pub response_time_ms: f64,
}

impl ProbeResult {
    pub fn new(status_code: u16, response_time_ms: f64) -> Self {
        Self {
            status_code,
            response_time_ms,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status_code < 400
    }
}

/// A recorded up/down transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub is_down: bool,
    pub timestamp: DateTime<Utc>,
    pub availability: f64,
    pub url: String,
}

/// A monitored URL with its probe history and alert log.
#[derive(Debug, Clone)]
pub struct Endpoint {
    url: String,
    check_interval_secs: u64,
    short: BoundedHistory<ProbeResult>,
    medium: BoundedHistory<ProbeResult>,
    long: BoundedHistory<ProbeResult>,
    is_down: bool,
    alerts: Vec<Alert>,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, check_interval_secs: u64) -> Self {
        let window = |w: Window| BoundedHistory::for_window(w.seconds(), check_interval_secs);
        Self {
            url: url.into(),
            check_interval_secs,
            short: window(Window::Short),
            medium: window(Window::Medium),
            long: window(Window::Long),
            is_down: false,
            alerts: Vec::new(),
        }
    }

    /// Create an endpoint that has already recorded `history`, oldest first.
    #[cfg(test)]
    pub fn with_history<I>(url: impl Into<String>, check_interval_secs: u64, history: I) -> Self
    where
        I: IntoIterator<Item = ProbeResult>,
    {
        let mut endpoint = Self::new(url, check_interval_secs);
        for result in history {
            endpoint.record(result);
        }
        endpoint
    }

    /// Append a probe result to every window.
    pub fn record(&mut self, result: ProbeResult) {
        self.short.push(result);
        self.medium.push(result);
        self.long.push(result);
    }

    /// Re-evaluate up/down state from the short window.
    ///
    /// Returns the alert appended by this call, if the threshold was crossed.
    pub fn check_alert_transition(&mut self) -> Option<&Alert> {
        let availability = self.availability(ALERT_WINDOW);

        let crossed = if self.is_down {
            availability >= ALERT_THRESHOLD
        } else {
            availability < ALERT_THRESHOLD
        };
        if !crossed {
            return None;
        }

        self.is_down = !self.is_down;
        self.alerts.push(Alert {
            is_down: self.is_down,
            timestamp: Utc::now(),
            availability,
            url: self.url.clone(),
        });
        self.alerts.last()
    }

    /// Percentage of results with a status below 400. An empty window is 100.
    pub fn availability(&self, window: Window) -> f64 {
        let history = self.history(window);
        if history.is_empty() {
            return 100.0;
        }
        let available = history.iter().filter(|r| r.is_available()).count();
        available as f64 / history.len() as f64 * 100.0
    }

    /// Share of each status-code class. NaN everywhere for an empty window.
    pub fn distribution(&self, window: Window) -> StatusDistribution {
        let history = self.history(window);
        let mut counts = [0usize; 5];
        for result in history.iter() {
            if let 1..=5 = result.status_code / 100 {
                counts[(result.status_code / 100 - 1) as usize] += 1;
            }
        }

        let n = history.len() as f64;
        let pct = |count: usize| count as f64 / n * 100.0;
        StatusDistribution {
            informational: pct(counts[0]),
            success: pct(counts[1]),
            redirection: pct(counts[2]),
            client_error: pct(counts[3]),
            server_error: pct(counts[4]),
        }
    }

    pub fn response_times(&self, window: Window) -> Option<ResponseTimeStats> {
        let history = self.history(window);
        if history.is_empty() {
            return None;
        }

        let (mut max, mut min, mut sum) = (f64::MIN, f64::MAX, 0.0);
        for result in history.iter() {
            max = max.max(result.response_time_ms);
            min = min.min(result.response_time_ms);
            sum += result.response_time_ms;
        }

        Some(ResponseTimeStats {
            max,
            min,
            average: sum / history.len() as f64,
        })
    }

    pub fn stats(&self, window: Window) -> WindowStats {
        WindowStats {
            url: self.url.clone(),
            check_interval_secs: self.check_interval_secs,
            window,
            availability: self.availability(window),
            response_times: self.response_times(window),
            distribution: self.distribution(window),
        }
    }

    pub fn history(&self, window: Window) -> &BoundedHistory<ProbeResult> {
        match window {
            Window::Short => &self.short,
            Window::Medium => &self.medium,
            Window::Long => &self.long,
        }
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }
}

#[cfg(test)]
impl Endpoint {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_down(&self) -> bool {
        self.is_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(codes: &[u16]) -> Vec<ProbeResult> {
        codes.iter().map(|&c| ProbeResult::new(c, 100.0)).collect()
    }

    /// Repeat `pattern` `times` times.
    fn repeated(pattern: &[(u16, f64)], times: usize) -> Vec<ProbeResult> {
        (0..times)
            .flat_map(|_| pattern.iter().map(|&(code, ms)| ProbeResult::new(code, ms)))
            .collect()
    }

    #[test]
    fn test_window_capacities() {
        let endpoint = Endpoint::new("http://example.com", 7);
        assert_eq!(endpoint.history(Window::Short).capacity(), 17);
        assert_eq!(endpoint.history(Window::Medium).capacity(), 85);
        assert_eq!(endpoint.history(Window::Long).capacity(), 514);
    }

    #[test]
    fn test_record_feeds_all_windows() {
        let mut endpoint = Endpoint::new("http://example.com", 60);
        for i in 0..5 {
            endpoint.record(ProbeResult::new(200, i as f64));
        }
        // 2 minutes at 60s holds the last two results
        assert_eq!(endpoint.history(Window::Short).len(), 2);
        assert_eq!(endpoint.history(Window::Medium).len(), 5);
        assert_eq!(endpoint.history(Window::Long).len(), 5);
        assert_eq!(
            endpoint.history(Window::Short).to_vec(),
            endpoint.history(Window::Long).to_vec()[3..].to_vec()
        );
    }

    #[test]
    fn test_seeded_windows_share_one_stream() {
        let endpoint = Endpoint::with_history("u", 1, statuses(&[500]));
        assert_eq!(endpoint.history(Window::Short).to_vec(), endpoint.history(Window::Medium).to_vec());
        assert_eq!(endpoint.history(Window::Short).to_vec(), endpoint.history(Window::Long).to_vec());
        assert_eq!(endpoint.availability(Window::Medium), 0.0);

        // 30s interval: short keeps 4, medium 20, long 120
        let endpoint = Endpoint::with_history("u", 30, repeated(&[(200, 1.0), (404, 2.0), (500, 3.0)], 10));
        let short = endpoint.history(Window::Short).to_vec();
        let medium = endpoint.history(Window::Medium).to_vec();
        let long = endpoint.history(Window::Long).to_vec();
        assert_eq!(short.len(), 4);
        assert_eq!(medium.len(), 20);
        assert_eq!(long.len(), 30);
        assert!(medium.ends_with(&short));
        assert!(long.ends_with(&medium));
    }

    #[test]
    fn test_empty_window_is_fully_available() {
        let endpoint = Endpoint::new("http://example.com", 5);
        assert_eq!(endpoint.availability(Window::Short), 100.0);
        assert_eq!(endpoint.availability(Window::Long), 100.0);
    }

    #[test]
    fn test_degenerate_window_is_fully_available() {
        let mut endpoint = Endpoint::new("http://example.com", 300);
        endpoint.record(ProbeResult::new(500, 10.0));
        assert_eq!(endpoint.history(Window::Short).capacity(), 0);
        assert_eq!(endpoint.availability(Window::Short), 100.0);
        assert_eq!(endpoint.availability(Window::Medium), 0.0);
        assert!(endpoint.check_alert_transition().is_none());
        assert!(!endpoint.is_down());
    }

    #[test]
    fn test_availability_formula() {
        let endpoint = Endpoint::with_history("u", 1, statuses(&[200, 200, 500]));
        let availability = endpoint.availability(Window::Short);
        assert!((availability - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_availability_counts_redirects_as_up() {
        let endpoint = Endpoint::with_history("u", 1, statuses(&[301, 399, 400, 404]));
        assert_eq!(endpoint.availability(Window::Short), 50.0);
    }

    #[test]
    fn test_distribution() {
        let endpoint = Endpoint::with_history("u", 1, statuses(&[101, 200, 204, 302, 404, 500, 503, 200]));
        let dist = endpoint.distribution(Window::Short);
        assert_eq!(dist.informational, 12.5);
        assert_eq!(dist.success, 37.5);
        assert_eq!(dist.redirection, 12.5);
        assert_eq!(dist.client_error, 12.5);
        assert_eq!(dist.server_error, 25.0);
    }

    #[test]
    fn test_distribution_ignores_out_of_range_codes() {
        let endpoint = Endpoint::with_history("u", 1, statuses(&[200, 0, 600, 999]));
        let dist = endpoint.distribution(Window::Short);
        assert_eq!(dist.success, 25.0);
        assert_eq!(dist.as_array().iter().sum::<f64>(), 25.0);
    }

    #[test]
    fn test_empty_window_statistics_are_undefined() {
        let endpoint = Endpoint::new("u", 1);
        assert!(endpoint.distribution(Window::Medium).as_array().iter().all(|p| p.is_nan()));
        assert!(endpoint.response_times(Window::Medium).is_none());
    }

    #[test]
    fn test_response_times() {
        let endpoint = Endpoint::with_history("u", 1, repeated(&[(200, 150.0), (200, 232.0), (500, 429.0)], 1));
        let stats = endpoint.response_times(Window::Short).unwrap();
        assert_eq!(stats.max, 429.0);
        assert_eq!(stats.min, 150.0);
        assert!((stats.average - 811.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_goes_down_below_threshold() {
        let mut endpoint = Endpoint::with_history("http://flaky", 1, statuses(&[200, 200, 500]));
        let alert = endpoint.check_alert_transition().cloned().unwrap();

        assert!(endpoint.is_down());
        assert_eq!(endpoint.alerts().len(), 1);
        assert!(alert.is_down);
        assert_eq!(alert.url, "http://flaky");
        assert_eq!(alert.availability, endpoint.availability(Window::Short));
    }

    #[test]
    fn test_exactly_threshold_is_up() {
        let mut endpoint = Endpoint::with_history("u", 1, statuses(&[200, 200, 200, 200, 500]));
        assert_eq!(endpoint.availability(Window::Short), 80.0);
        assert!(endpoint.check_alert_transition().is_none());
        assert!(!endpoint.is_down());
        assert!(endpoint.alerts().is_empty());
    }

    #[test]
    fn test_comes_back_up_at_threshold() {
        let mut endpoint = Endpoint::new("u", 24);
        for _ in 0..5 {
            endpoint.record(ProbeResult::new(500, 1.0));
        }
        endpoint.check_alert_transition();
        assert!(endpoint.is_down());

        for code in [200, 200, 200, 200] {
            endpoint.record(ProbeResult::new(code, 1.0));
            endpoint.check_alert_transition();
        }
        // Capacity 5: [500, 200, 200, 200, 200] is exactly 80%
        assert!(!endpoint.is_down());
        assert_eq!(endpoint.alerts().len(), 2);
        assert!(!endpoint.alerts()[1].is_down);
        assert_eq!(endpoint.alerts()[1].availability, 80.0);
    }

    #[test]
    fn test_repeated_check_does_not_flap() {
        let mut endpoint = Endpoint::with_history("u", 1, statuses(&[500, 500]));
        assert!(endpoint.check_alert_transition().is_some());
        assert!(endpoint.check_alert_transition().is_none());
        assert!(endpoint.check_alert_transition().is_none());
        assert_eq!(endpoint.alerts().len(), 1);
        assert!(endpoint.is_down());
    }

    #[test]
    fn test_one_alert_per_call() {
        let mut endpoint = Endpoint::new("u", 30);
        for _ in 0..4 {
            endpoint.record(ProbeResult::new(503, 1.0));
        }
        endpoint.check_alert_transition();
        for _ in 0..4 {
            endpoint.record(ProbeResult::new(200, 1.0));
        }
        endpoint.check_alert_transition();

        assert_eq!(endpoint.alerts().len(), 2);
        assert!(endpoint.alerts()[0].timestamp <= endpoint.alerts()[1].timestamp);
    }

    #[test]
    fn test_down_then_up_scenario() {
        let check_interval = 7;
        let capacity = (120 / check_interval) as usize;

        // Around a third of the probes fail
        let n = 120usize.div_ceil(3 * check_interval as usize);
        let first = repeated(&[(200, 150.0), (200, 232.0), (500, 429.0)], n);
        let mut endpoint = Endpoint::with_history("", check_interval, first);
        assert_eq!(endpoint.history(Window::Short).len(), capacity);
        assert!(endpoint.availability(Window::Short) < ALERT_THRESHOLD);

        endpoint.check_alert_transition();
        assert!(endpoint.is_down());
        assert_eq!(endpoint.alerts().len(), 1);
        assert!(endpoint.alerts()[0].is_down);

        // Around a tenth of the probes fail
        let m = 120usize.div_ceil(10 * check_interval as usize);
        let mut pattern = vec![(200, 150.0), (200, 232.0)];
        pattern.extend(std::iter::repeat((200, 232.0)).take(7));
        pattern.push((500, 429.0));
        for result in repeated(&pattern, m) {
            endpoint.record(result);
        }
        assert!(endpoint.availability(Window::Short) >= ALERT_THRESHOLD);

        endpoint.check_alert_transition();
        assert!(!endpoint.is_down());
        assert_eq!(endpoint.alerts().len(), 2);
        assert!(!endpoint.alerts()[1].is_down);
    }
}
