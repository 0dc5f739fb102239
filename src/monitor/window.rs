//! Retention windows and the statistics derived from them.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Requested a window other than 2, 10 or 60 minutes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid window {0:?}: expected 2, 10 or 60 minutes (short, medium, long)")]
pub struct InvalidWindowError(pub String);

/// One of the three retention windows kept per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    /// 2 minutes
    Short,
    /// 10 minutes
    Medium,
    /// 60 minutes
    Long,
}

impl Window {
    pub fn minutes(self) -> u64 {
        match self {
            Window::Short => 2,
            Window::Medium => 10,
            Window::Long => 60,
        }
    }

    pub fn seconds(self) -> u64 {
        self.minutes() * 60
    }

    pub fn from_minutes(minutes: u64) -> Result<Self, InvalidWindowError> {
        match minutes {
            2 => Ok(Window::Short),
            10 => Ok(Window::Medium),
            60 => Ok(Window::Long),
            other => Err(InvalidWindowError(other.to_string())),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.minutes())
    }
}

impl FromStr for Window {
    type Err = InvalidWindowError;

    /// Accepts `short`/`medium`/`long`, or a minute count with an optional `m` suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "short" => return Ok(Window::Short),
            "medium" => return Ok(Window::Medium),
            "long" => return Ok(Window::Long),
            _ => {}
        }

        s.trim_end_matches('m')
            .parse::<u64>()
            .map_err(|_| InvalidWindowError(s.to_string()))
            .and_then(|minutes| Window::from_minutes(minutes).map_err(|_| InvalidWindowError(s.to_string())))
    }
}

/// Share of results per status-code hundred-range, in percent.
///
/// Every field is NaN when the window is empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusDistribution {
    #[serde(serialize_with = "nan_as_null")]
    pub informational: f64,
    #[serde(serialize_with = "nan_as_null")]
    pub success: f64,
    #[serde(serialize_with = "nan_as_null")]
    pub redirection: f64,
    #[serde(serialize_with = "nan_as_null")]
    pub client_error: f64,
    #[serde(serialize_with = "nan_as_null")]
    pub server_error: f64,
}

impl StatusDistribution {
    /// Percentages in 1xx..5xx order.
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.informational,
            self.success,
            self.redirection,
            self.client_error,
            self.server_error,
        ]
    }
}

/// Response time summary in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResponseTimeStats {
    pub max: f64,
    pub min: f64,
    pub average: f64,
}

/// Everything the reporters show about one endpoint for one window.
#[derive(Debug, Clone, Serialize)]
pub struct WindowStats {
    pub url: String,
    pub check_interval_secs: u64,
    pub window: Window,
    pub availability: f64,
    pub response_times: Option<ResponseTimeStats>,
    pub distribution: StatusDistribution,
}

fn nan_as_null<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}
