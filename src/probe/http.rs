//! HTTP probe implementation.

use super::{ProbeError, ProbeOutcome, Prober};

use std::time::{Duration, Instant};

/// Probes endpoints with a `HEAD` request.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Config(e.to_string()))?;
        Ok(Self { client, timeout })
    }
}

impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> Result<ProbeOutcome, ProbeError> {
        let url = parse_url(url)?;

        let start = Instant::now();
        // Any HTTP response is a completed probe, whatever its status
        let response = self.client.head(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout(self.timeout)
            } else if e.is_builder() {
                ProbeError::Config(e.to_string())
            } else {
                ProbeError::Network(e.to_string())
            }
        })?;

        Ok(ProbeOutcome {
            status_code: response.status().as_u16(),
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

/// Check that `url` answers with a status below 400.
pub async fn verify_url(url: &str, timeout: Duration) -> bool {
    let prober = match HttpProber::new(timeout) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Could not build HTTP client: {}", e);
            return false;
        }
    };

    match prober.probe(url).await {
        Ok(outcome) => outcome.status_code < 400,
        Err(e) => {
            tracing::debug!("Verification of {} failed: {}", url, e);
            false
        }
    }
}

/// Prefix `http://` when no scheme is given.
pub fn normalize_url(address: &str) -> String {
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

/// Normalize `address` and check that it is a URL a probe can be sent to.
pub fn parse_url(address: &str) -> Result<reqwest::Url, ProbeError> {
    let url = reqwest::Url::parse(&normalize_url(address.trim()))
        .map_err(|e| ProbeError::Config(format!("invalid URL {:?}: {}", address, e)))?;
    if url.host_str().is_none() {
        return Err(ProbeError::Config(format!("URL {:?} has no host", address)));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com"), "http://example.com");
        assert_eq!(normalize_url("https://example.com/x"), "https://example.com/x");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
    }

    #[test]
    fn test_parse_url() {
        assert_eq!(parse_url("example.com").unwrap().as_str(), "http://example.com/");
        assert_eq!(parse_url(" https://example.com/x ").unwrap().as_str(), "https://example.com/x");
        assert!(matches!(parse_url("http://exa mple .com/"), Err(ProbeError::Config(_))));
        assert!(matches!(parse_url("http://"), Err(ProbeError::Config(_))));
    }

    #[tokio::test]
    async fn test_unparseable_url_is_config_error() {
        let prober = HttpProber::new(Duration::from_millis(100)).unwrap();
        let result = prober.probe("http://exa mple .com/").await;
        assert!(matches!(result, Err(ProbeError::Config(_))));
    }

    #[tokio::test]
    async fn test_http_probe_invalid_url() {
        let prober = HttpProber::new(Duration::from_millis(100)).unwrap();
        let result = prober.probe("http://256.256.256.256").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_verify_unreachable_url() {
        assert!(!verify_url("http://256.256.256.256", Duration::from_millis(100)).await);
    }

    #[tokio::test]
    async fn test_probe_reports_status_of_local_server() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await;
        });

        let prober = HttpProber::new(Duration::from_secs(2)).unwrap();
        let outcome = prober.probe(&format!("http://{}", addr)).await.unwrap();
        assert_eq!(outcome.status_code, 503);
        assert!(outcome.elapsed_ms >= 0.0);
    }
}
