//! Reachability check for the application under test
//!
//! The suite never starts the application; it only confirms the configured
//! base URL answers before launching any browser.

use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Preflight settings
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub base_url: String,

    /// Give up after this long
    pub timeout: Duration,

    /// Pause between attempts
    pub retry_interval: Duration,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pixel.bet".to_string(),
            timeout: Duration::from_secs(30),
            retry_interval: Duration::from_millis(500),
        }
    }
}

/// Wait until the target answers with anything other than a server error
pub async fn wait_for_reachable(config: &TargetConfig) -> E2eResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;

    while start.elapsed() < config.timeout {
        attempts += 1;

        match client.get(&config.base_url).send().await {
            Ok(resp) if !resp.status().is_server_error() => {
                info!("Target {} answered {}", config.base_url, resp.status());
                return Ok(());
            }
            Ok(resp) => {
                warn!("Target returned {}", resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {} ...", config.base_url);
                }
                if !e.is_connect() && !e.is_timeout() {
                    warn!("Preflight error: {}", e);
                }
            }
        }

        sleep(config.retry_interval).await;
    }

    Err(E2eError::TargetUnreachable {
        url: config.base_url.clone(),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[tokio::test]
    async fn test_unreachable_target_reports_attempts() {
        // Bind then drop to get a port nothing listens on
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let config = TargetConfig {
            base_url: format!("http://127.0.0.1:{}", port),
            timeout: Duration::from_millis(300),
            retry_interval: Duration::from_millis(50),
        };

        match wait_for_reachable(&config).await {
            Err(E2eError::TargetUnreachable { attempts, .. }) => assert!(attempts >= 1),
            other => panic!("expected unreachable target, got {other:?}"),
        }
    }
}
