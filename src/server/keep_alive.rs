//! Periodic self-ping that keeps a sleeping host awake
//!
//! Some hosting platforms suspend services that receive no traffic. The task
//! requests `<url>/health` on a fixed period and only ever logs the outcome.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Health URL for a deployment base URL
pub fn health_url(base: &str) -> String {
    format!("{}/health", base.trim_end_matches('/'))
}

/// Spawn the keep-alive loop. The first ping goes out after one period.
pub fn spawn(base_url: &str, period: Duration) -> JoinHandle<()> {
    let url = health_url(base_url);
    tracing::info!(url = %url, period_secs = period.as_secs(), "keep-alive enabled");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build();
    tokio::spawn(run(client, url, period))
}

async fn run(client: reqwest::Result<reqwest::Client>, url: String, period: Duration) {
    let client = match client {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "keep-alive disabled, HTTP client unavailable");
            return;
        }
    };

    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(url = %url, status = %response.status(), "keep-alive ping ok");
            }
            Ok(response) => {
                tracing::warn!(url = %url, status = %response.status(), "keep-alive ping rejected");
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "keep-alive ping failed");
            }
        }
    }
}
