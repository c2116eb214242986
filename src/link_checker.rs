use crate::config::AnalyzerSettings;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered, with this status code
    Reachable(u16),
    /// Transport-level failure: DNS, refused connection, timeout, ...
    Unreachable(String),
}

/// One liveness check against a single URL.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// Plain GET probe; the response body is dropped unread.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LinkProbe for HttpProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.client.get(url).send().await {
            Ok(response) => ProbeOutcome::Reachable(response.status().as_u16()),
            Err(e) => ProbeOutcome::Unreachable(e.to_string()),
        }
    }
}

pub struct LinkChecker {
    probe: Arc<dyn LinkProbe>,
    timeout: Duration,
    max_concurrent: Option<usize>,
    count_http_errors: bool,
}

impl LinkChecker {
    pub fn new(probe: Arc<dyn LinkProbe>) -> Self {
        Self {
            probe,
            timeout: DEFAULT_PROBE_TIMEOUT,
            max_concurrent: None,
            count_http_errors: false,
        }
    }

    pub fn from_settings(client: Client, settings: &AnalyzerSettings) -> Self {
        Self::new(Arc::new(HttpProbe::new(client)))
            .with_timeout(settings.link_timeout)
            .with_max_concurrent(settings.max_concurrent_probes)
            .with_count_http_errors(settings.count_http_errors)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `None` or `Some(0)` lets every probe run at once.
    pub fn with_max_concurrent(mut self, max_concurrent: Option<usize>) -> Self {
        self.max_concurrent = max_concurrent.filter(|n| *n > 0);
        self
    }

    /// Also count HTTP statuses >= 400 as inaccessible.
    pub fn with_count_http_errors(mut self, count_http_errors: bool) -> Self {
        self.count_http_errors = count_http_errors;
        self
    }

    /// Probe every link in its own task and return how many failed. Returns
    /// only once all probes have finished.
    pub async fn count_inaccessible(&self, links: &[String]) -> usize {
        if links.is_empty() {
            return 0;
        }

        let failures = Arc::new(AtomicUsize::new(0));
        let permits = self.max_concurrent.map(|n| Arc::new(Semaphore::new(n)));
        let mut tasks = JoinSet::new();

        for url in links {
            let url = url.clone();
            let probe = Arc::clone(&self.probe);
            let failures = Arc::clone(&failures);
            let permits = permits.clone();
            let timeout = self.timeout;
            let count_http_errors = self.count_http_errors;

            tasks.spawn(async move {
                // Permit is held until the probe completes
                let _permit = match &permits {
                    Some(semaphore) => semaphore.clone().acquire_owned().await.ok(),
                    None => None,
                };

                let outcome = match tokio::time::timeout(timeout, probe.probe(&url)).await {
                    Ok(outcome) => outcome,
                    Err(_) => ProbeOutcome::Unreachable(format!(
                        "timed out after {}s",
                        timeout.as_secs_f64()
                    )),
                };

                match outcome {
                    ProbeOutcome::Unreachable(reason) => {
                        tracing::debug!(url = %url, reason = %reason, "Link is inaccessible");
                        failures.fetch_add(1, Ordering::SeqCst);
                    }
                    ProbeOutcome::Reachable(status) if count_http_errors && status >= 400 => {
                        tracing::debug!(url = %url, status, "Link returned an error status");
                        failures.fetch_add(1, Ordering::SeqCst);
                    }
                    ProbeOutcome::Reachable(status) => {
                        tracing::trace!(url = %url, status, "Link is reachable");
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "Link probe task failed");
                failures.fetch_add(1, Ordering::SeqCst);
            }
        }

        failures.load(Ordering::SeqCst)
    }
}
