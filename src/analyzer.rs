use crate::config::AnalyzerSettings;
use crate::http_client::build_http_client;
use crate::link_checker::LinkChecker;
use crate::login_form::LoginFormDetector;
use crate::models::{AnalysisResult, PageSummary};
use crate::page_analyzer;
use futures::TryStreamExt;
use reqwest::Client;
use std::io::{self, Read};
use tokio_util::io::{StreamReader, SyncIoBridge};
use url::Url;

/// Upper bound on the body kept around for the login form pass
const MAX_CAPTURED_BODY: usize = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported url scheme '{0}': only http and https are supported")]
    UnsupportedScheme(String),

    #[error("could not reach target page: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("page analysis worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Fetches one page, runs the streaming pass and the login form pass over
/// it, then probes every discovered link.
pub struct Analyzer {
    client: Client,
    settings: AnalyzerSettings,
    link_checker: LinkChecker,
}

impl Analyzer {
    pub fn new(settings: AnalyzerSettings) -> anyhow::Result<Self> {
        let client = build_http_client(settings.page_timeout)?;
        let link_checker = LinkChecker::from_settings(client.clone(), &settings);

        Ok(Self {
            client,
            settings,
            link_checker,
        })
    }

    pub async fn analyze(&self, target: &str) -> Result<AnalysisResult, AnalyzeError> {
        let url = parse_target(target)?;
        tracing::info!(url = %url, "Analyzing page");

        let (summary, has_login_form) = self.scan_page(&url).await?;
        tracing::debug!(
            url = %url,
            links = summary.links.len(),
            html_version = %summary.html_version,
            "Page scanned"
        );

        let valid_urls = summary.link_urls();
        let inaccessible = self.link_checker.count_inaccessible(&valid_urls).await;
        tracing::info!(
            url = %url,
            links = valid_urls.len(),
            inaccessible,
            "Link check complete"
        );

        Ok(assemble(summary, inaccessible, has_login_form))
    }

    /// Stream the page body through the tokenizer on a blocking worker. The
    /// body is only buffered when login form detection is enabled.
    pub async fn scan_page(&self, url: &Url) -> Result<(PageSummary, bool), AnalyzeError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(AnalyzeError::Unreachable)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "Target page returned an error status, analyzing body anyway");
        }

        let body = Box::pin(response.bytes_stream().map_err(io::Error::other));
        let reader = SyncIoBridge::new(StreamReader::new(body));
        let base_url = url.clone();
        let detect_login_form = self.settings.detect_login_form;

        let scanned = tokio::task::spawn_blocking(move || {
            if detect_login_form {
                let mut capture = CapturingReader::new(reader, MAX_CAPTURED_BODY);
                let summary = page_analyzer::analyze_reader(&mut capture, &base_url);
                let html = String::from_utf8_lossy(&capture.captured);
                (summary, LoginFormDetector::has_login_form(&html))
            } else {
                (page_analyzer::analyze_reader(reader, &base_url), false)
            }
        })
        .await?;

        Ok(scanned)
    }
}

pub fn parse_target(target: &str) -> Result<Url, AnalyzeError> {
    let url = Url::parse(target.trim()).map_err(|source| AnalyzeError::InvalidUrl {
        url: target.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(AnalyzeError::UnsupportedScheme(scheme.to_string())),
    }
}

pub fn assemble(summary: PageSummary, inaccessible: usize, has_login_form: bool) -> AnalysisResult {
    AnalysisResult {
        internal_urls: summary.internal_count(),
        external_urls: summary.external_count(),
        valid_urls: summary.link_urls(),
        title: summary.title,
        html_version: summary.html_version,
        headings: summary.headings,
        inaccessible_urls: inaccessible,
        has_login_form,
    }
}

/// Copies everything read through it, up to `limit` bytes.
struct CapturingReader<R> {
    inner: R,
    captured: Vec<u8>,
    limit: usize,
}

impl<R: Read> CapturingReader<R> {
    fn new(inner: R, limit: usize) -> Self {
        Self {
            inner,
            captured: Vec::new(),
            limit,
        }
    }
}

impl<R: Read> Read for CapturingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        let room = self.limit.saturating_sub(self.captured.len());
        self.captured.extend_from_slice(&buf[..n.min(room)]);
        Ok(n)
    }
}
