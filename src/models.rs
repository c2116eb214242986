use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Heading level tag ("h1".."h6") to occurrence count
pub type HeadingCounts = BTreeMap<String, usize>;

/// Label reported when no doctype entry matches
pub const UNKNOWN_HTML_VERSION: &str = "UNKNOWN";

/// Body accepted by the analysis endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub title: String,
    pub html_version: String,
    pub headings: HeadingCounts,
    pub internal_urls: usize,
    pub external_urls: usize,
    pub inaccessible_urls: usize,
    pub valid_urls: Vec<String>,
    pub has_login_form: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkScope {
    Internal,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredLink {
    pub url: String,
    pub scope: LinkScope,
}

/// Everything the streaming pass extracts from a page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageSummary {
    pub title: String,
    pub html_version: String,
    pub headings: HeadingCounts,
    pub links: Vec<DiscoveredLink>,
}

impl PageSummary {
    pub fn internal_count(&self) -> usize {
        self.links
            .iter()
            .filter(|link| link.scope == LinkScope::Internal)
            .count()
    }

    pub fn external_count(&self) -> usize {
        self.links
            .iter()
            .filter(|link| link.scope == LinkScope::External)
            .count()
    }

    pub fn link_urls(&self) -> Vec<String> {
        self.links.iter().map(|link| link.url.clone()).collect()
    }
}

/// A `<form>` as seen by the login form detector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlForm {
    /// URL where the form is submitted
    pub action: Option<String>,
    /// HTTP method used on submit
    pub method: Option<String>,
    /// Named input and textarea values, in document order
    pub values: Vec<(String, String)>,
    pub has_password_field: bool,
}

/// Result wrapper used by the CLI report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub target_url: String,
    pub result: AnalysisResult,
    pub timestamp: String,
}
