//! Maps a DOCTYPE declaration to a human readable HTML version label.
//!
//! Entries are checked top to bottom and the first match wins, so the
//! specific public identifiers are listed before the bare `html` entries
//! (every legacy declaration also starts with `html`).

use crate::models::UNKNOWN_HTML_VERSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoctypeMatcher {
    /// Declaration text contains the given substring
    Contains(&'static str),
    /// Declaration text is exactly the given string
    Exact(&'static str),
}

impl DoctypeMatcher {
    pub fn matches(&self, declaration: &str) -> bool {
        match self {
            DoctypeMatcher::Contains(needle) => declaration.contains(needle),
            DoctypeMatcher::Exact(expected) => declaration == *expected,
        }
    }
}

pub static DOCTYPE_TABLE: &[(&str, DoctypeMatcher)] = &[
    (
        "HTML 4.01 Strict",
        DoctypeMatcher::Contains(r#""-//W3C//DTD HTML 4.01//EN""#),
    ),
    (
        "HTML 4.01 Transitional",
        DoctypeMatcher::Contains(r#""-//W3C//DTD HTML 4.01 Transitional//EN""#),
    ),
    (
        "HTML 4.01 Frameset",
        DoctypeMatcher::Contains(r#""-//W3C//DTD HTML 4.01 Frameset//EN""#),
    ),
    (
        "XHTML 1.0 Strict",
        DoctypeMatcher::Contains(r#""-//W3C//DTD XHTML 1.0 Strict//EN""#),
    ),
    (
        "XHTML 1.0 Transitional",
        DoctypeMatcher::Contains(r#""-//W3C//DTD XHTML 1.0 Transitional//EN""#),
    ),
    (
        "XHTML 1.0 Frameset",
        DoctypeMatcher::Contains(r#""-//W3C//DTD XHTML 1.0 Frameset//EN""#),
    ),
    (
        "XHTML 1.1",
        DoctypeMatcher::Contains(r#""-//W3C//DTD XHTML 1.1//EN""#),
    ),
    ("HTML 5", DoctypeMatcher::Exact("html")),
    (
        "HTML 5",
        DoctypeMatcher::Contains(r#"html SYSTEM "about:legacy-compat""#),
    ),
];

/// Resolve a raw declaration such as
/// `html PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd"`.
pub fn resolve(declaration: &str) -> &'static str {
    DOCTYPE_TABLE
        .iter()
        .find(|(_, matcher)| matcher.matches(declaration))
        .map(|(label, _)| *label)
        .unwrap_or(UNKNOWN_HTML_VERSION)
}

/// Rebuild the declaration text from its tokenized parts.
pub fn declaration_text(name: &str, public_id: Option<&str>, system_id: Option<&str>) -> String {
    let mut text = name.to_string();
    match (public_id, system_id) {
        (Some(public_id), system_id) => {
            text.push_str(&format!(" PUBLIC \"{}\"", public_id));
            if let Some(system_id) = system_id {
                text.push_str(&format!(" \"{}\"", system_id));
            }
        }
        (None, Some(system_id)) => {
            text.push_str(&format!(" SYSTEM \"{}\"", system_id));
        }
        (None, None) => {}
    }
    text
}
