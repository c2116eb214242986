//! Single-pass streaming extraction of title, doctype, headings and links.
//!
//! Bytes are pushed through the html5ever tokenizer as they arrive; no DOM is
//! built. Malformed markup and truncated streams only ever shorten the result.

use crate::doctype;
use crate::models::{DiscoveredLink, HeadingCounts, LinkScope, PageSummary, UNKNOWN_HTML_VERSION};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use std::cell::RefCell;
use std::io::{ErrorKind, Read};
use url::Url;

const READ_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Default)]
struct Accumulator {
    title: Option<String>,
    title_buffer: Option<String>,
    html_version: Option<&'static str>,
    headings: HeadingCounts,
    links: Vec<DiscoveredLink>,
}

impl Accumulator {
    fn close_title(&mut self) {
        if let Some(text) = self.title_buffer.take()
            && self.title.is_none()
        {
            self.title = Some(text);
        }
    }
}

struct PageSink {
    base_url: Url,
    acc: RefCell<Accumulator>,
}

impl PageSink {
    fn new(base_url: Url) -> Self {
        Self {
            base_url,
            acc: RefCell::new(Accumulator::default()),
        }
    }

    /// Internal when host and explicit port match the page. Hosts are
    /// compared case-insensitively.
    fn classify(&self, url: &Url) -> LinkScope {
        let same_host = match (url.host_str(), self.base_url.host_str()) {
            (Some(host), Some(base)) => host.eq_ignore_ascii_case(base),
            _ => false,
        };

        if same_host && url.port() == self.base_url.port() {
            LinkScope::Internal
        } else {
            LinkScope::External
        }
    }

    fn handle_start_tag(&self, tag: &Tag) -> TokenSinkResult<()> {
        let name: &str = &tag.name;
        let mut acc = self.acc.borrow_mut();

        match name {
            "a" => {
                if let Some(href) = tag.attrs.iter().find(|attr| &*attr.name.local == "href")
                    && let Some(url) = parse_absolute(&href.value)
                {
                    acc.links.push(DiscoveredLink {
                        url: href.value.to_string(),
                        scope: self.classify(&url),
                    });
                }
            }
            "title" => {
                if acc.title.is_none() {
                    acc.title_buffer = Some(String::new());
                }
                return TokenSinkResult::RawData(RawKind::Rcdata);
            }
            "textarea" => return TokenSinkResult::RawData(RawKind::Rcdata),
            "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
                return TokenSinkResult::RawData(RawKind::Rawtext);
            }
            "script" => return TokenSinkResult::RawData(RawKind::ScriptData),
            "plaintext" => return TokenSinkResult::Plaintext,
            _ if is_heading(name) => {
                *acc.headings.entry(name.to_string()).or_insert(0) += 1;
            }
            _ => {}
        }

        TokenSinkResult::Continue
    }

    fn finish(&self) -> PageSummary {
        let mut acc = self.acc.take();
        acc.close_title();

        PageSummary {
            title: acc.title.unwrap_or_default(),
            html_version: acc
                .html_version
                .unwrap_or(UNKNOWN_HTML_VERSION)
                .to_string(),
            headings: acc.headings,
            links: acc.links,
        }
    }
}

impl TokenSink for PageSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(text) => {
                if let Some(buffer) = self.acc.borrow_mut().title_buffer.as_mut() {
                    buffer.push_str(&text);
                }
            }
            Token::TagToken(tag) => {
                // Any tag ends the title text; in RCDATA only `</title>` gets here.
                self.acc.borrow_mut().close_title();
                if tag.kind == TagKind::StartTag {
                    return self.handle_start_tag(&tag);
                }
            }
            Token::DoctypeToken(doctype) => {
                let declaration = doctype::declaration_text(
                    doctype.name.as_deref().unwrap_or(""),
                    doctype.public_id.as_deref(),
                    doctype.system_id.as_deref(),
                );
                self.acc.borrow_mut().html_version = Some(doctype::resolve(&declaration));
            }
            Token::EOFToken => self.acc.borrow_mut().close_title(),
            Token::ParseError(_err) => {
                // Best effort: tokenizer recovers on its own
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Streaming analyzer fed with raw bytes in arbitrary chunks.
pub struct PageAnalyzer {
    tokenizer: Tokenizer<PageSink>,
    input: BufferQueue,
    pending: Vec<u8>,
}

impl PageAnalyzer {
    pub fn new(base_url: &Url) -> Self {
        Self {
            tokenizer: Tokenizer::new(PageSink::new(base_url.clone()), TokenizerOpts::default()),
            input: BufferQueue::default(),
            pending: Vec::new(),
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        let text = self.take_decoded();
        self.push_text(text);
    }

    pub fn finish(mut self) -> PageSummary {
        if !self.pending.is_empty() {
            let rest = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            self.push_text(rest);
        }
        self.tokenizer.end();
        self.tokenizer.sink.finish()
    }

    fn push_text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        self.input.push_back(StrTendril::from(text));
        let _ = self.tokenizer.feed(&self.input);
    }

    /// Decode as much of the pending bytes as possible. An incomplete UTF-8
    /// sequence at the end is kept for the next chunk; invalid bytes become
    /// U+FFFD.
    fn take_decoded(&mut self) -> String {
        let mut out = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        let consumed = self.pending.len() - rest.len();
        self.pending.drain(..consumed);
        out
    }
}

/// Run the streaming pass over a reader. A read error ends the pass like
/// end-of-stream does.
pub fn analyze_reader<R: Read>(mut reader: R, base_url: &Url) -> PageSummary {
    let mut analyzer = PageAnalyzer::new(base_url);
    let mut buf = [0u8; READ_CHUNK_SIZE];

    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => analyzer.feed(&buf[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!(base_url = %base_url, error = %e, "Page stream ended early");
                break;
            }
        }
    }

    analyzer.finish()
}

pub fn analyze_str(html: &str, base_url: &Url) -> PageSummary {
    analyze_reader(html.as_bytes(), base_url)
}

/// Only absolute URLs with both a scheme and a host count as links.
/// Surrounding whitespace is rejected rather than trimmed.
fn parse_absolute(href: &str) -> Option<Url> {
    if href.trim() != href {
        return None;
    }
    Url::parse(href).ok().filter(|url| url.has_host())
}

fn is_heading(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 2 && bytes[0] == b'h' && (b'1'..=b'6').contains(&bytes[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_heading_counts() {
        let html = "<h1>a</h1><h1>b</h1><h2>c</h2><h3>d</h3><h3>e</h3><h3>f</h3><h5>g</h5>";
        let summary = analyze_str(html, &base());

        assert_eq!(summary.headings.get("h1"), Some(&2));
        assert_eq!(summary.headings.get("h2"), Some(&1));
        assert_eq!(summary.headings.get("h3"), Some(&3));
        assert_eq!(summary.headings.get("h5"), Some(&1));
        assert_eq!(summary.headings.get("h4"), None);
        assert_eq!(summary.headings.get("h6"), None);
    }

    #[test]
    fn test_non_heading_tags_ignored() {
        let summary = analyze_str("<h7>x</h7><h0>y</h0><hr><header></header>", &base());
        assert!(summary.headings.is_empty());
    }

    #[test]
    fn test_link_classification() {
        let html = r#"
            <a href="https://example.com/about">about</a>
            <a href="https://EXAMPLE.com/contact">contact</a>
            <a href="https://other.org/">other</a>
            <a href="http://example.com:8080/admin">admin</a>
            <a href="/relative">relative</a>
            <a href="page.html">page</a>
            <a href="mailto:someone@example.com">mail</a>
            <a href="javascript:void(0)">js</a>
            <a href="http://[::1">broken</a>
            <a>no href</a>
        "#;
        let summary = analyze_str(html, &base());

        assert_eq!(summary.internal_count(), 2);
        assert_eq!(summary.external_count(), 2);
        assert_eq!(
            summary.link_urls(),
            vec![
                "https://example.com/about",
                "https://EXAMPLE.com/contact",
                "https://other.org/",
                "http://example.com:8080/admin",
            ]
        );
        assert_eq!(
            summary.internal_count() + summary.external_count(),
            summary.links.len()
        );
    }

    #[test]
    fn test_title_unicode_preserved() {
        let summary = analyze_str(
            "<html><head><title>Careers – home24</title></head></html>",
            &base(),
        );
        assert_eq!(summary.title, "Careers – home24");
    }

    #[test]
    fn test_first_title_wins() {
        let summary = analyze_str("<title>First</title><svg><title>Second</title></svg>", &base());
        assert_eq!(summary.title, "First");
    }

    #[test]
    fn test_title_is_raw_text() {
        let summary = analyze_str("<title>Fish &amp; <b>Chips</b></title>", &base());
        assert_eq!(summary.title, "Fish & <b>Chips</b>");
    }

    #[test]
    fn test_missing_title_and_doctype() {
        let summary = analyze_str("<p>hello</p>", &base());
        assert_eq!(summary.title, "");
        assert_eq!(summary.html_version, UNKNOWN_HTML_VERSION);
    }

    #[test]
    fn test_doctype_detection() {
        let html5 = analyze_str("<!DOCTYPE html><html></html>", &base());
        assert_eq!(html5.html_version, "HTML 5");

        let strict = analyze_str(
            r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd"><html></html>"#,
            &base(),
        );
        assert_eq!(strict.html_version, "HTML 4.01 Strict");

        let xhtml = analyze_str(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">"#,
            &base(),
        );
        assert_eq!(xhtml.html_version, "XHTML 1.1");

        let unknown = analyze_str("<!DOCTYPE foo><html></html>", &base());
        assert_eq!(unknown.html_version, UNKNOWN_HTML_VERSION);
    }

    #[test]
    fn test_script_contents_not_tokenized() {
        let html = r#"<script>document.write('<a href="https://example.com/x">x</a><h1>')</script>
            <style>h1 { color: red }</style>
            <noscript><a href="https://other.org/">x</a><h1>y</h1></noscript>
            <a href="https://example.com/real">real</a>"#;
        let summary = analyze_str(html, &base());

        assert_eq!(summary.link_urls(), vec!["https://example.com/real"]);
        assert!(summary.headings.is_empty());
    }

    #[test]
    fn test_plaintext_swallows_rest_of_document() {
        let html = r#"<a href="https://example.com/before">b</a><plaintext>
            <a href="https://example.com/after">a</a><h2>x</h2>"#;
        let summary = analyze_str(html, &base());

        assert_eq!(summary.link_urls(), vec!["https://example.com/before"]);
        assert!(summary.headings.is_empty());
    }

    #[test]
    fn test_href_with_surrounding_whitespace_skipped() {
        let html = r#"<a href=" https://other.org/ ">spaced</a>
            <a href="https://other.org/	">tab</a>
            <a href="https://other.org/">clean</a>"#;
        let summary = analyze_str(html, &base());

        assert_eq!(summary.link_urls(), vec!["https://other.org/"]);
        assert_eq!(summary.external_count(), 1);
    }

    #[test]
    fn test_byte_at_a_time_matches_whole_input() {
        let html = "<!DOCTYPE html><title>Größe – Übersicht</title>\
            <h1>Ü</h1><a href=\"https://example.com/ä\">ä</a><a href=\"https://x.org\">x</a>";

        let whole = analyze_str(html, &base());

        let mut analyzer = PageAnalyzer::new(&base());
        for byte in html.as_bytes() {
            analyzer.feed(std::slice::from_ref(byte));
        }
        let chunked = analyzer.finish();

        assert_eq!(whole, chunked);
        assert_eq!(chunked.title, "Größe – Übersicht");
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let mut analyzer = PageAnalyzer::new(&base());
        analyzer.feed(b"<title>bad \xff byte</title>");
        let summary = analyzer.finish();
        assert_eq!(summary.title, "bad \u{FFFD} byte");
    }

    #[test]
    fn test_truncated_document_keeps_partial_result() {
        let html = r#"<!DOCTYPE html><title>Cut</title><h2>x</h2><a href="https://other.org/"#;
        let summary = analyze_str(html, &base());

        assert_eq!(summary.title, "Cut");
        assert_eq!(summary.html_version, "HTML 5");
        assert_eq!(summary.headings.get("h2"), Some(&1));
        assert!(summary.links.is_empty());
    }

    #[test]
    fn test_unterminated_title_is_captured() {
        let summary = analyze_str("<title>Never closed", &base());
        assert_eq!(summary.title, "Never closed");
    }

    #[test]
    fn test_read_error_ends_pass() {
        struct FailingReader {
            served: bool,
        }

        impl Read for FailingReader {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.served {
                    return Err(std::io::Error::other("connection reset"));
                }
                self.served = true;
                let data = b"<title>Partial</title><h1>x</h1>";
                buf[..data.len()].copy_from_slice(data);
                Ok(data.len())
            }
        }

        let summary = analyze_reader(FailingReader { served: false }, &base());
        assert_eq!(summary.title, "Partial");
        assert_eq!(summary.headings.get("h1"), Some(&1));
    }
}
