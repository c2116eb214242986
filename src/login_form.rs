use crate::models::HtmlForm;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static FORM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("form").expect("form selector should be valid"));
static INPUT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input").expect("input selector should be valid"));
static TEXTAREA_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("textarea").expect("textarea selector should be valid"));

/// Buffered document pass over a page body, independent of the streaming
/// analyzer.
pub struct LoginFormDetector;

impl LoginFormDetector {
    pub fn parse_forms(html: &str) -> Vec<HtmlForm> {
        let document = Html::parse_document(html);
        document.select(&FORM_SELECTOR).map(Self::parse_form).collect()
    }

    /// A page has a login form when any of its forms carries a password input.
    pub fn has_login_form(html: &str) -> bool {
        Self::parse_forms(html)
            .iter()
            .any(|form| form.has_password_field)
    }

    fn parse_form(form: ElementRef<'_>) -> HtmlForm {
        let mut parsed = HtmlForm {
            action: form.value().attr("action").map(|s| s.to_string()),
            method: form.value().attr("method").map(|s| s.to_string()),
            values: vec![],
            has_password_field: false,
        };

        for input in form.select(&INPUT_SELECTOR) {
            let input_type = input
                .value()
                .attr("type")
                .unwrap_or("")
                .to_ascii_lowercase();

            if input_type == "password" {
                parsed.has_password_field = true;
            }

            let name = input.value().attr("name").unwrap_or("");
            if name.is_empty() {
                continue;
            }

            let checked = input.value().attr("checked").is_some();
            if (input_type == "radio" || input_type == "checkbox") && !checked {
                continue;
            }

            let value = input.value().attr("value").unwrap_or("");
            parsed.values.push((name.to_string(), value.to_string()));
        }

        for textarea in form.select(&TEXTAREA_SELECTOR) {
            let name = textarea.value().attr("name").unwrap_or("");
            if name.is_empty() {
                continue;
            }
            parsed
                .values
                .push((name.to_string(), textarea.text().collect::<String>()));
        }

        parsed
    }
}
