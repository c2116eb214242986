use crate::models::{AnalysisReport, AnalysisResult, UNKNOWN_HTML_VERSION};
use anyhow::{Context, Result};
use colored::*;
use std::fs::File;
use std::io::Write;

const HEADING_LEVELS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

pub struct Reporter;

impl Reporter {
    pub fn generate_report(target_url: &str, result: &AnalysisResult) -> AnalysisReport {
        AnalysisReport {
            target_url: target_url.to_string(),
            result: result.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn print_text_report(report: &AnalysisReport) {
        println!("{}", Self::render_text_report(report));
    }

    pub fn render_text_report(report: &AnalysisReport) -> String {
        let result = &report.result;
        let mut lines = Vec::new();

        lines.push(format!("\n{}", "=".repeat(80).bright_blue()));
        lines.push(format!("{}", "Pageprobe - Page Report".bright_cyan().bold()));
        lines.push(format!("{}", "=".repeat(80).bright_blue()));
        lines.push(String::new());

        lines.push(format!("{}: {}", "URL".bright_white().bold(), report.target_url));
        lines.push(format!("{}: {}", "Timestamp".bright_white().bold(), report.timestamp));
        lines.push(String::new());

        lines.push(format!("{}", "Document".bright_yellow().bold().underline()));
        lines.push(format!(
            "  Title:         {}",
            if result.title.is_empty() {
                "(none)".dimmed()
            } else {
                result.title.bright_white()
            }
        ));
        lines.push(format!(
            "  HTML Version:  {}",
            if result.html_version == UNKNOWN_HTML_VERSION {
                result.html_version.yellow()
            } else {
                result.html_version.bright_green()
            }
        ));
        lines.push(format!(
            "  Login Form:    {}",
            if result.has_login_form {
                "yes".bright_cyan()
            } else {
                "no".normal()
            }
        ));
        lines.push(String::new());

        lines.push(format!("{}", "Headings".bright_yellow().bold().underline()));
        for level in HEADING_LEVELS {
            let count = result.headings.get(level).copied().unwrap_or(0);
            lines.push(format!("  {}: {}", level, count));
        }
        lines.push(String::new());

        lines.push(format!("{}", "Links".bright_yellow().bold().underline()));
        lines.push(format!(
            "  Internal:      {}",
            result.internal_urls.to_string().bright_green()
        ));
        lines.push(format!(
            "  External:      {}",
            result.external_urls.to_string().bright_green()
        ));
        lines.push(format!(
            "  Inaccessible:  {}",
            if result.inaccessible_urls > 0 {
                result.inaccessible_urls.to_string().bright_red()
            } else {
                result.inaccessible_urls.to_string().bright_green()
            }
        ));

        if !result.valid_urls.is_empty() {
            lines.push(String::new());
            for (i, url) in result.valid_urls.iter().enumerate() {
                lines.push(format!("  {:>3}. {}", i + 1, url.cyan()));
            }
        }

        lines.push(String::new());
        lines.push(format!("{}", "=".repeat(80).bright_blue()));

        lines.join("\n")
    }

    pub fn save_json_report(report: &AnalysisReport, filename: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(filename)
            .with_context(|| format!("Failed to create report file: {}", filename))?;
        file.write_all(json.as_bytes())?;
        println!("Report saved to: {}", filename.bright_green());
        Ok(())
    }
}
