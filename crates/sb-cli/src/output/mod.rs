//! Output formatting utilities for the CLI
//!
//! Tables for the certificate directory, a capability summary and the
//! colored status messages used by every command.

use chrono::NaiveDateTime;
use tabled::{
    settings::{Style, Width},
    Table, Tabled,
};

use sb_core::{Feature, FeatureTier, KeyDirectory, Version};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format the certificate directory as an ASCII table
///
/// The detailed view adds organization, title and the validity window.
/// Returns "No certificates found" when the directory is empty.
pub fn format_certificates(directory: &KeyDirectory, detailed: bool, now: NaiveDateTime) -> String {
    if directory.is_empty() {
        return "No certificates found".to_string();
    }

    #[derive(Tabled)]
    struct CertificateRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "TYPE")]
        kind: String,
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "TAX ID")]
        tax_id: String,
        #[tabled(rename = "VALID TO")]
        valid_to: String,
        #[tabled(rename = "STATUS")]
        status: String,
    }

    #[derive(Tabled)]
    struct CertificateRowDetailed {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "TYPE")]
        kind: String,
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "ORGANIZATION")]
        organization: String,
        #[tabled(rename = "TITLE")]
        title: String,
        #[tabled(rename = "TAX ID")]
        tax_id: String,
        #[tabled(rename = "PERSONAL ID")]
        personal_id: String,
        #[tabled(rename = "VALID FROM")]
        valid_from: String,
        #[tabled(rename = "VALID TO")]
        valid_to: String,
        #[tabled(rename = "STATUS")]
        status: String,
    }

    if detailed {
        let rows: Vec<CertificateRowDetailed> = directory
            .entries
            .iter()
            .map(|e| CertificateRowDetailed {
                id: e.id.clone(),
                kind: e.identity.kind().to_string(),
                name: e.identity.common_name.clone(),
                organization: or_dash(&e.identity.organization),
                title: or_dash(&e.identity.title),
                tax_id: e.identity.tax_id.clone().unwrap_or_else(|| "-".to_string()),
                personal_id: e
                    .identity
                    .personal_id
                    .clone()
                    .unwrap_or_else(|| "-".to_string()),
                valid_from: format_date(e.identity.valid_from),
                valid_to: format_date(e.identity.valid_to),
                status: status(e.identity.is_expired_at(now)),
            })
            .collect();

        Table::new(rows)
            .with(Style::rounded())
            .with(Width::wrap(140))
            .to_string()
    } else {
        let rows: Vec<CertificateRow> = directory
            .entries
            .iter()
            .map(|e| CertificateRow {
                id: truncate(&e.id, 24),
                kind: e.identity.kind().to_string(),
                name: truncate(&e.identity.common_name, 32),
                tax_id: e.identity.tax_id.clone().unwrap_or_else(|| "-".to_string()),
                valid_to: format_date(e.identity.valid_to),
                status: status(e.identity.is_expired_at(now)),
            })
            .collect();

        Table::new(rows).with(Style::rounded()).to_string()
    }
}

/// Format the agent version and the capabilities it unlocks
pub fn format_features(version: Version, tier: &FeatureTier) -> String {
    let mut output = format!("Signing agent: {}\n", version);
    for feature in [
        Feature::CertificateApi,
        Feature::ReaderListing,
        Feature::TokenClasses,
    ] {
        let mark = if tier.supports(feature) { "yes" } else { "no" };
        output.push_str(&format!("  {:<32} {}\n", feature.description(), mark));
    }
    output
}

fn format_date(value: Option<NaiveDateTime>) -> String {
    value
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn status(expired: bool) -> String {
    if expired { "expired" } else { "valid" }.to_string()
}

fn or_dash(s: &str) -> String {
    if s.is_empty() {
        "-".to_string()
    } else {
        s.to_string()
    }
}

/// Truncate a string with ellipsis if too long
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
///
/// Outputs to stderr.
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan
///
/// Goes to stderr so that signature output on stdout stays clean.
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
