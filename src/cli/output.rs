//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::manifest::DefinitionHasher;
use crate::reconciler::{ActionType, DriftReport, DriftStatus, Mode, ReconciliationResult};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Field-set action row for table display.
#[derive(Tabled)]
struct ActionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Field set")]
    name: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Previous ID")]
    previous_id: String,
    #[tabled(rename = "ID")]
    id: String,
}

/// Drift row for table display.
#[derive(Tabled)]
struct DriftRow {
    #[tabled(rename = "Field set")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Manifest")]
    desired: String,
    #[tabled(rename = "Stored")]
    stored: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a command title. Empty in JSON mode.
    #[must_use]
    pub fn format_title(&self, description: &str, command: &str) -> String {
        match self.format {
            OutputFormat::Json => String::new(),
            OutputFormat::Text => {
                let title = format!("{description} ({command})");
                let underline = "=".repeat(title.chars().count());
                format!("\n{}\n{}\n", title.bold(), underline)
            }
        }
    }

    /// Formats an install or uninstall result.
    #[must_use]
    pub fn format_result(&self, result: &ReconciliationResult) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_default(),
            OutputFormat::Text => Self::format_result_text(result),
        }
    }

    /// Formats a result as text.
    fn format_result_text(result: &ReconciliationResult) -> String {
        if result.actions.is_empty() {
            return format!(
                "   No custom field sets declared in {}.\n",
                result.manifest.display()
            );
        }

        let rows: Vec<ActionRow> = result
            .actions
            .iter()
            .enumerate()
            .map(|(i, a)| ActionRow {
                index: i + 1,
                name: a.name.clone(),
                action: Self::format_action_type(a.action),
                previous_id: a.previous_id.as_deref().map_or_else(String::new, |id| Self::truncate(id, 12)),
                id: a.id.as_deref().map_or_else(String::new, |id| Self::truncate(id, 12)),
            })
            .collect();

        let mut output = Table::new(rows).to_string();
        output.push('\n');

        let _ = match result.mode {
            Mode::Install => write!(
                output,
                "\nInstall: {} created, {} replaced\n",
                result.count(ActionType::Created).to_string().green(),
                result.count(ActionType::Replaced).to_string().yellow()
            ),
            Mode::Uninstall => write!(
                output,
                "\nUninstall: {} removed, {} not installed\n",
                result.count(ActionType::Removed).to_string().red(),
                result.count(ActionType::Skipped).to_string().dimmed()
            ),
        };

        output
    }

    /// Formats a drift report.
    #[must_use]
    pub fn format_drift(&self, report: &DriftReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_drift_text(report),
        }
    }

    /// Formats a drift report as text.
    fn format_drift_text(report: &DriftReport) -> String {
        if report.entries.is_empty() {
            return format!(
                "   No custom field sets declared in {}.\n",
                report.manifest.display()
            );
        }

        let rows: Vec<DriftRow> = report
            .entries
            .iter()
            .map(|e| DriftRow {
                name: e.name.clone(),
                status: Self::format_drift_status(e.status),
                desired: DefinitionHasher::short_hash(&e.desired_hash),
                stored: e
                    .stored_hash
                    .as_deref()
                    .map_or_else(|| String::from("-"), DefinitionHasher::short_hash),
            })
            .collect();

        let mut output = Table::new(rows).to_string();
        output.push('\n');

        if report.is_converged() {
            let _ = write!(
                output,
                "\n{} No drift detected - custom fields are in sync.\n",
                "✓".green()
            );
        } else {
            let _ = write!(
                output,
                "\n{} {} missing, {} drifted, {} in sync\n",
                "⚠".yellow(),
                report.count(DriftStatus::Missing),
                report.count(DriftStatus::Drifted),
                report.count(DriftStatus::InSync)
            );
        }

        output
    }

    /// Formats a success message.
    #[must_use]
    pub fn success(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": "success", "message": message });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {message}", "✓".green()),
        }
    }

    /// Formats an error message.
    #[must_use]
    pub fn error(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": "error", "message": message });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {message}", "✗".red()),
        }
    }

    /// Formats an action type with color.
    fn format_action_type(action: ActionType) -> String {
        match action {
            ActionType::Created => "+created".green().to_string(),
            ActionType::Replaced => "~replaced".yellow().to_string(),
            ActionType::Removed => "-removed".red().to_string(),
            ActionType::Skipped => "skipped".dimmed().to_string(),
        }
    }

    /// Formats a drift status with color.
    fn format_drift_status(status: DriftStatus) -> String {
        match status {
            DriftStatus::InSync => "in sync".green().to_string(),
            DriftStatus::Drifted => "drifted".yellow().to_string(),
            DriftStatus::Missing => "missing".red().to_string(),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{head}...")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::{DriftEntry, FieldSetAction};
    use std::path::Path;

    fn sample_result() -> ReconciliationResult {
        let mut result = ReconciliationResult::new(Mode::Install, Path::new("manifest.xml"));
        result.actions.push(FieldSetAction {
            name: String::from("customer_loyalty"),
            action: ActionType::Replaced,
            previous_id: Some(String::from("0d6c2a9e-old")),
            id: Some(String::from("9f1b7c3d-4e5f-4a6b-8c7d-0e1f2a3b4c5d")),
        });
        result
    }

    #[test]
    fn test_result_json() {
        colored::control::set_override(false);
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let json: serde_json::Value =
            serde_json::from_str(&formatter.format_result(&sample_result())).unwrap();

        assert_eq!(json["mode"], "install");
        assert_eq!(json["actions"][0]["action"], "replaced");
        assert_eq!(json["actions"][0]["previous_id"], "0d6c2a9e-old");
    }

    #[test]
    fn test_result_text() {
        colored::control::set_override(false);
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let text = formatter.format_result(&sample_result());

        assert!(text.contains("customer_loyalty"));
        assert!(text.contains("~replaced"));
        assert!(text.contains("9f1b7c3d-..."));
        assert!(text.contains("Install: 0 created, 1 replaced"));
    }

    #[test]
    fn test_empty_result_text() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let result = ReconciliationResult::new(Mode::Uninstall, Path::new("empty.xml"));
        assert!(formatter.format_result(&result).contains("No custom field sets declared in empty.xml"));
    }

    #[test]
    fn test_drift_text() {
        colored::control::set_override(false);
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let report = DriftReport {
            manifest: Path::new("manifest.xml").to_path_buf(),
            entries: vec![DriftEntry {
                name: String::from("customer_loyalty"),
                status: DriftStatus::Missing,
                desired_hash: String::from("abcdef1234567890"),
                stored_hash: None,
                stored_id: None,
            }],
        };

        let text = formatter.format_drift(&report);
        assert!(text.contains("abcdef12"));
        assert!(text.contains("1 missing, 0 drifted, 0 in sync"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(OutputFormatter::truncate("short", 12), "short");
        assert_eq!(OutputFormatter::truncate("0123456789abcdef", 12), "012345678...");
    }

    #[test]
    fn test_messages() {
        colored::control::set_override(false);
        let text = OutputFormatter::new(OutputFormat::Text);
        assert_eq!(text.success("Custom fields installed"), "✓ Custom fields installed");

        let json = OutputFormatter::new(OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json.error("boom")).unwrap();
        assert_eq!(value["status"], "error");
    }
}
