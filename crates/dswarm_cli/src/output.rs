use dswarm_core::{ExportSummary, ImportSummary};
use owo_colors::OwoColorize;

/// Terminal reporting for the backup and restore commands
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    /// Announce a run: what goes where.
    pub fn run_header(&self, title: &str, from: &str, to: &str) {
        println!();
        println!("{}", title.bright_cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        self.kv("From", from);
        self.kv("To", to);
    }

    pub fn success(&self, message: &str) {
        println!("  {} {}", "✓".bright_green(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("  {} {}", "⚠".yellow(), message);
    }

    pub fn kv(&self, key: &str, value: &str) {
        println!("  {} {}", format!("{}:", key).dimmed(), value);
    }

    pub fn export_summary(&self, summary: &ExportSummary) {
        self.kv("Written", &summary.exported.to_string());
        self.success(&format!(
            "exported {} {} file(s) to {}",
            summary.exported,
            summary.collection,
            summary.directory.display()
        ));
    }

    /// Counts, then one line per failed object.
    pub fn import_summary(&self, summary: &ImportSummary) {
        self.kv("Imported", &summary.succeeded_count().to_string());
        self.kv("Failed", &summary.failed_count().to_string());

        if summary.is_clean() {
            self.success(&format!(
                "imported all {} {}(s)",
                summary.succeeded_count(),
                summary.collection
            ));
            return;
        }

        self.warning(&format!(
            "{} {}(s) could not be imported",
            summary.failed_count(),
            summary.collection
        ));
        for failed in &summary.failed {
            let status = failed
                .status
                .map(|status| status.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "    • {} {} {}",
                failed.label.bright_white(),
                format!("[{status}]").yellow(),
                failed.reason.dimmed()
            );
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
