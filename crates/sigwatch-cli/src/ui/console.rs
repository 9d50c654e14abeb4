//! Console reporter
//!
//! Prints one line per version and artifact to stdout. Security failures go
//! to stderr with a `SECURITY` prefix and are shown whatever the log level.

use crossterm::style::Stylize;
use sigwatch_core::{Error, Reporter, RunReport};
use sigwatch_schema::{VerificationRecord, VersionId};

#[derive(Debug, Default)]
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn security(msg: &str) {
        eprintln!("{} {}", "SECURITY".red().bold(), msg.red().bold());
    }
}

impl Reporter for ConsoleReporter {
    fn index_fetched(&self, total: usize, selected: usize) {
        println!(
            "{} {total} entries, {selected} to check",
            "index".dark_grey()
        );
    }

    fn version_started(&self, version: &VersionId) {
        println!();
        println!("  {}", version.as_str().white().bold());
    }

    fn snapshot_written(&self, _version: &VersionId, file_name: &str) {
        if self.verbose {
            println!("    {} {file_name}", "saved".dark_grey());
        }
    }

    fn signature_verified(&self, _version: &VersionId) {
        println!("    {} manifest signature", "ok".green());
    }

    fn signature_invalid(&self, version: &VersionId) {
        Self::security(&format!(
            "manifest signature of {version} is INVALID, artifacts not checked"
        ));
    }

    fn artifact_verified(&self, _version: &VersionId, record: &VerificationRecord) {
        if record.cached {
            if self.verbose {
                println!("    {} {}", "cached".dark_grey(), record.filename);
            }
        } else {
            println!("    {} {}", "ok".green(), record.filename);
        }
    }

    fn artifact_failed(&self, version: &VersionId, record: &VerificationRecord, error: &Error) {
        if error.is_security() {
            Self::security(&format!("{version}/{}: {error}", record.filename));
        } else {
            println!("    {} {}: {error}", "failed".yellow(), record.filename);
        }
    }

    fn version_failed(&self, version: &VersionId, error: &Error) {
        println!("    {} {version}: {error}", "failed".yellow());
    }

    fn warning(&self, msg: &str) {
        println!("  {} {msg}", "warning".yellow());
    }

    fn summary(&self, report: &RunReport) {
        println!();
        let line = format!(
            "{} of {} versions verified, {} artifacts verified",
            report.verified_versions(),
            report.versions.len(),
            report.verified_artifacts()
        );
        if report.is_success() {
            println!("{}", line.green().bold());
            return;
        }
        println!("{line}");
        if report.has_security_failures() {
            Self::security(&format!(
                "{} invalid signatures, {} artifact mismatches",
                report.signature_failures(),
                report.integrity_failures()
            ));
        }
        if report.unchecked_artifacts() > 0 {
            println!(
                "{} {} artifacts could not be checked",
                "warning".yellow(),
                report.unchecked_artifacts()
            );
        }
        if report.fetch_failures() > 0 {
            println!(
                "{} {} versions could not be checked",
                "warning".yellow(),
                report.fetch_failures()
            );
        }
    }
}
