//! Leveled logging with named groups
//!
//! [`Logger`] is a small value handed to every component that reports
//! progress. Messages go to the `tracing` subscriber installed by
//! [`crate::run`]. When running under GitHub Actions, groups, warnings,
//! errors and secret masks are additionally expressed as workflow commands so
//! the runner can fold and annotate the log.

use std::future::Future;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, Default)]
pub struct Logger {
    verbose: bool,
    github_actions: bool,
}

impl Logger {
    pub fn new(verbose: bool, github_actions: bool) -> Self {
        Self {
            verbose,
            github_actions,
        }
    }

    pub fn from_output(output: &crate::OutputConfig) -> Self {
        Self::new(output.verbose, output.github_actions)
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    /// Debug messages are promoted to INFO in verbose mode so they show up without `RUST_LOG`
    pub fn debug(&self, message: &str) {
        if self.verbose {
            tracing::info!("[DEBUG] {}", message);
        } else {
            tracing::debug!("{}", message);
        }
    }

    pub fn warn(&self, message: &str) {
        if self.github_actions {
            println!("::warning::{}", escape_data(message));
        } else {
            tracing::warn!("{}", message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.github_actions {
            println!("::error::{}", escape_data(message));
        } else {
            tracing::error!("{}", message);
        }
    }

    /// Ask the runner to redact `secret` from all subsequent log output
    pub fn mask(&self, secret: &str) {
        if self.github_actions && !secret.is_empty() {
            println!("::add-mask::{}", escape_data(secret));
        }
    }

    /// Run `fut` inside a named log section
    pub async fn group<F>(&self, name: &str, fut: F) -> F::Output
    where
        F: Future,
    {
        if self.github_actions {
            println!("::group::{}", escape_data(name));
        }
        tracing::debug!("begin group: {}", name);
        let span = tracing::info_span!("group", name = %name);
        let output = fut.instrument(span).await;
        tracing::debug!("end group: {}", name);
        if self.github_actions {
            println!("::endgroup::");
        }
        output
    }
}

/// Escape a workflow command payload (`%`, CR and LF must be percent-encoded)
fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn escapes_multiline_payloads() {
        assert_eq!(
            escape_data("2 of 3 failed:\n  - a: 100%\r"),
            "2 of 3 failed:%0A  - a: 100%25%0D"
        );
        assert_eq!(escape_data("plain"), "plain");
    }

    #[traced_test]
    #[test]
    fn verbose_debug_is_promoted() {
        let logger = Logger::new(true, false);
        logger.debug("obscuring remote password");
        assert!(logs_contain("[DEBUG] obscuring remote password"));
    }

    #[traced_test]
    #[test]
    fn quiet_debug_keeps_plain_message() {
        let logger = Logger::new(false, false);
        logger.debug("configured remote type: sftp");
        assert!(logs_contain("configured remote type: sftp"));
        assert!(!logs_contain("[DEBUG]"));
    }

    #[tokio::test]
    async fn group_returns_inner_value() {
        let logger = Logger::default();
        let value = logger.group("Ensure rclone", async { 42 }).await;
        assert_eq!(value, 42);
    }
}
