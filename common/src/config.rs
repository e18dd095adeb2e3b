//! Configuration types for runtime and output settings

/// Runtime configuration for tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeConfig {
    /// Number of worker threads (0 = number of CPU cores)
    pub max_workers: usize,
}

/// Output and logging configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Only report errors
    pub quiet: bool,
    /// Log debug messages (promoted to INFO by the [`crate::Logger`])
    pub verbose: bool,
    /// Emit GitHub Actions workflow commands for groups, warnings, errors and masks
    pub github_actions: bool,
}

impl OutputConfig {
    /// Default log filter directive for this configuration
    ///
    /// `RUST_LOG` takes precedence when set.
    pub fn filter_directive(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
