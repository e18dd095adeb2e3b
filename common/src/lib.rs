//! Shared runtime plumbing for the rxfer tools
//!
//! Provides the [`run`] entry point used by the binaries (tracing subscriber
//! and tokio runtime setup), the [`Logger`] handed to every component, and
//! the [`version::ToolVersion`] type describing the external rclone binary.

pub mod config;
pub mod logger;
pub mod version;

pub use config::OutputConfig;
pub use config::RuntimeConfig;
pub use logger::Logger;

/// Install the log subscriber, build the runtime and drive `func` to completion
///
/// Errors returned by `func` are reported through the [`Logger`] and mapped to
/// `None` so the binary can pick its exit code.
pub fn run<Fut, Summary>(
    output: OutputConfig,
    runtime: RuntimeConfig,
    func: impl FnOnce() -> Fut,
) -> Option<Summary>
where
    Fut: std::future::Future<Output = anyhow::Result<Summary>>,
{
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(output.filter_directive()));
    // tests may run several tools in one process, only the first subscriber sticks
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
    let logger = Logger::from_output(&output);
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if runtime.max_workers > 0 {
        builder.worker_threads(runtime.max_workers);
    }
    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(error) => {
            logger.error(&format!("failed to start tokio runtime: {error:#}"));
            return None;
        }
    };
    match runtime.block_on(func()) {
        Ok(summary) => Some(summary),
        Err(error) => {
            logger.error(&format!("{error:#}"));
            None
        }
    }
}
