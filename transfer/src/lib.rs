//! rclone transfer engine
//!
//! Turns a validated [`TransferRequest`] into one rclone invocation per
//! source, runs them one after another and reports a [`TransferOutcome`] for
//! each.
//!
//! # Components
//!
//! - [`binding`] - resolves how rclone reaches the remote: a generated config
//!   file or `RCLONE_CONFIG_REMOTE_*` environment variables
//! - [`planner`] - per-source argument lists (path semantics, filters, flags)
//! - [`executor`] - runs rclone with captured (and optionally echoed) output
//! - [`stats`] - extracts the transferred file count from rclone's output
//! - [`orchestrator`] - ties the above together for a whole run
//!
//! # Path semantics
//!
//! - `dist` (directory) is transferred to `<remote path>/dist`
//! - `dist/` (directory with trailing separator) transfers the *contents* of
//!   `dist` straight into `<remote path>`
//! - `README.md` (file) is transferred into `<remote path>`
//!
//! # Failure model
//!
//! A missing source, a binary that cannot be launched or a non-zero rclone
//! exit only fail that source. Failing to obscure the remote password (or to
//! write the generated config) aborts the run before any transfer starts.

pub mod binding;
pub mod executor;
pub mod orchestrator;
pub mod planner;
pub mod report;
pub mod request;
pub mod stats;

mod error;

pub use error::Error;
pub use executor::{CommandOutput, Executor, ProcessExecutor};
pub use orchestrator::Orchestrator;
pub use report::RunReport;
pub use request::{RemoteSpec, TransferMode, TransferOutcome, TransferRequest};
