//! Locating (and optionally installing) the rclone binary
//!
//! [`ensure_available`] checks the configured binary and, when it is missing
//! and installation is allowed, installs a release through [`install`]. The
//! returned [`Tool`] names the program every later invocation must use, so
//! nothing here touches the process environment.

use common::version::ToolVersion;
use std::path::{Path, PathBuf};

pub mod install;

/// A runnable rclone binary and the version it reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub program: PathBuf,
    pub version: ToolVersion,
}

/// Run `<program> version` silently and parse the reported version
///
/// Any failure (binary missing, non-zero exit, unrecognized output) yields `None`.
pub async fn installed_version(program: &Path) -> Option<ToolVersion> {
    let output = tokio::process::Command::new(program)
        .arg("version")
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .map_err(|error| tracing::debug!("probing {} failed: {error}", program.display()))
        .ok()?;
    if !output.status.success() {
        tracing::debug!("{} version exited with {}", program.display(), output.status);
        return None;
    }
    ToolVersion::from_banner(&String::from_utf8_lossy(&output.stdout))
}

/// Make sure an rclone binary is usable, installing `version` if allowed
pub async fn ensure_available(
    program: &Path,
    install: bool,
    version: &str,
    logger: &common::Logger,
) -> anyhow::Result<Tool> {
    if let Some(existing) = installed_version(program).await {
        logger.info(&format!("rclone already installed: {existing}"));
        return Ok(Tool {
            program: program.to_path_buf(),
            version: existing,
        });
    }
    logger.debug(&format!("no usable rclone at {}", program.display()));
    if !install {
        anyhow::bail!(
            "rclone is not installed and installation is disabled. \
            Install rclone manually or pass --install-rclone true."
        );
    }
    let installed = install::install(version, logger).await?;
    let Some(found) = installed_version(&installed).await else {
        anyhow::bail!(
            "rclone installation completed but version check failed. Installation may be broken."
        );
    };
    logger.info(&format!("rclone {found} installed successfully."));
    Ok(Tool {
        program: installed,
        version: found,
    })
}
