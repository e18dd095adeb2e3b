//! Per-source rclone command planning
//!
//! rclone works on directory trees, so a single file is expressed as "its
//! parent directory, filtered down to this one name". Directories are passed
//! as-is and land in a subfolder named after them unless the source was
//! written with a trailing separator, in which case their contents go
//! straight into the remote path.
//!
//! User include/exclude patterns (and `--delete-excluded`) only ever apply to
//! directory sources: a file source already carries an include for its own
//! name, and further filters could only turn the transfer into a no-op or,
//! with sync, delete remote data.

use std::path::{Component, Path, PathBuf};

use crate::binding::RemoteBinding;
use crate::request::TransferRequest;

/// What the filesystem says about a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFacts {
    /// Absolute, lexically normalized path
    pub resolved: PathBuf,
    pub is_dir: bool,
    /// The source as written ended with a path separator
    pub contents_only: bool,
}

/// rclone arguments for one source plus the `remote:path` they target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub args: Vec<String>,
    pub destination: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Source path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot access source path {}: {source}", path.display())]
    Inaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn has_trailing_separator(source: &str) -> bool {
    source.ends_with('/') || source.ends_with(std::path::MAIN_SEPARATOR)
}

/// Make `path` absolute against the working directory and fold `.` and `..`
fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

/// Resolve `source` and stat it
///
/// The trailing separator is recorded before resolution because resolving
/// strips it.
pub async fn inspect(source: &str) -> Result<SourceFacts, PlanError> {
    let contents_only = has_trailing_separator(source);
    let resolved = absolutize(Path::new(source)).map_err(|error| PlanError::Inaccessible {
        path: PathBuf::from(source),
        source: error,
    })?;
    let metadata = match tokio::fs::metadata(&resolved).await {
        Ok(metadata) => metadata,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Err(PlanError::NotFound(resolved));
        }
        Err(error) => {
            return Err(PlanError::Inaccessible {
                path: resolved,
                source: error,
            });
        }
    };
    Ok(SourceFacts {
        resolved,
        is_dir: metadata.is_dir(),
        contents_only,
    })
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Join a remote (always `/`-separated) path and a single segment
///
/// The result is normalized: empty and `.` segments are dropped and `..`
/// folds into its parent (never above the root of an absolute path).
fn join_remote(base: &str, segment: &str) -> String {
    let absolute = base.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in base.split('/').chain(std::iter::once(segment)) {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Assemble the rclone command line for an inspected source
pub fn build(facts: &SourceFacts, binding: &RemoteBinding, request: &TransferRequest) -> Plan {
    let mut dest_path = request.remote.path.clone();
    if facts.is_dir && !facts.contents_only {
        dest_path = join_remote(&request.remote.path, &base_name(&facts.resolved));
    }
    let destination = format!("{}:{}", binding.remote_name(), dest_path);

    let mut args = vec![request.mode.as_str().to_string()];
    if facts.is_dir {
        args.push(facts.resolved.to_string_lossy().into_owned());
    } else {
        let parent = facts.resolved.parent().unwrap_or(&facts.resolved);
        args.push(parent.to_string_lossy().into_owned());
        args.extend(["--include".to_string(), base_name(&facts.resolved)]);
    }
    args.push(destination.clone());
    if facts.is_dir {
        if !request.recursive {
            args.extend(["--max-depth".to_string(), "1".to_string()]);
        }
        for pattern in &request.include {
            args.extend(["--include".to_string(), pattern.clone()]);
        }
        for pattern in &request.exclude {
            args.extend(["--exclude".to_string(), pattern.clone()]);
        }
        // passed through even without excludes, rclone treats it as a no-op
        if request.delete_excluded {
            args.push("--delete-excluded".to_string());
        }
    }
    if request.skip_certificate_check {
        args.push("--no-check-certificate".to_string());
    }
    if request.dry_run {
        args.push("--dry-run".to_string());
    }
    if request.verbose {
        args.push("-v".to_string());
    }
    args.push("--stats-one-line-date".to_string());
    args.extend(["--stats-log-level".to_string(), "NOTICE".to_string()]);
    if let Some(config) = binding.config_path() {
        args.extend([
            "--config".to_string(),
            config.to_string_lossy().into_owned(),
        ]);
    }
    args.extend(request.extra_flags.split_whitespace().map(str::to_string));
    Plan { args, destination }
}

/// Inspect `source` and plan its transfer
pub async fn plan(
    source: &str,
    binding: &RemoteBinding,
    request: &TransferRequest,
) -> Result<Plan, PlanError> {
    let facts = inspect(source).await?;
    Ok(build(&facts, binding, request))
}
