//! Command line / workflow input ingestion
//!
//! Every input can be given as a flag or through the `INPUT_<NAME>` variable a
//! GitHub Actions runner exports for a step input, so the same binary serves
//! both as a CLI and as an action entry point. Values arrive as raw strings and
//! are validated in one place, [`Inputs::validate`], which either produces the
//! [`RunSettings`] for a run or an [`InputError`] naming what is wrong.

use std::path::PathBuf;
use transfer::request::UnknownMode;
use transfer::{RemoteSpec, TransferMode, TransferRequest};

/// Variables a runner sets when step debug logging is enabled
pub const DEBUG_VARS: [&str; 3] = ["ACTIONS_STEP_DEBUG", "ACTIONS_RUNNER_DEBUG", "RUNNER_DEBUG"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Input 'sources' must contain at least one file or folder path.")]
    NoSources,

    #[error("Input 'mode' must be one of: sync, copy. Got: '{0}'")]
    InvalidMode(String),

    #[error("Either 'rclone-config' or 'remote-type' (with 'remote-host') must be provided.")]
    MissingRemote,

    #[error("Input 'remote-host' is required when 'remote-type' is '{0}' (non-local backend).")]
    MissingHost(String),

    #[error("Cannot set both a URL path in 'remote-host' and 'remote-path'. Use one or the other.")]
    ConflictingRemotePath,

    #[error("Input '{input}' must be a boolean (true/false/yes/no/1/0). Got: '{value}'")]
    InvalidBool { input: &'static str, value: String },
}

#[derive(clap::Args, Debug, Clone)]
pub struct Inputs {
    // Transfer
    /// Files or folders to transfer, separated by commas or newlines
    ///
    /// A folder given with a trailing `/` transfers its contents into the remote path; without
    /// it the folder itself is created under the remote path.
    #[arg(long, env = "INPUT_SOURCES", default_value = "", hide_default_value = true, value_name = "LIST", help_heading = "Transfer")]
    pub sources: String,

    /// Transfer mode: `sync` (mirror, deletes extra remote files) or `copy`
    #[arg(long, env = "INPUT_MODE", default_value = "sync", value_name = "MODE", help_heading = "Transfer")]
    pub mode: String,

    /// Descend into subfolders of folder sources
    #[arg(long, env = "INPUT_RECURSIVE", default_value = "true", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", help_heading = "Transfer")]
    pub recursive: String,

    /// Only transfer files matching these rclone filter patterns (comma or newline separated)
    #[arg(long, env = "INPUT_INCLUDE", default_value = "", hide_default_value = true, value_name = "LIST", help_heading = "Transfer")]
    pub include: String,

    /// Skip files matching these rclone filter patterns (comma or newline separated)
    #[arg(long, env = "INPUT_EXCLUDE", default_value = "", hide_default_value = true, value_name = "LIST", help_heading = "Transfer")]
    pub exclude: String,

    /// Also delete excluded files from the remote
    #[arg(long, env = "INPUT_DELETE-EXCLUDED", default_value = "false", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", help_heading = "Transfer")]
    pub delete_excluded: String,

    /// Show what would be transferred without changing anything
    #[arg(long, env = "INPUT_DRY-RUN", default_value = "false", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", help_heading = "Transfer")]
    pub dry_run: String,

    // Remote
    /// rclone backend type, e.g. `sftp`, `ftp`, `webdav`, `s3`, `local`
    #[arg(long, env = "INPUT_REMOTE-TYPE", default_value = "", hide_default_value = true, value_name = "TYPE", help_heading = "Remote")]
    pub remote_type: String,

    /// Remote host; for URL based backends a full `http(s)://` URL whose path becomes the remote path
    #[arg(long, env = "INPUT_REMOTE-HOST", default_value = "", hide_default_value = true, value_name = "HOST", help_heading = "Remote")]
    pub remote_host: String,

    #[arg(long, env = "INPUT_REMOTE-PORT", default_value = "", hide_default_value = true, value_name = "PORT", help_heading = "Remote")]
    pub remote_port: String,

    #[arg(long, env = "INPUT_REMOTE-USER", default_value = "", hide_default_value = true, value_name = "USER", help_heading = "Remote")]
    pub remote_user: String,

    /// Remote password in plain text; it is obscured through rclone before use
    #[arg(long, env = "INPUT_REMOTE-PASS", default_value = "", hide_default_value = true, hide_env_values = true, value_name = "PASSWORD", help_heading = "Remote")]
    pub remote_pass: String,

    /// Base path on the remote (default `/`)
    #[arg(long, env = "INPUT_REMOTE-PATH", default_value = "", hide_default_value = true, value_name = "PATH", help_heading = "Remote")]
    pub remote_path: String,

    /// Raw rclone config text; takes precedence over the `--remote-*` settings
    #[arg(long, env = "INPUT_RCLONE-CONFIG", default_value = "", hide_default_value = true, hide_env_values = true, value_name = "CONFIG", help_heading = "Remote")]
    pub rclone_config: String,

    /// Read the raw rclone config text from a file (replaces `--rclone-config`)
    #[arg(long, value_name = "PATH", help_heading = "Remote")]
    pub rclone_config_file: Option<PathBuf>,

    /// Accept any TLS certificate presented by the remote
    #[arg(long, env = "INPUT_SKIP-CERTIFICATE-CHECK", default_value = "false", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", help_heading = "Remote")]
    pub skip_certificate_check: String,

    // rclone
    /// Extra flags passed to every rclone invocation, whitespace separated
    #[arg(long, env = "INPUT_RCLONE-FLAGS", default_value = "", hide_default_value = true, allow_hyphen_values = true, value_name = "FLAGS", help_heading = "rclone")]
    pub rclone_flags: String,

    /// Download rclone when the binary is not available
    #[arg(long, env = "INPUT_INSTALL-RCLONE", default_value = "true", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", help_heading = "rclone")]
    pub install_rclone: String,

    /// rclone release to install, e.g. `v1.68.2` or `latest`
    #[arg(long, env = "INPUT_RCLONE-VERSION", default_value = "latest", value_name = "VERSION", help_heading = "rclone")]
    pub rclone_version: String,

    /// rclone binary to run, a name looked up on PATH or a path
    #[arg(long, default_value = "rclone", value_name = "PROGRAM", help_heading = "rclone")]
    pub rclone_binary: PathBuf,

    /// Log debug messages and show rclone's own output
    #[arg(long, env = "INPUT_VERBOSE", default_value = "false", num_args = 0..=1, default_missing_value = "true", value_name = "BOOL", help_heading = "Progress & output")]
    pub verbose: String,
}

/// Everything a run needs, validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub request: TransferRequest,
    pub install_rclone: bool,
    pub rclone_version: String,
    pub rclone_binary: PathBuf,
}

/// Split a list input on commas and newlines, dropping blank entries
///
/// # Examples
///
/// ```
/// assert_eq!(
///     rxfer::inputs::parse_list("dist/, README.md\n\n docs "),
///     vec!["dist/", "README.md", "docs"]
/// );
/// ```
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_bool(input: &'static str, raw: &str) -> Result<bool, InputError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(InputError::InvalidBool {
            input,
            value: raw.to_string(),
        }),
    }
}

/// True when the runner asks for debug output
pub fn debug_requested(env: &impl Fn(&str) -> Option<String>) -> bool {
    DEBUG_VARS.iter().any(|key| {
        env(key).is_some_and(|value| value.eq_ignore_ascii_case("true") || value == "1")
    })
}

/// Split an `http(s)://` host into its origin and URL path
///
/// Returns the host to use and the remote path. A URL path other than `/`
/// becomes the remote path unless one was given explicitly. Hosts that are not
/// parsable URLs are kept as they are.
pub fn split_host_url(host: &str, remote_path: &str) -> Result<(String, String), InputError> {
    let explicit_path = !remote_path.is_empty() && remote_path != "/";
    let mut path = if remote_path.is_empty() {
        "/".to_string()
    } else {
        remote_path.to_string()
    };
    if !(host.starts_with("http://") || host.starts_with("https://")) {
        return Ok((host.to_string(), path));
    }
    let url = match url::Url::parse(host) {
        Ok(url) => url,
        Err(error) => {
            tracing::debug!("remote host {host:?} is not a URL ({error}), using it verbatim");
            return Ok((host.to_string(), path));
        }
    };
    if !url.path().is_empty() && url.path() != "/" {
        if explicit_path {
            return Err(InputError::ConflictingRemotePath);
        }
        path = url.path().to_string();
    }
    Ok((url.origin().ascii_serialization(), path))
}

impl Inputs {
    /// Lenient verbosity check used before logging is set up
    ///
    /// An unparsable `--verbose` value counts as off here and is reported by [`Inputs::validate`].
    pub fn verbose_requested(&self, env: impl Fn(&str) -> Option<String>) -> bool {
        parse_bool("verbose", &self.verbose).unwrap_or(false) || debug_requested(&env)
    }

    /// Replace the inline config text with the contents of `--rclone-config-file`, if given
    pub async fn load_config_file(&mut self) -> anyhow::Result<()> {
        use anyhow::Context;
        if let Some(path) = &self.rclone_config_file {
            self.rclone_config = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read rclone config from {}", path.display()))?;
        }
        Ok(())
    }

    pub fn validate(
        &self,
        logger: &common::Logger,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<RunSettings, InputError> {
        let sources = parse_list(&self.sources);
        if sources.is_empty() {
            return Err(InputError::NoSources);
        }
        let mode: TransferMode = self
            .mode
            .parse()
            .map_err(|UnknownMode(mode)| InputError::InvalidMode(mode))?;
        logger.mask(&self.remote_pass);
        let has_config = !self.rclone_config.is_empty();
        if !has_config && self.remote_type.is_empty() {
            return Err(InputError::MissingRemote);
        }
        if !self.remote_type.is_empty()
            && self.remote_type != "local"
            && self.remote_host.is_empty()
            && !has_config
        {
            return Err(InputError::MissingHost(self.remote_type.clone()));
        }
        let (host, path) = split_host_url(&self.remote_host, &self.remote_path)?;
        let exclude = parse_list(&self.exclude);
        let delete_excluded = parse_bool("delete-excluded", &self.delete_excluded)?;
        if delete_excluded && exclude.is_empty() {
            logger.warn(
                "'delete-excluded' is enabled but no 'exclude' patterns are set. It will have no effect.",
            );
        }
        let verbose = parse_bool("verbose", &self.verbose)? || debug_requested(&env);
        let request = TransferRequest {
            sources,
            mode,
            recursive: parse_bool("recursive", &self.recursive)?,
            remote: RemoteSpec {
                kind: self.remote_type.clone(),
                host,
                port: self.remote_port.clone(),
                user: self.remote_user.clone(),
                password: self.remote_pass.clone(),
                path,
            },
            backend_config: has_config.then(|| self.rclone_config.clone()),
            extra_flags: self.rclone_flags.clone(),
            include: parse_list(&self.include),
            exclude,
            delete_excluded,
            skip_certificate_check: parse_bool(
                "skip-certificate-check",
                &self.skip_certificate_check,
            )?,
            dry_run: parse_bool("dry-run", &self.dry_run)?,
            verbose,
        };
        Ok(RunSettings {
            request,
            install_rclone: parse_bool("install-rclone", &self.install_rclone)?,
            rclone_version: if self.rclone_version.is_empty() {
                "latest".to_string()
            } else {
                self.rclone_version.clone()
            },
            rclone_binary: self.rclone_binary.clone(),
        })
    }
}
