//! Remote binding resolution
//!
//! A run talks to its remote either through a generated rclone config file
//! (when raw config text is supplied) or through `RCLONE_CONFIG_REMOTE_*`
//! environment variables describing an on-the-fly remote named `remote`.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

use crate::executor::Executor;
use crate::request::{RemoteSpec, TransferRequest};
use crate::Error;

/// Remote name used by the environment binding and by config files without a section header
pub const DEFAULT_REMOTE_NAME: &str = "remote";

const ENV_PREFIX: &str = "RCLONE_CONFIG_REMOTE_";

/// Backends that take the server address as `url` rather than `host`
const URL_BACKENDS: [&str; 3] = ["webdav", "http", "swift"];

static SECTION_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?m)^\[([^\]]+)\]").unwrap());

/// Where and how rclone connects for this run
#[derive(Debug)]
pub enum RemoteBinding {
    /// Generated config file passed with `--config`
    ///
    /// The file is removed by [`RemoteBinding::release`], or on drop if the
    /// binding is abandoned.
    ConfigFile {
        path: tempfile::TempPath,
        remote_name: String,
    },
    /// Remote defined entirely through environment variables
    Environment { vars: BTreeMap<String, String> },
}

impl RemoteBinding {
    pub fn remote_name(&self) -> &str {
        match self {
            RemoteBinding::ConfigFile { remote_name, .. } => remote_name,
            RemoteBinding::Environment { .. } => DEFAULT_REMOTE_NAME,
        }
    }

    pub fn config_path(&self) -> Option<&Path> {
        match self {
            RemoteBinding::ConfigFile { path, .. } => Some(&**path),
            RemoteBinding::Environment { .. } => None,
        }
    }

    /// Environment additions for every rclone invocation of this run
    pub fn env(&self) -> BTreeMap<String, String> {
        match self {
            RemoteBinding::ConfigFile { .. } => BTreeMap::new(),
            RemoteBinding::Environment { vars } => vars.clone(),
        }
    }

    /// Delete the generated config file, if any
    ///
    /// Failure only produces a warning: by the time the binding is released
    /// the transfers themselves have already finished.
    pub fn release(self, logger: &common::Logger) {
        if let RemoteBinding::ConfigFile { path, .. } = self {
            match path.close() {
                Ok(()) => logger.debug("Cleaned up temp rclone config."),
                Err(error) => logger.warn(&format!(
                    "Failed to clean up temp rclone config file: {error}"
                )),
            }
        }
    }
}

/// Name of the first `[section]` in rclone config text, `remote` if there is none
pub fn parse_remote_name(config: &str) -> String {
    SECTION_RE
        .captures(config)
        .and_then(|captures| captures.get(1))
        .map_or_else(|| DEFAULT_REMOTE_NAME.to_string(), |name| name.as_str().to_string())
}

/// Write config text to a process-private temporary file (mode 0600 on unix)
pub fn write_config(config: &str) -> Result<tempfile::TempPath, Error> {
    let mut file = tempfile::Builder::new()
        .prefix("rclone-")
        .suffix(".conf")
        .tempfile()
        .map_err(Error::ConfigFile)?;
    file.write_all(config.as_bytes())
        .and_then(|()| file.flush())
        .map_err(Error::ConfigFile)?;
    Ok(file.into_temp_path())
}

/// Environment variables describing `remote`, using an already obscured password
pub fn env_vars(remote: &RemoteSpec, obscured_password: Option<&str>) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    let mut set = |key: &str, value: &str| {
        vars.insert(format!("{ENV_PREFIX}{key}"), value.to_string());
    };
    // type is always set, an empty one is reported by rclone itself
    set("TYPE", &remote.kind);
    if !remote.host.is_empty() {
        if URL_BACKENDS.contains(&remote.kind.as_str()) {
            set("URL", &remote.host);
        } else {
            set("HOST", &remote.host);
        }
    }
    if !remote.port.is_empty() {
        set("PORT", &remote.port);
    }
    if !remote.user.is_empty() {
        set("USER", &remote.user);
    }
    if let Some(password) = obscured_password.filter(|password| !password.is_empty()) {
        set("PASS", password);
    }
    vars
}

/// Encode `password` with `rclone obscure`
///
/// Any failure is fatal for the run: transfers must not start with a
/// password rclone cannot decode.
pub async fn obscure<E: Executor>(
    executor: &E,
    program: &Path,
    password: &str,
) -> Result<String, Error> {
    let args = vec!["obscure".to_string(), password.to_string()];
    let output = executor
        .execute(program, &args, &BTreeMap::new(), false)
        .await
        .map_err(|error| Error::Obscure(error.to_string()))?;
    if !output.success() {
        let stderr = output.stderr.trim();
        return Err(Error::Obscure(if stderr.is_empty() {
            format!("rclone obscure exited with code {}", output.exit_code)
        } else {
            stderr.to_string()
        }));
    }
    Ok(output.stdout.trim().to_string())
}

/// Build the remote binding for `request`
///
/// Raw config text wins over the individual remote fields whenever it is
/// non-empty.
pub async fn resolve<E: Executor>(
    request: &TransferRequest,
    executor: &E,
    program: &Path,
    logger: &common::Logger,
) -> Result<RemoteBinding, Error> {
    if let Some(config) = request.backend_config() {
        let path = write_config(config)?;
        let remote_name = parse_remote_name(config);
        logger.debug(&format!(
            "Using custom rclone config, remote name: {remote_name}"
        ));
        return Ok(RemoteBinding::ConfigFile { path, remote_name });
    }
    let obscured = if request.remote.password.is_empty() {
        None
    } else {
        logger.debug("Obscuring remote password...");
        Some(obscure(executor, program, &request.remote.password).await?)
    };
    logger.mask(obscured.as_deref().unwrap_or_default());
    let vars = env_vars(&request.remote, obscured.as_deref());
    logger.debug(&format!(
        "Configured remote type: {}",
        request.remote.kind
    ));
    Ok(RemoteBinding::Environment { vars })
}
