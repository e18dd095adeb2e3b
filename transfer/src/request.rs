//! Validated description of a transfer run and its per-source results

/// rclone subcommand used for every source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransferMode {
    /// Make the destination identical to the source, deleting extra remote files
    #[default]
    Sync,
    /// Copy new and changed files, never delete
    Copy,
}

impl TransferMode {
    pub const ALL: [TransferMode; 2] = [TransferMode::Sync, TransferMode::Copy];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferMode::Sync => "sync",
            TransferMode::Copy => "copy",
        }
    }
}

impl std::fmt::Display for TransferMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transfer mode '{0}'")]
pub struct UnknownMode(pub String);

impl std::str::FromStr for TransferMode {
    type Err = UnknownMode;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransferMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Connection parameters used when no raw rclone config is supplied
///
/// Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSpec {
    /// rclone backend type, e.g. `sftp`, `webdav`, `local`
    pub kind: String,
    pub host: String,
    pub port: String,
    pub user: String,
    /// Plain-text password, obscured through rclone before use
    pub password: String,
    /// Base path on the remote that sources are transferred into
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferRequest {
    /// Local files or directories, processed in order
    ///
    /// A trailing separator on a directory transfers its contents instead of
    /// the directory itself.
    pub sources: Vec<String>,
    pub mode: TransferMode,
    /// Descend into subdirectories of directory sources
    pub recursive: bool,
    pub remote: RemoteSpec,
    /// Raw rclone config text; takes precedence over [`RemoteSpec`] when non-empty
    pub backend_config: Option<String>,
    /// Extra rclone flags, whitespace separated
    pub extra_flags: String,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub delete_excluded: bool,
    pub skip_certificate_check: bool,
    pub dry_run: bool,
    pub verbose: bool,
}

impl TransferRequest {
    /// Backend config text, if any non-empty text was supplied
    pub fn backend_config(&self) -> Option<&str> {
        self.backend_config
            .as_deref()
            .filter(|config| !config.is_empty())
    }
}

/// Result of transferring a single source
///
/// A source succeeded exactly when it carries no error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub source: String,
    pub files_transferred: u64,
    pub error: Option<String>,
}

impl TransferOutcome {
    pub fn succeeded(source: &str, files_transferred: u64) -> Self {
        Self {
            source: source.to_string(),
            files_transferred,
            error: None,
        }
    }

    pub fn failed(source: &str, files_transferred: u64, error: impl Into<String>) -> Self {
        Self {
            source: source.to_string(),
            files_transferred,
            error: Some(error.into()),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_lowercase_keywords_only() {
        assert_eq!("sync".parse::<TransferMode>(), Ok(TransferMode::Sync));
        assert_eq!("copy".parse::<TransferMode>(), Ok(TransferMode::Copy));
        assert_eq!(
            "move".parse::<TransferMode>(),
            Err(UnknownMode("move".to_string()))
        );
        assert!("Sync".parse::<TransferMode>().is_err());
    }

    #[test]
    fn empty_backend_config_counts_as_absent() {
        let mut request = TransferRequest {
            backend_config: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(request.backend_config(), None);
        request.backend_config = Some("[r]\ntype = local\n".to_string());
        assert_eq!(request.backend_config(), Some("[r]\ntype = local\n"));
    }

    #[test]
    fn outcome_success_tracks_error() {
        assert!(TransferOutcome::succeeded("dist/", 3).success());
        let failed = TransferOutcome::failed("dist/", 0, "boom");
        assert!(!failed.success());
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }
}
