// version information reported by the external rclone binary

use std::sync::LazyLock;

static BANNER_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"rclone\s+(v[\d.]+)").unwrap());

/// Version of an installed rclone binary
///
/// Holds the tag exactly as rclone prints it, including the leading `v`
/// (e.g. "v1.68.2").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolVersion(String);

impl ToolVersion {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Extract the version from `rclone version` output
    ///
    /// Returns `None` when the output has no recognizable version line.
    ///
    /// # Examples
    ///
    /// ```
    /// use common::version::ToolVersion;
    ///
    /// let banner = "rclone v1.68.2\n- os/version: ubuntu 24.04 (64 bit)\n";
    /// assert_eq!(ToolVersion::from_banner(banner).unwrap().as_str(), "v1.68.2");
    /// assert!(ToolVersion::from_banner("command not found").is_none());
    /// ```
    pub fn from_banner(output: &str) -> Option<Self> {
        BANNER_RE
            .captures(output)
            .and_then(|captures| captures.get(1))
            .map(|tag| Self(tag.as_str().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
