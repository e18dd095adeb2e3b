//! Download and unpack an rclone release
//!
//! Releases come from `downloads.rclone.org` as zip archives containing a
//! single `rclone-<version>-<os>-<arch>/` directory. `latest` is first
//! resolved to a concrete tag through the GitHub releases API (except on
//! Windows, which downloads the `rclone-current` archive directly). Archives
//! are unpacked into a per-version directory under the user cache
//! (`$XDG_CACHE_HOME/rxfer` or `~/.cache/rxfer`); tagged versions already
//! present there are reused.

use anyhow::Context;
use std::path::{Path, PathBuf};

pub const DOWNLOAD_BASE: &str = "https://downloads.rclone.org";
pub const LATEST_RELEASE_API: &str = "https://api.github.com/repos/rclone/rclone/releases/latest";

const USER_AGENT: &str = concat!("rxfer/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported platform: {0}. rclone install supports linux, macos and windows.")]
pub struct UnsupportedPlatform(pub String);

/// Operating system and architecture as named in rclone release archives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: &'static str,
    pub arch: &'static str,
}

impl Platform {
    /// Map Rust target names (`std::env::consts`) to rclone's naming
    pub fn from_target(os: &str, arch: &str) -> Result<Self, UnsupportedPlatform> {
        let os = match os {
            "linux" => "linux",
            "macos" => "osx",
            "windows" => "windows",
            other => return Err(UnsupportedPlatform(other.to_string())),
        };
        let arch = match arch {
            "aarch64" => "arm64",
            _ => "amd64",
        };
        Ok(Self { os, arch })
    }

    pub fn current() -> Result<Self, UnsupportedPlatform> {
        Self::from_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn binary_name(&self) -> &'static str {
        if self.os == "windows" {
            "rclone.exe"
        } else {
            "rclone"
        }
    }
}

/// Release a download refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// Moving `rclone-current` archive, only used for `latest` on Windows
    Current,
    /// Tag with a leading `v`, e.g. `v1.68.2`
    Tagged(String),
}

impl Release {
    fn cache_key(&self) -> &str {
        match self {
            Release::Current => "current",
            Release::Tagged(tag) => tag,
        }
    }
}

/// Tag for a requested version, `None` when `latest` (or nothing) was asked for
pub fn pinned_tag(version: &str) -> Option<String> {
    let version = version.trim();
    if version.is_empty() || version.eq_ignore_ascii_case("latest") {
        None
    } else if version.starts_with('v') {
        Some(version.to_string())
    } else {
        Some(format!("v{version}"))
    }
}

/// Extract `tag_name` from a GitHub "latest release" response
pub fn parse_latest_tag(body: &str) -> anyhow::Result<String> {
    let release: serde_json::Value =
        serde_json::from_str(body).context("Invalid response from GitHub releases API")?;
    release
        .get("tag_name")
        .and_then(serde_json::Value::as_str)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .context("Invalid response from GitHub releases API: missing tag_name")
}

pub fn download_url(release: &Release, platform: Platform) -> String {
    match release {
        Release::Current => format!(
            "{DOWNLOAD_BASE}/rclone-current-{}-{}.zip",
            platform.os, platform.arch
        ),
        Release::Tagged(tag) => format!(
            "{DOWNLOAD_BASE}/{tag}/rclone-{tag}-{}-{}.zip",
            platform.os, platform.arch
        ),
    }
}

/// Root of the download cache, from `XDG_CACHE_HOME` or `HOME`
pub fn cache_root(env: impl Fn(&str) -> Option<String>) -> anyhow::Result<PathBuf> {
    if let Some(xdg) = env("XDG_CACHE_HOME").filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(xdg).join("rxfer"));
    }
    let home = env("HOME")
        .filter(|dir| !dir.is_empty())
        .context("cannot locate a cache directory: neither XDG_CACHE_HOME nor HOME is set")?;
    Ok(PathBuf::from(home).join(".cache").join("rxfer"))
}

/// Look for `name` in `dir` or one directory below it
pub fn find_binary(dir: &Path, name: &str) -> Option<PathBuf> {
    let direct = dir.join(name);
    if direct.is_file() {
        return Some(direct);
    }
    let mut nested: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path().join(name))
        .filter(|candidate| candidate.is_file())
        .collect();
    nested.sort();
    nested.pop()
}

/// Unpack a zip archive held in memory into `dir`
pub fn unpack(archive: &[u8], dir: &Path) -> anyhow::Result<()> {
    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(archive))
        .context("downloaded rclone archive is not a valid zip file")?;
    zip.extract(dir)
        .with_context(|| format!("failed to unpack rclone archive into {}", dir.display()))
}

async fn resolve_release(
    client: &reqwest::Client,
    version: &str,
    platform: Platform,
    logger: &common::Logger,
) -> anyhow::Result<Release> {
    if let Some(tag) = pinned_tag(version) {
        return Ok(Release::Tagged(tag));
    }
    if platform.os == "windows" {
        return Ok(Release::Current);
    }
    logger.info("Resolving latest rclone version from GitHub...");
    let response = client
        .get(LATEST_RELEASE_API)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .send()
        .await
        .context("Failed to resolve latest rclone version")?;
    if !response.status().is_success() {
        anyhow::bail!(
            "Failed to resolve latest rclone version: {}",
            response.status()
        );
    }
    let body = response
        .text()
        .await
        .context("Failed to resolve latest rclone version")?;
    let tag = parse_latest_tag(&body)?;
    logger.debug(&format!("Latest rclone version: {tag}"));
    Ok(Release::Tagged(tag))
}

async fn download(client: &reqwest::Client, url: &str) -> anyhow::Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to download {url}"))?;
    if !response.status().is_success() {
        anyhow::bail!("failed to download {}: {}", url, response.status());
    }
    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("failed to download {url}"))?;
    Ok(bytes.to_vec())
}

/// Install the requested rclone release and return the path to its binary
pub async fn install(version: &str, logger: &common::Logger) -> anyhow::Result<PathBuf> {
    let platform = Platform::current()?;
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build HTTP client")?;
    let release = resolve_release(&client, version, platform, logger).await?;
    let target_dir = cache_root(|key| std::env::var(key).ok())?.join(release.cache_key());
    if matches!(release, Release::Tagged(_))
        && let Some(cached) = find_binary(&target_dir, platform.binary_name())
    {
        logger.info(&format!("Using cached rclone at {}", cached.display()));
        return Ok(cached);
    }
    // a leftover (partial or outdated) unpack must not be picked up below
    if tokio::fs::try_exists(&target_dir).await.unwrap_or(false) {
        tokio::fs::remove_dir_all(&target_dir)
            .await
            .with_context(|| format!("failed to clear {}", target_dir.display()))?;
    }
    tokio::fs::create_dir_all(&target_dir)
        .await
        .with_context(|| format!("failed to create {}", target_dir.display()))?;
    let url = download_url(&release, platform);
    logger.info(&format!(
        "Downloading rclone {} from {}...",
        release.cache_key(),
        url
    ));
    let archive = download(&client, &url).await?;
    logger.debug(&format!("downloaded {} bytes", archive.len()));
    let unpack_dir = target_dir.clone();
    tokio::task::spawn_blocking(move || unpack(&archive, &unpack_dir))
        .await
        .context("rclone unpack task failed")??;
    let binary = find_binary(&target_dir, platform.binary_name()).with_context(|| {
        format!(
            "rclone archive did not contain {} under {}",
            platform.binary_name(),
            target_dir.display()
        )
    })?;
    make_executable(&binary).await?;
    logger.debug(&format!("rclone unpacked to {}", binary.display()));
    Ok(binary)
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("failed reading metadata of {}", path.display()))?
        .permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    tokio::fs::set_permissions(path, permissions)
        .await
        .with_context(|| format!("failed to mark {} executable", path.display()))
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
