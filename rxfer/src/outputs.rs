//! Step outputs (`key=value` lines appended to the output file)

use anyhow::Context;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

pub const RCLONE_VERSION: &str = "rcloneVersion";
pub const TRANSFERRED_FILES: &str = "transferredFiles";
pub const SUCCESS: &str = "success";

/// Destination for step outputs; without a file outputs are only logged
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    file: Option<PathBuf>,
}

impl Outputs {
    pub fn new(file: Option<PathBuf>) -> Self {
        Self { file }
    }

    pub async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        tracing::debug!("output {}={}", key, value);
        let Some(path) = &self.file else {
            return Ok(());
        };
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("failed to open output file {}", path.display()))?;
        file.write_all(format!("{key}={value}\n").as_bytes())
            .await
            .with_context(|| format!("failed to write output {key} to {}", path.display()))?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn outputs_are_appended() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("github_output");
        std::fs::write(&path, "previous=1\n").unwrap();
        let outputs = Outputs::new(Some(path.clone()));
        outputs.set(RCLONE_VERSION, "v1.68.2").await.unwrap();
        outputs.set(TRANSFERRED_FILES, "7").await.unwrap();
        outputs.set(SUCCESS, "true").await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "previous=1\nrcloneVersion=v1.68.2\ntransferredFiles=7\nsuccess=true\n"
        );
    }

    #[tokio::test]
    async fn no_file_is_a_noop() {
        Outputs::default().set(SUCCESS, "false").await.unwrap();
    }
}
