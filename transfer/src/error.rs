use std::path::PathBuf;

/// Errors raised by the transfer engine
///
/// Only [`Error::Obscure`] and [`Error::ConfigFile`] abort a run. Launch and
/// capture failures during a transfer become failed outcomes for that source.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to obscure remote password: {0}")]
    Obscure(String),

    #[error("failed to write temporary rclone config: {0}")]
    ConfigFile(#[source] std::io::Error),

    #[error("failed to launch {}: {source}", program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to capture output of {}: {source}", program.display())]
    Capture {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
