//! Subprocess execution with captured output
//!
//! A non-zero exit status is a normal result the caller interprets; only a
//! failure to start the program (or to read its pipes) is an error.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::Error;

/// Exit status and captured output of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Process exit code, -1 when terminated by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

pub trait Executor {
    /// Run `program` with `args` to completion
    ///
    /// The child inherits this process' environment with `env` layered on
    /// top. Output is always captured; `echo` additionally streams it live to
    /// our own stdout/stderr.
    fn execute(
        &self,
        program: &Path,
        args: &[String],
        env: &BTreeMap<String, String>,
        echo: bool,
    ) -> impl Future<Output = Result<CommandOutput, Error>> + Send;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    async fn execute(
        &self,
        program: &Path,
        args: &[String],
        env: &BTreeMap<String, String>,
        echo: bool,
    ) -> Result<CommandOutput, Error> {
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .envs(env)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Launch {
                program: program.to_path_buf(),
                source,
            })?;
        let capture_error = |source: std::io::Error| Error::Capture {
            program: program.to_path_buf(),
            source,
        };
        let stdout = child.stdout.take().ok_or_else(|| {
            capture_error(std::io::Error::other("stdout pipe was not created"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            capture_error(std::io::Error::other("stderr pipe was not created"))
        })?;
        let (stdout, stderr, status) = tokio::try_join!(
            pump(stdout, echo.then(tokio::io::stdout)),
            pump(stderr, echo.then(tokio::io::stderr)),
            child.wait(),
        )
        .map_err(capture_error)?;
        Ok(CommandOutput {
            exit_code: status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

/// Read `reader` to the end, mirroring every chunk into `echo` if given
async fn pump<R, W>(mut reader: R, mut echo: Option<W>) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut captured = Vec::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = reader.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        if let Some(echo) = echo.as_mut() {
            echo.write_all(&buffer[..read]).await?;
            echo.flush().await?;
        }
        captured.extend_from_slice(&buffer[..read]);
    }
    Ok(captured)
}
