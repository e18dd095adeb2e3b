//! Sequential per-source transfer driver
//!
//! The remote binding is resolved once per run and released once after the
//! last source, whatever happened to the individual sources. A failing source
//! never stops the sources after it.

use std::path::PathBuf;

use crate::binding::{self, RemoteBinding};
use crate::executor::Executor;
use crate::planner;
use crate::request::{TransferOutcome, TransferRequest};
use crate::stats;
use crate::Error;

pub struct Orchestrator<'a, E> {
    executor: E,
    program: PathBuf,
    logger: &'a common::Logger,
}

impl<'a, E: Executor> Orchestrator<'a, E> {
    /// `program` is the rclone binary, either a bare name looked up on `PATH` or a path
    pub fn new(executor: E, program: impl Into<PathBuf>, logger: &'a common::Logger) -> Self {
        Self {
            executor,
            program: program.into(),
            logger,
        }
    }

    /// Transfer every source of `request`, returning one outcome per source in order
    ///
    /// Only resolving the remote binding can fail the whole run.
    pub async fn run(&self, request: &TransferRequest) -> Result<Vec<TransferOutcome>, Error> {
        let binding =
            binding::resolve(request, &self.executor, &self.program, self.logger).await?;
        let mut outcomes = Vec::with_capacity(request.sources.len());
        for source in &request.sources {
            outcomes.push(self.transfer_source(source, &binding, request).await);
        }
        binding.release(self.logger);
        Ok(outcomes)
    }

    #[tracing::instrument(skip(self, binding, request))]
    async fn transfer_source(
        &self,
        source: &str,
        binding: &RemoteBinding,
        request: &TransferRequest,
    ) -> TransferOutcome {
        let plan = match planner::plan(source, binding, request).await {
            Ok(plan) => plan,
            Err(error) => {
                let message = error.to_string();
                self.logger
                    .error(&format!("Transfer failed for {source}: {message}"));
                return TransferOutcome::failed(source, 0, message);
            }
        };
        self.logger.info(&format!(
            "Transferring: {} -> {} (mode: {})",
            source, plan.destination, request.mode
        ));
        self.logger.debug(&format!(
            "{} {}",
            self.program.display(),
            plan.args.join(" ")
        ));
        let output = match self
            .executor
            .execute(&self.program, &plan.args, &binding.env(), request.verbose)
            .await
        {
            Ok(output) => output,
            Err(error) => {
                let message = error.to_string();
                self.logger
                    .error(&format!("Transfer error for {source}: {message}"));
                return TransferOutcome::failed(source, 0, message);
            }
        };
        let transferred = stats::parse_transferred(&format!("{}{}", output.stdout, output.stderr));
        if !output.success() {
            let stderr = output.stderr.trim();
            let message = if stderr.is_empty() {
                format!("rclone exited with code {}", output.exit_code)
            } else {
                stderr.to_string()
            };
            self.logger
                .error(&format!("Transfer failed for {source}: {message}"));
            return TransferOutcome::failed(source, transferred, message);
        }
        self.logger.info(&format!(
            "Transfer complete: {source} ({transferred} files)"
        ));
        TransferOutcome::succeeded(source, transferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CommandOutput;
    use crate::request::RemoteSpec;
    use std::collections::{BTreeMap, VecDeque};
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    struct Call {
        args: Vec<String>,
        env: BTreeMap<String, String>,
        echo: bool,
    }

    /// Plays back scripted replies and records every invocation
    #[derive(Default)]
    struct ScriptedExecutor {
        replies: Mutex<VecDeque<Result<CommandOutput, String>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl ScriptedExecutor {
        fn with_replies(replies: Vec<Result<CommandOutput, String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(vec![]),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Executor for &ScriptedExecutor {
        async fn execute(
            &self,
            program: &Path,
            args: &[String],
            env: &BTreeMap<String, String>,
            echo: bool,
        ) -> Result<CommandOutput, Error> {
            self.calls.lock().unwrap().push(Call {
                args: args.to_vec(),
                env: env.clone(),
                echo,
            });
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(exit(0, "")));
            reply.map_err(|message| Error::Launch {
                program: program.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, message),
            })
        }
    }

    fn exit(code: i32, stderr: &str) -> CommandOutput {
        CommandOutput {
            exit_code: code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    struct Fixture {
        _tmp: tempfile::TempDir,
        file: String,
        dir: String,
    }

    fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("test-file.txt");
        std::fs::write(&file, "hello world").unwrap();
        let dir = tmp.path().join("test-dir");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("inner.txt"), "inner content").unwrap();
        Fixture {
            file: file.to_string_lossy().into_owned(),
            dir: dir.to_string_lossy().into_owned(),
            _tmp: tmp,
        }
    }

    fn request(sources: Vec<String>) -> TransferRequest {
        TransferRequest {
            sources,
            recursive: true,
            remote: RemoteSpec {
                kind: "local".to_string(),
                path: "/tmp/rclone-test-dest".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn one_outcome_per_source_in_order() {
        let fx = fixture();
        let executor = ScriptedExecutor::with_replies(vec![
            Ok(exit(0, "Transferred: 1 / 1, 100%\n")),
            Ok(exit(0, "Transferred: 1 / 1, 100%\n")),
        ]);
        let logger = common::Logger::default();
        let orchestrator = Orchestrator::new(&executor, "rclone", &logger);
        let sources = vec![
            fx.dir.clone(),
            "/nonexistent/path.txt".to_string(),
            fx.file.clone(),
        ];
        let outcomes = orchestrator.run(&request(sources.clone())).await.unwrap();
        assert_eq!(outcomes.len(), 3);
        let order: Vec<_> = outcomes.iter().map(|o| o.source.clone()).collect();
        assert_eq!(order, sources);
        assert!(outcomes[0].success());
        assert!(!outcomes[1].success());
        assert!(outcomes[2].success());
        // the missing source never reaches rclone
        assert_eq!(executor.calls().len(), 2);
    }

    #[tokio::test]
    async fn missing_source_reports_resolved_path() {
        let logger = common::Logger::default();
        let executor = ScriptedExecutor::default();
        let orchestrator = Orchestrator::new(&executor, "rclone", &logger);
        let outcomes = orchestrator
            .run(&request(vec!["/nonexistent/path.txt".to_string()]))
            .await
            .unwrap();
        assert_eq!(outcomes[0].files_transferred, 0);
        let error = outcomes[0].error.as_deref().unwrap();
        assert!(error.contains("does not exist"));
        assert!(error.contains("/nonexistent/path.txt"));
    }

    #[tokio::test]
    async fn non_zero_exit_uses_stderr_or_exit_code() {
        let fx = fixture();
        let executor = ScriptedExecutor::with_replies(vec![
            Ok(exit(1, "  permission denied\n")),
            Ok(exit(7, "")),
        ]);
        let logger = common::Logger::default();
        let orchestrator = Orchestrator::new(&executor, "rclone", &logger);
        let outcomes = orchestrator
            .run(&request(vec![fx.file.clone(), fx.dir.clone()]))
            .await
            .unwrap();
        assert_eq!(outcomes[0].error.as_deref(), Some("permission denied"));
        assert_eq!(
            outcomes[1].error.as_deref(),
            Some("rclone exited with code 7")
        );
    }

    #[tokio::test]
    async fn launch_failure_is_per_source() {
        let fx = fixture();
        let executor = ScriptedExecutor::with_replies(vec![
            Err("rclone not found".to_string()),
            Ok(exit(0, "Transferred: 4 / 4\n")),
        ]);
        let logger = common::Logger::default();
        let orchestrator = Orchestrator::new(&executor, "rclone", &logger);
        let outcomes = orchestrator
            .run(&request(vec![fx.file.clone(), fx.dir.clone()]))
            .await
            .unwrap();
        assert!(!outcomes[0].success());
        assert_eq!(outcomes[0].files_transferred, 0);
        assert!(outcomes[0].error.as_deref().unwrap().contains("rclone not found"));
        assert!(outcomes[1].success());
        assert_eq!(outcomes[1].files_transferred, 4);
    }

    #[tokio::test]
    async fn stats_come_from_stdout_and_stderr() {
        let fx = fixture();
        let executor = ScriptedExecutor::with_replies(vec![Ok(CommandOutput {
            exit_code: 0,
            stdout: "Transferred: 2 / 10\n".to_string(),
            stderr: "Transferred: 10 / 10\n".to_string(),
        })]);
        let logger = common::Logger::default();
        let orchestrator = Orchestrator::new(&executor, "rclone", &logger);
        let outcomes = orchestrator
            .run(&request(vec![fx.dir.clone()]))
            .await
            .unwrap();
        assert_eq!(outcomes[0].files_transferred, 10);
    }

    #[tokio::test]
    async fn env_binding_is_passed_to_every_transfer() {
        let fx = fixture();
        let executor = ScriptedExecutor::default();
        let logger = common::Logger::default();
        let orchestrator = Orchestrator::new(&executor, "rclone", &logger);
        let mut request = request(vec![fx.file.clone(), fx.dir.clone()]);
        request.remote = RemoteSpec {
            kind: "sftp".to_string(),
            host: "example.com".to_string(),
            port: "2222".to_string(),
            user: "admin".to_string(),
            password: String::new(),
            path: "/srv".to_string(),
        };
        request.verbose = true;
        orchestrator.run(&request).await.unwrap();
        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        for call in &calls {
            assert_eq!(call.env["RCLONE_CONFIG_REMOTE_TYPE"], "sftp");
            assert_eq!(call.env["RCLONE_CONFIG_REMOTE_HOST"], "example.com");
            assert_eq!(call.env["RCLONE_CONFIG_REMOTE_PORT"], "2222");
            assert_eq!(call.env["RCLONE_CONFIG_REMOTE_USER"], "admin");
            assert!(call.echo);
        }
        assert!(calls[0].args.contains(&"remote:/srv".to_string()));
        assert!(calls[1].args.contains(&"remote:/srv/test-dir".to_string()));
    }

    #[tokio::test]
    async fn obscure_failure_aborts_before_any_transfer() {
        let fx = fixture();
        let executor = ScriptedExecutor::with_replies(vec![Ok(exit(1, "bad password"))]);
        let logger = common::Logger::default();
        let orchestrator = Orchestrator::new(&executor, "rclone", &logger);
        let mut request = request(vec![fx.file.clone(), fx.dir.clone()]);
        request.remote.password = "hunter2".to_string();
        let error = orchestrator.run(&request).await.unwrap_err();
        assert!(matches!(error, Error::Obscure(_)));
        assert_eq!(executor.calls().len(), 1);
        assert_eq!(executor.calls()[0].args[0], "obscure");
    }

    #[tokio::test]
    async fn config_file_is_removed_after_failures() {
        let fx = fixture();
        let executor = ScriptedExecutor::with_replies(vec![
            Ok(exit(1, "boom")),
            Ok(exit(1, "boom")),
        ]);
        let logger = common::Logger::default();
        let orchestrator = Orchestrator::new(&executor, "rclone", &logger);
        let mut request = request(vec![
            fx.file.clone(),
            "/nonexistent".to_string(),
            fx.dir.clone(),
        ]);
        request.backend_config = Some("[myremote]\ntype = local\n".to_string());
        let outcomes = orchestrator.run(&request).await.unwrap();
        assert!(outcomes.iter().all(|outcome| !outcome.success()));
        let calls = executor.calls();
        let mut configs = vec![];
        for call in &calls {
            assert!(call.env.is_empty());
            assert!(call.args.iter().any(|arg| arg.starts_with("myremote:")));
            let idx = call.args.iter().position(|arg| arg == "--config").unwrap();
            configs.push(PathBuf::from(&call.args[idx + 1]));
        }
        // one config file shared by the run, gone once it finished
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0], configs[1]);
        assert!(!configs[0].exists());
    }
}
