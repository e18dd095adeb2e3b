use anyhow::Result;
use clap::Parser;
use rxfer::outputs::{self, Outputs};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rxfer",
    version,
    about = "Transfer files and folders to any rclone backend - sync or copy, one rclone run per source",
    long_about = "`rxfer` transfers local files and folders to a remote reachable through rclone.

Each source is transferred with its own rclone invocation and reported separately. A source
that fails does not stop the remaining ones; the tool exits with an error if any of them failed.

Every option can also be provided through the INPUT_<NAME> environment variable a GitHub
Actions runner sets for step inputs (e.g. INPUT_SOURCES, INPUT_REMOTE-TYPE).

EXAMPLES:
    # Sync the contents of dist/ to an SFTP server
    rxfer --sources dist/ --remote-type sftp --remote-host example.com \\
          --remote-user deploy --remote-pass \"$PASS\" --remote-path /var/www

    # Copy with an existing rclone config
    rxfer --sources 'build/,CHANGELOG.md' --mode copy --rclone-config-file ~/.config/rclone/rclone.conf"
)]
struct Args {
    #[command(flatten)]
    inputs: rxfer::inputs::Inputs,

    // Progress & output
    /// Quiet mode, only report errors
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,

    /// Emit GitHub Actions workflow commands (log groups, annotations, secret masks)
    #[arg(long, env = "GITHUB_ACTIONS", help_heading = "Progress & output")]
    github_actions: bool,

    /// File that step outputs are appended to as `key=value` lines
    #[arg(long, env = "GITHUB_OUTPUT", value_name = "PATH", help_heading = "Progress & output")]
    output_file: Option<std::path::PathBuf>,

    // Advanced settings
    /// Number of worker threads, 0 means number of cores
    #[arg(
        long,
        default_value = "0",
        value_name = "N",
        help_heading = "Advanced settings"
    )]
    max_workers: usize,
}

async fn async_main(mut args: Args, logger: common::Logger) -> Result<transfer::RunReport> {
    args.inputs.load_config_file().await?;
    let settings = args
        .inputs
        .validate(&logger, |key| std::env::var(key).ok())?;
    logger.debug("Parsed inputs successfully.");
    let outputs = Outputs::new(args.output_file.clone());
    let tool = logger
        .group(
            "Ensure rclone",
            provision::ensure_available(
                &settings.rclone_binary,
                settings.install_rclone,
                &settings.rclone_version,
                &logger,
            ),
        )
        .await?;
    outputs
        .set(outputs::RCLONE_VERSION, tool.version.as_str())
        .await?;
    let orchestrator =
        transfer::Orchestrator::new(transfer::ProcessExecutor, tool.program.clone(), &logger);
    let results = logger
        .group("Transfer files", orchestrator.run(&settings.request))
        .await?;
    let report = transfer::RunReport::new(results);
    outputs
        .set(outputs::TRANSFERRED_FILES, &report.total_files().to_string())
        .await?;
    outputs
        .set(outputs::SUCCESS, &report.all_succeeded().to_string())
        .await?;
    if let Some(summary) = report.failure_summary() {
        anyhow::bail!(summary);
    }
    logger.info(&report.to_string());
    Ok(report)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.inputs.verbose_requested(|key| std::env::var(key).ok()),
        github_actions: args.github_actions,
    };
    let runtime = common::RuntimeConfig {
        max_workers: args.max_workers,
    };
    let logger = common::Logger::from_output(&output);
    let func = {
        let args = args.clone();
        || async_main(args, logger)
    };
    let res = common::run(output, runtime, func);
    if res.is_none() {
        std::process::exit(1);
    }
    Ok(())
}
