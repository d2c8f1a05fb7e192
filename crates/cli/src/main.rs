//! evaljobs CLI
//!
//! Run an inspect eval as a remote job and publish its logs and results to a
//! dataset with a viewer Space.

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};

use evaljobs_application::services::Invocation;
use evaljobs_cli::commands::{self, CommandContext};
use evaljobs_cli::config::Config;
use evaljobs_cli::output::OutputFormat;
use evaljobs_cli::telemetry;
use evaljobs_domain::{
    ExportFormat, HardwareFlavor, JobTimeout, MultiModelPolicy, DEFAULT_TIMEOUT,
};

/// Output format for CLI commands
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum CliOutputFormat {
    /// JSON output
    Json,
    /// Table output
    Table,
    /// Plain text output
    Plain,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Table => OutputFormat::Table,
            CliOutputFormat::Plain => OutputFormat::Plain,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "evaljobs")]
#[command(author, version, about = "Run inspect evals as remote jobs and publish the results")]
#[command(long_about = "Run an inspect eval (local script, inspect_evals package or Space) as a \
    remote job against one or more models.\n\n\
    Logs, a tabular export and a status manifest are published to the dataset \
    <namespace>/<name>, with a viewer Space of the same name.\n\n\
    Requires HF_TOKEN.")]
#[command(propagate_version = true)]
#[command(subcommand_negates_reqs = true)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,

    /// Output format
    #[arg(short = 'o', long, global = true, value_enum)]
    format: Option<CliOutputFormat>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Eval to run: a script path, a package reference such as
    /// inspect_evals/gpqa_diamond, or a Space (spaces/<ns>/<name> or URL)
    #[arg(value_name = "EVAL", required = true)]
    eval: Option<String>,

    /// Model(s) to evaluate, comma separated
    #[arg(short, long, value_name = "MODEL[,MODEL...]", required = true)]
    model: Option<String>,

    /// Name of the results dataset and viewer Space
    #[arg(short, long, alias = "space", required = true)]
    name: Option<String>,

    /// Namespace owning the dataset, Space and job (defaults to the token's account)
    #[arg(long)]
    namespace: Option<String>,

    /// Hardware flavor of the job
    #[arg(long, default_value = "cpu-basic")]
    flavor: HardwareFlavor,

    /// Job timeout, e.g. 90m, 2h or a number of seconds
    #[arg(long, default_value = DEFAULT_TIMEOUT)]
    timeout: JobTimeout,

    /// Maximum number of samples to evaluate
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    limit: Option<u32>,

    /// How several models are run: eval-set (one job) or per-model (one job each)
    #[arg(long = "multi-model", value_name = "POLICY")]
    multi_model: Option<MultiModelPolicy>,

    /// Tabular export published next to the logs: csv, jsonl or none
    #[arg(long, value_name = "FORMAT")]
    export: Option<ExportFormat>,

    /// Return after submission instead of waiting for the job
    #[arg(long)]
    detach: bool,

    /// Create the dataset and Space as private repositories
    #[arg(long)]
    private: bool,

    /// Extra arguments passed to inspect, after `--`
    #[arg(last = true, value_name = "INSPECT_ARGS")]
    extra_args: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the stage of a job
    Status {
        /// Job ID
        #[arg(value_name = "JOB_ID")]
        job_id: String,

        /// Namespace owning the job
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Print the console output of a job
    Logs {
        /// Job ID
        #[arg(value_name = "JOB_ID")]
        job_id: String,

        /// Namespace owning the job
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Wait for a detached job and publish its results
    Collect {
        /// Job ID
        #[arg(value_name = "JOB_ID")]
        job_id: String,

        /// Name of the results dataset
        #[arg(short, long, alias = "space")]
        name: String,

        /// Namespace owning the dataset and the job
        #[arg(long)]
        namespace: Option<String>,

        /// Tabular export: csv, jsonl or none
        #[arg(long, value_name = "FORMAT")]
        export: Option<ExportFormat>,

        /// How long to wait for an unfinished job
        #[arg(long, default_value = DEFAULT_TIMEOUT)]
        wait: JobTimeout,
    },

    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Reset configuration to defaults
    Reset,
    /// Print the configuration file path
    Path,
}

impl RunArgs {
    fn into_invocation(self, config: &Config) -> Invocation {
        let mut invocation = Invocation::new(
            self.eval.unwrap_or_default(),
            self.model.unwrap_or_default(),
            self.name.unwrap_or_default(),
        );
        invocation.namespace = self.namespace;
        invocation.flavor = self.flavor;
        invocation.timeout = self.timeout;
        invocation.limit = self.limit;
        invocation.extra_args = self.extra_args;
        invocation.policy = self.multi_model.unwrap_or(config.multi_model);
        invocation.detach = self.detach;
        invocation
    }
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "evaljobs", &mut std::io::stdout());
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle completions command early (doesn't need config)
    if let Some(Commands::Completions { shell }) = cli.command {
        generate_completions(shell);
        return Ok(());
    }

    let verbose = cli.verbose;
    if let Err(e) = execute(cli).await {
        use colored::Colorize;
        eprintln!("{} {}", "Error:".red().bold(), e);
        if verbose {
            eprintln!("\n{}", "Details:".dimmed());
            eprintln!("{:?}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn execute(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if cli.no_color {
        config.colored = false;
    }
    if !config.colored {
        colored::control::set_override(false);
    }

    telemetry::init_tracing(cli.json_logs, telemetry::default_level(cli.verbose, config.debug))?;

    let format = cli.format.map(OutputFormat::from).unwrap_or(config.output_format);
    let token = std::env::var("HF_TOKEN").ok();

    match cli.command {
        None => {
            let export = cli.run.export.unwrap_or(config.export_format);
            let private = cli.run.private;
            let invocation = cli.run.into_invocation(&config);
            let ctx = CommandContext::new(config, format, token)?;
            commands::run::run(&ctx, invocation, export, private).await
        }

        Some(Commands::Status { job_id, namespace }) => {
            let ctx = CommandContext::new(config, format, token)?;
            commands::status::status(&ctx, job_id, namespace).await
        }

        Some(Commands::Logs { job_id, namespace }) => {
            let ctx = CommandContext::new(config, format, token)?;
            commands::logs::logs(&ctx, job_id, namespace).await
        }

        Some(Commands::Collect {
            job_id,
            name,
            namespace,
            export,
            wait,
        }) => {
            let export = export.unwrap_or(config.export_format);
            let ctx = CommandContext::new(config, format, token)?;
            commands::collect::collect(&ctx, job_id, name, namespace, export, wait).await
        }

        Some(Commands::Config { command }) => match command {
            Some(ConfigCommands::Show) | None => commands::config::show(&config, format),
            Some(ConfigCommands::Get { key }) => commands::config::get(&config, &key),
            Some(ConfigCommands::Set { key, value }) => commands::config::set(&key, &value),
            Some(ConfigCommands::Reset) => commands::config::reset(),
            Some(ConfigCommands::Path) => commands::config::path(),
        },

        // Already handled in main
        Some(Commands::Completions { .. }) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("evaljobs").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_arguments() {
        let cli = parse(&[
            "inspect_evals/gpqa_diamond",
            "--model",
            "openai/gpt-4o,anthropic/claude-sonnet-4-0",
            "--space",
            "gpqa",
            "--flavor",
            "a10g-small",
            "--timeout",
            "2h",
            "--limit",
            "10",
            "--multi-model",
            "per-model",
            "--",
            "--epochs",
            "3",
        ])
        .unwrap();

        assert!(cli.command.is_none());
        let invocation = cli.run.into_invocation(&Config::default());
        assert_eq!(invocation.reference, "inspect_evals/gpqa_diamond");
        assert_eq!(invocation.name, "gpqa");
        assert_eq!(invocation.flavor, HardwareFlavor::A10gSmall);
        assert_eq!(invocation.timeout.as_secs(), 7200);
        assert_eq!(invocation.limit, Some(10));
        assert_eq!(invocation.policy, MultiModelPolicy::PerModel);
        assert_eq!(invocation.extra_args, vec!["--epochs", "3"]);
    }

    #[test]
    fn test_run_defaults() {
        let cli = parse(&["eval.py", "-m", "openai/gpt-4o", "-n", "run"]).unwrap();
        assert_eq!(cli.run.export, None);
        let invocation = cli.run.into_invocation(&Config::default());
        assert_eq!(invocation.flavor, HardwareFlavor::CpuBasic);
        assert!(invocation.timeout.is_default());
        assert_eq!(invocation.policy, MultiModelPolicy::EvalSet);
        assert!(!invocation.detach);
        assert!(invocation.extra_args.is_empty());
    }

    #[test]
    fn test_run_requires_model_and_name() {
        assert!(parse(&["eval.py", "--name", "run"]).is_err());
        assert!(parse(&["eval.py", "--model", "openai/gpt-4o"]).is_err());
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let base = ["eval.py", "-m", "openai/gpt-4o", "-n", "run"];
        for extra in [
            ["--limit", "0"],
            ["--flavor", "tpu-v5"],
            ["--timeout", "soon"],
            ["--export", "parquet"],
        ] {
            let args: Vec<&str> = base.iter().chain(extra.iter()).copied().collect();
            assert!(parse(&args).is_err(), "{:?} accepted", extra);
        }
    }

    #[test]
    fn test_subcommands_do_not_need_run_arguments() {
        let cli = parse(&["status", "68a1", "--namespace", "alice", "-o", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Status { ref job_id, .. }) if job_id == "68a1"
        ));
        assert!(matches!(cli.format, Some(CliOutputFormat::Json)));

        let cli = parse(&["collect", "68a1", "--space", "gpqa", "--export", "none"]).unwrap();
        match cli.command {
            Some(Commands::Collect { name, export, .. }) => {
                assert_eq!(name, "gpqa");
                assert_eq!(export, Some(ExportFormat::None));
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(parse(&["config", "path"]).is_ok());
        assert!(parse(&["completions", "bash"]).is_ok());
    }
}
