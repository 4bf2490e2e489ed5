//! AlertEval CLI
//!
//! Command-line interface for evaluating alert conditions.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use alerteval::adapters::{
    CachedDirectory, HttpExecutionEngine, JsonFileDashboardStore, StaticDataSourceDirectory,
};
use alerteval::prelude::*;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// AlertEval - evaluate alert conditions
#[derive(Parser)]
#[command(name = "alerteval")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "ALERTEVAL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (for commands that support it)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
    Table,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the condition stored on a dashboard panel
    Eval {
        /// JSON file holding the dashboards
        #[arg(long, env = "ALERTEVAL_DASHBOARDS")]
        dashboards: PathBuf,

        /// Dashboard id
        #[arg(long)]
        dashboard_id: i64,

        /// Panel id
        #[arg(long)]
        panel_id: i64,

        /// Ref id of the query or expression holding the condition
        #[arg(long)]
        condition: String,

        /// Range start (now, now-<duration> or epoch ms)
        #[arg(long, default_value = "now-5m")]
        from: String,

        /// Range end (now, now-<duration> or epoch ms)
        #[arg(long, default_value = "now")]
        to: String,

        /// Bypass the data source cache
        #[arg(long)]
        skip_cache: bool,

        /// Engine timeout, e.g. "10s" (defaults to engine.timeout)
        #[arg(long)]
        timeout: Option<humantime::Duration>,

        /// Alert definition id used in diagnostics
        #[arg(long, default_value = "0")]
        condition_id: i64,

        /// Organization of the caller
        #[arg(long, default_value = "1")]
        org_id: i64,

        /// Login of the caller
        #[arg(long, default_value = "admin")]
        login: String,
    },

    /// Print the effective configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    init_logging(&config, cli.verbose);

    // Execute command
    let result = match cli.command {
        Commands::Eval {
            dashboards,
            dashboard_id,
            panel_id,
            condition,
            from,
            to,
            skip_cache,
            timeout,
            condition_id,
            org_id,
            login,
        } => {
            let request = EvaluationRequest {
                dashboard_id,
                panel_id,
                condition_ref_id: condition,
                from,
                to,
                skip_cache,
            };
            let mut ctx = ExecutionContext::new(condition_id, Identity::new(0, org_id, login));
            if let Some(timeout) = timeout {
                ctx = ctx.with_timeout(timeout.into());
            }
            run_eval(config, dashboards, request, ctx, cli.format).await
        }
        Commands::Config => run_config(&config),
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config, verbose: bool) {
    let log_level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_eval(
    config: Config,
    dashboards: PathBuf,
    request: EvaluationRequest,
    ctx: ExecutionContext,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let store = Arc::new(JsonFileDashboardStore::new(&dashboards));
    let directory = Arc::new(CachedDirectory::new(
        StaticDataSourceDirectory::from_config(&config.datasources),
    ));
    let engine = Arc::new(HttpExecutionEngine::new(&config.engine)?);
    debug!(endpoint = %engine.endpoint(), dashboards = %dashboards.display(), "Wired collaborators");

    let alert_engine = AlertEngine::new(
        ConditionLoader::new(store, directory, config.eval.clone()),
        ConditionExecutor::new(engine, config.engine.clone()),
    );

    let cancel = ctx.cancel.clone();
    let ctrl_c = tokio::spawn(cancel_on_ctrl_c(cancel));

    info!(
        dashboard_id = request.dashboard_id,
        panel_id = request.panel_id,
        ref_id = %request.condition_ref_id,
        "Evaluating condition"
    );
    let evaluation = alert_engine.evaluate(&request, &ctx).await;
    ctrl_c.abort();
    let evaluation = evaluation?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
        }
        OutputFormat::Text => {
            for result in &evaluation.results {
                println!("{} {}", result.state, display_labels(&result.instance));
            }
            println!(
                "{} instance(s), {} alerting",
                evaluation.results.len(),
                evaluation.results.alerting_count()
            );
        }
        OutputFormat::Table => print_table(&evaluation.results),
    }

    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Ctrl+C received, cancelling evaluation...");
        cancel.cancel();
    }
}

fn display_labels(labels: &Labels) -> String {
    if labels.is_empty() {
        "{}".to_string()
    } else {
        format!("{{{labels}}}")
    }
}

fn print_table(results: &Results) {
    let rows: Vec<(String, String)> = results
        .iter()
        .map(|r| (display_labels(&r.instance), r.state.to_string()))
        .collect();
    let width = rows
        .iter()
        .map(|(instance, _)| instance.len())
        .max()
        .unwrap_or(0)
        .max("INSTANCE".len());

    println!("{:<width$}  STATE", "INSTANCE");
    for (instance, state) in rows {
        println!("{instance:<width$}  {state}");
    }
}

fn run_config(config: &Config) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "alerteval", &mut io::stdout());
}
