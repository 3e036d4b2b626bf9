//! todomvc-runner: runs the TodoMVC scenarios from the command line
//!
//! ## Usage
//!
//! ```bash
//! todomvc-runner list
//! todomvc-runner run                          # every scenario, simulated backend
//! todomvc-runner run filter --jobs 1          # scenarios whose name contains "filter"
//! todomvc-runner run --backend playwright --headed --base-url http://localhost:8080/
//! todomvc-runner run --json > report.json
//! ```
//!
//! Settings come from defaults, then `--config <file.toml>`, then `TODOMVC_*`
//! environment variables, then flags.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use todomvc_e2e::sim::{SimOptions, SimSessionFactory};
use todomvc_e2e::{BrowserKind, SessionFactory, SuiteConfig, SuiteReport, run_scenarios, scenarios};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "todomvc-runner", version, about = "Run the TodoMVC end-to-end scenarios")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the scenario catalogue
    List,
    /// Run scenarios
    Run(RunArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// In-process simulation of the application
    Sim,
    /// Real browser through Playwright
    Playwright,
}

#[derive(Args)]
struct RunArgs {
    /// Only run scenarios whose name contains one of these
    scenarios: Vec<String>,

    #[arg(long, value_enum, default_value_t = Backend::Sim)]
    backend: Backend,

    /// TOML file with suite settings
    #[arg(long, env = "TODOMVC_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    base_url: Option<String>,

    /// chromium, firefox or webkit
    #[arg(long)]
    browser: Option<BrowserKind>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Assertion timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Scenarios to run at the same time
    #[arg(long)]
    jobs: Option<usize>,

    /// Where failure snapshots are written
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,

    /// Print the report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::List => {
            for scenario in scenarios::catalogue() {
                println!("{:<28} {}", scenario.name, scenario.description);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Run(args) => run(args).await,
    }
}

fn load_config(args: &RunArgs) -> Result<SuiteConfig> {
    load_config_with(args, |key| std::env::var(key).ok())
}

// Layers file, environment (through `env`) and flags, in that order.
fn load_config_with<F>(args: &RunArgs, env: F) -> Result<SuiteConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config {
        Some(path) => SuiteConfig::from_toml_file(path)?,
        None => SuiteConfig::default(),
    };
    config
        .apply_env_from(env)
        .context("reading TODOMVC_* environment")?;

    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if let Some(browser) = args.browser {
        config.browser = browser;
    }
    if args.headed {
        config.headless = false;
    }
    if let Some(ms) = args.timeout_ms {
        config.assertion_timeout_ms = ms;
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if let Some(dir) = &args.artifacts_dir {
        config.artifacts_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn open_factory(backend: Backend, config: &SuiteConfig) -> Result<Arc<dyn SessionFactory>> {
    match backend {
        Backend::Sim => Ok(Arc::new(SimSessionFactory::new(SimOptions::from(config)))),
        #[cfg(feature = "playwright")]
        Backend::Playwright => {
            let factory = todomvc_e2e::PlaywrightSessionFactory::launch(config)
                .await
                .context("launching browser")?;
            Ok(Arc::new(factory))
        }
        #[cfg(not(feature = "playwright"))]
        Backend::Playwright => {
            bail!("this build has no browser backend; rebuild with --features playwright")
        }
    }
}

async fn run(args: RunArgs) -> Result<ExitCode> {
    let config = load_config(&args)?;
    let selected = scenarios::select(&args.scenarios)?;
    if selected.is_empty() {
        bail!("no scenarios selected");
    }

    let factory = open_factory(args.backend, &config).await?;
    let outcome = tokio::select! {
        report = run_scenarios(Arc::clone(&factory), selected, &config) => Some(report),
        _ = tokio::signal::ctrl_c() => None,
    };
    if let Err(e) = factory.shutdown().await {
        tracing::warn!(error = %e, "backend shutdown failed");
    }

    let Some(report) = outcome else {
        tracing::warn!("interrupted, remaining scenarios aborted");
        return Ok(ExitCode::from(130));
    };
    let report = report?;

    if args.json {
        println!("{}", report.to_json_pretty()?);
    } else {
        print_summary(&report);
    }
    Ok(if report.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_summary(report: &SuiteReport) {
    for outcome in &report.outcomes {
        let label = if outcome.passed() { "PASS" } else { "FAIL" };
        println!("{} {} ({} ms)", label, outcome.name, outcome.duration_ms);
        if let Some(error) = &outcome.error {
            println!("     {}", error);
        }
        for artifact in &outcome.artifacts {
            println!("     artifact: {}", artifact.display());
        }
    }
    println!(
        "\n{} passed, {} failed ({} backend, {} ms)",
        report.passed(),
        report.failed(),
        report.backend,
        report.duration_ms
    );
}
