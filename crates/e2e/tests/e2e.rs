//! E2E test harness entry point
//!
//! Runs the registration scenarios against a live target. Without `--live`
//! (or `PIXELBET_E2E_LIVE=1`) it only renders the scenarios to scripts, so a
//! plain `cargo test` never touches the real site.
//!
//! Run with: cargo test --package pixelbet-e2e --test e2e -- --live

use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pixelbet_e2e::config::DEFAULT_CONFIG_FILE;
use pixelbet_e2e::playwright::Browser;
use pixelbet_e2e::runner::{self, Selection};
use pixelbet_e2e::{scenarios, E2eConfig, E2eResult, TestRunner};

#[derive(Parser, Debug)]
#[command(name = "pixelbet-e2e")]
#[command(about = "E2E registration-flow suite for pixel.bet")]
// cargo may forward harness flags we don't know about
#[command(ignore_errors = true)]
struct Args {
    /// Path to the YAML config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the target base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Run only tests matching this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only a specific test by name
    #[arg(short, long)]
    name: Option<String>,

    /// Browser to use
    #[arg(long, value_enum)]
    browser: Option<Browser>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Output directory for results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only write the generated scripts and plans
    #[arg(long)]
    dry_run: bool,

    /// Run against the live target
    #[arg(long, env = "PIXELBET_E2E_LIVE")]
    live: bool,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ExitCode::from(runner::EXIT_ERROR);
        }
    };

    let outcome = rt.block_on(async_main(args));
    if let Err(e) = &outcome {
        error!("Error: {}", e);
    }
    ExitCode::from(runner::exit_status(&outcome))
}

fn load_config(args: &Args) -> E2eResult<E2eConfig> {
    let mut config = E2eConfig::load(&args.config)?;

    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(browser) = args.browser {
        config.browser = browser;
    }
    if args.headed {
        config.headless = false;
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let config = load_config(&args)?;

    let selection = match (&args.name, &args.tag) {
        (Some(name), _) => Selection::Name(name.clone()),
        (None, Some(tag)) => Selection::Tag(tag.clone()),
        (None, None) => Selection::All,
    };
    let specs = selection.apply(scenarios::all(&config))?;

    let mut test_runner = TestRunner::new(config);

    if args.dry_run || !args.live {
        test_runner.dry_run(&specs)?;
        if !args.live {
            info!("Dry run only; pass --live or set PIXELBET_E2E_LIVE=1 to hit {}", test_runner.config().base_url());
        }
        return Ok(true);
    }

    let results = test_runner.run_specs(&specs).await?;
    test_runner.write_results(&results)?;

    Ok(results.all_passed())
}
