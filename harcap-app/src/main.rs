//! The `harcap` binary: load config, start a browser session, replay the
//! configured scenario over its run arguments, and write one HAR archive
//! per run.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use harcap_capture::{execute, execute_with_proxy, RunOutcome, RunPlan};
use harcap_common::observability::{init_logging, LogConfig};
use harcap_config::{CaptureStrategy, HarcapConfig, HarcapConfigLoader};
use harcap_driver::{builtin_scenarios, DriverSettings, HarcapDriver, RecordingProxy};
use harcap_trace::Creator;

/// Capture a scripted browser session's network traffic as HAR archives.
#[derive(Debug, Parser)]
#[command(name = "harcap", version)]
struct Cli {
    /// Path to the capture configuration file.
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration problems are fatal before any browser is started.
    let config = match HarcapConfigLoader::new().with_file(&cli.config).load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!(
                "Error: configuration file '{}': {err}",
                cli.config.display()
            );
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_logging(LogConfig {
        emit_stderr: true,
        ..LogConfig::default()
    }) {
        eprintln!("Error: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = format!("{err:#}"), "capture session failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: HarcapConfig) -> Result<()> {
    let registry = builtin_scenarios();
    let scenario = registry.get(&config.scenario).ok_or_else(|| {
        anyhow!(
            "unknown scenario '{}' (registered: {})",
            config.scenario,
            registry.names().join(", ")
        )
    })?;

    let plan = RunPlan {
        arguments: config.run_args.clone(),
        output_base: config.output_har_filename.clone(),
        settle: Duration::from_secs_f64(config.wait_time_after_script),
        creator: Creator::default(),
    };

    // Resolve the proxy collaborator before the browser exists, so a bad
    // endpoint fails without leaving a session behind.
    let mut proxy = match config.strategy {
        CaptureStrategy::Trace => None,
        CaptureStrategy::Proxy => {
            let endpoint = config
                .proxy_url
                .as_deref()
                .ok_or_else(|| anyhow!("the proxy strategy requires 'proxy_url'"))?;
            Some(RecordingProxy::new(endpoint)?)
        }
    };

    let settings = DriverSettings {
        webdriver_url: config.webdriver_url.clone(),
        headless: config.headless,
        proxy_server: config.browser_proxy.clone(),
    };
    let mut driver = HarcapDriver::connect(&settings)
        .await
        .context("starting browser session")?;

    info!(scenario = %config.scenario, runs = plan.arguments.len().max(1), "capture session started");
    let capture = match proxy.as_mut() {
        None => execute(&mut driver, scenario.as_ref(), &plan)
            .await
            .map_err(anyhow::Error::from),
        Some(proxy) => execute_with_proxy(&mut driver, proxy, scenario.as_ref(), &plan)
            .await
            .map_err(anyhow::Error::from),
    };

    // Shut the browser down on every exit path, success or failure.
    if let Err(err) = driver.close().await {
        warn!(error = format!("{err:#}"), "browser shutdown reported an error");
    }

    let outcomes = capture?;
    report(&outcomes);
    Ok(())
}

fn report(outcomes: &[RunOutcome]) {
    for outcome in outcomes {
        let argument = outcome.argument.as_deref().unwrap_or("<implicit>");
        match &outcome.result {
            Ok(path) => println!("HAR file saved to {}", path.display()),
            Err(err) => eprintln!("Warning: run '{argument}' failed: {err:#}"),
        }
    }
}
