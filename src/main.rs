use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use hostpulse::config::{self, Config, ConfigError, load_config, load_config_from_path};
use hostpulse::monitor::{self, MonitorOptions};
use hostpulse::sink::{ApiSink, FileLogSink, SnapshotSink};
use hostpulse::system::Sampler;
use hostpulse::system::platform::{MetricsProvider, ProviderOptions};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "hostpulse",
    about = "Periodically sample CPU, memory and disk usage"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sampling interval in seconds
    #[arg(long)]
    interval: Option<u64>,

    /// Take a single sample and exit
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Log filter, e.g. `debug` or `hostpulse=trace`
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    log_json: bool,

    /// Do not write snapshots to the file log
    #[arg(long, default_value_t = false)]
    no_file_log: bool,

    /// POST each snapshot as JSON to this URL
    #[arg(long)]
    api_url: Option<String>,

    /// Do not print the per-cycle report to stdout
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let (config, config_warning) = load_config_for_cli(&cli)?;
    hostpulse::logging::init(&config.logging)?;
    if let Some(err) = config_warning {
        warn!(error = %err, "ignoring config file, using defaults");
    }

    if config.monitoring.interval_seconds == 0 {
        return Err(eyre!("interval must be at least one second"));
    }

    let cancel = CancellationToken::new();
    let provider = MetricsProvider::detect(ProviderOptions {
        command_timeout: config.monitoring.command_timeout(),
    });
    let mut sampler = Sampler::with_provider(provider).with_cancellation(cancel.clone());
    let sinks = build_sinks(&config).wrap_err("sink setup")?;

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, stopping");
                ctrl_c.cancel();
            }
            Err(err) => warn!(error = %err, "cannot listen for ctrl-c"),
        }
    });

    info!(
        provider = sampler.provider_name(),
        interval_s = config.monitoring.interval_seconds,
        sinks = sinks.len(),
        "starting system monitor"
    );

    let options = MonitorOptions {
        interval: config.monitoring.interval(),
        once: cli.once,
        quiet: cli.quiet,
    };
    let cycles = monitor::run(&mut sampler, &sinks, options, &cancel, &mut std::io::stdout()).await;
    info!(cycles, "system monitor stopped");

    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> Result<(Config, Option<ConfigError>)> {
    let (mut config, warning) = match &cli.config {
        Some(path) => (load_config_from_path(path).wrap_err("startup configuration")?, None),
        None => load_config(),
    };

    if let Some(interval) = cli.interval {
        config.monitoring.interval_seconds = interval;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.log_json {
        config.logging.json = true;
    }
    if cli.no_file_log {
        config.sinks.file_log = false;
    }
    if let Some(ref url) = cli.api_url {
        config.sinks.api_url = Some(url.clone());
    }

    Ok((config, warning))
}

fn build_sinks(config: &config::Config) -> Result<Vec<Box<dyn SnapshotSink>>> {
    let mut sinks: Vec<Box<dyn SnapshotSink>> = Vec::new();
    if config.sinks.file_log {
        sinks.push(Box::new(FileLogSink::new(&config.sinks.file_log_path)));
    }
    if let Some(url) = &config.sinks.api_url {
        sinks.push(Box::new(ApiSink::new(url, config.sinks.api_timeout())?));
    }
    Ok(sinks)
}
