mod config;

use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError, LoggingConfig, MetricsConfig};
use gateway::GatewayStartError;
use metrics_exporter_statsd::{StatsdBuilder, StatsdError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uploader::{GatewayClient, PathPicker, UploadError, UploadPipeline};

#[derive(Parser)]
#[command(name = "clusterize", version, about)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run the gateway in front of the clustering service
    Gateway {
        #[arg(long, short)]
        config: PathBuf,
    },
    /// Submit cluster assignments from CSV files, one batch per file
    Upload(UploadArgs),
}

#[derive(Args)]
struct UploadArgs {
    #[arg(long, default_value = "http://localhost:3000")]
    gateway_url: String,
    #[arg(long)]
    token: String,
    #[arg(long)]
    project_id: String,
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("config has no `{0}` section")]
    MissingSection(&'static str),
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to set up statsd: {0}")]
    Statsd(#[from] StatsdError),
    #[error("a metrics recorder is already installed")]
    MetricsRecorder,
    #[error(transparent)]
    Gateway(#[from] GatewayStartError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        CliCommand::Gateway { config } => run_gateway(&config),
        CliCommand::Upload(args) => run_upload(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "clusterize failed");
            eprintln!("clusterize: {e}");
            ExitCode::FAILURE
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// Installs the tracing subscriber, with the sentry layer when a DSN is set.
/// The returned guard flushes pending sentry events on drop.
fn init_logging(logging: Option<&LoggingConfig>) -> Option<sentry::ClientInitGuard> {
    let guard = logging.map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(guard.as_ref().map(|_| sentry::integrations::tracing::layer()))
        .init();

    guard
}

fn init_metrics(metrics: Option<&MetricsConfig>) -> Result<(), CliError> {
    let Some(metrics) = metrics else {
        return Ok(());
    };

    let recorder = StatsdBuilder::from(metrics.statsd_host.as_str(), metrics.statsd_port)
        .build(Some(metrics.prefix.as_str()))?;
    metrics::set_global_recorder(recorder).map_err(|_| CliError::MetricsRecorder)?;

    tracing::info!(
        host = %metrics.statsd_host,
        port = metrics.statsd_port,
        "statsd metrics enabled"
    );
    Ok(())
}

fn run_gateway(path: &std::path::Path) -> Result<(), CliError> {
    let mut config = Config::from_file(path)?;
    config.apply_env_overrides(|key| std::env::var(key).ok());

    let _sentry = init_logging(config.common.logging.as_ref());
    init_metrics(config.common.metrics.as_ref())?;

    let gateway_config = config.gateway.ok_or(CliError::MissingSection("gateway"))?;
    tracing::info!(
        listener = %format!("{}:{}", gateway_config.listener.host, gateway_config.listener.port),
        "starting gateway"
    );

    runtime()?.block_on(gateway::run(gateway_config))?;
    Ok(())
}

fn run_upload(args: UploadArgs) -> Result<(), CliError> {
    let _sentry = init_logging(None);

    let client = GatewayClient::new(
        &args.gateway_url,
        args.token,
        Duration::from_secs(args.timeout_secs),
    )?;
    let mut pipeline = UploadPipeline::new(client);
    let mut picker = PathPicker::new(args.files);
    let runtime = runtime()?;

    while let Some(records) = pipeline.select_file(&mut picker)? {
        let file = pipeline
            .displayed_files()
            .last()
            .map(|f| f.name.clone())
            .unwrap_or_default();

        let result = runtime.block_on(pipeline.submit(&args.project_id))?;
        tracing::info!(%file, records, status = result.status, "batch accepted");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_gateway() {
        let cli = Cli::try_parse_from(["clusterize", "gateway", "--config", "gw.yaml"]).unwrap();
        assert!(matches!(
            cli.command,
            CliCommand::Gateway { config } if config == PathBuf::from("gw.yaml")
        ));
    }

    #[test]
    fn parse_upload() {
        let cli = Cli::try_parse_from([
            "clusterize",
            "upload",
            "--token",
            "tok",
            "--project-id",
            "12",
            "a.csv",
            "b.csv",
        ])
        .unwrap();

        let CliCommand::Upload(args) = cli.command else {
            panic!("expected upload command");
        };
        assert_eq!(args.gateway_url, "http://localhost:3000");
        assert_eq!(args.project_id, "12");
        assert_eq!(args.timeout_secs, 30);
        assert_eq!(args.files.len(), 2);

        // At least one file is required
        assert!(
            Cli::try_parse_from(["clusterize", "upload", "--token", "t", "--project-id", "1"])
                .is_err()
        );
    }
}
