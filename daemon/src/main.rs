//! Attest daemon: entry point for running the issuance pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use attest_node::{
    init_logging, Collaborators, LogFormat, NodeConfig, Pipeline, ShutdownController,
    SignatureMode,
};
use attest_rpc::{AppState, RpcServer};
use clap::Parser;

#[derive(Parser)]
#[command(name = "attest-daemon", about = "Attest verification, badge and vote pipeline")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "ATTEST_CONFIG")]
    config: Option<PathBuf>,

    /// Port for the HTTP API.
    #[arg(long, env = "ATTEST_PORT")]
    port: Option<u16>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ATTEST_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "ATTEST_LOG_FORMAT")]
    log_format: Option<String>,

    /// Base URL of the ledger REST API.
    #[arg(long, env = "ATTEST_LEDGER_ENDPOINT")]
    ledger_endpoint: Option<String>,

    /// Deployed ledger program.
    #[arg(long, env = "ATTEST_LEDGER_PROGRAM")]
    ledger_program: Option<String>,

    /// Base URL of the humanity registry.
    #[arg(long, env = "ATTEST_HUMANITY_REGISTRY_URL")]
    humanity_registry_url: Option<String>,

    /// Accept every holder proof without checking signatures.
    #[arg(long, env = "ATTEST_ACCEPT_ALL_SIGNATURES")]
    accept_all_signatures: bool,

    /// Expose internal error detail in API responses.
    #[arg(long, env = "ATTEST_DEVELOPMENT_MODE")]
    development_mode: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the pipeline and serve the HTTP API.
    Run,
    /// Print the effective configuration as TOML and exit.
    PrintConfig,
}

impl Cli {
    /// File settings (or defaults), with every flag that was given applied on top.
    fn effective_config(&self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path_str = path.to_string_lossy();
                NodeConfig::from_toml_file(&path_str)
                    .with_context(|| format!("loading config from {}", path.display()))?
            }
            None => NodeConfig::default(),
        };

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        if let Some(endpoint) = &self.ledger_endpoint {
            config.ledger.endpoint = endpoint.clone();
        }
        if let Some(program) = &self.ledger_program {
            config.ledger.program = program.clone();
        }
        if let Some(url) = &self.humanity_registry_url {
            config.providers.humanity_registry = Some(url.clone());
        }
        if self.accept_all_signatures {
            config.signature_mode = SignatureMode::AcceptAll;
        }
        config.development_mode |= self.development_mode;

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.effective_config()?;

    match cli.command {
        Command::PrintConfig => {
            println!("{}", config.to_toml_string());
            Ok(())
        }
        Command::Run => run(config).await,
    }
}

async fn run(config: NodeConfig) -> anyhow::Result<()> {
    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level);

    tracing::info!(
        port = config.port,
        ledger = %config.ledger.endpoint,
        program = %config.ledger.program,
        signature_mode = ?config.signature_mode,
        "starting attest daemon"
    );
    if config.signature_mode == SignatureMode::AcceptAll {
        tracing::warn!("holder signatures are not checked");
    }
    if config.providers.configured().is_empty() {
        tracing::warn!("no identity provider configured, every verification will be refused");
    }

    let collaborators = Collaborators::from_config(&config)?;
    let pipeline = Arc::new(Pipeline::from_config(&config, collaborators));

    let health = pipeline.health().await;
    match health.ledger_height {
        Some(height) => tracing::info!(height, "ledger reachable"),
        None => tracing::warn!("ledger unreachable at startup"),
    }

    let shutdown = Arc::new(ShutdownController::new());
    let stopped = shutdown.signalled();
    let signals = shutdown.clone();
    tokio::spawn(async move { signals.wait_for_signal().await });

    let server = RpcServer::new(
        config.port,
        AppState::new(pipeline, config.development_mode),
    );
    server.start(stopped).await?;

    tracing::info!("attest daemon stopped");
    Ok(())
}
