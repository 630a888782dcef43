//! CAMARA Adapters CLI
//!
//! Runs the REST facade over a configured adapter pair, or issues one-off
//! canonical calls (zone listing) for smoke-testing a backend.

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use camara_adapters::{
    AdapterFactory, AdapterParams, ApiServer, ApiServerConfig, AppState, Error, Result,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// CAMARA Adapters - unified access to 5G core, RIC and edge platforms
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the REST facade over configured adapters
    Serve {
        /// Facade bind address
        #[arg(long, env = "API_ADDR", default_value = "0.0.0.0:8090")]
        addr: String,

        /// Network backend name (open5gs, oai, open5gcore, coresim)
        #[arg(long, env = "NETWORK_BACKEND")]
        network_backend: Option<String>,

        /// Network backend base URL
        #[arg(long, env = "NETWORK_URL")]
        network_url: Option<String>,

        /// Edge backend name (i2edge, aeros)
        #[arg(long, env = "EDGE_BACKEND")]
        edge_backend: Option<String>,

        /// Edge backend base URL
        #[arg(long, env = "EDGE_URL")]
        edge_url: Option<String>,

        /// Network-backend parameter, key=value; repeatable
        #[arg(long = "network-param", value_name = "KEY=VALUE")]
        network_params: Vec<String>,

        /// Edge-backend parameter, key=value; repeatable
        #[arg(long = "edge-param", value_name = "KEY=VALUE")]
        edge_params: Vec<String>,
    },
    /// List the zones an edge backend exposes
    Zones {
        /// Edge backend name (i2edge, aeros)
        #[arg(long, env = "EDGE_BACKEND")]
        backend: String,

        /// Edge backend base URL
        #[arg(long, env = "EDGE_URL")]
        url: String,

        /// Backend-specific parameter, key=value; repeatable
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    match args.command {
        Command::Serve {
            addr,
            network_backend,
            network_url,
            edge_backend,
            edge_url,
            network_params,
            edge_params,
        } => {
            let mut state = AppState::default();

            if let Some(backend) = network_backend {
                let url = network_url.ok_or_else(|| {
                    Error::Configuration("--network-url is required with --network-backend".into())
                })?;
                state.network = Some(AdapterFactory::network(
                    &backend,
                    AdapterParams::from_map(url, parse_params(&network_params)?),
                )?);
            }
            if let Some(backend) = edge_backend {
                let url = edge_url.ok_or_else(|| {
                    Error::Configuration("--edge-url is required with --edge-backend".into())
                })?;
                state.edge = Some(AdapterFactory::edge_cloud(
                    &backend,
                    AdapterParams::from_map(url, parse_params(&edge_params)?),
                )?);
            }
            if state.network.is_none() && state.edge.is_none() {
                return Err(Error::Configuration(
                    "configure at least one of --network-backend / --edge-backend".into(),
                ));
            }

            info!("Starting CAMARA adapters facade");
            info!("  Version: {}", camara_adapters::VERSION);

            let config = ApiServerConfig {
                addr: addr
                    .parse()
                    .map_err(|err| Error::Configuration(format!("invalid bind address: {}", err)))?,
            };
            ApiServer::new(config, state).run().await
        }
        Command::Zones { backend, url, params } => {
            let params = parse_params(&params)?;
            let adapter =
                AdapterFactory::edge_cloud(&backend, AdapterParams::from_map(url, params))?;
            let zones = adapter.list_zones().await?;
            println!("{}", serde_json::to_string_pretty(&zones)?);
            Ok(())
        }
    }
}

/// Parse repeated `key=value` arguments into the parameter bag.
fn parse_params(raw: &[String]) -> Result<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();
    for entry in raw {
        let (key, value) = entry.split_once('=').ok_or_else(|| {
            Error::Configuration(format!("parameter '{}' is not key=value", entry))
        })?;
        params.insert(key.to_string(), value.to_string());
    }
    Ok(params)
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("tower=warn".parse().unwrap())
        .add_directive("axum=info".parse().unwrap());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
