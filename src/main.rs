use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use userstore::config::Config;
use userstore::health::HealthChecker;
use userstore::observability::{init_logging, LogConfig};
use userstore::validation::UserValidator;
use userstore::{Server, StorageEngine, UserService};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line arguments structure
struct CliArgs {
    config_path: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    show_help: bool,
    show_version: bool,
}

fn print_help() {
    println!("userstore v{} - user record service backed by Cassandra", VERSION);
    println!();
    println!("USAGE:");
    println!("    userstore [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>    Path to configuration file (TOML format)");
    println!("    -H, --host <HOST>      Bind address (default: 0.0.0.0)");
    println!("    -p, --port <PORT>      Bind port (default: 8080)");
    println!("    -h, --help             Print help information");
    println!("    -v, --version          Print version information");
    println!();
    println!("CONFIGURATION FILE:");
    println!("    See config/userstore.toml for a complete configuration template.");
    println!();
    println!("    [server]");
    println!("    host = \"0.0.0.0\"");
    println!("    port = 8080");
    println!();
    println!("    [storage]");
    println!("    engine = \"cassandra\"    # or \"memory\"");
    println!();
    println!("    [cassandra]");
    println!("    hosts = [\"127.0.0.1:9042\"]");
    println!("    username = \"cassandra\"");
    println!("    password = \"cassandra\"");
    println!();
    println!("    [logging]");
    println!("    level = \"info\"          # trace, debug, info, warn, error");
    println!("    format = \"text\"         # or \"json\"");
}

fn print_version() {
    println!("userstore {}", VERSION);
}

/// Parse command line arguments
fn parse_args() -> anyhow::Result<CliArgs> {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        host: None,
        port: None,
        show_help: false,
        show_version: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                cli.show_help = true;
                return Ok(cli);
            }
            "-v" | "--version" => {
                cli.show_version = true;
                return Ok(cli);
            }
            "-c" | "--config" => {
                let path = args
                    .get(i + 1)
                    .with_context(|| format!("{} requires a file path argument", args[i]))?;
                cli.config_path = Some(path.clone());
                i += 1;
            }
            "-H" | "--host" => {
                let host = args
                    .get(i + 1)
                    .with_context(|| format!("{} requires a host argument", args[i]))?;
                cli.host = Some(host.clone());
                i += 1;
            }
            "-p" | "--port" => {
                let port = args
                    .get(i + 1)
                    .with_context(|| format!("{} requires a port argument", args[i]))?;
                cli.port = Some(
                    port.parse::<u16>()
                        .with_context(|| format!("Invalid port number '{}'", port))?,
                );
                i += 1;
            }
            arg => anyhow::bail!("Unknown option '{}'. Use --help for usage.", arg),
        }
        i += 1;
    }

    Ok(cli)
}

/// Load configuration from file and merge with CLI arguments
fn load_config(cli: &CliArgs) -> anyhow::Result<Config> {
    let mut config = match cli.config_path {
        Some(ref path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config file '{}'", path))?,
        None => Config::default(),
    };

    // CLI arguments override config file
    if let Some(ref host) = cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    Ok(config)
}

/// Open the configured storage engine; returns only after the schema exists.
async fn create_storage_engine(config: &Config) -> anyhow::Result<StorageEngine> {
    let cassandra = &config.cassandra;
    match config.storage.engine.to_lowercase().as_str() {
        "cassandra" | "scylla" => {
            info!(hosts = ?cassandra.hosts, keyspace = %cassandra.keyspace, "Using Cassandra storage engine");
            StorageEngine::open_cassandra(cassandra)
                .await
                .context("Failed to bootstrap Cassandra storage")
        }
        "memory" => {
            warn!("Using in-memory storage engine; data is lost on exit");
            StorageEngine::open_memory(&cassandra.keyspace, cassandra.replication_factor)
                .context("Failed to initialize in-memory storage")
        }
        other => anyhow::bail!("Unknown storage engine '{}'", other),
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = parse_args()?;
    if cli.show_help {
        print_help();
        return Ok(());
    }
    if cli.show_version {
        print_version();
        return Ok(());
    }

    let config = load_config(&cli)?;
    init_logging(&LogConfig::from_config(&config.logging)?);
    info!("userstore v{} starting", VERSION);

    let storage = create_storage_engine(&config).await?;

    let service = UserService::new(storage.clone(), Arc::new(UserValidator));
    let health = HealthChecker::new(storage, config.cassandra.probe_timeout());
    let server = Server::new(
        config.server.addr(),
        service,
        health,
        config.server.request_timeout(),
    );

    let shutdown = server.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    server.run().await.context("Server error")?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
