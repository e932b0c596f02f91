use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use actroute_executor::ActionExecutor;
use actroute_router::{DispatchTable, Dispatcher};
use actroute_server::actions;
use actroute_server::api::AppState;
use actroute_server::config::{ActRouteConfig, DEFAULT_CONFIG_PATH};

/// Routable action server.
#[derive(Parser, Debug)]
#[command(name = "actroute-server", about = "HTTP server dispatching requests to routable actions")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the dispatch table, then exit.
    Routes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let loaded = ActRouteConfig::load(Path::new(&cli.config))?;
    let config_found = loaded.is_some();
    let config = loaded.unwrap_or_default();

    // Discovery errors are fatal at startup, before anything is bound.
    let table = actions::dispatch_table(&config.server.api_prefix)?;

    if let Some(Commands::Routes) = cli.command {
        print_routes(&table);
        return Ok(());
    }

    let telemetry_guard = actroute_server::telemetry::init(&config.telemetry)?;

    if !config_found {
        info!(path = %cli.config, "config file not found, using defaults");
    }
    info!(routes = table.len(), prefix = %config.server.api_prefix, "dispatch table built");

    let executor = ActionExecutor::new(Arc::new(actions::services()?));
    let dispatcher = Dispatcher::new(table, executor);

    let state = AppState::new(dispatcher)
        .with_permissions(config.permissions.clone())
        .with_limits(&config.server);
    let app = actroute_server::api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or_else(|| config.server.host.clone());
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "actroute-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM. In-flight requests
    // get `shutdown_timeout_seconds` to finish once the signal arrives.
    let (signal_tx, signal_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signal_tx.send(());
            })
            .await
    });

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    tokio::select! {
        res = &mut server => res??,
        _ = signal_rx => {
            info!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                "draining in-flight requests..."
            );
            match tokio::time::timeout(shutdown_timeout, &mut server).await {
                Ok(res) => res??,
                Err(_) => {
                    warn!(
                        timeout_secs = config.server.shutdown_timeout_seconds,
                        "shutdown timeout exceeded, aborting remaining requests"
                    );
                    server.abort();
                }
            }
        }
    }

    // Flush pending OpenTelemetry spans before exit.
    telemetry_guard.shutdown();

    info!("actroute-server shut down");
    Ok(())
}

fn print_routes(table: &DispatchTable) {
    for route in table.routes() {
        let permissions = if route.permissions.is_empty() {
            "-".to_owned()
        } else {
            route.permissions.to_string()
        };
        let schema = if route.validated { "schema" } else { "" };
        println!(
            "{:<7} {:<32} {:<24} {:<6} {}",
            route.verb.as_str(),
            route.pattern,
            permissions,
            schema,
            route.source
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
