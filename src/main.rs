//! session-gate binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use session_gate::api::{serve, AppState, ServerConfig};
use session_gate::cli::{parse_args, print_help, print_version};
use session_gate::config::Config;
use session_gate::{
    logging, GateHandle, MemoryAuthProvider, MemoryProfileStore, ProfileCache, RestAuthProvider,
    RestProfileStore, SessionControl, SessionGate,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Run with --help for usage.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args).and_then(|c| c.validate().map(|()| c)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let server = match config.to_server_config() {
        Ok(server) => server,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    logging::init_with_level(Some(config.log_filter()));
    info!("session-gate v{}", env!("CARGO_PKG_VERSION"));

    match run(config, server).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("session-gate failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config, server: ServerConfig) -> session_gate::Result<()> {
    let gate_config = config.gate_config();

    match config.provider_config() {
        Some(provider_config) => {
            info!(url = %provider_config.url, "using hosted provider");
            let auth = Arc::new(RestAuthProvider::new(provider_config)?);
            let profiles = Arc::new(RestProfileStore::new(Arc::clone(&auth)));
            let cache = profiles.cache();
            let handle = SessionGate::new(Arc::clone(&auth), profiles, gate_config).start();
            serve_gate(server, handle, auth, cache).await
        }
        None => {
            warn!("no provider configured, using in-memory provider");
            let auth = Arc::new(MemoryAuthProvider::new());
            let profiles = Arc::new(MemoryProfileStore::new());
            let cache = profiles.cache();
            let handle = SessionGate::new(Arc::clone(&auth), profiles, gate_config).start();
            serve_gate(server, handle, auth, cache).await
        }
    }
}

async fn serve_gate(
    server: ServerConfig,
    handle: GateHandle,
    control: Arc<dyn SessionControl>,
    profiles: Arc<ProfileCache>,
) -> session_gate::Result<()> {
    let state = AppState::new(handle.navigation(), control, profiles);
    serve(server, state, shutdown_signal()).await?;
    handle.shutdown().await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
