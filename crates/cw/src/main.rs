use clap::{Parser, Subcommand};
use cw_events::bus::EventBus;
use cw_poll::{Poller, PollerView, WatchConfig};
use cw_provider::{CallProvider, HttpCallProvider, UnconfiguredProvider};
use owo_colors::OwoColorize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cw")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Serve,
    Watch {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    Openapi,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve => serve().await,
        Command::Watch { config } => watch(config).await,
        Command::Openapi => {
            println!("{}", cw_serve::openapi::generate_spec());
        }
    }
}

async fn serve() {
    cw_serve::openapi::ensure_initialized();
    let db_path =
        std::env::var("CALLWATCH_DB_PATH").unwrap_or_else(|_| ".callwatch/events.db".to_string());
    if let Some(parent) = Path::new(&db_path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let port = std::env::var("CALLWATCH_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(4720);
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);

    let provider: Arc<dyn CallProvider> = match HttpCallProvider::from_env() {
        Ok(provider) => Arc::new(provider),
        Err(_) => {
            tracing::warn!("telephony provider not configured; daily/monthly stats unavailable");
            Arc::new(UnconfiguredProvider)
        }
    };

    let state = cw_serve::AppState {
        db_path,
        event_bus: EventBus::new(1024),
        idempotency: cw_serve::IdempotencyLocks::new(),
        provider,
    };
    if let Err(err) = cw_serve::cleanup_idempotency(&state) {
        tracing::warn!(error = %err, "idempotency cleanup failed");
    }
    if let Err(err) = cw_serve::serve(state, addr).await {
        eprintln!("serve error: {err}");
    }
}

async fn watch(config_path: Option<PathBuf>) {
    let config = match WatchConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("watch error: {err}");
            std::process::exit(1);
        }
    };
    println!("watching {} (ctrl-c to stop)", config.base_url.bold());

    let poller = match Poller::start(config) {
        Ok(poller) => poller,
        Err(err) => {
            eprintln!("watch error: {err}");
            std::process::exit(1);
        }
    };

    let mut view = poller.view();
    print_status(&view.borrow().clone());
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = view.borrow_and_update().clone();
                print_status(&snapshot);
            }
        }
    }
    poller.stop().await;
}

fn print_status(view: &PollerView) {
    let link = if view.connected {
        "connected".green().to_string()
    } else {
        "offline".red().to_string()
    };
    let last_update = view
        .last_update
        .map(|value| value.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    let polling = if view.is_polling { " (polling)" } else { "" };
    println!(
        "[{link}] {} events, last update {last_update}{polling}",
        view.events.len()
    );
}
