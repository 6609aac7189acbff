use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

mod config;
mod connection_manager;
mod link_layer;
mod negotiation;
mod operator;
mod session_task;

use connection_manager::ConnectionManager;
use link_layer::LinkLayerEvent;
use wfd_dbus::{OBJECT_PATH, SERVICE_NAME};

/// Wi-Fi Display (Miracast) source: captures the local display, encodes
/// it to H.264, and streams it over RTP to a connected sink.
#[derive(Parser, Debug)]
#[command(name = "aethercast-source", version, about)]
struct Cli {
    /// Path to the source configuration file (TOML).
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Local address to bind the media-control listener to.
    #[arg(long)]
    bind_address: Option<String>,

    /// Media-control TCP port.
    #[arg(long)]
    port: Option<u16>,

    /// Run the D-Bus facade on the session bus instead of the system bus.
    #[arg(long)]
    session_bus: bool,

    /// Stream a synthetic test pattern instead of the real display.
    #[arg(long)]
    static_display: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind_address {
        cfg.bind_address = bind;
    }
    if let Some(port) = cli.port {
        cfg.media_control_port = port;
    }
    cfg.dbus_session_bus |= cli.session_bus;
    cfg.static_display |= cli.static_display;

    let reporter = build_reporter();

    tracing::info!(
        bind = %cfg.bind_address,
        port = cfg.media_control_port,
        "starting aethercast-source"
    );

    let dbus_state = wfd_dbus::SourceState::new();
    let (cmd_tx, cmd_rx) = tokio::sync::mpsc::channel(16);
    let iface = wfd_dbus::SourceInterface::new(dbus_state.clone(), cmd_tx);

    let builder = if cfg.dbus_session_bus {
        zbus::connection::Builder::session()
    } else {
        zbus::connection::Builder::system()
    }
    .context("failed to connect to D-Bus")?;

    let _connection = builder
        .name(SERVICE_NAME)
        .context("failed to request D-Bus service name")?
        .serve_at(OBJECT_PATH, iface)
        .context("failed to serve D-Bus interface")?
        .build()
        .await
        .context("failed to build D-Bus connection")?;

    tracing::info!(service = SERVICE_NAME, "D-Bus interface registered");

    let mut manager = ConnectionManager::new(cfg.clone(), Arc::clone(&reporter), dbus_state.clone());

    // Stand in for the link layer's real address-assignment notification:
    // bind immediately on the configured bind address so the listener is
    // armed before any sink attempts to connect.
    let local_ip: IpAddr = cfg
        .bind_address
        .parse()
        .context("invalid bind_address in configuration")?;
    manager
        .handle_event(LinkLayerEvent::AddressAssigned { local_ip })
        .await
        .context("failed to bind media-control listener")?;

    let operator_task = tokio::spawn(operator::run(cmd_rx, manager, dbus_state.clone()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received SIGINT, shutting down");
        }
    }

    operator_task.abort();
    Ok(())
}

fn build_reporter() -> wfd_core::SharedReporter {
    match std::env::var("AETHERCAST_REPORT_TYPE").as_deref() {
        Ok("log") => Arc::new(wfd_core::LogReporter),
        Ok("lttng") => Arc::new(wfd_core::LttngReporter),
        _ => Arc::new(wfd_core::NullReporter),
    }
}
