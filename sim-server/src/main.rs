mod session;
mod telemetry;

use std::sync::Arc;

use session::Session;
use telemetry::TelemetrySource;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let listener = TcpListener::bind("0.0.0.0:9090").await?;
    info!("Simulator server listening on :9090");

    let telemetry = Arc::new(TelemetrySource::new());

    loop {
        let (socket, addr) = listener.accept().await?;
        info!("Connection from: {}", addr);

        let telemetry = telemetry.clone();
        tokio::spawn(async move {
            match Session::accept(socket, addr, telemetry).await {
                Ok(session) => session.run().await,
                Err(e) => error!("Handshake with {} failed: {}", addr, e),
            }
        });
    }
}
