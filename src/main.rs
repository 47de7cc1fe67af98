mod connection;
mod settings;
mod transport;

use connection::{ConnectionConfig, ConnectionManager, Notification};
use settings::{AddressEntry, ServerAddress, SettingsStore, SERVER_ADDRESS_KEY};
use transport::WsConnector;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Granularity of the external tick driving the manager's pump
const TICK_INTERVAL_MS: u64 = 100;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config_path = std::env::var("ODOLINK_CONFIG").unwrap_or_else(|_| "config.json".into());
    let store = SettingsStore::new(config_path);

    let address = match store.load_entry(SERVER_ADDRESS_KEY) {
        Ok(Some(entry)) => ServerAddress::new(entry.host, entry.port),
        Ok(None) => ServerAddress::default(),
        Err(e) => {
            warn!("could not load settings, using defaults: {:#}", e);
            ServerAddress::default()
        }
    };

    info!("Dashboard client starting");
    info!("  server: {}", address.url());

    let (mut manager, mut notifications) =
        ConnectionManager::new(WsConnector, address.subscribe(), ConnectionConfig::default());

    manager.initialize().await;

    let mut ticker = tokio::time::interval(tokio::time::Duration::from_millis(TICK_INTERVAL_MS));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                manager.tick().await;
            }
            Some(notification) = notifications.recv() => {
                report(&manager, notification);
            }
            _ = &mut shutdown => {
                info!("shutting down");
                manager.disconnect().await;
                break;
            }
        }
    }

    let entry = AddressEntry {
        key: SERVER_ADDRESS_KEY.into(),
        host: address.host().to_string(),
        port: address.port().to_string(),
    };
    if let Err(e) = store.save(&[entry]) {
        warn!("could not save settings: {:#}", e);
    }
}

/// Observer role: pull current values when a change signal arrives
fn report(manager: &ConnectionManager<WsConnector>, notification: Notification) {
    match notification {
        Notification::ConnectionStatusChanged => info!(
            "connection status: {:?} (iteration {})",
            manager.state(),
            manager.reconnection_iteration()
        ),
        Notification::OdometerChanged => info!("odometer: {:.1}", manager.odometer_value()),
        Notification::RandomStatusChanged => info!("random status: {}", manager.random_status()),
    }
}
