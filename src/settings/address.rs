//! Server target address with change notification

use odolink_shared::{defaults, server_url};
use tokio::sync::watch;

/// The connection target; host and port resolve into the session URL
///
/// Edits with empty or unchanged values are ignored. Observers watch the
/// derived URL, which fires once per effective edit; the connection manager
/// holds the read side and rebuilds its session on change.
#[derive(Debug)]
pub struct ServerAddress {
    host: String,
    port: String,
    url_tx: watch::Sender<String>,
}

impl ServerAddress {
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        let host = host.into();
        let port = port.into();
        let (url_tx, _) = watch::channel(server_url(&host, &port));
        Self { host, port, url_tx }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Current session URL
    pub fn url(&self) -> String {
        self.url_tx.borrow().clone()
    }

    /// Subscribe to URL changes; the current value counts as already seen
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.url_tx.subscribe()
    }

    pub fn set_host(&mut self, host: &str) {
        if host.is_empty() || host == self.host {
            return;
        }
        self.host = host.to_string();
        self.push_url();
    }

    pub fn set_port(&mut self, port: &str) {
        if port.is_empty() || port == self.port {
            return;
        }
        self.port = port.to_string();
        self.push_url();
    }

    fn push_url(&self) {
        self.url_tx.send_replace(server_url(&self.host, &self.port));
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self::new(defaults::SERVER_HOST, defaults::SERVER_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_derivation() {
        let address = ServerAddress::new("192.168.1.4", "8000");
        assert_eq!(address.url(), "ws://192.168.1.4:8000/ws");
    }

    #[test]
    fn test_default_address() {
        let address = ServerAddress::default();
        assert_eq!(address.host(), defaults::SERVER_HOST);
        assert_eq!(address.port(), defaults::SERVER_PORT);
    }

    #[test]
    fn test_empty_and_unchanged_edits_are_ignored() {
        let mut address = ServerAddress::new("10.0.0.1", "9090");
        let mut rx = address.subscribe();

        address.set_host("");
        address.set_host("10.0.0.1");
        address.set_port("");
        address.set_port("9090");
        assert!(!rx.has_changed().unwrap());

        address.set_host("10.0.0.2");
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), "ws://10.0.0.2:9090/ws");
    }

    #[test]
    fn test_each_effective_edit_fires_once() {
        let mut address = ServerAddress::new("10.0.0.1", "9090");
        let mut rx = address.subscribe();

        address.set_port("9191");
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        address.set_port("9191");
        assert!(!rx.has_changed().unwrap());
    }
}
