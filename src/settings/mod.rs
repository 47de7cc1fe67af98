//! Configuration collaborators for the connection target
//!
//! Owned outside the connection manager; the manager only watches the derived
//! URL and rebuilds its session when it changes.

mod address;
mod store;

pub use address::ServerAddress;
pub use store::{AddressEntry, SettingsStore, SERVER_ADDRESS_KEY};
