//! OdoLink Shared Protocol Types
//!
//! This crate provides the wire frame type, the JSON codec and the
//! connection-link state machine shared by the dashboard client and the
//! simulator server.

pub mod codec;
pub mod link;

use serde::{Deserialize, Serialize};

/// Operation names of the dashboard micro-protocol
pub mod ops {
    /// Client request for the current odometer reading
    pub const GET_CURRENT_ODOMETER: &str = "getCurrentOdometer";

    /// Server response carrying the current odometer reading
    pub const CURRENT_ODOMETER: &str = "currentOdometer";

    /// Client request for the random status flag
    pub const GET_RANDOM_STATUS: &str = "getRandomStatus";

    /// Server response carrying the random status flag
    pub const RANDOM_STATUS: &str = "randomStatus";

    /// Unsolicited server push of a live odometer value
    pub const ODOMETER_BROADCAST: &str = "odometer_val";
}

/// Default connection parameters
pub mod defaults {
    /// Maximum scheduled reconnection attempts before giving up
    pub const MAX_RECONNECT_ITERATIONS: u32 = 4;

    /// Message pump dispatch interval in milliseconds
    pub const DISPATCH_INTERVAL_MS: u64 = 1000;

    /// Transport open timeout in milliseconds
    pub const CONNECT_TIMEOUT_MS: u64 = 5000;

    /// Default server host
    pub const SERVER_HOST: &str = "127.0.0.1";

    /// Default server port
    pub const SERVER_PORT: &str = "9090";
}

/// Build the session URL for a host/port pair
pub fn server_url(host: &str, port: &str) -> String {
    format!("ws://{}:{}/ws", host, port)
}

/// Wire envelope for all protocol frames
///
/// Absent fields are omitted on encode and defaulted on decode. The protocol
/// carries no request ids; responses correlate by operation name only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    pub operation: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odometer: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
}

/// Builder helpers for creating frames
impl Frame {
    /// Create a bare request frame for the given operation
    pub fn request(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Self::default()
        }
    }

    /// Create a `currentOdometer` response
    pub fn current_odometer(odometer: f32) -> Self {
        Self {
            operation: ops::CURRENT_ODOMETER.into(),
            odometer: Some(odometer),
            ..Self::default()
        }
    }

    /// Create a `randomStatus` response
    pub fn random_status(status: bool, odometer: f32) -> Self {
        Self {
            operation: ops::RANDOM_STATUS.into(),
            status: Some(status),
            odometer: Some(odometer),
            ..Self::default()
        }
    }

    /// Create an unsolicited `odometer_val` broadcast
    pub fn odometer_broadcast(value: f32) -> Self {
        Self {
            operation: ops::ODOMETER_BROADCAST.into(),
            value: Some(value),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_frame() {
        let frame = Frame::request(ops::GET_CURRENT_ODOMETER);
        assert_eq!(frame.operation, ops::GET_CURRENT_ODOMETER);
        assert!(frame.value.is_none());
        assert!(frame.odometer.is_none());
        assert!(frame.status.is_none());
    }

    #[test]
    fn test_response_builders() {
        let frame = Frame::current_odometer(42.0);
        assert_eq!(frame.operation, ops::CURRENT_ODOMETER);
        assert_eq!(frame.odometer, Some(42.0));

        let frame = Frame::random_status(true, 7.5);
        assert_eq!(frame.operation, ops::RANDOM_STATUS);
        assert_eq!(frame.status, Some(true));
        assert_eq!(frame.odometer, Some(7.5));

        let frame = Frame::odometer_broadcast(120.5);
        assert_eq!(frame.operation, ops::ODOMETER_BROADCAST);
        assert_eq!(frame.value, Some(120.5));
    }

    #[test]
    fn test_server_url_format() {
        assert_eq!(server_url("10.0.0.2", "9090"), "ws://10.0.0.2:9090/ws");
        assert_eq!(
            server_url(defaults::SERVER_HOST, defaults::SERVER_PORT),
            "ws://127.0.0.1:9090/ws"
        );
    }
}
