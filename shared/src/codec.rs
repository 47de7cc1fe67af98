//! JSON codec for the dashboard micro-protocol
//!
//! Frames are newline-free UTF-8 JSON text, one frame per transport message.
//! The transport preserves message boundaries, so no extra framing is needed.

use thiserror::Error;

use crate::{ops, Frame};

/// Errors that can occur during encoding/decoding
///
/// Both kinds are recoverable: the receiver logs and discards the message.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

/// Inbound messages as seen by the dashboard client
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Response to `getCurrentOdometer`
    CurrentOdometer { odometer: f32 },

    /// Response to `getRandomStatus`; a zero or missing odometer means the
    /// reading is absent
    RandomStatus { status: bool, odometer: Option<f32> },

    /// Unsolicited live odometer push
    OdometerBroadcast { value: f32 },
}

/// Encode a frame into its JSON text form
pub fn encode(frame: &Frame) -> Result<String, CodecError> {
    Ok(serde_json::to_string(frame)?)
}

/// Decode a JSON text into a raw frame
pub fn decode_frame(text: &str) -> Result<Frame, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Decode a JSON text into the client-side typed view
pub fn decode(text: &str) -> Result<Inbound, CodecError> {
    let frame = decode_frame(text)?;

    match frame.operation.as_str() {
        ops::CURRENT_ODOMETER => Ok(Inbound::CurrentOdometer {
            odometer: frame.odometer.unwrap_or(0.0),
        }),
        ops::RANDOM_STATUS => Ok(Inbound::RandomStatus {
            status: frame.status.unwrap_or(false),
            odometer: frame.odometer.filter(|v| *v != 0.0),
        }),
        ops::ODOMETER_BROADCAST => Ok(Inbound::OdometerBroadcast {
            value: frame.value.unwrap_or(0.0),
        }),
        _ => Err(CodecError::UnknownOperation(frame.operation)),
    }
}
