pub mod traits;
pub mod ws;

pub use traits::{MessageTransport, TransportConnector, TransportEvent};
pub use ws::{WsConnector, WsTransport};
