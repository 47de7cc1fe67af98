//! WebSocket transport implementation for the dashboard session

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::transport::traits::{MessageTransport, TransportConnector, TransportEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A live WebSocket session
///
/// A reader task forwards inbound frames into an unbounded queue so arrivals
/// buffer until the pump drains them. Dropping the session aborts the reader,
/// so a discarded handle can never deliver late events.
pub struct WsTransport {
    sink: SplitSink<WsStream, Message>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    reader: JoinHandle<()>,
}

#[async_trait]
impl MessageTransport for WsTransport {
    async fn send(&mut self, text: &str) -> Result<()> {
        self.sink.send(Message::Text(text.into())).await?;
        Ok(())
    }

    fn poll_event(&mut self) -> Option<TransportEvent> {
        self.events.try_recv().ok()
    }

    async fn close(&mut self) -> Result<()> {
        // Sends a close frame and flushes the sink
        self.sink.close().await?;
        Ok(())
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    loop {
        let event = match stream.next().await {
            Some(Ok(Message::Text(text))) => TransportEvent::Message(text.to_string()),
            Some(Ok(Message::Close(frame))) => {
                let reason = frame.map(|f| f.reason.to_string()).unwrap_or_default();
                let _ = events.send(TransportEvent::Closed { reason });
                break;
            }
            // Binary, ping and pong frames are not part of the protocol
            Some(Ok(other)) => {
                debug!("ignoring non-text frame: {:?}", other);
                continue;
            }
            Some(Err(e)) => {
                let _ = events.send(TransportEvent::Closed {
                    reason: e.to_string(),
                });
                break;
            }
            None => {
                let _ = events.send(TransportEvent::Closed {
                    reason: "stream ended".into(),
                });
                break;
            }
        };

        if events.send(event).is_err() {
            break;
        }
    }
}

/// WebSocket connector for the dashboard server
pub struct WsConnector;

#[async_trait]
impl TransportConnector for WsConnector {
    type Transport = WsTransport;

    async fn connect(&self, url: &str) -> Result<Self::Transport> {
        let (stream, _response) = connect_async(url).await?;
        let (sink, read) = stream.split();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(read_loop(read, event_tx));

        Ok(WsTransport {
            sink,
            events: event_rx,
            reader,
        })
    }

    fn name(&self) -> &'static str {
        "WebSocket"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_connector_name() {
        assert_eq!(WsConnector.name(), "WebSocket");
    }
}
