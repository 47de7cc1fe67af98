//! Individual dashboard client session handling

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use futures::{SinkExt, StreamExt};
use odolink_shared::{codec, ops, Frame};
use tokio::net::TcpStream;
use tokio::time::{interval, Duration};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

use crate::telemetry::TelemetrySource;

/// How often each session pushes an unsolicited odometer broadcast
const BROADCAST_INTERVAL: Duration = Duration::from_secs(2);

/// Active dashboard client session
pub struct Session {
    addr: SocketAddr,
    stream: WebSocketStream<TcpStream>,
    telemetry: Arc<TelemetrySource>,
}

impl Session {
    /// Perform the WebSocket handshake on an accepted socket
    pub async fn accept(
        socket: TcpStream,
        addr: SocketAddr,
        telemetry: Arc<TelemetrySource>,
    ) -> Result<Self> {
        let stream = tokio_tungstenite::accept_async(socket).await?;
        Ok(Self {
            addr,
            stream,
            telemetry,
        })
    }

    /// Serve the session until the client disconnects
    pub async fn run(mut self) {
        let mut broadcast = interval(BROADCAST_INTERVAL);

        loop {
            tokio::select! {
                _ = broadcast.tick() => {
                    let frame = Frame::odometer_broadcast(self.telemetry.odometer());
                    if self.send(&frame).await.is_err() {
                        break;
                    }
                }

                message = self.stream.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            if self.handle_request(text.as_str()).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Client disconnected: {}", self.addr);
                            break;
                        }
                        // Binary, ping and pong frames are not part of the protocol
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!("Read error from {}: {}", self.addr, e);
                            break;
                        }
                    }
                }
            }
        }
    }

    async fn handle_request(&mut self, text: &str) -> Result<()> {
        let frame = match codec::decode_frame(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Bad frame from {}: {}", self.addr, e);
                return Ok(());
            }
        };

        debug!("[{}] request: {}", self.addr, frame.operation);

        let response = match frame.operation.as_str() {
            ops::GET_CURRENT_ODOMETER => Frame::current_odometer(self.telemetry.odometer()),
            ops::GET_RANDOM_STATUS => {
                Frame::random_status(self.telemetry.random_status(), self.telemetry.odometer())
            }
            other => {
                warn!("Unknown operation from {}: {}", self.addr, other);
                return Ok(());
            }
        };

        self.send(&response).await
    }

    async fn send(&mut self, frame: &Frame) -> Result<()> {
        let text = codec::encode(frame)?;
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }
}
