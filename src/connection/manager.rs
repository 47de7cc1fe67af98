//! Connection manager with a persistent server session and automatic reconnection

use std::collections::VecDeque;

use odolink_shared::codec::{self, Inbound};
use odolink_shared::link::{LinkEvent, LinkState, LinkStateMachine, TransitionResult};
use odolink_shared::{defaults, ops, Frame};
use tokio::sync::{mpsc, watch};
use tokio::time::{timeout, Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::connection::backoff::ReconnectBackoff;
use crate::transport::{MessageTransport, TransportConnector, TransportEvent};

/// Zero-payload change signals emitted by the connection manager
///
/// Observers pull current values through the manager's accessors; the signal
/// itself carries nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    ConnectionStatusChanged,
    OdometerChanged,
    RandomStatusChanged,
}

/// Configuration for the connection manager
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Maximum scheduled reconnection attempts before giving up
    pub max_reconnect_iterations: u32,
    /// Interval between pump drains of buffered inbound messages
    pub dispatch_interval: Duration,
    /// Transport open timeout
    pub connect_timeout: Duration,
    /// Log individual frames at INFO instead of DEBUG
    pub verbose: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_reconnect_iterations: defaults::MAX_RECONNECT_ITERATIONS,
            dispatch_interval: Duration::from_millis(defaults::DISPATCH_INTERVAL_MS),
            connect_timeout: Duration::from_millis(defaults::CONNECT_TIMEOUT_MS),
            verbose: true,
        }
    }
}

/// Manages the single persistent session to the dashboard server
///
/// Externally driven: the caller invokes `tick` at a bounded interval and the
/// manager performs all transport and state work on that single logical task.
/// At most one open or close is in flight at a time; the driving methods take
/// `&mut self`, so an equivalent operation cannot start while one is pending.
pub struct ConnectionManager<C: TransportConnector> {
    connector: C,
    config: ConnectionConfig,
    url_rx: watch::Receiver<String>,
    machine: LinkStateMachine,
    backoff: ReconnectBackoff,
    /// The single owned session slot; empty while no live handle exists
    transport: Option<C::Transport>,
    /// Inbound events buffered between pump drains
    inbound: VecDeque<TransportEvent>,
    /// Pending retry deadline; cleared synchronously on teardown
    retry_at: Option<Instant>,
    next_dispatch: Instant,
    odometer_value: f32,
    random_status: bool,
    notify_tx: mpsc::UnboundedSender<Notification>,
}

impl<C: TransportConnector> ConnectionManager<C> {
    /// Create a new manager and the notification stream observers consume
    pub fn new(
        connector: C,
        mut url_rx: watch::Receiver<String>,
        config: ConnectionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();

        // The initial address is picked up by the first explicit initialize
        url_rx.mark_unchanged();

        let manager = Self {
            connector,
            backoff: ReconnectBackoff::new(config.max_reconnect_iterations),
            next_dispatch: Instant::now() + config.dispatch_interval,
            config,
            url_rx,
            machine: LinkStateMachine::new(),
            transport: None,
            inbound: VecDeque::new(),
            retry_at: None,
            odometer_value: 0.0,
            random_status: false,
            notify_tx,
        };

        (manager, notify_rx)
    }

    /// Current connection status
    pub fn state(&self) -> LinkState {
        self.machine.state()
    }

    /// Number of reconnection attempts since the last successful open
    pub fn reconnection_iteration(&self) -> u32 {
        self.backoff.iteration()
    }

    /// Last known odometer reading
    pub fn odometer_value(&self) -> f32 {
        self.odometer_value
    }

    /// Last known random status flag
    pub fn random_status(&self) -> bool {
        self.random_status
    }

    /// Build (or rebuild) the session against the current target address
    ///
    /// Any live session is flushed and torn down first, and the pending retry
    /// is cancelled before the new transport exists, so a stale timer can
    /// never fire against it. The iteration counter resets unconditionally.
    pub async fn initialize(&mut self) {
        if self.transport.is_some() {
            // Apply what the old session already delivered before discarding it
            self.buffer_arrivals();
            self.drain();
        }
        self.teardown().await;

        self.backoff.reset();
        self.transition(LinkEvent::Initialize);
        self.try_open().await;
    }

    /// Drive the message pump and the reconnect timer
    ///
    /// Called by the external scheduler at a bounded interval. Buffered
    /// inbound messages are applied to state only here, once per dispatch
    /// interval.
    pub async fn tick(&mut self) {
        if self.url_rx.has_changed().unwrap_or(false) {
            self.url_rx.mark_unchanged();
            info!("server address changed, rebuilding connection");
            self.initialize().await;
        }

        self.buffer_arrivals();

        if self.retry_at.is_some_and(|at| Instant::now() >= at) {
            self.retry_at = None;
            self.backoff.advance();
            self.transition(LinkEvent::RetryElapsed);
            self.try_open().await;
        }

        if Instant::now() >= self.next_dispatch {
            self.next_dispatch = Instant::now() + self.config.dispatch_interval;
            self.drain();
        }
    }

    /// Disconnect deliberately; reconnection is not scheduled
    ///
    /// A no-op producing no notification when no session exists.
    pub async fn disconnect(&mut self) {
        match self.machine.state() {
            LinkState::Disconnected | LinkState::Disconnecting => {}
            LinkState::Connected => {
                self.transition(LinkEvent::DisconnectRequested);
                self.teardown().await;
                self.transition(LinkEvent::CloseConfirmed);
            }
            LinkState::Connecting | LinkState::Reconnecting => {
                self.teardown().await;
                self.transition(LinkEvent::DisconnectRequested);
            }
        }
    }

    /// Single in-flight open attempt against the current address
    async fn try_open(&mut self) {
        let url = self.url_rx.borrow().clone();
        debug!("opening transport to {}", url);

        let result = timeout(self.config.connect_timeout, self.connector.connect(&url)).await;

        match result {
            Ok(Ok(transport)) => {
                self.transport = Some(transport);
                self.backoff.reset();
                self.transition(LinkEvent::OpenSucceeded);
                info!("connected to {} via {}", url, self.connector.name());
                self.send_bootstrap_requests().await;
            }
            Ok(Err(e)) => {
                warn!("connect to {} failed: {}", url, e);
                self.on_transport_lost();
            }
            Err(_) => {
                warn!("connect to {} timed out", url);
                self.on_transport_lost();
            }
        }
    }

    /// Both bootstrap requests go out immediately upon entering Connected; a
    /// send failure surfaces later as a close event from the reader side
    async fn send_bootstrap_requests(&mut self) {
        self.send_request(ops::GET_CURRENT_ODOMETER).await;
        self.send_request(ops::GET_RANDOM_STATUS).await;
    }

    async fn send_request(&mut self, operation: &str) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };

        let text = match codec::encode(&Frame::request(operation)) {
            Ok(text) => text,
            Err(e) => {
                error!("failed to encode request {}: {}", operation, e);
                return;
            }
        };

        if self.config.verbose {
            info!("send request: {}", text);
        }

        if let Err(e) = transport.send(&text).await {
            warn!("send {} failed: {}", operation, e);
        }
    }

    /// Move transport arrivals into the pump buffer without applying them
    fn buffer_arrivals(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            while let Some(event) = transport.poll_event() {
                self.inbound.push_back(event);
            }
        }
    }

    /// Apply buffered events to state; the only place inbound messages take effect
    fn drain(&mut self) {
        while let Some(event) = self.inbound.pop_front() {
            match event {
                TransportEvent::Message(text) => self.apply_message(&text),
                TransportEvent::Closed { reason } => {
                    if reason.is_empty() {
                        info!("transport closed by peer");
                    } else {
                        info!("transport closed: {}", reason);
                    }
                    self.on_transport_lost();
                }
            }
        }
    }

    /// Shared failure path for open failures and peer-initiated closes
    fn on_transport_lost(&mut self) {
        self.transport = None;
        self.transition(LinkEvent::TransportLost);
        self.schedule_retry();
    }

    fn schedule_retry(&mut self) {
        if self.backoff.exhausted() {
            info!(
                "connection failed after {} attempts, no more reconnections",
                self.backoff.iteration()
            );
            return;
        }

        let delay = self.backoff.delay();
        info!("reconnecting in {:?}", delay);
        self.retry_at = Some(Instant::now() + delay);
    }

    /// Unconditional, idempotent teardown of the owned session
    ///
    /// Takes the slot before awaiting the close so the handle cannot leak on
    /// an error path, and clears the retry deadline in the same step so a
    /// pending retry can never touch a disposed transport.
    async fn teardown(&mut self) {
        self.retry_at = None;
        self.inbound.clear();

        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                debug!("transport close failed: {}", e);
            }
        }
    }

    fn apply_message(&mut self, text: &str) {
        if self.config.verbose {
            info!("get message: {}", text);
        } else {
            debug!("get message: {}", text);
        }

        match codec::decode(text) {
            Ok(Inbound::CurrentOdometer { odometer }) => {
                if self.set_odometer(odometer) {
                    self.notify(Notification::OdometerChanged);
                }
            }
            Ok(Inbound::RandomStatus { status, odometer }) => {
                if self.set_random_status(status) {
                    self.notify(Notification::RandomStatusChanged);
                }
                if let Some(odometer) = odometer {
                    if self.set_odometer(odometer) {
                        self.notify(Notification::OdometerChanged);
                    }
                }
            }
            Ok(Inbound::OdometerBroadcast { value }) => {
                if self.set_odometer(value) {
                    self.notify(Notification::OdometerChanged);
                }
            }
            Err(e) => {
                error!("discarding inbound message: {}", e);
            }
        }
    }

    /// Store an odometer reading; reports changed even for equal values so
    /// observers refresh on every reading
    fn set_odometer(&mut self, value: f32) -> bool {
        self.odometer_value = value;
        true
    }

    /// Store the status flag; reports changed only on an actual change
    fn set_random_status(&mut self, status: bool) -> bool {
        if self.random_status == status {
            return false;
        }
        self.random_status = status;
        true
    }

    fn transition(&mut self, event: LinkEvent) {
        let before = self.machine.state();
        match self.machine.process(event) {
            TransitionResult::Success(after) => {
                // A failed retry re-enters Reconnecting; that still re-fires
                // so observers can refresh a retry counter display
                let reentered =
                    after == LinkState::Reconnecting && event == LinkEvent::TransportLost;
                if after != before || reentered {
                    self.notify(Notification::ConnectionStatusChanged);
                }
            }
            TransitionResult::Invalid { from, event } => {
                debug!("ignoring {:?} in state {:?}", event, from);
            }
        }
    }

    fn notify(&self, notification: Notification) {
        let _ = self.notify_tx.send(notification);
    }
}
