//! Connection Link State Machine
//!
//! Defines the observable connection states and the valid transitions driven
//! by transport and caller events.

/// Observable connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
    Reconnecting,
}

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Build (or rebuild) the session, at startup or on an address change
    Initialize,
    /// Transport open completed successfully
    OpenSucceeded,
    /// Transport failed to open, errored, or was closed by the peer
    TransportLost,
    /// Deliberate local disconnect
    DisconnectRequested,
    /// Deliberate local close completed
    CloseConfirmed,
    /// Reconnection backoff delay elapsed
    RetryElapsed,
}

/// Result of a state transition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition was valid and the machine is now in this state
    Success(LinkState),
    /// Event is not valid in the current state
    Invalid { from: LinkState, event: LinkEvent },
}

/// The connection link state machine
///
/// The machine stays in `Reconnecting` across retry attempts: `RetryElapsed`
/// re-enters it, so the observed status only changes once an open succeeds.
#[derive(Debug)]
pub struct LinkStateMachine {
    current: LinkState,
}

impl Default for LinkStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkStateMachine {
    /// Create a new machine in Disconnected state
    pub fn new() -> Self {
        Self {
            current: LinkState::Disconnected,
        }
    }

    /// Get current state
    pub fn state(&self) -> LinkState {
        self.current
    }

    /// Process an event and return the transition result
    pub fn process(&mut self, event: LinkEvent) -> TransitionResult {
        match self.next_state(event) {
            Some(state) => {
                self.current = state;
                TransitionResult::Success(state)
            }
            None => TransitionResult::Invalid {
                from: self.current,
                event,
            },
        }
    }

    /// Get the next state for a given event, if the transition is valid
    fn next_state(&self, event: LinkEvent) -> Option<LinkState> {
        use LinkEvent::*;
        use LinkState::*;

        match (self.current, event) {
            // A rebuild is valid from any state; the caller tears the old
            // session down first
            (_, Initialize) => Some(Connecting),

            (Connecting, OpenSucceeded) => Some(Connected),
            (Connecting, TransportLost) => Some(Reconnecting),

            (Connected, TransportLost) => Some(Reconnecting),
            (Connected, DisconnectRequested) => Some(Disconnecting),

            // Local shutdown mid-(re)connect skips the graceful close
            (Connecting | Reconnecting, DisconnectRequested) => Some(Disconnected),

            (Disconnecting, CloseConfirmed | TransportLost) => Some(Disconnected),

            // Retry attempts keep the observed status at Reconnecting; a
            // failed attempt re-enters the state
            (Reconnecting, RetryElapsed) => Some(Reconnecting),
            (Reconnecting, OpenSucceeded) => Some(Connected),
            (Reconnecting, TransportLost) => Some(Reconnecting),

            // Invalid transition
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let fsm = LinkStateMachine::new();
        assert_eq!(fsm.state(), LinkState::Disconnected);
    }

    #[test]
    fn test_normal_session_flow() {
        let mut fsm = LinkStateMachine::new();

        let result = fsm.process(LinkEvent::Initialize);
        assert!(matches!(result, TransitionResult::Success(LinkState::Connecting)));

        let result = fsm.process(LinkEvent::OpenSucceeded);
        assert!(matches!(result, TransitionResult::Success(LinkState::Connected)));

        let result = fsm.process(LinkEvent::DisconnectRequested);
        assert!(matches!(result, TransitionResult::Success(LinkState::Disconnecting)));

        let result = fsm.process(LinkEvent::CloseConfirmed);
        assert!(matches!(result, TransitionResult::Success(LinkState::Disconnected)));
    }

    #[test]
    fn test_loss_and_recovery_flow() {
        let mut fsm = LinkStateMachine::new();
        fsm.process(LinkEvent::Initialize);
        fsm.process(LinkEvent::OpenSucceeded);

        let result = fsm.process(LinkEvent::TransportLost);
        assert!(matches!(result, TransitionResult::Success(LinkState::Reconnecting)));

        // A retry fires, fails, fires again and succeeds; status stays
        // Reconnecting until the open succeeds
        fsm.process(LinkEvent::RetryElapsed);
        assert_eq!(fsm.state(), LinkState::Reconnecting);

        let result = fsm.process(LinkEvent::TransportLost);
        assert!(matches!(result, TransitionResult::Success(LinkState::Reconnecting)));

        fsm.process(LinkEvent::RetryElapsed);
        let result = fsm.process(LinkEvent::OpenSucceeded);
        assert!(matches!(result, TransitionResult::Success(LinkState::Connected)));
    }

    #[test]
    fn test_open_failure_enters_reconnecting() {
        let mut fsm = LinkStateMachine::new();
        fsm.process(LinkEvent::Initialize);

        let result = fsm.process(LinkEvent::TransportLost);
        assert!(matches!(result, TransitionResult::Success(LinkState::Reconnecting)));
    }

    #[test]
    fn test_rebuild_from_any_state() {
        let mut fsm = LinkStateMachine::new();
        fsm.process(LinkEvent::Initialize);
        fsm.process(LinkEvent::OpenSucceeded);
        fsm.process(LinkEvent::TransportLost);
        assert_eq!(fsm.state(), LinkState::Reconnecting);

        let result = fsm.process(LinkEvent::Initialize);
        assert!(matches!(result, TransitionResult::Success(LinkState::Connecting)));
    }

    #[test]
    fn test_shutdown_while_reconnecting() {
        let mut fsm = LinkStateMachine::new();
        fsm.process(LinkEvent::Initialize);
        fsm.process(LinkEvent::OpenSucceeded);
        fsm.process(LinkEvent::TransportLost);

        let result = fsm.process(LinkEvent::DisconnectRequested);
        assert!(matches!(result, TransitionResult::Success(LinkState::Disconnected)));
    }

    #[test]
    fn test_invalid_transition() {
        let mut fsm = LinkStateMachine::new();

        // No session exists yet, so there is nothing to lose or close
        let result = fsm.process(LinkEvent::TransportLost);
        assert!(matches!(result, TransitionResult::Invalid { .. }));
        assert_eq!(fsm.state(), LinkState::Disconnected);

        let result = fsm.process(LinkEvent::CloseConfirmed);
        assert!(matches!(result, TransitionResult::Invalid { .. }));

        fsm.process(LinkEvent::Initialize);
        fsm.process(LinkEvent::OpenSucceeded);

        // A retry cannot elapse while connected
        let result = fsm.process(LinkEvent::RetryElapsed);
        assert!(matches!(result, TransitionResult::Invalid { .. }));
        assert_eq!(fsm.state(), LinkState::Connected);
    }
}
