//! Server session state machine.
//!
//! Pure and side-effect free: feed an [`Event`], get the next state plus the
//! [`Action`]s the session runner must perform. The runner in
//! `netgiv-server` does the I/O (handshake, decoding, flows) and reports back.
//!
//! ```text
//! AwaitHandshake -> AwaitStart -> Authenticating -> Flow(op) -> Closed
//! ```
//!
//! Every state can fall to `Closed` on failure.

use netgiv_types::{OperationType, StartStatus};

/// Lifecycle of one server connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the key exchange.
    AwaitHandshake,
    /// Channel up, waiting for the StartRequest.
    AwaitStart,
    /// StartRequest received, version and token being checked.
    Authenticating {
        /// Operation the client asked for.
        operation: OperationType,
    },
    /// Running one operation flow.
    Flow(OperationType),
    /// Connection finished.
    Closed,
}

impl SessionState {
    /// A fresh session.
    pub fn new() -> Self {
        Self::AwaitHandshake
    }

    /// Process an event and return the new state plus actions to execute.
    pub fn on_event(self, event: Event) -> (Self, Vec<Action>) {
        match (self, event) {
            (Self::AwaitHandshake, Event::HandshakeCompleted) => (Self::AwaitStart, vec![]),

            (Self::AwaitStart, Event::StartReceived { operation }) => (
                Self::Authenticating { operation },
                vec![Action::Authenticate(operation)],
            ),

            (Self::Authenticating { operation }, Event::Verdict(StartStatus::Ok)) => (
                Self::Flow(operation),
                vec![
                    Action::SendStartResponse(StartStatus::Ok),
                    Action::Dispatch(operation),
                ],
            ),
            (Self::Authenticating { .. }, Event::Verdict(status)) => (
                Self::Closed,
                vec![
                    Action::SendStartResponse(status),
                    Action::Close {
                        reason: CloseReason::Rejected,
                    },
                ],
            ),

            (Self::Flow(_), Event::FlowCompleted) => (
                Self::Closed,
                vec![Action::Close {
                    reason: CloseReason::Completed,
                }],
            ),

            // Hanging up before asking for anything is not worth an error.
            (Self::AwaitHandshake | Self::AwaitStart, Event::PeerClosed) => (
                Self::Closed,
                vec![Action::Close {
                    reason: CloseReason::PrematureDisconnect,
                }],
            ),
            (Self::Authenticating { .. } | Self::Flow(_), Event::PeerClosed) => (
                Self::Closed,
                vec![Action::Close {
                    reason: CloseReason::Error,
                }],
            ),

            (state, Event::Failed { .. }) if !state.is_terminal() => (
                Self::Closed,
                vec![Action::Close {
                    reason: CloseReason::Error,
                }],
            ),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Whether the session has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// The operation being authenticated or run, if any.
    pub fn operation(&self) -> Option<OperationType> {
        match self {
            Self::Authenticating { operation } | Self::Flow(operation) => Some(*operation),
            _ => None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Decide a StartRequest. The version is checked before the token.
pub fn verdict(version_matches: bool, token_matches: bool) -> StartStatus {
    if !version_matches {
        StartStatus::WrongProtocol
    } else if !token_matches {
        StartStatus::BadAuthToken
    } else {
        StartStatus::Ok
    }
}

/// Things that happen to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Key exchange finished; the secure channel is up.
    HandshakeCompleted,
    /// A StartRequest was decoded.
    StartReceived {
        /// Requested operation.
        operation: OperationType,
    },
    /// The StartRequest was checked.
    Verdict(StartStatus),
    /// The peer closed the stream.
    PeerClosed,
    /// The operation flow finished successfully.
    FlowCompleted,
    /// Any error (I/O, timeout, decryption, malformed message).
    Failed {
        /// Error message describing the failure.
        error: String,
    },
}

/// Instructions for the session runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Check protocol version and auth token for this operation.
    Authenticate(OperationType),
    /// Encode a StartResponse with this status.
    SendStartResponse(StartStatus),
    /// Run the operation flow.
    Dispatch(OperationType),
    /// Close the connection.
    Close {
        /// Why.
        reason: CloseReason,
    },
}

/// Why a session closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The operation finished.
    Completed,
    /// The peer went away before sending a StartRequest.
    PrematureDisconnect,
    /// Wrong protocol version or auth token.
    Rejected,
    /// Anything else.
    Error,
}

impl CloseReason {
    /// Whether the close should be reported as an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}
