//! Error types for the racecar bridge.
//!
//! Every failure in the bridge is a [`BridgeError`]. The protocol has no
//! retransmission, so nothing in the stack retries: an error either ends the
//! current exchange (framing, transport, host-reported failures) or is handled
//! locally by the lockstep loop (unexpected frame events).
//!
//! ## Error Categories
//!
//! - **Framing Errors**: a payload or bulk chunk does not match the fixed layout
//! - **Event Errors**: the host sent a frame event outside {start, update, exit}
//! - **Transport Errors**: socket failures, or a host that stopped answering
//! - **Host Errors**: the simulation host reported an error datagram
//! - **Callback Errors**: user code in `start`/`update`/`update_slow` failed
//! - **Argument and Config Errors**: rejected before anything reaches the wire
//!
//! ## Helper Constructors
//!
//! ```rust
//! use racecar_link::BridgeError;
//!
//! let short = BridgeError::framing("lidar samples", 2880, 1440);
//! assert!(short.is_fatal());
//!
//! let event = BridgeError::unexpected_event(99);
//! assert!(!event.is_fatal());
//! for suggestion in short.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::types::ErrorCode;

/// Result type alias for bridge operations.
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Which user callback was running when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStage {
    Start,
    Update,
    UpdateSlow,
}

impl fmt::Display for CallbackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackStage::Start => f.write_str("start"),
            CallbackStage::Update => f.write_str("update"),
            CallbackStage::UpdateSlow => f.write_str("update_slow"),
        }
    }
}

/// Main error type for bridge operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BridgeError {
    #[error("Framing error in {context}: expected {expected} bytes, received {actual}")]
    Framing { context: String, expected: usize, actual: usize },

    #[error("Unexpected frame event code {code}")]
    UnexpectedEvent { code: u8 },

    #[error("Transport failure during {operation}")]
    Transport {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Simulation host did not respond within {waited:?}")]
    HostUnresponsive { waited: Duration },

    #[error("Simulation host reported error: {code}")]
    HostReported { code: ErrorCode },

    #[error("User {stage} callback failed")]
    Callback {
        stage: CallbackStage,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid argument for {operation}: {details}")]
    InvalidArgument { operation: &'static str, details: String },

    #[error("Configuration error: {reason}")]
    Config {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BridgeError {
    /// Returns whether this error ends the session.
    ///
    /// Only unexpected frame events are survivable; the lockstep loop answers them
    /// with an error acknowledgment and keeps waiting.
    pub fn is_fatal(&self) -> bool {
        match self {
            BridgeError::UnexpectedEvent { .. } => false,
            BridgeError::InvalidArgument { .. } => false,
            BridgeError::Framing { .. } => true,
            BridgeError::Transport { .. } => true,
            BridgeError::HostUnresponsive { .. } => true,
            BridgeError::HostReported { .. } => true,
            BridgeError::Callback { .. } => true,
            BridgeError::Config { .. } => true,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            BridgeError::Framing { .. } => vec![
                "Check that the simulator build matches protocol version 1",
                "Verify camera and lidar dimensions match the simulator settings",
                "Restart the simulator and the control program together",
            ],
            BridgeError::UnexpectedEvent { .. } => vec![
                "Check that no other program is sending to the client port",
                "Verify the simulator uses the same header table",
            ],
            BridgeError::Transport { .. } => vec![
                "Check that the client port is not already bound by another program",
                "Verify the simulator host address and port",
            ],
            BridgeError::HostUnresponsive { .. } => vec![
                "Ensure the simulator is running and in user program mode",
                "Increase the receive timeout",
            ],
            BridgeError::HostReported { .. } => vec![
                "Stop other control programs so a car is free",
                "Update whichever of the simulator and this crate is outdated",
                "Read the simulator log for the reported error",
            ],
            BridgeError::Callback { .. } => vec![
                "Inspect the error chain for the failing user code",
                "Re-enter user program mode once the program is fixed",
            ],
            BridgeError::InvalidArgument { .. } => vec![
                "Clamp drive inputs to the range [-1, 1]",
                "Keep the max speed scale within [0, 1]",
            ],
            BridgeError::Config { .. } => vec![
                "Check the configuration file syntax",
                "Ensure the color image divides evenly into the chunk count",
            ],
        }
    }

    /// Helper constructor for framing errors.
    pub fn framing(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        BridgeError::Framing { context: context.into(), expected, actual }
    }

    /// Helper constructor for unexpected frame event codes.
    pub fn unexpected_event(code: u8) -> Self {
        BridgeError::UnexpectedEvent { code }
    }

    /// Helper constructor for socket failures.
    pub fn transport(operation: &'static str, source: std::io::Error) -> Self {
        BridgeError::Transport { operation, source }
    }

    /// Helper constructor for user callback failures.
    pub fn callback(stage: CallbackStage, source: anyhow::Error) -> Self {
        BridgeError::Callback { stage, source }
    }

    /// Helper constructor for rejected call arguments.
    pub fn invalid_argument(operation: &'static str, details: impl Into<String>) -> Self {
        BridgeError::InvalidArgument { operation, details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        BridgeError::Config { reason: reason.into(), source: None }
    }

    /// Helper constructor for configuration errors with source.
    pub fn config_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        BridgeError::Config { reason: reason.into(), source: Some(source) }
    }
}
