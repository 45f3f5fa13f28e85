//! Host-issued frame events and protocol error codes

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Header;
use crate::{BridgeError, Result};

/// Lockstep signal from the simulation host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    /// User program mode entered; run `start` once.
    Start,
    /// One simulation tick; run `update`.
    Update,
    /// Session over; no acknowledgment is expected.
    Exit,
    /// An `error` datagram where a frame event belongs. The lockstep loop
    /// answers it like any other unexpected byte.
    HostError(ErrorCode),
}

impl FrameEvent {
    /// Decode a host datagram into a frame event.
    ///
    /// Only the leading byte selects the event. An `error` header carries its
    /// code in the second byte; a missing code reads as [`ErrorCode::Generic`].
    pub fn parse(datagram: &[u8]) -> Result<Self> {
        let Some(&code) = datagram.first() else {
            return Err(BridgeError::framing("frame event", 1, 0));
        };

        match Header::from_tag(code) {
            Some(Header::UnityStart) => Ok(FrameEvent::Start),
            Some(Header::UnityUpdate) => Ok(FrameEvent::Update),
            Some(Header::UnityExit) => Ok(FrameEvent::Exit),
            Some(Header::Error) => {
                let error = datagram.get(1).copied().and_then(ErrorCode::from_byte);
                Ok(FrameEvent::HostError(error.unwrap_or(ErrorCode::Generic)))
            }
            _ => Err(BridgeError::unexpected_event(code)),
        }
    }
}

impl TryFrom<u8> for FrameEvent {
    type Error = BridgeError;

    fn try_from(code: u8) -> Result<Self> {
        FrameEvent::parse(&[code])
    }
}

/// Second byte of an `error` datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ErrorCode {
    Generic = 0,
    Timeout = 1,
    PythonException = 2,
    NoFreeCar = 3,
    PythonOutdated = 4,
    RacecarsimOutdated = 5,
    FragmentMismatch = 6,
}

impl ErrorCode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(ErrorCode::Generic),
            1 => Some(ErrorCode::Timeout),
            2 => Some(ErrorCode::PythonException),
            3 => Some(ErrorCode::NoFreeCar),
            4 => Some(ErrorCode::PythonOutdated),
            5 => Some(ErrorCode::RacecarsimOutdated),
            6 => Some(ErrorCode::FragmentMismatch),
            _ => None,
        }
    }

    /// The two-byte `[error, code]` datagram.
    pub fn datagram(self) -> [u8; 2] {
        [Header::Error.tag(), self as u8]
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorCode::Generic => "generic",
            ErrorCode::Timeout => "timeout",
            ErrorCode::PythonException => "client program exception",
            ErrorCode::NoFreeCar => "no free car",
            ErrorCode::PythonOutdated => "client outdated",
            ErrorCode::RacecarsimOutdated => "simulator outdated",
            ErrorCode::FragmentMismatch => "fragment mismatch",
        };
        f.write_str(text)
    }
}
