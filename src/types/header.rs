//! Canonical header table shared with the simulation host

use serde::{Deserialize, Serialize};

/// Version of the header table below.
///
/// The host does not negotiate; a simulator built against a different table
/// misreads every tag. Bump this together with any change to [`Header`].
pub const PROTOCOL_VERSION: u8 = 1;

/// Leading byte of every call frame, frame event and acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Header {
    Error = 0,
    Connect = 1,
    UnityStart = 2,
    UnityUpdate = 3,
    UnityExit = 4,
    PythonFinished = 5,
    PythonSendNext = 6,
    PythonExit = 7,
    RacecarGo = 8,
    RacecarSetStartUpdate = 9,
    RacecarGetDeltaTime = 10,
    RacecarSetUpdateSlowTime = 11,
    CameraGetColorImage = 12,
    CameraGetDepthImage = 13,
    CameraGetWidth = 14,
    CameraGetHeight = 15,
    ControllerIsDown = 16,
    ControllerWasPressed = 17,
    ControllerWasReleased = 18,
    ControllerGetTrigger = 19,
    ControllerGetJoystick = 20,
    DisplayShowImage = 21,
    DriveSetSpeedAngle = 22,
    DriveStop = 23,
    DriveSetMaxSpeed = 24,
    LidarGetNumSamples = 25,
    LidarGetSamples = 26,
    PhysicsGetLinearAcceleration = 27,
    PhysicsGetAngularVelocity = 28,
}

impl Header {
    /// Every header in tag order.
    pub const ALL: [Header; 29] = [
        Header::Error,
        Header::Connect,
        Header::UnityStart,
        Header::UnityUpdate,
        Header::UnityExit,
        Header::PythonFinished,
        Header::PythonSendNext,
        Header::PythonExit,
        Header::RacecarGo,
        Header::RacecarSetStartUpdate,
        Header::RacecarGetDeltaTime,
        Header::RacecarSetUpdateSlowTime,
        Header::CameraGetColorImage,
        Header::CameraGetDepthImage,
        Header::CameraGetWidth,
        Header::CameraGetHeight,
        Header::ControllerIsDown,
        Header::ControllerWasPressed,
        Header::ControllerWasReleased,
        Header::ControllerGetTrigger,
        Header::ControllerGetJoystick,
        Header::DisplayShowImage,
        Header::DriveSetSpeedAngle,
        Header::DriveStop,
        Header::DriveSetMaxSpeed,
        Header::LidarGetNumSamples,
        Header::LidarGetSamples,
        Header::PhysicsGetLinearAcceleration,
        Header::PhysicsGetAngularVelocity,
    ];

    /// The wire byte for this header.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Look up a header by its wire byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_dense_and_ordered() {
        for (index, header) in Header::ALL.iter().enumerate() {
            assert_eq!(header.tag() as usize, index, "{header:?} out of order");
            assert_eq!(Header::from_tag(index as u8), Some(*header));
        }
        assert_eq!(Header::from_tag(Header::ALL.len() as u8), None);
        assert_eq!(Header::from_tag(99), None);
    }

    #[test]
    fn lockstep_tags_match_host() {
        assert_eq!(Header::UnityStart.tag(), 2);
        assert_eq!(Header::UnityUpdate.tag(), 3);
        assert_eq!(Header::UnityExit.tag(), 4);
        assert_eq!(Header::PythonFinished.tag(), 5);
        assert_eq!(Header::PythonSendNext.tag(), 6);
        assert_eq!(Header::CameraGetColorImage.tag(), 12);
        assert_eq!(Header::DriveSetSpeedAngle.tag(), 22);
    }
}
