//! Core protocol and sensor types.
//!
//! ## Architecture
//!
//! The types map directly onto the bytes the simulation host exchanges:
//! - [`Header`] is the canonical tag table (see [`PROTOCOL_VERSION`])
//! - [`FrameEvent`] decodes the lockstep signals the host sends each tick
//! - [`ErrorCode`] is the second byte of an `error` datagram
//! - [`Button`], [`Trigger`] and [`Joystick`] are the controller call arguments
//! - [`ColorImage`], [`DepthImage`], [`LidarScan`] and [`Vector3`] wrap decoded
//!   sensor payloads
//!
//! ## Usage Example
//!
//! ```rust
//! use racecar_link::types::{FrameEvent, Header};
//!
//! assert_eq!(Header::DriveSetSpeedAngle.tag(), 22);
//! assert_eq!(FrameEvent::parse(&[Header::UnityUpdate.tag()]).unwrap(), FrameEvent::Update);
//! ```

mod controller;
mod event;
mod header;
mod sensor;

pub use controller::{Button, Joystick, Trigger};
pub use event::{ErrorCode, FrameEvent};
pub use header::{Header, PROTOCOL_VERSION};
pub use sensor::{ColorImage, DepthImage, LidarScan, Vector3};
