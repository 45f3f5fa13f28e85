//! Lockstep UDP bridge between a control program and a racecar simulator.
//!
//! The simulator owns the clock. Every simulation frame it sends a frame event,
//! the control program runs one callback against the simulated car, and the
//! client reports completion before the simulation advances. Sensor reads and
//! drive commands in between are single-byte-tagged calls over the same UDP
//! port pair. A session registers with the host's registration port before the
//! first frame and leaves through it when it ends.
//!
//! # Features
//!
//! - **Lockstep loop**: [`Session::run`] drives a [`Program`] through start,
//!   update and slow-update callbacks
//! - **Capability facades**: drive, camera, controller, lidar, physics and
//!   display through [`Racecar`]
//! - **Bulk transfer**: stop-and-wait reassembly of 32-chunk color images
//! - **Per-frame cache**: repeated sensor reads in a frame cost one exchange
//! - **Injectable transport**: real UDP via [`UdpTransport`], or any
//!   [`Transport`] for tests
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use racecar_link::{BridgeConfig, Program, Racecar, Session, Transport};
//! use racecar_link::types::Button;
//!
//! struct Demo;
//!
//! impl<T: Transport> Program<T> for Demo {
//!     fn start(&mut self, rc: &mut Racecar<T>) -> anyhow::Result<()> {
//!         rc.drive().stop()?;
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, rc: &mut Racecar<T>) -> anyhow::Result<()> {
//!         if rc.controller().is_down(Button::A)? {
//!             rc.drive().set_speed_angle(1.0, 0.0)?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = BridgeConfig::default();
//!     racecar_link::logging::init(&config)?;
//!     let summary = Session::connect(config)?.run(&mut Demo)?;
//!     println!("ran {} frames", summary.frames);
//!     Ok(())
//! }
//! ```

// Protocol building blocks
pub mod bulk;
pub mod cache;
pub mod config;
pub mod dispatch;
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod transport;
pub mod types;
pub mod wire;

// Session and user-facing API
pub mod lockstep;
pub mod logging;
pub mod racecar;

// Core exports
pub use error::*;
pub use types::*;

pub use config::{BridgeConfig, CameraConfig, LidarConfig, MAX_DATAGRAM_SIZE, PortPolicy};
pub use dispatch::{DispatchStats, Dispatcher};
pub use lockstep::{LoopState, Program, Session, SessionSummary};
pub use racecar::{DisplaySink, NullDisplay, Racecar};
pub use transport::{Datagram, Transport, UdpTransport};
