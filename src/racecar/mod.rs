//! Capability facades handed to user callbacks
//!
//! A [`Racecar`] is what `start`, `update` and `update_slow` receive. Each
//! accessor returns a short-lived facade that borrows only the pieces of the
//! session it needs:
//!
//! | Facade | Traffic |
//! |---|---|
//! | [`Drive`] | casts, no response |
//! | [`Camera`] | bulk color image, single-datagram depth image, both cached per frame |
//! | [`Controller`] | one call per query |
//! | [`Lidar`] | single-datagram scan, cached per frame |
//! | [`Physics`] | one call per query |
//! | [`Display`] | none, forwarded to a local [`DisplaySink`] |
//!
//! Facades that hand out cached data take `self` by value so the returned
//! reference lives as long as the `Racecar` borrow, not the facade.

mod camera;
mod controller;
mod display;
mod drive;
mod lidar;
mod physics;

pub use camera::Camera;
pub use controller::Controller;
pub use display::{Display, DisplaySink, NullDisplay};
pub use drive::Drive;
pub use lidar::Lidar;
pub use physics::Physics;

use tracing::debug;

use crate::cache::FrameCache;
use crate::config::BridgeConfig;
use crate::dispatch::{DispatchStats, Dispatcher};
use crate::transport::Transport;
use crate::types::Header;
use crate::wire::{CallFrame, ResponseShape};
use crate::{BridgeError, Result};

/// Session state reachable from user code.
pub struct Racecar<T> {
    pub(crate) dispatcher: Dispatcher<T>,
    pub(crate) cache: FrameCache,
    pub(crate) config: BridgeConfig,
    pub(crate) display: Box<dyn DisplaySink>,
    pub(crate) update_slow_time: Option<f32>,
    pub(crate) frame: u64,
}

impl<T: Transport> Racecar<T> {
    pub(crate) fn new(transport: T, config: BridgeConfig) -> Self {
        let update_slow_time = config.update_slow_time;
        Self {
            dispatcher: Dispatcher::new(transport),
            cache: FrameCache::default(),
            config,
            display: Box::new(NullDisplay),
            update_slow_time,
            frame: 0,
        }
    }

    pub fn drive(&mut self) -> Drive<'_, T> {
        Drive::new(&mut self.dispatcher)
    }

    pub fn camera(&mut self) -> Camera<'_, T> {
        Camera::new(&mut self.dispatcher, &mut self.cache, &self.config.camera)
    }

    pub fn controller(&mut self) -> Controller<'_, T> {
        Controller::new(&mut self.dispatcher)
    }

    pub fn lidar(&mut self) -> Lidar<'_, T> {
        Lidar::new(&mut self.dispatcher, &mut self.cache, &self.config.lidar)
    }

    pub fn physics(&mut self) -> Physics<'_, T> {
        Physics::new(&mut self.dispatcher)
    }

    pub fn display(&mut self) -> Display<'_> {
        Display::new(self.display.as_mut())
    }

    /// Seconds of simulation time covered by the current frame.
    ///
    /// Fetched once per frame; later reads in the same frame are free.
    pub fn delta_time(&mut self) -> Result<f32> {
        let dispatcher = &mut self.dispatcher;
        self.cache
            .delta_time
            .get_or_fetch(|| {
                dispatcher
                    .call(&CallFrame::new(Header::RacecarGetDeltaTime), ResponseShape::Float)?
                    .into_f32()
            })
            .copied()
    }

    /// Change how often `update_slow` runs, in seconds. `None` stops it.
    pub fn set_update_slow_time(&mut self, interval: Option<f32>) -> Result<()> {
        if let Some(seconds) = interval {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(BridgeError::invalid_argument(
                    "set_update_slow_time",
                    format!("interval must be positive seconds, got {seconds}"),
                ));
            }
        }
        debug!(?interval, "update_slow interval changed");
        self.update_slow_time = interval;
        Ok(())
    }

    pub fn update_slow_time(&self) -> Option<f32> {
        self.update_slow_time
    }

    /// Index of the current frame; `start` runs in frame 0.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Traffic so far in this session.
    pub fn stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }
}
