//! Per-frame memoization of sensor queries
//!
//! Within one simulation frame the host's answers never change, so the first
//! read of a sensor fetches it and every later read in the same frame is served
//! locally. Only the lockstep loop invalidates.

use crate::types::{ColorImage, DepthImage, LidarScan};
use crate::Result;

/// A value plus whether it belongs to the current frame.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    value: Option<T>,
    fresh: bool,
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self { value: None, fresh: false }
    }
}

impl<T> Cached<T> {
    /// Return this frame's value, running `fetch` on the first access.
    ///
    /// A failed fetch leaves the entry stale so the next access retries.
    pub fn get_or_fetch<F>(&mut self, fetch: F) -> Result<&T>
    where
        F: FnOnce() -> Result<T>,
    {
        let value = match self.value.take() {
            Some(value) if self.fresh => value,
            stale => match fetch() {
                Ok(value) => value,
                Err(e) => {
                    self.value = stale;
                    return Err(e);
                }
            },
        };
        self.fresh = true;
        Ok(self.value.insert(value))
    }

    /// Mark the stored value as belonging to a past frame.
    pub fn invalidate(&mut self) {
        self.fresh = false;
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }
}

/// Every per-frame entry the session owns.
#[derive(Debug, Default)]
pub struct FrameCache {
    pub color: Cached<ColorImage>,
    pub depth: Cached<DepthImage>,
    pub lidar: Cached<LidarScan>,
    pub delta_time: Cached<f32>,
}

impl FrameCache {
    pub fn invalidate(&mut self) {
        self.color.invalidate();
        self.depth.invalidate();
        self.lidar.invalidate();
        self.delta_time.invalidate();
    }
}
