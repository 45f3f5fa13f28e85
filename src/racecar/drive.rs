use crate::dispatch::Dispatcher;
use crate::transport::Transport;
use crate::types::Header;
use crate::wire::CallFrame;
use crate::{BridgeError, Result};

/// Throttle and steering. Every command is a cast.
pub struct Drive<'a, T> {
    dispatcher: &'a mut Dispatcher<T>,
}

impl<'a, T: Transport> Drive<'a, T> {
    pub(crate) fn new(dispatcher: &'a mut Dispatcher<T>) -> Self {
        Self { dispatcher }
    }

    /// Set throttle and steering, each in `[-1, 1]`.
    ///
    /// Negative speed reverses, negative angle steers left. Out-of-range values
    /// are rejected before anything is sent.
    pub fn set_speed_angle(&mut self, speed: f32, angle: f32) -> Result<()> {
        check_range("set_speed_angle", "speed", speed, -1.0, 1.0)?;
        check_range("set_speed_angle", "angle", angle, -1.0, 1.0)?;
        let frame = CallFrame::new(Header::DriveSetSpeedAngle).push_f32(speed).push_f32(angle);
        self.dispatcher.cast(&frame)
    }

    pub fn stop(&mut self) -> Result<()> {
        self.dispatcher.cast(&CallFrame::new(Header::DriveStop))
    }

    /// Scale the car's top speed by `scale` in `[0, 1]`.
    pub fn set_max_speed(&mut self, scale: f32) -> Result<()> {
        check_range("set_max_speed", "scale", scale, 0.0, 1.0)?;
        self.dispatcher.cast(&CallFrame::new(Header::DriveSetMaxSpeed).push_f32(scale))
    }
}

fn check_range(operation: &'static str, name: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(BridgeError::invalid_argument(
            operation,
            format!("{name} must be within [{min}, {max}], got {value}"),
        ))
    }
}
