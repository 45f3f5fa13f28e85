use crate::dispatch::Dispatcher;
use crate::transport::Transport;
use crate::types::{Button, Header, Joystick, Trigger};
use crate::wire::{CallFrame, ResponseShape};
use crate::Result;

/// Gamepad state as seen by the host this frame.
pub struct Controller<'a, T> {
    dispatcher: &'a mut Dispatcher<T>,
}

impl<'a, T: Transport> Controller<'a, T> {
    pub(crate) fn new(dispatcher: &'a mut Dispatcher<T>) -> Self {
        Self { dispatcher }
    }

    /// Whether `button` is held down.
    pub fn is_down(&mut self, button: Button) -> Result<bool> {
        self.button_query(Header::ControllerIsDown, button)
    }

    /// Whether `button` went down this frame.
    pub fn was_pressed(&mut self, button: Button) -> Result<bool> {
        self.button_query(Header::ControllerWasPressed, button)
    }

    /// Whether `button` came up this frame.
    pub fn was_released(&mut self, button: Button) -> Result<bool> {
        self.button_query(Header::ControllerWasReleased, button)
    }

    /// Trigger position from 0 (released) to 1 (fully pressed).
    pub fn trigger(&mut self, trigger: Trigger) -> Result<f32> {
        let frame = CallFrame::new(Header::ControllerGetTrigger).push_u8(trigger.code());
        self.dispatcher.call(&frame, ResponseShape::Float)?.into_f32()
    }

    /// Stick position as `(x, y)`, each in `[-1, 1]`.
    pub fn joystick(&mut self, joystick: Joystick) -> Result<(f32, f32)> {
        let frame = CallFrame::new(Header::ControllerGetJoystick).push_u8(joystick.code());
        let [x, y] = self.dispatcher.call(&frame, ResponseShape::FloatPair)?.into_pair()?;
        Ok((x, y))
    }

    fn button_query(&mut self, header: Header, button: Button) -> Result<bool> {
        let frame = CallFrame::new(header).push_u8(button.code());
        self.dispatcher.call(&frame, ResponseShape::Bool)?.into_bool()
    }
}
