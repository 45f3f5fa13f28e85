//! Gamepad inputs addressable through the controller calls

use serde::{Deserialize, Serialize};

/// Buttons on the simulated Xbox-style controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Button {
    A = 0,
    B = 1,
    X = 2,
    Y = 3,
    /// Left bumper
    Lb = 4,
    /// Right bumper
    Rb = 5,
    /// Left joystick press
    LJoy = 6,
    /// Right joystick press
    RJoy = 7,
    Start = 8,
    Back = 9,
}

/// Analog triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Trigger {
    Left = 0,
    Right = 1,
}

/// Analog sticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Joystick {
    Left = 0,
    Right = 1,
}

impl Button {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl Trigger {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl Joystick {
    pub const fn code(self) -> u8 {
        self as u8
    }
}
