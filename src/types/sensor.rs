//! Sensor payloads returned by the capability calls

use serde::{Deserialize, Serialize};

/// Raw camera frame as sent by the host: RGBA rows, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl ColorImage {
    pub const BYTES_PER_PIXEL: usize = 4;

    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width * height * Self::BYTES_PER_PIXEL);
        Self { width, height, data }
    }

    /// RGBA value at (`row`, `col`), or `None` outside the image.
    pub fn pixel(&self, row: usize, col: usize) -> Option<[u8; 4]> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let start = (row * self.width + col) * Self::BYTES_PER_PIXEL;
        let px = self.data.get(start..start + Self::BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Reduced-resolution depth frame, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl DepthImage {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self { width, height, data }
    }

    pub fn at(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }
}

/// One full lidar revolution; sample `i` is at `i * 360 / len` degrees clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct LidarScan {
    pub samples: Vec<f32>,
}

impl LidarScan {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Range at the sample nearest to `degrees`.
    pub fn at_angle(&self, degrees: f32) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let len = self.samples.len();
        let step = 360.0 / len as f32;
        let index = (degrees.rem_euclid(360.0) / step).round() as usize % len;
        self.samples.get(index).copied()
    }
}

/// Three-axis reading from the physics module.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<[f32; 3]> for Vector3 {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}
