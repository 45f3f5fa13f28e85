//! Binary wire format for calls and responses
//!
//! Calls are `[header: u8][args]` with fixed-width little-endian arguments.
//! Responses are untagged; their meaning comes from the call that produced them.
//!
//! ```text
//! drive_set_speed_angle   22 00 00 00 | f32 speed | f32 angle     (12 bytes)
//! controller_is_down      16 | u8 button                          (2 bytes)
//! lidar_get_samples       1a                                      (1 byte)
//!   -> response           f32 x num_samples                       (untagged)
//! ```

mod frame;
mod response;

pub use frame::{CallArgs, CallFrame};
pub use response::{Response, ResponseShape, decode, decode_floats};
