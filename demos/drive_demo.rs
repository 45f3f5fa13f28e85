//! Demo control program.
//!
//! Press B to drive forward for one second and then turn left for one second.
//! Press A to print a message, X to grab a depth image. While the right bumper
//! is held, `update_slow` reports it once per second.
//!
//! Run the simulator, start this program, then enter user program mode:
//!
//! ```text
//! cargo run --example drive_demo -- [config.yaml]
//! ```

use anyhow::Context;
use racecar_link::types::Button;
use racecar_link::{BridgeConfig, Program, Racecar, Session, Transport};
use tracing::info;

#[derive(Default)]
struct DriveDemo {
    /// Seconds since B was pressed.
    counter: f32,
    is_driving: bool,
}

impl<T: Transport> Program<T> for DriveDemo {
    fn start(&mut self, rc: &mut Racecar<T>) -> anyhow::Result<()> {
        self.counter = 0.0;
        self.is_driving = false;
        rc.drive().stop()?;
        Ok(())
    }

    fn update(&mut self, rc: &mut Racecar<T>) -> anyhow::Result<()> {
        if rc.controller().was_pressed(Button::A)? {
            info!("The A button was pressed");
        }

        if rc.controller().was_pressed(Button::B)? {
            self.counter = 0.0;
            self.is_driving = true;
        }

        if self.is_driving {
            self.counter += rc.delta_time()?;
            if self.counter < 1.0 {
                rc.drive().set_speed_angle(1.0, 0.0)?;
            } else if self.counter < 2.0 {
                rc.drive().set_speed_angle(1.0, 1.0)?;
            } else {
                rc.drive().stop()?;
                self.is_driving = false;
            }
        }

        if rc.controller().was_pressed(Button::X)? {
            let depth = rc.camera().depth_image()?.clone();
            info!(center = ?depth.at(depth.height / 2, depth.width / 2), "Depth image captured");
            rc.display().show_depth_image(&depth)?;
        }

        Ok(())
    }

    fn update_slow(&mut self, rc: &mut Racecar<T>) -> anyhow::Result<()> {
        if rc.controller().is_down(Button::Rb)? {
            info!("The right bumper is currently down (update_slow)");
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => BridgeConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => BridgeConfig::default(),
    };
    racecar_link::logging::init(&config)?;

    info!(host = %config.host_addr(), "Program loaded, enter user program mode in the simulator");
    let mut session = Session::connect(config)?;
    let summary = session.run(&mut DriveDemo::default())?;
    info!(frames = summary.frames, "Simulator exited");
    Ok(())
}
