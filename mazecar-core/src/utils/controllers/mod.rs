//! Module Exports
//!
//! This file exports the controller modules of the robot core.
//!
//! - `drive`: motor driving primitives and the top-level drive system
//! - `wall_follow`: the corridor-following control loop

pub mod drive;
pub mod wall_follow;

use core::fmt::Debug;

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use serde::{Deserialize, Serialize};

use crate::utils::sensors::{AngularRate, RangeFinder};

pub use drive::{DriveCommand, DriveSystem, DRIVE_CHANNEL};
pub use wall_follow::FOLLOW_STOP;

/// Envelope over the command families understood by the robot.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "ct", rename_all = "snake_case")] // ct = command type
pub enum SystemCommand {
    D(drive::DriveCommand),
}

/// Owns the drive system and executes commands arriving on `DRIVE_CHANNEL`.
pub struct SystemController<L, R, F, B, G, P, W> {
    pub system: DriveSystem<L, R, F, B, G, P, W>,
}

impl<L, R, F, B, G, P, W, PE, WE> SystemController<L, R, F, B, G, P, W>
where
    L: RangeFinder,
    R: RangeFinder,
    F: RangeFinder,
    B: RangeFinder,
    G: AngularRate,
    P: OutputPin<Error = PE>,
    W: SetDutyCycle<Error = WE>,
    PE: Debug,
    WE: Debug,
{
    pub fn new(system: DriveSystem<L, R, F, B, G, P, W>) -> Self {
        Self { system }
    }

    /// Receive and execute drive commands forever.
    pub async fn drive_ch(&mut self) -> ! {
        loop {
            let command = DRIVE_CHANNEL.receiver().receive().await;
            tracing::info!("received drive command: {:?}", command);
            self.execute(command).await;
        }
    }

    async fn execute(
        &mut self,
        command: DriveCommand,
    ) {
        let system = &mut self.system;
        match command {
            DriveCommand::Move { t, f } => match system.grid_move(t, f) {
                Ok(m) => tracing::info!("grid move ran {:?}", m),
                Err(e) => tracing::error!("grid move failed: {:?}", e),
            },
            DriveCommand::Follow => match system.wall_follow(&FOLLOW_STOP).await {
                Ok(outcome) => tracing::info!("wall follow {:?}", outcome),
                Err(e) => tracing::error!("wall follow aborted: {:?}", e),
            },
            DriveCommand::Forward { s } => {
                let duty = s.unwrap_or(system.drive.base_speed());
                if let Err(e) = system.drive.forward_at(duty) {
                    tracing::error!("forward failed: {:?}", e);
                }
            }
            DriveCommand::TurnLeft { a } => {
                if let Err(e) = system.drive.turn_left(a) {
                    tracing::error!("turn left failed: {:?}", e);
                }
            }
            DriveCommand::TurnRight { a } => {
                if let Err(e) = system.drive.turn_right(a) {
                    tracing::error!("turn right failed: {:?}", e);
                }
            }
            DriveCommand::Stop => {
                if let Err(e) = system.drive.stop() {
                    tracing::error!("stop failed: {:?}", e);
                }
            }
            DriveCommand::ReadHeading => {
                tracing::info!(angle = system.heading_deg(), "heading");
            }
            DriveCommand::Enable => {
                if let Err(e) = system.gyro.set_enabled(true) {
                    tracing::error!("gyro enable failed: {:?}", e);
                }
            }
            DriveCommand::Disable => {
                if let Err(e) = system.drive.stop() {
                    tracing::error!("stop failed: {:?}", e);
                }
                if let Err(e) = system.gyro.set_enabled(false) {
                    tracing::error!("gyro disable failed: {:?}", e);
                }
            }
        }
    }
}
