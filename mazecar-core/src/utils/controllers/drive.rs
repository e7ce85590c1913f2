//! Motor driving and the top-level drive system for the MazeCar.
//!
//! Each motor sits behind an L298N-style H-bridge half: two direction lines
//! plus a PWM enable. The [`TankDrive`] pairs two motors into a differential
//! drive, and [`DriveSystem`] combines the drive with the car's five sensors
//! to expose the movement primitives. Commands are received via
//! [`DRIVE_CHANNEL`].

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use serde::{Deserialize, Serialize};

use crate::utils::controllers::wall_follow::WallFollowConfig;
use crate::utils::math::compass::{self, Compass, Maneuver};
use crate::utils::math::steering;
use crate::utils::sensors::heading::HeadingEstimator;
use crate::utils::sensors::{AngularRate, RangeFinder};

/// Channel used to receive drive commands (`DriveCommand` messages).
pub static DRIVE_CHANNEL: embassy_sync::channel::Channel<
    CriticalSectionRawMutex,
    DriveCommand,
    16,
> = embassy_sync::channel::Channel::new();

/// Errors from the motor output stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorFault<PE, WE> {
    /// A direction line refused the level change.
    Pin(PE),
    /// The PWM enable refused the duty write.
    Pwm(WE),
}

/// Drive command variants for maze movement and device management.
///
/// Serialized as JSON with tag `"dc"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
#[serde(tag = "dc", rename_all = "snake_case")]
pub enum DriveCommand {
    /// Grid move: travel toward `t` while currently facing `f`.
    Move { t: Compass, f: Compass },
    /// Wall-follow down the current corridor for the configured duration.
    Follow,
    /// Drive straight at the given duty, or the base speed when omitted.
    Forward { s: Option<u8> },
    /// Pivot left; the angle shapes the inner-wheel speed.
    TurnLeft { a: u16 },
    /// Pivot right; the angle shapes the inner-wheel speed.
    TurnRight { a: u16 },
    /// Zero both PWM outputs.
    Stop,
    /// Log the current heading estimate.
    ReadHeading,
    /// Power the gyro up.
    Enable,
    /// Stop the motors and put the gyro to sleep.
    Disable,
}

/// Direction state of one motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorDirection {
    Forward,
    Reverse,
    /// Both direction lines low; the motor freewheels.
    Released,
}

/// One motor behind an H-bridge half: two direction lines and a PWM enable.
pub struct Motor<P, W> {
    forward_line: P,
    reverse_line: P,
    enable: W,
}

impl<P, W, PE, WE> Motor<P, W>
where
    P: OutputPin<Error = PE>,
    W: SetDutyCycle<Error = WE>,
{
    pub fn new(
        forward_line: P,
        reverse_line: P,
        enable: W,
    ) -> Self {
        Self {
            forward_line,
            reverse_line,
            enable,
        }
    }

    /// Drive at `duty` (0..=255) in the given direction.
    pub fn drive(
        &mut self,
        direction: MotorDirection,
        duty: u8,
    ) -> Result<(), ActuatorFault<PE, WE>> {
        self.point(direction)?;
        self.set_duty(duty)
    }

    /// Zero the PWM output, leaving the direction lines untouched.
    pub fn coast(&mut self) -> Result<(), ActuatorFault<PE, WE>> {
        self.set_duty(0)
    }

    /// Set the direction lines. At most one line is ever high: both lines are
    /// released before the new one is asserted.
    fn point(
        &mut self,
        direction: MotorDirection,
    ) -> Result<(), ActuatorFault<PE, WE>> {
        self.forward_line.set_low().map_err(ActuatorFault::Pin)?;
        self.reverse_line.set_low().map_err(ActuatorFault::Pin)?;
        match direction {
            MotorDirection::Forward => {
                self.forward_line.set_high().map_err(ActuatorFault::Pin)?;
            }
            MotorDirection::Reverse => {
                self.reverse_line.set_high().map_err(ActuatorFault::Pin)?;
            }
            MotorDirection::Released => {}
        }
        Ok(())
    }

    fn set_duty(
        &mut self,
        duty: u8,
    ) -> Result<(), ActuatorFault<PE, WE>> {
        self.enable
            .set_duty_cycle_fraction(duty as u16, steering::DUTY_MAX as u16)
            .map_err(ActuatorFault::Pwm)
    }
}

/// Two-motor differential drive.
pub struct TankDrive<P, W> {
    left: Motor<P, W>,
    right: Motor<P, W>,
    base_speed: u8,
    correction_factor: i32,
}

impl<P, W, PE, WE> TankDrive<P, W>
where
    P: OutputPin<Error = PE>,
    W: SetDutyCycle<Error = WE>,
{
    pub fn new(
        left: Motor<P, W>,
        right: Motor<P, W>,
        base_speed: u8,
        correction_factor: i32,
    ) -> Self {
        Self {
            left,
            right,
            base_speed,
            correction_factor,
        }
    }

    pub fn base_speed(&self) -> u8 {
        self.base_speed
    }

    /// Drive forward while balancing between two wall distances.
    ///
    /// Proportional correction: the side closer to its wall speeds up and the
    /// far side slows down, saturated to the duty window.
    pub fn forward(
        &mut self,
        left_cm: i32,
        right_cm: i32,
    ) -> Result<(), ActuatorFault<PE, WE>> {
        let (left, right) = steering::proportional_split(
            self.base_speed,
            left_cm,
            right_cm,
            self.correction_factor,
        );
        self.apply(left, right)
    }

    /// Drive straight at an explicit duty.
    pub fn forward_at(
        &mut self,
        duty: u8,
    ) -> Result<(), ActuatorFault<PE, WE>> {
        self.apply(duty, duty)
    }

    /// Drive both sides forward at the given duties.
    pub fn apply(
        &mut self,
        left_duty: u8,
        right_duty: u8,
    ) -> Result<(), ActuatorFault<PE, WE>> {
        self.left.drive(MotorDirection::Forward, left_duty)?;
        self.right.drive(MotorDirection::Forward, right_duty)
    }

    /// Pivot left: left motor reverses at the shaped turn speed, right motor
    /// holds the base speed. Open-loop; the caller owns the turn timing.
    pub fn turn_left(
        &mut self,
        angle_deg: u16,
    ) -> Result<(), ActuatorFault<PE, WE>> {
        let turn = steering::turn_speed(self.base_speed, angle_deg);
        self.left.drive(MotorDirection::Reverse, turn)?;
        self.right.drive(MotorDirection::Forward, self.base_speed)
    }

    /// Pivot right, mirror of [`Self::turn_left`].
    pub fn turn_right(
        &mut self,
        angle_deg: u16,
    ) -> Result<(), ActuatorFault<PE, WE>> {
        let turn = steering::turn_speed(self.base_speed, angle_deg);
        self.left.drive(MotorDirection::Forward, self.base_speed)?;
        self.right.drive(MotorDirection::Reverse, turn)
    }

    /// Zero both PWM outputs without touching the direction lines.
    pub fn stop(&mut self) -> Result<(), ActuatorFault<PE, WE>> {
        self.left.coast()?;
        self.right.coast()
    }

    /// Release all four direction lines and zero both PWM outputs.
    pub fn hard_stop(&mut self) -> Result<(), ActuatorFault<PE, WE>> {
        self.left.drive(MotorDirection::Released, 0)?;
        self.right.drive(MotorDirection::Released, 0)
    }
}

/// Wall-presence thresholds, one per side.
#[derive(Debug, Clone, Copy)]
pub struct WallThresholds {
    pub front_mm: u16,
    pub back_mm: u16,
    pub left_mm: u16,
    pub right_mm: u16,
}

impl Default for WallThresholds {
    fn default() -> Self {
        Self {
            front_mm: 60,
            back_mm: 60,
            left_mm: 50,
            right_mm: 50,
        }
    }
}

/// Tunables of the drive system.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriveConfig {
    pub wall_follow: WallFollowConfig,
    pub thresholds: WallThresholds,
}

/// The whole car: five sensors, the heading estimator, and the tank drive.
pub struct DriveSystem<L, R, F, B, G, P, W> {
    pub(crate) left_ir: L,
    pub(crate) right_ir: R,
    tof_front: F,
    tof_back: B,
    pub(crate) gyro: G,
    pub(crate) heading: HeadingEstimator,
    pub drive: TankDrive<P, W>,
    pub(crate) cfg: DriveConfig,
}

impl<L, R, F, B, G, P, W, PE, WE> DriveSystem<L, R, F, B, G, P, W>
where
    L: RangeFinder,
    R: RangeFinder,
    F: RangeFinder,
    B: RangeFinder,
    G: AngularRate,
    P: OutputPin<Error = PE>,
    W: SetDutyCycle<Error = WE>,
{
    pub fn new(
        left_ir: L,
        right_ir: R,
        tof_front: F,
        tof_back: B,
        gyro: G,
        drive: TankDrive<P, W>,
        cfg: DriveConfig,
    ) -> Self {
        Self {
            left_ir,
            right_ir,
            tof_front,
            tof_back,
            gyro,
            heading: HeadingEstimator::new(),
            drive,
            cfg,
        }
    }

    /// Integrate one gyro sample into the heading and return the new angle.
    pub fn update_heading(
        &mut self,
        now_ms: u64,
    ) -> Result<f32, G::Error> {
        let rate = self.gyro.rate_dps()?;
        Ok(self.heading.update(now_ms, rate))
    }

    /// Cumulative heading angle, degrees.
    pub fn heading_deg(&self) -> f32 {
        self.heading.angle_deg()
    }

    pub fn wall_front(&mut self) -> Result<bool, F::Error> {
        Ok(self.tof_front.distance_mm()? < self.cfg.thresholds.front_mm)
    }

    pub fn wall_back(&mut self) -> Result<bool, B::Error> {
        Ok(self.tof_back.distance_mm()? < self.cfg.thresholds.back_mm)
    }

    pub fn wall_left(&mut self) -> Result<bool, L::Error> {
        Ok(self.left_ir.distance_mm()? < self.cfg.thresholds.left_mm)
    }

    pub fn wall_right(&mut self) -> Result<bool, R::Error> {
        Ok(self.right_ir.distance_mm()? < self.cfg.thresholds.right_mm)
    }

    /// Log the front and back time-of-flight ranges in centimeters.
    pub fn log_tof_ranges(&mut self) {
        match self.tof_front.distance_mm() {
            Ok(mm) => tracing::info!(front_cm = mm / 10, "front range"),
            Err(e) => tracing::warn!("front range read failed: {:?}", e),
        }
        match self.tof_back.distance_mm() {
            Ok(mm) => tracing::info!(back_cm = mm / 10, "back range"),
            Err(e) => tracing::warn!("back range read failed: {:?}", e),
        }
    }

    /// Execute a grid move: turn toward `target` from `facing`, then drive
    /// forward at the base speed. Returns the maneuver that was run.
    pub fn grid_move(
        &mut self,
        target: Compass,
        facing: Compass,
    ) -> Result<Maneuver, ActuatorFault<PE, WE>> {
        let maneuver = compass::maneuver(target, facing);
        match maneuver {
            Maneuver::Forward => {}
            Maneuver::TurnRight90 => self.drive.turn_right(90)?,
            Maneuver::TurnAround => self.drive.turn_left(180)?,
            Maneuver::TurnLeft90 => self.drive.turn_left(90)?,
        }
        self.drive.forward_at(self.drive.base_speed())?;
        Ok(maneuver)
    }
}
