//! Corridor wall-following control loop.
//!
//! Fuses the two side distances and the integrated heading into per-side
//! speeds with fixed-step bang-bang corrections, then drives the motors at a
//! fixed cadence until the run duration elapses or an external stop fires.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::utils::controllers::drive::{ActuatorFault, DriveSystem};
use crate::utils::math::steering::clamp_duty;
use crate::utils::sensors::{AngularRate, RangeFinder};

/// External stop request for an in-flight wall-follow run.
pub static FOLLOW_STOP: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Tunables of the wall-follow loop.
#[derive(Debug, Clone, Copy)]
pub struct WallFollowConfig {
    /// Nominal duty for both sides before corrections.
    pub base_speed: u8,
    /// Desired clearance from each wall, centimeters.
    pub target_cm: i32,
    /// Dead band around the target before a correction fires.
    pub tolerance_cm: i32,
    /// Fixed duty step applied per violated check.
    pub correction_step: i32,
    /// Heading deviation that triggers a yaw correction, degrees.
    pub angle_threshold_deg: f32,
    /// Wall-clock length of one run.
    pub run_duration: Duration,
    /// Cadence of the control loop.
    pub sample_period: Duration,
    /// When false the run is a dry run: decided speeds are only logged, and
    /// no motor write is issued, terminal stop included.
    pub apply_output: bool,
    /// Consecutive sensor failures tolerated before aborting the run.
    pub max_sensor_failures: u8,
}

impl Default for WallFollowConfig {
    fn default() -> Self {
        Self {
            base_speed: 150,
            target_cm: 2,
            tolerance_cm: 1,
            correction_step: 50,
            angle_threshold_deg: 5.0,
            run_duration: Duration::from_millis(5000),
            sample_period: Duration::from_millis(10),
            apply_output: true,
            max_sensor_failures: 5,
        }
    }
}

/// How a wall-follow run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    /// The run duration elapsed.
    Completed,
    /// An external stop request fired.
    Stopped,
}

/// Why a wall-follow run aborted. Sensor details are logged at the failure
/// site; the motor fault carries the output-stage error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowError<PE, WE> {
    /// Too many consecutive sensor read failures.
    Sensors,
    Actuator(ActuatorFault<PE, WE>),
}

/// Decide per-side speeds for one control iteration.
///
/// Starts both sides at the base speed, then stacks fixed-step corrections
/// from the left-wall check, the right-wall check, and the heading check.
/// Checks use strict inequalities, so a distance exactly on the dead-band
/// edge does not fire. Simultaneous violations compound or cancel; the result
/// is saturated to `[0, 255]`.
pub fn decide(
    cfg: &WallFollowConfig,
    left_cm: i32,
    right_cm: i32,
    angle_deg: f32,
) -> (u8, u8) {
    let mut left = cfg.base_speed as i32;
    let mut right = cfg.base_speed as i32;
    let step = cfg.correction_step;
    let near = cfg.target_cm - cfg.tolerance_cm;
    let far = cfg.target_cm + cfg.tolerance_cm;

    if left_cm < near {
        // Hugging the left wall.
        left -= step;
        right += step;
    } else if left_cm > far {
        left += step;
        right -= step;
    }

    if right_cm < near {
        // Hugging the right wall.
        left -= step;
        right += step;
    } else if right_cm > far {
        left += step;
        right -= step;
    }

    if angle_deg > cfg.angle_threshold_deg {
        // Veering right.
        left += step;
        right -= step;
    } else if angle_deg < -cfg.angle_threshold_deg {
        left -= step;
        right += step;
    }

    (clamp_duty(left), clamp_duty(right))
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
    /// Follow the corridor until the configured duration elapses or `stop`
    /// fires, then hard-stop.
    ///
    /// The heading estimate restarts from zero at the top of each run. A
    /// transient sensor failure holds the last commanded speeds; after
    /// `max_sensor_failures` consecutive failures the run aborts with a
    /// hard stop.
    pub async fn wall_follow(
        &mut self,
        stop: &Signal<CriticalSectionRawMutex, ()>,
    ) -> Result<FollowOutcome, FollowError<PE, WE>> {
        let cfg = self.cfg.wall_follow;
        let deadline = Instant::now() + cfg.run_duration;
        let mut failures: u8 = 0;
        let mut speeds = (cfg.base_speed, cfg.base_speed);

        // A stale request from a previous run must not cancel this one.
        stop.reset();
        // Each run measures heading deviation from where it starts, so an
        // idle gap between runs is never integrated.
        self.heading.reset();

        let outcome = loop {
            if Instant::now() >= deadline {
                break FollowOutcome::Completed;
            }
            if stop.try_take().is_some() {
                break FollowOutcome::Stopped;
            }

            match self.sample(Instant::now().as_millis()) {
                Ok((left_cm, right_cm, angle_deg)) => {
                    failures = 0;
                    speeds = decide(&cfg, left_cm, right_cm, angle_deg);
                    tracing::info!(
                        angle = angle_deg,
                        left_cm = left_cm,
                        right_cm = right_cm,
                        left_speed = speeds.0,
                        right_speed = speeds.1,
                        "wall follow"
                    );
                }
                Err(()) => {
                    failures += 1;
                    if failures >= cfg.max_sensor_failures {
                        if cfg.apply_output {
                            self.drive.hard_stop().map_err(FollowError::Actuator)?;
                        }
                        return Err(FollowError::Sensors);
                    }
                    // Hold the last commanded speeds until the sensors
                    // recover.
                }
            }

            if cfg.apply_output {
                self.drive
                    .apply(speeds.0, speeds.1)
                    .map_err(FollowError::Actuator)?;
            }

            Timer::after(cfg.sample_period).await;
        };

        if cfg.apply_output {
            self.drive.hard_stop().map_err(FollowError::Actuator)?;
        }
        Ok(outcome)
    }

    /// One synchronized sensor sample: side distances in centimeters and the
    /// updated heading. Failures are logged here and collapsed to `Err(())`.
    fn sample(
        &mut self,
        now_ms: u64,
    ) -> Result<(i32, i32, f32), ()> {
        let left_cm = self
            .left_ir
            .distance_mm()
            .map_err(|e| tracing::warn!("left range read failed: {:?}", e))?
            / 10;
        let right_cm = self
            .right_ir
            .distance_mm()
            .map_err(|e| tracing::warn!("right range read failed: {:?}", e))?
            / 10;
        let rate = self
            .gyro
            .rate_dps()
            .map_err(|e| tracing::warn!("gyro read failed: {:?}", e))?;
        let angle_deg = self.heading.update(now_ms, rate);
        Ok((left_cm as i32, right_cm as i32, angle_deg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> WallFollowConfig {
        WallFollowConfig::default()
    }

    #[test]
    fn centered_corridor_holds_base_speed() {
        assert_eq!(decide(&cfg(), 2, 2, 0.0), (150, 150));
    }

    #[test]
    fn dead_band_edges_do_not_fire() {
        // target 2, tolerance 1: exactly 1 and exactly 3 are inside the band.
        assert_eq!(decide(&cfg(), 1, 2, 0.0), (150, 150));
        assert_eq!(decide(&cfg(), 3, 2, 0.0), (150, 150));
        assert_eq!(decide(&cfg(), 2, 1, 0.0), (150, 150));
        assert_eq!(decide(&cfg(), 2, 3, 0.0), (150, 150));
    }

    #[test]
    fn one_unit_past_the_edge_fires() {
        assert_eq!(decide(&cfg(), 0, 2, 0.0), (100, 200));
        assert_eq!(decide(&cfg(), 4, 2, 0.0), (200, 100));
    }

    #[test]
    fn left_close_and_right_far_cancel_exactly() {
        // Touching the left wall (0 cm) while the right wall is far (5 cm):
        // left = 150 + 50 (right far) - 50 (left close) = 150, and mirrored
        // on the right. The corrections cancel to a straight drive.
        assert_eq!(decide(&cfg(), 0, 5, 0.0), (150, 150));
    }

    #[test]
    fn heading_corrections_stack_with_wall_corrections() {
        // Veering right alone.
        assert_eq!(decide(&cfg(), 2, 2, 6.0), (200, 100));
        // Veering left alone.
        assert_eq!(decide(&cfg(), 2, 2, -6.0), (100, 200));
        // Threshold is strict: exactly 5 degrees does not fire.
        assert_eq!(decide(&cfg(), 2, 2, 5.0), (150, 150));
        // Left close plus veering right partially cancels.
        assert_eq!(decide(&cfg(), 0, 2, 6.0), (150, 150));
    }

    #[test]
    fn compounded_corrections_saturate() {
        let mut c = cfg();
        c.base_speed = 240;
        // Both walls far and veering right: +150 on the left side.
        assert_eq!(decide(&c, 10, 10, 6.0), (255, 90));
    }
}
