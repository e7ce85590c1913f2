//! Yaw heading from gyro integration.
//!
//! The heading is a cumulative signed angle in degrees, accumulated by
//! integrating the yaw rate over wall-clock intervals. There is no wrap
//! handling and no drift correction: the angle is only meaningful as a
//! relative deviation over a short window, which is all the corridor
//! controller needs.

use core::fmt::Debug;

use embedded_hal::i2c::I2c;
use icm42670::{Address as ImuAddress, Error as ImuError, Icm42670, PowerMode};

use crate::utils::sensors::AngularRate;

/// Integrates yaw rate samples into a cumulative heading angle.
///
/// Owns its previous-timestamp state as instance fields. The estimator can
/// live as long as the drive system; callers [`reset`](Self::reset) it at the
/// start of a control session so an idle gap is never integrated.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadingEstimator {
    prev_time_ms: Option<u64>,
    angle_deg: f32,
}

impl HeadingEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one rate sample into the heading and return the updated angle.
    ///
    /// The first sample only latches the timestamp; integration starts from
    /// the second.
    pub fn update(
        &mut self,
        now_ms: u64,
        rate_dps: f32,
    ) -> f32 {
        if let Some(prev) = self.prev_time_ms.replace(now_ms) {
            let elapsed_ms = now_ms.saturating_sub(prev);
            self.angle_deg += rate_dps * elapsed_ms as f32 / 1000.0;
        }
        self.angle_deg
    }

    /// Cumulative heading angle in degrees, signed and unbounded.
    pub fn angle_deg(&self) -> f32 {
        self.angle_deg
    }

    /// Zero the angle and drop the latched timestamp.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Yaw axis of an ICM-42670 IMU as an [`AngularRate`] source.
pub struct ImuYaw<I2C> {
    imu: Icm42670<I2C>,
}

impl<I2C, E> ImuYaw<I2C>
where
    I2C: I2c<Error = E>,
    E: Debug,
{
    /// Probe the IMU at its primary address.
    pub fn new(i2c: I2C) -> Result<Self, ImuError<E>> {
        Ok(Self {
            imu: Icm42670::new(i2c, ImuAddress::Primary)?,
        })
    }
}

impl<I2C, E> AngularRate for ImuYaw<I2C>
where
    I2C: I2c<Error = E>,
    E: Debug,
{
    type Error = ImuError<E>;

    fn rate_dps(&mut self) -> Result<f32, Self::Error> {
        Ok(self.imu.gyro_norm()?.z)
    }

    fn set_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Self::Error> {
        let mode = if enabled {
            PowerMode::SixAxisLowNoise
        } else {
            PowerMode::Sleep
        };
        self.imu.set_power_mode(mode)
    }
}
