//! Sensor abstractions for the MazeCar.
//!
//! Hardware-facing drivers live behind three small seams so the control loops
//! can run against real buses or host-side fakes:
//!
//! - [`RangeFinder`]: any distance sensor reporting millimeters
//! - [`AngularRate`]: the yaw axis of a gyroscope, degrees per second
//! - [`AnalogInput`]: a one-shot raw ADC read (embedded-hal 1.0 carries no ADC
//!   trait, so the crate defines its own)

pub mod heading;
pub mod sharp_ir;
pub mod vl6180;

use core::fmt::Debug;

/// Errors from a sensor read, distinct from valid extreme readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError<E> {
    /// The underlying bus transaction failed.
    Bus(E),
    /// The device never reported a result within the poll budget.
    Timeout,
    /// The device at the expected address identified as something else.
    UnexpectedDevice,
}

/// One-shot raw analog read, in ADC counts.
pub trait AnalogInput {
    type Error: Debug;

    fn read(&mut self) -> Result<u16, Self::Error>;
}

/// A distance sensor reporting its current estimate in millimeters.
pub trait RangeFinder {
    type Error: Debug;

    fn distance_mm(&mut self) -> Result<u16, Self::Error>;
}

/// Yaw-axis angular rate in degrees per second.
pub trait AngularRate {
    type Error: Debug;

    fn rate_dps(&mut self) -> Result<f32, Self::Error>;

    /// Power the sensor up or down. Default is a no-op for sources without a
    /// power mode.
    fn set_enabled(
        &mut self,
        _enabled: bool,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}
