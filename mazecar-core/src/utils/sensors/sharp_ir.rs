//! Sharp GP2Y0A21-class analog IR range sensor.
//!
//! The sensor outputs a voltage that falls off with distance; the conversion
//! uses the usual power-law fit `cm = 27.86 * volts^-1.15`. Readings outside
//! the sensor's usable window saturate to the window edge instead of failing,
//! so a disconnected or washed-out sensor looks like a far wall rather than an
//! error.

use libm::powf;

use crate::utils::sensors::{AnalogInput, RangeFinder};

/// Power-law fit coefficients for the GP2Y0A21 curve.
const CURVE_SCALE: f32 = 27.86;
const CURVE_EXPONENT: f32 = -1.15;

/// Full-scale ADC counts (10-bit converter) and its reference voltage.
const ADC_FULL_SCALE: f32 = 1023.0;
const ADC_VREF: f32 = 5.0;

/// Usable measurement window of the sensor, centimeters.
pub const MIN_RANGE_CM: u16 = 4;
pub const MAX_RANGE_CM: u16 = 80;

/// Analog IR ranger on a single ADC channel.
pub struct SharpIr<A> {
    adc: A,
}

impl<A: AnalogInput> SharpIr<A> {
    pub fn new(adc: A) -> Self {
        Self { adc }
    }

    /// Current distance estimate in centimeters, saturated to the sensor
    /// window.
    pub fn distance_cm(&mut self) -> Result<u16, A::Error> {
        let counts = self.adc.read()?;
        Ok(counts_to_cm(counts))
    }
}

impl<A: AnalogInput> RangeFinder for SharpIr<A> {
    type Error = A::Error;

    fn distance_mm(&mut self) -> Result<u16, Self::Error> {
        Ok(self.distance_cm()? * 10)
    }
}

/// Convert raw ADC counts into centimeters via the power-law curve.
pub fn counts_to_cm(counts: u16) -> u16 {
    if counts == 0 {
        // No signal reads as an open corridor.
        return MAX_RANGE_CM;
    }
    let volts = counts as f32 * (ADC_VREF / ADC_FULL_SCALE);
    let cm = CURVE_SCALE * powf(volts, CURVE_EXPONENT);
    if cm >= MAX_RANGE_CM as f32 {
        MAX_RANGE_CM
    } else if cm <= MIN_RANGE_CM as f32 {
        MIN_RANGE_CM
    } else {
        cm as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    struct FixedAdc(u16);

    impl AnalogInput for FixedAdc {
        type Error = Infallible;

        fn read(&mut self) -> Result<u16, Self::Error> {
            Ok(self.0)
        }
    }

    #[test]
    fn zero_counts_saturate_far() {
        assert_eq!(counts_to_cm(0), MAX_RANGE_CM);
    }

    #[test]
    fn full_scale_counts_saturate_near() {
        assert_eq!(counts_to_cm(1023), MIN_RANGE_CM);
    }

    #[test]
    fn distance_falls_as_voltage_rises() {
        // 1.0 V and 3.0 V on a 5 V / 10-bit converter.
        let far = counts_to_cm(205);
        let near = counts_to_cm(614);
        assert!(near < far, "near {} far {}", near, far);
        assert!((MIN_RANGE_CM..=MAX_RANGE_CM).contains(&near));
        assert!((MIN_RANGE_CM..=MAX_RANGE_CM).contains(&far));
    }

    #[test]
    fn range_finder_reports_millimeters() {
        let mut ir = SharpIr::new(FixedAdc(205));
        let cm = counts_to_cm(205);
        assert_eq!(ir.distance_mm().unwrap(), cm * 10);
    }
}
