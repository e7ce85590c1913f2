//! Differential-steering math for a two-motor tank drive.
//!
//! Speeds are PWM duty units in `[0, 255]`. All arithmetic saturates into that
//! window rather than rejecting inputs, so extreme sensor readings produce a
//! pinned motor command instead of an error.

/// Upper bound of the duty-unit speed domain.
pub const DUTY_MAX: u8 = 255;

/// Saturate an intermediate speed computation into the duty window.
pub fn clamp_duty(speed: i32) -> u8 {
    speed.clamp(0, DUTY_MAX as i32) as u8
}

/// Split a base speed into per-side speeds that steer back toward the corridor
/// centerline.
///
/// `error = left_cm - right_cm`; the left side slows by `error * k` while the
/// right side speeds up by the same amount, both saturated to `[0, 255]`.
pub fn proportional_split(
    base: u8,
    left_cm: i32,
    right_cm: i32,
    correction_factor: i32,
) -> (u8, u8) {
    let error = left_cm - right_cm;
    let left = base as i32 - error * correction_factor;
    let right = base as i32 + error * correction_factor;
    (clamp_duty(left), clamp_duty(right))
}

/// Speed of the inner wheel during a pivot turn.
///
/// Linear interpolation from `base` at 0 degrees down to 0 at 180 degrees;
/// angles past 180 saturate to a full stop of the inner wheel. The angle only
/// shapes the speed, it is not a closed-loop turn target.
pub fn turn_speed(
    base: u8,
    angle_deg: u16,
) -> u8 {
    let angle = angle_deg.min(180) as u32;
    (base as u32 * (180 - angle) / 180) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_split_balanced() {
        assert_eq!(proportional_split(150, 10, 10, 10), (150, 150));
    }

    #[test]
    fn proportional_split_steers_away_from_near_side() {
        // Closer to the right wall: right side slows, left side speeds up.
        let (left, right) = proportional_split(150, 12, 8, 10);
        assert_eq!(left, 110);
        assert_eq!(right, 190);
    }

    #[test]
    fn proportional_split_saturates_on_extreme_error() {
        let (left, right) = proportional_split(150, 0, 10_000, 10);
        assert_eq!((left, right), (255, 0));

        let (left, right) = proportional_split(150, 10_000, 0, 10);
        assert_eq!((left, right), (0, 255));

        // i32 extremes must still land inside the duty window.
        let (left, right) = proportional_split(255, i32::MAX / 2, i32::MIN / 2, 1);
        assert!(left <= DUTY_MAX && right <= DUTY_MAX);
    }

    #[test]
    fn turn_speed_endpoints() {
        assert_eq!(turn_speed(150, 0), 150);
        assert_eq!(turn_speed(150, 180), 0);
    }

    #[test]
    fn turn_speed_is_linear_and_saturating() {
        assert_eq!(turn_speed(150, 90), 75);
        assert_eq!(turn_speed(200, 45), 150);
        // Past half a revolution the inner wheel is already stopped.
        assert_eq!(turn_speed(150, 270), 0);
    }
}
