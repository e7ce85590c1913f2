//! Utility re-exports and helper macros for the MazeCar.
//!
//! This module re-exports the controllers, sensor seams, timing, and steering
//! math that make up the robot core:
//!
//! - `controllers`: motor driving, wall following, and command dispatch
//! - `math`: differential-steering math and the cardinal maneuver table
//! - `sensors`: range-finder, angular-rate, and analog-input abstractions
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod controllers;
pub mod math;
pub mod sensors;

pub use controllers::SystemController;
pub use embassy_time::*;
pub use math::compass::Compass;

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` for type `$t` and initializes
/// it with `$val`, returning a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
