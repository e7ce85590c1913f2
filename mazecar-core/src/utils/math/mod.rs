//! Math utilities for the MazeCar.
//!
//! This module provides differential-steering math and the cardinal-direction
//! maneuver table used for grid navigation.

pub mod compass;
pub mod steering;
