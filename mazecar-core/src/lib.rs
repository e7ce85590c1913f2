//! Core drivers and control logic for the MazeCar on no-std embedded platforms.
//!
//! For a desktop bring-up harness, see the `mock-rig` binary in this workspace.
#![no_std]

pub mod utils;
