//! VL6180-class time-of-flight rangers for the front and back of the car.
//!
//! Minimal single-shot driver over `embedded_hal::i2c::I2c`: verify the model
//! id at construction, kick off a range measurement, poll the interrupt status
//! with a bounded attempt budget, then read the result in millimeters. Two
//! units share the bus through `embedded_hal_bus::i2c::RefCellDevice` and are
//! addressed as channels 0 (front) and 1 (back).

use core::cell::RefCell;
use core::fmt::Debug;

use embedded_hal::i2c::I2c;
use embedded_hal_bus::i2c::RefCellDevice;

use crate::utils::sensors::{RangeFinder, SensorError};

/// 16-bit register map subset.
const REG_MODEL_ID: u16 = 0x0000;
const REG_SYSRANGE_START: u16 = 0x0018;
const REG_SYSTEM_INTERRUPT_CLEAR: u16 = 0x0015;
const REG_RESULT_INTERRUPT_STATUS: u16 = 0x004F;
const REG_RESULT_RANGE_VAL: u16 = 0x0062;

const MODEL_ID: u8 = 0xB4;
const RANGE_START_SINGLE_SHOT: u8 = 0x01;
const RANGE_COMPLETE: u8 = 0x04;
const INTERRUPT_CLEAR_ALL: u8 = 0x07;

/// Status polls before a measurement is declared lost.
const POLL_BUDGET: u8 = 50;

/// Bus addresses of the two fitted units.
pub const FRONT_ADDRESS: u8 = 0x29;
pub const BACK_ADDRESS: u8 = 0x2A;

/// Channel index of a unit in the fitted pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TofChannel {
    Front = 0,
    Back = 1,
}

/// Single VL6180 unit.
pub struct Vl6180<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C, E> Vl6180<I2C>
where
    I2C: I2c<Error = E>,
    E: Debug,
{
    /// Probe the device and verify its model id.
    pub fn new(
        i2c: I2C,
        address: u8,
    ) -> Result<Self, SensorError<E>> {
        let mut dev = Self { i2c, address };
        if dev.read_reg(REG_MODEL_ID)? != MODEL_ID {
            return Err(SensorError::UnexpectedDevice);
        }
        Ok(dev)
    }

    /// Run one single-shot range measurement, millimeters.
    ///
    /// The result register is 8 bits wide, so readings saturate at 255 mm.
    pub fn range_mm(&mut self) -> Result<u16, SensorError<E>> {
        self.write_reg(REG_SYSRANGE_START, RANGE_START_SINGLE_SHOT)?;
        for _ in 0..POLL_BUDGET {
            if self.read_reg(REG_RESULT_INTERRUPT_STATUS)? & RANGE_COMPLETE != 0 {
                let mm = self.read_reg(REG_RESULT_RANGE_VAL)?;
                self.write_reg(REG_SYSTEM_INTERRUPT_CLEAR, INTERRUPT_CLEAR_ALL)?;
                return Ok(mm as u16);
            }
        }
        Err(SensorError::Timeout)
    }

    fn write_reg(
        &mut self,
        reg: u16,
        value: u8,
    ) -> Result<(), SensorError<E>> {
        let [hi, lo] = reg.to_be_bytes();
        self.i2c
            .write(self.address, &[hi, lo, value])
            .map_err(SensorError::Bus)
    }

    fn read_reg(
        &mut self,
        reg: u16,
    ) -> Result<u8, SensorError<E>> {
        let [hi, lo] = reg.to_be_bytes();
        let mut buf = [0u8];
        self.i2c
            .write_read(self.address, &[hi, lo], &mut buf)
            .map_err(SensorError::Bus)?;
        Ok(buf[0])
    }
}

impl<I2C, E> RangeFinder for Vl6180<I2C>
where
    I2C: I2c<Error = E>,
    E: Debug,
{
    type Error = SensorError<E>;

    fn distance_mm(&mut self) -> Result<u16, Self::Error> {
        self.range_mm()
    }
}

/// Front/back ranger pair on a shared bus.
pub struct TofPair<'a, I2C> {
    pub front: Vl6180<RefCellDevice<'a, I2C>>,
    pub back: Vl6180<RefCellDevice<'a, I2C>>,
}

impl<'a, I2C, E> TofPair<'a, I2C>
where
    I2C: I2c<Error = E>,
    E: Debug,
{
    /// Probe both units on the shared bus.
    pub fn new(bus: &'a RefCell<I2C>) -> Result<Self, SensorError<E>> {
        Ok(Self {
            front: Vl6180::new(RefCellDevice::new(bus), FRONT_ADDRESS)?,
            back: Vl6180::new(RefCellDevice::new(bus), BACK_ADDRESS)?,
        })
    }

    /// Read one channel of the pair, millimeters.
    pub fn distance_mm(
        &mut self,
        channel: TofChannel,
    ) -> Result<u16, SensorError<E>> {
        match channel {
            TofChannel::Front => self.front.range_mm(),
            TofChannel::Back => self.back.range_mm(),
        }
    }
}
