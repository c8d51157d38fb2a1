//! Floppy drives as square-wave voices
//!
//! - [`Drive`] owns one stepper motor and the thread that pulses it
//! - [`DrivePool`] binds merged MIDI channels to free drives
//! - [`PitchTable`] maps note numbers to step frequencies
//!
mod actuator;
mod pitch;
mod pool;

pub use actuator::{ActuatorOptions, Drive, Stepper, MAX_STEPS, RESEED_INTERVAL};
pub use pitch::{PitchTable, BASE_FREQUENCIES};
pub use pool::DrivePool;

use crate::gpio::Pin;

/// Pins one drive is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrivePins {
    pub direction: Pin,
    pub step: Pin,
}

impl DrivePins {
    pub fn new(direction: Pin, step: Pin) -> Self {
        Self { direction, step }
    }
}

/// Something that can sound a tone. A frequency of zero is silence.
pub trait Voice {
    fn set_frequency(&self, frequency: f64);
}
