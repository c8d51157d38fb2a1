//! Pin access for the drive actuators
//!
//! Actuators only ever see the [`PinBus`] trait: configure a pin as an
//! output once, then set or clear it. Two backends exist:
//! - [`MappedGpio`] writes the BCM283x GPIO registers through `/dev/mem`
//! - [`SimulatedPins`] keeps levels and edge counters in memory
//!
mod mapped;
mod simulated;

pub use mapped::{MappedGpio, PiModel, MAX_BCM_PIN};
pub use simulated::{SimulatedPins, SIMULATED_PIN_COUNT};

use thiserror::Error;

/// BCM pin number.
pub type Pin = u8;

#[derive(Error, Debug)]
pub enum GpioError {
    #[error("can't open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("mmap of GPIO registers at {base:#x} failed: {source}")]
    Map {
        base: u64,
        #[source]
        source: std::io::Error,
    },
}

/// Set/clear access to output pins.
///
/// `init` runs once before any other call. After that the bus is shared
/// between actuator threads; each actuator only touches its own pins.
pub trait PinBus: Send + Sync {
    fn init(&mut self) -> Result<(), GpioError>;

    /// Switches `pin` to output mode.
    fn make_output(&self, _pin: Pin) {}

    fn set(&self, pin: Pin);

    fn clear(&self, pin: Pin);

    /// One step pulse.
    fn pulse(&self, pin: Pin) {
        self.set(pin);
        self.clear(pin);
    }
}
