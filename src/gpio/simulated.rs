use super::{GpioError, Pin, PinBus};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

pub const SIMULATED_PIN_COUNT: usize = 64;

/// In-memory pin levels with per-pin counters.
///
/// Pins at or above [`SIMULATED_PIN_COUNT`] are ignored.
#[derive(Debug)]
pub struct SimulatedPins {
    initialized: AtomicBool,
    levels: AtomicU64,
    outputs: AtomicU64,
    transitions: Vec<AtomicU64>,
    rising_edges: Vec<AtomicU64>,
}

impl Default for SimulatedPins {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPins {
    pub fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            levels: AtomicU64::new(0),
            outputs: AtomicU64::new(0),
            transitions: (0..SIMULATED_PIN_COUNT).map(|_| AtomicU64::new(0)).collect(),
            rising_edges: (0..SIMULATED_PIN_COUNT).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    fn mask(pin: Pin) -> Option<u64> {
        (usize::from(pin) < SIMULATED_PIN_COUNT).then(|| 1u64 << pin)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn level(&self, pin: Pin) -> bool {
        Self::mask(pin).is_some_and(|mask| self.levels.load(Ordering::SeqCst) & mask != 0)
    }

    pub fn is_output(&self, pin: Pin) -> bool {
        Self::mask(pin).is_some_and(|mask| self.outputs.load(Ordering::SeqCst) & mask != 0)
    }

    /// Number of level changes seen on `pin`.
    pub fn transitions(&self, pin: Pin) -> u64 {
        self.transitions
            .get(usize::from(pin))
            .map_or(0, |count| count.load(Ordering::SeqCst))
    }

    /// Number of low to high changes seen on `pin`; one per step pulse.
    pub fn rising_edges(&self, pin: Pin) -> u64 {
        self.rising_edges
            .get(usize::from(pin))
            .map_or(0, |count| count.load(Ordering::SeqCst))
    }
}

impl PinBus for SimulatedPins {
    fn init(&mut self) -> Result<(), GpioError> {
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn make_output(&self, pin: Pin) {
        if let Some(mask) = Self::mask(pin) {
            self.outputs.fetch_or(mask, Ordering::SeqCst);
        }
    }

    fn set(&self, pin: Pin) {
        let Some(mask) = Self::mask(pin) else {
            return;
        };
        let previous = self.levels.fetch_or(mask, Ordering::SeqCst);
        if previous & mask == 0 {
            self.transitions[usize::from(pin)].fetch_add(1, Ordering::SeqCst);
            self.rising_edges[usize::from(pin)].fetch_add(1, Ordering::SeqCst);
        }
    }

    fn clear(&self, pin: Pin) {
        let Some(mask) = Self::mask(pin) else {
            return;
        };
        let previous = self.levels.fetch_and(!mask, Ordering::SeqCst);
        if previous & mask != 0 {
            self.transitions[usize::from(pin)].fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_and_counters() {
        let mut pins = SimulatedPins::new();
        pins.init().unwrap();
        assert!(pins.is_initialized());

        pins.make_output(4);
        assert!(pins.is_output(4));
        assert!(!pins.is_output(5));

        pins.set(4);
        pins.set(4);
        assert!(pins.level(4));
        assert_eq!(pins.transitions(4), 1);

        pins.clear(4);
        pins.clear(4);
        assert!(!pins.level(4));
        assert_eq!(pins.transitions(4), 2);
        assert_eq!(pins.rising_edges(4), 1);

        pins.pulse(4);
        assert_eq!(pins.rising_edges(4), 2);
        assert!(!pins.level(4));
    }

    #[test]
    fn test_out_of_range_pins_are_ignored() {
        let pins = SimulatedPins::new();
        pins.set(200);
        assert!(!pins.level(200));
        assert_eq!(pins.transitions(200), 0);
    }
}
