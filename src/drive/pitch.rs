use log::warn;

/// One equal-tempered octave starting at middle C, in Hz.
pub const BASE_FREQUENCIES: [f64; 12] = [
    261.626, 277.183, 293.665, 311.127, 329.628, 349.228, 369.994, 391.995, 415.305, 440.000,
    466.164, 493.883,
];

/// Note to step frequency mapping.
///
/// Every note is folded into the base octave and divided by the drop
/// factor, so a factor of `2^n` plays everything `n` octaves lower.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchTable {
    drop_factor: f64,
}

impl Default for PitchTable {
    fn default() -> Self {
        Self { drop_factor: 1.0 }
    }
}

impl PitchTable {
    pub fn new(drop_factor: f64) -> Self {
        if !(drop_factor.is_finite() && drop_factor > 0.0) {
            warn!("Ignoring invalid drop factor {}, using 1", drop_factor);
            return Self::default();
        }
        Self { drop_factor }
    }

    /// Table for a drop of `octaves` (negative raises the pitch).
    pub fn from_octaves(octaves: f64) -> Self {
        Self::new(2f64.powf(octaves))
    }

    pub fn drop_factor(&self) -> f64 {
        self.drop_factor
    }

    pub fn frequency(&self, note: u8) -> f64 {
        BASE_FREQUENCIES[usize::from(note % 12)] / self.drop_factor
    }
}
