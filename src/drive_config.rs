// drive_config.rs

use crate::drive::DrivePins;
use crate::gpio::{Pin, MAX_BCM_PIN};
use log::debug;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

const COMMENT_CHAR: char = '#';
const DRIVE_COMMAND: &str = "drive";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriveConfigError {
    #[error("line {line}: expected `drive <direction_pin> <step_pin>`, got '{text}'")]
    InvalidLine { line: usize, text: String },

    #[error("line {line}: invalid command '{command}'")]
    UnknownCommand { line: usize, command: String },

    #[error("line {line}: '{value}' is not a pin number")]
    InvalidPin { line: usize, value: String },

    #[error("line {line}: pin {pin} is out of range (0..=53)")]
    PinOutOfRange { line: usize, pin: u32 },

    #[error("line {line}: pin {pin} already in use")]
    PinInUse { line: usize, pin: Pin },

    #[error("no drives configured")]
    NoDrives,
}

/// Ordered list of connected drives, one per `drive` line.
///
/// ```text
/// # direction step
/// drive 17 18
/// drive 22 23
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveConfig {
    drives: Vec<DrivePins>,
}

impl DriveConfig {
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(text.parse()?)
    }

    pub fn parse(text: &str) -> Result<Self, DriveConfigError> {
        let mut drives = Vec::new();
        let mut used: HashSet<Pin> = HashSet::new();

        for (number, raw) in text.lines().enumerate() {
            let line = number + 1;
            let content = raw.split(COMMENT_CHAR).next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }

            let tokens: Vec<&str> = content.split_whitespace().collect();
            let [command, direction, step] = tokens[..] else {
                return Err(DriveConfigError::InvalidLine {
                    line,
                    text: content.to_string(),
                });
            };
            if command != DRIVE_COMMAND {
                return Err(DriveConfigError::UnknownCommand {
                    line,
                    command: command.to_string(),
                });
            }

            let pins = DrivePins::new(parse_pin(line, direction)?, parse_pin(line, step)?);
            for pin in [pins.direction, pins.step] {
                if !used.insert(pin) {
                    return Err(DriveConfigError::PinInUse { line, pin });
                }
            }
            debug!("Drive {}: direction pin {}, step pin {}", drives.len(), pins.direction, pins.step);
            drives.push(pins);
        }

        if drives.is_empty() {
            return Err(DriveConfigError::NoDrives);
        }
        Ok(Self { drives })
    }

    pub fn drives(&self) -> &[DrivePins] {
        &self.drives
    }

    pub fn len(&self) -> usize {
        self.drives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drives.is_empty()
    }
}

impl FromStr for DriveConfig {
    type Err = DriveConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_pin(line: usize, value: &str) -> Result<Pin, DriveConfigError> {
    let pin: u32 = value.parse().map_err(|_| DriveConfigError::InvalidPin {
        line,
        value: value.to_string(),
    })?;
    match Pin::try_from(pin) {
        Ok(pin) if pin <= MAX_BCM_PIN => Ok(pin),
        _ => Err(DriveConfigError::PinOutOfRange { line, pin }),
    }
}
