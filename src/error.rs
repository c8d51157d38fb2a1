use crate::config::SettingsError;
use crate::drive_config::DriveConfigError;
use crate::gpio::GpioError;
use crate::midi::MidiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("MIDI file: {0}")]
    Midi(#[from] MidiError),

    #[error("GPIO: {0}")]
    Gpio(#[from] GpioError),

    #[error("drive config: {0}")]
    DriveConfig(#[from] DriveConfigError),

    #[error("settings: {0}")]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
