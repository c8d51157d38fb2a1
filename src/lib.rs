//! Plays standard MIDI files on floppy drive stepper motors.
//!
//! A file is decoded by [`midi::MidiFile`], its tracks are converted to
//! wall-clock time and merged into one stream, and the
//! [`scheduler::Sequencer`] hands each note to a free drive in a
//! [`drive::DrivePool`]. Every drive pulses its step pin from its own
//! thread through a [`gpio::PinBus`].

pub mod cli;
pub mod config;
pub mod drive;
pub mod drive_config;
mod error;
pub mod gpio;
pub mod logging;
pub mod midi;
pub mod scheduler;
pub mod ui;

pub use error::{Error, Result};
