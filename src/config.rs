// config.rs

use crate::cli::Args;
use crate::gpio::PiModel;
use crate::midi::MuteSet;
use config::{Config, Environment, File};
use log::{debug, info};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_DRIVE_CONFIG: &str = "drives.cfg";
pub const DEFAULT_SETTINGS_FILE: &str = "floppymusic.toml";
pub const ENV_PREFIX: &str = "FLOPPYMUSIC";

const MIDI_CHANNELS: u16 = 16;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("invalid mute entry '{0}' (expected track or track:channel)")]
    InvalidMute(String),

    #[error("{0}")]
    InvalidPiModel(String),
}

/// Resolved run configuration.
///
/// Layered from defaults, an optional settings file, `FLOPPYMUSIC_*`
/// environment variables and finally the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub midi_path: PathBuf,
    pub drive_config: PathBuf,
    /// Octaves to drop; the drop factor is `2^octaves`.
    pub octaves: f64,
    pub mutes: MuteSet,
    pub lyrics: bool,
    pub simulate: bool,
    pub pi_model: PiModel,
    pub list_tracks: bool,
}

impl Settings {
    pub fn load(args: &Args) -> Result<Self, SettingsError> {
        let (settings_file, required) = match &args.settings {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
        };
        debug!("Settings file: {:?} (required: {})", settings_file, required);

        let layered = Config::builder()
            .set_default("drive_config", DEFAULT_DRIVE_CONFIG)?
            .set_default("drop_factor", 0.0)?
            .set_default("mute", "")?
            .set_default("lyrics", false)?
            .set_default("simulate", false)?
            .set_default("pi_model", PiModel::default().to_string())?
            .add_source(File::from(settings_file).required(required))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .set_override_option(
                "drive_config",
                args.config_path
                    .as_ref()
                    .map(|path| path.display().to_string()),
            )?
            .set_override_option("drop_factor", args.drop_factor)?
            .set_override_option("mute", args.mute.clone())?
            .set_override_option("lyrics", args.lyrics.then_some(true))?
            .set_override_option("simulate", args.simulate.then_some(true))?
            .set_override_option("pi_model", args.pi_model.map(|model| model.to_string()))?
            .build()?;

        let settings = Self {
            midi_path: args.midi_file.clone(),
            drive_config: PathBuf::from(layered.get_string("drive_config")?),
            octaves: layered.get_float("drop_factor")?,
            mutes: parse_mutes(&layered.get_string("mute")?)?,
            lyrics: layered.get_bool("lyrics")?,
            simulate: layered.get_bool("simulate")?,
            pi_model: layered
                .get_string("pi_model")?
                .parse()
                .map_err(SettingsError::InvalidPiModel)?,
            list_tracks: args.list_tracks,
        };
        info!(
            "Settings: drives={:?}, drop={} octave(s), {} muted combination(s), simulate={}",
            settings.drive_config,
            settings.octaves,
            settings.mutes.len(),
            settings.simulate
        );
        Ok(settings)
    }

    pub fn drop_factor(&self) -> f64 {
        2f64.powf(self.octaves)
    }
}

/// Parses `track:channel,track,...`. A bare track mutes all of its
/// channels.
pub fn parse_mutes(list: &str) -> Result<MuteSet, SettingsError> {
    let mut mutes = MuteSet::new();
    for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let invalid = || SettingsError::InvalidMute(entry.to_string());
        match entry.split_once(':') {
            Some((track, channel)) => {
                let track: usize = track.trim().parse().map_err(|_| invalid())?;
                let channel: u16 = channel.trim().parse().map_err(|_| invalid())?;
                if channel >= MIDI_CHANNELS {
                    return Err(invalid());
                }
                mutes.mute(track, channel);
            }
            None => {
                let track: usize = entry.parse().map_err(|_| invalid())?;
                mutes.mute_track(track);
            }
        }
    }
    Ok(mutes)
}
