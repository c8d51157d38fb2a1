use crate::gpio::PiModel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path of the drive configuration file
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    /// Drop every note by this many octaves; negative values raise them
    #[arg(short = 'd', long, value_name = "OCTAVES", allow_negative_numbers = true)]
    pub drop_factor: Option<f64>,

    /// Mute channels as track:channel,track:channel,...; a bare track
    /// mutes every channel on it
    #[arg(short = 'm', long, value_name = "MUTE")]
    pub mute: Option<String>,

    /// Print lyrics (if available)
    #[arg(short = 'l', long)]
    pub lyrics: bool,

    /// Optional settings file layered under the command line
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Drive an in-memory pin model instead of the GPIO registers
    #[arg(long)]
    pub simulate: bool,

    /// SoC family, selects the GPIO register address
    #[arg(long, value_enum, value_name = "MODEL")]
    pub pi_model: Option<PiModel>,

    /// Print the tracks of the file and exit
    #[arg(long)]
    pub list_tracks: bool,

    /// The MIDI file that should be played
    #[arg(value_name = "MIDIFILE")]
    pub midi_file: PathBuf,
}
