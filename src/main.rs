use clap::Parser;
use crossbeam::channel;
use floppymusic::{
    cli::Args,
    config::Settings,
    drive::{ActuatorOptions, DrivePool, PitchTable},
    drive_config::DriveConfig,
    gpio::{MappedGpio, PinBus, SimulatedPins},
    logging,
    midi::{MidiFile, TrackSummary},
    scheduler::{Sequencer, ThreadDelay},
    ui::{format_clock, run_progress},
};
use std::sync::Arc;
use std::thread;

fn main() {
    initialize_logging();
    let args = parse_command_line_arguments();

    if let Err(e) = run(&args) {
        let error_msg = format!("Error: {}", e);
        log::error!("{}", error_msg);
        eprintln!("{}", error_msg);
        std::process::exit(1);
    }
    log::info!("Application exiting");
}

fn initialize_logging() {
    if let Err(e) = logging::init_logger() {
        eprintln!("Logger initialization failed: {}", e);
    }
    log::info!("Application starting");
}

fn parse_command_line_arguments() -> Args {
    Args::parse()
}

fn run(args: &Args) -> floppymusic::Result<()> {
    let settings = Settings::load(args)?;

    println!("Parsing MIDI file {}...", settings.midi_path.display());
    let midi = MidiFile::open(&settings.midi_path)?;

    if settings.list_tracks {
        list_tracks(&midi);
        return Ok(());
    }

    let drive_config = DriveConfig::open(&settings.drive_config)?;
    println!(
        "Loaded {} drive(s) from {}",
        drive_config.len(),
        settings.drive_config.display()
    );

    let bus = create_pin_bus(&settings)?;
    println!("Reseeding drives...");
    let mut pool = DrivePool::with_drives(
        drive_config.drives(),
        bus,
        ActuatorOptions::default(),
        PitchTable::new(settings.drop_factor()),
    )?;

    let track = midi.into_merged(&settings.mutes);

    let (tx, rx) = channel::unbounded();
    let show_lyrics = settings.lyrics;
    let progress = thread::Builder::new()
        .name("progress".into())
        .spawn(move || run_progress(rx, show_lyrics))?;

    println!("Playing...");
    let summary = Sequencer::new(&mut pool, ThreadDelay::new())
        .with_progress(tx)
        .play(&track);

    if progress.join().is_err() {
        log::warn!("Progress thread panicked");
    }
    pool.shutdown();

    println!(
        "Done: {} notes played, {} dropped",
        summary.notes_played, summary.notes_dropped
    );
    Ok(())
}

fn create_pin_bus(settings: &Settings) -> floppymusic::Result<Arc<dyn PinBus>> {
    if settings.simulate {
        log::info!("Using simulated pins");
        let mut pins = SimulatedPins::new();
        pins.init()?;
        return Ok(Arc::new(pins));
    }

    let mut gpio = MappedGpio::new(settings.pi_model);
    log::info!("Mapping GPIO registers for {}", gpio.model());
    gpio.init()?;
    Ok(Arc::new(gpio))
}

fn list_tracks(midi: &MidiFile) {
    println!(
        "Format {}, {} track(s), {} ticks per quarter note",
        u16::from(midi.format),
        midi.track_count,
        midi.time_division
    );
    let summaries: Vec<TrackSummary> = midi.summaries();
    for summary in &summaries {
        let channels = summary
            .channels
            .iter()
            .map(|channel| channel.to_string())
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "  {:>3}  {:<24} {:>6} events {:>5} notes  channels [{}]  {}",
            summary.index,
            summary.name.as_deref().unwrap_or("-"),
            summary.events,
            summary.notes,
            channels,
            format_clock(summary.duration_micros / 1000)
        );
    }
}
