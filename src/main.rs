// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use musicseq::config::{PlayerSettings, SongFile};
use musicseq::midi::{print_destinations, system_registry};
use musicseq::player::Player;
use musicseq::smf::SmfWriter;
use musicseq::{EndpointRef, Sequence};

fn print_usage() {
    println!("musicseq - MIDI sequence player");
    println!();
    println!("Usage: musicseq [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --list-midi                       List available MIDI destinations");
    println!("  --play <SONG> [N] [SETTINGS]      Play a song file to destination N");
    println!("  --render <SONG> <OUT.mid>         Write a song file as a Standard MIDI File");
    println!("  --dump <SONG>                     Print every event in a song file");
    println!("  --help                            Show this help message");
}

fn load_song(path: &str) -> Result<Sequence> {
    SongFile::load(path)?
        .build()
        .with_context(|| format!("Failed to build song: {}", path))
}

fn play_song(path: &str, destination: Option<u32>, settings: PlayerSettings) -> Result<()> {
    let sequence = load_song(path)?;
    if let Some(rate) = settings.sample_rate {
        sequence.set_sample_rate(rate)?;
    }

    let registry = system_registry();
    let endpoint = destination
        .or(settings.destination)
        .map(EndpointRef::new)
        .or_else(|| sequence.midi_destination())
        .unwrap_or(EndpointRef::new(0));
    let endpoint = registry
        .get(endpoint.index())
        .ok_or_else(|| anyhow!("MIDI {} not found (only {} available)", endpoint, registry.count()))?;
    sequence.bind_midi_destination(Some(endpoint));

    println!("Connecting to MIDI {}...", endpoint);
    let mut output = registry.open(endpoint)?;

    let mut player = Player::new();
    player.bind(&sequence)?;
    player.set_play_rate_scalar(settings.play_rate)?;

    let end = sequence
        .tracks()
        .iter()
        .filter_map(|track| track.length().ok().flatten())
        .fold(0.0, f64::max);
    let interval = Duration::from_millis(settings.pump_interval_ms.max(1));

    info!(song = path, end, "starting playback");
    player.start()?;
    while player.time()? < end {
        player.pump(output.as_mut())?;
        thread::sleep(interval);
    }
    player.pump(output.as_mut())?;
    player.stop()?;
    let released = player.pump(output.as_mut())?;
    player.all_notes_off(output.as_mut())?;
    info!(released, "playback finished");

    println!("Playback complete!");
    Ok(())
}

fn render_song(path: &str, out: &str) -> Result<()> {
    let sequence = load_song(path)?;
    sequence
        .save(Path::new(out), &SmfWriter::new())
        .with_context(|| format!("Failed to write MIDI file: {}", out))?;
    println!("Wrote {} ({} tracks)", out, sequence.tracks().size() + 1);
    Ok(())
}

fn dump_song(path: &str) -> Result<()> {
    let sequence = load_song(path)?;
    let tempo = sequence.tempo_track();
    println!("Tempo track:");
    for (time, event) in tempo.events()? {
        println!("  {:>8.3}  {:?}", time, event);
    }
    for (i, track) in sequence.tracks().iter().enumerate() {
        println!(
            "Track {} (length {:?}, mute {:?}, solo {:?}):",
            i,
            track.length()?,
            track.mute_status()?,
            track.solo_status()?
        );
        for (time, event) in track.events()? {
            println!("  {:>8.3}  {}  {:?}", time, event.name(), event);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("musicseq - MIDI sequence player");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[1].as_str() {
        "--list-midi" => {
            print_destinations(system_registry().as_ref());
        }
        "--play" => {
            if args.len() < 3 {
                eprintln!("Error: --play requires a song file");
                std::process::exit(1);
            }
            let destination = match args.get(3) {
                Some(arg) => Some(
                    arg.parse::<u32>()
                        .map_err(|_| anyhow!("Invalid destination number: {}", arg))?,
                ),
                None => None,
            };
            let settings = match args.get(4) {
                Some(path) => PlayerSettings::load(path)?,
                None => PlayerSettings::default(),
            };
            play_song(&args[2], destination, settings)?;
        }
        "--render" => {
            if args.len() < 4 {
                eprintln!("Error: --render requires a song file and an output path");
                std::process::exit(1);
            }
            render_song(&args[2], &args[3])?;
        }
        "--dump" => {
            if args.len() < 3 {
                eprintln!("Error: --dump requires a song file");
                std::process::exit(1);
            }
            dump_song(&args[2])?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
