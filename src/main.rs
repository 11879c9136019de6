// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;

use anyhow::{anyhow, bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use eggiator::generators::Phrase;
use eggiator::midi::note_name;
use eggiator::{
    Eggiator, EngineConfig, EventLog, EventTime, MidiEvent, SimulatedTransport, TimingWindow,
};

fn print_usage() {
    println!("Eggiator - Beat-synchronous arpeggiator");
    println!();
    println!("Usage: eggiator [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --pattern <DIV> <NOTES>  Print generated patterns and offsets");
    println!("  --simulate [BEATS]       Run the engine against a simulated transport (default 4)");
    println!("  --params                 List engine parameters by group");
    println!("  --config <FILE>          Load engine configuration (YAML or TOML)");
    println!("  --loop <START> <END>     Cycle the simulated transport over [START, END)");
    println!("  --tempo <BPM>            Simulated tempo (default 120)");
    println!("  --hold <P,P,...>         Held MIDI pitches (default 60,64,67)");
    println!("  --help                   Show this help message");
}

/// Options gathered from the command line
struct Options {
    command: Command,
    config: Option<String>,
    cycle: Option<(f64, f64)>,
    tempo: f64,
    hold: Vec<u8>,
}

enum Command {
    Usage,
    Pattern { division: usize, notes: usize },
    Simulate { beats: f64 },
    Params,
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, option: &str) -> Result<T> {
    let raw = args
        .get(i)
        .ok_or_else(|| anyhow!("{} requires a value", option))?;
    raw.parse()
        .map_err(|_| anyhow!("Invalid value for {}: {}", option, raw))
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options {
        command: Command::Usage,
        config: None,
        cycle: None,
        tempo: 120.0,
        hold: vec![60, 64, 67],
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--pattern" => {
                let division = parse_value(args, i + 1, "--pattern")?;
                let notes = parse_value(args, i + 2, "--pattern")?;
                options.command = Command::Pattern { division, notes };
                i += 3;
            }
            "--simulate" => {
                let beats = match args.get(i + 1) {
                    Some(v) if !v.starts_with("--") => {
                        i += 1;
                        parse_value(args, i, "--simulate")?
                    }
                    _ => 4.0,
                };
                options.command = Command::Simulate { beats };
                i += 1;
            }
            "--params" => {
                options.command = Command::Params;
                i += 1;
            }
            "--config" => {
                options.config = Some(parse_value(args, i + 1, "--config")?);
                i += 2;
            }
            "--loop" => {
                let start = parse_value(args, i + 1, "--loop")?;
                let end = parse_value(args, i + 2, "--loop")?;
                options.cycle = Some((start, end));
                i += 3;
            }
            "--tempo" => {
                options.tempo = parse_value(args, i + 1, "--tempo")?;
                i += 2;
            }
            "--hold" => {
                let raw: String = parse_value(args, i + 1, "--hold")?;
                options.hold = raw
                    .split(',')
                    .map(|p| p.trim().parse::<u8>().map(|p| p.min(127)))
                    .collect::<Result<_, _>>()
                    .with_context(|| format!("Invalid pitch list: {}", raw))?;
                i += 2;
            }
            "--help" | "-h" => {
                options.command = Command::Usage;
                return Ok(options);
            }
            other => bail!("Unknown option: {}", other),
        }
    }

    Ok(options)
}

fn load_config(options: &Options) -> Result<EngineConfig> {
    match &options.config {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

fn print_patterns(options: &Options, division: usize, notes: usize) -> Result<()> {
    let config = load_config(options)?;
    let mut rng = match config.policy.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    println!(
        "{} of {} subdivisions, offsets in {:?}",
        notes, division, config.policy.offset_unit
    );
    for _ in 0..4 {
        let phrase = Phrase::generate(
            &mut rng,
            division,
            notes,
            config.policy.offset_unit,
            options.tempo,
        );
        let offsets: Vec<String> = phrase
            .offsets()
            .values()
            .iter()
            .map(|o| format!("{:.3}", o))
            .collect();
        println!("{}  [{}]", phrase.pattern(), offsets.join(", "));
    }
    Ok(())
}

fn print_parameters(options: &Options) -> Result<()> {
    let config = load_config(options)?;
    let engine = Eggiator::from_config(&config);
    let registry = engine.parameters();

    for group in registry.groups() {
        println!("{}", group);
        for param in registry.iter_group(&group) {
            println!("  {:<20} {}", param.name, param.format());
        }
    }
    Ok(())
}

fn simulate(options: &Options, beats: f64) -> Result<()> {
    let config = load_config(options)?;
    let mut engine = Eggiator::from_config(&config);
    let mut log = EventLog::new();

    for &pitch in &options.hold {
        engine.on_note_event(MidiEvent::note_on(pitch, 100), &mut log);
    }

    let mut transport = SimulatedTransport::new(options.tempo, 44_100, 512);
    if let Some((start, end)) = options.cycle {
        transport.set_cycle(start, end);
    }
    transport.start();

    let mut elapsed = 0.0;
    let mut buffers = 0usize;
    while elapsed < beats {
        let window: TimingWindow = transport.next_window();
        elapsed += window.end_beat - window.start_beat;
        buffers += 1;
        engine.on_transport_tick(Some(&window), &mut log);
    }

    transport.stop();
    let stopped = transport.next_window();
    engine.on_transport_tick(Some(&stopped), &mut log);

    println!(
        "{} buffers, {} events at {:.1} BPM",
        buffers,
        log.len(),
        transport.bpm()
    );
    for (event, at) in log.events() {
        let when = match at {
            EventTime::Beat(beat) => format!("{:>9.3}", beat),
            EventTime::Now => format!("{:>9}", "now"),
        };
        let bytes = event.to_midi_bytes();
        match event {
            MidiEvent::NoteOn { pitch, velocity, .. } => {
                println!("{}  on   {:<4} vel {:<3} {:02X?}", when, note_name(*pitch), velocity, bytes);
            }
            MidiEvent::NoteOff { pitch, .. } => {
                println!("{}  off  {:<4}         {:02X?}", when, note_name(*pitch), bytes);
            }
            MidiEvent::Other(_) => println!("{}  raw  {:02X?}", when, bytes),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Eggiator - Beat-synchronous arpeggiator");
        println!("Run with --help for usage information");
        return Ok(());
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    match &options.command {
        Command::Usage => print_usage(),
        Command::Pattern { division, notes } => print_patterns(&options, *division, *notes)?,
        Command::Simulate { beats } => simulate(&options, *beats)?,
        Command::Params => print_parameters(&options)?,
    }

    Ok(())
}
