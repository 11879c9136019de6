// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Integration tests for the eggiator
//!
//! These tests verify that multiple components work together correctly.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

use eggiator::control::names;
use eggiator::generators::{compute_offsets, generate, OffsetUnit, Phrase, RhythmPattern};
use eggiator::midi;
use eggiator::sequencer::{HeldNotes, NoteOrder, RearmMode};
use eggiator::{
    BufferScheduler, Eggiator, EngineConfig, EventLog, EventTime, MidiEvent, SchedulerSettings,
    SimulatedTransport, TimingWindow,
};

fn held(pitches: &[u8]) -> HeldNotes {
    let mut held = HeldNotes::new();
    for &p in pitches {
        held.press(p, 100);
    }
    held
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Every (subdivisions, active) pair up to 16 keeps the active count
#[test]
fn test_pattern_count_invariant() {
    let mut rng = StdRng::seed_from_u64(2026);
    for subdivisions in 1..=16 {
        for active in 1..=subdivisions {
            for _ in 0..1000 {
                let pattern = generate(&mut rng, subdivisions, active).unwrap();
                assert_eq!(pattern.len(), subdivisions);
                assert_eq!(pattern.active_count(), active);
            }
        }
    }
}

/// Offsets of random patterns are one per active slot and never decrease
#[test]
fn test_offsets_follow_pattern() {
    let mut rng = StdRng::seed_from_u64(7);
    for subdivisions in 1..=16 {
        for active in 1..=subdivisions {
            let pattern = generate(&mut rng, subdivisions, active).unwrap();
            let offsets = compute_offsets(&pattern, 60_000.0 / 97.0 / subdivisions as f64);
            assert_eq!(offsets.len(), active);
            assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}

/// A full pattern gives evenly spaced offsets starting at zero
#[test]
fn test_full_pattern_round_trip() {
    for subdivisions in 1..=16 {
        let d = 1.0 / subdivisions as f64;
        let expected: Vec<f64> = (0..subdivisions).map(|i| i as f64 * d).collect();
        assert_eq!(compute_offsets(&RhythmPattern::full(subdivisions), d), expected);
    }
}

/// Single note per beat lands on each slot about equally often
#[test]
fn test_single_note_distribution() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for _ in 0..1000 {
        let pattern = generate(&mut rng, 4, 1).unwrap();
        let slot = pattern.active_indices().next().unwrap();
        *counts.entry(slot).or_insert(0) += 1;
    }
    assert_eq!(counts.len(), 4);
    for count in counts.values() {
        assert!((175..=325).contains(count), "count {}", count);
    }
}

/// Offsets [0, 0.5]: a whole-beat window plays both, a short one plays one
#[test]
fn test_scheduler_window_scenarios() {
    let phrase = Phrase::from_pattern(
        RhythmPattern::from_slots(vec![true, true]),
        OffsetUnit::Beats,
        120.0,
    );
    let settings = SchedulerSettings::default().with_pattern(2, 2);
    let notes = held(&[60]);

    let mut scheduler = BufferScheduler::with_seed(settings.clone(), 1);
    scheduler.arm_with(phrase.clone(), 0.0, 120.0);
    let emitted = scheduler.advance(&TimingWindow::new(0.0, 1.0, 120.0), &notes);
    let beats: Vec<f64> = emitted.iter().map(|n| n.beat).collect();
    assert_eq!(beats, vec![0.0, 0.5]);

    let mut scheduler = BufferScheduler::with_seed(settings, 1);
    scheduler.arm_with(phrase, 0.0, 120.0);
    let emitted = scheduler.advance(&TimingWindow::new(0.0, 0.3, 120.0), &notes);
    let beats: Vec<f64> = emitted.iter().map(|n| n.beat).collect();
    assert_eq!(beats, vec![0.0]);
}

/// A buffer crossing the loop end plays the notes of both passes
#[test]
fn test_loop_wrap_scenario() {
    let settings = SchedulerSettings::default().with_pattern(10, 10);
    let mut scheduler = BufferScheduler::with_seed(settings, 5);
    let window = TimingWindow::new(1.8, 2.2, 120.0).with_loop(0.0, 2.0);

    let emitted = scheduler.advance(&window, &held(&[60]));
    assert!(emitted.iter().any(|n| approx(n.beat, 2.1) && approx(n.host_beat, 0.1)));
    assert!(emitted.iter().all(|n| n.beat >= 1.8 - 1e-9 && n.beat < 2.2));
}

/// Steady playback through a looping transport never loses a beat
#[test]
fn test_looping_transport_plays_every_beat() {
    let settings = SchedulerSettings::default().with_pattern(4, 4);
    let mut engine = Eggiator::with_seed(settings, 11);
    let mut log = EventLog::new();
    engine.on_note_event(MidiEvent::note_on(60, 100), &mut log);

    let mut transport = SimulatedTransport::new(120.0, 44_100, 512);
    transport.set_cycle(0.0, 2.0);
    transport.start();

    let mut elapsed = 0.0;
    while elapsed < 8.0 - 1e-9 {
        let window = transport.next_window();
        elapsed += window.end_beat - window.start_beat;
        engine.on_transport_tick(Some(&window), &mut log);
    }

    // Four passes of a two beat loop, four notes per beat
    let ons = log.note_ons().count();
    assert!((31..=33).contains(&ons), "{} note ons", ons);
    for (_, at) in log.note_ons() {
        let EventTime::Beat(beat) = at else {
            panic!("note on without a beat time");
        };
        assert!(*beat >= 0.0 && *beat < 2.0, "note at {}", beat);
    }
}

/// A loop end landing exactly on a buffer boundary keeps every pass playing
#[test]
fn test_loop_end_on_buffer_boundary() {
    let settings = SchedulerSettings::default().with_pattern(4, 4);
    let mut engine = Eggiator::with_seed(settings, 13);
    let mut log = EventLog::new();
    engine.on_note_event(MidiEvent::note_on(60, 100), &mut log);

    // Quarter-beat buffers, six per pass of a one and a half beat loop
    let mut transport = SimulatedTransport::new(120.0, 1_000, 125);
    transport.set_cycle(0.0, 1.5);
    transport.start();
    for _ in 0..24 {
        let window = transport.next_window();
        engine.on_transport_tick(Some(&window), &mut log);
    }

    let mut passes: Vec<Vec<f64>> = Vec::new();
    let mut last = f64::INFINITY;
    for (_, at) in log.note_ons() {
        let EventTime::Beat(beat) = *at else {
            panic!("note on without a beat time");
        };
        if beat < last {
            passes.push(Vec::new());
        }
        if let Some(pass) = passes.last_mut() {
            pass.push(beat);
        }
        last = beat;
    }

    assert_eq!(passes.iter().map(Vec::len).collect::<Vec<_>>(), vec![6, 6, 6, 6]);
    for pass in &passes {
        assert_eq!(pass, &vec![0.0, 0.25, 0.5, 0.75, 1.0, 1.25]);
    }
}

/// Jittered notes still release after they start
#[test]
fn test_note_off_pairing_with_jitter() {
    let mut engine = Eggiator::with_seed(SchedulerSettings::default().with_pattern(8, 5), 3);
    engine.set_parameter(names::RANDOM_LENGTH, 120.0).unwrap();
    engine.set_parameter(names::RANDOM_DELAY, 60.0).unwrap();
    engine.set_parameter(names::SIMULTANEOUS_NOTES, 2.0).unwrap();

    let mut log = EventLog::new();
    for p in [48, 55, 60, 64] {
        engine.on_note_event(MidiEvent::note_on(p, 90), &mut log);
    }

    let mut transport = SimulatedTransport::new(133.0, 48_000, 256);
    transport.start();
    for _ in 0..500 {
        let window = transport.next_window();
        engine.on_transport_tick(Some(&window), &mut log);
    }

    let events = log.events();
    assert!(!events.is_empty());
    let ons = log.note_ons().count();
    assert_eq!(ons, log.note_offs().count());

    for pair in events.chunks(2) {
        let (on, on_at) = &pair[0];
        let (off, off_at) = &pair[1];
        assert!(matches!(on, MidiEvent::NoteOn { .. }));
        assert!(matches!(off, MidiEvent::NoteOff { .. }));
        assert_eq!(on.pitch(), off.pitch());
        match (on_at, off_at) {
            (EventTime::Beat(a), EventTime::Beat(b)) => assert!(b > a),
            _ => panic!("scheduled notes must carry beat times"),
        }
    }
}

/// Stopping the transport flushes and resets everything
#[test]
fn test_transport_stop_flush() {
    let mut engine = Eggiator::with_seed(SchedulerSettings::default(), 8);
    let mut log = EventLog::new();
    for p in [60, 64, 67] {
        engine.on_note_event(MidiEvent::note_on(p, 100), &mut log);
    }

    let mut transport = SimulatedTransport::default();
    transport.start();
    for _ in 0..20 {
        let window = transport.next_window();
        engine.on_transport_tick(Some(&window), &mut log);
    }
    assert!(log.note_ons().count() > 0);
    log.clear();

    transport.stop();
    let window = transport.next_window();
    engine.on_transport_tick(Some(&window), &mut log);

    let flushed: Vec<u8> = log.note_offs().filter_map(|(e, _)| e.pitch()).collect();
    assert_eq!(flushed, vec![60, 64, 67]);
    assert!(log.events().iter().all(|(_, at)| *at == EventTime::Now));
    assert!(engine.held().is_empty());

    // Restarting with nothing held stays silent
    log.clear();
    transport.start();
    let window = transport.next_window();
    assert_eq!(engine.on_transport_tick(Some(&window), &mut log), 0);
}

/// Raw bytes from the host feed the engine
#[test]
fn test_raw_midi_into_engine() {
    let mut engine = Eggiator::with_seed(SchedulerSettings::default(), 4);
    let mut log = EventLog::new();

    let input: [&[u8]; 4] = [&[0x90, 60, 100], &[0x90, 67, 80], &[0xB0, 64, 127], &[0x90, 60, 0]];
    for bytes in input {
        if let Some(event) = midi::parse(bytes) {
            engine.on_note_event(event, &mut log);
        }
    }

    assert_eq!(engine.held().pitches().collect::<Vec<_>>(), vec![67]);
    assert_eq!(log.len(), 1);
    assert_eq!(log.events()[0].0.to_midi_bytes(), vec![0xB0, 64, 127]);
}

/// Down order walks the held notes from the top
#[test]
fn test_down_order_through_engine() {
    let settings = SchedulerSettings::default()
        .with_pattern(4, 4)
        .with_order(NoteOrder::Down);
    let mut engine = Eggiator::with_seed(settings, 6);
    let mut log = EventLog::new();
    for p in [60, 64, 67] {
        engine.on_note_event(MidiEvent::note_on(p, 100), &mut log);
    }

    engine.on_transport_tick(Some(&TimingWindow::new(0.0, 1.0, 120.0)), &mut log);
    let pitches: Vec<u8> = log.note_ons().filter_map(|(e, _)| e.pitch()).collect();
    assert_eq!(pitches, vec![67, 64, 60, 67]);
}

/// Configuration drives the engine end to end
#[test]
fn test_config_driven_engine() {
    let yaml = r#"
parameters:
  beat_division: 3
  notes_per_beat: 3
  note_length: 50
policy:
  rearm: lazy
  seed: 12
"#;
    let config = EngineConfig::from_yaml(yaml).unwrap();
    let mut engine = Eggiator::from_config(&config);
    assert_eq!(engine.settings().rearm, RearmMode::Lazy);
    assert_eq!(engine.get_parameter(names::NOTE_LENGTH), Some(50.0));

    let mut log = EventLog::new();
    engine.on_note_event(MidiEvent::note_on(72, 100), &mut log);
    let count = engine.on_transport_tick(Some(&TimingWindow::new(0.0, 2.0, 90.0)), &mut log);
    assert_eq!(count, 6);

    let note = engine.sounding()[0];
    assert!(approx(note.length_beats(), 0.5 / 3.0));
    assert!(approx(note.length_ms, 0.5 / 3.0 * 60_000.0 / 90.0));
}

/// Identical seeds give identical output
#[test]
fn test_seeded_runs_repeat() {
    let run = |seed: u64| {
        let settings = SchedulerSettings::default().with_pattern(12, 5);
        let mut engine = Eggiator::with_seed(settings, seed);
        engine.set_parameter(names::NOTE_ORDER, 2.0).unwrap();
        let mut log = EventLog::new();
        for p in [50, 53, 57, 60] {
            engine.on_note_event(MidiEvent::note_on(p, 100), &mut log);
        }
        let mut transport = SimulatedTransport::default();
        transport.start();
        for _ in 0..200 {
            let window = transport.next_window();
            engine.on_transport_tick(Some(&window), &mut log);
        }
        log.events().to_vec()
    };

    assert_eq!(run(31), run(31));
    assert_ne!(run(31), run(32));
}
