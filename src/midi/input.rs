// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Parsing of raw MIDI bytes delivered by the host's note callback.

use super::{messages, MidiEvent};

/// Parse raw MIDI bytes into a [`MidiEvent`].
///
/// Note On with velocity 0 is treated as Note Off. Any other non-empty
/// message becomes [`MidiEvent::Other`] so it can be passed through.
pub fn parse(data: &[u8]) -> Option<MidiEvent> {
    let status = *data.first()?;

    let msg_type = status & 0xF0;
    let channel = status & 0x0F;

    match msg_type {
        messages::NOTE_OFF if data.len() >= 3 => Some(MidiEvent::NoteOff {
            channel,
            pitch: data[1] & 0x7F,
            velocity: data[2] & 0x7F,
        }),
        messages::NOTE_ON if data.len() >= 3 => {
            let velocity = data[2] & 0x7F;
            if velocity == 0 {
                Some(MidiEvent::NoteOff {
                    channel,
                    pitch: data[1] & 0x7F,
                    velocity: 0,
                })
            } else {
                Some(MidiEvent::NoteOn {
                    channel,
                    pitch: data[1] & 0x7F,
                    velocity,
                })
            }
        }
        _ => Some(MidiEvent::Other(data.to_vec())),
    }
}
