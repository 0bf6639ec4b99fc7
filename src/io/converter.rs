use crate::{io::midi::MidiEvent, synth::message::SynthMessage};

/// Full bend range of the pitch wheel in each direction.
const PITCH_BEND_RANGE: f32 = 8192.0;

/// CC 123: all notes off.
const CC_ALL_NOTES_OFF: u8 = 123;

/// Translate a MIDI event on `channel_filter` into a synth message.
///
/// Velocities map to 0..1 by dividing by 128; a note-on with velocity 0 is a
/// note-off. Events on other channels, and events the synth has no use for,
/// yield `None`.
pub fn midi_to_synth(midi: MidiEvent, channel_filter: u8) -> Option<SynthMessage> {
    if midi.channel() != channel_filter {
        return None;
    }

    match midi {
        MidiEvent::NoteOn { key, velocity: 0, .. } | MidiEvent::NoteOff { key, .. } => {
            Some(SynthMessage::NoteOff { note: key })
        }
        MidiEvent::NoteOn { key, velocity, .. } => Some(SynthMessage::NoteOn {
            note: key,
            velocity: velocity as f32 / 128.0,
        }),
        MidiEvent::PitchBend { value, .. } => Some(SynthMessage::PitchBend {
            factor: pitch_bend_to_factor(value),
        }),
        MidiEvent::ControlChange {
            controller: CC_ALL_NOTES_OFF,
            ..
        } => Some(SynthMessage::AllNotesOff),
        MidiEvent::ControlChange { .. } | MidiEvent::ProgramChange { .. } => None,
    }
}

/// Pitch factor for a centred bend value: up to one octave either way.
///
/// Bending up scales linearly from 1 towards 2, bending down from 1 towards
/// 0.5.
pub fn pitch_bend_to_factor(value: i16) -> f32 {
    let bend = (value as f32 / PITCH_BEND_RANGE).clamp(-1.0, 1.0);
    if bend > 0.0 {
        1.0 + bend
    } else if bend < 0.0 {
        1.0 + 0.5 * bend
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_scales_velocity() {
        let msg = midi_to_synth(
            MidiEvent::NoteOn {
                channel: 0,
                key: 60,
                velocity: 64,
            },
            0,
        );
        match msg {
            Some(SynthMessage::NoteOn { note, velocity }) => {
                assert_eq!(note, 60);
                assert_eq!(velocity, 0.5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn zero_velocity_note_on_is_note_off() {
        let msg = midi_to_synth(
            MidiEvent::NoteOn {
                channel: 3,
                key: 72,
                velocity: 0,
            },
            3,
        );
        assert!(matches!(msg, Some(SynthMessage::NoteOff { note: 72 })));
    }

    #[test]
    fn other_channels_are_ignored() {
        let event = MidiEvent::NoteOff {
            channel: 1,
            key: 60,
            velocity: 0,
        };
        assert!(midi_to_synth(event, 0).is_none());
    }

    #[test]
    fn all_notes_off_controller() {
        let event = MidiEvent::ControlChange {
            channel: 0,
            controller: 123,
            value: 0,
        };
        assert!(matches!(midi_to_synth(event, 0), Some(SynthMessage::AllNotesOff)));

        let modwheel = MidiEvent::ControlChange {
            channel: 0,
            controller: 1,
            value: 64,
        };
        assert!(midi_to_synth(modwheel, 0).is_none());
    }

    #[test]
    fn pitch_bend_range() {
        assert_eq!(pitch_bend_to_factor(0), 1.0);
        assert_eq!(pitch_bend_to_factor(4096), 1.5);
        assert_eq!(pitch_bend_to_factor(-8192), 0.5);
        assert_eq!(pitch_bend_to_factor(-4096), 0.75);
        assert!(pitch_bend_to_factor(i16::MAX) <= 2.0);
        assert!(pitch_bend_to_factor(i16::MIN) >= 0.5);
    }
}
