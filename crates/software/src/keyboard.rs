//! Provides [`KeyboardRouter`], which turns key edges into Note On and Note Off messages.
//!
//! Edges are recorded when the scanner reports them and routed later in the same main loop iteration, after any
//! octave change from that scan has been applied. Each key remembers the note number it sent, so that releasing a
//! key always silences the note it started even if the octave changed while it was held.

use crate::{
    configuration::{KEY_COUNT, MIDI_CHANNEL, NOTE_OFF_VELOCITY, NOTE_ON_VELOCITY},
    midi::MidiOut,
    octave::OctaveController,
};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct KeySlot {
    /// Edge awaiting routing: `Some(true)` for a press, `Some(false)` for a release.
    pending: Option<bool>,
    /// Note number sent with the last Note On, until the matching Note Off goes out.
    sent_note: Option<u8>,
}

/// Routes key edges to the MIDI transport, one slot per key.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardRouter {
    keys: [KeySlot; KEY_COUNT],
}

impl Default for KeyboardRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardRouter {
    /// Constructs a [`KeyboardRouter`] with no pending edges and no sounding notes.
    pub fn new() -> Self {
        Self {
            keys: [KeySlot::default(); KEY_COUNT],
        }
    }

    /// Records a press (`on`) or release of the key `key_offset` semitones above the leftmost key.
    ///
    /// Offsets outside the keybed are ignored.
    pub fn record_edge(&mut self, key_offset: usize, on: bool) {
        if let Some(slot) = self.keys.get_mut(key_offset) {
            slot.pending = Some(on);
        }
    }

    /// Sends the messages for every pending edge, computing Note On numbers from `octave`.
    pub fn process<M: MidiOut>(&mut self, octave: &OctaveController, midi: &mut M) {
        for (offset, slot) in (0_u8..).zip(self.keys.iter_mut()) {
            match slot.pending.take() {
                Some(true) => {
                    let note = octave.note_number(offset);
                    slot.sent_note = Some(note);
                    midi.note_on(note, NOTE_ON_VELOCITY, MIDI_CHANNEL);
                    #[cfg(feature = "defmt")]
                    defmt::debug!("Note On: key {}, note {}", offset, note);
                }
                Some(false) => {
                    // a release without a recorded press is spurious
                    if let Some(note) = slot.sent_note.take() {
                        midi.note_off(note, NOTE_OFF_VELOCITY, MIDI_CHANNEL);
                        #[cfg(feature = "defmt")]
                        defmt::debug!("Note Off: key {}, note {}", offset, note);
                    }
                }
                None => {}
            }
        }
    }

    /// The note currently sounding for a key, if any.
    #[cfg(test)]
    pub(crate) fn sent_note(&self, key_offset: usize) -> Option<u8> {
        self.keys.get(key_offset).and_then(|slot| slot.sent_note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::fake::Recorder;
    use wmidi::{Channel, MidiMessage, Note, U7};

    fn on(note: Note) -> MidiMessage<'static> {
        MidiMessage::NoteOn(Channel::Ch1, note, U7::from_u8_lossy(NOTE_ON_VELOCITY))
    }

    fn off(note: Note) -> MidiMessage<'static> {
        MidiMessage::NoteOff(Channel::Ch1, note, U7::from_u8_lossy(NOTE_OFF_VELOCITY))
    }

    #[test]
    fn press_and_release_at_default_octave() {
        let octave = OctaveController::default();
        let mut router = KeyboardRouter::new();
        let mut midi = Recorder::default();

        router.record_edge(0, true);
        router.process(&octave, &mut midi);
        assert_eq!(Some(60), router.sent_note(0));

        router.record_edge(0, false);
        router.process(&octave, &mut midi);
        assert_eq!(None, router.sent_note(0));

        assert_eq!(
            vec![on(Note::C4), off(Note::C4)],
            midi.sent,
            "Expected left but got right"
        );
    }

    #[test]
    fn release_uses_note_from_press_after_octave_change() {
        let mut octave = OctaveController::default();
        let mut router = KeyboardRouter::new();
        let mut midi = Recorder::default();

        router.record_edge(4, true);
        router.process(&octave, &mut midi);
        octave.shift(1);
        router.record_edge(4, false);
        router.process(&octave, &mut midi);

        assert_eq!(
            vec![on(Note::E4), off(Note::E4)],
            midi.sent,
            "Expected the Note Off to match the Note On"
        );
    }

    #[test]
    fn new_press_uses_new_octave() {
        let mut octave = OctaveController::default();
        let mut router = KeyboardRouter::new();
        let mut midi = Recorder::default();

        octave.shift(-2);
        router.record_edge(12, true);
        router.process(&octave, &mut midi);

        assert_eq!(vec![on(Note::C3)], midi.sent, "Expected left but got right");
    }

    #[test]
    fn spurious_release_sends_nothing() {
        let octave = OctaveController::default();
        let mut router = KeyboardRouter::new();
        let mut midi = Recorder::default();

        router.record_edge(7, false);
        router.process(&octave, &mut midi);

        assert!(midi.sent.is_empty(), "Expected nothing but got {:?}", midi.sent);
    }

    #[test]
    fn edges_are_processed_once() {
        let octave = OctaveController::default();
        let mut router = KeyboardRouter::new();
        let mut midi = Recorder::default();

        router.record_edge(2, true);
        router.process(&octave, &mut midi);
        router.process(&octave, &mut midi);

        assert_eq!(vec![on(Note::D4)], midi.sent, "Expected left but got right");
    }

    #[test]
    fn offsets_beyond_the_keybed_are_ignored() {
        let octave = OctaveController::default();
        let mut router = KeyboardRouter::new();
        let mut midi = Recorder::default();

        router.record_edge(KEY_COUNT, true);
        router.process(&octave, &mut midi);

        assert!(midi.sent.is_empty(), "Expected nothing but got {:?}", midi.sent);
        assert_eq!(None, router.sent_note(KEY_COUNT));
    }

    #[test]
    fn notes_above_127_are_not_sent() {
        let mut octave = OctaveController::default();
        let mut router = KeyboardRouter::new();
        let mut midi = Recorder::default();

        octave.shift(i8::MAX);
        router.record_edge(24, true);
        router.process(&octave, &mut midi);
        router.record_edge(24, false);
        router.process(&octave, &mut midi);

        assert!(midi.sent.is_empty(), "Expected nothing but got {:?}", midi.sent);
        assert_eq!(None, router.sent_note(24));
    }
}
