//! Traits for the collaborators that carry the controller's output: the MIDI transport and the octave indicator.
//!
//! Values are validated at this boundary. Anything outside the MIDI ranges (channel 1-16, note and velocity 0-127,
//! pitch bend -8192..=8191) is dropped silently; the device has no way to surface an error, and skipping one
//! message is preferable to halting.

mod queue;
pub use queue::*;

use crate::configuration::{PITCH_BEND_MAX, PITCH_BEND_MIN};
use wmidi::{Channel, ControlFunction, MidiMessage, Note, U7, U14};

/// Controller number of the modulation wheel.
pub const MODULATION_CONTROLLER: u8 = 1;

/// Controller number of the sustain (damper) pedal.
pub const SUSTAIN_CONTROLLER: u8 = 64;

/// Control value sent for a switched controller that is on; off is 0.
pub const SWITCH_ON_VALUE: u8 = 127;

/// Receives outgoing MIDI messages.
///
/// Implementors only provide [`send`][Self::send]; the remaining methods validate their arguments and forward
/// well-formed messages to it.
pub trait MidiOut {
    /// Transmits a message. Must not block for long, as this is called from the main loop.
    fn send(&mut self, message: MidiMessage<'static>);

    /// Gives the transport a chance to push out anything it has buffered. Called once per main loop iteration.
    fn flush(&mut self) {}

    /// Sends a Note On, unless any argument is out of range.
    fn note_on(&mut self, note: u8, velocity: u8, channel: u8) {
        if let Some(message) = note_on(note, velocity, channel) {
            self.send(message);
        }
    }

    /// Sends a Note Off, unless any argument is out of range.
    fn note_off(&mut self, note: u8, velocity: u8, channel: u8) {
        if let Some(message) = note_off(note, velocity, channel) {
            self.send(message);
        }
    }

    /// Sends a Control Change, unless any argument is out of range.
    fn control_change(&mut self, controller: u8, value: u8, channel: u8) {
        if let Some(message) = control_change(controller, value, channel) {
            self.send(message);
        }
    }

    /// Sends a Pitch Bend Change, unless any argument is out of range. `value` is signed, with 0 at center.
    fn pitch_bend(&mut self, value: i16, channel: u8) {
        if let Some(message) = pitch_bend(value, channel) {
            self.send(message);
        }
    }
}

/// Displays the selected octave.
pub trait OctaveIndicator {
    /// Shows `octave`. Octaves the indicator cannot display are ignored.
    fn set_octave_indicator(&mut self, octave: i8);
}

/// Converts a 1-based channel number into a [`Channel`].
pub fn channel(number: u8) -> Option<Channel> {
    if !(1..=16).contains(&number) {
        return None;
    }
    Channel::from_index(number - 1).ok()
}

fn u7(value: u8) -> Option<U7> {
    (value <= 127).then(|| U7::from_u8_lossy(value))
}

/// Builds a Note On message if every argument is in range.
pub fn note_on(note: u8, velocity: u8, channel_number: u8) -> Option<MidiMessage<'static>> {
    let message = MidiMessage::NoteOn(channel(channel_number)?, Note::from(u7(note)?), u7(velocity)?);
    Some(message)
}

/// Builds a Note Off message if every argument is in range.
pub fn note_off(note: u8, velocity: u8, channel_number: u8) -> Option<MidiMessage<'static>> {
    let message = MidiMessage::NoteOff(channel(channel_number)?, Note::from(u7(note)?), u7(velocity)?);
    Some(message)
}

/// Builds a Control Change message if every argument is in range.
pub fn control_change(controller: u8, value: u8, channel_number: u8) -> Option<MidiMessage<'static>> {
    let message = MidiMessage::ControlChange(
        channel(channel_number)?,
        ControlFunction(u7(controller)?),
        u7(value)?,
    );
    Some(message)
}

/// Builds a Pitch Bend Change message if every argument is in range.
///
/// MIDI carries pitch bend as an unsigned 14-bit number centered on 8192, so `value` is offset accordingly.
pub fn pitch_bend(value: i16, channel_number: u8) -> Option<MidiMessage<'static>> {
    if !(PITCH_BEND_MIN..=PITCH_BEND_MAX).contains(&value) {
        return None;
    }
    let raw = (i32::from(value) - i32::from(PITCH_BEND_MIN)) as u16;
    let message = MidiMessage::PitchBendChange(channel(channel_number)?, U14::try_from(raw).ok()?);
    Some(message)
}

/// Test doubles for the collaborators.
#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    /// Records every message that passed validation.
    #[derive(Debug, Default)]
    pub(crate) struct Recorder {
        pub(crate) sent: Vec<MidiMessage<'static>>,
        /// Number of messages sent at the time of each flush.
        pub(crate) flushed_at: Vec<usize>,
    }

    impl MidiOut for Recorder {
        fn send(&mut self, message: MidiMessage<'static>) {
            self.sent.push(message);
        }

        fn flush(&mut self) {
            self.flushed_at.push(self.sent.len());
        }
    }

    /// Records every octave shown.
    #[derive(Debug, Default)]
    pub(crate) struct Indicator {
        pub(crate) shown: Vec<i8>,
    }

    impl OctaveIndicator for Indicator {
        fn set_octave_indicator(&mut self, octave: i8) {
            self.shown.push(octave);
        }
    }
}
