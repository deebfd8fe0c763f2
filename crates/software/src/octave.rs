//! Provides [`OctaveController`], which transposes the keybed in whole octaves.

use crate::configuration::{DEFAULT_OCTAVE, MAX_OCTAVE, MIN_OCTAVE, NOTES_PER_OCTAVE};

/// Owns the octave the keybed currently plays in.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OctaveController {
    current: i8,
}

impl Default for OctaveController {
    fn default() -> Self {
        Self {
            current: DEFAULT_OCTAVE,
        }
    }
}

impl OctaveController {
    /// Returns the current octave.
    pub fn current(&self) -> i8 {
        self.current
    }

    /// Moves the octave by `delta`, clamping to [`MIN_OCTAVE`]..=[`MAX_OCTAVE`].
    ///
    /// Returns the new octave, or `None` if clamping left the octave unchanged.
    pub fn shift(&mut self, delta: i8) -> Option<i8> {
        let shifted = self.current.saturating_add(delta).clamp(MIN_OCTAVE, MAX_OCTAVE);
        if shifted == self.current {
            return None;
        }
        self.current = shifted;
        Some(shifted)
    }

    /// The MIDI note number played by the key `key_offset` semitones above the leftmost key.
    ///
    /// Not range-checked: the top keys of octave 9 produce numbers above 127, which the transport drops.
    pub fn note_number(&self, key_offset: u8) -> u8 {
        // MIN_OCTAVE is -1, so the base is never negative
        (self.current + 1) as u8 * NOTES_PER_OCTAVE + key_offset
    }
}

/// Indicator colors, from octave -1 (dark) through octave 9 (white).
const OCTAVE_COLORS: [[u8; 3]; (MAX_OCTAVE - MIN_OCTAVE + 1) as usize] = [
    [0x00, 0x00, 0x00],
    [0xb0, 0x00, 0x00],
    [0xff, 0x1f, 0x8a],
    [0xfe, 0x42, 0x00],
    [0xc7, 0x7f, 0x00],
    [0x6c, 0xa5, 0x00],
    [0x00, 0xb0, 0x00],
    [0x00, 0xa8, 0x94],
    [0x1a, 0x55, 0xfc],
    [0x93, 0x74, 0xff],
    [0xff, 0xff, 0xff],
];

/// The RGB color that indicates `octave`, or `None` if the octave is out of range.
pub fn octave_color(octave: i8) -> Option<[u8; 3]> {
    let index = usize::try_from(i16::from(octave) - i16::from(MIN_OCTAVE)).ok()?;
    OCTAVE_COLORS.get(index).copied()
}
