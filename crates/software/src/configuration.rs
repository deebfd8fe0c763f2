//! Compile-time settings for the controller.
//!
//! None of these are adjustable at runtime; values derived from them (e.g., [`PITCH_BEND_STEP`]) are computed
//! here so that the interrupt-side code never has to do the arithmetic.

use embassy_time::Duration;

/// MIDI channel all messages are sent on, in the 1-16 range used on device front panels.
pub const MIDI_CHANNEL: u8 = 1;

/// Velocity used for every Note On; the keybed has no velocity sensing.
pub const NOTE_ON_VELOCITY: u8 = 127;

/// Velocity used for every Note Off.
pub const NOTE_OFF_VELOCITY: u8 = 0;

/// Number of keys on the keybed, C1 through C3.
pub const KEY_COUNT: usize = 25;

/// Lowest selectable octave. Octave -1 starts at MIDI note 0.
pub const MIN_OCTAVE: i8 = -1;

/// Highest selectable octave.
pub const MAX_OCTAVE: i8 = 9;

/// Octave selected at power-on. With this octave the leftmost key plays middle C (MIDI note 60).
pub const DEFAULT_OCTAVE: i8 = 4;

/// Number of notes in an octave.
pub const NOTES_PER_OCTAVE: u8 = 12;

/// Interval between two switch scans.
pub const SCAN_PERIOD: Duration = Duration::from_millis(SCAN_PERIOD_MS as u64);

/// [`SCAN_PERIOD`] in milliseconds, for blocking delays.
pub const SCAN_PERIOD_MS: u32 = 10;

/// Number of full state machine rounds executed by a boot-time forced scan.
///
/// The debouncer needs two identical readings, so anything above two rounds yields a valid snapshot.
pub const FORCE_SCAN_ROUNDS: usize = 4;

/// Interval of the timer that advances the pitch bend ramp.
pub const TICK_INTERVAL: Duration = Duration::from_micros(TICK_INTERVAL_US);

/// [`TICK_INTERVAL`] in microseconds.
pub const TICK_INTERVAL_US: u64 = 500;

/// Time a held pitch bend button takes to move the bend from center to either extreme.
pub const PITCH_BEND_RAMP_TIME: Duration = Duration::from_millis(PITCH_BEND_RAMP_TIME_MS);

/// [`PITCH_BEND_RAMP_TIME`] in milliseconds.
pub const PITCH_BEND_RAMP_TIME_MS: u64 = 250;

/// Lowest pitch bend value, i.e., the full downward bend.
pub const PITCH_BEND_MIN: i16 = -8192;

/// Highest pitch bend value, i.e., the full upward bend.
pub const PITCH_BEND_MAX: i16 = 8191;

/// Number of fractional bits kept by the pitch bend accumulator.
pub const PITCH_BEND_FRACTION_BITS: u32 = 10;

/// Amount the pitch bend accumulator moves per tick, in 1/1024ths of a pitch bend unit.
///
/// Derived from the ramp time and the tick interval so the time from center to extreme does not depend on the
/// tick rate. Rounded up so that both extremes are reached on the last tick of the ramp. Changing either input
/// requires only a rebuild.
pub const PITCH_BEND_STEP: i32 = ((8192_u64 << PITCH_BEND_FRACTION_BITS) * TICK_INTERVAL_US)
    .div_ceil(PITCH_BEND_RAMP_TIME_MS * 1000) as i32;

const _: () = assert!(PITCH_BEND_STEP > 0, "pitch bend ramp would never move");
const _: () = assert!(MIN_OCTAVE <= DEFAULT_OCTAVE && DEFAULT_OCTAVE <= MAX_OCTAVE);
const _: () = assert!(MIDI_CHANNEL >= 1 && MIDI_CHANNEL <= 16);
