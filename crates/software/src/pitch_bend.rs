//! Provides [`PitchBendRamp`], which bends pitch continuously while a pitch bend button is held.
//!
//! The ramp is advanced by a periodic timer running at interrupt priority, independently of the main loop's scan
//! timing, while button edges and sending happen in the main loop. The two sides share three single-word fields:
//!
//! - `direction` is written only by the main loop and read by the timer.
//! - `value` is advanced by the timer while a direction is held, and reset by the main loop once the direction
//!   has been cleared, so the two never write it at the same time.
//! - `dirty` is set by either side and cleared only by the main loop, after it has read `value`.

use crate::configuration::{PITCH_BEND_FRACTION_BITS, PITCH_BEND_MAX, PITCH_BEND_MIN, PITCH_BEND_STEP};
use core::sync::atomic::{AtomicBool, AtomicI8, AtomicI32, Ordering};

const VALUE_MIN: i32 = (PITCH_BEND_MIN as i32) << PITCH_BEND_FRACTION_BITS;
const VALUE_MAX: i32 = (PITCH_BEND_MAX as i32) << PITCH_BEND_FRACTION_BITS;

/// The way a held pitch bend button moves the pitch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BendDirection {
    /// Toward [`PITCH_BEND_MIN`].
    Down = -1,
    /// Toward [`PITCH_BEND_MAX`].
    Up = 1,
}

/// Pitch bend state shared between the main loop and the ramp timer.
///
/// Only atomic loads and stores are used, so this works on cores without compare-and-swap and never makes the
/// timer wait.
#[derive(Debug)]
pub struct PitchBendRamp {
    /// Current bend in fixed point, [`PITCH_BEND_FRACTION_BITS`] fractional bits.
    value: AtomicI32,
    /// -1, 0 or 1.
    direction: AtomicI8,
    /// Set when `value` holds something that has not been sent yet.
    dirty: AtomicBool,
}

impl Default for PitchBendRamp {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchBendRamp {
    /// Constructs a centered, idle [`PitchBendRamp`]. Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            value: AtomicI32::new(0),
            direction: AtomicI8::new(0),
            dirty: AtomicBool::new(false),
        }
    }

    /// Advances the ramp by one step. Called from the timer.
    ///
    /// Does nothing when no button is held or when the bend already sits at the extreme it is moving toward.
    pub fn tick(&self) {
        let direction = self.direction.load(Ordering::Acquire);
        if direction == 0 {
            return;
        }
        let value = self.value.load(Ordering::Relaxed);
        let next = value
            .saturating_add(i32::from(direction) * PITCH_BEND_STEP)
            .clamp(VALUE_MIN, VALUE_MAX);
        if next == value {
            return;
        }
        self.value.store(next, Ordering::Relaxed);
        self.dirty.store(true, Ordering::Release);
    }

    /// Starts bending in `direction` and requests an immediate send. Called from the main loop.
    pub fn press(&self, direction: BendDirection) {
        self.direction.store(direction as i8, Ordering::Release);
        self.dirty.store(true, Ordering::Release);
    }

    /// Handles the release of the button for `direction`. Called from the main loop.
    ///
    /// If that direction is the active one, the bend snaps back to center and a centered send is requested.
    /// Releasing a button whose direction has since been overridden by the other button changes nothing.
    pub fn release(&self, direction: BendDirection) {
        if self.direction.load(Ordering::Acquire) != direction as i8 {
            return;
        }
        self.direction.store(0, Ordering::Release);
        // with the direction cleared the timer no longer writes the value
        self.value.store(0, Ordering::Relaxed);
        self.dirty.store(true, Ordering::Release);
    }

    /// Returns the value to send, if one is waiting, and marks it as sent. Called from the main loop.
    ///
    /// The value is read before the flag is cleared, both inside a critical section, so a tick cannot slip a
    /// new value in between and have it marked as sent.
    pub fn take_pending(&self) -> Option<i16> {
        if !self.dirty.load(Ordering::Acquire) {
            return None;
        }
        let value = critical_section::with(|_| {
            let value = self.value.load(Ordering::Acquire);
            self.dirty.store(false, Ordering::Release);
            value
        });
        Some(to_output(value))
    }

    /// The current bend, between [`PITCH_BEND_MIN`] and [`PITCH_BEND_MAX`] with 0 at center.
    pub fn value(&self) -> i16 {
        to_output(self.value.load(Ordering::Acquire))
    }

    /// The held direction, if any.
    pub fn direction(&self) -> Option<BendDirection> {
        match self.direction.load(Ordering::Acquire) {
            -1 => Some(BendDirection::Down),
            1 => Some(BendDirection::Up),
            _ => None,
        }
    }
}

/// Drops the fraction, rounding toward zero so that both directions move in equal steps.
fn to_output(value: i32) -> i16 {
    (value / (1 << PITCH_BEND_FRACTION_BITS)) as i16
}
