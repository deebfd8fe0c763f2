//! This crate contains architecture-agnostic logic for the Kinoshi-Tiny Key 25, a compact 25-key MIDI keyboard
//! controller. Its switches are read through two cascaded parallel-to-serial shift registers, debounced, and turned
//! into [MIDI](https://midi.org/midi-1-0) note, control change, and pitch bend messages.
//!
//! Hardware is reached exclusively through [`embedded_hal`] traits and the collaborator traits in [`midi`], so
//! everything here can be exercised on the host.

#![deny(missing_docs)]
#![cfg_attr(not(test), no_std)]

pub mod application;
pub mod configuration;
pub mod keyboard;
pub mod midi;
pub mod octave;
pub mod pitch_bend;
pub mod switches;
