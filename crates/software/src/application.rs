//! Wires the scanner, octave controller, keyboard router and pitch bend ramp together.
//!
//! Each call to [`Application::poll`] runs one strict pipeline: scan and debounce, dispatch the resulting edges,
//! route key edges to notes, send any pending pitch bend, and finally flush the transport.

use crate::{
    configuration::MIDI_CHANNEL,
    keyboard::KeyboardRouter,
    midi::{MODULATION_CONTROLLER, MidiOut, OctaveIndicator, SUSTAIN_CONTROLLER, SWITCH_ON_VALUE},
    octave::OctaveController,
    pitch_bend::{BendDirection, PitchBendRamp},
    switches::{Edge, Edges, Scanner, SwitchId},
};
use embassy_time::Instant;
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

/// A source of debounced switch edges.
pub trait SwitchSource {
    /// Error raised while reading the hardware.
    type Error;

    /// Advances scanning; see [`Scanner::advance`].
    fn advance(&mut self, now: Instant) -> Result<Edges, Self::Error>;

    /// Scans synchronously until the switch states are valid; see [`Scanner::force_scan`].
    fn force_scan<D: DelayNs>(&mut self, delay: &mut D, start: Instant) -> Result<(), Self::Error>;

    /// Returns `true` if `switch` is pressed.
    fn is_on(&self, switch: SwitchId) -> bool;
}

impl<E, L, C, R> SwitchSource for Scanner<L, C, R>
where
    L: OutputPin<Error = E>,
    C: OutputPin<Error = E>,
    R: InputPin<Error = E>,
{
    type Error = E;

    fn advance(&mut self, now: Instant) -> Result<Edges, E> {
        Scanner::advance(self, now)
    }

    fn force_scan<D: DelayNs>(&mut self, delay: &mut D, start: Instant) -> Result<(), E> {
        Scanner::force_scan(self, delay, start)
    }

    fn is_on(&self, switch: SwitchId) -> bool {
        Scanner::is_on(self, switch)
    }
}

/// Outcome of [`Application::boot`].
pub enum Startup<A> {
    /// The update chord was held at power-on; the caller should reboot into the firmware updater.
    FirmwareUpdate,
    /// Normal operation; the caller should [`poll`][Application::poll] the application forever.
    Running(A),
}

/// Returns `true` if the switches request the firmware updater: Modulation and Octave - held together.
pub fn update_requested<S: SwitchSource>(switches: &S) -> bool {
    switches.is_on(SwitchId::Modulation) && switches.is_on(SwitchId::OctaveMinus)
}

/// The controller's application state and its collaborators.
pub struct Application<'a, S, M, O> {
    switches: S,
    midi: M,
    indicator: O,
    pitch_bend: &'a PitchBendRamp,
    octave: OctaveController,
    keyboard: KeyboardRouter,
}

impl<'a, S, M, O> Application<'a, S, M, O>
where
    S: SwitchSource,
    M: MidiOut,
    O: OctaveIndicator,
{
    /// Takes a synchronous snapshot of the switches and decides how the device starts.
    ///
    /// The MIDI transport and the indicator are only constructed, through `midi` and `indicator`, for a normal
    /// start; in update mode neither is touched.
    pub fn boot<D: DelayNs>(
        mut switches: S,
        delay: &mut D,
        now: Instant,
        pitch_bend: &'a PitchBendRamp,
        midi: impl FnOnce() -> M,
        indicator: impl FnOnce() -> O,
    ) -> Result<Startup<Self>, S::Error> {
        switches.force_scan(delay, now)?;
        if update_requested(&switches) {
            #[cfg(feature = "defmt")]
            defmt::info!("Update chord held at boot");
            return Ok(Startup::FirmwareUpdate);
        }

        let mut application = Self {
            switches,
            midi: midi(),
            indicator: indicator(),
            pitch_bend,
            octave: OctaveController::default(),
            keyboard: KeyboardRouter::new(),
        };
        application
            .indicator
            .set_octave_indicator(application.octave.current());
        Ok(Startup::Running(application))
    }

    /// Runs one iteration of the main loop.
    pub fn poll(&mut self, now: Instant) -> Result<(), S::Error> {
        for edge in self.switches.advance(now)? {
            self.handle_edge(edge);
        }
        self.keyboard.process(&self.octave, &mut self.midi);
        if let Some(value) = self.pitch_bend.take_pending() {
            self.midi.pitch_bend(value, MIDI_CHANNEL);
        }
        self.midi.flush();
        Ok(())
    }

    fn handle_edge(&mut self, Edge { switch, on }: Edge) {
        #[cfg(feature = "defmt")]
        defmt::trace!("{} is {}", switch, if on { "on" } else { "off" });

        if let Some(offset) = switch.key_offset() {
            self.keyboard.record_edge(offset, on);
            return;
        }

        let switched_value = if on { SWITCH_ON_VALUE } else { 0 };
        match (switch, on) {
            (SwitchId::Sustain, _) => {
                self.midi
                    .control_change(SUSTAIN_CONTROLLER, switched_value, MIDI_CHANNEL);
            }
            (SwitchId::Modulation, _) => {
                self.midi
                    .control_change(MODULATION_CONTROLLER, switched_value, MIDI_CHANNEL);
            }
            (SwitchId::PitchBendPlus, true) => self.pitch_bend.press(BendDirection::Up),
            (SwitchId::PitchBendPlus, false) => self.pitch_bend.release(BendDirection::Up),
            (SwitchId::PitchBendMinus, true) => self.pitch_bend.press(BendDirection::Down),
            (SwitchId::PitchBendMinus, false) => self.pitch_bend.release(BendDirection::Down),
            (SwitchId::OctaveMinus, true) => self.shift_octave(-1),
            (SwitchId::OctavePlus, true) => self.shift_octave(1),
            _ => {}
        }
    }

    fn shift_octave(&mut self, delta: i8) {
        if let Some(octave) = self.octave.shift(delta) {
            #[cfg(feature = "defmt")]
            defmt::info!("Octave changed to {}", octave);
            self.indicator.set_octave_indicator(octave);
        }
    }

    /// The octave the keybed plays in.
    pub fn octave(&self) -> i8 {
        self.octave.current()
    }

    /// The MIDI transport.
    pub fn midi(&self) -> &M {
        &self.midi
    }

    /// The octave indicator.
    pub fn indicator(&self) -> &O {
        &self.indicator
    }
}
