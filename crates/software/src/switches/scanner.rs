//! Drives the shift register chain and feeds the readings into a [`SwitchMatrix`].

use super::{BITS_PER_CHIP, CHIP_COUNT, Edges, READ_LINE_COUNT, SwitchId, SwitchMatrix, switch_at};
use crate::configuration::{FORCE_SCAN_ROUNDS, SCAN_PERIOD, SCAN_PERIOD_MS};
use embassy_time::Instant;
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

/// States of the free-running scan cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanState {
    /// Lines are at rest; entered once at construction.
    Init,
    /// The parallel-load line is held low, latching every switch into the registers.
    LoadStart,
    /// The registers are ready to be clocked out.
    ReadBits,
    /// Idling until the scan period that started at `since` has elapsed.
    WaitNext {
        /// When the last read completed.
        since: Instant,
    },
}

impl ScanState {
    /// Number of [`Scanner::advance`] calls that make up one complete cycle when no waiting is needed.
    pub const STEPS_PER_CYCLE: usize = 4;

    /// Decides the state following `self` at time `now`.
    ///
    /// This performs no I/O; the pin levels belonging to each state are applied by the [`Scanner`] on entry.
    pub fn next(self, now: Instant) -> Self {
        match self {
            Self::Init => Self::LoadStart,
            Self::LoadStart => Self::ReadBits,
            Self::ReadBits => Self::WaitNext { since: now },
            Self::WaitNext { since } if now.saturating_duration_since(since) >= SCAN_PERIOD => {
                Self::LoadStart
            }
            waiting @ Self::WaitNext { .. } => waiting,
        }
    }
}

/// Reads every switch through two cascaded 74HC165 shift registers.
///
/// The scanner owns exactly one parallel-load pin, one clock pin, and [`READ_LINE_COUNT`] read lines; taking the
/// pins by value means they cannot be missing or shared. [`advance`][Self::advance] is meant to be called on every
/// iteration of the main loop and never blocks.
pub struct Scanner<L, C, R> {
    load: L,
    clock: C,
    read_lines: [R; READ_LINE_COUNT],
    state: ScanState,
    matrix: SwitchMatrix,
}

impl<E, L, C, R> Scanner<L, C, R>
where
    L: OutputPin<Error = E>,
    C: OutputPin<Error = E>,
    R: InputPin<Error = E>,
{
    /// Constructs a [`Scanner`], putting the control lines at rest.
    ///
    /// The read lines are expected to be configured as pulled-up inputs already.
    pub fn new(load: L, clock: C, read_lines: [R; READ_LINE_COUNT]) -> Result<Self, E> {
        let mut scanner = Self {
            load,
            clock,
            read_lines,
            state: ScanState::Init,
            matrix: SwitchMatrix::new(),
        };
        scanner.enter(ScanState::Init)?;
        Ok(scanner)
    }

    /// Performs the work of the current state and moves to the next one.
    ///
    /// Returns the edges confirmed by this call, which is empty unless a full read just completed.
    pub fn advance(&mut self, now: Instant) -> Result<Edges, E> {
        let edges = if self.state == ScanState::ReadBits {
            self.read_bits()?;
            self.matrix.update()
        } else {
            Edges::new()
        };

        let next = self.state.next(now);
        if next != self.state {
            self.enter(next)?;
        }
        Ok(edges)
    }

    /// Runs several complete cycles synchronously, delaying one scan period between steps.
    ///
    /// Used once at boot so that [`is_on`][Self::is_on] reflects the switches before the main loop starts. Edges
    /// confirmed along the way are discarded.
    pub fn force_scan<D: DelayNs>(&mut self, delay: &mut D, start: Instant) -> Result<(), E> {
        let mut now = start;
        for _ in 0..FORCE_SCAN_ROUNDS * ScanState::STEPS_PER_CYCLE {
            self.advance(now)?;
            delay.delay_ms(SCAN_PERIOD_MS);
            now += SCAN_PERIOD;
        }
        Ok(())
    }

    /// Returns the debounced state of `switch`; `true` means pressed.
    pub fn is_on(&self, switch: SwitchId) -> bool {
        self.matrix.is_on(switch)
    }

    /// The state the scanner is in.
    pub fn state(&self) -> ScanState {
        self.state
    }

    fn enter(&mut self, state: ScanState) -> Result<(), E> {
        match state {
            ScanState::Init | ScanState::WaitNext { .. } => {
                self.load.set_high()?;
                self.clock.set_low()?;
            }
            ScanState::LoadStart => {
                self.load.set_low()?;
                self.clock.set_low()?;
            }
            ScanState::ReadBits => {
                self.clock.set_low()?;
                self.load.set_high()?;
            }
        }
        self.state = state;
        Ok(())
    }

    /// Clocks the whole chain out, sampling all read lines before each rising clock edge.
    fn read_bits(&mut self) -> Result<(), E> {
        for chip in 0..CHIP_COUNT {
            for bit in 0..BITS_PER_CHIP {
                self.clock.set_low()?;
                for (line, pin) in self.read_lines.iter_mut().enumerate() {
                    let high = pin.is_high()?;
                    if let Some(switch) = switch_at(chip, bit, line) {
                        self.matrix.sample(switch, high);
                    }
                }
                self.clock.set_high()?;
            }
        }
        Ok(())
    }
}

/// Test doubles emulating the shift register chain.
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::switches::SWITCH_COUNT;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use std::{cell::RefCell, rc::Rc};

    const CHAIN_LENGTH: usize = CHIP_COUNT * BITS_PER_CHIP;

    #[derive(Default)]
    struct Registers {
        pressed: [bool; SWITCH_COUNT],
        latched: [[bool; READ_LINE_COUNT]; CHAIN_LENGTH],
        position: usize,
        load_low: bool,
        clock_high: bool,
        rising_edges: usize,
    }

    impl Registers {
        fn latch(&mut self) {
            for (position, lines) in self.latched.iter_mut().enumerate() {
                for (line, level) in lines.iter_mut().enumerate() {
                    *level = switch_at(position / BITS_PER_CHIP, position % BITS_PER_CHIP, line)
                        .is_none_or(|switch| !self.pressed[switch.index()]);
                }
            }
            self.position = 0;
        }
    }

    /// Two 74HC165s with switches attached; cloning shares the same chips.
    #[derive(Clone, Default)]
    pub(crate) struct Board(Rc<RefCell<Registers>>);

    impl Board {
        pub(crate) fn press(&self, switch: SwitchId) {
            self.0.borrow_mut().pressed[switch.index()] = true;
        }

        pub(crate) fn release(&self, switch: SwitchId) {
            self.0.borrow_mut().pressed[switch.index()] = false;
        }

        pub(crate) fn rising_edges(&self) -> usize {
            self.0.borrow().rising_edges
        }

        pub(crate) fn scanner(&self) -> Scanner<LoadPin, ClockPin, ReadLine> {
            let Ok(scanner) = Scanner::new(
                LoadPin(self.clone()),
                ClockPin(self.clone()),
                [0, 1, 2].map(|line| ReadLine(self.clone(), line)),
            );
            scanner
        }
    }

    pub(crate) struct LoadPin(Board);
    pub(crate) struct ClockPin(Board);
    pub(crate) struct ReadLine(Board, usize);

    impl ErrorType for LoadPin {
        type Error = Infallible;
    }

    impl OutputPin for LoadPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            let mut registers = self.0.0.borrow_mut();
            registers.load_low = true;
            registers.latch();
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.0.borrow_mut().load_low = false;
            Ok(())
        }
    }

    impl ErrorType for ClockPin {
        type Error = Infallible;
    }

    impl OutputPin for ClockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.0.borrow_mut().clock_high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            let mut registers = self.0.0.borrow_mut();
            if !registers.clock_high && !registers.load_low {
                registers.position += 1;
                registers.rising_edges += 1;
            }
            registers.clock_high = true;
            Ok(())
        }
    }

    impl ErrorType for ReadLine {
        type Error = Infallible;
    }

    impl InputPin for ReadLine {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            let registers = self.0.0.borrow();
            // past the end of the chain the serial input is tied high
            Ok(registers
                .latched
                .get(registers.position)
                .is_none_or(|lines| lines[self.1]))
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|high| !high)
        }
    }

    /// Counts requested delays instead of waiting.
    #[derive(Default)]
    pub(crate) struct NoDelay {
        pub(crate) total_ns: u64,
    }

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }
}
