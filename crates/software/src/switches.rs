//! Identifiers for every switch on the controller and the wiring that connects them to the shift registers.
//!
//! The switches are read through two cascaded 74HC165 parallel-to-serial registers, clocked together onto three
//! read lines. A switch's position in that arrangement is described by the register (chip) it sits behind, the bit
//! within that register, and the read line the bit comes out on.

mod matrix;
pub use matrix::*;

mod scanner;
pub use scanner::*;

use crate::configuration::KEY_COUNT;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;
use tinyvec::ArrayVec;

/// Total number of switches: every key of the keybed followed by the control buttons.
pub const SWITCH_COUNT: usize = 31;

/// Number of cascaded shift registers.
pub const CHIP_COUNT: usize = 2;

/// Number of parallel inputs latched by each shift register.
pub const BITS_PER_CHIP: usize = 8;

/// Number of serial outputs read in parallel on every clock.
pub const READ_LINE_COUNT: usize = 3;

/// Identifies a physical switch.
///
/// Keys come first, in chromatic order from C1 to C3, so a key's discriminant is also its semitone offset from
/// the leftmost key. The control buttons follow.
#[derive(Clone, Copy, Debug, Default, Eq, FromPrimitive, Hash, PartialEq, ToPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum SwitchId {
    #[default]
    C1,
    Cs1,
    D1,
    Ds1,
    E1,
    F1,
    Fs1,
    G1,
    Gs1,
    A1,
    As1,
    B1,
    C2,
    Cs2,
    D2,
    Ds2,
    E2,
    F2,
    Fs2,
    G2,
    Gs2,
    A2,
    As2,
    B2,
    C3,
    Sustain,
    PitchBendPlus,
    PitchBendMinus,
    Modulation,
    OctaveMinus,
    OctavePlus,
}

const _: () = assert!(SwitchId::OctavePlus as usize + 1 == SWITCH_COUNT);
const _: () = assert!(SwitchId::C3 as usize + 1 == KEY_COUNT);

impl SwitchId {
    /// Position of the switch in per-switch arrays.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the switch stored at `index` of a per-switch array, if any.
    pub fn from_index(index: usize) -> Option<Self> {
        <Self as FromPrimitive>::from_usize(index)
    }

    /// For keys, the 0-based offset from the leftmost key (C1); `None` for control buttons.
    pub fn key_offset(self) -> Option<usize> {
        let index = self.index();
        (index < KEY_COUNT).then_some(index)
    }

    /// Iterates over every switch in index order.
    pub fn all() -> impl Iterator<Item = SwitchId> {
        (0..SWITCH_COUNT).filter_map(Self::from_index)
    }
}

/// A confirmed change in a switch's state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Edge {
    /// The switch that changed.
    pub switch: SwitchId,
    /// `true` if the switch is now pressed, `false` if it was released.
    pub on: bool,
}

impl Edge {
    /// Constructs an [`Edge`].
    pub fn new(switch: SwitchId, on: bool) -> Self {
        Self { switch, on }
    }
}

/// The edges produced by a single scan. A switch changes at most once per scan, so this never overflows.
pub type Edges = ArrayVec<[Edge; SWITCH_COUNT]>;

type Wiring = [[[Option<SwitchId>; READ_LINE_COUNT]; BITS_PER_CHIP]; CHIP_COUNT];

/// Which switch sits at `[chip][bit][read line]`; `None` marks unconnected inputs.
///
/// Chip 0 is the register nearest the serial outputs, so its bits are clocked out first.
#[rustfmt::skip]
const WIRING: Wiring = {
    use SwitchId::*;
    [
        // read lines: U3, U5, U2
        [
            [Some(Cs1), Some(F2),  None],
            [Some(D1),  Some(Fs2), None],
            [Some(Ds1), Some(G2),  Some(Sustain)],
            [Some(E1),  Some(Gs2), Some(PitchBendPlus)],
            [Some(F1),  Some(A2),  Some(PitchBendMinus)],
            [Some(Fs1), Some(As2), Some(Modulation)],
            [Some(G1),  Some(B2),  Some(OctaveMinus)],
            [Some(Gs1), Some(C3),  Some(OctavePlus)],
        ],
        // read lines: KEY_C1, U4, (none)
        [
            [Some(C1), Some(A1),  None],
            [None,     Some(As1), None],
            [None,     Some(B1),  None],
            [None,     Some(C2),  None],
            [None,     Some(Cs2), None],
            [None,     Some(D2),  None],
            [None,     Some(Ds2), None],
            [None,     Some(E2),  None],
        ],
    ]
};

/// Maps a position in the shift register chain to the switch wired there.
///
/// Returns `None` both for unconnected inputs and for positions outside the chain.
pub fn switch_at(chip: usize, bit: usize, read_line: usize) -> Option<SwitchId> {
    WIRING.get(chip)?.get(bit)?.get(read_line).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_switch_is_wired_exactly_once() {
        let mut seen = [0_u8; SWITCH_COUNT];
        for chip in 0..CHIP_COUNT {
            for bit in 0..BITS_PER_CHIP {
                for line in 0..READ_LINE_COUNT {
                    if let Some(id) = switch_at(chip, bit, line) {
                        seen[id.index()] += 1;
                    }
                }
            }
        }
        assert_eq!([1; SWITCH_COUNT], seen, "Expected left but got right");
    }

    #[test]
    fn out_of_range_positions_have_no_switch() {
        for chip in 0..CHIP_COUNT + 2 {
            for bit in 0..BITS_PER_CHIP + 2 {
                for line in 0..READ_LINE_COUNT + 2 {
                    if chip >= CHIP_COUNT || bit >= BITS_PER_CHIP || line >= READ_LINE_COUNT {
                        assert_eq!(
                            None,
                            switch_at(chip, bit, line),
                            "Expected no switch at ({chip}, {bit}, {line})"
                        );
                    }
                }
            }
        }
        assert_eq!(None, switch_at(usize::MAX, 0, 0));
    }

    #[test]
    fn spot_checks() {
        assert_eq!(Some(SwitchId::C1), switch_at(1, 0, 0));
        assert_eq!(Some(SwitchId::Cs1), switch_at(0, 0, 0));
        assert_eq!(Some(SwitchId::C3), switch_at(0, 7, 1));
        assert_eq!(Some(SwitchId::A1), switch_at(1, 0, 1));
        assert_eq!(Some(SwitchId::E2), switch_at(1, 7, 1));
        assert_eq!(Some(SwitchId::Sustain), switch_at(0, 2, 2));
        assert_eq!(Some(SwitchId::OctavePlus), switch_at(0, 7, 2));
        assert_eq!(None, switch_at(0, 1, 2));
        assert_eq!(None, switch_at(1, 1, 0));
        assert_eq!(None, switch_at(1, 3, 2));
    }

    #[test]
    fn keys_precede_controls() {
        let keys = SwitchId::all().filter(|id| id.key_offset().is_some()).count();
        assert_eq!(KEY_COUNT, keys, "Expected left but got right");
        assert_eq!(Some(0), SwitchId::C1.key_offset());
        assert_eq!(Some(12), SwitchId::C2.key_offset());
        assert_eq!(Some(24), SwitchId::C3.key_offset());
        assert_eq!(None, SwitchId::Sustain.key_offset());
        assert_eq!(None, SwitchId::OctavePlus.key_offset());
    }

    #[test]
    fn index_round_trips_and_rejects_overflow() {
        for id in SwitchId::all() {
            assert_eq!(Some(id), SwitchId::from_index(id.index()));
        }
        assert_eq!(None, SwitchId::from_index(SWITCH_COUNT));
    }
}
