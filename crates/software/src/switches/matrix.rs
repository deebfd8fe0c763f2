//! Provides [`SwitchMatrix`], which debounces raw switch levels into edges.

use super::{Edge, Edges, SWITCH_COUNT, SwitchId};

/// Debounced state of every switch.
///
/// Levels are stored as sampled: `true` is electrically high, which is how a released switch reads because the
/// read lines are pulled up. A pressed switch pulls its input low.
///
/// A new level is accepted only after it has been seen on two consecutive scans, which rejects single-scan contact
/// bounce.
#[derive(Clone, Debug, PartialEq)]
pub struct SwitchMatrix {
    /// Levels from the scan in progress.
    current: [bool; SWITCH_COUNT],
    /// Levels from the scan before that.
    previous: [bool; SWITCH_COUNT],
    /// Last accepted level of each switch.
    confirmed: [bool; SWITCH_COUNT],
}

impl Default for SwitchMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl SwitchMatrix {
    /// Constructs a [`SwitchMatrix`] with every switch released.
    pub const fn new() -> Self {
        Self {
            current: [true; SWITCH_COUNT],
            previous: [true; SWITCH_COUNT],
            confirmed: [true; SWITCH_COUNT],
        }
    }

    /// Records the raw level read for `switch` during the current scan.
    pub fn sample(&mut self, switch: SwitchId, high: bool) {
        self.current[switch.index()] = high;
    }

    /// Closes the current scan, returning an [`Edge`] for every switch whose confirmed state changed.
    ///
    /// The reported state is the inverse of the electrical level: a low input is a pressed switch.
    pub fn update(&mut self) -> Edges {
        let mut edges = Edges::new();
        for (index, switch) in SwitchId::all().enumerate() {
            let level = self.current[index];
            if level == self.previous[index] && level != self.confirmed[index] {
                self.confirmed[index] = level;
                edges.push(Edge::new(switch, !level));
            }
            self.previous[index] = level;
        }
        edges
    }

    /// Returns the confirmed state of `switch`; `true` means pressed.
    pub fn is_on(&self, switch: SwitchId) -> bool {
        self.is_on_index(switch.index())
    }

    /// Like [`is_on`][Self::is_on] but for a raw index, reporting indices outside the matrix as released.
    pub fn is_on_index(&self, index: usize) -> bool {
        self.confirmed.get(index).is_some_and(|&level| !level)
    }
}
