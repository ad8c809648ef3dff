use core::fmt;
use core::num::NonZeroU32;

/// Compact identifier of one trial in a calibration sweep.
///
/// Stores index+1 so `Option<TrialId>` stays the size of `TrialId`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrialId(NonZeroU32);

impl TrialId {
    /// Create an id from a 0-based trial index.
    ///
    /// Returns `None` only for `u32::MAX`, which no grid can reach.
    pub fn from_index(index: u32) -> Option<Self> {
        index.checked_add(1).and_then(NonZeroU32::new).map(Self)
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }
}

impl fmt::Debug for TrialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrialId({})", self.index())
    }
}

impl fmt::Display for TrialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}
