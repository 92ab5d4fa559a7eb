use core::fmt;

/// A document-wide compressed ID: a non-negative integer assigned by
/// finalization, globally ordered by allocation and densely packed by
/// cluster.
///
/// A `FinalId` is stable and unique across every session fed the same
/// finalization stream; it can only be decompressed in the context of the
/// originating document.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FinalId {
    id: u64,
}

impl FinalId {
    pub(crate) const fn from_raw(id: u64) -> Self {
        Self { id }
    }

    /// Returns the raw wire representation.
    pub const fn to_raw(self) -> u64 {
        self.id
    }
}

impl core::ops::Add<u64> for FinalId {
    type Output = FinalId;

    fn add(self, rhs: u64) -> Self::Output {
        Self { id: self.id + rhs }
    }
}

impl fmt::Display for FinalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for FinalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FinalId({})", self.id)
    }
}
