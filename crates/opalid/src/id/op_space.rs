use crate::{CompressedId, FinalId, LocalId};
use core::fmt;

/// A compressed ID suitable for the wire: the final form where one exists;
/// unfinalized local IDs stay local and travel with their originating
/// [`SessionId`] so that recipients can resolve them.
///
/// Shares the sign-encoded 64-bit representation of [`SessionSpaceId`]: the
/// type only tags which *space* the value lives in.
///
/// [`SessionId`]: crate::SessionId
/// [`SessionSpaceId`]: crate::SessionSpaceId
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpSpaceId {
    id: i64,
}

impl OpSpaceId {
    /// Splits the sign-encoded representation into its tagged form.
    pub const fn to_space(self) -> CompressedId {
        if self.id < 0 {
            CompressedId::Local(LocalId::from_raw_unchecked(self.id))
        } else {
            CompressedId::Final(FinalId::from_raw(self.id as u64))
        }
    }

    /// Returns the raw wire representation.
    pub const fn to_raw(self) -> i64 {
        self.id
    }

    /// Wraps a raw wire value.
    pub const fn from_raw(id: i64) -> Self {
        Self { id }
    }
}

impl From<LocalId> for OpSpaceId {
    fn from(value: LocalId) -> Self {
        Self { id: value.to_raw() }
    }
}

impl From<FinalId> for OpSpaceId {
    fn from(value: FinalId) -> Self {
        Self {
            id: value.to_raw() as i64,
        }
    }
}

impl fmt::Display for OpSpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for OpSpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpSpaceId({})", self.id)
    }
}
