use crate::{FinalId, LocalId};
use core::fmt;

/// A compressed ID as understood by its originating session: the final form
/// where one exists, the local form otherwise.
///
/// On the wire this is a 64-bit signed integer; the sign distinguishes the
/// two forms without a tag byte:
///
/// - negative ⇒ [`LocalId`] of the local session,
/// - non-negative ⇒ [`FinalId`], valid document-wide.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionSpaceId {
    id: i64,
}

/// The two forms a compressed ID can take.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompressedId {
    Local(LocalId),
    Final(FinalId),
}

impl SessionSpaceId {
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

impl From<LocalId> for SessionSpaceId {
    fn from(value: LocalId) -> Self {
        Self { id: value.to_raw() }
    }
}

impl From<FinalId> for SessionSpaceId {
    fn from(value: FinalId) -> Self {
        Self {
            id: value.to_raw() as i64,
        }
    }
}

impl fmt::Display for SessionSpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SessionSpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionSpaceId({})", self.id)
    }
}
