use crate::{Result, StableId};
use core::fmt;
use core::str::FromStr;
use uuid::Uuid;

/// The stable identity of one compressor over its lifetime, including across
/// serialize/resume.
///
/// A `SessionId` is a [`StableId`] that doubles as the base UUID from which
/// all of the session's stable IDs are derived: the *k*-th ID minted by a
/// session decompresses to `session_base + (k - 1)`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId {
    id: StableId,
}

impl SessionId {
    /// Generates a random v4 session ID.
    #[cfg(feature = "uuid-generation")]
    pub fn new() -> Self {
        // new_v4 always carries the v4/variant-1 pattern
        Self {
            id: StableId::from_raw_unchecked(Uuid::new_v4().as_u128()),
        }
    }

    /// Converts a [`Uuid`] into a `SessionId`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUuid`] if the UUID is not v4/variant-1.
    ///
    /// [`Error::InvalidUuid`]: crate::Error::InvalidUuid
    pub fn from_uuid(uuid: Uuid) -> Result<Self> {
        Ok(Self {
            id: StableId::from_uuid(uuid)?,
        })
    }

    /// Returns the session base as a [`StableId`].
    pub const fn stable_id(self) -> StableId {
        self.id
    }
}

#[cfg(feature = "uuid-generation")]
impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<SessionId> for StableId {
    fn from(value: SessionId) -> Self {
        value.id
    }
}

impl From<StableId> for SessionId {
    fn from(id: StableId) -> Self {
        Self { id }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.id)
    }
}

impl FromStr for SessionId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self { id: s.parse()? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "uuid-generation")]
    fn generated_session_ids_are_v4() {
        for _ in 0..64 {
            let id = SessionId::new();
            let uuid = id.stable_id().to_uuid();
            assert_eq!(uuid.get_version_num(), 4);
            assert_eq!(uuid.get_variant(), uuid::Variant::RFC4122);
        }
    }

    #[test]
    fn parse_is_validated() {
        assert!("8e3b4e2a-889d-4b34-9e6d-bd79e9267a9b".parse::<SessionId>().is_ok());
        assert!("8e3b4e2a-889d-2b34-9e6d-bd79e9267a9b".parse::<SessionId>().is_err());
    }
}
