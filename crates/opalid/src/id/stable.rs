use crate::{Error, Result};
use core::fmt;
use core::str::FromStr;
use uuid::{Uuid, Variant};

/// A 128-bit v4/variant-1 UUID treated as a 122-bit unsigned integer.
///
/// The version nibble and the variant bits are fixed; only the remaining 122
/// bits participate in arithmetic. Packed from **MSB to LSB**:
///
/// ```text
///  Bit Index:  127        80 79  76 75       64 63 62 61       0
///              +------------+------+-----------+-----+----------+
///  Field:      | upper (48) | 0100 | mid (12)  | 10  | low (62) |
///              +------------+------+-----------+-----+----------+
///              |<----------- MSB -- 128 bits -- LSB ----------->|
/// ```
///
/// The arithmetic payload is the concatenation `upper | mid | low`, so adding
/// a small offset to a `StableId` always yields another valid v4 UUID.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StableId {
    id: u128,
}

/// Shift of the version nibble within the raw `u128`.
const VERSION_SHIFT: u32 = 76;
/// Shift of the variant bits within the raw `u128`.
const VARIANT_SHIFT: u32 = 62;

const UPPER_BITS: u32 = 48;
const MID_BITS: u32 = 12;
const LOW_BITS: u32 = 62;

const MID_MASK: u128 = (1 << MID_BITS) - 1;
const LOW_MASK: u128 = (1 << LOW_BITS) - 1;

/// Largest value representable in the 122 arithmetic bits.
const MAX_PAYLOAD: u128 = (1 << (UPPER_BITS + MID_BITS + LOW_BITS)) - 1;

impl StableId {
    /// Converts a [`Uuid`] into a `StableId`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUuid`] if the UUID is not version 4 with the
    /// RFC 4122 variant; arithmetic over any other bit pattern would be
    /// lossy.
    pub fn from_uuid(uuid: Uuid) -> Result<Self> {
        if uuid.get_version_num() != 4 || uuid.get_variant() != Variant::RFC4122 {
            return Err(Error::InvalidUuid);
        }
        Ok(Self { id: uuid.as_u128() })
    }

    /// Converts this ID back into a [`Uuid`].
    pub const fn to_uuid(self) -> Uuid {
        Uuid::from_u128(self.id)
    }

    /// Returns the raw 128-bit representation.
    pub const fn to_raw(self) -> u128 {
        self.id
    }

    /// Constructs from a raw value already known to carry the v4/variant-1
    /// bit pattern.
    pub(crate) const fn from_raw_unchecked(id: u128) -> Self {
        Self { id }
    }

    /// Extracts the 122-bit arithmetic payload.
    const fn payload(self) -> u128 {
        ((self.id >> 80) << (MID_BITS + LOW_BITS))
            | (((self.id >> 64) & MID_MASK) << LOW_BITS)
            | (self.id & LOW_MASK)
    }

    /// Reassembles a `StableId` from a 122-bit payload.
    const fn from_payload(payload: u128) -> Self {
        let upper = payload >> (MID_BITS + LOW_BITS);
        let mid = (payload >> LOW_BITS) & MID_MASK;
        let low = payload & LOW_MASK;
        Self {
            id: (upper << 80) | (0x4 << VERSION_SHIFT) | (mid << 64) | (0b10 << VARIANT_SHIFT) | low,
        }
    }

    /// Returns the ID `offset` positions after this one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdOverflow`] past the end of the 122-bit space.
    pub fn offset_by(self, offset: u64) -> Result<Self> {
        let sum = self.payload() + offset as u128;
        if sum > MAX_PAYLOAD {
            return Err(Error::IdOverflow);
        }
        Ok(Self::from_payload(sum))
    }
}

impl core::ops::Sub for StableId {
    type Output = i128;

    /// Signed distance between two IDs in the 122-bit space.
    fn sub(self, rhs: Self) -> i128 {
        self.payload() as i128 - rhs.payload() as i128
    }
}

impl fmt::Display for StableId {
    /// Canonical lowercase hyphenated form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uuid())
    }
}

impl fmt::Debug for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StableId({self})")
    }
}

impl FromStr for StableId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let uuid = Uuid::try_parse(s).map_err(|_| Error::InvalidUuid)?;
        Self::from_uuid(uuid)
    }
}
