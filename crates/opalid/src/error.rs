use core::fmt;

pub type Result<T> = core::result::Result<T, Error>;

/// All error variants that `opalid` can emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    /// The supplied cluster capacity is outside `1..=MAX_CLUSTER_CAPACITY`.
    InvalidClusterCapacity,
    /// The input is not a v4/variant-1 UUID.
    InvalidUuid,
    /// A creation range carried a malformed generation-count interval
    /// (`first_gen_count == 0` or `last_gen_count < first_gen_count`).
    MalformedIdRange,
    /// A finalized range left a gap in its session's generation counts.
    ///
    /// Ranges of one session must be finalized contiguously starting at
    /// generation count 1; a gap indicates a broadcast bug or a missing
    /// range.
    RangeFinalizedOutOfOrder,
    /// The session ID supplied while resuming a serialized compressor is
    /// already recorded in the snapshot.
    SessionCollision,
    /// The compressed or stable ID is not known to this compressor.
    UnknownId,
    /// A foreign session's local ID cannot be represented in this session's
    /// space until its owner finalizes it.
    UnfinalizedForeignId,
    /// The serialized snapshot was written by an unknown format version.
    UnsupportedVersion(u32),
    /// The serialized snapshot is truncated or structurally inconsistent.
    MalformedSerializedState,
    /// A generation count or final ID left the representable space.
    IdOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidClusterCapacity => write!(fmt, "cluster capacity out of range"),
            Error::InvalidUuid => write!(fmt, "not a v4/variant-1 uuid"),
            Error::MalformedIdRange => write!(fmt, "malformed id creation range"),
            Error::RangeFinalizedOutOfOrder => write!(fmt, "range finalized out of order"),
            Error::SessionCollision => write!(fmt, "resumed session id collides with a recorded session"),
            Error::UnknownId => write!(fmt, "id is not known to this compressor"),
            Error::UnfinalizedForeignId => write!(fmt, "foreign local id has not been finalized"),
            Error::UnsupportedVersion(version) => write!(fmt, "unsupported snapshot version: {version}"),
            Error::MalformedSerializedState => write!(fmt, "malformed serialized state"),
            Error::IdOverflow => write!(fmt, "id space exhausted"),
        }
    }
}

impl core::error::Error for Error {}
