use crate::SessionId;

/// A range of IDs minted by one session, announced through the total-order
/// broadcast so that every compressor in the document finalizes it
/// identically.
///
/// Produced by [`IdCompressor::take_next_creation_range`] and consumed by
/// [`IdCompressor::finalize_creation_range`]. Delivering each range exactly
/// once, in a single global order, is the broadcast's responsibility.
///
/// [`IdCompressor::take_next_creation_range`]: crate::IdCompressor::take_next_creation_range
/// [`IdCompressor::finalize_creation_range`]: crate::IdCompressor::finalize_creation_range
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IdCreationRange {
    /// The minting session.
    pub session_id: SessionId,
    /// The announced interval, or `None` if nothing was minted since the
    /// last take.
    pub ids: Option<CreationRangeIds>,
}

/// The closed generation-count interval carried by an [`IdCreationRange`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CreationRangeIds {
    /// First generation count in the range; 1-based.
    pub first_gen_count: u64,
    /// Last generation count in the range; `>= first_gen_count`.
    pub last_gen_count: u64,
}
