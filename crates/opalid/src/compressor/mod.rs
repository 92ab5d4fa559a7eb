
use crate::space::{FinalSpace, IdCluster, SessionIndex, Sessions};
use crate::{
    CompressedId, CreationRangeIds, Error, FinalId, IdCreationRange, LocalId, OpSpaceId, Result,
    SessionId, SessionSpaceId, StableId, persistence,
};
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Cluster capacity used by a freshly constructed compressor.
pub const DEFAULT_CLUSTER_CAPACITY: u32 = 512;

/// Upper bound accepted by [`IdCompressor::set_cluster_capacity`].
pub const MAX_CLUSTER_CAPACITY: u32 = 1 << 20;

/// Compressed IDs stay below 2^53 so they survive f64-based host runtimes;
/// running past this bound fails explicitly instead of wrapping.
pub(crate) const MAX_COMPRESSED_LIMIT: u64 = (1 << 53) - 1;

/// The distributed identifier compressor.
///
/// Mints compact session-space IDs synchronously and offline, and applies
/// the document's totally-ordered stream of [`IdCreationRange`]
/// announcements so that locally-minted IDs acquire dense, document-unique
/// final forms. Two compressors fed the same finalization sequence (and the
/// same capacity-policy history) hold bit-identical cluster tables.
///
/// The compressor is a single-threaded, non-reentrant state machine: no
/// operation suspends, and every operation completes in constant or
/// logarithmic time. State is append-only; IDs are never recycled.
///
/// # Example
///
/// ```
/// use opalid::{IdCompressor, SessionSpaceId};
///
/// let mut compressor = IdCompressor::new();
/// let id = compressor.generate_next_id().unwrap();
/// assert_eq!(id, SessionSpaceId::from_raw(-1));
///
/// // self-finalize the pending range, as if echoed by the broadcast
/// let range = compressor.take_next_creation_range();
/// compressor.finalize_creation_range(&range).unwrap();
/// assert_eq!(compressor.normalize_to_op_space(id).unwrap().to_raw(), 0);
/// ```
#[derive(Debug)]
pub struct IdCompressor {
    pub(crate) session_id: SessionId,
    pub(crate) local_session: SessionIndex,
    /// Generation count of the most recently minted local ID.
    pub(crate) generated_id_count: u64,
    /// Generation count up to which ranges have been taken for broadcast.
    pub(crate) last_taken_gen_count: u64,
    pub(crate) cluster_capacity: u32,
    pub(crate) sessions: Sessions,
    pub(crate) final_space: FinalSpace,
}

impl IdCompressor {
    /// Instantiates a compressor with a random session ID.
    #[cfg(feature = "uuid-generation")]
    pub fn new() -> Self {
        Self::new_with_session_id(SessionId::new())
    }

    /// Instantiates a compressor with the supplied session ID.
    pub fn new_with_session_id(session_id: SessionId) -> Self {
        let mut sessions = Sessions::new();
        let local_session = sessions.get_or_create(session_id);
        Self {
            session_id,
            local_session,
            generated_id_count: 0,
            last_taken_gen_count: 0,
            cluster_capacity: DEFAULT_CLUSTER_CAPACITY,
            sessions,
            final_space: FinalSpace::new(),
        }
    }

    pub(crate) fn from_parts(
        session_id: SessionId,
        local_session: SessionIndex,
        generated_id_count: u64,
        last_taken_gen_count: u64,
        cluster_capacity: u32,
        sessions: Sessions,
        final_space: FinalSpace,
    ) -> Self {
        Self {
            session_id,
            local_session,
            generated_id_count,
            last_taken_gen_count,
            cluster_capacity,
            sessions,
            final_space,
        }
    }

    /// Returns this compressor's session ID.
    pub fn local_session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns the capacity used when allocating new clusters.
    pub fn cluster_capacity(&self) -> u32 {
        self.cluster_capacity
    }

    /// Updates the capacity used for future cluster allocation. Existing
    /// clusters are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidClusterCapacity`] outside
    /// `1..=`[`MAX_CLUSTER_CAPACITY`].
    pub fn set_cluster_capacity(&mut self, capacity: u32) -> Result<()> {
        if capacity < 1 || capacity > MAX_CLUSTER_CAPACITY {
            return Err(Error::InvalidClusterCapacity);
        }
        self.cluster_capacity = capacity;
        Ok(())
    }

    /// Mints the next session-space ID.
    ///
    /// Returns an *eager final* when the local session's tail cluster has
    /// live reserved slack covering the new generation count; the caller
    /// then never needs to renormalize that ID. Otherwise returns the local
    /// form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IdOverflow`] once the generation-count axis is
    /// exhausted.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn generate_next_id(&mut self) -> Result<SessionSpaceId> {
        if self.generated_id_count >= MAX_COMPRESSED_LIMIT {
            return Err(Error::IdOverflow);
        }
        self.generated_id_count += 1;
        let gen_count = self.generated_id_count;

        if let Some(tail_index) = self.sessions.tail_cluster(self.local_session) {
            let tail = self.final_space.get(tail_index);
            // Slack is only promised while no other cluster has been
            // allocated after the tail; once the frontier moves past it the
            // slack can never be filled.
            if self.final_space.is_last_allocated(tail) && tail.covers_allocated(gen_count) {
                return Ok(tail.final_for(gen_count).into());
            }
        }
        Ok(LocalId::from_generation_count(gen_count).into())
    }

    /// Drains the IDs minted since the last call into a range for the
    /// broadcast.
    ///
    /// Returns a range with `ids: None` when nothing is pending. Delivery
    /// (and idempotency of delivery) is the caller's concern; successive
    /// calls partition the generation-count axis into disjoint contiguous
    /// intervals.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn take_next_creation_range(&mut self) -> IdCreationRange {
        let ids = (self.last_taken_gen_count < self.generated_id_count).then(|| {
            let ids = CreationRangeIds {
                first_gen_count: self.last_taken_gen_count + 1,
                last_gen_count: self.generated_id_count,
            };
            self.last_taken_gen_count = self.generated_id_count;
            ids
        });
        IdCreationRange {
            session_id: self.session_id,
            ids,
        }
    }

    /// Applies one totally-ordered range announcement to the cluster table.
    ///
    /// Every compressor in the document must observe the same announcements
    /// in the same order. The range extends the announcing session's tail
    /// cluster in place when it fits in live reserved slack, grows the tail
    /// when that cluster still owns the allocation frontier, and otherwise
    /// allocates a new cluster (abandoning any slack stranded behind the
    /// frontier).
    ///
    /// A range with `ids: None` is a no-op.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedIdRange`]: `first_gen_count == 0` or
    ///   `last_gen_count < first_gen_count`.
    /// - [`Error::RangeFinalizedOutOfOrder`]: the range does not continue
    ///   the session's finalized generation counts contiguously (first range
    ///   of a session must start at 1).
    /// - [`Error::IdOverflow`]: the range or the resulting cluster would
    ///   leave the representable ID space.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn finalize_creation_range(&mut self, range: &IdCreationRange) -> Result<()> {
        let Some(ids) = range.ids else {
            return Ok(());
        };
        if ids.first_gen_count == 0 || ids.last_gen_count < ids.first_gen_count {
            return Err(Error::MalformedIdRange);
        }
        if ids.last_gen_count > MAX_COMPRESSED_LIMIT {
            return Err(Error::IdOverflow);
        }
        let count = u32::try_from(ids.last_gen_count - ids.first_gen_count + 1)
            .map_err(|_| Error::IdOverflow)?;

        let session = self.sessions.get_or_create(range.session_id);
        let Some(tail_index) = self.sessions.tail_cluster(session) else {
            if ids.first_gen_count != 1 {
                return Err(Error::RangeFinalizedOutOfOrder);
            }
            self.add_cluster(session, 1, count)?;
            return Ok(());
        };

        let tail = *self.final_space.get(tail_index);
        if ids.first_gen_count != tail.next_gen_count() {
            return Err(Error::RangeFinalizedOutOfOrder);
        }

        if !self.final_space.is_last_allocated(&tail) {
            // The frontier has moved past the tail; its remaining slack is
            // abandoned for good and the range starts a fresh cluster.
            self.add_cluster(session, tail.next_gen_count(), count)?;
            return Ok(());
        }

        let new_count = tail.count as u64 + count as u64;
        if new_count <= tail.capacity as u64 {
            self.final_space.get_mut(tail_index).count += count;
            return Ok(());
        }

        // The tail still owns the allocation frontier, so it grows in place,
        // re-reserving policy slack past the new count.
        let new_count = u32::try_from(new_count).map_err(|_| Error::IdOverflow)?;
        let new_capacity = new_count.saturating_add(self.cluster_capacity);
        let end = tail
            .base_final
            .to_raw()
            .checked_add(new_capacity as u64)
            .ok_or(Error::IdOverflow)?;
        if end > MAX_COMPRESSED_LIMIT + 1 {
            return Err(Error::IdOverflow);
        }
        let tail = self.final_space.get_mut(tail_index);
        tail.count = new_count;
        tail.capacity = new_capacity;
        self.final_space.set_next_final(end);
        Ok(())
    }

    fn add_cluster(&mut self, session: SessionIndex, first_gen_count: u64, count: u32) -> Result<u32> {
        let capacity = count.max(self.cluster_capacity);
        let base_final = self.final_space.next_final();
        let end = base_final
            .checked_add(capacity as u64)
            .ok_or(Error::IdOverflow)?;
        if end > MAX_COMPRESSED_LIMIT + 1 {
            return Err(Error::IdOverflow);
        }
        let index = self.final_space.add(IdCluster {
            session,
            first_gen_count,
            capacity,
            count,
            base_final: FinalId::from_raw(base_final),
        });
        self.sessions.push_cluster(session, index);
        Ok(index)
    }

    /// Normalizes a session-space ID to op space for the wire.
    ///
    /// Finalized IDs travel in final form; an unfinalized local ID travels
    /// unchanged and must be accompanied by this compressor's session ID so
    /// the recipient can resolve it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownId`] for a local ID this session never
    /// minted.
    pub fn normalize_to_op_space(&self, id: SessionSpaceId) -> Result<OpSpaceId> {
        match id.to_space() {
            CompressedId::Final(id) => Ok(id.into()),
            CompressedId::Local(local) => {
                let gen_count = local.to_generation_count();
                if gen_count > self.generated_id_count {
                    return Err(Error::UnknownId);
                }
                match self.sessions.find_finalized_by_gen(
                    self.local_session,
                    gen_count,
                    self.final_space.clusters(),
                ) {
                    Some(cluster) => Ok(cluster.final_for(gen_count).into()),
                    None => Ok(local.into()),
                }
            }
        }
    }

    /// Normalizes an op-space ID received from `originator` into this
    /// session's space.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownId`]: a final ID outside every known cluster, or a
    ///   local ID of this session that was never minted.
    /// - [`Error::UnfinalizedForeignId`]: a local ID of a remote session
    ///   whose finalization has not yet been observed; it cannot be
    ///   represented here until it has.
    pub fn normalize_to_session_space(
        &self,
        id: OpSpaceId,
        originator: SessionId,
    ) -> Result<SessionSpaceId> {
        match id.to_space() {
            CompressedId::Final(id) => {
                self.resolve_final(id).ok_or(Error::UnknownId)?;
                Ok(id.into())
            }
            CompressedId::Local(local) => {
                let gen_count = local.to_generation_count();
                if originator == self.session_id {
                    if gen_count > self.generated_id_count {
                        return Err(Error::UnknownId);
                    }
                    match self.sessions.find_finalized_by_gen(
                        self.local_session,
                        gen_count,
                        self.final_space.clusters(),
                    ) {
                        Some(cluster) => Ok(cluster.final_for(gen_count).into()),
                        None => Ok(local.into()),
                    }
                } else {
                    let session = self
                        .sessions
                        .get(originator)
                        .ok_or(Error::UnfinalizedForeignId)?;
                    match self.sessions.find_finalized_by_gen(
                        session,
                        gen_count,
                        self.final_space.clusters(),
                    ) {
                        Some(cluster) => Ok(cluster.final_for(gen_count).into()),
                        None => Err(Error::UnfinalizedForeignId),
                    }
                }
            }
        }
    }

    /// Resolves a final ID to its cluster and generation count.
    ///
    /// A final ID is resolvable when it has been finalized, or while it is a
    /// live eager-final promise of the local session: inside the allocated
    /// span of a local cluster, minted already, and not (yet) finalized into
    /// a different cluster.
    fn resolve_final(&self, id: FinalId) -> Option<(&IdCluster, u64)> {
        let cluster = self.final_space.search_allocated(id)?;
        let gen_count = cluster.gen_for(id);
        if cluster.covers_finalized(gen_count) {
            return Some((cluster, gen_count));
        }
        let live_eager = cluster.session == self.local_session
            && self.final_space.is_last_allocated(cluster)
            && gen_count <= self.generated_id_count
            && self
                .sessions
                .find_finalized_by_gen(self.local_session, gen_count, self.final_space.clusters())
                .is_none();
        live_eager.then_some((cluster, gen_count))
    }

    /// Decompresses a session-space ID into its stable UUID form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownId`] if the ID is not present in the cluster
    /// table and was not minted by this session, and [`Error::IdOverflow`]
    /// if the stable form would leave the UUID space.
    pub fn decompress(&self, id: SessionSpaceId) -> Result<StableId> {
        match id.to_space() {
            CompressedId::Local(local) => {
                let gen_count = local.to_generation_count();
                if gen_count > self.generated_id_count {
                    return Err(Error::UnknownId);
                }
                self.sessions.base(self.local_session).offset_by(gen_count - 1)
            }
            CompressedId::Final(id) => {
                let (cluster, gen_count) = self.resolve_final(id).ok_or(Error::UnknownId)?;
                self.sessions.base(cluster.session).offset_by(gen_count - 1)
            }
        }
    }

    /// Like [`Self::decompress`], returning `None` where it would fail.
    pub fn try_decompress(&self, id: SessionSpaceId) -> Option<StableId> {
        self.decompress(id).ok()
    }

    /// Recompresses a stable UUID into this session's space.
    ///
    /// The owning session is found by predecessor search over session bases;
    /// IDs owned by the local session come back in the same form
    /// [`Self::generate_next_id`] would mint now (final where covered, local
    /// otherwise), remote IDs must be finalized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownId`] if no session's minted span contains the
    /// UUID.
    pub fn recompress(&self, uncompressed: StableId) -> Result<SessionSpaceId> {
        let (session, delta) = self
            .sessions
            .owner_candidate(uncompressed)
            .ok_or(Error::UnknownId)?;
        if delta >= MAX_COMPRESSED_LIMIT as u128 {
            return Err(Error::UnknownId);
        }
        let gen_count = delta as u64 + 1;

        if session == self.local_session {
            if gen_count > self.generated_id_count {
                return Err(Error::UnknownId);
            }
            if let Some(cluster) = self.sessions.find_finalized_by_gen(
                session,
                gen_count,
                self.final_space.clusters(),
            ) {
                return Ok(cluster.final_for(gen_count).into());
            }
            if let Some(tail_index) = self.sessions.tail_cluster(session) {
                let tail = self.final_space.get(tail_index);
                if self.final_space.is_last_allocated(tail) && tail.covers_allocated(gen_count) {
                    return Ok(tail.final_for(gen_count).into());
                }
            }
            Ok(LocalId::from_generation_count(gen_count).into())
        } else {
            match self
                .sessions
                .find_finalized_by_gen(session, gen_count, self.final_space.clusters())
            {
                Some(cluster) => Ok(cluster.final_for(gen_count).into()),
                None => Err(Error::UnknownId),
            }
        }
    }

    /// Like [`Self::recompress`], returning `None` where it would fail.
    pub fn try_recompress(&self, uncompressed: StableId) -> Option<SessionSpaceId> {
        self.recompress(uncompressed).ok()
    }

    /// Snapshots this compressor into the versioned binary format.
    ///
    /// With `with_session = false` only finalized, document-wide state is
    /// written (suitable for summaries shared between sessions); with
    /// `with_session = true` the local session's unfinalized state is
    /// included as well (suitable for offline resume). Either form is
    /// rehydrated via [`Self::deserialize`].
    pub fn serialize(&self, with_session: bool) -> Vec<u8> {
        persistence::serialize(self, with_session)
    }

    /// Rehydrates a serialized compressor, generating a fresh session ID if
    /// the snapshot carries none.
    ///
    /// # Errors
    ///
    /// See [`Self::deserialize_with_session_id_generator`].
    #[cfg(feature = "uuid-generation")]
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        persistence::deserialize(bytes, SessionId::new)
    }

    /// Rehydrates a serialized compressor. `make_session_id` supplies the
    /// fresh session ID used when the snapshot was written with
    /// `with_session = false`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedVersion`]: unknown format version tag.
    /// - [`Error::MalformedSerializedState`]: truncated or structurally
    ///   inconsistent snapshot.
    /// - [`Error::SessionCollision`]: the supplied session ID is already
    ///   recorded in the snapshot.
    pub fn deserialize_with_session_id_generator<F>(bytes: &[u8], make_session_id: F) -> Result<Self>
    where
        F: FnOnce() -> SessionId,
    {
        persistence::deserialize(bytes, make_session_id)
    }
}

#[cfg(feature = "uuid-generation")]
impl Default for IdCompressor {
    fn default() -> Self {
        Self::new()
    }
}
