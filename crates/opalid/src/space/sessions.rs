use super::{IdCluster, SessionIndex};
use crate::{SessionId, StableId};
use std::collections::HashMap;

/// The session registry: interns session IDs, owns each session's ordered
/// cluster chain, and keeps a base-UUID-sorted index for recompression.
#[derive(Debug, Default)]
pub(crate) struct Sessions {
    /// `SessionIndex -> session base`.
    bases: Vec<StableId>,
    /// Reverse lookup; duplicate IDs collapse to the same index.
    by_id: HashMap<SessionId, SessionIndex>,
    /// Session indices ordered by base UUID, for predecessor search.
    by_base: Vec<SessionIndex>,
    /// `SessionIndex -> cluster indices`, ordered by `first_gen_count`.
    chains: Vec<Vec<u32>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `id`, assigning the next free index on first sight.
    pub fn get_or_create(&mut self, id: SessionId) -> SessionIndex {
        if let Some(&index) = self.by_id.get(&id) {
            return index;
        }
        let index = self.bases.len() as SessionIndex;
        let base = id.stable_id();
        let pos = self
            .by_base
            .partition_point(|&i| self.bases[i as usize] < base);
        self.by_base.insert(pos, index);
        self.bases.push(base);
        self.by_id.insert(id, index);
        self.chains.push(Vec::new());
        index
    }

    pub fn get(&self, id: SessionId) -> Option<SessionIndex> {
        self.by_id.get(&id).copied()
    }

    pub fn base(&self, index: SessionIndex) -> StableId {
        self.bases[index as usize]
    }

    pub fn session_count(&self) -> u32 {
        self.bases.len() as u32
    }

    pub fn bases(&self) -> &[StableId] {
        &self.bases
    }

    /// Appends a cluster to a session's chain. Clusters arrive in
    /// `first_gen_count` order because finalization is contiguous.
    pub fn push_cluster(&mut self, session: SessionIndex, cluster_index: u32) {
        self.chains[session as usize].push(cluster_index);
    }

    /// The session's clusters in generation-count order.
    #[cfg(test)]
    pub fn chain(&self, session: SessionIndex) -> &[u32] {
        &self.chains[session as usize]
    }

    /// The session's most recently allocated cluster, if any.
    pub fn tail_cluster(&self, session: SessionIndex) -> Option<u32> {
        self.chains[session as usize].last().copied()
    }

    /// The cluster into which `gen_count` has been finalized, if any.
    pub fn find_finalized_by_gen<'a>(
        &self,
        session: SessionIndex,
        gen_count: u64,
        clusters: &'a [IdCluster],
    ) -> Option<&'a IdCluster> {
        let chain = &self.chains[session as usize];
        let pos = chain.partition_point(|&i| clusters[i as usize].first_gen_count <= gen_count);
        let cluster = &clusters[chain[pos.checked_sub(1)?] as usize];
        cluster.covers_finalized(gen_count).then_some(cluster)
    }

    /// The session whose base is the greatest one not exceeding `id`,
    /// together with the 122-bit distance from that base.
    ///
    /// The candidate still needs bounds-checking against the session's
    /// highest known generation count.
    pub fn owner_candidate(&self, id: StableId) -> Option<(SessionIndex, u128)> {
        let pos = self
            .by_base
            .partition_point(|&i| self.bases[i as usize] <= id);
        let index = self.by_base[pos.checked_sub(1)?];
        let delta = id - self.bases[index as usize];
        debug_assert!(delta >= 0);
        Some((index, delta as u128))
    }
}
