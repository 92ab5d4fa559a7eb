use super::IdCluster;
use crate::FinalId;

/// The cluster store, ordered by `base_final`.
///
/// Final space is densely packed: every cluster starts exactly where the
/// previous one's allocated span ends, so `next_final` always equals the
/// allocated end of the last cluster.
#[derive(Debug, Default)]
pub(crate) struct FinalSpace {
    clusters: Vec<IdCluster>,
    next_final: u64,
}

impl FinalSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from snapshot parts. Caller validates invariants.
    pub fn from_parts(clusters: Vec<IdCluster>, next_final: u64) -> Self {
        Self {
            clusters,
            next_final,
        }
    }

    pub fn clusters(&self) -> &[IdCluster] {
        &self.clusters
    }

    pub fn get(&self, index: u32) -> &IdCluster {
        &self.clusters[index as usize]
    }

    pub fn get_mut(&mut self, index: u32) -> &mut IdCluster {
        &mut self.clusters[index as usize]
    }

    pub fn next_final(&self) -> u64 {
        self.next_final
    }

    pub fn set_next_final(&mut self, next_final: u64) {
        self.next_final = next_final;
    }

    /// Appends a cluster at the current allocation frontier and returns its
    /// index.
    pub fn add(&mut self, cluster: IdCluster) -> u32 {
        debug_assert_eq!(cluster.base_final.to_raw(), self.next_final);
        let index = self.clusters.len() as u32;
        self.next_final = cluster.allocated_end();
        self.clusters.push(cluster);
        index
    }

    /// True if no cluster has been allocated after this one, i.e. its
    /// reserved slack is still live.
    pub fn is_last_allocated(&self, cluster: &IdCluster) -> bool {
        cluster.allocated_end() == self.next_final
    }

    /// The cluster whose allocated span contains `id`, if any.
    pub fn search_allocated(&self, id: FinalId) -> Option<&IdCluster> {
        let pos = self
            .clusters
            .partition_point(|c| c.base_final.to_raw() <= id.to_raw());
        let cluster = &self.clusters[pos.checked_sub(1)?];
        (id.to_raw() < cluster.allocated_end()).then_some(cluster)
    }

    /// The cluster into which `id` has been finalized, if any. Distinct from
    /// [`Self::search_allocated`]: an ID in reserved slack is "found but
    /// unfinalized" and yields `None` here.
    pub fn search_finalized(&self, id: FinalId) -> Option<&IdCluster> {
        let cluster = self.search_allocated(id)?;
        (id.to_raw() < cluster.finalized_end()).then_some(cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::SessionIndex;

    fn cluster(session: SessionIndex, first_gen: u64, capacity: u32, count: u32, base: u64) -> IdCluster {
        IdCluster {
            session,
            first_gen_count: first_gen,
            capacity,
            count,
            base_final: FinalId::from_raw(base),
        }
    }

    #[test]
    fn search_distinguishes_slack_from_unknown() {
        let mut space = FinalSpace::new();
        space.add(cluster(0, 1, 5, 2, 0));
        space.add(cluster(1, 1, 5, 3, 5));

        // finalized prefix
        assert!(space.search_finalized(FinalId::from_raw(1)).is_some());
        assert!(space.search_finalized(FinalId::from_raw(7)).is_some());
        // reserved slack: allocated but not finalized
        assert!(space.search_finalized(FinalId::from_raw(2)).is_none());
        assert!(space.search_allocated(FinalId::from_raw(2)).is_some());
        // past the frontier
        assert!(space.search_allocated(FinalId::from_raw(10)).is_none());
    }

    #[test]
    fn last_allocated_tracks_frontier() {
        let mut space = FinalSpace::new();
        let first = space.add(cluster(0, 1, 5, 2, 0));
        assert!(space.is_last_allocated(space.get(first)));
        space.add(cluster(1, 1, 5, 3, 5));
        assert!(!space.is_last_allocated(space.get(first)));
    }
}
