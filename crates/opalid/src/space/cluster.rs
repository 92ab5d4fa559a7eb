use crate::FinalId;

/// Interned handle for a session within one compressor.
pub(crate) type SessionIndex = u32;

/// A contiguous run of one session's generation counts bound to a contiguous
/// run of final IDs.
///
/// The cluster owns the final-space span `[base_final, base_final +
/// capacity)`; the prefix of length `count` is finalized, the rest is
/// reserved slack for future ranges of the same session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct IdCluster {
    pub session: SessionIndex,
    pub first_gen_count: u64,
    pub capacity: u32,
    pub count: u32,
    pub base_final: FinalId,
}

impl IdCluster {
    /// True if `gen_count` has been finalized into this cluster.
    pub fn covers_finalized(&self, gen_count: u64) -> bool {
        gen_count >= self.first_gen_count && gen_count < self.first_gen_count + self.count as u64
    }

    /// True if `gen_count` falls in this cluster's allocated span, finalized
    /// or not.
    pub fn covers_allocated(&self, gen_count: u64) -> bool {
        gen_count >= self.first_gen_count && gen_count < self.first_gen_count + self.capacity as u64
    }

    /// The final ID bound to `gen_count`. Caller guarantees coverage.
    pub fn final_for(&self, gen_count: u64) -> FinalId {
        debug_assert!(self.covers_allocated(gen_count));
        self.base_final + (gen_count - self.first_gen_count)
    }

    /// The generation count bound to `id`. Caller guarantees `id` is within
    /// the allocated span.
    pub fn gen_for(&self, id: FinalId) -> u64 {
        debug_assert!(id.to_raw() >= self.base_final.to_raw());
        self.first_gen_count + (id.to_raw() - self.base_final.to_raw())
    }

    /// One past the last finalized final ID.
    pub fn finalized_end(&self) -> u64 {
        self.base_final.to_raw() + self.count as u64
    }

    /// One past the allocated final-space span.
    pub fn allocated_end(&self) -> u64 {
        self.base_final.to_raw() + self.capacity as u64
    }

    /// The generation count the session's next contiguous range must start
    /// at.
    pub fn next_gen_count(&self) -> u64 {
        self.first_gen_count + self.count as u64
    }
}
