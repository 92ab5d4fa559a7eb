//! Versioned binary snapshot format.
//!
//! v1 layout, all integers little-endian:
//!
//! ```text
//! u32  version
//! u32  cluster capacity policy
//! u8   has local session (0 | 1)
//! u32  session count
//!        session count × u128 session base (raw UUID bytes)
//! u32  cluster count
//!        cluster count × { u32 session index, u64 first gen count,
//!                          u32 capacity, u32 count, u64 base final }
//! u64  next final
//! if has local session:
//!   u32  local session index
//!   u64  next local gen count
//!   u64  last taken gen count
//! ```
//!
//! Only `CURRENT_WRITTEN_VERSION` is accepted; a future layout change must
//! bump the tag.

use crate::compressor::MAX_COMPRESSED_LIMIT;
use crate::space::{FinalSpace, IdCluster, Sessions};
use crate::{
    Error, FinalId, IdCompressor, MAX_CLUSTER_CAPACITY, Result, SessionId, StableId,
};
use uuid::Uuid;

pub(crate) const CURRENT_WRITTEN_VERSION: u32 = 1;

fn write_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_le_bytes());
}

fn write_u64(bytes: &mut Vec<u8>, value: u64) {
    bytes.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn serialize(compressor: &IdCompressor, with_session: bool) -> Vec<u8> {
    let mut bytes = Vec::new();
    write_u32(&mut bytes, CURRENT_WRITTEN_VERSION);
    write_u32(&mut bytes, compressor.cluster_capacity);
    bytes.push(with_session as u8);

    let bases = compressor.sessions.bases();
    write_u32(&mut bytes, bases.len() as u32);
    for base in bases {
        bytes.extend_from_slice(base.to_uuid().as_bytes());
    }

    let clusters = compressor.final_space.clusters();
    write_u32(&mut bytes, clusters.len() as u32);
    for cluster in clusters {
        write_u32(&mut bytes, cluster.session);
        write_u64(&mut bytes, cluster.first_gen_count);
        write_u32(&mut bytes, cluster.capacity);
        write_u32(&mut bytes, cluster.count);
        write_u64(&mut bytes, cluster.base_final.to_raw());
    }
    write_u64(&mut bytes, compressor.final_space.next_final());

    if with_session {
        write_u32(&mut bytes, compressor.local_session);
        write_u64(&mut bytes, compressor.generated_id_count);
        write_u64(&mut bytes, compressor.last_taken_gen_count);
    }
    bytes
}

/// A cursor over snapshot bytes; every read fails with
/// [`Error::MalformedSerializedState`] on truncation.
struct Reader<'a> {
    bytes: &'a [u8],
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let (taken, rest) = self
            .bytes
            .split_at_checked(N)
            .ok_or(Error::MalformedSerializedState)?;
        self.bytes = rest;
        Ok(taken.try_into().expect("split length"))
    }

    fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    fn take_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn take_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    fn take_session_base(&mut self) -> Result<StableId> {
        let uuid = Uuid::from_bytes(self.take()?);
        StableId::from_uuid(uuid).map_err(|_| Error::MalformedSerializedState)
    }

    fn finish(self) -> Result<()> {
        if self.bytes.is_empty() {
            Ok(())
        } else {
            Err(Error::MalformedSerializedState)
        }
    }
}

pub(crate) fn deserialize<F>(bytes: &[u8], make_session_id: F) -> Result<IdCompressor>
where
    F: FnOnce() -> SessionId,
{
    let mut reader = Reader { bytes };

    let version = reader.take_u32()?;
    if version != CURRENT_WRITTEN_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }
    let cluster_capacity = reader.take_u32()?;
    if cluster_capacity < 1 || cluster_capacity > MAX_CLUSTER_CAPACITY {
        return Err(Error::MalformedSerializedState);
    }
    let has_local_session = match reader.take_u8()? {
        0 => false,
        1 => true,
        _ => return Err(Error::MalformedSerializedState),
    };

    let session_count = reader.take_u32()?;
    let mut sessions = Sessions::new();
    for index in 0..session_count {
        let base = reader.take_session_base()?;
        // duplicate bases would collapse and shift every later index
        if sessions.get_or_create(SessionId::from(base)) != index {
            return Err(Error::MalformedSerializedState);
        }
    }

    let cluster_count = reader.take_u32()?;
    let mut clusters = Vec::with_capacity(cluster_count.min(1 << 16) as usize);
    let mut frontier = 0u64;
    for _ in 0..cluster_count {
        let cluster = IdCluster {
            session: reader.take_u32()?,
            first_gen_count: reader.take_u64()?,
            capacity: reader.take_u32()?,
            count: reader.take_u32()?,
            base_final: FinalId::from_raw(reader.take_u64()?),
        };
        if cluster.session >= sessions.session_count()
            || cluster.count > cluster.capacity
            || cluster.capacity == 0
            || cluster.base_final.to_raw() != frontier
        {
            return Err(Error::MalformedSerializedState);
        }
        frontier = cluster.allocated_end();
        if frontier > MAX_COMPRESSED_LIMIT + 1 {
            return Err(Error::MalformedSerializedState);
        }
        clusters.push(cluster);
    }
    let next_final = reader.take_u64()?;
    if next_final != frontier {
        return Err(Error::MalformedSerializedState);
    }

    // rebuild the per-session chains; snapshot order is base-final order,
    // which is also each session's generation-count order
    for (index, cluster) in clusters.iter().enumerate() {
        let expected = sessions
            .tail_cluster(cluster.session)
            .map(|i| clusters[i as usize].next_gen_count())
            .unwrap_or(1);
        if cluster.first_gen_count != expected {
            return Err(Error::MalformedSerializedState);
        }
        sessions.push_cluster(cluster.session, index as u32);
    }

    let (local_session, generated_id_count, last_taken_gen_count) = if has_local_session {
        let local_session = reader.take_u32()?;
        let generated_id_count = reader.take_u64()?;
        let last_taken_gen_count = reader.take_u64()?;
        if local_session >= sessions.session_count()
            || generated_id_count > MAX_COMPRESSED_LIMIT
            || last_taken_gen_count > generated_id_count
        {
            return Err(Error::MalformedSerializedState);
        }
        (local_session, generated_id_count, last_taken_gen_count)
    } else {
        let session_id = make_session_id();
        if sessions.get(session_id).is_some() {
            return Err(Error::SessionCollision);
        }
        (sessions.get_or_create(session_id), 0, 0)
    };
    reader.finish()?;

    let session_id = SessionId::from(sessions.base(local_session));
    Ok(IdCompressor::from_parts(
        session_id,
        local_session,
        generated_id_count,
        last_taken_gen_count,
        cluster_capacity,
        sessions,
        FinalSpace::from_parts(clusters, next_final),
    ))
}
