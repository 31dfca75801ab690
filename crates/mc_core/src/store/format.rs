//! Snapshot payload pipeline: MessagePack, LZ4 compression, SHA-256
//! checksum. Encryption wraps the result one layer up in the store.

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use sha2::{Digest, Sha256};

use super::error::StoreError;
use crate::models::{MatchSnapshot, SNAPSHOT_VERSION};

const CHECKSUM_LEN: usize = 32;

pub(crate) fn encode_snapshot(snapshot: &MatchSnapshot) -> Result<Vec<u8>, StoreError> {
    let msgpack = to_vec_named(snapshot)?;
    let compressed = compress_prepend_size(&msgpack);

    let mut hasher = Sha256::new();
    hasher.update(&compressed);
    let checksum = hasher.finalize();

    let mut payload = compressed;
    payload.extend_from_slice(&checksum);
    Ok(payload)
}

pub(crate) fn decode_snapshot(bytes: &[u8]) -> Result<MatchSnapshot, StoreError> {
    if bytes.len() < 4 + CHECKSUM_LEN {
        return Err(StoreError::ChecksumMismatch);
    }
    let (compressed, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);

    let mut hasher = Sha256::new();
    hasher.update(compressed);
    if hasher.finalize().as_slice() != checksum {
        return Err(StoreError::ChecksumMismatch);
    }

    let msgpack =
        decompress_size_prepended(compressed).map_err(|_| StoreError::Decompression)?;
    let snapshot: MatchSnapshot = from_slice(&msgpack)?;

    if snapshot.version > SNAPSHOT_VERSION {
        return Err(StoreError::VersionMismatch {
            found: snapshot.version,
            expected: SNAPSHOT_VERSION,
        });
    }
    Ok(snapshot)
}
