use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    #[error("deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),

    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("decompression error")]
    Decompression,

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("encryption failure")]
    Crypto,

    #[error("invalid key length: {0} bytes")]
    InvalidKeyLength(usize),

    #[error("snapshot version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },
}

impl StoreError {
    /// Data-integrity failures are treated as "no valid data" by callers
    /// rather than surfaced as faults.
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            StoreError::Crypto
                | StoreError::ChecksumMismatch
                | StoreError::Decompression
                | StoreError::Deserialization(_)
                | StoreError::VersionMismatch { .. }
        )
    }
}
