//! Crate-wide error taxonomy.

/// Errors surfaced by the cache frontend, backends and the invalidation
/// channel.
///
/// `InvalidKey` and `Serialization` are detected before any backend I/O,
/// so a failed `set` leaves no partial state (no tag binding, no write).
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    #[error("serialization failed for key {key:?}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("deserialization failed for key {key:?}: {reason}")]
    Deserialization { key: String, reason: String },

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("invalidation channel unavailable: {0}")]
    ChannelUnavailable(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
