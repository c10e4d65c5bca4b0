//! Engine error types.

use crate::cache::SnapshotError;
use crate::network::BuildError;

/// Errors from loading, rebuilding or invalidating the network.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The graph build failed or was aborted
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The snapshot could not be read, written or removed
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// The blocking build task panicked or was cancelled
    #[error("build task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EngineError::from(BuildError::Aborted);
        assert_eq!(err.to_string(), "build aborted");
    }
}
