use std::path::PathBuf;

/// Errors that can occur while manipulating the on-disk work tree.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The named backup directory does not exist.
    #[error("backup '{name}' not found for work {creator_id}/{work_id}")]
    BackupMissing {
        creator_id: String,
        work_id: String,
        name: String,
    },

    /// An I/O error occurred. The path is kept for server-side logging and
    /// must never be echoed back to a client.
    #[error("storage IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
