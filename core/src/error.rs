use std::path::PathBuf;

/// Errors surfaced by the indexing core.
///
/// Degenerate queries (nothing left after preprocessing, no vocabulary hits,
/// everything filtered out) are not errors; they produce empty results.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The corpus handed to a build cannot produce an index.
    #[error("invalid corpus: {0}")]
    InvalidCorpus(String),

    /// A persisted artifact is missing, unreadable, undecodable or inconsistent.
    #[error("failed to load {artifact} from {}: {reason}", path.display())]
    Load {
        artifact: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// Writing a build artifact failed.
    #[error("failed to save {artifact} to {}: {reason}", path.display())]
    Save {
        artifact: &'static str,
        path: PathBuf,
        reason: String,
    },
}

impl Error {
    pub(crate) fn load(artifact: &'static str, path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Load { artifact, path: path.into(), reason: reason.to_string() }
    }

    pub(crate) fn save(artifact: &'static str, path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Save { artifact, path: path.into(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
