use std::io;
use std::path::PathBuf;

/// Failures surfaced by the navigation engine.
///
/// Empty states (no folders, no messages, a search without a match) are not
/// errors; they come back as `Option` or empty collections.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no message selected")]
    NoMessage,

    #[error("no folder selected")]
    NoFolder,

    #[error("not a maildir: {}", .0.display())]
    NotMaildir(PathBuf),

    #[error("refusing to rename {} over existing {}", from.display(), to.display())]
    TargetExists { from: PathBuf, to: PathBuf },

    #[error("{op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// True for failures caused by the caller rather than the filesystem.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::NoMessage | Error::NoFolder | Error::NotMaildir(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
