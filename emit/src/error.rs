use std::{io, path::PathBuf};

use thiserror::Error;

/// Why an artifact could not be emitted. Nothing is retried.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("`{}` does not name an output file", path.display())]
    InvalidOutput { path: PathBuf },
    #[error("failed to create directory `{}`", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("another compilation is writing the same output (lock marker `{}` exists)", lock.display())]
    Collision { lock: PathBuf },
    #[error("failed to create lock marker `{}`", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to render `{}`: {message}", path.display())]
    Encode { path: PathBuf, message: String },
    #[error("failed to serialize `{}`: {message}", path.display())]
    Serialize { path: PathBuf, message: String },
}
