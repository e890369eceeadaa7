use std::{
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use crate::EmitError;

/// An exclusive claim on an output path, held as a marker file next to it.
///
/// The marker is removed when the value is dropped.
#[derive(Debug)]
pub struct LockMarker {
    path: PathBuf,
}

impl LockMarker {
    /// Creates the marker at `path`, failing if it already exists.
    pub fn acquire(path: PathBuf) -> Result<Self, EmitError> {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                log::debug!("acquired lock marker `{}`", path.display());
                Ok(Self { path })
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                Err(EmitError::Collision { lock: path })
            }
            Err(source) => Err(EmitError::Lock { path, source }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockMarker {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("released lock marker `{}`", self.path.display()),
            Err(err) => log::warn!(
                "failed to remove lock marker `{}`: {err}",
                self.path.display()
            ),
        }
    }
}
