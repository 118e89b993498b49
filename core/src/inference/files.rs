//! Descriptor/weights path pairing.

use std::path::{Path, PathBuf};

use crate::error::{AdaptorError, Result};

/// Extension of the weights file that accompanies a model descriptor.
pub const WEIGHTS_EXTENSION: &str = "bin";

/// A model descriptor and the weights file next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub descriptor: PathBuf,
    pub weights: PathBuf,
}

impl ModelFiles {
    /// Pair a descriptor with its weights: same directory, same base name,
    /// extension replaced by [`WEIGHTS_EXTENSION`].
    pub fn from_descriptor(descriptor: impl AsRef<Path>) -> Result<Self> {
        let descriptor = descriptor.as_ref();
        if descriptor.as_os_str().is_empty() {
            return Err(AdaptorError::MissingDescriptor);
        }

        Ok(Self {
            descriptor: descriptor.to_path_buf(),
            weights: descriptor.with_extension(WEIGHTS_EXTENSION),
        })
    }

    /// Fail with [`AdaptorError::FileNotFound`] unless both files exist.
    pub fn ensure_exist(&self) -> Result<()> {
        for path in [&self.descriptor, &self.weights] {
            if !path.is_file() {
                return Err(AdaptorError::FileNotFound(path.clone()));
            }
        }
        Ok(())
    }
}
