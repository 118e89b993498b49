//! On-disk staging of model descriptor and weights files.
//!
//! A model arrives in chunks (for example over a control channel), gets
//! appended to `<dir>/<name>/<name>.xml` and `<name>.bin`, and is marked
//! complete with a marker file once the last chunk is written. Readers poll
//! [`ModelLoader::is_model_loaded`] until the marker shows up.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{AdaptorError, Result};
use crate::inference::WEIGHTS_EXTENSION;

const DESCRIPTOR_EXTENSION: &str = "xml";
const COMPLETE_MARKER: &str = ".complete";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Stages one named model under a base directory.
#[derive(Debug, Clone)]
pub struct ModelLoader {
    model_name: String,
    model_dir: PathBuf,
    poll_interval: Duration,
}

impl ModelLoader {
    /// Bind a loader to `model_name` staged under `base_dir`. No I/O happens
    /// until [`ModelLoader::prepare_dir`].
    pub fn new(model_name: impl Into<String>, base_dir: impl AsRef<Path>) -> Self {
        let model_name = model_name.into();
        let model_dir = base_dir.as_ref().join(&model_name);
        Self {
            model_name,
            model_dir,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override how often [`ModelLoader::is_model_loaded`] checks the directory.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.staged_file(DESCRIPTOR_EXTENSION)
    }

    pub fn weights_path(&self) -> PathBuf {
        self.staged_file(WEIGHTS_EXTENSION)
    }

    fn staged_file(&self, extension: &str) -> PathBuf {
        self.model_dir.join(format!("{}.{}", self.model_name, extension))
    }

    fn marker_path(&self) -> PathBuf {
        self.model_dir.join(COMPLETE_MARKER)
    }

    /// Create an empty staging directory, discarding anything staged before.
    pub fn prepare_dir(&self) -> Result<()> {
        if self.model_dir.exists() {
            warn!(dir = %self.model_dir.display(), "Removing previously staged model");
            fs::remove_dir_all(&self.model_dir)?;
        }
        fs::create_dir_all(&self.model_dir)?;
        info!(model = %self.model_name, dir = %self.model_dir.display(), "Staging directory ready");
        Ok(())
    }

    /// Remove the staging directory. Missing directories are not an error.
    pub fn clean_up(&self) -> Result<()> {
        match fs::remove_dir_all(&self.model_dir) {
            Ok(()) => {
                info!(model = %self.model_name, "Staging directory removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Append a chunk of the model descriptor.
    pub fn save_descriptor_chunk(&self, chunk: &[u8]) -> Result<()> {
        self.append(&self.descriptor_path(), chunk)
    }

    /// Append a chunk of the model weights.
    pub fn save_weights_chunk(&self, chunk: &[u8]) -> Result<()> {
        self.append(&self.weights_path(), chunk)
    }

    fn append(&self, path: &Path, chunk: &[u8]) -> Result<()> {
        if !self.model_dir.is_dir() {
            return Err(AdaptorError::staging(format!(
                "Staging directory {} not prepared",
                self.model_dir.display()
            )));
        }
        if self.marker_path().exists() {
            return Err(AdaptorError::staging(format!(
                "Model '{}' already marked loaded",
                self.model_name
            )));
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(chunk)?;
        debug!(path = %path.display(), bytes = chunk.len(), "Saved chunk");
        Ok(())
    }

    /// Mark the staged model complete once every chunk has been saved.
    pub fn signal_loaded(&self) -> Result<()> {
        for path in [self.descriptor_path(), self.weights_path()] {
            let len = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            if len == 0 {
                return Err(AdaptorError::staging(format!(
                    "Nothing staged at {}",
                    path.display()
                )));
            }
        }
        File::create(self.marker_path())?;
        info!(model = %self.model_name, "Model staging complete");
        Ok(())
    }

    /// Whether the model is fully staged, waiting up to `timeout` for it.
    pub fn is_model_loaded(&self, timeout: Duration) -> bool {
        // No deadline when the timeout does not fit in an Instant.
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if self.is_complete() {
                return true;
            }
            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!(model = %self.model_name, ?timeout, "Model not loaded before timeout");
                        return false;
                    }
                    self.poll_interval.min(deadline - now)
                }
                None => self.poll_interval,
            };
            thread::sleep(wait);
        }
    }

    fn is_complete(&self) -> bool {
        let non_empty = |path: PathBuf| fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
        self.marker_path().is_file()
            && non_empty(self.descriptor_path())
            && non_empty(self.weights_path())
    }

    /// Stage an existing descriptor/weights pair chunk by chunk and mark it
    /// complete.
    pub fn stage_from_files(
        &self,
        descriptor: impl AsRef<Path>,
        weights: impl AsRef<Path>,
        chunk_size: usize,
    ) -> Result<()> {
        if chunk_size == 0 {
            return Err(AdaptorError::config("Chunk size must be positive"));
        }

        self.prepare_dir()?;
        let descriptor_chunks = copy_chunks(descriptor.as_ref(), chunk_size, |chunk| {
            self.save_descriptor_chunk(chunk)
        })?;
        let weights_chunks = copy_chunks(weights.as_ref(), chunk_size, |chunk| {
            self.save_weights_chunk(chunk)
        })?;
        info!(
            model = %self.model_name,
            descriptor_chunks,
            weights_chunks,
            "Staged model files"
        );
        self.signal_loaded()
    }
}

/// Feed `path` to `save` in `chunk_size` pieces; returns the chunk count.
fn copy_chunks(
    path: &Path,
    chunk_size: usize,
    mut save: impl FnMut(&[u8]) -> Result<()>,
) -> Result<usize> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AdaptorError::FileNotFound(path.to_path_buf()),
        _ => e.into(),
    })?;

    let mut buf = vec![0u8; chunk_size];
    let mut chunks = 0;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        save(&buf[..n])?;
        chunks += 1;
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader(dir: &Path) -> ModelLoader {
        ModelLoader::new("face", dir).with_poll_interval(Duration::from_millis(5))
    }

    #[test]
    fn test_paths() {
        let loader = ModelLoader::new("face", "/tmp/models");
        assert_eq!(loader.model_dir(), Path::new("/tmp/models/face"));
        assert_eq!(loader.descriptor_path(), PathBuf::from("/tmp/models/face/face.xml"));
        assert_eq!(loader.weights_path(), PathBuf::from("/tmp/models/face/face.bin"));
    }

    #[test]
    fn test_chunks_append_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader(dir.path());
        loader.prepare_dir().unwrap();

        loader.save_descriptor_chunk(b"<net>").unwrap();
        loader.save_descriptor_chunk(b"</net>").unwrap();
        loader.save_weights_chunk(&[1, 2]).unwrap();
        loader.save_weights_chunk(&[3]).unwrap();

        assert_eq!(fs::read(loader.descriptor_path()).unwrap(), b"<net></net>");
        assert_eq!(fs::read(loader.weights_path()).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_save_requires_prepared_dir() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader(dir.path());
        assert!(matches!(
            loader.save_descriptor_chunk(b"x"),
            Err(AdaptorError::Staging(_))
        ));
    }

    #[test]
    fn test_prepare_discards_previous_model() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader(dir.path());
        loader.prepare_dir().unwrap();
        loader.save_descriptor_chunk(b"old").unwrap();

        loader.prepare_dir().unwrap();
        assert!(!loader.descriptor_path().exists());
    }

    #[test]
    fn test_loaded_only_after_signal() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader(dir.path());
        loader.prepare_dir().unwrap();
        loader.save_descriptor_chunk(b"<net/>").unwrap();
        loader.save_weights_chunk(&[0; 8]).unwrap();

        assert!(!loader.is_model_loaded(Duration::from_millis(20)));
        loader.signal_loaded().unwrap();
        assert!(loader.is_model_loaded(Duration::ZERO));
    }

    #[test]
    fn test_unbounded_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader(dir.path());
        loader.prepare_dir().unwrap();
        loader.save_descriptor_chunk(b"<net/>").unwrap();
        loader.save_weights_chunk(&[0; 8]).unwrap();
        loader.signal_loaded().unwrap();

        assert!(loader.is_model_loaded(Duration::MAX));
    }

    #[test]
    fn test_signal_requires_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader(dir.path());
        loader.prepare_dir().unwrap();
        loader.save_descriptor_chunk(b"<net/>").unwrap();
        assert!(matches!(loader.signal_loaded(), Err(AdaptorError::Staging(_))));
    }

    #[test]
    fn test_no_chunks_after_signal() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader(dir.path());
        loader.prepare_dir().unwrap();
        loader.save_descriptor_chunk(b"<net/>").unwrap();
        loader.save_weights_chunk(&[0; 4]).unwrap();
        loader.signal_loaded().unwrap();
        assert!(loader.save_weights_chunk(&[1]).is_err());
    }

    #[test]
    fn test_loaded_wakes_up_when_signalled_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader(dir.path());
        loader.prepare_dir().unwrap();

        let writer = loader.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            writer.save_descriptor_chunk(b"<net/>").unwrap();
            writer.save_weights_chunk(&[0; 4]).unwrap();
            writer.signal_loaded().unwrap();
        });

        assert!(loader.is_model_loaded(Duration::from_secs(5)));
        handle.join().unwrap();
    }

    #[test]
    fn test_clean_up() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader(dir.path());
        loader.clean_up().unwrap();

        loader.prepare_dir().unwrap();
        loader.save_descriptor_chunk(b"<net/>").unwrap();
        loader.clean_up().unwrap();
        assert!(!loader.model_dir().exists());
        assert!(!loader.is_model_loaded(Duration::ZERO));
    }

    #[test]
    fn test_stage_from_files() {
        let src = tempfile::tempdir().unwrap();
        let xml = src.path().join("net.xml");
        let bin = src.path().join("net.bin");
        fs::write(&xml, b"<net>0123456789</net>").unwrap();
        fs::write(&bin, (0u8..=255).collect::<Vec<_>>()).unwrap();

        let dst = tempfile::tempdir().unwrap();
        let loader = loader(dst.path());
        loader.stage_from_files(&xml, &bin, 7).unwrap();

        assert!(loader.is_model_loaded(Duration::ZERO));
        assert_eq!(fs::read(loader.descriptor_path()).unwrap(), fs::read(&xml).unwrap());
        assert_eq!(fs::read(loader.weights_path()).unwrap(), fs::read(&bin).unwrap());
    }

    #[test]
    fn test_stage_from_missing_file() {
        let dst = tempfile::tempdir().unwrap();
        let loader = loader(dst.path());
        let err = loader
            .stage_from_files(dst.path().join("nope.xml"), dst.path().join("nope.bin"), 16)
            .unwrap_err();
        assert!(matches!(err, AdaptorError::FileNotFound(_)));
    }
}
