//! Scoped scratch files for conversions that need a path on disk.

use crate::error::ImagexError;
use std::io::Write;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};
use tracing::debug;

/// File holding one entry's bytes for the duration of a single conversion.
///
/// The file is removed when the value is dropped, whichever way the
/// conversion ends.
#[derive(Debug)]
pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    /// Create `tmp_file*.{extension}` inside `dir` and write `data` to it.
    pub fn create(dir: &Path, extension: &str, data: &[u8]) -> Result<Self, ImagexError> {
        let suffix = format!(".{}", extension);
        let mut file = Builder::new()
            .prefix("tmp_file")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        file.write_all(data)?;
        file.flush()?;
        debug!(path = %file.path().display(), bytes = data.len(), "created scratch file");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
