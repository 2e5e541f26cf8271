//! Output file naming.

use crate::error::ImagexError;
use crate::types::OUTPUT_EXTENSION;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Maximum identifiers tried when `unique_names` is enabled.
const MAX_NAME_ATTEMPTS: usize = 8;

/// Source of per-file identifiers.
pub trait IdGenerator {
    fn next_id(&mut self) -> Uuid;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&mut self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Deterministic identifiers counting up from a seed.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    next: u128,
}

impl SequentialIds {
    pub fn starting_at(seed: u128) -> Self {
        Self { next: seed }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> Uuid {
        let id = Uuid::from_u128(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Builds `{dir}/{archive}-image-{uuid}.jpeg` paths.
pub struct OutputNamer {
    dir: PathBuf,
    ids: Box<dyn IdGenerator>,
    check_existing: bool,
}

impl OutputNamer {
    pub fn new(dir: &Path, ids: Box<dyn IdGenerator>, check_existing: bool) -> Self {
        Self {
            dir: dir.to_path_buf(),
            ids,
            check_existing,
        }
    }

    /// Path for the next image extracted from `display_name`.
    ///
    /// Without `check_existing` the path is returned unchecked; a collision
    /// needs two equal 122-bit random values.
    pub fn next_path(&mut self, display_name: &str) -> Result<PathBuf, ImagexError> {
        if !self.check_existing {
            return Ok(self.candidate(display_name));
        }

        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = self.candidate(display_name);
            if !path.exists() {
                return Ok(path);
            }
        }

        Err(ImagexError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Could not find unique filename",
        )))
    }

    fn candidate(&mut self, display_name: &str) -> PathBuf {
        self.dir
            .join(output_file_name(display_name, &self.ids.next_id()))
    }
}

/// `{display_name}-image-{id}.jpeg`
pub fn output_file_name(display_name: &str, id: &Uuid) -> String {
    format!("{}-image-{}.{}", display_name, id, OUTPUT_EXTENSION)
}
