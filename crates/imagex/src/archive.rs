//! Read-only access to the media entries of a .docx container.

use crate::error::ImagexError;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// A single media entry read out of the container.
#[derive(Debug, Clone)]
pub struct MediaEntry {
    /// Path of the entry within the archive
    pub name: String,

    /// Uncompressed size declared by the archive
    pub size: u64,

    /// Raw entry bytes
    pub data: Vec<u8>,
}

/// An opened .docx container.
pub struct DocxArchive {
    path: PathBuf,
    display_name: String,
    media_prefix: String,
    zip: ZipArchive<BufReader<File>>,
}

impl DocxArchive {
    /// Open and validate the container at `path`.
    ///
    /// Only entries whose internal path contains `media_prefix` are exposed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file does not exist and `CorruptArchive` if
    /// the zip central directory cannot be parsed.
    pub fn open(path: &Path, media_prefix: &str) -> Result<Self, ImagexError> {
        if !path.exists() {
            return Err(ImagexError::NotFound(path.to_path_buf()));
        }

        let file = File::open(path)?;
        let zip =
            ZipArchive::new(BufReader::new(file)).map_err(|e| ImagexError::corrupt(path, e))?;
        debug!(archive = %path.display(), entries = zip.len(), "opened container");

        Ok(Self {
            path: path.to_path_buf(),
            display_name: display_name(path),
            media_prefix: media_prefix.to_string(),
            zip,
        })
    }

    /// Path the archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name used as the prefix of output files.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// List media entry names in archive order.
    pub fn list_media(&mut self) -> Result<Vec<String>, ImagexError> {
        let mut names = Vec::new();
        for i in 0..self.zip.len() {
            let entry = self
                .zip
                .by_index(i)
                .map_err(|e| ImagexError::corrupt(&self.path, e))?;
            if is_media(entry.name(), entry.is_dir(), &self.media_prefix) {
                names.push(entry.name().to_string());
            }
        }
        Ok(names)
    }

    /// Iterate media entries in archive order, reading each one exactly once.
    pub fn media_entries(&mut self) -> MediaEntries<'_> {
        MediaEntries {
            archive: self,
            next_index: 0,
        }
    }

    /// Read a single entry by its internal path.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, ImagexError> {
        let mut entry = match self.zip.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                return Err(ImagexError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} has no entry {}", self.path.display(), name),
                )))
            }
            Err(e) => return Err(ImagexError::corrupt(&self.path, e)),
        };
        let mut data = Vec::with_capacity(prealloc(entry.size()));
        entry.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// Lazy iterator over the media entries of a [`DocxArchive`].
///
/// Not restartable: once an entry has been yielded its bytes are gone from
/// the iterator.
pub struct MediaEntries<'a> {
    archive: &'a mut DocxArchive,
    next_index: usize,
}

impl Iterator for MediaEntries<'_> {
    type Item = Result<MediaEntry, ImagexError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < self.archive.zip.len() {
            let index = self.next_index;
            self.next_index += 1;

            let path = &self.archive.path;
            let mut entry = match self.archive.zip.by_index(index) {
                Ok(entry) => entry,
                Err(e) => return Some(Err(ImagexError::corrupt(path, e))),
            };

            if !is_media(entry.name(), entry.is_dir(), &self.archive.media_prefix) {
                continue;
            }

            let name = entry.name().to_string();
            let size = entry.size();
            let mut data = Vec::with_capacity(prealloc(size));
            if let Err(e) = entry.read_to_end(&mut data) {
                return Some(Err(ImagexError::CorruptArchive {
                    path: path.clone(),
                    reason: format!("failed to read {}: {}", name, e),
                }));
            }

            return Some(Ok(MediaEntry { name, size, data }));
        }
        None
    }
}

/// Declared sizes come from the archive and are not trusted for allocation.
fn prealloc(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

fn is_media(name: &str, is_dir: bool, prefix: &str) -> bool {
    !is_dir && name.contains(prefix)
}

/// Final path component of the input, falling back to the full path.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
