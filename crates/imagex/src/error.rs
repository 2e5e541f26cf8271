//! Error types for image extraction and conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for extraction and conversion operations.
#[derive(Debug, Error)]
pub enum ImagexError {
    /// Input archive not found at the specified path.
    #[error("Archive not found: {0}")]
    NotFound(PathBuf),

    /// The output path exists but is not a directory.
    #[error("Output path exists and is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The archive is not a valid zip container.
    #[error("{} is an invalid or corrupt .docx file: {reason}", path.display())]
    CorruptArchive {
        /// Path of the offending input
        path: PathBuf,
        /// Reason reported by the archive reader
        reason: String,
    },

    /// Entry bytes could not be decoded as the assumed image format.
    #[error("Failed to decode {entry}: {source}")]
    Decode {
        /// Internal path of the entry
        entry: String,
        #[source]
        source: image::ImageError,
    },

    /// Decoded image could not be encoded as JPEG.
    #[error("Failed to encode {entry} as JPEG: {source}")]
    Encode {
        /// Internal path of the entry
        entry: String,
        #[source]
        source: image::ImageError,
    },

    /// An external conversion tool exited unsuccessfully.
    #[error("Command `{command}` failed ({}): {stderr}", exit_label(*code))]
    ExternalTool {
        /// Full command line that was run
        command: String,
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// An external conversion tool could not be started.
    #[error("Could not run `{command}`: {source}")]
    ToolLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Processing a media entry failed.
    #[error("{entry} from {}: {source}", archive.display())]
    Entry {
        /// Input archive path as given
        archive: PathBuf,
        /// Internal path of the entry
        entry: String,
        #[source]
        source: Box<ImagexError>,
    },

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl ImagexError {
    /// Attach the archive and entry that `self` was raised for.
    pub fn in_entry(self, archive: &std::path::Path, entry: &str) -> Self {
        ImagexError::Entry {
            archive: archive.to_path_buf(),
            entry: entry.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, past any entry context.
    pub fn root(&self) -> &ImagexError {
        match self {
            ImagexError::Entry { source, .. } => source.root(),
            other => other,
        }
    }

    /// Wrap a zip error raised while reading `path`.
    pub(crate) fn corrupt(path: impl Into<PathBuf>, err: zip::result::ZipError) -> Self {
        ImagexError::CorruptArchive {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}
