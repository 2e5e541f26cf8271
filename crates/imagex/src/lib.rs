//! # Imagex
//!
//! Extracts the images embedded in `.docx` containers and normalizes every
//! one of them to JPEG.
//!
//! Each media entry (anything under `word/media/`) is classified by its
//! extension and converted with the matching strategy:
//!
//! - JPEG is copied byte for byte
//! - PNG is decoded and re-encoded in-process
//! - EMF/WMF are rendered by an external document converter (`unoconv`) and
//!   rasterized by an external raster converter (ImageMagick `convert`)
//! - WDP is decoded from a scratch file on disk
//! - anything else is skipped
//!
//! Output files are named `{archive}-image-{uuid}.jpeg`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use imagex::{run, ConvertOptions};
//! use std::path::{Path, PathBuf};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let inputs = vec![PathBuf::from("report.docx")];
//! let options = ConvertOptions::default();
//! let progress_cb = |event: &imagex::EntryEvent<'_>| println!("{}", event);
//!
//! let stats = run(&inputs, Path::new("images"), &options, &progress_cb)?;
//!
//! println!("Wrote {} files ({} bytes)", stats.files_written, stats.bytes_written);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod batch;
pub mod classify;
pub mod convert;
pub mod error;
pub mod naming;
pub mod process;
pub mod scratch;
pub mod types;

// Re-export main types
pub use archive::{DocxArchive, MediaEntry};
pub use batch::{prepare_output_dir, BatchDriver, EntryEvent, EntryOutcome};
pub use classify::Strategy;
pub use convert::{Conversion, Converter};
pub use error::ImagexError;
pub use naming::{IdGenerator, OutputNamer, RandomIds, SequentialIds};
pub use process::{SystemRunner, ToolCommand, ToolOutput, ToolRunner};
pub use types::{
    ConvertOptions, ErrorPolicy, ExtensionMatch, FailureRecord, RenderSettings, RunStats,
    ToolPrograms,
};

use std::path::{Path, PathBuf};

/// Type alias for progress callback functions.
///
/// Called once per media entry after it has been copied, converted, skipped
/// or (when continuing past errors) failed.
pub type ProgressCallback<'a> = dyn Fn(&EntryEvent<'_>) + 'a;

/// Extract and convert the images of every input into `output_dir`.
///
/// Uses the system's external tools and random output identifiers; build a
/// [`BatchDriver`] directly to swap either.
///
/// # Errors
///
/// Returns an error if:
/// - `output_dir` exists and is not a directory
/// - an input is missing or not a valid zip container
/// - an image cannot be decoded or an external tool fails
/// - I/O errors occur
///
/// Input and conversion failures only abort the run under
/// [`ErrorPolicy::FailFast`].
pub fn run(
    inputs: &[PathBuf],
    output_dir: &Path,
    options: &ConvertOptions,
    progress_cb: &ProgressCallback<'_>,
) -> Result<RunStats, ImagexError> {
    BatchDriver::new(options.clone()).run(inputs, output_dir, progress_cb)
}
