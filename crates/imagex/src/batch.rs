//! Batch driver: walks input archives and converts their media entries.

use crate::archive::DocxArchive;
use crate::classify::classify;
use crate::convert::{Conversion, Converter};
use crate::error::ImagexError;
use crate::naming::{IdGenerator, OutputNamer, RandomIds};
use crate::process::{SystemRunner, ToolRunner};
use crate::types::{ConvertOptions, ErrorPolicy, FailureRecord, RunStats};
use crate::ProgressCallback;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// What happened to a single media entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// JPEG copied unchanged to `path`
    Copied { path: PathBuf },

    /// Raster image re-encoded to `path`
    Reencoded { path: PathBuf },

    /// Converted through a scratch file to `path`
    Converted { path: PathBuf },

    /// Not a recognized image type
    Skipped,

    /// Conversion failed and the run continued
    Failed { error: String },
}

/// Progress report for one media entry.
#[derive(Debug, Clone)]
pub struct EntryEvent<'a> {
    /// Input archive path as given
    pub archive: &'a Path,

    /// Internal path of the entry
    pub entry: &'a str,

    pub outcome: EntryOutcome,
}

impl std::fmt::Display for EntryEvent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let archive = self.archive.display();
        match &self.outcome {
            EntryOutcome::Copied { path } => write!(
                f,
                "copying {} from {} to {}",
                self.entry,
                archive,
                path.display()
            ),
            EntryOutcome::Reencoded { path } | EntryOutcome::Converted { path } => write!(
                f,
                "converting {} from {} to {}",
                self.entry,
                archive,
                path.display()
            ),
            EntryOutcome::Skipped => write!(
                f,
                "{} from {} is not a recognized image type",
                self.entry, archive
            ),
            EntryOutcome::Failed { error } => {
                write!(f, "failed {} from {}: {}", self.entry, archive, error)
            }
        }
    }
}

/// Make sure `dir` is usable as the output directory.
///
/// Creates it (one level only) when absent.
///
/// # Errors
///
/// Returns `NotADirectory` if something other than a directory is there.
pub fn prepare_output_dir(dir: &Path) -> Result<(), ImagexError> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(ImagexError::NotADirectory(dir.to_path_buf()));
        }
        return Ok(());
    }
    fs::create_dir(dir)?;
    info!(dir = %dir.display(), "created output directory");
    Ok(())
}

/// Drives extraction over a list of input archives.
pub struct BatchDriver {
    options: ConvertOptions,
    runner: Box<dyn ToolRunner>,
    ids: Option<Box<dyn IdGenerator>>,
}

impl BatchDriver {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            runner: Box::new(SystemRunner),
            ids: None,
        }
    }

    /// Use a different runner for the external tools.
    pub fn with_runner(mut self, runner: Box<dyn ToolRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Use a different source of output identifiers.
    pub fn with_ids(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Convert every media entry of every input into `output_dir`.
    ///
    /// Inputs are processed in order, entries in archive order. Under
    /// [`ErrorPolicy::FailFast`] the first archive or entry failure aborts
    /// the run; under [`ErrorPolicy::Continue`] it is recorded in the
    /// returned stats and reported as [`EntryOutcome::Failed`].
    pub fn run(
        self,
        inputs: &[PathBuf],
        output_dir: &Path,
        progress_cb: &ProgressCallback<'_>,
    ) -> Result<RunStats, ImagexError> {
        let start_time = Instant::now();
        prepare_output_dir(output_dir)?;

        let BatchDriver {
            options,
            runner,
            ids,
        } = self;
        let converter = Converter::new(&options, runner.as_ref());
        let ids = ids.unwrap_or_else(|| Box::new(RandomIds));
        let mut namer = OutputNamer::new(output_dir, ids, options.unique_names);
        let mut stats = RunStats::default();

        for input in inputs {
            let mut archive = match DocxArchive::open(input, &options.media_prefix) {
                Ok(archive) => archive,
                Err(e) => {
                    record_failure(&options, &mut stats, input, None, e)?;
                    continue;
                }
            };
            info!(archive = %input.display(), "processing archive");
            stats.archives_processed += 1;

            let display_name = archive.display_name().to_string();
            for item in archive.media_entries() {
                let entry = match item {
                    Ok(entry) => entry,
                    Err(e) => {
                        // A broken entry stream leaves the rest of the archive unreadable
                        record_failure(&options, &mut stats, input, None, e)?;
                        break;
                    }
                };
                stats.entries_seen += 1;

                let strategy = classify(&entry.name, options.extension_match);
                let outcome = match converter
                    .convert(&entry, strategy, output_dir)
                    .and_then(|conversion| {
                        store(&mut namer, &display_name, conversion, &mut stats)
                    }) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        let error = e.to_string();
                        let e = e.in_entry(input, &entry.name);
                        record_failure(&options, &mut stats, input, Some(&entry.name), e)?;
                        EntryOutcome::Failed { error }
                    }
                };

                progress_cb(&EntryEvent {
                    archive: input,
                    entry: &entry.name,
                    outcome,
                });
            }
        }

        stats.duration = start_time.elapsed();
        Ok(stats)
    }
}

/// Write a finished conversion under a fresh output name.
fn store(
    namer: &mut OutputNamer,
    display_name: &str,
    conversion: Conversion,
    stats: &mut RunStats,
) -> Result<EntryOutcome, ImagexError> {
    let bytes = match conversion.bytes() {
        Some(bytes) => bytes,
        None => {
            stats.skipped += 1;
            return Ok(EntryOutcome::Skipped);
        }
    };

    let path = namer.next_path(display_name)?;
    fs::write(&path, bytes)?;
    stats.files_written += 1;
    stats.bytes_written += bytes.len() as u64;

    Ok(match conversion {
        Conversion::Copied(_) => EntryOutcome::Copied { path },
        Conversion::Reencoded(_) => EntryOutcome::Reencoded { path },
        _ => EntryOutcome::Converted { path },
    })
}

/// Propagate `error` under fail-fast, otherwise log and record it.
fn record_failure(
    options: &ConvertOptions,
    stats: &mut RunStats,
    archive: &Path,
    entry: Option<&str>,
    error: ImagexError,
) -> Result<(), ImagexError> {
    if options.error_policy == ErrorPolicy::FailFast {
        return Err(error);
    }
    warn!(archive = %archive.display(), entry, %error, "continuing after failure");
    stats.failures.push(FailureRecord {
        archive: archive.display().to_string(),
        entry: entry.map(str::to_string),
        error: error.to_string(),
    });
    Ok(())
}
