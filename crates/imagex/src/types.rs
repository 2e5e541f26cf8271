//! Type definitions for extraction and conversion.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Directory inside a .docx container where embedded images are stored.
pub const DEFAULT_MEDIA_PREFIX: &str = "word/media/";

/// Extension of every file written by the converter.
pub const OUTPUT_EXTENSION: &str = "jpeg";

/// Options controlling a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Substring identifying media entries inside the container
    pub media_prefix: String,

    /// How entry extensions are matched by the classifier
    pub extension_match: ExtensionMatch,

    /// What to do when an archive or an entry fails
    pub error_policy: ErrorPolicy,

    /// JPEG quality (1-100) for images encoded in-process
    pub jpeg_quality: u8,

    /// Rendering parameters for the raster converter
    pub render: RenderSettings,

    /// External programs used for vector conversion
    pub tools: ToolPrograms,

    /// Regenerate the output identifier while the target path exists
    pub unique_names: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            media_prefix: DEFAULT_MEDIA_PREFIX.to_string(),
            extension_match: ExtensionMatch::Suffix,
            error_policy: ErrorPolicy::FailFast,
            jpeg_quality: 92,
            render: RenderSettings::default(),
            tools: ToolPrograms::default(),
            unique_names: false,
        }
    }
}

/// Fixed rendering parameters handed to the raster converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    /// Rasterization density in DPI
    pub density: u32,

    /// Colour of the border added after trimming
    pub border_color: String,

    /// Border width in pixels
    pub border_width: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            density: 150,
            border_color: "white".to_string(),
            border_width: 5,
        }
    }
}

/// Program names of the external converters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPrograms {
    /// Converts EMF/WMF files to PDF on stdout
    pub document_converter: String,

    /// Converts PDF (or a file path) to JPEG on stdout
    pub raster_converter: String,
}

impl Default for ToolPrograms {
    fn default() -> Self {
        Self {
            document_converter: "unoconv".to_string(),
            raster_converter: "convert".to_string(),
        }
    }
}

/// How a failing archive or entry affects the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Abort the whole run on the first failure
    FailFast,

    /// Record the failure and move on
    Continue,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "failfast" | "fail-fast" => Ok(ErrorPolicy::FailFast),
            "continue" => Ok(ErrorPolicy::Continue),
            other => Err(format!("Unknown error policy: {}", other)),
        }
    }
}

/// How the classifier compares an entry path against extension tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionMatch {
    /// Compare against the real file extension
    Suffix,

    /// Look for the tag anywhere in the path (legacy behaviour)
    Substring,
}

impl FromStr for ExtensionMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "suffix" => Ok(ExtensionMatch::Suffix),
            "substring" => Ok(ExtensionMatch::Substring),
            other => Err(format!("Unknown extension match mode: {}", other)),
        }
    }
}

/// A failure recorded under [`ErrorPolicy::Continue`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Input archive path
    pub archive: String,

    /// Entry path, `None` for archive-level failures
    pub entry: Option<String>,

    /// Rendered error message
    pub error: String,
}

/// Statistics about a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    /// Archives opened successfully
    pub archives_processed: u64,

    /// Media entries visited
    pub entries_seen: u64,

    /// Output files written
    pub files_written: u64,

    /// Total bytes written to disk
    pub bytes_written: u64,

    /// Entries skipped as unrecognized
    pub skipped: u64,

    /// Failures recorded when continuing past errors
    pub failures: Vec<FailureRecord>,

    /// Duration of the run (in seconds)
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            archives_processed: 0,
            entries_seen: 0,
            files_written: 0,
            bytes_written: 0,
            skipped: 0,
            failures: Vec::new(),
            duration: Duration::from_secs(0),
        }
    }
}

impl RunStats {
    /// Render the statistics as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// Helper module for Duration serialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}
