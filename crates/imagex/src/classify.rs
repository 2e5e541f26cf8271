//! Mapping from media entry extensions to conversion strategies.

use crate::types::ExtensionMatch;
use std::fmt;
use std::path::Path;

/// How a media entry is turned into JPEG bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Already JPEG, copied byte for byte
    Direct,

    /// PNG decoded and re-encoded in memory
    RasterReencode,

    /// EMF/WMF rendered through the document and raster converters
    VectorConvert,

    /// WDP decoded from a file on disk
    FileBackedDecode,

    /// Not an image type we handle
    Unrecognized,
}

impl Strategy {
    /// Whether this strategy needs a scratch file on disk.
    pub fn needs_scratch_file(self) -> bool {
        matches!(self, Strategy::VectorConvert | Strategy::FileBackedDecode)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strategy::Direct => "direct copy",
            Strategy::RasterReencode => "raster re-encode",
            Strategy::VectorConvert => "vector conversion",
            Strategy::FileBackedDecode => "file-backed decode",
            Strategy::Unrecognized => "unrecognized",
        };
        f.write_str(label)
    }
}

/// Extension tags in the order they are tried by substring matching.
const TAGS: &[(&str, Strategy)] = &[
    ("jpeg", Strategy::Direct),
    ("jpg", Strategy::Direct),
    ("png", Strategy::RasterReencode),
    ("emf", Strategy::VectorConvert),
    ("wmf", Strategy::VectorConvert),
    ("wdp", Strategy::FileBackedDecode),
];

/// Pick the conversion strategy for an entry path.
///
/// Matching is case-insensitive. With [`ExtensionMatch::Substring`] a tag such
/// as `.jpeg` matches anywhere in the path, so `image.jpegx` is treated as a
/// JPEG.
///
/// ```
/// use imagex::classify::{classify, Strategy};
/// use imagex::ExtensionMatch;
///
/// assert_eq!(classify("word/media/image1.PNG", ExtensionMatch::Suffix), Strategy::RasterReencode);
/// assert_eq!(classify("word/media/image1.jpegx", ExtensionMatch::Suffix), Strategy::Unrecognized);
/// assert_eq!(classify("word/media/image1.jpegx", ExtensionMatch::Substring), Strategy::Direct);
/// ```
pub fn classify(entry_path: &str, mode: ExtensionMatch) -> Strategy {
    match mode {
        ExtensionMatch::Suffix => match extension(entry_path) {
            Some(ext) => TAGS
                .iter()
                .find(|(tag, _)| *tag == ext)
                .map(|(_, strategy)| *strategy)
                .unwrap_or(Strategy::Unrecognized),
            None => Strategy::Unrecognized,
        },
        ExtensionMatch::Substring => {
            let lowered = entry_path.to_lowercase();
            TAGS.iter()
                .find(|(tag, _)| lowered.contains(&format!(".{}", tag)))
                .map(|(_, strategy)| *strategy)
                .unwrap_or(Strategy::Unrecognized)
        }
    }
}

/// Lowercased extension of an entry path, without the dot.
pub fn extension(entry_path: &str) -> Option<String> {
    Path::new(entry_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}
