//! Conversion of media entries to JPEG.
//!
//! Each [`Strategy`] maps to one pipeline:
//!
//! - `Direct`: the entry bytes are returned unchanged
//! - `RasterReencode`: PNG decoded and re-encoded in memory
//! - `VectorConvert`: EMF/WMF written to a scratch file, converted to PDF by
//!   the document converter, then rasterized by the raster converter
//! - `FileBackedDecode`: WDP written to a scratch file and decoded from disk
//! - `Unrecognized`: nothing is produced

use crate::archive::MediaEntry;
use crate::classify::{extension, Strategy};
use crate::error::ImagexError;
use crate::process::{ToolCommand, ToolRunner};
use crate::scratch::ScratchFile;
use crate::types::ConvertOptions;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader};
use std::path::Path;
use tracing::debug;

/// Result of converting one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// JPEG bytes copied as-is
    Copied(Vec<u8>),

    /// Raster image re-encoded in-process
    Reencoded(Vec<u8>),

    /// Produced through a scratch file and/or external tools
    Converted(Vec<u8>),

    /// Entry was not a recognized image type
    Skipped,
}

impl Conversion {
    /// JPEG bytes to write, `None` for skipped entries.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Conversion::Copied(b) | Conversion::Reencoded(b) | Conversion::Converted(b) => Some(b),
            Conversion::Skipped => None,
        }
    }
}

/// Executes conversion strategies.
pub struct Converter<'a> {
    options: &'a ConvertOptions,
    runner: &'a dyn ToolRunner,
}

impl<'a> Converter<'a> {
    pub fn new(options: &'a ConvertOptions, runner: &'a dyn ToolRunner) -> Self {
        Self { options, runner }
    }

    /// Convert `entry` using `strategy`.
    ///
    /// Scratch files are created in `workdir` and removed before this returns.
    pub fn convert(
        &self,
        entry: &MediaEntry,
        strategy: Strategy,
        workdir: &Path,
    ) -> Result<Conversion, ImagexError> {
        debug!(entry = %entry.name, %strategy, bytes = entry.data.len(), "converting entry");

        match strategy {
            Strategy::Direct => Ok(Conversion::Copied(entry.data.clone())),
            Strategy::RasterReencode => {
                let image = image::load_from_memory_with_format(&entry.data, ImageFormat::Png)
                    .map_err(|source| ImagexError::Decode {
                        entry: entry.name.clone(),
                        source,
                    })?;
                Ok(Conversion::Reencoded(self.encode_jpeg(&entry.name, &image)?))
            }
            Strategy::VectorConvert => {
                self.convert_vector(entry, workdir).map(Conversion::Converted)
            }
            Strategy::FileBackedDecode => {
                self.decode_from_file(entry, workdir).map(Conversion::Converted)
            }
            Strategy::Unrecognized => {
                debug!(entry = %entry.name, "not a recognized image type");
                Ok(Conversion::Skipped)
            }
        }
    }

    /// EMF/WMF: scratch file -> document converter (PDF) -> raster converter (JPEG).
    fn convert_vector(&self, entry: &MediaEntry, workdir: &Path) -> Result<Vec<u8>, ImagexError> {
        let ext = scratch_extension(&entry.name, "emf");
        let scratch = ScratchFile::create(workdir, &ext, &entry.data)?;

        let to_pdf = self.document_command(scratch.path());
        let pdf = self.runner.run(&to_pdf, None)?.into_stdout(&to_pdf)?;

        let to_jpeg = self.raster_command();
        let jpeg = self.runner.run(&to_jpeg, Some(&pdf))?.into_stdout(&to_jpeg)?;

        Ok(jpeg)
    }

    /// WDP: decode from a file on disk, falling back to the raster converter
    /// when the in-process codec has no decoder for the content.
    fn decode_from_file(&self, entry: &MediaEntry, workdir: &Path) -> Result<Vec<u8>, ImagexError> {
        let ext = scratch_extension(&entry.name, "wdp");
        let scratch = ScratchFile::create(workdir, &ext, &entry.data)?;

        match decode_path(scratch.path()) {
            Ok(image) => self.encode_jpeg(&entry.name, &image),
            Err(ImageError::Unsupported(reason)) => {
                debug!(entry = %entry.name, %reason, "no in-process decoder, using tool");
                let to_jpeg = ToolCommand::new(&self.options.tools.raster_converter)
                    .arg(scratch.path())
                    .arg("jpeg:-");
                self.runner.run(&to_jpeg, None)?.into_stdout(&to_jpeg)
            }
            Err(source) => Err(ImagexError::Decode {
                entry: entry.name.clone(),
                source,
            }),
        }
    }

    fn document_command(&self, input: &Path) -> ToolCommand {
        ToolCommand::new(&self.options.tools.document_converter)
            .args(["--format=pdf", "--stdout"])
            .arg(input)
    }

    fn raster_command(&self) -> ToolCommand {
        let render = &self.options.render;
        ToolCommand::new(&self.options.tools.raster_converter)
            .arg("-density")
            .arg(render.density.to_string())
            .arg("-trim")
            .arg("-bordercolor")
            .arg(&render.border_color)
            .arg("-border")
            .arg(render.border_width.to_string())
            .arg("-")
            .arg("jpeg:-")
    }

    fn encode_jpeg(&self, entry: &str, image: &DynamicImage) -> Result<Vec<u8>, ImagexError> {
        // JPEG has no alpha channel
        let rgb = image.to_rgb8();
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, self.options.jpeg_quality)
            .encode_image(&rgb)
            .map_err(|source| ImagexError::Encode {
                entry: entry.to_string(),
                source,
            })?;
        Ok(buf)
    }
}

fn decode_path(path: &Path) -> Result<DynamicImage, ImageError> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}

fn scratch_extension(entry_name: &str, fallback: &str) -> String {
    extension(entry_name).unwrap_or_else(|| fallback.to_string())
}
