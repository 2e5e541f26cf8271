//! Command-line interface for extracting images from .docx files.
//!
//! Every image under `word/media/` is written to the output directory as
//! `{file}-image-{uuid}.jpeg`.

use clap::Parser;
use imagex::{
    BatchDriver, ConvertOptions, EntryEvent, ErrorPolicy, ExtensionMatch, RenderSettings,
    ToolPrograms,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "docx-imagex")]
#[command(
    version,
    about = "Extract images from MS Word .docx file(s) and save in JPEG format",
    long_about = None
)]
struct Cli {
    /// Input .docx file(s)
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Output directory for image files (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    outdir: Option<PathBuf>,

    /// Record failing archives and images and keep going
    #[arg(long)]
    keep_going: bool,

    /// Extension matching: suffix, substring
    #[arg(long, default_value = "suffix")]
    ext_match: String,

    /// Media directory inside the container
    #[arg(long, default_value = imagex::types::DEFAULT_MEDIA_PREFIX)]
    media_prefix: String,

    /// JPEG quality for re-encoded images (1-100)
    #[arg(long, default_value = "92", value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Rasterization density for vector images
    #[arg(long, default_value = "150")]
    density: u32,

    /// Border colour added around rasterized vector images
    #[arg(long, default_value = "white")]
    border_color: String,

    /// Border width in pixels
    #[arg(long, default_value = "5")]
    border: u32,

    /// Program converting EMF/WMF to PDF
    #[arg(long, default_value = "unoconv")]
    doc_converter: String,

    /// Program converting PDF/WDP to JPEG
    #[arg(long, default_value = "convert")]
    raster_converter: String,

    /// Never reuse an existing output file name
    #[arg(long)]
    unique_names: bool,

    /// Print run statistics as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = handle_run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn handle_run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Inputs must be readable before the output directory is touched
    for file in &cli.files {
        File::open(file).map_err(|e| format!("can't open '{}': {}", file.display(), e))?;
    }

    let outdir = match &cli.outdir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let options = build_options(&cli)?;

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    bar.enable_steady_tick(Duration::from_millis(120));

    let progress_cb = |event: &EntryEvent<'_>| {
        bar.set_message(event.archive.display().to_string());
        bar.suspend(|| println!("{}", event));
    };

    let result = BatchDriver::new(options).run(&cli.files, &outdir, &progress_cb);
    bar.finish_and_clear();
    let stats = result?;

    if cli.json {
        println!("{}", stats.to_json_pretty()?);
    }

    if !stats.failures.is_empty() {
        for failure in &stats.failures {
            eprintln!("{}", failure.error);
        }
        return Err(format!("{} failure(s) recorded", stats.failures.len()).into());
    }

    Ok(())
}

fn build_options(cli: &Cli) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let extension_match: ExtensionMatch = cli.ext_match.parse()?;
    let error_policy = if cli.keep_going {
        ErrorPolicy::Continue
    } else {
        ErrorPolicy::FailFast
    };

    Ok(ConvertOptions {
        media_prefix: cli.media_prefix.clone(),
        extension_match,
        error_policy,
        jpeg_quality: cli.quality,
        render: RenderSettings {
            density: cli.density,
            border_color: cli.border_color.clone(),
            border_width: cli.border,
        },
        tools: ToolPrograms {
            document_converter: cli.doc_converter.clone(),
            raster_converter: cli.raster_converter.clone(),
        },
        unique_names: cli.unique_names,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_match_library() {
        let cli = Cli::try_parse_from(["docx-imagex", "report.docx"]).unwrap();
        assert!(cli.outdir.is_none());
        let options = build_options(&cli).unwrap();
        let defaults = ConvertOptions::default();
        assert_eq!(options.media_prefix, defaults.media_prefix);
        assert_eq!(options.extension_match, defaults.extension_match);
        assert_eq!(options.error_policy, defaults.error_policy);
        assert_eq!(options.jpeg_quality, defaults.jpeg_quality);
        assert_eq!(options.render, defaults.render);
        assert_eq!(options.tools, defaults.tools);
    }

    #[test]
    fn test_outdir_and_flags() {
        let cli = Cli::try_parse_from([
            "docx-imagex",
            "-o",
            "images",
            "--keep-going",
            "--ext-match",
            "substring",
            "a.docx",
            "b.docx",
        ])
        .unwrap();
        assert_eq!(cli.outdir, Some(PathBuf::from("images")));
        assert_eq!(cli.files.len(), 2);
        let options = build_options(&cli).unwrap();
        assert_eq!(options.error_policy, ErrorPolicy::Continue);
        assert_eq!(options.extension_match, ExtensionMatch::Substring);
    }

    #[test]
    fn test_requires_input() {
        assert!(Cli::try_parse_from(["docx-imagex"]).is_err());
        assert!(Cli::try_parse_from(["docx-imagex", "--quality", "0", "a.docx"]).is_err());
    }

    #[test]
    fn test_bad_ext_match() {
        let cli = Cli::try_parse_from(["docx-imagex", "--ext-match", "prefix", "a.docx"]).unwrap();
        assert!(build_options(&cli).is_err());
    }

    #[test]
    fn test_unreadable_input_fails_before_outdir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("images");
        let missing = temp_dir.path().join("missing.docx");
        let cli = Cli::try_parse_from([
            "docx-imagex".into(),
            "-o".into(),
            dir.clone().into_os_string(),
            missing.into_os_string(),
        ])
        .unwrap();
        assert!(handle_run(cli).is_err());
        assert!(!dir.exists());
    }

    fn create_docx(path: &Path, files: &[(&str, &[u8])]) {
        use zip::write::{SimpleFileOptions, ZipWriter};

        let mut zip = ZipWriter::new(File::create(path).unwrap());
        zip.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"<w:document/>").unwrap();
        for (name, content) in files {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_run_writes_images() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("report.docx");
        let outdir = temp_dir.path().join("images");
        create_docx(
            &input,
            &[
                ("word/media/image1.jpeg", b"jpeg bytes"),
                ("word/media/image2.gif", b"GIF89a"),
            ],
        );

        let cli = Cli::try_parse_from([
            "docx-imagex".into(),
            "-o".into(),
            outdir.clone().into_os_string(),
            input.into_os_string(),
        ])
        .unwrap();
        handle_run(cli).unwrap();

        let written: Vec<_> = std::fs::read_dir(&outdir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(written.len(), 1);
        let name = written[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("report.docx-image-"));
        assert!(name.ends_with(".jpeg"));
        assert_eq!(std::fs::read(&written[0]).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn test_keep_going_reports_failure() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("bad.docx");
        let outdir = temp_dir.path().join("images");
        create_docx(
            &input,
            &[
                ("word/media/image1.png", b"not a png"),
                ("word/media/image2.jpeg", b"jpeg bytes"),
            ],
        );

        let cli = Cli::try_parse_from([
            "docx-imagex".into(),
            "--keep-going".into(),
            "-o".into(),
            outdir.clone().into_os_string(),
            input.into_os_string(),
        ])
        .unwrap();
        let err = handle_run(cli).unwrap_err();
        assert_eq!(err.to_string(), "1 failure(s) recorded");
        assert_eq!(std::fs::read_dir(&outdir).unwrap().count(), 1);
    }
}
