// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Foliant — local PDF toolkit
//
// Entry point. Initialises logging, loads configuration, wires the document
// services to an output sink, and dispatches the requested subcommand.

mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use foliant_bridge::{DirectorySink, OutputSink, StdoutSink};
use foliant_core::AppConfig;
use foliant_core::error::{FoliantError, Result};
use foliant_core::human_errors::humanize_error;
use foliant_core::types::{CompressionPreset, ImageInput, ImageKind, OperationKind, Progress};
use foliant_document::{Document, PdfiumRasterizer};
use tokio::sync::mpsc;
use tracing::{info, warn};

use services::data_dir;
use services::document_services::{DocumentServices, Outcome};
use services::render_worker::RenderWorker;

#[derive(Parser)]
#[command(name = "foliant")]
#[command(version)]
#[command(about = "Convert images to PDF, merge, split, and compress PDFs locally", long_about = None)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(long, global = true, value_name = "FILE", env = "FOLIANT_CONFIG")]
    config: Option<PathBuf>,

    /// Replace an existing output file
    #[arg(long, global = true)]
    overwrite: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a PDF with one page per JPEG/PNG image
    Images {
        /// Input images, in page order
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,

        /// Output file ("-" for stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Concatenate PDFs in the order given
    Merge {
        /// Input PDFs
        #[arg(value_name = "PDF", required = true)]
        inputs: Vec<PathBuf>,

        /// Output file ("-" for stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Keep only the selected pages
    Split {
        /// Input PDF
        #[arg(value_name = "PDF")]
        input: PathBuf,

        /// Page range (e.g., "1-3, 5, 9-12")
        #[arg(short, long)]
        pages: String,

        /// Output file ("-" for stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Re-render every page as a JPEG image
    Compress {
        /// Input PDF
        #[arg(value_name = "PDF")]
        input: PathBuf,

        /// Named compression strength
        #[arg(long, value_enum, conflicts_with = "quality")]
        preset: Option<Preset>,

        /// Explicit JPEG quality between 0.0 and 1.0
        #[arg(long)]
        quality: Option<f32>,

        /// Output file ("-" for stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show page count and page sizes
    Info {
        /// Input PDF
        #[arg(value_name = "PDF")]
        input: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// Light compression, best fidelity (quality 0.8)
    Low,
    /// Balanced (quality 0.6)
    Medium,
    /// Smallest output (quality 0.4)
    High,
}

impl From<Preset> for CompressionPreset {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Low => CompressionPreset::Low,
            Preset::Medium => CompressionPreset::Medium,
            Preset::High => CompressionPreset::High,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            tracing::debug!(%err, "operation failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(data_dir::default_config_path);
    let mut config = AppConfig::load(&config_path)?;
    config.overwrite_existing |= cli.overwrite;

    match cli.command {
        Command::Info { input } => show_info(&input),

        Command::Images { images, output } => {
            let inputs = images
                .iter()
                .map(|path| -> Result<ImageInput> {
                    let mime = path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .map_or("application/octet-stream", ImageKind::mime_for_extension);
                    Ok(ImageInput::new(read(path)?, mime))
                })
                .collect::<Result<Vec<_>>>()?;
            let (services, filename) = services_for(&config, output, OperationKind::ImagesToPdf)?;
            let outcome = services.images_to_pdf(inputs, &filename).await?;
            report(&outcome);
            Ok(())
        }

        Command::Merge { inputs, output } => {
            let files = inputs.iter().map(|path| read(path)).collect::<Result<Vec<_>>>()?;
            let (services, filename) = services_for(&config, output, OperationKind::Merge)?;
            let outcome = services.merge_pdfs(files, &filename).await?;
            report(&outcome);
            Ok(())
        }

        Command::Split {
            input,
            pages,
            output,
        } => {
            let file = read(&input)?;
            let (services, filename) = services_for(&config, output, OperationKind::Split)?;
            let outcome = services.split_pdf(file, &pages, &filename).await?;
            report(&outcome);
            Ok(())
        }

        Command::Compress {
            input,
            preset,
            quality,
            output,
        } => {
            let quality = match (quality, preset) {
                (Some(quality), _) => quality,
                (None, Some(preset)) => CompressionPreset::from(preset).quality(),
                (None, None) => config.default_preset.quality(),
            };
            let file = read(&input)?;
            let input_bytes = file.len() as u64;
            let (services, filename) = services_for(&config, output, OperationKind::Compress)?;

            let (tx, mut rx) = mpsc::unbounded_channel::<Progress>();
            let printer = tokio::spawn(async move {
                while let Some(progress) = rx.recv().await {
                    eprintln!("{}", progress_line(&progress));
                }
            });

            let outcome = services.compress_pdf(file, quality, &filename, Some(tx)).await;
            // The sender is gone once the job ends, so this only drains.
            let _ = printer.await;
            let outcome = outcome?;

            report(&outcome);
            let output_bytes = outcome.delivery.size_bytes;
            eprintln!("size: {input_bytes} -> {output_bytes} bytes");
            if output_bytes > input_bytes {
                warn!(input_bytes, output_bytes, "compressed file is larger than the input");
                eprintln!("warning: the compressed file is larger than the original; keep the original instead");
            }
            Ok(())
        }
    }
}

/// Build services whose sink matches `-o`, and pick the output filename.
fn services_for(
    config: &AppConfig,
    output: Option<PathBuf>,
    kind: OperationKind,
) -> Result<(DocumentServices, String)> {
    let default_name = format!("{}.pdf", kind.label());

    let (sink, filename): (Arc<dyn OutputSink>, String) = match output {
        Some(path) if path.as_os_str() == "-" => (Arc::new(StdoutSink), default_name),
        Some(path) => {
            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    FoliantError::Output(format!("{} does not name a file", path.display()))
                })?;
            let directory = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            (directory_sink(config, directory), filename)
        }
        None => {
            let directory = config
                .output_dir
                .clone()
                .unwrap_or_else(data_dir::default_output_dir);
            (directory_sink(config, directory), default_name)
        }
    };

    let library = config.pdfium_library_path.clone();
    let renderer = RenderWorker::spawn(move || PdfiumRasterizer::bind(library.as_deref()))?;

    Ok((
        DocumentServices::new(sink, renderer, config.render_scale),
        filename,
    ))
}

fn directory_sink(config: &AppConfig, directory: PathBuf) -> Arc<dyn OutputSink> {
    Arc::new(DirectorySink::new(directory).with_overwrite(config.overwrite_existing))
}

fn show_info(input: &Path) -> Result<()> {
    let document = Document::load(&read(input)?)?;
    println!("{}: {} page(s)", input.display(), document.page_count());
    for page in document.pages() {
        let size = document.page_size(page)?;
        println!(
            "  page {:>4}: {:.1} x {:.1} pt",
            page.index() + 1,
            size.width,
            size.height
        );
    }
    Ok(())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|err| {
        FoliantError::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {err}", path.display()),
        ))
    })
}

fn progress_line(progress: &Progress) -> String {
    format!(
        "compressing page {} of {} ({:.0}%)",
        progress.current,
        progress.total,
        progress.fraction() * 100.0
    )
}

fn report(outcome: &Outcome) {
    info!(operation = %outcome.operation, kind = outcome.kind.label(), "done");
    if let Some(path) = &outcome.delivery.path {
        eprintln!(
            "wrote {} ({} bytes, sha256 {})",
            path.display(),
            outcome.delivery.size_bytes,
            outcome.delivery.sha256
        );
    }
}
