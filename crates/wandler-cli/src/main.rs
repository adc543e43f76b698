// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wandler — command-line front end
//
// Entry point. Initialises logging, loads the engine configuration, runs one
// subcommand, writes its outputs to the output directory, and prints a JSON
// summary on stdout. Failures print the error report on stderr.

use std::borrow::Cow;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use wandler_core::error::{Result, ValidationKind, WandlerError};
use wandler_core::error_report;
use wandler_core::{ConversionOptions, EngineConfig, FitMode, InputFile, PageSelection};
use wandler_document::{
    BatchPdfOperation, BatchSource, FormatDispatcher, ImageOverlay, PdfEditor, PdfOutput,
    SplitMode, TextOverlay, batch_pdf, batch_resize, file_category, supported_formats,
    supported_operations,
};

#[derive(Debug, Parser)]
#[command(name = "wandler")]
#[command(version)]
#[command(about = "Convert and edit images, PDFs, text, and archives", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, global = true, env = "WANDLER_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory outputs are written to
    #[arg(short, long, global = true, default_value = ".", value_name = "DIR")]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a file to another format
    Convert {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Target format, e.g. png, json, zip
        #[arg(short, long)]
        to: String,

        #[command(flatten)]
        size: SizeArgs,
    },

    /// Resize an image (at least one of --width/--height)
    Resize {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output format (defaults to the input's extension)
        #[arg(short, long)]
        to: Option<String>,

        #[command(flatten)]
        size: SizeArgs,
    },

    /// Show image dimensions and colour layout
    ImageInfo {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// List the target formats offered for a file
    Formats {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Merge PDFs in the given order
    Merge {
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Split a PDF into single pages, or by ranges such as "1-3" or "4,6"
    Split {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// A page range; repeat for several outputs
        #[arg(long = "range", value_name = "RANGE")]
        ranges: Vec<String>,
    },

    /// Rotate PDF pages by a quarter turn
    Rotate {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// 90, 180, or 270
        #[arg(long, allow_negative_numbers = true)]
        degrees: i64,

        /// "all" or a JSON array such as [1,3]
        #[arg(long, default_value = "all")]
        pages: PageSelection,

        /// Add to each page's current rotation instead of replacing it
        #[arg(long)]
        relative: bool,
    },

    /// Keep only the listed pages, in the listed order
    Extract {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(long, value_delimiter = ',', required = true)]
        pages: Vec<u32>,
    },

    /// Remove the listed pages
    Delete {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(long, value_delimiter = ',', required = true)]
        pages: Vec<u32>,
    },

    /// Rearrange pages; the order may repeat or omit pages
    Reorder {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(long, value_delimiter = ',', required = true)]
        order: Vec<u32>,
    },

    /// Drop unused objects and deflate streams
    Compress {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Stamp text onto PDF pages
    AddText {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(long)]
        text: String,

        #[command(flatten)]
        placement: Placement,

        #[arg(long, default_value_t = 12.0)]
        font_size: f32,

        /// Hex colour, e.g. #ff0000
        #[arg(long, default_value = "#000000")]
        color: String,
    },

    /// Stamp an image onto PDF pages
    AddImage {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(long, value_name = "IMAGE")]
        image: PathBuf,

        #[command(flatten)]
        placement: Placement,

        #[arg(long, default_value_t = 100.0)]
        width: f32,

        #[arg(long, default_value_t = 100.0)]
        height: f32,
    },

    /// Show PDF page count and document information
    PdfInfo {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// List the PDF operations this build supports
    Operations,

    /// Resize several images with the same settings
    BatchResize {
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long)]
        to: Option<String>,

        #[command(flatten)]
        size: SizeArgs,
    },

    /// Apply one PDF operation to several files
    BatchPdf {
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,

        /// Operation as JSON, e.g. {"operation":"rotate","pages":"all","degrees":90}
        #[arg(long)]
        operation: String,
    },
}

#[derive(Debug, Clone, Args)]
struct SizeArgs {
    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// fit, fill, cover, or inside
    #[arg(long)]
    fit: Option<FitMode>,

    /// Encoder quality 1-100 (defaults to the configured quality)
    #[arg(long)]
    quality: Option<u8>,

    /// Stretch to the given size instead of keeping the aspect ratio
    #[arg(long)]
    ignore_aspect_ratio: bool,
}

impl SizeArgs {
    fn options(&self, target: &str, config: &EngineConfig) -> ConversionOptions {
        let mut options = ConversionOptions::to_format(target)
            .with_size(self.width, self.height)
            .with_quality(self.quality.unwrap_or(config.default_quality));
        options.maintain_aspect_ratio = !self.ignore_aspect_ratio;
        options.fit_mode = self.fit;
        options
    }
}

/// Overlay position, opacity, and page selection shared by the stamp commands.
#[derive(Debug, Clone, Args)]
struct Placement {
    #[arg(long, default_value_t = 50.0)]
    x: f32,

    /// Distance from the top edge
    #[arg(long, default_value_t = 50.0)]
    y: f32,

    #[arg(long, default_value_t = 1.0)]
    opacity: f32,

    /// "all" or a JSON array such as [1,3]
    #[arg(long, default_value = "all")]
    pages: PageSelection,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(summary) => {
            println!("{}", render(&summary));
            ExitCode::SUCCESS
        }
        Err(err) => {
            let report = error_report::report(&err);
            tracing::error!(code = report.code, %err, "Command failed");
            eprintln!("{}", render(&json!({ "error": report })));
            ExitCode::FAILURE
        }
    }
}

fn render(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn run(cli: Cli) -> Result<Value> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let session = Session::new(config, cli.out_dir);
    session.dispatch(cli.command)
}

/// One CLI invocation: the engines, their config, and where outputs go.
struct Session {
    out_dir: PathBuf,
    dispatcher: FormatDispatcher,
    editor: PdfEditor,
    inputs: RefCell<Vec<PathBuf>>,
}

impl Session {
    fn new(config: EngineConfig, out_dir: PathBuf) -> Self {
        Self {
            dispatcher: FormatDispatcher::new(config),
            editor: PdfEditor::new(),
            out_dir,
            inputs: RefCell::default(),
        }
    }

    #[instrument(skip_all)]
    fn dispatch(&self, command: Command) -> Result<Value> {
        match command {
            Command::Convert { input, to, size } => {
                let input = self.read(&input)?;
                let options = size.options(&to, self.config());
                let result = self.dispatcher.convert(&input, &options)?;
                let path = self.write(&result.filename, &result.data)?;
                Ok(json!({ "path": path, "result": result }))
            }

            Command::Resize { input, to, size } => {
                let input = self.read(&input)?;
                let target = to.unwrap_or_else(|| extension_of(input.name()));
                let options = size.options(&target, self.config());
                let image = self.dispatcher.images().resize(&input, &options)?;
                let path = self.write(&input.renamed(image.format.extension()), &image.data)?;
                Ok(json!({ "path": path, "image": image }))
            }

            Command::ImageInfo { input } => {
                let input = self.read(&input)?;
                Ok(json!(self.dispatcher.images().metadata(&input)?))
            }

            Command::Formats { input } => {
                let input = self.read(&input)?;
                Ok(json!({
                    "category": file_category(&input),
                    "formats": supported_formats(&input),
                }))
            }

            Command::Merge { inputs } => {
                let inputs = self.read_all(&inputs)?;
                self.emit(self.editor.merge(&inputs)?)
            }

            Command::Split { input, ranges } => {
                let input = self.read(&input)?;
                let mode = if ranges.is_empty() {
                    SplitMode::Pages
                } else {
                    SplitMode::Ranges(ranges)
                };
                let outputs = self
                    .editor
                    .split(&input, &mode)?
                    .into_iter()
                    .map(|output| self.emit(output))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Array(outputs))
            }

            Command::Rotate {
                input,
                degrees,
                pages,
                relative,
            } => {
                let input = self.read(&input)?;
                let output = if relative {
                    self.editor.turn(&input, &pages, degrees)?
                } else {
                    self.editor.rotate(&input, &pages, degrees)?
                };
                self.emit(output)
            }

            Command::Extract { input, pages } => {
                let input = self.read(&input)?;
                self.emit(self.editor.extract(&input, &pages)?)
            }

            Command::Delete { input, pages } => {
                let input = self.read(&input)?;
                self.emit(self.editor.delete(&input, &pages)?)
            }

            Command::Reorder { input, order } => {
                let input = self.read(&input)?;
                self.emit(self.editor.reorder(&input, &order)?)
            }

            Command::Compress { input } => {
                let input = self.read(&input)?;
                self.emit(self.editor.compress(&input)?)
            }

            Command::AddText {
                input,
                text,
                placement,
                font_size,
                color,
            } => {
                let input = self.read(&input)?;
                let overlay = TextOverlay {
                    x: placement.x,
                    y: placement.y,
                    opacity: placement.opacity,
                    pages: placement.pages,
                    font_size,
                    color,
                    ..TextOverlay::new(text)
                };
                self.emit(self.editor.add_text_overlay(&input, &overlay)?)
            }

            Command::AddImage {
                input,
                image,
                placement,
                width,
                height,
            } => {
                let input = self.read(&input)?;
                let image = self.read(&image)?;
                let overlay = ImageOverlay {
                    x: placement.x,
                    y: placement.y,
                    opacity: placement.opacity,
                    pages: placement.pages,
                    width,
                    height,
                    ..ImageOverlay::new(image.bytes().to_vec())
                };
                self.emit(self.editor.add_image_overlay(&input, &overlay)?)
            }

            Command::PdfInfo { input } => {
                let input = self.read(&input)?;
                Ok(json!(self.editor.metadata(&input)?))
            }

            Command::Operations => Ok(json!(supported_operations())),

            Command::BatchResize { inputs, to, size } => {
                let target = match to {
                    Some(to) => to,
                    None => inputs.first().map(extension_of).unwrap_or_default(),
                };
                let sources = self.sources(&inputs);
                let report = batch_resize(&sources, &size.options(&target, self.config()))
                    .and_then(|name, image| {
                        let filename = Path::new(name).with_extension(image.format.extension());
                        let path = self.write(&filename.to_string_lossy(), &image.data)?;
                        Ok(json!({ "path": path, "image": image }))
                    });
                Ok(json!(report))
            }

            Command::BatchPdf { inputs, operation } => {
                let operation: BatchPdfOperation = serde_json::from_str(&operation)?;
                let sources = self.sources(&inputs);
                let report = batch_pdf(&sources, &operation).and_then(|_, output| self.emit(output));
                Ok(json!(report))
            }
        }
    }

    fn config(&self) -> &EngineConfig {
        self.dispatcher.config()
    }

    // -- I/O ------------------------------------------------------------------

    /// Read an input and apply the configured size limit. The path is
    /// remembered so no output may replace it.
    fn read(&self, path: &Path) -> Result<InputFile> {
        let input = InputFile::from_path(path).map_err(|err| match err {
            WandlerError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                WandlerError::invalid(ValidationKind::MissingFile, format!("no file at {}", path.display()))
            }
            other => other,
        })?;
        self.config().check_payload(&input)?;
        self.inputs.borrow_mut().push(path.canonicalize()?);
        Ok(input)
    }

    fn read_all(&self, paths: &[PathBuf]) -> Result<Vec<InputFile>> {
        paths.iter().map(|path| self.read(path)).collect()
    }

    /// Batch entries that are read only when the batch reaches them.
    fn sources<'a>(&'a self, paths: &'a [PathBuf]) -> Vec<PathSource<'a>> {
        paths
            .iter()
            .map(|path| PathSource {
                session: self,
                path: path.as_path(),
            })
            .collect()
    }

    /// Write under the output directory, refusing to replace any input read
    /// by this invocation.
    fn write(&self, filename: &str, data: &[u8]) -> Result<String> {
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.canonicalize()?.join(filename);
        if self.inputs.borrow().contains(&path) {
            warn!(path = %path.display(), "Refusing to overwrite an input");
            return Err(WandlerError::invalid(
                ValidationKind::Output,
                format!("output {} would overwrite an input file", path.display()),
            ));
        }
        std::fs::write(&path, data)?;
        info!(path = %path.display(), bytes = data.len(), "Output written");
        Ok(path.display().to_string())
    }

    fn emit(&self, output: PdfOutput) -> Result<Value> {
        let path = self.write(&output.filename, &output.data)?;
        Ok(json!({ "path": path, "output": output }))
    }
}

/// A batch entry read from disk when its turn comes.
struct PathSource<'a> {
    session: &'a Session,
    path: &'a Path,
}

impl BatchSource for PathSource<'_> {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn load(&self) -> Result<Cow<'_, InputFile>> {
        self.session.read(self.path).map(Cow::Owned)
    }
}

/// Lower-cased extension of a file name, or `png` when it has none.
fn extension_of(name: impl AsRef<Path>) -> String {
    name.as_ref()
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_else(|| "png".to_string())
}
