use clap::{Parser, Subcommand};
use pixshelf::config::{self, Settings};
use pixshelf::imaging::{Pipeline, PipelineConfig, PipelineError, ProcessingOptions};
use pixshelf::logging;
use pixshelf::media::{content_type_for, is_transformable, png_object_key};
use pixshelf::output::{self, FileOutcome};
use rayon::prelude::*;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "pixshelf")]
#[command(version)]
#[command(about = "Resize images, cut out their background, and make cover thumbnails")]
#[command(long_about = "\
Resize images, cut out their background, and make cover thumbnails

Every transformed image is written as a PNG next to its source (or into
--out). With background removal on, the subject is kept and the background
becomes transparent; with it off, the result is a plain resized PNG.

Settings are read from ./pixshelf.toml when present, or from --config.
Run 'pixshelf gen-config' to print a documented config file.")]
struct Cli {
    /// Settings file (defaults to ./pixshelf.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transform images into PNGs
    Process(ProcessArgs),
    /// Write a 200x200 JPEG cover thumbnail of one image
    Thumbnail {
        input: PathBuf,
        /// Output file (defaults to <stem>-thumb.jpg next to the input)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print a stock pixshelf.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ProcessArgs {
    /// Image files or directories to walk
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory (defaults to each input's directory)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Target box width
    #[arg(long)]
    width: Option<u32>,

    /// Target box height
    #[arg(long)]
    height: Option<u32>,

    /// Stretch to exactly width x height instead of fitting inside
    #[arg(long)]
    fill: bool,

    /// Resize only, no background cutout
    #[arg(long)]
    keep_background: bool,

    /// Also write <stem>-thumb.jpg for every result
    #[arg(long)]
    thumbnails: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if let Err(e) = logging::init_cli_tracing(cli.verbose) {
        eprintln!("warning: logging unavailable: {e}");
    }

    match cli.command {
        Command::Process(args) => {
            let settings = config::load_settings(cli.config.as_deref())?;
            let options = resolve_options(&settings, &args)?;
            init_thread_pool(&settings.processing);
            let pipeline = Pipeline::new(PipelineConfig::from_settings(&settings));

            let files = collect_inputs(&args.inputs)?;
            debug!(files = files.len(), "collected inputs");
            if let Some(out) = &args.out {
                fs::create_dir_all(out)?;
            }

            let collisions = find_output_collisions(&files, args.out.as_deref());
            let outcomes: Vec<FileOutcome> = files
                .par_iter()
                .zip(collisions.par_iter())
                .map(|(path, earlier)| match earlier {
                    Some(earlier) => FileOutcome::Skipped {
                        input: path.clone(),
                        reason: format!(
                            "{} is already written from {}",
                            png_object_key(&file_name(path)),
                            file_name(earlier)
                        ),
                    },
                    None => process_file(
                        path,
                        args.out.as_deref(),
                        &pipeline,
                        &options,
                        args.thumbnails,
                    ),
                })
                .collect();
            output::print_process_output(&outcomes);

            let failed = outcomes.iter().filter(|o| o.is_failure()).count();
            if failed > 0 {
                return Err(format!("{failed} of {} inputs failed", outcomes.len()).into());
            }
        }
        Command::Thumbnail { input, out } => {
            let settings = config::load_settings(cli.config.as_deref())?;
            let pipeline = Pipeline::new(PipelineConfig::from_settings(&settings));
            let bytes = fs::read(&input)?;
            let media_type = content_type_for(&file_name(&input));
            let thumb = pipeline.thumbnail(&bytes, media_type)?;
            let out = out.unwrap_or_else(|| thumbnail_path(&input, None));
            fs::write(&out, &thumb.bytes)?;
            output::print_thumbnail_output(&input, &out, &thumb);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Settings defaults with command-line flags on top.
fn resolve_options(
    settings: &Settings,
    args: &ProcessArgs,
) -> Result<ProcessingOptions, PipelineError> {
    let base = &settings.options;
    ProcessingOptions::new(
        args.width.unwrap_or(base.width),
        args.height.unwrap_or(base.height),
        base.maintain_aspect_ratio && !args.fill,
        base.remove_background && !args.keep_background,
    )
}

/// Expand directories into the transformable images below them.
///
/// Files named explicitly are kept whatever their type so the report can
/// say why they were skipped.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file()
                && is_transformable(content_type_for(&file_name(entry.path())))
            {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

/// Where the PNG for `path` goes: `out_dir`, or next to the input.
fn output_path(path: &Path, out_dir: Option<&Path>) -> PathBuf {
    let dir = out_dir
        .or_else(|| path.parent())
        .unwrap_or_else(|| Path::new("."));
    dir.join(png_object_key(&file_name(path)))
}

/// For each input, the earlier input that already writes the same output
/// file (`a.jpg` and `a.jpeg` both become `a.png`), if any.
fn find_output_collisions(files: &[PathBuf], out_dir: Option<&Path>) -> Vec<Option<PathBuf>> {
    let mut claimed: HashMap<PathBuf, &PathBuf> = HashMap::new();
    files
        .iter()
        .map(|path| {
            if !is_transformable(content_type_for(&file_name(path))) {
                return None;
            }
            match claimed.entry(output_path(path, out_dir)) {
                Entry::Occupied(first) => Some(first.get().to_path_buf()),
                Entry::Vacant(slot) => {
                    slot.insert(path);
                    None
                }
            }
        })
        .collect()
}

fn process_file(
    path: &Path,
    out_dir: Option<&Path>,
    pipeline: &Pipeline,
    options: &ProcessingOptions,
    thumbnails: bool,
) -> FileOutcome {
    let name = file_name(path);
    let media_type = content_type_for(&name);
    if !is_transformable(media_type) {
        return FileOutcome::Skipped {
            input: path.to_path_buf(),
            reason: format!("not a transformable image ({media_type})"),
        };
    }

    let output = output_path(path, out_dir);
    if output == path {
        return FileOutcome::Skipped {
            input: path.to_path_buf(),
            reason: "result would overwrite the input; pass --out".into(),
        };
    }

    let failed = |error: String| FileOutcome::Failed {
        input: path.to_path_buf(),
        error,
    };

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => return failed(e.to_string()),
    };
    let processed = match pipeline.process(&bytes, media_type, options) {
        Ok(processed) => processed,
        Err(e) => return failed(e.to_string()),
    };
    drop(bytes);
    if let Err(e) = fs::write(&output, &processed.bytes) {
        return failed(format!("{}: {e}", output.display()));
    }

    let thumbnail = if thumbnails {
        let thumb_path = thumbnail_path(path, out_dir);
        let written = pipeline
            .thumbnail(&processed.bytes, processed.media_type.as_str())
            .map_err(|e| e.to_string())
            .and_then(|thumb| {
                fs::write(&thumb_path, &thumb.bytes)
                    .map_err(|e| format!("{}: {e}", thumb_path.display()))
            });
        if let Err(error) = written {
            return failed(error);
        }
        Some(thumb_path)
    } else {
        None
    };

    FileOutcome::Processed {
        input: path.to_path_buf(),
        output,
        width: processed.width,
        height: processed.height,
        bytes: processed.bytes.len() as u64,
        background_removed: options.remove_background(),
        thumbnail,
    }
}

/// `<stem>-thumb.jpg`, in `out_dir` or next to the input.
fn thumbnail_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let dir = out_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new("."));
    dir.join(format!("{stem}-thumb.jpg"))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default()
}
