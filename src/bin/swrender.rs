//! Command line front end: render one KSW notation string to SVG.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;

use swrender::options::DEFAULT_FONT_NAME;
use swrender::{open_font_store, render, BoundsPolicy, Framing, RenderError, RenderOptions};

/// Render a Kartesian SignWriting string as an SVG image.
#[derive(Debug, Parser)]
#[command(name = "swrender", version, about)]
struct Args {
    /// Notation string, e.g. M40x69S35000n18xn18S14c2017x15
    notation: String,

    /// Glyph store (.json or .zip of per-symbol SVG files)
    #[arg(long, default_value = "glyphs.zip")]
    font: PathBuf,

    /// Font name recorded in the document metadata
    #[arg(long)]
    font_name: Option<String>,

    /// JSON render options; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the document here instead of stdout
    #[arg(short, long, conflicts_with = "auto_output")]
    output: Option<PathBuf>,

    /// Write the document to <NOTATION>.svg
    #[arg(short, long)]
    auto_output: bool,

    /// Colour symbol lines by category
    #[arg(long)]
    colorize: bool,

    /// Padding around the sign (implies --fit)
    #[arg(long)]
    pad: Option<i32>,

    /// Size the canvas to the symbols instead of the header extents
    #[arg(long)]
    fit: bool,

    /// Fail when a glyph leaves the canvas
    #[arg(long)]
    strict: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

enum Failure {
    Render(RenderError),
    Other(String),
}

impl From<RenderError> for Failure {
    fn from(e: RenderError) -> Self {
        Failure::Render(e)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).init() {
        eprintln!("warning: logging unavailable: {e}");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Render(e)) => {
            eprintln!("error[{}]: {e}", e.kind());
            ExitCode::FAILURE
        }
        Err(Failure::Other(message)) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Failure> {
    let mut options = match &args.config {
        Some(path) => RenderOptions::from_file(path).map_err(|e| Failure::Other(e.to_string()))?,
        None => RenderOptions::default(),
    };

    let store = open_font_store(&args.font).map_err(RenderError::from)?;
    info!("loaded {} glyphs from {}", store.len(), args.font.display());

    match (&args.font_name, store.name()) {
        (Some(name), _) => options.font_name = name.clone(),
        (None, Some(name)) if options.font_name == DEFAULT_FONT_NAME => {
            options.font_name = name.to_string()
        }
        _ => {}
    }
    if args.colorize {
        options.colors.colorize = true;
    }
    if let Some(pad) = args.pad {
        options.pad = pad;
        options.framing = Framing::Fit;
    }
    if args.fit {
        options.framing = Framing::Fit;
    }
    if args.strict {
        options.bounds = BoundsPolicy::Strict;
    }

    let svg = render(&args.notation, &store, &options)?;

    let output = if args.auto_output {
        Some(PathBuf::from(format!("{}.svg", args.notation)))
    } else {
        args.output.clone()
    };
    match output {
        Some(path) => {
            std::fs::write(&path, svg)
                .map_err(|e| Failure::Other(format!("failed to write {}: {e}", path.display())))?;
            info!("wrote {}", path.display());
        }
        None => print!("{svg}"),
    }
    Ok(())
}
