use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use atena_pdf::metrics::FixedMetrics;
use atena_pdf::{Error, FontProgram, LayoutConfig, RunReport};

/// Render vertical Japanese address labels from CSV files into PDF.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// CSV files or directories of CSV files
    #[arg(default_value = "input")]
    inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "pdf_output")]
    output_dir: PathBuf,

    /// Output file name without extension (e.g. 宛名まとめ for a single
    /// merged file); `_NNN` is appended when --page-cap is set
    #[arg(long, default_value = "labels")]
    stem: String,

    /// Layout configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Font family candidates (`;`-separated) or a font file path
    #[arg(short, long)]
    font: Option<String>,

    /// Face index inside a .ttc/.otc collection given by path
    #[arg(long, default_value_t = 0)]
    face_index: u32,

    /// Maximum pages per output file
    #[arg(long)]
    page_cap: Option<usize>,

    /// Lay out and count pages without loading a font or writing files
    #[arg(long)]
    dry_run: bool,

    /// Print the effective layout configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn load_config(args: &Args) -> Result<LayoutConfig, Error> {
    let mut config = match &args.config {
        Some(path) => LayoutConfig::load(path)?,
        None => LayoutConfig::default(),
    };
    if let Some(font) = &args.font {
        config.font = font.clone();
    }
    if args.page_cap.is_some() {
        config.page_cap = args.page_cap;
    }
    config.validate()?;
    Ok(config)
}

fn load_font(args: &Args, config: &LayoutConfig) -> Result<FontProgram, Error> {
    let path = PathBuf::from(config.font.trim());
    if args.face_index != 0 && path.is_file() {
        return FontProgram::load(&path, args.face_index);
    }
    FontProgram::discover(&config.font)
}

fn summarize(report: &RunReport) {
    for (artifact, file) in report.artifacts.iter().zip(&report.files) {
        log::info!("  #{} {} ({} pages)", artifact.index, file.display(), artifact.pages);
    }
    if report.files.is_empty() {
        for artifact in &report.artifacts {
            log::info!("  #{} ({} pages)", artifact.index, artifact.pages);
        }
    }
    log::info!(
        "Done: {} pages, {} file(s), {} empty record(s) skipped",
        report.total_pages(),
        report.artifacts.len(),
        report.skipped_records,
    );
    for path in &report.failed_inputs {
        log::warn!("Not processed: {}", path.display());
    }
}

fn run(args: &Args) -> Result<RunReport, Error> {
    let config = load_config(args)?;
    if args.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(RunReport::default());
    }
    if args.dry_run {
        return atena_pdf::dry_run(&args.inputs, &config, &FixedMetrics::full_width());
    }
    let font = load_font(args, &config)?;
    atena_pdf::convert_csv_to_pdf(&args.inputs, &args.output_dir, &args.stem, &config, &font)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(report) => {
            if !args.print_config {
                summarize(&report);
            }
            if report.failed_inputs.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
