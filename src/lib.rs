mod error;
mod fonts;
mod pdf;

pub mod batch;
pub mod config;
pub mod geometry;
pub mod layout;
pub mod metrics;
pub mod record;
pub mod surface;
pub mod vertical;

pub use batch::{ArtifactSummary, Sequencer};
pub use config::LayoutConfig;
pub use error::Error;
pub use fonts::FontProgram;
pub use pdf::{PdfOutput, PdfSurface};

use std::path::{Path, PathBuf};
use std::time::Instant;

use metrics::GlyphMetrics;
use record::{LabelRecord, read_csv};
use surface::{MemoryOutput, Output};

/// What a run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub artifacts: Vec<ArtifactSummary>,
    /// Files written, in artifact order. Empty for dry runs.
    pub files: Vec<PathBuf>,
    pub skipped_records: usize,
    /// Inputs that could not be read; the run continued without them.
    pub failed_inputs: Vec<PathBuf>,
}

impl RunReport {
    pub fn total_pages(&self) -> usize {
        self.artifacts.iter().map(|a| a.pages).sum()
    }
}

/// Feed every record of every input, in order, through one sequencer.
fn run<O: Output, M: GlyphMetrics + ?Sized>(
    inputs: &[PathBuf],
    config: &LayoutConfig,
    output: O,
    metrics: &M,
    font_name: &str,
) -> Result<(RunReport, O), Error> {
    let mut sequencer = Sequencer::new(config, output, metrics, font_name);
    let mut failed_inputs = Vec::new();

    for path in record::collect_inputs(inputs)? {
        log::info!("Processing {}", path.display());
        let rows = match read_csv(&path) {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("Skipping {}: {e}", path.display());
                failed_inputs.push(path);
                continue;
            }
        };
        for raw in &rows {
            let label = LabelRecord::from_raw(raw, &config.fields, &config.address);
            sequencer.push(&label)?;
        }
    }

    let skipped_records = sequencer.skipped();
    let (artifacts, output) = sequencer.finish()?;
    let report = RunReport {
        artifacts,
        files: Vec::new(),
        skipped_records,
        failed_inputs,
    };
    Ok((report, output))
}

/// Render every CSV in `inputs` (files or directories) into label PDFs in
/// `out_dir`.
pub fn convert_csv_to_pdf(
    inputs: &[PathBuf],
    out_dir: &Path,
    stem: &str,
    config: &LayoutConfig,
    font: &FontProgram,
) -> Result<RunReport, Error> {
    let t0 = Instant::now();
    let numbered = config.page_cap.is_some();
    let output = PdfOutput::new(out_dir, stem, numbered, font, config.geometry())?;
    let (mut report, output) = run(inputs, config, output, font, font.name())?;
    report.files = output.written().to_vec();

    log::info!(
        "Timing: total={:.1}ms ({} pages, {} files)",
        t0.elapsed().as_secs_f64() * 1000.0,
        report.total_pages(),
        report.files.len(),
    );
    Ok(report)
}

/// Lay out every record and count pages without writing anything.
pub fn dry_run<M: GlyphMetrics + ?Sized>(
    inputs: &[PathBuf],
    config: &LayoutConfig,
    metrics: &M,
) -> Result<RunReport, Error> {
    let (report, _) = run(inputs, config, MemoryOutput::new(), metrics, "dry-run")?;
    Ok(report)
}
