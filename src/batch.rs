//! Page/batch sequencing: one page per printable record, rotating to a new
//! artifact whenever the open one reaches the page cap.

use crate::config::LayoutConfig;
use crate::error::Error;
use crate::geometry::PageGeometry;
use crate::layout::{PagePlan, plan_page};
use crate::metrics::GlyphMetrics;
use crate::record::LabelRecord;
use crate::surface::{Output, Surface};
use crate::vertical::{GlyphAdjustments, render_column};

/// A finalized artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArtifactSummary {
    pub index: usize,
    pub pages: usize,
}

struct OpenBatch<S> {
    index: usize,
    surface: S,
    pages: usize,
}

pub struct Sequencer<'a, O: Output, M: GlyphMetrics + ?Sized> {
    config: &'a LayoutConfig,
    geometry: PageGeometry,
    adjustments: GlyphAdjustments,
    output: O,
    metrics: &'a M,
    font: String,
    active: Option<OpenBatch<O::Surface>>,
    finished: Vec<ArtifactSummary>,
    skipped: usize,
}

impl<'a, O: Output, M: GlyphMetrics + ?Sized> Sequencer<'a, O, M> {
    /// `font` is the name the surface and metrics know the label font by.
    pub fn new(config: &'a LayoutConfig, output: O, metrics: &'a M, font: impl Into<String>) -> Self {
        Self {
            config,
            geometry: config.geometry(),
            adjustments: GlyphAdjustments::with_overrides(&config.glyphs),
            output,
            metrics,
            font: font.into(),
            active: None,
            finished: Vec::new(),
            skipped: 0,
        }
    }

    /// Render one record. Returns `false` when the record was empty and no
    /// page was produced.
    pub fn push(&mut self, record: &LabelRecord) -> Result<bool, Error> {
        let Some(plan) = plan_page(record, self.config) else {
            self.skipped += 1;
            log::debug!("Skipping empty record");
            return Ok(false);
        };

        let at_cap = self
            .active
            .as_ref()
            .zip(self.config.page_cap)
            .is_some_and(|(batch, cap)| batch.pages >= cap);
        if at_cap {
            self.close_active()?;
        }
        let mut batch = match self.active.take() {
            Some(batch) => batch,
            None => {
                let index = self.finished.len() + 1;
                let surface = self.output.open(index)?;
                log::debug!("Opened output artifact #{index}");
                OpenBatch {
                    index,
                    surface,
                    pages: 0,
                }
            }
        };

        draw_page(
            &mut batch.surface,
            &plan,
            &self.geometry,
            &self.adjustments,
            self.metrics,
            &self.font,
        );
        batch.surface.end_page();
        batch.pages += 1;
        self.active = Some(batch);
        Ok(true)
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Finalize the last open artifact and hand back the output.
    pub fn finish(mut self) -> Result<(Vec<ArtifactSummary>, O), Error> {
        self.close_active()?;
        log::info!(
            "Rendered {} pages into {} file(s), {} empty record(s) skipped",
            self.finished.iter().map(|a| a.pages).sum::<usize>(),
            self.finished.len(),
            self.skipped,
        );
        Ok((self.finished, self.output))
    }

    fn close_active(&mut self) -> Result<(), Error> {
        if let Some(batch) = self.active.take() {
            self.output.finalize(batch.index, batch.surface)?;
            log::debug!("Finalized artifact #{} with {} pages", batch.index, batch.pages);
            self.finished.push(ArtifactSummary {
                index: batch.index,
                pages: batch.pages,
            });
        }
        Ok(())
    }
}

/// Draw every field of one planned page. Does not end the page.
pub fn draw_page<S: Surface + ?Sized, M: GlyphMetrics + ?Sized>(
    surface: &mut S,
    plan: &PagePlan,
    geometry: &PageGeometry,
    adjustments: &GlyphAdjustments,
    metrics: &M,
    font: &str,
) {
    if let Some(run) = &plan.postal {
        surface.set_font(font, run.font_size);
        surface.draw_text(geometry.to_render_x(run.x), geometry.to_render_y(run.y), &run.text);
    }
    for column in &plan.columns {
        surface.set_font(font, column.font_size);
        render_column(surface, geometry, column, adjustments, metrics, font);
    }
}
