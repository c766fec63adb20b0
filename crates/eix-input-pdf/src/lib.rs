//! PDF cover source: the first page, rasterized by Ghostscript.

pub mod render;

use std::path::Path;
use std::sync::Arc;

use eix_core::book::{BookKind, SourceDocument};
use eix_core::error::Result;
use eix_core::options::ExtractOptions;
use eix_core::plugin::{CoverSource, ToolRunner};

pub struct PdfCoverSource {
    gs_command: String,
    resolution: u16,
    runner: Arc<dyn ToolRunner>,
}

impl PdfCoverSource {
    pub fn new(gs_command: impl Into<String>, resolution: u16, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            gs_command: gs_command.into(),
            resolution,
            runner,
        }
    }

    pub fn from_options(options: &ExtractOptions, runner: Arc<dyn ToolRunner>) -> Self {
        Self::new(options.gs_command.clone(), options.pdf_resolution, runner)
    }
}

impl CoverSource for PdfCoverSource {
    fn name(&self) -> &str {
        "PDF (Ghostscript)"
    }

    fn kind(&self) -> BookKind {
        BookKind::Pdf
    }

    fn produce_cover(&self, source: &SourceDocument, output: &Path, _workdir: &Path) -> Result<()> {
        log::debug!(
            "Rendering first page of {} at {} DPI",
            source.path().display(),
            self.resolution
        );
        let args = render::ghostscript_args(source.path(), output, self.resolution);
        let result = self.runner.run(&self.gs_command, &args);
        if result.is_err() && output.exists() {
            if let Err(e) = std::fs::remove_file(output) {
                log::warn!("Could not remove partial output {}: {}", output.display(), e);
            }
        }
        result
    }
}
