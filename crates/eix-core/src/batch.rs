//! Batch driver: runs the cover pipeline over a list of source documents.
//!
//! Each file moves `Pending → (Skipped | Resolving → (Created | Failed))`.
//! A file whose output JPEG already exists is skipped before any container
//! is opened. Failures are final for their file; the batch continues unless
//! it was built with `fail_fast`, in which case the first failure cancels it.
//!
//! Inputs that share an output path (`a.epub` and `a.pdf`) run one after the
//! other on the same worker, so the later one sees the earlier JPEG and is
//! skipped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};
use rayon::prelude::*;

use crate::book::{BookKind, SourceDocument};
use crate::error::{CoverError, Result};
use crate::plugin::CoverSource;

/// What happened to one input file.
#[derive(Debug)]
pub enum ExtractionOutcome {
    Created,
    Skipped,
    Failed(CoverError),
}

/// Outcome of one file, kept for the final report.
#[derive(Debug)]
pub struct FileReport {
    pub source: SourceDocument,
    pub outcome: ExtractionOutcome,
}

/// Totals for a finished batch.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    pub elapsed: Duration,
    pub reports: Vec<FileReport>,
}

impl BatchSummary {
    fn from_reports(reports: Vec<FileReport>, elapsed: Duration) -> Self {
        let mut summary = Self {
            elapsed,
            ..Self::default()
        };
        for report in &reports {
            match report.outcome {
                ExtractionOutcome::Created => summary.created += 1,
                ExtractionOutcome::Skipped => summary.skipped += 1,
                ExtractionOutcome::Failed(_) => summary.failed += 1,
            }
        }
        summary.reports = reports;
        summary
    }

    /// Number of files that reached a terminal state.
    pub fn considered(&self) -> usize {
        self.created + self.skipped + self.failed
    }
}

/// Runs cover sources over a batch of documents.
pub struct BatchDriver {
    sources: Vec<Box<dyn CoverSource>>,
    jobs: usize,
    scratch_root: Option<PathBuf>,
    cancel: Arc<AtomicBool>,
    fail_fast: bool,
}

impl BatchDriver {
    /// Flag that, once set, stops new files from being dispatched.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Process every document and tally the outcomes.
    ///
    /// The scratch directory lives for the duration of this call only.
    pub fn run(&self, documents: &[SourceDocument]) -> Result<BatchSummary> {
        let start = Instant::now();
        let scratch = self.create_scratch()?;
        info!(
            "Processing {} files with {} worker(s), scratch dir {}",
            documents.len(),
            self.jobs,
            scratch.path().display()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| CoverError::Io(std::io::Error::other(e)))?;

        let groups = group_by_output(documents);
        let mut indexed: Vec<(usize, FileReport)> = pool.install(|| {
            groups
                .par_iter()
                .flat_map_iter(|group| self.process_group(documents, group, scratch.path()))
                .collect()
        });
        indexed.sort_by_key(|(index, _)| *index);
        let reports: Vec<FileReport> = indexed.into_iter().map(|(_, report)| report).collect();

        if reports.len() < documents.len() {
            warn!(
                "Batch cancelled: {} of {} files were not processed",
                documents.len() - reports.len(),
                documents.len()
            );
        }

        Ok(BatchSummary::from_reports(reports, start.elapsed()))
    }

    /// Run the documents of one output group in order, stopping once the
    /// batch is cancelled.
    fn process_group(
        &self,
        documents: &[SourceDocument],
        group: &[usize],
        scratch: &Path,
    ) -> Vec<(usize, FileReport)> {
        let mut reports = Vec::with_capacity(group.len());
        for &index in group {
            if self.cancel.load(Ordering::Relaxed) {
                break;
            }
            let doc = &documents[index];
            let outcome = self.process(doc, scratch);
            if self.fail_fast && matches!(outcome, ExtractionOutcome::Failed(_)) {
                warn!("Stopping after failure on {}", doc.path().display());
                self.cancel.store(true, Ordering::Relaxed);
            }
            reports.push((
                index,
                FileReport {
                    source: doc.clone(),
                    outcome,
                },
            ));
        }
        reports
    }

    fn process(&self, doc: &SourceDocument, scratch: &Path) -> ExtractionOutcome {
        let output = doc.output_path();
        if output.exists() {
            info!("JPEG file exists for {}", doc.path().display());
            return ExtractionOutcome::Skipped;
        }

        info!("Getting image for {}...", doc.path().display());
        match self.extract(doc, &output, scratch) {
            Ok(()) => {
                info!("Created {}", output.display());
                ExtractionOutcome::Created
            }
            Err(e) => {
                warn!("{}: {}", doc.path().display(), e);
                ExtractionOutcome::Failed(e)
            }
        }
    }

    fn extract(&self, doc: &SourceDocument, output: &Path, scratch: &Path) -> Result<()> {
        let source = self.source_for(doc.kind()).ok_or_else(|| {
            CoverError::UnsupportedCoverType(format!("no cover source for {}", doc.kind()))
        })?;
        let workdir = tempfile::Builder::new()
            .prefix("book-")
            .tempdir_in(scratch)?;
        log::debug!("Running {} for {}", source.name(), doc.path().display());
        source.produce_cover(doc, output, workdir.path())
    }

    fn source_for(&self, kind: BookKind) -> Option<&dyn CoverSource> {
        self.sources
            .iter()
            .find(|s| s.kind() == kind)
            .map(|s| s.as_ref())
    }

    fn create_scratch(&self) -> Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("eix-");
        let dir = match &self.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}

/// Indices of `documents` grouped by output path, groups in order of first
/// appearance.
fn group_by_output(documents: &[SourceDocument]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut slots: HashMap<PathBuf, usize> = HashMap::new();
    for (index, doc) in documents.iter().enumerate() {
        let slot = *slots.entry(doc.output_path()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(index);
    }
    groups
}

/// Builder for a [`BatchDriver`].
pub struct BatchBuilder {
    sources: Vec<Box<dyn CoverSource>>,
    jobs: usize,
    scratch_root: Option<PathBuf>,
    fail_fast: bool,
}

impl BatchBuilder {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            jobs: 1,
            scratch_root: None,
            fail_fast: false,
        }
    }

    /// Register a cover source. A later source for the same kind is ignored.
    pub fn source(mut self, source: Box<dyn CoverSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn scratch_root(mut self, root: Option<PathBuf>) -> Self {
        self.scratch_root = root;
        self
    }

    /// Cancel the rest of the batch after the first failed file.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn build(self) -> Result<BatchDriver> {
        if self.sources.is_empty() {
            return Err(CoverError::Usage("No cover sources registered".to_string()));
        }
        Ok(BatchDriver {
            sources: self.sources,
            jobs: self.jobs,
            scratch_root: self.scratch_root,
            cancel: Arc::new(AtomicBool::new(false)),
            fail_fast: self.fail_fast,
        })
    }
}

impl Default for BatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}
