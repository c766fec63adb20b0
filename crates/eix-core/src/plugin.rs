//! Traits at the seams of the extraction pipeline.

use std::ffi::OsString;
use std::path::Path;

use crate::book::{BookKind, SourceDocument};
use crate::error::Result;

/// Produces a cover JPEG for one kind of e-book.
pub trait CoverSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// The book kind this source handles.
    fn kind(&self) -> BookKind;

    /// Write the cover of `source` to `output`.
    ///
    /// `workdir` is a private, empty directory the source may use for
    /// intermediate files; it is removed once the call returns.
    fn produce_cover(&self, source: &SourceDocument, output: &Path, workdir: &Path) -> Result<()>;
}

/// Runs an external program to completion.
///
/// Implementations report a program that cannot be started as
/// `ConversionToolMissing` and a non-zero exit as `ConversionFailed`.
pub trait ToolRunner: Send + Sync {
    fn run(&self, program: &str, args: &[OsString]) -> Result<()>;
}
