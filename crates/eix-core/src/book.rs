//! Data model shared by the cover sources and the batch driver.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CoverError, Result};

/// The kinds of e-book eix knows how to pull a cover from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookKind {
    Epub,
    Pdf,
}

impl BookKind {
    /// Parse from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "epub" => Some(Self::Epub),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Get the canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Epub => "epub",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for BookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension().to_uppercase())
    }
}

/// One input file selected for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    path: PathBuf,
    kind: BookKind,
}

impl SourceDocument {
    /// Returns `None` unless the extension names a supported kind.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let kind = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(BookKind::from_extension)?;
        Some(Self { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> BookKind {
        self.kind
    }

    /// Where the cover lands: the source path with its extension swapped for `.jpg`.
    pub fn output_path(&self) -> PathBuf {
        self.path.with_extension("jpg")
    }
}

/// List the EPUB and PDF files directly inside `dir`, sorted by file name.
pub fn discover_sources(dir: &Path) -> Result<Vec<SourceDocument>> {
    if !dir.is_dir() {
        return Err(CoverError::Usage(format!(
            "Directory not found: {}",
            dir.display()
        )));
    }

    let mut sources = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(doc) = SourceDocument::from_path(entry.path()) {
            sources.push(doc);
        }
    }
    sources.sort_by(|a, b| a.path.cmp(&b.path));

    log::debug!("Found {} candidate files in {}", sources.len(), dir.display());
    Ok(sources)
}

/// Archive-internal path of the package manifest (OPF).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPath(String);

impl ManifestPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory holding the manifest; empty when it sits at the archive root.
    pub fn base_dir(&self) -> &str {
        parent_dir(&self.0)
    }
}

impl fmt::Display for ManifestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A raw cover path as written in a manifest or markup file, together with
/// the directory it is relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverReference {
    pub raw: String,
    pub base_dir: String,
}

impl CoverReference {
    pub fn new(raw: impl Into<String>, base_dir: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            base_dir: base_dir.into(),
        }
    }
}

/// Normalized archive-internal path of the cover image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImagePath(String);

impl ResolvedImagePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolvedImagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything before the last `/` of an archive path.
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}
