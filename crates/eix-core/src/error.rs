use thiserror::Error;

/// Every way extracting a cover for one input file can fail.
#[derive(Error, Debug)]
pub enum CoverError {
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("entry not found: {0}")]
    EntryNotFound(String),

    #[error("cannot find the package manifest (OPF)")]
    ManifestNotFound,

    #[error("cannot find a cover reference in {0}")]
    CoverReferenceNotFound(String),

    #[error("no image found in {0}")]
    ImageNotFoundInMarkup(String),

    #[error("unsupported cover type: {0}")]
    UnsupportedCoverType(String),

    #[error("XML parsing error in {path}: {message}")]
    Xml { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot run {0}; is it installed?")]
    ConversionToolMissing(String),

    #[error("conversion failed: {0}")]
    ConversionFailed(String),

    #[error("{0}")]
    Usage(String),
}

impl CoverError {
    /// Short, stable name of the failure kind, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CorruptArchive(_) => "CorruptArchive",
            Self::EntryNotFound(_) => "EntryNotFound",
            Self::ManifestNotFound => "ManifestNotFound",
            Self::CoverReferenceNotFound(_) => "CoverReferenceNotFound",
            Self::ImageNotFoundInMarkup(_) => "ImageNotFoundInMarkup",
            Self::UnsupportedCoverType(_) => "UnsupportedCoverType",
            Self::Xml { .. } => "Xml",
            Self::Io(_) => "IoError",
            Self::ConversionToolMissing(_) => "ConversionToolMissing",
            Self::ConversionFailed(_) => "ConversionFailed",
            Self::Usage(_) => "Usage",
        }
    }

    /// A missing entry is the only failure after which the next manifest
    /// strategy may run; anything else fails the book.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EntryNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CoverError>;
