//! Extension-based classification of cover references.

/// What a cover reference points at, judged by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// A raster image that can be materialized as-is.
    DirectImage,
    /// A page that must be scanned for an embedded image.
    Markup,
    Unknown,
}

/// Classify a reference by its extension (case-insensitive).
pub fn classify_reference(path: &str) -> ReferenceKind {
    match extension(path).as_deref() {
        Some("jpg" | "jpeg" | "png") => ReferenceKind::DirectImage,
        Some("html" | "xhtml" | "htm" | "xml") => ReferenceKind::Markup,
        _ => ReferenceKind::Unknown,
    }
}

/// Whether `path` names a JPEG, which needs no transcoding.
pub fn is_jpeg(path: &str) -> bool {
    matches!(extension(path).as_deref(), Some("jpg" | "jpeg"))
}

/// Lowercased extension of the last path segment, without the dot.
pub fn extension(path: &str) -> Option<String> {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let dot = file_name.rfind('.')?;
    // A leading dot marks a hidden file, not an extension.
    if dot == 0 {
        return None;
    }
    Some(file_name[dot + 1..].to_lowercase())
}
