//! Finding the package manifest (OPF) inside an EPUB container.

use eix_core::book::ManifestPath;
use eix_core::error::{CoverError, Result};
use eix_utils::archive::Container;
use eix_utils::path::decode_spaces;
use eix_utils::xml::{MarkupSyntax, ParsedDocument};

pub const CONTAINER_XML: &str = "META-INF/container.xml";

/// Conventional manifest locations. The misspelled `OEPBS` is emitted by
/// some producers and is checked first.
pub const CONVENTIONAL_MANIFESTS: &[&str] = &["OEPBS/content.opf", "OEBPS/content.opf"];

/// A way of guessing where the manifest lives.
///
/// `Ok(None)` and recoverable errors move on to the next strategy; any other
/// error fails the book.
pub type ManifestStrategy = fn(&mut dyn Container) -> Result<Option<String>>;

/// Strategies in priority order.
pub const MANIFEST_STRATEGIES: &[(&str, ManifestStrategy)] = &[
    ("container.xml", container_declared),
    ("conventional default", conventional_default),
    ("brute-force scan", brute_force),
];

/// Locate the manifest, trying each strategy in turn.
///
/// A candidate counts only if the container actually holds it.
pub fn locate_manifest(container: &mut dyn Container) -> Result<ManifestPath> {
    for (name, strategy) in MANIFEST_STRATEGIES {
        let candidate = match strategy(container) {
            Ok(Some(candidate)) => candidate,
            Ok(None) => {
                log::debug!("Manifest strategy '{}' found nothing", name);
                continue;
            }
            Err(e) if e.is_recoverable() => {
                log::debug!("Manifest strategy '{}' skipped: {}", name, e);
                continue;
            }
            Err(e) => return Err(e),
        };
        let candidate = decode_spaces(&candidate);
        if container.contains(&candidate) {
            log::debug!("Manifest strategy '{}' found {}", name, candidate);
            return Ok(ManifestPath::new(candidate));
        }
        log::debug!(
            "Manifest strategy '{}' named {}, which is not in the archive",
            name,
            candidate
        );
    }
    Err(CoverError::ManifestNotFound)
}

/// The `full-path` of the first `rootfile` in `META-INF/container.xml`.
///
/// A malformed `container.xml` is treated as absent.
pub fn container_declared(container: &mut dyn Container) -> Result<Option<String>> {
    let bytes = container.read(CONTAINER_XML)?;
    let doc = match ParsedDocument::from_bytes(&bytes, CONTAINER_XML, MarkupSyntax::Xml) {
        Ok(doc) => doc,
        Err(e) => {
            log::debug!("{}", e);
            return Ok(None);
        }
    };
    Ok(doc
        .first_named("rootfile")
        .and_then(|rootfile| rootfile.attr("full-path"))
        .map(str::to_string))
}

pub fn conventional_default(container: &mut dyn Container) -> Result<Option<String>> {
    Ok(CONVENTIONAL_MANIFESTS
        .iter()
        .find(|name| container.contains(name))
        .map(|name| name.to_string()))
}

/// The first entry with an `.opf` suffix, in archive order.
pub fn brute_force(container: &mut dyn Container) -> Result<Option<String>> {
    Ok(container
        .entries()
        .iter()
        .find(|entry| entry.name.ends_with(".opf"))
        .map(|entry| entry.name.clone()))
}
