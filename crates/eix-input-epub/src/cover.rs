//! Finding the cover reference inside a parsed manifest.

use eix_core::book::{CoverReference, ManifestPath};
use eix_core::error::{CoverError, Result};
use eix_utils::xml::ParsedDocument;

/// A way of picking the cover out of a manifest. Returns the raw href.
pub type CoverStrategy = fn(&ParsedDocument) -> Option<String>;

pub const COVER_STRATEGIES: &[(&str, CoverStrategy)] = &[
    ("meta[name=cover]", from_metadata),
    ("reference[type=cover]", from_guide),
    ("first itemref", from_spine),
];

/// Find the cover reference of `manifest`, relative to the manifest's directory.
pub fn find_cover_reference(doc: &ParsedDocument, manifest: &ManifestPath) -> Result<CoverReference> {
    for (name, strategy) in COVER_STRATEGIES {
        if let Some(href) = strategy(doc) {
            log::debug!("Cover strategy '{}' found {}", name, href);
            return Ok(CoverReference::new(strip_fragment(&href), manifest.base_dir()));
        }
    }
    Err(CoverError::CoverReferenceNotFound(manifest.to_string()))
}

/// `<meta name="cover" content="ID"/>`, then the `href` of the item with that id.
pub fn from_metadata(doc: &ParsedDocument) -> Option<String> {
    let id = doc
        .elements_named("meta")
        .find(|meta| {
            meta.attr("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("cover"))
        })?
        .attr("content")?;
    item_href(doc, id)
}

pub fn from_guide(doc: &ParsedDocument) -> Option<String> {
    doc.elements_named("reference")
        .filter(|r| r.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("cover")))
        .find_map(|r| r.attr("href"))
        .map(str::to_string)
}

/// The first page in reading order.
pub fn from_spine(doc: &ParsedDocument) -> Option<String> {
    let idref = doc.first_named("itemref")?.attr("idref")?;
    item_href(doc, idref)
}

fn item_href(doc: &ParsedDocument, id: &str) -> Option<String> {
    doc.elements_named("item")
        .find(|item| item.attr("id") == Some(id))?
        .attr("href")
        .map(str::to_string)
}

fn strip_fragment(href: &str) -> &str {
    href.split_once('#').map_or(href, |(path, _)| path)
}
