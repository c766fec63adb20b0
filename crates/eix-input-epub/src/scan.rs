//! Finding the image embedded in a cover page.

use std::collections::HashMap;

use eix_core::error::{CoverError, Result};
use eix_utils::mime::{classify_reference, ReferenceKind};
use eix_utils::xml::{AttrKey, Element, ParsedDocument};

/// Attributes that may point at the cover image, in the order they are scanned.
const IMAGE_ATTRIBUTES: &[&str] = &["src", "href"];

/// The key for `name` on an element with the given in-scope namespaces.
///
/// SVG covers write `xlink:href`; where an `xlink` prefix is in scope the
/// attribute is qualified with that namespace, otherwise it is plain.
pub fn xlink_aware_key<'a>(namespaces: &'a HashMap<String, String>, name: &'a str) -> AttrKey<'a> {
    match namespaces.get("xlink") {
        Some(ns) => AttrKey::qualified(ns, name),
        None => AttrKey::plain(name),
    }
}

/// The first image reference in `doc`.
///
/// Every element is checked for `src` before any is checked for `href`.
/// `path` only labels the error.
pub fn find_image(doc: &ParsedDocument, path: &str) -> Result<String> {
    IMAGE_ATTRIBUTES
        .iter()
        .find_map(|attr| scan_attribute(doc, attr))
        .ok_or_else(|| CoverError::ImageNotFoundInMarkup(path.to_string()))
}

/// The xlink-qualified value of `name` on `element`, or the plain one when
/// the element carries no qualified attribute. An `xlink` prefix declared on
/// `<html>` is in scope for every `<img src>` below it.
fn image_attribute<'a>(element: &'a Element, name: &str) -> Option<&'a str> {
    element
        .get(xlink_aware_key(element.namespaces(), name))
        .or_else(|| element.attr(name))
}

fn scan_attribute(doc: &ParsedDocument, attr: &str) -> Option<String> {
    doc.elements()
        .iter()
        .filter_map(|element| image_attribute(element, attr))
        .find(|value| classify_reference(value) == ReferenceKind::DirectImage)
        .map(str::to_string)
}
