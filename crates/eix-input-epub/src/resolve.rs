//! The EPUB cover resolution pipeline: manifest, cover reference, optional
//! markup scan, normalized archive path.

use eix_core::book::{parent_dir, ResolvedImagePath};
use eix_core::error::{CoverError, Result};
use eix_utils::archive::Container;
use eix_utils::mime::{classify_reference, ReferenceKind};
use eix_utils::path;
use eix_utils::xml::{MarkupSyntax, ParsedDocument};

use crate::cover::find_cover_reference;
use crate::locate::locate_manifest;
use crate::scan::find_image;

/// Resolve the archive path of the cover image of an open EPUB.
pub fn resolve_cover(container: &mut dyn Container) -> Result<ResolvedImagePath> {
    let manifest = locate_manifest(container)?;
    let bytes = container.read(manifest.as_str())?;
    let opf = ParsedDocument::from_bytes(&bytes, manifest.as_str(), MarkupSyntax::Xml)?;

    let reference = find_cover_reference(&opf, &manifest)?;
    let target = path::resolve(&reference.base_dir, &reference.raw);

    match classify_reference(&target) {
        ReferenceKind::DirectImage => Ok(ResolvedImagePath::new(target)),
        ReferenceKind::Markup => {
            log::debug!("Cover reference {} is a page, scanning it", target);
            let bytes = container.read(&target)?;
            let page = ParsedDocument::from_bytes(&bytes, &target, MarkupSyntax::from_path(&target))?;
            let image = find_image(&page, &target)?;
            Ok(ResolvedImagePath::new(path::resolve(parent_dir(&target), &image)))
        }
        ReferenceKind::Unknown => Err(CoverError::UnsupportedCoverType(target)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eix_utils::archive::{ZipBuilder, ZipContainer};
    use std::io::Cursor;

    const CONTAINER: &[u8] = br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles>
</container>"#;

    fn epub(files: &[(&str, &[u8])]) -> ZipContainer<Cursor<Vec<u8>>> {
        let mut builder = ZipBuilder::new(Cursor::new(Vec::new()));
        builder
            .add_stored("mimetype", b"application/epub+zip")
            .unwrap();
        for (name, content) in files {
            builder.add_file(name, content).unwrap();
        }
        let cursor = builder.finish().unwrap();
        ZipContainer::from_reader(Cursor::new(cursor.into_inner())).unwrap()
    }

    #[test]
    fn test_guide_page_with_image() {
        let mut zip = epub(&[
            ("META-INF/container.xml", CONTAINER),
            (
                "OEBPS/content.opf",
                br#"<package xmlns="http://www.idpf.org/2007/opf"><guide><reference type="cover" href="cover.xhtml"/></guide></package>"#,
            ),
            (
                "OEBPS/cover.xhtml",
                br#"<html xmlns="http://www.w3.org/1999/xhtml"><body><img src="images/cover.jpg"/></body></html>"#,
            ),
            ("OEBPS/images/cover.jpg", b"\xFF\xD8\xFF"),
        ]);
        assert_eq!(resolve_cover(&mut zip).unwrap().as_str(), "OEBPS/images/cover.jpg");
    }

    #[test]
    fn test_spine_page_without_image() {
        let mut zip = epub(&[
            ("META-INF/container.xml", CONTAINER),
            (
                "OEBPS/content.opf",
                br#"<package><manifest><item id="p1" href="page1.xhtml"/></manifest><spine><itemref idref="p1"/></spine></package>"#,
            ),
            ("OEBPS/page1.xhtml", b"<html><body><p>It was a dark and stormy night.</p></body></html>"),
        ]);
        assert!(matches!(
            resolve_cover(&mut zip),
            Err(CoverError::ImageNotFoundInMarkup(_))
        ));
    }

    #[test]
    fn test_image_relative_to_page_directory() {
        let mut zip = epub(&[
            ("META-INF/container.xml", CONTAINER),
            (
                "OEBPS/content.opf",
                br#"<package><guide><reference type="cover" href="xhtml/cover%20page.xhtml"/></guide></package>"#,
            ),
            ("OEBPS/xhtml/cover page.xhtml", br#"<html><body><img src="../img/1_1.jpg"></body></html>"#),
            ("OEBPS/img/1_1.jpg", b"\xFF\xD8\xFF"),
        ]);
        assert_eq!(resolve_cover(&mut zip).unwrap().as_str(), "OEBPS/img/1_1.jpg");
    }

    #[test]
    fn test_direct_image_from_metadata() {
        let mut zip = epub(&[
            (
                "content.opf",
                br#"<package><metadata><meta name="cover" content="ci"/></metadata><manifest><item id="ci" href="/Images/Cover.PNG"/></manifest></package>"#,
            ),
        ]);
        assert_eq!(resolve_cover(&mut zip).unwrap().as_str(), "Images/Cover.PNG");
    }

    #[test]
    fn test_unsupported_reference() {
        let mut zip = epub(&[
            ("META-INF/container.xml", CONTAINER),
            (
                "OEBPS/content.opf",
                br#"<package><guide><reference type="cover" href="cover.gif"/></guide></package>"#,
            ),
        ]);
        assert!(matches!(
            resolve_cover(&mut zip),
            Err(CoverError::UnsupportedCoverType(ref p)) if p == "OEBPS/cover.gif"
        ));
    }

    #[test]
    fn test_missing_cover_page() {
        let mut zip = epub(&[
            ("META-INF/container.xml", CONTAINER),
            (
                "OEBPS/content.opf",
                br#"<package><guide><reference type="cover" href="gone.xhtml"/></guide></package>"#,
            ),
        ]);
        assert!(matches!(
            resolve_cover(&mut zip),
            Err(CoverError::EntryNotFound(_))
        ));
    }
}
