//! EPUB cover source.
//!
//! Finds the cover image inside the archive, extracts it into the file's
//! working directory and hands it to the JPEG materializer.

pub mod cover;
pub mod locate;
pub mod resolve;
pub mod scan;

use std::path::Path;

use eix_core::book::{BookKind, SourceDocument};
use eix_core::error::Result;
use eix_core::plugin::CoverSource;
use eix_output_jpeg::JpegMaterializer;
use eix_utils::archive::{Container, ZipContainer};

pub use resolve::resolve_cover;

pub struct EpubCoverSource {
    materializer: JpegMaterializer,
}

impl EpubCoverSource {
    pub fn new(materializer: JpegMaterializer) -> Self {
        Self { materializer }
    }
}

impl CoverSource for EpubCoverSource {
    fn name(&self) -> &str {
        "EPUB"
    }

    fn kind(&self) -> BookKind {
        BookKind::Epub
    }

    fn produce_cover(&self, source: &SourceDocument, output: &Path, workdir: &Path) -> Result<()> {
        let mut container = ZipContainer::open(source.path())?;
        let image = resolve_cover(&mut container)?;
        log::debug!("Cover image of {} is {}", source.path().display(), image);

        let extracted = container.extract(image.as_str(), workdir)?;
        self.materializer.materialize(&extracted, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eix_core::error::CoverError;
    use eix_core::plugin::ToolRunner;
    use eix_utils::archive::ZipBuilder;
    use std::ffi::OsString;
    use std::sync::Arc;

    struct NoTools;

    impl ToolRunner for NoTools {
        fn run(&self, program: &str, _args: &[OsString]) -> Result<()> {
            Err(CoverError::ConversionToolMissing(program.to_string()))
        }
    }

    fn source() -> EpubCoverSource {
        EpubCoverSource::new(JpegMaterializer::new("convert", Arc::new(NoTools)))
    }

    fn write_epub(path: &Path, cover_name: &str) {
        let mut builder = ZipBuilder::create(path).unwrap();
        builder
            .add_stored("mimetype", b"application/epub+zip")
            .unwrap();
        builder
            .add_file(
                "META-INF/container.xml",
                br#"<container><rootfiles><rootfile full-path="OEBPS/content.opf"/></rootfiles></container>"#,
            )
            .unwrap();
        let opf = format!(
            r#"<package><metadata><meta name="cover" content="img"/></metadata><manifest><item id="img" href="images/{}"/></manifest></package>"#,
            cover_name
        );
        builder.add_file("OEBPS/content.opf", opf.as_bytes()).unwrap();
        builder
            .add_file(&format!("OEBPS/images/{}", cover_name), b"\xFF\xD8\xFFcover")
            .unwrap();
        builder.finish().unwrap();
    }

    #[test]
    fn test_produce_jpeg_cover() {
        let dir = tempfile::tempdir().unwrap();
        let workdir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Galway Girl.epub");
        write_epub(&path, "cover.jpg");

        let doc = SourceDocument::from_path(&path).unwrap();
        source()
            .produce_cover(&doc, &doc.output_path(), workdir.path())
            .unwrap();

        assert_eq!(
            std::fs::read(dir.path().join("Galway Girl.jpg")).unwrap(),
            b"\xFF\xD8\xFFcover"
        );
        assert!(workdir.path().join("cover.jpg").exists());
    }

    #[test]
    fn test_png_cover_without_converter() {
        let dir = tempfile::tempdir().unwrap();
        let workdir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");
        write_epub(&path, "cover.png");

        let doc = SourceDocument::from_path(&path).unwrap();
        let err = source()
            .produce_cover(&doc, &doc.output_path(), workdir.path())
            .unwrap_err();
        assert!(matches!(err, CoverError::ConversionToolMissing(_)));
        assert!(!doc.output_path().exists());
    }

    #[test]
    fn test_corrupt_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.epub");
        std::fs::write(&path, b"this is not a zip").unwrap();

        let doc = SourceDocument::from_path(&path).unwrap();
        let err = source()
            .produce_cover(&doc, &doc.output_path(), dir.path())
            .unwrap_err();
        assert!(matches!(err, CoverError::CorruptArchive(_)));
    }
}
