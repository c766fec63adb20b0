//! ZIP container access for EPUB archives.

use std::fs::File;
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};

use zip::read::ZipArchive;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use eix_core::error::{CoverError, Result};

/// One entry of an open container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Archive-internal, `/`-separated path.
    pub name: String,
    /// Uncompressed size in bytes.
    pub size: u64,
}

/// Read-only view of an e-book container.
pub trait Container {
    /// All entries, in archive order.
    fn entries(&self) -> &[ArchiveEntry];

    fn contains(&self, name: &str) -> bool {
        self.entries().iter().any(|e| e.name == name)
    }

    /// Read an entry into memory.
    fn read(&mut self, name: &str) -> Result<Vec<u8>>;

    /// Write an entry into `dest_dir` under its base name and return the new file's path.
    fn extract(&mut self, name: &str, dest_dir: &Path) -> Result<PathBuf>;
}

/// A [`Container`] backed by a ZIP archive.
pub struct ZipContainer<R: Read + Seek> {
    archive: ZipArchive<R>,
    entries: Vec<ArchiveEntry>,
}

impl ZipContainer<File> {
    /// Open the archive at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file).map_err(|e| match e {
            CoverError::CorruptArchive(msg) => {
                CoverError::CorruptArchive(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }
}

impl<R: Read + Seek> ZipContainer<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| CoverError::CorruptArchive(e.to_string()))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let Some(name) = archive.name_for_index(i).map(|s| s.to_string()) else {
                continue;
            };
            if name.ends_with('/') {
                continue;
            }
            let size = archive.by_index_raw(i).map(|f| f.size()).unwrap_or(0);
            entries.push(ArchiveEntry { name, size });
        }

        Ok(Self { archive, entries })
    }
}

impl<R: Read + Seek> Container for ZipContainer<R> {
    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self.archive.by_name(name).map_err(|e| entry_error(name, e))?;
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .map_err(|e| CoverError::CorruptArchive(format!("Failed to read '{}': {}", name, e)))?;
        Ok(buf)
    }

    fn extract(&mut self, name: &str, dest_dir: &Path) -> Result<PathBuf> {
        let file_name = name
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| CoverError::EntryNotFound(name.to_string()))?;

        let mut entry = self.archive.by_name(name).map_err(|e| entry_error(name, e))?;
        let out_path = dest_dir.join(file_name);
        let mut outfile = File::create(&out_path)?;
        io::copy(&mut entry, &mut outfile)?;

        log::debug!("Extracted {} to {}", name, out_path.display());
        Ok(out_path)
    }
}

fn entry_error(name: &str, err: ZipError) -> CoverError {
    match err {
        ZipError::FileNotFound => CoverError::EntryNotFound(name.to_string()),
        other => CoverError::CorruptArchive(format!("Entry '{}': {}", name, other)),
    }
}

/// Builder for ZIP archives, used to assemble EPUB fixtures.
pub struct ZipBuilder<W: Write + Seek> {
    writer: ZipWriter<W>,
}

impl ZipBuilder<File> {
    /// Create a new ZIP file at the given path.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write + Seek> ZipBuilder<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: ZipWriter::new(writer),
        }
    }

    /// Add a file entry with the given content.
    pub fn add_file(&mut self, name: &str, content: &[u8]) -> io::Result<()> {
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        self.writer.start_file(name, options)?;
        self.writer.write_all(content)?;
        Ok(())
    }

    /// Add a file entry stored without compression (the EPUB `mimetype` entry).
    pub fn add_stored(&mut self, name: &str, content: &[u8]) -> io::Result<()> {
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        self.writer.start_file(name, options)?;
        self.writer.write_all(content)?;
        Ok(())
    }

    /// Finish writing and hand back the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        Ok(self.writer.finish()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> ZipContainer<Cursor<Vec<u8>>> {
        let mut builder = ZipBuilder::new(Cursor::new(Vec::new()));
        builder
            .add_stored("mimetype", b"application/epub+zip")
            .unwrap();
        builder.add_file("OEBPS/content.opf", b"<package/>").unwrap();
        builder.add_file("OEBPS/images/cover.jpg", b"\xFF\xD8\xFFjpeg").unwrap();
        let cursor = builder.finish().unwrap();
        ZipContainer::from_reader(Cursor::new(cursor.into_inner())).unwrap()
    }

    #[test]
    fn test_entries() {
        let container = sample();
        let names: Vec<_> = container.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["mimetype", "OEBPS/content.opf", "OEBPS/images/cover.jpg"]
        );
        assert_eq!(container.entries()[1].size, 10);
        assert!(container.contains("OEBPS/content.opf"));
        assert!(!container.contains("OEBPS/missing.opf"));
    }

    #[test]
    fn test_read() {
        let mut container = sample();
        assert_eq!(container.read("OEBPS/content.opf").unwrap(), b"<package/>");
        assert!(matches!(
            container.read("nope.xml"),
            Err(CoverError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_extract_uses_base_name() {
        let mut container = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = container
            .extract("OEBPS/images/cover.jpg", dir.path())
            .unwrap();
        assert_eq!(path, dir.path().join("cover.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"\xFF\xD8\xFFjpeg");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        assert!(matches!(
            container.extract("OEBPS/images/back.jpg", dir.path()),
            Err(CoverError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_archive() {
        let result = ZipContainer::from_reader(Cursor::new(b"not a zip file".to_vec()));
        assert!(matches!(result, Err(CoverError::CorruptArchive(_))));
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");
        let mut builder = ZipBuilder::create(&path).unwrap();
        builder.add_file("META-INF/container.xml", b"<container/>").unwrap();
        builder.finish().unwrap();

        let container = ZipContainer::open(&path).unwrap();
        assert!(container.contains("META-INF/container.xml"));
    }
}
