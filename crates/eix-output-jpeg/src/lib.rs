//! Turns an extracted cover image into the final JPEG.
//!
//! JPEGs are copied byte for byte; anything else goes through an external
//! converter invoked as `<convert> <input> <output>`.

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use eix_core::error::Result;
use eix_core::options::ExtractOptions;
use eix_core::plugin::ToolRunner;
use eix_utils::mime;

/// Copies or transcodes an image to the output path.
pub struct JpegMaterializer {
    convert_command: String,
    runner: Arc<dyn ToolRunner>,
}

impl JpegMaterializer {
    pub fn new(convert_command: impl Into<String>, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            convert_command: convert_command.into(),
            runner,
        }
    }

    pub fn from_options(options: &ExtractOptions, runner: Arc<dyn ToolRunner>) -> Self {
        Self::new(options.convert_command.clone(), runner)
    }

    /// Write `image` to `output` as a JPEG.
    ///
    /// A failed conversion leaves no file at `output`.
    pub fn materialize(&self, image: &Path, output: &Path) -> Result<()> {
        let name = image.to_string_lossy();
        if mime::is_jpeg(&name) {
            log::debug!("Copying {} to {}", image.display(), output.display());
            if let Err(e) = std::fs::copy(image, output) {
                remove_partial(output);
                return Err(e.into());
            }
            return Ok(());
        }

        log::debug!(
            "Converting {} to {} with {}",
            image.display(),
            output.display(),
            self.convert_command
        );
        let args: Vec<OsString> = vec![image.into(), output.into()];
        self.runner
            .run(&self.convert_command, &args)
            .inspect_err(|_| remove_partial(output))
    }
}

fn remove_partial(output: &Path) {
    if output.exists() {
        if let Err(e) = std::fs::remove_file(output) {
            log::warn!("Could not remove partial output {}: {}", output.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eix_core::error::CoverError;
    use std::sync::Mutex;

    /// Records invocations and optionally writes a half-finished output before failing.
    #[derive(Default)]
    struct FakeConvert {
        calls: Mutex<Vec<(String, Vec<OsString>)>>,
        fail: bool,
    }

    impl ToolRunner for FakeConvert {
        fn run(&self, program: &str, args: &[OsString]) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec()));
            std::fs::write(&args[1], b"partial")?;
            if self.fail {
                Err(CoverError::ConversionFailed("convert exited with 1".into()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_jpeg_is_copied() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("cover.JPG");
        std::fs::write(&image, b"\xFF\xD8\xFFdata").unwrap();
        let output = dir.path().join("book.jpg");

        let runner = Arc::new(FakeConvert::default());
        let materializer = JpegMaterializer::new("convert", runner.clone());
        materializer.materialize(&image, &output).unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"\xFF\xD8\xFFdata");
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_png_is_converted() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("cover.png");
        std::fs::write(&image, b"\x89PNG").unwrap();
        let output = dir.path().join("book.jpg");

        let runner = Arc::new(FakeConvert::default());
        let materializer = JpegMaterializer::new("magick", runner.clone());
        materializer.materialize(&image, &output).unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "magick");
        assert_eq!(calls[0].1, vec![OsString::from(&image), OsString::from(&output)]);
    }

    #[test]
    fn test_failed_conversion_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("cover.png");
        std::fs::write(&image, b"\x89PNG").unwrap();
        let output = dir.path().join("book.jpg");

        let runner = Arc::new(FakeConvert {
            fail: true,
            ..FakeConvert::default()
        });
        let materializer = JpegMaterializer::new("convert", runner);
        let err = materializer.materialize(&image, &output).unwrap_err();

        assert!(matches!(err, CoverError::ConversionFailed(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_jpeg_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let materializer =
            JpegMaterializer::new("convert", Arc::new(FakeConvert::default()));
        let err = materializer
            .materialize(&dir.path().join("gone.jpg"), &dir.path().join("out.jpg"))
            .unwrap_err();
        assert_eq!(err.kind(), "IoError");
    }
}
