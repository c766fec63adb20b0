//! First-page rendering via Ghostscript.

use std::ffi::OsString;
use std::path::Path;

/// Arguments that make Ghostscript render page 1 of `pdf` into `output` as
/// a JPEG at `resolution` DPI.
pub fn ghostscript_args(pdf: &Path, output: &Path, resolution: u16) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-dSAFER",
        "-dBATCH",
        "-dNOPAUSE",
        "-dNOPROMPT",
        "-dMaxBitmap=500000000",
        "-dAlignToPixels=0",
        "-dUseCropBox",
        "-dGridFitTT=2",
        "-sDEVICE=jpeg",
        "-dTextAlphaBits=4",
        "-dGraphicsAlphaBits=4",
        "-dUseCIEColor",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();

    args.push(format!("-r{}x{}", resolution, resolution).into());
    args.push("-dFirstPage=1".into());
    args.push("-dLastPage=1".into());

    let mut output_arg = OsString::from("-sOUTPUTFILE=");
    output_arg.push(output);
    args.push(output_arg);
    args.push(pdf.into());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ghostscript_args() {
        let args = ghostscript_args(Path::new("/books/a.pdf"), Path::new("/books/a.jpg"), 250);
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(args[0], "-dSAFER");
        assert!(args.contains(&"-sDEVICE=jpeg".to_string()));
        assert!(args.contains(&"-r250x250".to_string()));
        assert!(args.contains(&"-dFirstPage=1".to_string()));
        assert!(args.contains(&"-dLastPage=1".to_string()));
        assert_eq!(args[args.len() - 2], "-sOUTPUTFILE=/books/a.jpg");
        assert_eq!(args[args.len() - 1], "/books/a.pdf");
    }

    #[test]
    fn test_resolution_is_configurable() {
        let args = ghostscript_args(Path::new("a.pdf"), Path::new("a.jpg"), 72);
        assert!(args.iter().any(|a| a == "-r72x72"));
    }
}
