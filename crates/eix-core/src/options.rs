//! Extraction options shared by the batch driver and the cover sources.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// All options controlling a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    pub verbose: u8,
    /// Number of files processed concurrently.
    pub jobs: usize,
    /// Stop dispatching files after the first failure.
    pub fail_fast: bool,

    // -- External tools --
    /// Image converter invoked as `<convert_command> <input> <output>`.
    pub convert_command: String,
    /// Ghostscript executable used to render the first page of PDFs.
    pub gs_command: String,
    /// PDF render resolution in DPI.
    pub pdf_resolution: u16,
    /// Seconds an external tool may run before it is killed. 0 disables the limit.
    pub tool_timeout_secs: u64,

    /// Parent directory for the batch scratch directory. Defaults to the system temp dir.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            verbose: 0,
            jobs: 1,
            fail_fast: false,
            convert_command: "convert".to_string(),
            gs_command: "gs".to_string(),
            pdf_resolution: 250,
            tool_timeout_secs: 120,
            scratch_dir: None,
        }
    }
}

impl ExtractOptions {
    pub fn tool_timeout(&self) -> Option<Duration> {
        match self.tool_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
