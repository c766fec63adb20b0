//! Shared helpers for eix: archive access, markup parsing, path resolution
//! and external tool invocation.

pub mod archive;
pub mod encoding;
pub mod mime;
pub mod path;
pub mod process;
pub mod xml;
