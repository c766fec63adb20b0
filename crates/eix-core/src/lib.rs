//! Core types for eix: the data model, error taxonomy, options, cover-source
//! traits and the batch driver that ties them together.

pub mod batch;
pub mod book;
pub mod error;
pub mod options;
pub mod plugin;
