//! Local file I/O module
//!
//! Filler-file generation and archiving on the filesystem under test.

pub mod generator;

pub use generator::{remove_if_exists, LargeFileGenerator};
