//! I/O utilities for casewise.
//!
//! Reads upload files from disk, with memory mapping for large files.

pub mod reader;

pub use reader::{Upload, read_bytes, read_upload};
