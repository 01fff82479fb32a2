//! Reading upload files from disk.
//!
//! Small files are read directly; large files are memory mapped and copied
//! out once. The declared format is inferred from the file extension unless
//! the caller supplies one.

// Memory mapping requires unsafe but is well-documented and safe for read-only access
#![allow(unsafe_code)]

use crate::core::DocumentFormat;
use crate::error::{IoError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Threshold for using memory mapping (1MB).
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Maximum upload size (200MB).
const MAX_UPLOAD_SIZE: u64 = 200 * 1024 * 1024;

/// Raw bytes of an uploaded file plus its declared format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// File name shown to the user.
    pub filename: String,
    /// Declared format.
    pub format: DocumentFormat,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Creates an upload from in-memory bytes.
    #[must_use]
    pub fn new(filename: impl Into<String>, format: DocumentFormat, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            format,
            bytes,
        }
    }

    /// Creates a plain-text upload.
    #[must_use]
    pub fn text(filename: impl Into<String>, text: &str) -> Self {
        Self::new(filename, DocumentFormat::Text, text.as_bytes().to_vec())
    }
}

/// Reads an upload from disk.
///
/// # Arguments
///
/// * `path` - Path to the file.
/// * `format` - Declared format; inferred from the extension when `None`.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or
/// [`crate::error::ExtractionError::UnsupportedFormat`] if no format is given
/// and the extension is not recognized.
///
/// # Examples
///
/// ```no_run
/// use casewise::io::read_upload;
///
/// let upload = read_upload("lecture-notes.pdf", None).unwrap();
/// ```
pub fn read_upload<P: AsRef<Path>>(path: P, format: Option<DocumentFormat>) -> Result<Upload> {
    let path = path.as_ref();
    let filename = path
        .file_name()
        .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy())
        .to_string();

    let format = match format {
        Some(f) => f,
        None => DocumentFormat::from_filename(&filename)?,
    };

    let bytes = read_bytes(path)?;
    tracing::debug!(file = %filename, %format, bytes = bytes.len(), "read upload");

    Ok(Upload {
        filename,
        format,
        bytes,
    })
}

/// Reads a whole file, memory mapping it when large.
///
/// # Errors
///
/// Returns an error if the file doesn't exist, is too large, or can't be read.
pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy().to_string();

    if !path.exists() {
        return Err(IoError::FileNotFound { path: path_str }.into());
    }

    let file = File::open(path).map_err(|e| IoError::ReadFailed {
        path: path_str.clone(),
        reason: e.to_string(),
    })?;

    let size = file
        .metadata()
        .map_err(|e| IoError::ReadFailed {
            path: path_str.clone(),
            reason: e.to_string(),
        })?
        .len();

    if size > MAX_UPLOAD_SIZE {
        return Err(IoError::ReadFailed {
            path: path_str,
            reason: format!("file too large: {size} bytes (max: {MAX_UPLOAD_SIZE} bytes)"),
        }
        .into());
    }

    if size >= MMAP_THRESHOLD {
        // Safety: the mapping is read-only and dropped before returning
        let mmap = unsafe {
            Mmap::map(&file).map_err(|e| IoError::MmapFailed {
                path: path_str.clone(),
                reason: e.to_string(),
            })?
        };
        Ok(mmap.to_vec())
    } else {
        let mut file = file;
        #[allow(clippy::cast_possible_truncation)]
        let mut buffer = Vec::with_capacity(size as usize);
        file.read_to_end(&mut buffer)
            .map_err(|e| IoError::ReadFailed {
                path: path_str,
                reason: e.to_string(),
            })?;
        Ok(buffer)
    }
}
