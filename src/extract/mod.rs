//! Text extraction from uploaded documents.
//!
//! Turns the raw bytes of an upload into a single string according to its
//! declared format. The extractor never keeps the input bytes.

mod docx;
#[cfg(feature = "pdf")]
mod pdf;

use crate::core::DocumentFormat;
use crate::error::{ExtractionError, Result};

/// Extracts plain text from `bytes` interpreted as `format`.
///
/// # Errors
///
/// Returns [`ExtractionError::ExtractionFailure`] if the bytes cannot be
/// parsed as the declared format, or [`ExtractionError::UnsupportedFormat`]
/// for PDF input when the crate is built without the `pdf` feature.
///
/// # Examples
///
/// ```
/// use casewise::core::DocumentFormat;
/// use casewise::extract::extract;
///
/// let text = extract(b"# Anxiety\nNotes", DocumentFormat::Markdown).unwrap();
/// assert_eq!(text, "# Anxiety\nNotes");
/// ```
pub fn extract(bytes: &[u8], format: DocumentFormat) -> Result<String> {
    let text = match format {
        DocumentFormat::Text | DocumentFormat::Markdown => decode_utf8(bytes, format)?,
        DocumentFormat::Docx => docx::extract_text(bytes)?,
        DocumentFormat::Pdf => extract_pdf(bytes)?,
    };
    tracing::debug!(%format, bytes = bytes.len(), chars = text.len(), "extracted text");
    Ok(text)
}

fn decode_utf8(bytes: &[u8], format: DocumentFormat) -> std::result::Result<String, ExtractionError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes)
        .map(ToString::to_string)
        .map_err(|e| {
            ExtractionError::failure(
                format.as_str(),
                format!("invalid UTF-8 at byte offset {}", e.valid_up_to()),
            )
        })
}

#[cfg(feature = "pdf")]
fn extract_pdf(bytes: &[u8]) -> std::result::Result<String, ExtractionError> {
    pdf::extract_text(bytes)
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_bytes: &[u8]) -> std::result::Result<String, ExtractionError> {
    Err(ExtractionError::UnsupportedFormat {
        format: "pdf (built without the `pdf` feature)".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_plain_text() {
        let text = extract("Separation anxiety".as_bytes(), DocumentFormat::Text).unwrap();
        assert_eq!(text, "Separation anxiety");
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let text = extract(b"\xEF\xBB\xBFnotes", DocumentFormat::Text).unwrap();
        assert_eq!(text, "notes");
    }

    #[test]
    fn test_invalid_utf8_is_extraction_failure() {
        let err = extract(&[b'o', b'k', 0xff, 0xfe], DocumentFormat::Text).unwrap_err();
        assert!(matches!(
            err,
            Error::Extraction(ExtractionError::ExtractionFailure { .. })
        ));
        assert!(err.to_string().contains("byte offset 2"));
    }

    #[test]
    fn test_corrupt_docx_is_extraction_failure() {
        let err = extract(b"not a zip archive", DocumentFormat::Docx).unwrap_err();
        assert_eq!(err.kind(), "extraction_failure");
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_corrupt_pdf_is_extraction_failure() {
        let err = extract(b"%PDF-1.4 garbage", DocumentFormat::Pdf).unwrap_err();
        assert_eq!(err.kind(), "extraction_failure");
    }

    #[cfg(not(feature = "pdf"))]
    #[test]
    fn test_pdf_unsupported_without_feature() {
        let err = extract(b"%PDF-1.4", DocumentFormat::Pdf).unwrap_err();
        assert_eq!(err.kind(), "unsupported_format");
    }
}
