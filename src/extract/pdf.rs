//! PDF text extraction.
//!
//! Text is pulled out page by page by `pdf-extract`, then runs of blank
//! lines and trailing spaces left behind by the layout are collapsed.

use regex::Regex;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::OnceLock;

use crate::error::ExtractionError;

/// Extracts the text of every page.
pub(super) fn extract_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let raw = guarded(|| pdf_extract::extract_text_from_mem(bytes))?;
    Ok(normalize(&raw))
}

/// Runs the parser, turning both its errors and its panics into extraction failures.
///
/// pdf-extract panics on some malformed inputs instead of returning an error.
/// Catching it needs unwinding, so no profile may set `panic = "abort"`.
fn guarded<T, E: ToString>(parse: impl FnOnce() -> Result<T, E>) -> Result<T, ExtractionError> {
    match catch_unwind(AssertUnwindSafe(parse)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ExtractionError::failure("pdf", e)),
        Err(_) => {
            tracing::warn!("pdf parser panicked");
            Err(ExtractionError::failure("pdf", "malformed PDF structure"))
        }
    }
}

#[allow(clippy::expect_used)]
fn normalize(raw: &str) -> String {
    static TRAILING_SPACES: OnceLock<Regex> = OnceLock::new();
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();

    let trailing =
        TRAILING_SPACES.get_or_init(|| Regex::new(r"(?m)[ \t]+$").expect("valid regex"));
    let blanks = BLANK_RUNS.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"));

    let text = trailing.replace_all(raw, "");
    blanks.replace_all(&text, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_layout_whitespace() {
        let raw = "\n\nPage one   \n\n\n\n\nPage two\t\n";
        assert_eq!(normalize(raw), "Page one\n\nPage two");
    }

    #[test]
    fn test_normalize_keeps_single_blank_lines() {
        assert_eq!(normalize("a\n\nb\nc"), "a\n\nb\nc");
    }

    #[test]
    fn test_garbage_is_failure() {
        let err = extract_text(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, ExtractionError::ExtractionFailure { .. }));
    }

    #[test]
    #[allow(clippy::panic)]
    fn test_parser_panic_is_failure() {
        let err = guarded(|| -> Result<String, String> { panic!("broken xref table") }).unwrap_err();
        assert_eq!(err.to_string(), "failed to extract pdf text: malformed PDF structure");
    }

    #[test]
    fn test_release_profile_unwinds() {
        let manifest = include_str!("../../Cargo.toml");
        assert!(
            manifest
                .lines()
                .all(|line| line.split('#').next().unwrap_or("").replace(' ', "") != "panic=\"abort\""),
            "panic = \"abort\" would bypass the parser panic guard"
        );
    }
}
