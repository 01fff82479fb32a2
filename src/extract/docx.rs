//! DOCX text extraction.
//!
//! A DOCX file is a zip container; the body text lives in
//! `word/document.xml` as WordprocessingML. Text runs (`w:t`) are joined,
//! every paragraph (`w:p`) ends with a newline, `w:tab` becomes a tab and
//! `w:br`/`w:cr` become newlines. Everything else (styles, tables' layout,
//! headers, footnotes) is ignored.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::error::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extracts the body text of a DOCX file.
pub(super) fn extract_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractionError::failure("docx", e))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::failure("docx", format!("{DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::failure("docx", e))?;

    text_from_document_xml(&xml)
}

/// Walks WordprocessingML and collects its visible text.
pub(super) fn text_from_document_xml(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"w:t" {
                    in_run_text = true;
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_run_text => {
                let run = e
                    .unescape()
                    .map_err(|err| ExtractionError::failure("docx", err))?;
                text.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::failure(
                    "docx",
                    format!(
                        "XML parse error at position {}: {e}",
                        reader.buffer_position()
                    ),
                ));
            }
            _ => {}
        }
    }

    Ok(text)
}
