//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;

use crate::core::{Chunk, DocumentSummary};
use crate::error::Error;
use crate::provider::ProviderResponse;
use crate::session::{SourceRef, Turn};

/// Characters of chunk text shown in listings.
const PREVIEW_LEN: usize = 80;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// A retrieval hit with its document name, for display.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// Document file name.
    pub filename: String,
    /// Chunk index within the document.
    pub chunk_index: usize,
    /// Overlap score.
    pub score: usize,
    /// Character offset of the chunk.
    pub start_offset: usize,
    /// Chunk text.
    pub text: String,
}

/// Whether a provider is usable, for `providers`.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    /// Short name used with `--provider`.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Configured model.
    pub model: String,
    /// Environment variable holding the key.
    pub env: &'static str,
    /// Whether a key is set.
    pub credential: bool,
}

/// A document left out of the session because it could not be read or extracted.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedDocument {
    /// Path as given on the command line.
    pub path: String,
    /// Stable error kind.
    pub kind: &'static str,
    /// Error message.
    pub message: String,
}

impl SkippedDocument {
    /// Records `error` against `path`.
    #[must_use]
    pub fn new(path: &std::path::Path, error: &Error) -> Self {
        Self {
            path: path.display().to_string(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Formats the list of skipped documents on its own.
#[must_use]
pub fn format_skipped(skipped: &[SkippedDocument], format: OutputFormat) -> String {
    if skipped.is_empty() {
        return String::new();
    }
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            for doc in skipped {
                let _ = writeln!(output, "Skipped {}: {}", doc.path, doc.message);
            }
            output.push('\n');
            output
        }
        OutputFormat::Json => format_json(&serde_json::json!({ "skipped": skipped })),
    }
}

/// Adds skipped documents to a command's formatted output.
///
/// Text output gets one leading line per document. JSON objects gain a
/// `skipped` array.
#[must_use]
pub fn with_skipped(output: String, skipped: &[SkippedDocument], format: OutputFormat) -> String {
    if skipped.is_empty() {
        return output;
    }
    match format {
        OutputFormat::Text => format_skipped(skipped, format) + &output,
        OutputFormat::Json => match serde_json::from_str::<serde_json::Value>(&output) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.insert("skipped".to_string(), serde_json::json!(skipped));
                format_json(&map)
            }
            _ => output,
        },
    }
}

/// Formats an error for display.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => format_json(&serde_json::json!({
            "error": {
                "kind": error.kind(),
                "message": error.to_string(),
            }
        })),
    }
}

/// Formats a completed turn: every provider's answer in order.
#[must_use]
pub fn format_turn(turn: &Turn, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = format_responses_text(&turn.responses);
            if !turn.sources.is_empty() {
                output.push_str(&format_sources_text(&turn.sources));
            }
            output
        }
        OutputFormat::Json => format_json(turn),
    }
}

fn format_responses_text(responses: &[ProviderResponse]) -> String {
    if responses.is_empty() {
        return "No providers configured.\n".to_string();
    }

    let mut output = String::new();
    output.push_str("## Multi-Model Analysis\n\n");
    for response in responses {
        let _ = writeln!(output, "### {} ({})\n", response.provider, response.model);
        match (&response.text, &response.error) {
            (Some(text), _) => {
                let _ = writeln!(output, "{}", text.trim_end());
            }
            (None, Some(error)) => {
                let _ = writeln!(output, "**Error** ({}): {}", error.category, error.message);
            }
            (None, None) => output.push_str("(no response)\n"),
        }
        let _ = writeln!(output, "\n_{} ms_\n\n---\n", response.elapsed_ms);
    }
    output
}

fn format_sources_text(sources: &[SourceRef]) -> String {
    let mut output = String::from("Sources:\n");
    for (i, source) in sources.iter().enumerate() {
        let _ = writeln!(
            output,
            "  [{}] {} chunk {} (score {})",
            i + 1,
            source.filename,
            source.chunk_index,
            source.score
        );
    }
    output
}

/// Formats a composed prompt.
#[must_use]
pub fn format_prompt(prompt: &str, sources: &[SearchHit], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{prompt}\n"),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct PromptOutput<'a> {
                prompt: &'a str,
                sources: &'a [SearchHit],
            }
            format_json(&PromptOutput { prompt, sources })
        }
    }
}

/// Formats retrieval results.
#[must_use]
pub fn format_search_hits(query: &str, hits: &[SearchHit], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if hits.is_empty() {
                return format!("No chunks retrieved for: {query}\n");
            }
            let mut output = String::new();
            let _ = writeln!(output, "Retrieved {} chunks for: {query}\n", hits.len());
            let _ = writeln!(
                output,
                "{:<4} {:<24} {:<6} {:<6} Preview",
                "#", "Document", "Chunk", "Score"
            );
            output.push_str(&"-".repeat(80));
            output.push('\n');
            for (i, hit) in hits.iter().enumerate() {
                let _ = writeln!(
                    output,
                    "{:<4} {:<24} {:<6} {:<6} {}",
                    i + 1,
                    truncate(&hit.filename, 24),
                    hit.chunk_index,
                    hit.score,
                    single_line(&truncate(&hit.text, PREVIEW_LEN - 40))
                );
            }
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct SearchOutput<'a> {
                query: &'a str,
                count: usize,
                results: &'a [SearchHit],
            }
            format_json(&SearchOutput {
                query,
                count: hits.len(),
                results: hits,
            })
        }
    }
}

/// Formats chunk boundaries of one document.
#[must_use]
pub fn format_chunks(filename: &str, chunks: &[Chunk], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(output, "{filename}: {} chunks", chunks.len());
            for chunk in chunks {
                let _ = writeln!(
                    output,
                    "  [{}] chars {}..{} ({} chars) {}",
                    chunk.index,
                    chunk.start_offset,
                    chunk.end_offset(),
                    chunk.char_len(),
                    single_line(&truncate(&chunk.text, PREVIEW_LEN - 30))
                );
            }
            output
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ChunksOutput<'a> {
                filename: &'a str,
                count: usize,
                chunks: &'a [Chunk],
            }
            format_json(&ChunksOutput {
                filename,
                count: chunks.len(),
                chunks,
            })
        }
    }
}

/// Formats extracted text.
#[must_use]
pub fn format_extracted(filename: &str, text: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if text.ends_with('\n') {
                text.to_string()
            } else {
                format!("{text}\n")
            }
        }
        OutputFormat::Json => format_json(&serde_json::json!({
            "filename": filename,
            "chars": text.chars().count(),
            "text": text,
        })),
    }
}

/// Formats a document list.
#[must_use]
pub fn format_documents(documents: &[DocumentSummary], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_documents_text(documents),
        OutputFormat::Json => format_json(&documents),
    }
}

fn format_documents_text(documents: &[DocumentSummary]) -> String {
    if documents.is_empty() {
        return "No documents loaded.\n".to_string();
    }

    let mut output = String::new();
    output.push_str("Documents:\n");
    let _ = writeln!(
        output,
        "{:<4} {:<30} {:<6} {:<10} Chunks",
        "ID", "File", "Type", "Size"
    );
    output.push_str(&"-".repeat(60));
    output.push('\n');

    for doc in documents {
        let _ = writeln!(
            output,
            "{:<4} {:<30} {:<6} {:<10} {}",
            doc.id,
            truncate(&doc.filename, 30),
            doc.format,
            format_size(doc.size),
            doc.chunks
        );
    }
    output
}

/// Formats provider availability.
#[must_use]
pub fn format_providers(providers: &[ProviderStatus], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            let _ = writeln!(
                output,
                "{:<8} {:<12} {:<28} {:<20} Key",
                "ID", "Name", "Model", "Env"
            );
            output.push_str(&"-".repeat(76));
            output.push('\n');
            for p in providers {
                let _ = writeln!(
                    output,
                    "{:<8} {:<12} {:<28} {:<20} {}",
                    p.id,
                    p.name,
                    truncate(&p.model, 28),
                    p.env,
                    if p.credential { "set" } else { "missing" }
                );
            }
            output
        }
        OutputFormat::Json => format_json(&providers),
    }
}

/// Formats the conversation history.
#[must_use]
pub fn format_history(turns: &[Turn], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if turns.is_empty() {
                return "No questions asked yet.\n".to_string();
            }
            let mut output = String::new();
            for (i, turn) in turns.iter().enumerate() {
                let answered = turn.responses.iter().filter(|r| r.is_success()).count();
                let _ = writeln!(
                    output,
                    "{:>3}. [{}] {} ({answered}/{} answered, {} sources)",
                    i + 1,
                    turn.query.kind,
                    single_line(&truncate(&turn.query.text, 60)),
                    turn.responses.len(),
                    turn.sources.len()
                );
            }
            output
        }
        OutputFormat::Json => format_json(&turns),
    }
}

/// Formats the result of writing default templates.
#[must_use]
pub fn format_templates_written(dir: &str, paths: &[PathBuf], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            if paths.is_empty() {
                return format!("Templates already present in {dir}\n");
            }
            let mut output = String::new();
            let _ = writeln!(output, "Wrote {} template(s):", paths.len());
            for path in paths {
                let _ = writeln!(output, "  {}", path.display());
            }
            output
        }
        OutputFormat::Json => format_json(&serde_json::json!({
            "dir": dir,
            "written": paths,
        })),
    }
}

/// Formats a value as JSON.
fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).map_or_else(|_| "{}\n".to_string(), |s| s + "\n")
}

/// Formats a byte size as human-readable.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Truncates a string to `max_chars` characters with an ellipsis.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars <= 3 {
        s.chars().take(max_chars).collect()
    } else {
        let head: String = s.chars().take(max_chars - 3).collect();
        format!("{head}...")
    }
}

/// Collapses line breaks so a preview fits on one line.
fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DocumentFormat, DocumentId, Query};
    use crate::error::PromptError;
    use crate::provider::ProviderFailure;

    fn turn() -> Turn {
        Turn {
            query: Query::new("What is selective mutism?"),
            sources: vec![SourceRef {
                document_id: DocumentId(1),
                filename: "anxiety.pdf".to_string(),
                chunk_index: 4,
                score: 3,
            }],
            responses: vec![
                ProviderResponse {
                    provider: "OpenAI GPT".to_string(),
                    model: "gpt-4".to_string(),
                    text: Some("A childhood anxiety disorder.".to_string()),
                    error: None,
                    elapsed_ms: 900,
                },
                ProviderResponse {
                    provider: "Claude".to_string(),
                    model: "claude-sonnet-4-20250514".to_string(),
                    text: None,
                    error: Some(ProviderFailure {
                        category: "auth",
                        message: "authentication failed: bad key".to_string(),
                    }),
                    elapsed_ms: 120,
                },
            ],
            timestamp: 0,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("unknown"), OutputFormat::Text);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(100), "100 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn test_turn_text_lists_every_provider_in_order() {
        let text = format_turn(&turn(), OutputFormat::Text);
        assert!(text.starts_with("## Multi-Model Analysis"));
        let openai = text.find("### OpenAI GPT (gpt-4)").unwrap();
        let claude = text.find("### Claude").unwrap();
        assert!(openai < claude);
        assert!(text.contains("A childhood anxiety disorder."));
        assert!(text.contains("**Error** (auth): authentication failed: bad key"));
        assert!(text.contains("[1] anxiety.pdf chunk 4 (score 3)"));
    }

    #[test]
    fn test_turn_json() {
        let json: serde_json::Value =
            serde_json::from_str(&format_turn(&turn(), OutputFormat::Json)).unwrap();
        assert_eq!(json["responses"].as_array().unwrap().len(), 2);
        assert_eq!(json["responses"][1]["error"]["category"], "auth");
        assert_eq!(json["sources"][0]["filename"], "anxiety.pdf");
    }

    #[test]
    fn test_no_providers() {
        let mut turn = turn();
        turn.responses.clear();
        turn.sources.clear();
        assert_eq!(
            format_turn(&turn, OutputFormat::Text),
            "No providers configured.\n"
        );
    }

    #[test]
    fn test_format_error_json() {
        let err: Error = PromptError::EmptyQuery.into();
        let json: serde_json::Value =
            serde_json::from_str(&format_error(&err, OutputFormat::Json)).unwrap();
        assert_eq!(json["error"]["kind"], "empty_query");
        assert_eq!(
            format_error(&err, OutputFormat::Text),
            "prompt error: query is empty"
        );
    }

    #[test]
    fn test_format_documents() {
        assert_eq!(
            format_documents(&[], OutputFormat::Text),
            "No documents loaded.\n"
        );
        let docs = vec![DocumentSummary {
            id: DocumentId(3),
            filename: "dsm-notes.docx".to_string(),
            format: DocumentFormat::Docx,
            size: 2048,
            chunks: 4,
            preview: String::new(),
        }];
        let text = format_documents(&docs, OutputFormat::Text);
        assert!(text.contains("dsm-notes.docx"));
        assert!(text.contains("2.0 KB"));
        assert!(text.contains("docx"));
    }

    #[test]
    fn test_format_chunks_text() {
        let chunks = vec![
            Chunk::new(DocumentId(1), 0, "first\nwindow".to_string(), 0, 0..12),
            Chunk::new(DocumentId(1), 1, "second".to_string(), 10, 10..16),
        ];
        let text = format_chunks("a.txt", &chunks, OutputFormat::Text);
        assert!(text.starts_with("a.txt: 2 chunks"));
        assert!(text.contains("[0] chars 0..12 (12 chars) first window"));
        assert!(text.contains("[1] chars 10..16"));
    }

    #[test]
    fn test_search_hits_empty() {
        let text = format_search_hits("tics", &[], OutputFormat::Text);
        assert_eq!(text, "No chunks retrieved for: tics\n");
    }

    fn skipped() -> Vec<SkippedDocument> {
        let err: Error = crate::error::ExtractionError::failure("docx", "invalid Zip archive").into();
        vec![SkippedDocument::new(std::path::Path::new("broken.docx"), &err)]
    }

    #[test]
    fn test_with_skipped_text() {
        let text = with_skipped("body\n".to_string(), &skipped(), OutputFormat::Text);
        assert!(text.starts_with("Skipped broken.docx: "));
        assert!(text.ends_with("\nbody\n"));
        assert_eq!(with_skipped("body\n".to_string(), &[], OutputFormat::Text), "body\n");
    }

    #[test]
    fn test_with_skipped_json() {
        let output = format_search_hits("tics", &[], OutputFormat::Json);
        let json: serde_json::Value =
            serde_json::from_str(&with_skipped(output, &skipped(), OutputFormat::Json)).unwrap();
        assert_eq!(json["query"], "tics");
        assert_eq!(json["skipped"][0]["path"], "broken.docx");
        assert_eq!(json["skipped"][0]["kind"], "extraction_failure");
    }
}
