//! CLI command implementations.
//!
//! Contains the business logic for each CLI command. Commands return their
//! output as a string; only `chat` writes incrementally.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;

use crate::chunking::FixedChunker;
use crate::cli::output::{
    OutputFormat, ProviderStatus, SearchHit, SkippedDocument, format_chunks, format_documents,
    format_error, format_extracted, format_history, format_prompt, format_providers,
    format_search_hits, format_skipped, format_templates_written, format_turn, with_skipped,
};
use crate::cli::parser::{Cli, Commands, DocumentArgs, ProviderArgs, QueryArgs, parse_doc_type};
use crate::core::{DocumentId, Query, QueryKind};
use crate::error::{CommandError, Error, Result};
use crate::extract::extract;
use crate::io::read_upload;
use crate::prompt::{PromptComposer, PromptTemplate};
use crate::provider::{Dispatcher, ProviderKind};
use crate::session::Session;

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let template_dir = cli.template_dir.as_deref();

    match &cli.command {
        Commands::Ask {
            query,
            documents,
            providers,
        } => cmd_ask(query, documents, providers, template_dir, format),
        Commands::Prompt { query, documents } => {
            cmd_prompt(query, documents, template_dir, format)
        }
        Commands::Search { query, documents } => cmd_search(query, documents, format),
        Commands::Chunk {
            file,
            doc_type,
            chunk_size,
            overlap,
        } => cmd_chunk(file, doc_type.as_deref(), *chunk_size, *overlap, format),
        Commands::Extract { file, doc_type } => cmd_extract(file, doc_type.as_deref(), format),
        Commands::Providers { providers } => Ok(cmd_providers(providers, format)),
        Commands::Chat {
            documents,
            providers,
            kind,
        } => cmd_chat(documents, providers, kind, template_dir, format),
        Commands::InitTemplates { dir } => cmd_init_templates(dir.as_deref(), format),
    }
}

/// Creates a session and ingests the documents named on the command line.
///
/// A document that cannot be read or extracted is logged and returned in
/// the skipped list; the others are still ingested. With `--strict` the
/// first failure is returned instead.
fn open_session(
    documents: &DocumentArgs,
    template_dir: Option<&Path>,
) -> Result<(Session, Vec<SkippedDocument>)> {
    let composer = PromptComposer::new(PromptTemplate::load(template_dir));
    let mut session = Session::new(documents.session_config())?.with_composer(composer);
    let mut skipped = Vec::new();

    let mut paths = Vec::with_capacity(documents.documents.len());
    let mut uploads = Vec::with_capacity(documents.documents.len());
    for path in &documents.documents {
        match read_upload(path, None) {
            Ok(upload) => {
                paths.push(path.as_path());
                uploads.push(upload);
            }
            Err(e) if documents.strict => return Err(e),
            Err(e) => skipped.push(skip(path, &e)),
        }
    }

    for (path, result) in paths.into_iter().zip(session.ingest_all(&uploads)) {
        if let Err(e) = result {
            if documents.strict {
                return Err(e);
            }
            skipped.push(skip(path, &e));
        }
    }
    Ok((session, skipped))
}

fn skip(path: &Path, error: &Error) -> SkippedDocument {
    tracing::warn!(path = %path.display(), kind = error.kind(), "skipping document: {error}");
    SkippedDocument::new(path, error)
}

fn build_dispatcher(providers: &ProviderArgs) -> Result<Dispatcher> {
    Ok(Dispatcher::from_configs(
        &providers.selected_configs()?,
        providers.settings()?,
    ))
}

fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            CommandError::ExecutionFailed(format!("failed to start async runtime: {e}")).into()
        })
}

fn search_hits(session: &Session, text: &str) -> Vec<SearchHit> {
    session
        .retrieve(text)
        .into_iter()
        .map(|hit| SearchHit {
            filename: session
                .document(hit.chunk.document_id)
                .map_or_else(String::new, |doc| doc.filename.clone()),
            chunk_index: hit.chunk.index,
            score: hit.score,
            start_offset: hit.chunk.start_offset,
            text: hit.chunk.text.clone(),
        })
        .collect()
}

fn cmd_ask(
    query: &QueryArgs,
    documents: &DocumentArgs,
    providers: &ProviderArgs,
    template_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let query = query.to_query()?;
    let dispatcher = build_dispatcher(providers)?;
    let (mut session, skipped) = open_session(documents, template_dir)?;

    let turn = runtime()?.block_on(session.ask(query, &dispatcher))?;
    Ok(with_skipped(format_turn(&turn, format), &skipped, format))
}

fn cmd_prompt(
    query: &QueryArgs,
    documents: &DocumentArgs,
    template_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let query = query.to_query()?;
    let (session, skipped) = open_session(documents, template_dir)?;

    let prompt = session.compose(&query)?;
    let hits = search_hits(&session, &query.text);
    Ok(with_skipped(format_prompt(&prompt, &hits, format), &skipped, format))
}

fn cmd_search(query: &str, documents: &DocumentArgs, format: OutputFormat) -> Result<String> {
    let (session, skipped) = open_session(documents, None)?;
    let hits = search_hits(&session, query);
    Ok(with_skipped(format_search_hits(query, &hits, format), &skipped, format))
}

fn cmd_chunk(
    file: &Path,
    doc_type: Option<&str>,
    chunk_size: usize,
    overlap: usize,
    format: OutputFormat,
) -> Result<String> {
    let chunker = FixedChunker::new(chunk_size, overlap)?;
    let upload = read_upload(file, parse_doc_type(doc_type)?)?;
    let text = extract(&upload.bytes, upload.format)?;
    let chunks = chunker.chunk_all(DocumentId(1), &text);
    Ok(format_chunks(&upload.filename, &chunks, format))
}

fn cmd_extract(file: &Path, doc_type: Option<&str>, format: OutputFormat) -> Result<String> {
    let upload = read_upload(file, parse_doc_type(doc_type)?)?;
    let text = extract(&upload.bytes, upload.format)?;
    Ok(format_extracted(&upload.filename, &text, format))
}

fn cmd_providers(providers: &ProviderArgs, format: OutputFormat) -> String {
    let statuses: Vec<ProviderStatus> = ProviderKind::ALL
        .iter()
        .map(|&kind| {
            let config = providers.config(kind);
            ProviderStatus {
                id: kind.as_str(),
                name: kind.label(),
                model: config.model.clone(),
                env: kind.env_key(),
                credential: config.has_credential(),
            }
        })
        .collect();
    format_providers(&statuses, format)
}

fn cmd_init_templates(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let dir = dir
        .map(PathBuf::from)
        .or_else(PromptTemplate::default_dir)
        .ok_or_else(|| Error::config("cannot determine home directory; pass --dir"))?;
    let written = PromptTemplate::write_defaults(&dir)?;
    Ok(format_templates_written(
        &dir.display().to_string(),
        &written,
        format,
    ))
}

fn cmd_chat(
    documents: &DocumentArgs,
    providers: &ProviderArgs,
    kind: &str,
    template_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let kind: QueryKind = kind.parse()?;
    let dispatcher = build_dispatcher(providers)?;
    let (mut session, skipped) = open_session(documents, template_dir)?;
    let runtime = runtime()?;

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    stdout.write_all(format_skipped(&skipped, format).as_bytes())?;
    run_chat(
        &mut session,
        &dispatcher,
        &runtime,
        kind,
        stdin.lock(),
        stdout,
        format,
    )?;
    Ok(String::new())
}

const CHAT_HELP: &str = "\
Type a question, or one of:
  :load <file>   upload a document
  :docs          list uploaded documents
  :history       list questions asked so far
  :kind <kind>   set the query kind for following questions
  :clear         clear the history
  :reset         drop documents and history
  :quit          leave
";

/// A line of chat input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChatCommand<'a> {
    Ask(&'a str),
    Load(&'a str),
    Docs,
    History,
    Kind(&'a str),
    Clear,
    Reset,
    Help,
    Quit,
    Unknown(&'a str),
}

impl<'a> ChatCommand<'a> {
    fn parse(line: &'a str) -> Self {
        let Some(rest) = line.strip_prefix(':') else {
            return Self::Ask(line);
        };
        let (name, arg) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(name, arg)| (name, arg.trim()));

        match name {
            "load" | "l" if !arg.is_empty() => Self::Load(arg),
            "docs" | "documents" => Self::Docs,
            "history" => Self::History,
            "kind" if !arg.is_empty() => Self::Kind(arg),
            "clear" => Self::Clear,
            "reset" => Self::Reset,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(rest),
        }
    }
}

/// Runs the interactive loop until `:quit` or end of input.
///
/// A failing line prints its error and the loop continues.
///
/// # Errors
///
/// Returns an error only if reading input or writing output fails.
pub fn run_chat<R: BufRead, W: Write>(
    session: &mut Session,
    dispatcher: &Dispatcher,
    runtime: &Runtime,
    mut kind: QueryKind,
    mut input: R,
    mut output: W,
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Text {
        writeln!(
            output,
            "casewise chat: {} document(s), providers: {}. Type :help for commands.",
            session.documents().count(),
            dispatcher.names().join(", ")
        )?;
    }

    let mut line = String::new();
    loop {
        if format == OutputFormat::Text {
            write!(output, "> ")?;
            output.flush()?;
        }
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let reply = match ChatCommand::parse(trimmed) {
            ChatCommand::Quit => break,
            ChatCommand::Help => Ok(CHAT_HELP.to_string()),
            ChatCommand::Docs => Ok(format_documents(&session.summaries(), format)),
            ChatCommand::History => Ok(format_history(session.history(), format)),
            ChatCommand::Clear => {
                session.clear_history();
                Ok("History cleared.\n".to_string())
            }
            ChatCommand::Reset => {
                session.reset();
                Ok("Session reset.\n".to_string())
            }
            ChatCommand::Kind(name) => name.parse::<QueryKind>().map_err(Error::from).map(|k| {
                kind = k;
                format!("Query kind: {}\n", k.label())
            }),
            ChatCommand::Load(path) => read_upload(path, None)
                .and_then(|upload| session.ingest(&upload))
                .map(|summary| format_documents(&[summary], format)),
            ChatCommand::Unknown(name) => Err(CommandError::InvalidArgument(format!(
                "unknown command :{name} (try :help)"
            ))
            .into()),
            ChatCommand::Ask(text) => runtime
                .block_on(session.ask(Query::new(text).kind(kind), dispatcher))
                .map(|turn| format_turn(&turn, format)),
        };

        match reply {
            Ok(text) => write!(output, "{text}")?,
            Err(e) => writeln!(output, "Error: {}", format_error(&e, format))?,
        }
    }
    Ok(())
}
