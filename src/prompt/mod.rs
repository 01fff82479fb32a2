//! Prompt composition.
//!
//! A prompt has up to three delimited sections, always in this order:
//!
//! - `<instructions>`: the instruction template.
//! - `<context>`: retrieved document excerpts, one `<source>` each. Omitted
//!   entirely when nothing was retrieved.
//! - `<query>`: the user's text, patient information and the directive for
//!   the query kind.

pub mod template;

pub use template::{CONTEXT_DIRECTIVE, DEFAULT_INSTRUCTIONS, PromptTemplate, directive};

use quick_xml::escape::escape;
use std::fmt::Write;

use crate::core::Query;
use crate::error::{PromptError, Result};

/// Opening delimiter of the context section.
pub const CONTEXT_OPEN: &str = "<context>";

/// A retrieved excerpt as shown to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextSource<'a> {
    /// File the excerpt came from.
    pub filename: &'a str,
    /// Chunk index within that file.
    pub chunk_index: usize,
    /// Retrieval score.
    pub score: usize,
    /// Excerpt text.
    pub text: &'a str,
}

/// Builds prompts from a template, retrieved excerpts and a query.
#[derive(Debug, Clone, Default)]
pub struct PromptComposer {
    template: PromptTemplate,
}

impl PromptComposer {
    /// Creates a composer around `template`.
    #[must_use]
    pub const fn new(template: PromptTemplate) -> Self {
        Self { template }
    }

    /// The instruction template in use.
    #[must_use]
    pub const fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Composes the full prompt.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::EmptyQuery`] if the query text is blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use casewise::core::Query;
    /// use casewise::prompt::{CONTEXT_OPEN, PromptComposer};
    ///
    /// let prompt = PromptComposer::default().compose(&Query::new("What is ODD?"), &[]).unwrap();
    /// assert!(prompt.contains("<query"));
    /// assert!(!prompt.contains(CONTEXT_OPEN));
    /// ```
    pub fn compose(&self, query: &Query, sources: &[ContextSource<'_>]) -> Result<String> {
        if query.is_blank() {
            return Err(PromptError::EmptyQuery.into());
        }

        let mut prompt = String::new();
        let _ = write!(
            prompt,
            "<instructions>\n{}\n</instructions>\n\n",
            self.template.instructions().trim()
        );

        if !sources.is_empty() {
            prompt.push_str(CONTEXT_OPEN);
            prompt.push_str("\nRelevant information from uploaded documents:\n\n");
            for (i, source) in sources.iter().enumerate() {
                let _ = write!(
                    prompt,
                    "<source index=\"{n}\" document=\"{file}\" chunk=\"{chunk}\" score=\"{score}\">\n\
                     {text}\n\
                     </source>\n\n",
                    n = i + 1,
                    file = escape(source.filename),
                    chunk = source.chunk_index,
                    score = source.score,
                    text = source.text,
                );
            }
            prompt.push_str("</context>\n\n");
        }

        let _ = write!(
            prompt,
            "<query type=\"{}\">\n{}\n",
            query.kind.label(),
            query.text.trim()
        );

        if query.has_patient_info() {
            prompt.push_str("\nPatient information:\n");
            if let Some(age) = query.age {
                let _ = writeln!(prompt, "- Age: {age} years");
            }
            if let Some(ref gender) = query.gender {
                let _ = writeln!(prompt, "- Gender: {gender}");
            }
            if let Some(ref context) = query.context {
                let _ = writeln!(prompt, "- Additional context: {}", context.trim());
            }
        }

        if !sources.is_empty() {
            let _ = write!(prompt, "\n{CONTEXT_DIRECTIVE}\n");
        }
        let _ = write!(prompt, "\n{}\n</query>", directive(query.kind));

        tracing::debug!(
            kind = %query.kind,
            sources = sources.len(),
            chars = prompt.len(),
            "composed prompt"
        );

        Ok(prompt)
    }
}
