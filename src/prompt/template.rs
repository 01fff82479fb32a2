//! Instruction template and per-kind directives.
//!
//! The instruction template describes the assistant's role and the shape of
//! its answers. It is compiled in and can be overridden by a file on disk.

use std::path::{Path, PathBuf};

use crate::core::QueryKind;
use crate::error::PromptError;

/// Default instruction template for the child and adolescent mental health assistant.
pub const DEFAULT_INSTRUCTIONS: &str = r"You are an expert assistant for students and clinicians studying child and adolescent mental health disorders. You help analyze cases, explain diagnostic criteria and explore evidence-based assessment and treatment.

## Responsibilities

1. Give accurate information grounded in DSM-5-TR criteria.
2. Analyze case studies systematically.
3. Suggest differential diagnoses when appropriate.
4. Recommend evidence-based assessment instruments.
5. Outline treatment considerations that follow current best practice.
6. Account for developmental factors specific to children and adolescents.
7. Stress the need for comprehensive assessment.

## Guidelines

- Acknowledge the complexity of mental health diagnosis.
- Defer to professional clinical judgment for real cases.
- Consider cultural and contextual factors.
- Highlight the role of family involvement.
- Say when more information is needed for a proper assessment.
- Reference evidence-based practices and research when relevant.

## Output

Answer in markdown. Lead with a short summary, then use headed sections. When document excerpts are provided in the context section, cite them as [Source N].

This assistant is for educational purposes. Real clinical decisions require a comprehensive assessment by a licensed professional.";

/// Line added to the query section when document excerpts are included.
pub const CONTEXT_DIRECTIVE: &str = "Answer the question using the provided document excerpts when relevant, and supplement them with your knowledge of child and adolescent mental health.";

/// Default template directory under the user's home.
const DEFAULT_TEMPLATE_DIR: &str = ".config/casewise/templates";

/// Environment variable overriding the template directory.
pub const TEMPLATE_DIR_ENV: &str = "CASEWISE_TEMPLATE_DIR";

/// Filename of the instruction template.
const INSTRUCTIONS_FILENAME: &str = "instructions.md";

/// Returns the directive appended to a query of the given kind.
#[must_use]
pub const fn directive(kind: QueryKind) -> &'static str {
    match kind {
        QueryKind::General => {
            "Please provide a comprehensive answer following evidence-based practices for child and adolescent mental health."
        }
        QueryKind::CaseStudy => {
            "Provide a comprehensive analysis including:\n\
             1. Presenting symptoms and concerns\n\
             2. Possible diagnoses (with DSM-5 criteria consideration)\n\
             3. Differential diagnoses\n\
             4. Recommended assessment tools\n\
             5. Treatment considerations\n\
             6. Important factors to consider"
        }
        QueryKind::DifferentialDiagnosis => {
            "List the differential diagnoses to consider, the features that distinguish each one, and the information that would be needed to rule each in or out."
        }
        QueryKind::TreatmentPlanning => {
            "Describe the evidence-based treatment options, including both psychosocial interventions and medication considerations when appropriate."
        }
        QueryKind::AssessmentTools => {
            "Recommend the most appropriate evidence-based assessment tools, including both screening tools and comprehensive assessments."
        }
        QueryKind::Dsm5Criteria => {
            "Provide the DSM-5-TR diagnostic criteria as they apply to children and adolescents. Include all required criteria and specifiers."
        }
        QueryKind::StudyNotes => {
            "Create detailed study notes on this topic suitable for clinical study: key points, criteria, case examples and treatment guidelines."
        }
    }
}

/// The instruction template used by the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    instructions: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::defaults()
    }
}

impl PromptTemplate {
    /// Creates a template from explicit instructions.
    #[must_use]
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
        }
    }

    /// Returns the compiled-in template without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self::new(DEFAULT_INSTRUCTIONS)
    }

    /// Loads the template from a directory, falling back to the compiled-in default.
    ///
    /// Resolution order for the directory:
    /// 1. Explicit `template_dir` argument (from `--template-dir`)
    /// 2. `CASEWISE_TEMPLATE_DIR` environment variable
    /// 3. `~/.config/casewise/templates/`
    ///
    /// A missing or blank file uses the default. So does an unreadable one,
    /// after a warning.
    #[must_use]
    pub fn load(template_dir: Option<&Path>) -> Self {
        let resolved = template_dir
            .map(PathBuf::from)
            .or_else(|| std::env::var(TEMPLATE_DIR_ENV).ok().map(PathBuf::from))
            .or_else(Self::default_dir);

        let loaded = resolved
            .map(|dir| dir.join(INSTRUCTIONS_FILENAME))
            .and_then(|path| read_instructions(&path))
            .filter(|text| !text.trim().is_empty());

        loaded.map_or_else(Self::defaults, Self::new)
    }

    /// Writes the compiled-in template to `dir`.
    ///
    /// Creates the directory if it does not exist. An existing file is
    /// **not** overwritten; the returned list holds only files written.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Template`] if directory creation or writing fails.
    pub fn write_defaults(dir: &Path) -> Result<Vec<PathBuf>, PromptError> {
        let io_err = |path: &Path, e: std::io::Error| PromptError::Template {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

        let path = dir.join(INSTRUCTIONS_FILENAME);
        if path.exists() {
            return Ok(Vec::new());
        }
        std::fs::write(&path, DEFAULT_INSTRUCTIONS).map_err(|e| io_err(&path, e))?;
        Ok(vec![path])
    }

    /// Returns the default template directory under the user's home.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_TEMPLATE_DIR))
    }

    /// The instruction text.
    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }
}

fn read_instructions(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            tracing::debug!(path = %path.display(), "loaded instruction template");
            Some(text)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read instruction template, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_every_kind_has_a_directive() {
        for kind in QueryKind::ALL {
            assert!(!directive(kind).is_empty());
        }
        assert!(directive(QueryKind::CaseStudy).contains("Differential diagnoses"));
    }

    #[test]
    fn test_load_from_explicit_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("instructions.md"), "Be brief.").unwrap();

        let template = PromptTemplate::load(Some(dir.path()));
        assert_eq!(template.instructions(), "Be brief.");
    }

    #[test]
    fn test_load_unreadable_file_falls_back() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("instructions.md"), [0xff, 0xfe, 0x00]).unwrap();
        assert!(read_instructions(&dir.path().join("instructions.md")).is_none());

        let template = PromptTemplate::load(Some(dir.path()));
        assert_eq!(template.instructions(), DEFAULT_INSTRUCTIONS);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let template = PromptTemplate::load(Some(dir.path()));
        assert_eq!(template, PromptTemplate::defaults());
    }

    #[test]
    fn test_load_blank_file_falls_back() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("instructions.md"), "  \n").unwrap();
        let template = PromptTemplate::load(Some(dir.path()));
        assert_eq!(template.instructions(), DEFAULT_INSTRUCTIONS);
    }

    #[test]
    fn test_write_defaults_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested");

        let written = PromptTemplate::write_defaults(&target).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(
            std::fs::read_to_string(&written[0]).unwrap(),
            DEFAULT_INSTRUCTIONS
        );

        std::fs::write(&written[0], "custom").unwrap();
        let again = PromptTemplate::write_defaults(&target).unwrap();
        assert!(again.is_empty());
        assert_eq!(std::fs::read_to_string(&written[0]).unwrap(), "custom");
    }
}
