//! Extractor trait and the extraction spec
//!
//! An extractor is a pure function from one document's bytes to a
//! [`ColumnSet`]. The [`ExtractionSpec`] says which extractors run for
//! which document kind and is fixed for the lifetime of a run.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::error::ImportError;
use crate::kind::DocumentKind;
use crate::table::{ColumnSet, ColumnSpec, FILE_NAME_COLUMN};

/// Structural failure while extracting one document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("expected root element <{expected}>, found <{found}>")]
    UnexpectedRoot { expected: String, found: String },

    #[error("required node missing: {0}")]
    MissingNode(String),

    #[error("malformed {field}: '{value}'")]
    MalformedField { field: String, value: String },

    #[error("document is not valid UTF-8")]
    Encoding,

    #[error("{0}")]
    Other(String),
}

/// Turns one document into a column set
///
/// Implementations must be side-effect free: the runner may call them from
/// several threads at once and relies on the result depending only on the
/// input bytes.
pub trait Extractor: Send + Sync {
    /// Short identifier used in output file names, `[a-z0-9_]+`
    fn name(&self) -> &str;

    /// Declared output columns, excluding `file_name`
    fn schema(&self) -> &[ColumnSpec];

    fn extract(&self, raw: &[u8]) -> Result<ColumnSet, ExtractionError>;
}

/// Extractor built from a closure
pub struct FnExtractor<F> {
    name: String,
    schema: Vec<ColumnSpec>,
    f: F,
}

impl<F> FnExtractor<F>
where
    F: Fn(&[u8]) -> Result<ColumnSet, ExtractionError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, schema: Vec<ColumnSpec>, f: F) -> Self {
        Self {
            name: name.into(),
            schema,
            f,
        }
    }
}

impl<F> Extractor for FnExtractor<F>
where
    F: Fn(&[u8]) -> Result<ColumnSet, ExtractionError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &[ColumnSpec] {
        &self.schema
    }

    fn extract(&self, raw: &[u8]) -> Result<ColumnSet, ExtractionError> {
        (self.f)(raw)
    }
}

/// Immutable mapping from document kind to its extractors
#[derive(Clone, Default)]
pub struct ExtractionSpec {
    extractors: BTreeMap<DocumentKind, Vec<Arc<dyn Extractor>>>,
}

impl ExtractionSpec {
    pub fn builder() -> ExtractionSpecBuilder {
        ExtractionSpecBuilder::default()
    }

    /// Extractors registered for a kind, in registration order
    pub fn extractors_for(&self, kind: DocumentKind) -> &[Arc<dyn Extractor>] {
        self.extractors.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn handles(&self, kind: DocumentKind) -> bool {
        !self.extractors_for(kind).is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = DocumentKind> + '_ {
        self.extractors.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl fmt::Debug for ExtractionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (kind, extractors) in &self.extractors {
            let names: Vec<&str> = extractors.iter().map(|e| e.name()).collect();
            map.entry(kind, &names);
        }
        map.finish()
    }
}

/// Builder that validates registrations before a run starts
#[derive(Default)]
pub struct ExtractionSpecBuilder {
    extractors: BTreeMap<DocumentKind, Vec<Arc<dyn Extractor>>>,
}

impl ExtractionSpecBuilder {
    pub fn register(
        mut self,
        kind: DocumentKind,
        extractor: impl Extractor + 'static,
    ) -> Result<Self, ImportError> {
        self.add(kind, Arc::new(extractor))?;
        Ok(self)
    }

    pub fn register_shared(
        mut self,
        kind: DocumentKind,
        extractor: Arc<dyn Extractor>,
    ) -> Result<Self, ImportError> {
        self.add(kind, extractor)?;
        Ok(self)
    }

    fn add(&mut self, kind: DocumentKind, extractor: Arc<dyn Extractor>) -> Result<(), ImportError> {
        if !kind.is_document() {
            return Err(ImportError::Config(format!(
                "extractors can only be registered for document kinds, not '{}'",
                kind
            )));
        }

        let name = extractor.name();
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(ImportError::Config(format!(
                "extractor name '{}' must match [a-z0-9_]+",
                name
            )));
        }

        if extractor.schema().iter().any(|c| c.name == FILE_NAME_COLUMN) {
            return Err(ImportError::Config(format!(
                "extractor '{}' must not declare the '{}' column",
                name, FILE_NAME_COLUMN
            )));
        }

        let registered = self.extractors.entry(kind).or_default();
        if registered.iter().any(|e| e.name() == name) {
            return Err(ImportError::Config(format!(
                "extractor '{}' registered twice for '{}'",
                name, kind
            )));
        }
        registered.push(extractor);
        Ok(())
    }

    pub fn build(self) -> ExtractionSpec {
        ExtractionSpec {
            extractors: self.extractors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn title_extractor(name: &str) -> FnExtractor<impl Fn(&[u8]) -> Result<ColumnSet, ExtractionError>> {
        FnExtractor::new(name, vec![ColumnSpec::text("title")], |raw: &[u8]| {
            let text = std::str::from_utf8(raw).map_err(|_| ExtractionError::Encoding)?;
            Ok(ColumnSet::new().scalar("title", Value::text(text)))
        })
    }

    #[test]
    fn test_register_and_lookup() {
        let spec = ExtractionSpec::builder()
            .register(DocumentKind::JournalArticle, title_extractor("article"))
            .unwrap()
            .register(DocumentKind::JournalArticle, title_extractor("titles"))
            .unwrap()
            .build();

        let names: Vec<&str> = spec
            .extractors_for(DocumentKind::JournalArticle)
            .iter()
            .map(|e| e.name())
            .collect();
        assert_eq!(names, vec!["article", "titles"]);
        assert!(!spec.handles(DocumentKind::Book));
        assert_eq!(spec.kinds().collect::<Vec<_>>(), vec![DocumentKind::JournalArticle]);
    }

    #[test]
    fn test_rejects_ngram_kinds_and_bad_names() {
        assert!(ExtractionSpec::builder()
            .register(DocumentKind::Ngram1, title_extractor("ngrams"))
            .is_err());
        assert!(ExtractionSpec::builder()
            .register(DocumentKind::Unknown, title_extractor("x"))
            .is_err());
        assert!(ExtractionSpec::builder()
            .register(DocumentKind::Book, title_extractor("Book-Meta"))
            .is_err());
    }

    #[test]
    fn test_rejects_duplicates() {
        let result = ExtractionSpec::builder()
            .register(DocumentKind::Book, title_extractor("book"))
            .unwrap()
            .register(DocumentKind::Book, title_extractor("book"));
        assert!(matches!(result, Err(ImportError::Config(_))));
    }

    #[test]
    fn test_fn_extractor_runs_closure() {
        let extractor = title_extractor("t");
        let set = extractor.extract(b"hello").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(extractor.extract(&[0xff, 0xfe]), Err(ExtractionError::Encoding));
    }
}
