//! Built-in extractors and the name registry used by the CLI
//!
//! | name       | kinds                 | rows per document |
//! |------------|-----------------------|-------------------|
//! | `article`  | journal_article       | 1                 |
//! | `authors`  | journal_article       | one per author    |
//! | `book`     | book, report          | 1                 |
//! | `chapters` | book, chapter         | one per part      |

pub mod article;
pub mod authors;
pub mod book;
pub mod chapters;
pub mod xml;

use std::sync::Arc;

use crate::error::{ImportError, Result};
use crate::extract::{ExtractionSpec, Extractor};
use crate::kind::DocumentKind;

pub use article::ArticleExtractor;
pub use authors::AuthorsExtractor;
pub use book::BookExtractor;
pub use chapters::ChaptersExtractor;

/// Names accepted by [`builtin`]
pub const BUILTIN_NAMES: &[&str] = &["article", "authors", "book", "chapters"];

/// Look up a built-in extractor by name
pub fn builtin(name: &str) -> Option<Arc<dyn Extractor>> {
    let extractor: Arc<dyn Extractor> = match name {
        "article" => Arc::new(ArticleExtractor::new()),
        "authors" => Arc::new(AuthorsExtractor::new()),
        "book" => Arc::new(BookExtractor::new()),
        "chapters" => Arc::new(ChaptersExtractor::new()),
        _ => return None,
    };
    Some(extractor)
}

/// Extractors run for each kind when none are configured
pub fn default_assignments() -> Vec<(DocumentKind, Vec<String>)> {
    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }
    vec![
        (DocumentKind::JournalArticle, names(&["article", "authors"])),
        (DocumentKind::Book, names(&["book", "chapters"])),
        (DocumentKind::Chapter, names(&["chapters"])),
        (DocumentKind::Report, names(&["book"])),
    ]
}

pub fn default_spec() -> Result<ExtractionSpec> {
    spec_from_assignments(&default_assignments())
}

/// Parse `KIND=NAME[,NAME...]`, e.g. `journal_article=article,authors`
pub fn parse_assignment(raw: &str) -> Result<(DocumentKind, Vec<String>)> {
    let (kind, names) = raw
        .split_once('=')
        .ok_or_else(|| ImportError::config(format!("expected KIND=NAME[,NAME], got '{}'", raw)))?;
    let kind = kind.trim().parse::<DocumentKind>().map_err(ImportError::Config)?;
    let names: Vec<String> = names
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        return Err(ImportError::config(format!("no extractors named for '{}'", kind)));
    }
    Ok((kind, names))
}

/// Build a spec from kind-to-name assignments against the built-in registry
///
/// Repeated assignments for one kind append to its list.
pub fn spec_from_assignments(assignments: &[(DocumentKind, Vec<String>)]) -> Result<ExtractionSpec> {
    let mut builder = ExtractionSpec::builder();
    for (kind, names) in assignments {
        for name in names {
            let extractor = builtin(name).ok_or_else(|| {
                ImportError::config(format!(
                    "unknown extractor '{}' (available: {})",
                    name,
                    BUILTIN_NAMES.join(", ")
                ))
            })?;
            builder = builder.register_shared(*kind, extractor)?;
        }
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        for name in BUILTIN_NAMES {
            assert_eq!(builtin(name).unwrap().name(), *name);
        }
        assert!(builtin("abstract").is_none());
    }

    #[test]
    fn test_default_spec() {
        let spec = default_spec().unwrap();
        let names: Vec<&str> = spec
            .extractors_for(DocumentKind::JournalArticle)
            .iter()
            .map(|e| e.name())
            .collect();
        assert_eq!(names, vec!["article", "authors"]);
        assert!(spec.handles(DocumentKind::Report));
        assert!(!spec.handles(DocumentKind::Ngram1));
    }

    #[test]
    fn test_parse_assignment() {
        let (kind, names) = parse_assignment("journal_article=article, authors").unwrap();
        assert_eq!(kind, DocumentKind::JournalArticle);
        assert_eq!(names, vec!["article", "authors"]);

        assert!(matches!(parse_assignment("article"), Err(ImportError::Config(_))));
        assert!(matches!(parse_assignment("pamphlet=article"), Err(ImportError::Config(_))));
        assert!(matches!(parse_assignment("book="), Err(ImportError::Config(_))));
    }

    #[test]
    fn test_unknown_or_misplaced_extractor_rejected() {
        let err = spec_from_assignments(&[(DocumentKind::Book, vec!["abstract".to_string()])]).unwrap_err();
        assert!(err.to_string().contains("abstract"));

        let err = spec_from_assignments(&[(DocumentKind::Ngram2, vec!["book".to_string()])]).unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
    }
}
