//! Document kinds and entry classification
//!
//! Kinds are derived from an entry's path inside the archive alone, never
//! from its content, so classification is cheap enough for preview mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Structural category of an archive entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Book,
    Chapter,
    JournalArticle,
    Report,
    Ngram1,
    Ngram2,
    Ngram3,
    Unknown,
}

impl DocumentKind {
    /// Every kind, in identifier order used for reporting
    pub const ALL: [DocumentKind; 8] = [
        DocumentKind::Book,
        DocumentKind::Chapter,
        DocumentKind::JournalArticle,
        DocumentKind::Report,
        DocumentKind::Ngram1,
        DocumentKind::Ngram2,
        DocumentKind::Ngram3,
        DocumentKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Book => "book",
            DocumentKind::Chapter => "chapter",
            DocumentKind::JournalArticle => "journal_article",
            DocumentKind::Report => "report",
            DocumentKind::Ngram1 => "ngram1",
            DocumentKind::Ngram2 => "ngram2",
            DocumentKind::Ngram3 => "ngram3",
            DocumentKind::Unknown => "unknown",
        }
    }

    /// True for XML metadata kinds that an extraction spec may target
    pub fn is_document(&self) -> bool {
        matches!(
            self,
            DocumentKind::Book
                | DocumentKind::Chapter
                | DocumentKind::JournalArticle
                | DocumentKind::Report
        )
    }

    pub fn is_ngram(&self) -> bool {
        self.ngram_order().is_some()
    }

    pub fn ngram_order(&self) -> Option<u8> {
        match self {
            DocumentKind::Ngram1 => Some(1),
            DocumentKind::Ngram2 => Some(2),
            DocumentKind::Ngram3 => Some(3),
            _ => None,
        }
    }

    pub fn from_ngram_order(order: u8) -> Option<Self> {
        match order {
            1 => Some(DocumentKind::Ngram1),
            2 => Some(DocumentKind::Ngram2),
            3 => Some(DocumentKind::Ngram3),
            _ => None,
        }
    }

    /// Classify an entry name from its path
    ///
    /// Directory components are scanned from the deepest upward. A
    /// `metadata` directory, or no recognized directory at all, falls back
    /// to the file-name prefix used by bulk deliveries
    /// (`journal-article-…`, `book-chapter-…`, `research-report-…`).
    pub fn classify(entry_name: &str) -> DocumentKind {
        if entry_name.is_empty() || entry_name.ends_with('/') {
            return DocumentKind::Unknown;
        }

        let mut components: Vec<&str> = entry_name.split('/').filter(|c| !c.is_empty()).collect();
        let file = match components.pop() {
            Some(file) => file,
            None => return DocumentKind::Unknown,
        };
        let file_lower = file.to_ascii_lowercase();

        for dir in components.iter().rev() {
            let dir = dir.to_ascii_lowercase();
            if let Some(kind) = kind_for_directory(&dir) {
                return if kind.is_ngram() {
                    if file_lower.ends_with(".txt") { kind } else { DocumentKind::Unknown }
                } else if file_lower.ends_with(".xml") {
                    kind
                } else {
                    DocumentKind::Unknown
                };
            }
        }

        if !file_lower.ends_with(".xml") {
            return DocumentKind::Unknown;
        }

        if file_lower.starts_with("journal-article-") {
            DocumentKind::JournalArticle
        } else if file_lower.starts_with("book-chapter-") {
            DocumentKind::Book
        } else if file_lower.starts_with("research-report-") {
            DocumentKind::Report
        } else {
            DocumentKind::Unknown
        }
    }
}

fn kind_for_directory(dir: &str) -> Option<DocumentKind> {
    let kind = match dir {
        "ngram1" => DocumentKind::Ngram1,
        "ngram2" => DocumentKind::Ngram2,
        "ngram3" => DocumentKind::Ngram3,
        "journal-article" | "journal-articles" | "article" | "articles" => {
            DocumentKind::JournalArticle
        },
        "book" | "books" | "book-chapter" | "book-chapters" => DocumentKind::Book,
        "chapter" | "chapters" => DocumentKind::Chapter,
        "research-report" | "research-reports" | "report" | "reports" => DocumentKind::Report,
        _ => return None,
    };
    Some(kind)
}

/// Per-document key used as the `file_name` column
///
/// The last path component without its extension; n-gram files also lose
/// their `-ngramN` suffix so they join against the metadata of the same
/// document.
pub fn file_stem(entry_name: &str) -> String {
    let file = entry_name.rsplit('/').next().unwrap_or(entry_name);
    let stem = match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    };
    for suffix in ["-ngram1", "-ngram2", "-ngram3"] {
        if let Some(stripped) = stem.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    stem.to_string()
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "book" => Ok(DocumentKind::Book),
            "chapter" | "book_chapter" => Ok(DocumentKind::Chapter),
            "journal_article" | "article" => Ok(DocumentKind::JournalArticle),
            "report" | "research_report" => Ok(DocumentKind::Report),
            "ngram1" => Ok(DocumentKind::Ngram1),
            "ngram2" => Ok(DocumentKind::Ngram2),
            "ngram3" => Ok(DocumentKind::Ngram3),
            "unknown" => Ok(DocumentKind::Unknown),
            _ => Err(format!("unknown document kind '{}'", s)),
        }
    }
}
