//! Journal article metadata, one row per article

use crate::extract::{ExtractionError, Extractor};
use crate::table::{ColumnSet, ColumnSpec, Value};

use super::xml::{date_parts, Element};

pub struct ArticleExtractor {
    schema: Vec<ColumnSpec>,
}

impl ArticleExtractor {
    pub fn new() -> Self {
        Self {
            schema: vec![
                ColumnSpec::text("journal_id"),
                ColumnSpec::text("journal_title"),
                ColumnSpec::text("issn"),
                ColumnSpec::text("publisher"),
                ColumnSpec::text("article_type"),
                ColumnSpec::text("article_doi"),
                ColumnSpec::text("article_jstor_id"),
                ColumnSpec::text("title"),
                ColumnSpec::text("subtitle"),
                ColumnSpec::text("volume"),
                ColumnSpec::text("issue"),
                ColumnSpec::text("language"),
                ColumnSpec::integer("pub_year"),
                ColumnSpec::integer("pub_month"),
                ColumnSpec::integer("pub_day"),
                ColumnSpec::text("first_page"),
                ColumnSpec::text("last_page"),
                ColumnSpec::text("page_range"),
                ColumnSpec::text_list("keywords"),
            ],
        }
    }
}

impl Default for ArticleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Language from `xml:lang` on the root, else a `lang` custom meta entry
pub(crate) fn language(root: &Element, meta: &Element) -> Option<String> {
    root.attr("lang")
        .map(str::to_string)
        .filter(|l| !l.trim().is_empty())
        .or_else(|| {
            meta.descendants("custom-meta")
                .into_iter()
                .find(|m| m.text_at("meta-name").as_deref() == Some("lang"))
                .and_then(|m| m.text_at("meta-value"))
        })
}

impl Extractor for ArticleExtractor {
    fn name(&self) -> &str {
        "article"
    }

    fn schema(&self) -> &[ColumnSpec] {
        &self.schema
    }

    fn extract(&self, raw: &[u8]) -> Result<ColumnSet, ExtractionError> {
        let root = Element::parse_rooted(raw, &["article"])?;
        let journal = root.find("front/journal-meta");
        let meta = root
            .find("front/article-meta")
            .ok_or_else(|| ExtractionError::MissingNode("front/article-meta".to_string()))?;

        let journal_text = |path: &str| journal.and_then(|j| j.text_at(path));
        let journal_id = journal.and_then(|j| {
            j.text_where("journal-id", "journal-id-type", "jstor")
                .or_else(|| j.text_at("journal-id"))
        });

        let [year, month, day] = date_parts(meta.child("pub-date"))?;

        let keywords: Vec<String> = meta
            .descendants("kwd")
            .into_iter()
            .map(Element::text)
            .filter(|k| !k.is_empty())
            .collect();

        Ok(ColumnSet::new()
            .scalar("journal_id", Value::opt_text(journal_id))
            .scalar(
                "journal_title",
                Value::opt_text(
                    journal_text("journal-title-group/journal-title").or_else(|| journal_text("journal-title")),
                ),
            )
            .scalar("issn", Value::opt_text(journal_text("issn")))
            .scalar("publisher", Value::opt_text(journal_text("publisher/publisher-name")))
            .scalar("article_type", Value::opt_text(root.attr("article-type")))
            .scalar(
                "article_doi",
                Value::opt_text(meta.text_where("article-id", "pub-id-type", "doi")),
            )
            .scalar(
                "article_jstor_id",
                Value::opt_text(meta.text_where("article-id", "pub-id-type", "jstor")),
            )
            .scalar("title", Value::opt_text(meta.text_at("title-group/article-title")))
            .scalar("subtitle", Value::opt_text(meta.text_at("title-group/subtitle")))
            .scalar("volume", Value::opt_text(meta.text_at("volume")))
            .scalar("issue", Value::opt_text(meta.text_at("issue")))
            .scalar("language", Value::opt_text(language(&root, meta)))
            .scalar("pub_year", year)
            .scalar("pub_month", month)
            .scalar("pub_day", day)
            .scalar("first_page", Value::opt_text(meta.text_at("fpage")))
            .scalar("last_page", Value::opt_text(meta.text_at("lpage")))
            .scalar("page_range", Value::opt_text(meta.text_at("page-range")))
            .scalar("keywords", Value::List(keywords)))
    }
}
