//! Book and research report metadata, one row per document

use crate::extract::{ExtractionError, Extractor};
use crate::table::{ColumnSet, ColumnSpec, Value};

use super::article::language;
use super::xml::{date_parts, integer_field, Element};

/// Root elements accepted for book-like documents
pub(crate) const BOOK_ROOTS: &[&str] = &["book", "book-part-wrapper", "report"];

pub struct BookExtractor {
    schema: Vec<ColumnSpec>,
}

impl BookExtractor {
    pub fn new() -> Self {
        Self {
            schema: vec![
                ColumnSpec::text("book_jstor_id"),
                ColumnSpec::text("book_doi"),
                ColumnSpec::text("title"),
                ColumnSpec::text("subtitle"),
                ColumnSpec::integer("pub_year"),
                ColumnSpec::integer("pub_month"),
                ColumnSpec::integer("pub_day"),
                ColumnSpec::text_list("isbns"),
                ColumnSpec::text("publisher"),
                ColumnSpec::text("publisher_location"),
                ColumnSpec::integer("page_count"),
                ColumnSpec::text("language"),
                ColumnSpec::text_list("disciplines"),
            ],
        }
    }
}

impl Default for BookExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for BookExtractor {
    fn name(&self) -> &str {
        "book"
    }

    fn schema(&self) -> &[ColumnSpec] {
        &self.schema
    }

    fn extract(&self, raw: &[u8]) -> Result<ColumnSet, ExtractionError> {
        let root = Element::parse_rooted(raw, BOOK_ROOTS)?;
        let meta = root
            .descendants("book-meta")
            .into_iter()
            .next()
            .ok_or_else(|| ExtractionError::MissingNode("book-meta".to_string()))?;

        let [year, month, day] = date_parts(meta.child("pub-date"))?;

        let isbns: Vec<String> = meta
            .children_named("isbn")
            .map(Element::text)
            .filter(|t| !t.is_empty())
            .collect();

        let disciplines: Vec<String> = meta
            .descendants("subj-group")
            .into_iter()
            .filter(|g| g.attr("subj-group-type") == Some("discipline"))
            .flat_map(|g| g.children_named("subject"))
            .map(Element::text)
            .filter(|t| !t.is_empty())
            .collect();

        let page_count = meta
            .find("counts/page-count")
            .and_then(|c| c.attr("count").map(str::to_string).or_else(|| Some(c.text())))
            .filter(|t| !t.is_empty());

        Ok(ColumnSet::new()
            .scalar(
                "book_jstor_id",
                Value::opt_text(meta.text_where("book-id", "book-id-type", "jstor")),
            )
            .scalar(
                "book_doi",
                Value::opt_text(meta.text_where("book-id", "book-id-type", "doi")),
            )
            .scalar("title", Value::opt_text(meta.text_at("book-title-group/book-title")))
            .scalar("subtitle", Value::opt_text(meta.text_at("book-title-group/subtitle")))
            .scalar("pub_year", year)
            .scalar("pub_month", month)
            .scalar("pub_day", day)
            .scalar("isbns", Value::List(isbns))
            .scalar("publisher", Value::opt_text(meta.text_at("publisher/publisher-name")))
            .scalar(
                "publisher_location",
                Value::opt_text(meta.text_at("publisher/publisher-loc")),
            )
            .scalar("page_count", integer_field("page_count", page_count)?)
            .scalar("language", Value::opt_text(language(&root, meta)))
            .scalar("disciplines", Value::List(disciplines)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::materialize;

    const DOC: &str = r#"<book>
  <book-meta>
    <book-id book-id-type="jstor">j.ctt1234</book-id>
    <book-id book-id-type="doi">10.2307/j.ctt1234</book-id>
    <subj-group subj-group-type="discipline">
      <subject>History</subject>
      <subject>Economics</subject>
    </subj-group>
    <book-title-group>
      <book-title>Trade Winds</book-title>
      <subtitle>A History</subtitle>
    </book-title-group>
    <pub-date><year>2010</year></pub-date>
    <isbn content-type="ppub">9780000000001</isbn>
    <isbn content-type="epub">9780000000002</isbn>
    <publisher>
      <publisher-name>University Press</publisher-name>
      <publisher-loc>Princeton</publisher-loc>
    </publisher>
    <counts><page-count count="312"/></counts>
    <custom-meta-group>
      <custom-meta><meta-name>lang</meta-name><meta-value>eng</meta-value></custom-meta>
    </custom-meta-group>
  </book-meta>
</book>"#;

    #[test]
    fn test_extracts_book_fields() {
        let extractor = BookExtractor::new();
        let set = extractor.extract(DOC.as_bytes()).unwrap();
        let rows = materialize(extractor.schema(), "book-chapter-j.ctt1234", &set).unwrap();
        let row = &rows[0];

        assert_eq!(row[1], Value::text("j.ctt1234"));
        assert_eq!(row[3], Value::text("Trade Winds"));
        assert_eq!(row[4], Value::text("A History"));
        assert_eq!(row[5], Value::Integer(2010));
        assert_eq!(row[6], Value::Missing);
        assert_eq!(
            row[8],
            Value::List(vec!["9780000000001".to_string(), "9780000000002".to_string()])
        );
        assert_eq!(row[10], Value::text("Princeton"));
        assert_eq!(row[11], Value::Integer(312));
        assert_eq!(row[12], Value::text("eng"));
        assert_eq!(
            row[13],
            Value::List(vec!["History".to_string(), "Economics".to_string()])
        );
    }

    #[test]
    fn test_requires_book_meta() {
        let err = BookExtractor::new().extract(b"<report><body/></report>").unwrap_err();
        assert_eq!(err, ExtractionError::MissingNode("book-meta".to_string()));
    }
}
