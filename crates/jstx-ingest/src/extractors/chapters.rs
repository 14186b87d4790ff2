//! Book parts, one row per `book-part`

use crate::extract::{ExtractionError, Extractor};
use crate::table::{ColumnSet, ColumnSpec, Value};

use super::authors::author_names;
use super::book::BOOK_ROOTS;
use super::xml::Element;

pub struct ChaptersExtractor {
    schema: Vec<ColumnSpec>,
}

impl ChaptersExtractor {
    pub fn new() -> Self {
        Self {
            schema: vec![
                ColumnSpec::integer("part_number"),
                ColumnSpec::text("part_id"),
                ColumnSpec::text("part_type"),
                ColumnSpec::text("label"),
                ColumnSpec::text("title"),
                ColumnSpec::text("first_page"),
                ColumnSpec::text("last_page"),
                ColumnSpec::text_list("authors"),
            ],
        }
    }
}

impl Default for ChaptersExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for ChaptersExtractor {
    fn name(&self) -> &str {
        "chapters"
    }

    fn schema(&self) -> &[ColumnSpec] {
        &self.schema
    }

    fn extract(&self, raw: &[u8]) -> Result<ColumnSet, ExtractionError> {
        let root = Element::parse(raw)?;
        let parts = if root.name == "book-part" {
            vec![&root]
        } else if BOOK_ROOTS.contains(&root.name.as_str()) {
            root.descendants("book-part")
        } else {
            return Err(ExtractionError::UnexpectedRoot {
                expected: format!("{}|book-part", BOOK_ROOTS.join("|")),
                found: root.name,
            });
        };

        let mut columns: [Vec<Value>; 8] = Default::default();
        for (i, part) in parts.into_iter().enumerate() {
            let meta = part.child("book-part-meta");
            let meta_text = |path: &str| meta.and_then(|m| m.text_at(path));
            let part_id = meta
                .and_then(|m| m.text_where("book-part-id", "book-part-id-type", "jstor"))
                .or_else(|| part.attr("id").map(str::to_string));
            let authors: Vec<String> = meta
                .map(|m| m.find_all("contrib-group/contrib"))
                .unwrap_or_default()
                .into_iter()
                .filter_map(|c| author_names(c).2)
                .collect();

            let row = [
                Value::Integer(i as i64 + 1),
                Value::opt_text(part_id),
                Value::opt_text(part.attr("book-part-type")),
                Value::opt_text(meta_text("title-group/label")),
                Value::opt_text(meta_text("title-group/title")),
                Value::opt_text(meta_text("fpage")),
                Value::opt_text(meta_text("lpage")),
                Value::List(authors),
            ];
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }

        let set = self
            .schema
            .iter()
            .zip(columns)
            .fold(ColumnSet::new(), |set, (spec, values)| set.many(spec.name.as_str(), values));
        Ok(set)
    }
}
