//! Article authors, one row per contributor

use crate::extract::{ExtractionError, Extractor};
use crate::table::{ColumnSet, ColumnSpec, Value};

use super::xml::Element;

pub struct AuthorsExtractor {
    schema: Vec<ColumnSpec>,
}

impl AuthorsExtractor {
    pub fn new() -> Self {
        Self {
            schema: vec![
                ColumnSpec::integer("author_number"),
                ColumnSpec::text("given_names"),
                ColumnSpec::text("surname"),
                ColumnSpec::text("string_name"),
            ],
        }
    }
}

impl Default for AuthorsExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// `contrib` elements that name an author, in document order
pub(crate) fn authors(meta: &Element) -> Vec<&Element> {
    meta.find_all("contrib-group/contrib")
        .into_iter()
        .filter(|c| matches!(c.attr("contrib-type"), None | Some("author")))
        .collect()
}

/// Given names, surname and display name of one contributor
pub(crate) fn author_names(contrib: &Element) -> (Option<String>, Option<String>, Option<String>) {
    let first_text = |name: &str| {
        contrib
            .descendants(name)
            .first()
            .map(|e| e.text())
            .filter(|t| !t.is_empty())
    };
    let given = first_text("given-names");
    let surname = first_text("surname");

    let display = first_text("string-name").or_else(|| match (&given, &surname) {
        (Some(g), Some(s)) => Some(format!("{} {}", g, s)),
        (Some(n), None) | (None, Some(n)) => Some(n.clone()),
        (None, None) => Some(contrib.text()).filter(|t| !t.is_empty()),
    });

    (given, surname, display)
}

impl Extractor for AuthorsExtractor {
    fn name(&self) -> &str {
        "authors"
    }

    fn schema(&self) -> &[ColumnSpec] {
        &self.schema
    }

    fn extract(&self, raw: &[u8]) -> Result<ColumnSet, ExtractionError> {
        let root = Element::parse_rooted(raw, &["article"])?;
        let meta = root
            .find("front/article-meta")
            .ok_or_else(|| ExtractionError::MissingNode("front/article-meta".to_string()))?;

        let mut numbers = Vec::new();
        let mut given_names = Vec::new();
        let mut surnames = Vec::new();
        let mut string_names = Vec::new();

        for (i, contrib) in authors(meta).into_iter().enumerate() {
            let (given, surname, display) = author_names(contrib);
            numbers.push(Value::Integer(i as i64 + 1));
            given_names.push(Value::opt_text(given));
            surnames.push(Value::opt_text(surname));
            string_names.push(Value::opt_text(display));
        }

        Ok(ColumnSet::new()
            .many("author_number", numbers)
            .many("given_names", given_names)
            .many("surname", surnames)
            .many("string_name", string_names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::materialize;

    const DOC: &str = r#"<article>
  <front>
    <article-meta>
      <contrib-group>
        <contrib contrib-type="author">
          <string-name><given-names>Ada</given-names> <surname>Lovelace</surname></string-name>
        </contrib>
        <contrib contrib-type="editor"><string-name>Some Editor</string-name></contrib>
        <contrib>
          <name><surname>Babbage</surname><given-names>Charles</given-names></name>
        </contrib>
      </contrib-group>
    </article-meta>
  </front>
</article>"#;

    #[test]
    fn test_one_row_per_author() {
        let extractor = AuthorsExtractor::new();
        let set = extractor.extract(DOC.as_bytes()).unwrap();
        let rows = materialize(extractor.schema(), "a1", &set).unwrap();

        assert_eq!(
            rows,
            vec![
                vec![
                    Value::text("a1"),
                    Value::Integer(1),
                    Value::text("Ada"),
                    Value::text("Lovelace"),
                    Value::text("Ada Lovelace"),
                ],
                vec![
                    Value::text("a1"),
                    Value::Integer(2),
                    Value::text("Charles"),
                    Value::text("Babbage"),
                    Value::text("Charles Babbage"),
                ],
            ]
        );
    }

    #[test]
    fn test_no_authors_gives_placeholder() {
        let extractor = AuthorsExtractor::new();
        let set = extractor
            .extract(b"<article><front><article-meta/></front></article>")
            .unwrap();
        let rows = materialize(extractor.schema(), "a2", &set).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0][1..].iter().all(Value::is_missing));
    }
}
