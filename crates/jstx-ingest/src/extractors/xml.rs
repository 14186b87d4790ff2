//! Minimal owned element tree over quick-xml events
//!
//! Metadata documents are small, so the built-in extractors parse them
//! whole and query by element path. Namespace prefixes are dropped from
//! element and attribute names (`xml:lang` is looked up as `lang`).

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::extract::ExtractionError;
use crate::table::Value;

/// Deepest element nesting accepted by [`Element::parse`]
pub const MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

fn malformed(e: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::Malformed(e.to_string())
}

fn local_name(raw: &[u8]) -> Result<String, ExtractionError> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|_| ExtractionError::Encoding)
}

fn open_element(start: &BytesStart<'_>) -> Result<Element, ExtractionError> {
    let mut element = Element {
        name: local_name(start.local_name().as_ref())?,
        ..Default::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(malformed)?;
        let key = local_name(attr.key.local_name().as_ref())?;
        let value = attr.unescape_value().map_err(malformed)?;
        element.attrs.push((key, value.into_owned()));
    }
    Ok(element)
}

impl Element {
    /// Parse a whole document and return its root element
    pub fn parse(raw: &[u8]) -> Result<Element, ExtractionError> {
        let mut reader = Reader::from_reader(raw);
        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event_into(&mut buf).map_err(malformed)? {
                Event::Start(ref e) => {
                    if stack.len() >= MAX_DEPTH {
                        return Err(malformed(format!(
                            "elements nested deeper than {} levels",
                            MAX_DEPTH
                        )));
                    }
                    stack.push(open_element(e)?)
                },
                Event::Empty(ref e) => {
                    let element = open_element(e)?;
                    attach(&mut stack, &mut root, element)?;
                },
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| malformed("closing tag without an open element"))?;
                    attach(&mut stack, &mut root, element)?;
                },
                Event::Text(ref e) => {
                    let text = e.unescape().map_err(malformed)?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                },
                Event::CData(ref e) => {
                    let text = std::str::from_utf8(e).map_err(|_| ExtractionError::Encoding)?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(text.to_string()));
                    }
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(malformed(format!("unexpected end of document inside <{}>", open.name)));
        }
        root.ok_or_else(|| malformed("document has no root element"))
    }

    /// Parse and require a specific root element name
    pub fn parse_rooted(raw: &[u8], expected: &[&str]) -> Result<Element, ExtractionError> {
        let root = Self::parse(raw)?;
        if expected.contains(&root.name.as_str()) {
            Ok(root)
        } else {
            Err(ExtractionError::UnexpectedRoot {
                expected: expected.join("|"),
                found: root.name,
            })
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements, in document order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Follow a `/`-separated path of child names, first match at each step
    pub fn find(&self, path: &str) -> Option<&Element> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |el, step| el.child(step))
    }

    /// All elements reached by a `/`-separated path
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        let mut current = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            let mut next = Vec::new();
            for el in current {
                next.extend(el.elements().filter(|e| e.name == step));
            }
            current = next;
        }
        current
    }

    /// Descendants (self excluded) with the given name, depth-first
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        let mut pending: Vec<&Element> = self.elements().collect();
        pending.reverse();
        while let Some(el) = pending.pop() {
            if el.name == name {
                found.push(el);
            }
            let start = pending.len();
            pending.extend(el.elements());
            pending[start..].reverse();
        }
        found
    }

    /// Text content of the subtree with whitespace runs collapsed
    pub fn text(&self) -> String {
        enum Step<'a> {
            Node(&'a Node),
            Space,
        }

        let mut raw = String::new();
        let mut pending: Vec<Step<'_>> = self.children.iter().rev().map(Step::Node).collect();
        while let Some(step) = pending.pop() {
            match step {
                Step::Space => raw.push(' '),
                Step::Node(Node::Text(t)) => raw.push_str(t),
                Step::Node(Node::Element(e)) => {
                    raw.push(' ');
                    pending.push(Step::Space);
                    pending.extend(e.children.iter().rev().map(Step::Node));
                },
            }
        }
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Non-empty text at a path
    pub fn text_at(&self, path: &str) -> Option<String> {
        self.find(path).map(Element::text).filter(|t| !t.is_empty())
    }

    /// Text of the first child with `attr == value`, e.g. an id of a given type
    pub fn text_where(&self, name: &str, attr: &str, value: &str) -> Option<String> {
        self.children_named(name)
            .find(|e| e.attr(attr) == Some(value))
            .map(Element::text)
            .filter(|t| !t.is_empty())
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ExtractionError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(malformed("document has more than one root element")),
    }
    Ok(())
}

/// Integer column from optional text; non-numeric text is a malformed field
pub fn integer_field(field: &str, text: Option<String>) -> Result<Value, ExtractionError> {
    match text {
        None => Ok(Value::Missing),
        Some(t) => t
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| ExtractionError::MalformedField {
                field: field.to_string(),
                value: t,
            }),
    }
}

/// `year`, `month` and `day` of a `pub-date`-like element
pub fn date_parts(date: Option<&Element>) -> Result<[Value; 3], ExtractionError> {
    let part = |name: &str| date.and_then(|d| d.text_at(name));
    Ok([
        integer_field("pub_year", part("year"))?,
        integer_field("pub_month", part("month"))?,
        integer_field("pub_day", part("day"))?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE article PUBLIC "-//NLM//DTD JATS//EN" "JATS.dtd">
<article xmlns:xlink="http://www.w3.org/1999/xlink" xml:lang="eng">
  <front>
    <article-meta>
      <article-id pub-id-type="jstor">123</article-id>
      <article-id pub-id-type="doi">10.2307/123</article-id>
      <title-group>
        <article-title>On <italic>Things</italic> &amp; Stuff</article-title>
      </title-group>
      <self-uri xlink:href="http://x"/>
      <notes><![CDATA[raw <text>]]></notes>
    </article-meta>
  </front>
</article>"#;

    #[test]
    fn test_parse_and_query() {
        let root = Element::parse(DOC.as_bytes()).unwrap();
        assert_eq!(root.name, "article");
        assert_eq!(root.attr("lang"), Some("eng"));

        let meta = root.find("front/article-meta").unwrap();
        assert_eq!(meta.text_where("article-id", "pub-id-type", "doi").as_deref(), Some("10.2307/123"));
        assert_eq!(
            meta.text_at("title-group/article-title").as_deref(),
            Some("On Things & Stuff")
        );
        assert_eq!(meta.child("self-uri").unwrap().attr("href"), Some("http://x"));
        assert_eq!(meta.text_at("notes").as_deref(), Some("raw <text>"));
        assert_eq!(root.find_all("front/article-meta/article-id").len(), 2);
        assert_eq!(root.descendants("article-id").len(), 2);
        assert!(root.text_at("front/missing").is_none());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(Element::parse(b"<a><b></a>"), Err(ExtractionError::Malformed(_))));
        assert!(matches!(Element::parse(b"<a><b>"), Err(ExtractionError::Malformed(_))));
        assert!(matches!(Element::parse(b""), Err(ExtractionError::Malformed(_))));

        let err = Element::parse_rooted(b"<book/>", &["article"]).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::UnexpectedRoot {
                expected: "article".to_string(),
                found: "book".to_string()
            }
        );
    }

    fn nested(depth: usize) -> String {
        format!("<root>{}x{}</root>", "<n>".repeat(depth), "</n>".repeat(depth))
    }

    #[test]
    fn test_nesting_limit() {
        let root = Element::parse(nested(MAX_DEPTH - 1).as_bytes()).unwrap();
        assert_eq!(root.text(), "x");
        assert_eq!(root.descendants("n").len(), MAX_DEPTH - 1);

        let err = Element::parse(nested(500_000).as_bytes()).unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed(ref m) if m.contains("nested deeper")));
    }

    #[test]
    fn test_text_keeps_element_boundaries() {
        let root = Element::parse(b"<p><i>a</i>b<b>c<i>d</i></b>e</p>").unwrap();
        assert_eq!(root.text(), "a b c d e");

        // pre-order: the `a` holding a child comes before the one nested in `b`
        let root = Element::parse(b"<r><a><b/></a><b><a/></b></r>").unwrap();
        let found = root.descendants("a");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].elements().count(), 1);
        assert_eq!(found[1].elements().count(), 0);
    }

    #[test]
    fn test_date_parts() {
        let root = Element::parse(b"<d><year>1999</year><month> 04 </month></d>").unwrap();
        let [year, month, day] = date_parts(Some(&root)).unwrap();
        assert_eq!(year, Value::Integer(1999));
        assert_eq!(month, Value::Integer(4));
        assert_eq!(day, Value::Missing);

        let root = Element::parse(b"<d><year>circa 1900</year></d>").unwrap();
        assert!(matches!(date_parts(Some(&root)), Err(ExtractionError::MalformedField { .. })));
    }
}
