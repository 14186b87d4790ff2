//! Shared fixtures: zip archives of small JATS-like documents
#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jstx_ingest::extract::ExtractionSpec;
use jstx_ingest::extractors::{ArticleExtractor, AuthorsExtractor};
use jstx_ingest::kind::DocumentKind;

pub fn stem(i: usize) -> String {
    format!("journal-article-10.2307_{}", i)
}

pub fn entry_name(i: usize) -> String {
    format!("metadata/{}.xml", stem(i))
}

/// Article `i` has `i % 3` authors and a title but no subtitle
pub fn article_xml(i: usize) -> String {
    let contribs: String = (0..i % 3)
        .map(|a| {
            format!(
                r#"<contrib contrib-type="author"><name><given-names>G{a}</given-names><surname>S{i}</surname></name></contrib>"#
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<article article-type="research-article" xml:lang="eng">
  <front>
    <journal-meta><journal-id journal-id-type="jstor">testjournal</journal-id></journal-meta>
    <article-meta>
      <article-id pub-id-type="doi">10.2307/{i}</article-id>
      <title-group><article-title>Article number {i}</article-title></title-group>
      <contrib-group>{contribs}</contrib-group>
      <pub-date><year>{year}</year></pub-date>
      <volume>{i}</volume>
    </article-meta>
  </front>
</article>"#,
        year = 1900 + i
    )
}

pub const MALFORMED_XML: &str = "<article><front><article-meta>";

pub fn write_zip(path: &Path, files: &[(String, String)]) -> PathBuf {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, content) in files {
        writer
            .start_file(name.as_str(), zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path.to_path_buf()
}

/// Archive of articles `1..=count`; indices in `malformed` get broken XML
pub fn article_zip(dir: &Path, name: &str, count: usize, malformed: &[usize]) -> PathBuf {
    let files: Vec<(String, String)> = (1..=count)
        .map(|i| {
            let body = if malformed.contains(&i) {
                MALFORMED_XML.to_string()
            } else {
                article_xml(i)
            };
            (entry_name(i), body)
        })
        .collect();
    write_zip(&dir.join(name), &files)
}

pub fn article_only_spec() -> ExtractionSpec {
    ExtractionSpec::builder()
        .register(DocumentKind::JournalArticle, ArticleExtractor::new())
        .unwrap()
        .build()
}

pub fn article_and_authors_spec() -> ExtractionSpec {
    ExtractionSpec::builder()
        .register_shared(DocumentKind::JournalArticle, Arc::new(ArticleExtractor::new()))
        .and_then(|b| b.register(DocumentKind::JournalArticle, AuthorsExtractor::new()))
        .unwrap()
        .build()
}
