//! Reading written chunks back

mod common;

use std::sync::Arc;

use common::*;
use jstx_ingest::kind::DocumentKind;
use jstx_ingest::ngram;
use jstx_ingest::archive::{ArchiveIndex, EntryReader};
use jstx_ingest::runner::{import_archives, BatchRunner, RunOptions};
use jstx_ingest::sink::{re_import, read_typed, write_table, CsvSink};
use jstx_ingest::table::{ColumnType, Value};

#[tokio::test]
async fn test_reimport_concatenates_chunks_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let zip = article_zip(dir.path(), "a.zip", 11, &[4]);

    let runner = BatchRunner::new(
        article_only_spec(),
        Arc::new(CsvSink::new(dir.path().join("out"))),
        RunOptions {
            chunk_size: 4,
            parallelism: 2,
        },
    );
    let result = import_archives(&runner, &[&zip], None).await.unwrap();
    let paths: Vec<_> = result
        .chunks_for(DocumentKind::JournalArticle, "article")
        .map(|c| c.path.clone())
        .collect();
    assert_eq!(paths.len(), 3);

    let table = re_import(&paths).unwrap();
    assert_eq!(table.len(), 11);
    let expected: Vec<Value> = (1..=11).map(|i| Value::text(stem(i))).collect();
    assert_eq!(
        table.column("file_name").unwrap(),
        expected.iter().collect::<Vec<_>>()
    );

    let year = table.column_index("pub_year").unwrap();
    assert_eq!(table.schema[year].column_type, ColumnType::Integer);
    assert_eq!(table.rows[0][year], Value::Integer(1901));
    // the malformed document and the absent subtitle stay missing
    assert_eq!(table.rows[3][year], Value::Missing);
    let subtitle = table.column_index("subtitle").unwrap();
    assert!(table.rows.iter().all(|r| r[subtitle].is_missing()));
}

#[tokio::test]
async fn test_reimport_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let zip = article_zip(dir.path(), "a.zip", 5, &[2]);

    let runner = BatchRunner::new(
        article_and_authors_spec(),
        Arc::new(CsvSink::new(dir.path().join("out"))),
        RunOptions {
            chunk_size: 2,
            parallelism: 3,
        },
    );
    let result = import_archives(&runner, &[&zip], None).await.unwrap();
    let authors: Vec<_> = result
        .chunks_for(DocumentKind::JournalArticle, "authors")
        .map(|c| c.path.clone())
        .collect();

    let first = re_import(&authors).unwrap();
    let combined = dir.path().join("authors.csv");
    write_table(&combined, &first).unwrap();
    let second = read_typed(&combined).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_ngram_combination_reads_back_typed() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        (
            "ngram2/journal-article-10.2307_1-ngram2.txt".to_string(),
            "of the\t4\n\\weird\t1\n".to_string(),
        ),
        (
            "ngram2/journal-article-10.2307_2-ngram2.txt".to_string(),
            "in a\t2\n".to_string(),
        ),
        (entry_name(1), article_xml(1)),
    ];
    let zip = write_zip(&dir.path().join("ngrams.zip"), &files);

    let entries = ArchiveIndex::open(&[&zip], None).unwrap().entries();
    let output = dir.path().join("bigrams.csv");
    let summary = ngram::combine(entries, &EntryReader::new(), 2, &output).unwrap();

    assert_eq!(summary.documents, 2);
    assert_eq!(summary.skipped, 1);
    let table = read_typed(&output).unwrap();
    assert_eq!(
        table.rows,
        vec![
            vec![Value::text(stem(1)), Value::text("of the"), Value::Integer(4)],
            vec![Value::text(stem(1)), Value::text("\\weird"), Value::Integer(1)],
            vec![Value::text(stem(2)), Value::text("in a"), Value::Integer(2)],
        ]
    );
}
