//! Terminal progress for imports
//!
//! [`ImportProgress`] is a [`ProgressObserver`] backed by an indicatif bar.
//! It moves only when a chunk is flushed: the position is the number of
//! entries consumed at that point, the message names the last chunk.

use indicatif::{ProgressBar, ProgressStyle};

use crate::runner::{FlushEvent, ProgressObserver};

const BAR_TEMPLATE: &str =
    "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})";

/// Create a progress bar for a known number of entries
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

pub struct ImportProgress {
    bar: ProgressBar,
}

impl ImportProgress {
    pub fn new(total_entries: u64) -> Self {
        Self {
            bar: create_progress_bar(total_entries, "Importing"),
        }
    }

    /// Reporter that draws nothing, for non-interactive runs
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn finish(&self, chunks_written: usize) {
        self.bar
            .finish_with_message(format!("Done: {} chunk(s) written", chunks_written));
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn message(&self) -> String {
        self.bar.message()
    }
}

impl ProgressObserver for ImportProgress {
    fn on_chunk_flushed(&self, event: &FlushEvent) {
        self.bar.set_position(event.entries_processed as u64);
        self.bar.set_message(format!(
            "Importing: {} chunk(s) written, last {}_{}-{} ({} rows)",
            event.chunks_written, event.kind, event.extractor, event.chunk_index, event.rows
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::DocumentKind;
    use std::path::PathBuf;

    fn flushed(chunk_index: usize, entries_processed: usize) -> FlushEvent {
        FlushEvent {
            kind: DocumentKind::JournalArticle,
            extractor: "article".to_string(),
            chunk_index,
            rows: 3,
            path: PathBuf::from(format!("out_journal_article_article-{chunk_index}.csv")),
            chunks_written: chunk_index,
            entries_processed,
        }
    }

    #[test]
    fn test_advances_only_on_flush() {
        let progress = ImportProgress::hidden();
        assert_eq!(progress.position(), 0);

        progress.on_chunk_flushed(&flushed(1, 3));
        assert_eq!(progress.position(), 3);

        progress.on_chunk_flushed(&flushed(2, 7));
        assert_eq!(progress.position(), 7);
        assert!(progress.message().contains("2 chunk(s) written"));
        assert!(progress.message().contains("journal_article_article-2"));
    }
}
