//! jstx - bulk extraction and import of bibliographic archives

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jstx_common::logging::{init_logging, LogConfig, LogLevel};
use jstx_ingest::allow_list::AllowList;
use jstx_ingest::archive::{preview, ArchiveIndex, EntryReader};
use jstx_ingest::config::ImportSettings;
use jstx_ingest::extractors::{default_spec, parse_assignment, spec_from_assignments};
use jstx_ingest::ngram;
use jstx_ingest::progress::ImportProgress;
use jstx_ingest::runner::{import_archives, BatchRunner};
use jstx_ingest::sink::{re_import, write_table, CsvSink};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "jstx")]
#[command(author, version, about = "Bulk extraction and import of bibliographic archives")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract records from archives into chunked CSV files
    Import {
        /// Zip archives, processed in the order given
        #[arg(required = true)]
        zips: Vec<PathBuf>,

        /// Output path prefix [env: JSTX_OUTPUT_PREFIX]
        #[arg(short, long)]
        out_prefix: Option<PathBuf>,

        /// Documents per chunk file [env: JSTX_CHUNK_SIZE]
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Entries processed concurrently [env: JSTX_PARALLELISM]
        #[arg(short = 'j', long)]
        parallelism: Option<usize>,

        /// Only import documents whose stem is listed in this file
        #[arg(long)]
        allow_list: Option<PathBuf>,

        /// Extractors per kind, e.g. journal_article=article,authors
        #[arg(long = "extract", value_name = "KIND=NAME[,NAME]")]
        extract: Vec<String>,

        /// Write the run summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Count entries per document kind without reading them
    Preview {
        #[arg(required = true)]
        zips: Vec<PathBuf>,
    },

    /// Concatenate chunk files into one typed CSV file
    Reimport {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Combine all n-gram files of one order into one CSV file
    Ngrams {
        #[arg(required = true)]
        zips: Vec<PathBuf>,

        /// N-gram order
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=3))]
        order: u8,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Only combine documents whose stem is listed in this file
        #[arg(long)]
        allow_list: Option<PathBuf>,
    },
}

fn load_allow_list(path: Option<PathBuf>) -> Result<Option<AllowList>> {
    path.map(|p| {
        AllowList::from_file(&p).with_context(|| format!("Failed to read allow-list {}", p.display()))
    })
    .transpose()
}

#[allow(clippy::too_many_arguments)]
async fn run_import(
    zips: Vec<PathBuf>,
    out_prefix: Option<PathBuf>,
    chunk_size: Option<usize>,
    parallelism: Option<usize>,
    allow_list: Option<PathBuf>,
    extract: Vec<String>,
    summary: Option<PathBuf>,
    no_progress: bool,
) -> Result<()> {
    let settings =
        ImportSettings::from_env()?.with_overrides(chunk_size, parallelism, out_prefix);
    settings.validate()?;

    let spec = if extract.is_empty() {
        default_spec()?
    } else {
        let assignments = extract
            .iter()
            .map(|raw| parse_assignment(raw))
            .collect::<jstx_ingest::Result<Vec<_>>>()?;
        spec_from_assignments(&assignments)?
    };

    let allow_list = load_allow_list(allow_list)?;
    let total = ArchiveIndex::open(&zips, allow_list.clone())?.entries().count();

    let progress = Arc::new(if no_progress {
        ImportProgress::hidden()
    } else {
        ImportProgress::new(total as u64)
    });

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; finishing in-flight entries");
            interrupt.cancel();
        }
    });

    info!(
        archives = zips.len(),
        entries = total,
        prefix = %settings.output_prefix.display(),
        "Importing"
    );

    let runner = BatchRunner::new(
        spec,
        Arc::new(CsvSink::new(&settings.output_prefix)),
        settings.run_options(),
    )
    .with_observer(progress.clone())
    .with_cancellation(token);

    let result = import_archives(&runner, &zips, allow_list).await?;
    progress.finish(result.chunks.len());

    println!("{}", result.summary());

    if let Some(path) = summary {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write summary {}", path.display()))?;
    }

    if result.cancelled {
        warn!(
            entries = result.entries_seen,
            "Import was cancelled; completed entries were written"
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("jstx")
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env()?;
    let _guard = init_logging(&log_config)?;

    match cli.command {
        Command::Import {
            zips,
            out_prefix,
            chunk_size,
            parallelism,
            allow_list,
            extract,
            summary,
            no_progress,
        } => {
            run_import(
                zips,
                out_prefix,
                chunk_size,
                parallelism,
                allow_list,
                extract,
                summary,
                no_progress,
            )
            .await?;
        },
        Command::Preview { zips } => {
            let preview = preview(&zips)?;
            println!("{} archive(s), {} file(s)", preview.archives, preview.total());
            for (kind, count) in &preview.counts {
                println!("  {:<16} {:>10}", kind.as_str(), count);
            }
        },
        Command::Reimport { files, output } => {
            let table = re_import(&files)?;
            write_table(&output, &table)?;
            info!(files = files.len(), rows = table.len(), output = %output.display(), "Re-imported");
        },
        Command::Ngrams {
            zips,
            order,
            output,
            allow_list,
        } => {
            let allow_list = load_allow_list(allow_list)?;
            let summary = tokio::task::spawn_blocking(move || {
                let entries = ArchiveIndex::open(&zips, allow_list)?.entries();
                ngram::combine(entries, &EntryReader::new(), order, &output)
            })
            .await??;
            println!(
                "{} document(s), {} row(s) -> {} ({} failed, see {})",
                summary.documents,
                summary.rows,
                summary.path.display(),
                summary.failures.len(),
                summary.failure_log.display()
            );
        },
    }

    Ok(())
}
