use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::filter::filter_by_author;
use crate::page_digest;
use crate::parse::{page_text, parse_page};

mod fetcher;
mod layout;
mod politeness;
mod status;
pub use fetcher::{FetchOutcome, PageFetcher};
pub use layout::{write_pretty_json, AuthorLayout};
pub use politeness::Politeness;
pub use status::{CrawlState, CrawlStatus, PageEntry};

pub const DEFAULT_BASE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

/// Settings for a crawl, independent of how they were supplied.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub root: PathBuf,
    pub base_url: String,
    pub page_size: usize,
    /// Highest page fetched; pages run 1..=max_pages.
    pub max_pages: u32,
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
    pub timeout: u64,
    pub stop_on_mismatch: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("results"),
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 200,
            max_pages: 5,
            delay_min_ms: 1000,
            delay_max_ms: 2000,
            timeout: 30,
            stop_on_mismatch: false,
        }
    }
}

/// Crawl flags shared by `crawl` and `expand`.
#[derive(Args, Debug, Clone)]
pub struct CrawlOptions {
    /// Results root; one directory per author is created inside
    #[arg(short, long, default_value = "results")]
    pub root: PathBuf,

    /// Search interface base URL
    #[arg(short = 'u', long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Results per page
    #[arg(long, default_value = "200")]
    pub page_size: usize,

    /// Last page to fetch
    #[arg(short, long, default_value = "5")]
    pub max_pages: u32,

    /// Minimum pause between page requests in milliseconds
    #[arg(long, default_value = "1000")]
    pub delay_min_ms: u64,

    /// Maximum pause between page requests in milliseconds
    #[arg(long, default_value = "2000")]
    pub delay_max_ms: u64,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "30")]
    pub timeout: u64,

    /// Stop paging once a page lists a record the author is not on
    #[arg(long)]
    pub stop_on_mismatch: bool,
}

impl CrawlOptions {
    pub fn config(&self) -> CrawlConfig {
        CrawlConfig {
            root: self.root.clone(),
            base_url: self.base_url.clone(),
            page_size: self.page_size,
            max_pages: self.max_pages,
            delay_min_ms: self.delay_min_ms,
            delay_max_ms: self.delay_max_ms,
            timeout: self.timeout,
            stop_on_mismatch: self.stop_on_mismatch,
        }
    }
}

#[derive(Args)]
pub struct CrawlArgs {
    /// Author as PubMed lists it, e.g. "Mishra, Neha"
    #[arg(short, long)]
    pub author: String,

    #[command(flatten)]
    pub options: CrawlOptions,
}

/// Why a crawl ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlStop {
    /// The author was already crawled; nothing was fetched.
    Cached,
    /// The last allowed page was processed.
    PageLimit,
    /// The search ran out of pages: a non-success status (`status` set), an
    /// empty page, or a repeat of the previous page.
    Exhausted { page: u32, status: Option<u16> },
    /// `stop_on_mismatch` was set and a page listed someone else's record.
    OutOfScope { page: u32 },
    /// A request failed without a response; the crawl can be resumed.
    TransientError { page: u32, error: String },
}

impl CrawlStop {
    pub fn label(&self) -> &'static str {
        match self {
            CrawlStop::Cached => "cached",
            CrawlStop::PageLimit => "page_limit",
            CrawlStop::Exhausted { .. } => "exhausted",
            CrawlStop::OutOfScope { .. } => "out_of_scope",
            CrawlStop::TransientError { .. } => "transient_error",
        }
    }

    /// Whether the author's crawl counts as finished after this stop.
    pub fn completes(&self) -> bool {
        !matches!(self, CrawlStop::TransientError { .. })
    }
}

#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub author: String,
    /// The author's `processed/` directory.
    pub output_dir: PathBuf,
    /// Pages fetched by this invocation.
    pub pages_fetched: u32,
    /// Records written by this invocation.
    pub records_saved: usize,
    /// Segments dropped by the parser during this invocation.
    pub rejected: usize,
    pub stop: CrawlStop,
}

impl CrawlReport {
    pub fn is_cached(&self) -> bool {
        self.stop == CrawlStop::Cached
    }
}

pub struct Crawler {
    fetcher: PageFetcher,
    politeness: Politeness,
    config: CrawlConfig,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let fetcher = PageFetcher::new(config.base_url.clone(), config.page_size, config.timeout)
            .context("Failed to build HTTP client")?;
        let politeness = Politeness::from_millis(config.delay_min_ms, config.delay_max_ms)?;

        Ok(Self {
            fetcher,
            politeness,
            config,
        })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn layout(&self, author: &str) -> AuthorLayout {
        AuthorLayout::new(&self.config.root, author)
    }

    /// Crawls one author: pages 1..=max_pages, one request at a time, each
    /// spaced from the crawler's previous request. An author whose crawl
    /// completed before is skipped; an interrupted one resumes after its last
    /// fetched page.
    pub async fn crawl(&self, author: &str) -> Result<CrawlReport> {
        let layout = self.layout(author);
        let mut report = CrawlReport {
            author: author.to_string(),
            output_dir: layout.processed_dir(),
            pages_fetched: 0,
            records_saved: 0,
            rejected: 0,
            stop: CrawlStop::Cached,
        };

        let mut status = match CrawlStatus::load(layout.status_path())
            .with_context(|| format!("Failed to read status for {}", author))?
        {
            Some(status) if status.is_complete() => {
                info!("Author {} has been searched before. Skipping...", author);
                return Ok(report);
            }
            Some(status) => {
                info!(
                    "Resuming {} after page {}",
                    author,
                    status.pages_fetched()
                );
                status
            }
            None if layout.exists() => {
                info!(
                    "Author {} has a results directory without status. Skipping...",
                    author
                );
                return Ok(report);
            }
            None => CrawlStatus::new(layout.status_path(), author),
        };

        layout.create_dirs()?;
        status.save().context("Failed to save crawl status")?;

        let mut page = status.pages_fetched() + 1;
        let pb = ProgressBar::new(self.config.max_pages as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] page {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        pb.set_position(status.pages_fetched().min(self.config.max_pages) as u64);

        let stop = loop {
            if page > self.config.max_pages {
                break CrawlStop::PageLimit;
            }

            self.politeness.pace().await;
            let body = match self.fetcher.fetch_page(author, page).await {
                FetchOutcome::Page(body) => body,
                FetchOutcome::Exhausted { status: code } => {
                    break CrawlStop::Exhausted {
                        page,
                        status: Some(code),
                    }
                }
                FetchOutcome::TransientError(error) => {
                    break CrawlStop::TransientError { page, error }
                }
            };

            report.pages_fetched += 1;
            layout.save_raw(page, &body)?;

            let digest = page_digest(&body);
            if status.last_digest() == Some(digest.as_str()) {
                info!("Page {} repeats page {}; no more results", page, page - 1);
                status.record_page(PageEntry {
                    page,
                    digest,
                    segments: 0,
                    matched: 0,
                    rejected: 0,
                    first_mismatch: 0,
                });
                status.save().context("Failed to save crawl status")?;
                pb.inc(1);
                break CrawlStop::Exhausted { page, status: None };
            }

            let parsed = parse_page(&page_text(&body));
            for e in &parsed.rejected {
                warn!("{} page {}: {}", author, page, e);
            }

            let listed = parsed.records.len();
            let matches = filter_by_author(parsed.records, author);
            let mut saved = 0;
            for record in &matches.records {
                if layout.save_record(record)?.is_some() {
                    saved += 1;
                }
            }

            info!(
                "Page {}: {} segments, {} records for {}, first mismatch at {}",
                page, parsed.segments, saved, author, matches.first_mismatch
            );

            report.records_saved += saved;
            report.rejected += parsed.rejected.len();
            status.record_page(PageEntry {
                page,
                digest,
                segments: parsed.segments,
                matched: saved,
                rejected: parsed.rejected.len(),
                first_mismatch: matches.first_mismatch,
            });
            status.save().context("Failed to save crawl status")?;
            pb.inc(1);

            if parsed.segments == 0 {
                break CrawlStop::Exhausted { page, status: None };
            }
            if self.config.stop_on_mismatch && matches.first_mismatch < listed {
                break CrawlStop::OutOfScope { page };
            }

            page += 1;
        };

        if stop.completes() {
            status.finish(stop.label());
        } else {
            status.interrupt(stop.label());
        }
        status.save().context("Failed to save crawl status")?;
        pb.finish_with_message(stop.label());

        info!(
            "Crawl of {} stopped ({}): {} pages, {} records",
            author,
            stop.label(),
            report.pages_fetched,
            report.records_saved
        );
        report.stop = stop;
        Ok(report)
    }
}

pub fn run(args: CrawlArgs) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(run_async(args))?;
    info!("Output: {}", report.output_dir.display());
    Ok(())
}

pub async fn run_async(args: CrawlArgs) -> Result<CrawlReport> {
    let crawler = Crawler::new(args.options.config())?;
    crawler.crawl(&args.author).await
}
