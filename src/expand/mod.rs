use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use tracing::{error, info};

use crate::corpus::discover_authors;
use crate::crawl::{CrawlOptions, CrawlReport, Crawler};

#[derive(Args)]
pub struct ExpandArgs {
    /// Author the expansion starts from
    #[arg(short, long)]
    pub author: String,

    /// Number of crawl rounds; 1 crawls only the starting author
    #[arg(short, long, default_value = "1")]
    pub depth: usize,

    #[command(flatten)]
    pub options: CrawlOptions,
}

/// Crawls `root_author`, then for each further round every co-author found in
/// the results root that this run has not searched yet.
pub async fn expand(crawler: &Crawler, root_author: &str, depth: usize) -> Result<Vec<CrawlReport>> {
    let mut searched: HashSet<String> = HashSet::new();
    let mut reports = Vec::new();

    searched.insert(root_author.to_string());
    reports.push(crawler.crawl(root_author).await?);

    for round in 1..depth {
        let pending: Vec<String> = discover_authors(&crawler.config().root)?
            .into_iter()
            .filter(|author| !searched.contains(author))
            .collect();

        info!("Round {}: {} new authors", round, pending.len());
        if pending.is_empty() {
            break;
        }

        let pb = ProgressBar::new(pending.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40}] {pos}/{len} authors (depth {msg})")?
                .progress_chars("#>-"),
        );
        pb.set_message(round.to_string());

        for author in pending {
            searched.insert(author.clone());
            match crawler.crawl(&author).await {
                Ok(report) => reports.push(report),
                Err(e) => error!("Crawl of {} failed: {:#}", author, e),
            }
            pb.inc(1);
        }
        pb.finish();
    }

    Ok(reports)
}

pub fn run(args: ExpandArgs) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(args))
}

pub async fn run_async(args: ExpandArgs) -> Result<()> {
    let crawler = Crawler::new(args.options.config())?;
    let reports = expand(&crawler, &args.author, args.depth).await?;

    let fresh = reports.iter().filter(|r| !r.is_cached()).count();
    let records: usize = reports.iter().map(|r| r.records_saved).sum();
    info!(
        "Expansion complete: {} authors ({} crawled now), {} new records",
        reports.len(),
        fresh,
        records
    );
    Ok(())
}
