use anyhow::Result;
use clap::{Parser, Subcommand};
use pubmed_crawl::{corpus, crawl, expand, parse};

#[derive(Parser)]
#[command(name = "pubmed-crawl")]
#[command(about = "Crawl PubMed for an author's records and parse the MEDLINE text into JSON")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and parse an author's search result pages
    Crawl(crawl::CrawlArgs),
    /// Crawl an author, then their co-authors, round by round
    Expand(expand::ExpandArgs),
    /// Rebuild an author's records from the archived raw pages
    Reparse(parse::ReparseArgs),
    /// Write an author's records as one JSON document
    Export(corpus::ExportArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }

    match cli.command {
        Commands::Crawl(args) => crawl::run(args),
        Commands::Expand(args) => expand::run(args),
        Commands::Reparse(args) => parse::run(args),
        Commands::Export(args) => corpus::run(args),
    }
}
