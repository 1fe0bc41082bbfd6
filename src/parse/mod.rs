use anyhow::{Context, Result};
use clap::Args;
use glob::glob;
use rayon::prelude::*;
use scraper::{Html, Selector};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::crawl::AuthorLayout;
use crate::filter::filter_by_author;
use crate::{ParseError, Record};

mod assemble;
mod chunker;
mod lines;
pub use assemble::{assemble_record, normalize_value};
pub use chunker::split_segments;
pub use lines::{is_field_start, join_lines, FieldLine};

/// Records recovered from one page, plus the segments that had to be dropped.
#[derive(Debug, Default)]
pub struct PageParse {
    pub segments: usize,
    pub records: Vec<Record>,
    pub rejected: Vec<ParseError>,
}

#[derive(Args)]
pub struct ReparseArgs {
    /// Results root containing one directory per author
    #[arg(short, long, default_value = "results")]
    pub root: PathBuf,

    /// Author as searched, e.g. "Mishra, Neha"
    #[arg(short, long)]
    pub author: String,
}

/// Plain text of a fetched page. The MEDLINE block is preferred when the page
/// carries one; otherwise all text of the document is used.
pub fn page_text(body: &str) -> String {
    let document = Html::parse_document(body);

    let chunks: Vec<String> = match Selector::parse("pre.search-results-chunks") {
        Ok(selector) => document
            .select(&selector)
            .map(|element| element.text().collect::<String>())
            .collect(),
        Err(_) => Vec::new(),
    };

    if chunks.is_empty() {
        document.root_element().text().collect()
    } else {
        chunks.join("\n")
    }
}

pub fn parse_segment(segment: &str) -> Result<Record, ParseError> {
    let fields = join_lines(segment)?;
    assemble_record(&fields)
}

/// Parses page text into records. Bad segments are collected, never fatal.
pub fn parse_page(text: &str) -> PageParse {
    let mut page = PageParse::default();

    for segment in split_segments(text) {
        page.segments += 1;
        match parse_segment(segment) {
            Ok(record) => page.records.push(record),
            Err(e) => page.rejected.push(e),
        }
    }

    page
}

pub fn find_raw_pages<P: AsRef<Path>>(raw_dir: P) -> Result<Vec<(u32, PathBuf)>> {
    let pattern = raw_dir.as_ref().join("*.html");
    let pattern_str = pattern.to_string_lossy();

    let mut pages: Vec<(u32, PathBuf)> = glob(&pattern_str)?
        .filter_map(Result::ok)
        .filter_map(|path| {
            let page = path.file_stem()?.to_str()?.parse::<u32>().ok()?;
            Some((page, path))
        })
        .collect();
    pages.sort_by_key(|(page, _)| *page);
    Ok(pages)
}

/// Summary of one reparse pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReparseSummary {
    pub pages: usize,
    pub written: usize,
    pub rejected: usize,
}

/// Rebuilds an author's processed records from the archived raw pages.
pub fn reparse_author(layout: &AuthorLayout) -> Result<ReparseSummary> {
    let pages = find_raw_pages(layout.raw_dir())?;

    let parsed: Vec<(u32, PageParse)> = pages
        .par_iter()
        .map(|(page, path)| -> Result<(u32, PageParse)> {
            let body = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok((*page, parse_page(&page_text(&body))))
        })
        .collect::<Result<_>>()?;

    layout.create_dirs()?;
    let mut summary = ReparseSummary {
        pages: parsed.len(),
        ..Default::default()
    };

    for (page, page_parse) in parsed {
        for e in &page_parse.rejected {
            warn!("page {}: {}", page, e);
        }
        summary.rejected += page_parse.rejected.len();

        let matches = filter_by_author(page_parse.records, layout.author());
        for record in &matches.records {
            if layout.save_record(record)?.is_some() {
                summary.written += 1;
            }
        }
    }

    Ok(summary)
}

pub fn run(args: ReparseArgs) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let layout = AuthorLayout::new(&args.root, &args.author);
    let summary = reparse_author(&layout)?;

    info!(
        "Reparsed {} pages for {}: {} records written, {} rejected",
        summary.pages,
        args.author,
        summary.written,
        summary.rejected
    );
    info!("Output: {}", layout.processed_dir().display());

    Ok(())
}
