use anyhow::{bail, Result};
use clap::Args;
use glob::glob;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::crawl::{write_pretty_json, AuthorLayout};
use crate::Record;

/// What downstream consumers get: the searched author and their records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Corpus {
    pub author: String,
    pub records: Vec<Record>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Results root containing one directory per author
    #[arg(short, long, default_value = "results")]
    pub root: PathBuf,

    /// Author as searched, e.g. "Mishra, Neha"
    #[arg(short, long)]
    pub author: String,

    /// Output JSON file
    #[arg(short, long, default_value = "info_data.json")]
    pub output: PathBuf,
}

fn json_files(pattern: &Path) -> Result<Vec<PathBuf>> {
    let pattern_str = pattern.to_string_lossy();
    let mut files: Vec<PathBuf> = glob(&pattern_str)?.filter_map(Result::ok).collect();
    files.sort();
    Ok(files)
}

fn read_record(path: &Path) -> Option<Record> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Skipping {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Skipping {}: {}", path.display(), e);
            None
        }
    }
}

/// Loads every persisted record in a `processed/` directory, ordered by file name.
pub fn load_records<P: AsRef<Path>>(processed_dir: P) -> Result<Vec<Record>> {
    let files = json_files(&processed_dir.as_ref().join("*.json"))?;
    Ok(files.par_iter().filter_map(|path| read_record(path)).collect())
}

pub fn load_corpus<P: AsRef<Path>>(root: P, author: &str) -> Result<Corpus> {
    let layout = AuthorLayout::new(root, author);
    let processed = layout.processed_dir();
    if !processed.is_dir() {
        bail!("No results for {} under {}", author, processed.display());
    }

    Ok(Corpus {
        author: author.to_string(),
        records: load_records(&processed)?,
    })
}

/// Every full author name across all crawled authors, in first-seen order.
pub fn discover_authors<P: AsRef<Path>>(root: P) -> Result<Vec<String>> {
    let files = json_files(&root.as_ref().join("*").join("processed").join("*.json"))?;
    let records: Vec<Record> = files.par_iter().filter_map(|path| read_record(path)).collect();

    let mut seen = HashSet::new();
    let mut authors = Vec::new();
    for record in &records {
        for author in record.authors() {
            if seen.insert(author.clone()) {
                authors.push(author.clone());
            }
        }
    }
    Ok(authors)
}

pub fn run(args: ExportArgs) -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let corpus = load_corpus(&args.root, &args.author)?;
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    write_pretty_json(&args.output, &corpus)?;

    info!(
        "Exported {} records for {} to {}",
        corpus.records.len(),
        corpus.author,
        args.output.display()
    );
    Ok(())
}
