use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{author_dir_name, Record};

/// On-disk layout of one author's results:
///
/// ```text
/// <root>/<Last_First>/
///     processed/<pmid>.json
///     raw/<page>.html
///     status.json
/// ```
#[derive(Debug, Clone)]
pub struct AuthorLayout {
    author: String,
    dir: PathBuf,
}

impl AuthorLayout {
    pub fn new<P: AsRef<Path>>(root: P, author: &str) -> Self {
        Self {
            author: author.to_string(),
            dir: root.as_ref().join(author_dir_name(author)),
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.dir.join("processed")
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.dir.join("raw")
    }

    pub fn status_path(&self) -> PathBuf {
        self.dir.join("status.json")
    }

    pub fn exists(&self) -> bool {
        self.dir.exists()
    }

    pub fn create_dirs(&self) -> Result<()> {
        for dir in [self.processed_dir(), self.raw_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    /// Writes the record as `processed/<pmid>.json`. Returns `None` for a
    /// record whose PMID has no alphanumeric characters.
    pub fn save_record(&self, record: &Record) -> Result<Option<PathBuf>> {
        let stem = match record.file_stem() {
            Some(s) => s,
            None => return Ok(None),
        };

        let path = self.processed_dir().join(format!("{}.json", stem));
        write_pretty_json(&path, record)?;
        Ok(Some(path))
    }

    /// Archives a fetched page body verbatim as `raw/<page>.html`.
    pub fn save_raw(&self, page: u32, body: &str) -> Result<PathBuf> {
        let path = self.raw_dir().join(format!("{}.html", page));
        fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// Four-space indented JSON, non-ASCII kept as is.
pub fn write_pretty_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}
