use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use xxhash_rust::xxh3::xxh3_64;

pub mod corpus;
pub mod crawl;
pub mod error;
pub mod expand;
pub mod filter;
pub mod parse;

pub use error::ParseError;

/// Unique identifier field; also the record boundary marker.
pub const PMID: &str = "PMID";
/// Full author name, one value per author in byline order.
pub const FULL_AUTHOR: &str = "FAU";
/// Affiliation of the most recent full author.
pub const AFFILIATION: &str = "AD";

pub fn page_digest(body: &str) -> String {
    format!("{:016x}", xxh3_64(body.as_bytes()))
}

/// Directory name used for an author's results ("Mishra, Neha" -> "Mishra_Neha").
pub fn author_dir_name(author: &str) -> String {
    author.replace(", ", "_")
}

/// Key under which affiliations of one author are grouped, e.g. "Doe, Jane_AD".
pub fn affiliation_key(author: &str) -> String {
    format!("{}_{}", author, AFFILIATION)
}

/// One bibliographic entry: field code -> values in order of occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Vec<String>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, code: &str, value: String) {
        self.fields.entry(code.to_string()).or_default().push(value);
    }

    pub fn get(&self, code: &str) -> Option<&[String]> {
        self.fields.get(code).map(Vec::as_slice)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.fields.contains_key(code)
    }

    pub fn pmid(&self) -> Option<&str> {
        self.get(PMID).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn authors(&self) -> &[String] {
        self.get(FULL_AUTHOR).unwrap_or_default()
    }

    pub fn has_author(&self, author: &str) -> bool {
        self.authors().iter().any(|a| a == author)
    }

    pub fn affiliations_of(&self, author: &str) -> &[String] {
        self.get(&affiliation_key(author)).unwrap_or_default()
    }

    /// File stem for the persisted record: the PMID with non-alphanumerics dropped.
    pub fn file_stem(&self) -> Option<String> {
        let stem: String = self.pmid()?.chars().filter(|c| c.is_alphanumeric()).collect();
        if stem.is_empty() {
            None
        } else {
            Some(stem)
        }
    }
}
