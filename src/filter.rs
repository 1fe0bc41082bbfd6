use crate::Record;

/// Records credited to the searched author, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorMatches {
    pub records: Vec<Record>,
    /// Index of the first record that does not list the author (the number of
    /// leading matches). Equals the input length when every record matches.
    pub first_mismatch: usize,
}

/// Keeps the records whose full author list contains `author` exactly.
pub fn filter_by_author(records: Vec<Record>, author: &str) -> AuthorMatches {
    let first_mismatch = records
        .iter()
        .position(|record| !record.has_author(author))
        .unwrap_or(records.len());

    let records = records
        .into_iter()
        .filter(|record| record.has_author(author))
        .collect();

    AuthorMatches {
        records,
        first_mismatch,
    }
}
