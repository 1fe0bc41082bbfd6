use once_cell::sync::Lazy;
use regex::Regex;

static PMID_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"PMID\s*-\s*\d+").unwrap());

/// Splits page text into one segment per record. Text before the first PMID
/// marker is discarded; each segment starts with its marker.
pub fn split_segments(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = PMID_MARKER.find_iter(text).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            text[start..end].trim()
        })
        .collect()
}
