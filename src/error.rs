use thiserror::Error;

/// Reasons a single segment or record is dropped. None of these abort a page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed segment: line {line} does not start a field: {text:?}")]
    MalformedSegment { line: usize, text: String },

    #[error("record {pmid} is missing required field {field}")]
    MissingRequiredField { pmid: String, field: &'static str },

    #[error("record {pmid} has an affiliation before any full author name")]
    OrphanAffiliation { pmid: String },
}

impl ParseError {
    /// Short label used in status files and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::MalformedSegment { .. } => "malformed_segment",
            ParseError::MissingRequiredField { .. } => "missing_required_field",
            ParseError::OrphanAffiliation { .. } => "orphan_affiliation",
        }
    }
}
