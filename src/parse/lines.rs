use once_cell::sync::Lazy;
use regex::Regex;

use crate::ParseError;

/// A physical line that opens a new field: 2-6 uppercase letters, then the separator.
static FIELD_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]{2,6})\s*-\s*").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLine {
    pub code: String,
    pub value: String,
}

pub fn is_field_start(line: &str) -> bool {
    FIELD_START.is_match(line)
}

/// Opens a field from a header line, splitting on the first separator only.
fn open_field(line: &str) -> Option<FieldLine> {
    let caps = FIELD_START.captures(line)?;
    let header = caps.get(0)?;
    Some(FieldLine {
        code: caps[1].to_string(),
        value: line[header.end()..].trim_end().to_string(),
    })
}

/// Reassembles the logical fields of one segment.
///
/// Lines that do not open a field are continuations of the field before them;
/// their indentation is dropped and they are joined with a single space. A
/// continuation with nothing open to attach to fails the whole segment.
pub fn join_lines(segment: &str) -> Result<Vec<FieldLine>, ParseError> {
    let mut fields = Vec::new();
    let mut open: Option<FieldLine> = None;

    for (idx, raw) in segment.lines().enumerate() {
        let line = raw.replace('\r', "");
        if line.trim().is_empty() {
            continue;
        }

        if let Some(next) = open_field(&line) {
            fields.extend(open.replace(next));
            continue;
        }

        match open.as_mut() {
            Some(current) => {
                if !current.value.is_empty() {
                    current.value.push(' ');
                }
                current.value.push_str(line.trim());
            }
            None => {
                return Err(ParseError::MalformedSegment {
                    line: idx + 1,
                    text: line.trim().to_string(),
                })
            }
        }
    }

    fields.extend(open);
    Ok(fields)
}
