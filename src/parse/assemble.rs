use once_cell::sync::Lazy;
use regex::Regex;

use super::lines::FieldLine;
use crate::{affiliation_key, ParseError, Record, AFFILIATION, FULL_AUTHOR, PMID};

/// Whitespace runs left behind by the source's fixed-width line wrapping.
static WRAP_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

pub fn normalize_value(value: &str) -> String {
    let value = value.replace('\r', "");
    WRAP_GAP.replace_all(value.trim(), " ").into_owned()
}

/// Groups the field lines of one segment into a record.
///
/// Every value lands under its own code. Affiliations are additionally filed
/// under `"{author}_AD"` for the full author name most recently seen in this
/// record; an affiliation before any author rejects the record.
pub fn assemble_record(fields: &[FieldLine]) -> Result<Record, ParseError> {
    let mut record = Record::new();
    let mut current_author: Option<String> = None;

    for field in fields {
        let value = normalize_value(&field.value);

        if field.code == FULL_AUTHOR {
            current_author = Some(value.clone());
        }

        if field.code == AFFILIATION {
            match current_author.as_deref() {
                Some(author) => record.push(&affiliation_key(author), value.clone()),
                None => {
                    return Err(ParseError::OrphanAffiliation {
                        pmid: pmid_hint(fields),
                    })
                }
            }
        }

        record.push(&field.code, value);
    }

    for required in [PMID, FULL_AUTHOR] {
        if !record.contains(required) {
            return Err(ParseError::MissingRequiredField {
                pmid: pmid_hint(fields),
                field: required,
            });
        }
    }

    Ok(record)
}

fn pmid_hint(fields: &[FieldLine]) -> String {
    fields
        .iter()
        .find(|f| f.code == PMID)
        .map(|f| normalize_value(&f.value))
        .unwrap_or_else(|| "<unknown>".to_string())
}
