//! Labeled sections inside doc comments.
//!
//! Endpoint doc comments are free-form prose, except for a few labeled blocks that list
//! `key: value` entries:
//!
//! ```text
//! Fetches a user.
//!
//! path params:
//! - id: the user's id
//!
//! errors:
//! - NotFound: no user with that id
//! - PermissionDenied: the caller may not see this user,
//!   for example because it belongs to another tenant
//! ```
//!
//! A section runs until a line that is neither an entry nor a continuation, or until two
//! blank lines in a row. Another label after a single blank line reads as an entry, so
//! the `errors:` section goes last or is followed by two blank lines.
//!
//! [`extract_section`] pulls one such block out of the text and returns the rest; the
//! mappers below turn the entries into domain records.

use crate::model::ErrorEntry;
use log::debug;
use std::collections::BTreeMap;

/// Label of the section documenting the errors an endpoint returns
pub const ERRORS_SECTION: &str = "errors";

/// Label of the section documenting path parameters
pub const PATH_PARAMS_SECTION: &str = "path params";

/// A single `key: value` entry of a labeled section. The value may span several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocEntry {
    pub key: String,
    pub doc: String,
}

/// Extracts the section introduced by `label:` from `text`.
///
/// Returns the text with the section removed, and the section's entries in the order
/// they appear. When no line starts with `label:` the text is returned unchanged.
///
/// After the label line, each line is looked at in its trimmed form:
/// - a line containing `:` starts a new entry (a leading `-` marker is dropped from the
///   key), whether or not it carries the marker
/// - a line without `:` that starts with `-` or is indented continues the previous
///   entry; with no previous entry it is dropped
/// - a blank line is skipped, but a second consecutive blank line ends the section
/// - any other line ends the section and is kept in the remainder
///
/// Blank lines trailing the last consumed line stay in the remainder.
pub fn extract_section(text: &str, label: &str) -> (String, Vec<DocEntry>) {
    let lines: Vec<&str> = text.split('\n').collect();
    let marker = format!("{}:", label);

    let Some(start) = lines.iter().position(|line| line.trim().starts_with(&marker)) else {
        return (text.to_string(), Vec::new());
    };

    let mut entries: Vec<DocEntry> = Vec::new();
    let mut end = start;
    let mut blank_run = 0;

    for (i, line) in lines.iter().enumerate().skip(start + 1) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blank_run += 1;
            if blank_run == 2 {
                break;
            }
            continue;
        }
        blank_run = 0;

        if let Some((key, value)) = trimmed.split_once(':') {
            let key = key.strip_prefix('-').unwrap_or(key).trim();
            entries.push(DocEntry {
                key: key.to_string(),
                doc: value.trim().to_string(),
            });
        } else if trimmed.starts_with('-') || line.starts_with(char::is_whitespace) {
            match entries.last_mut() {
                Some(entry) => {
                    entry.doc.push('\n');
                    entry.doc.push_str(trimmed);
                }
                None => debug!("Dropping orphan line in `{}` section: {}", label, trimmed),
            }
        } else {
            break;
        }
        end = i;
    }

    for entry in &mut entries {
        let doc = entry.doc.trim();
        if doc.len() != entry.doc.len() {
            entry.doc = doc.to_string();
        }
    }

    let remainder = lines[..start]
        .iter()
        .chain(lines[end + 1..].iter())
        .copied()
        .collect::<Vec<_>>()
        .join("\n");

    (remainder, entries)
}

/// Extracts the `errors:` section of a doc comment.
pub fn extract_error_annotations(doc: &str) -> (String, Vec<ErrorEntry>) {
    let (remainder, entries) = extract_section(doc, ERRORS_SECTION);
    let errors = entries
        .into_iter()
        .map(|entry| ErrorEntry {
            code: entry.key,
            doc: entry.doc,
        })
        .collect();
    (remainder, errors)
}

/// Extracts the `path params:` section of a doc comment, keyed by segment name.
///
/// When a name is documented twice the later entry wins.
pub fn extract_path_annotations(doc: &str) -> (String, BTreeMap<String, String>) {
    let (remainder, entries) = extract_section(doc, PATH_PARAMS_SECTION);
    let mut docs = BTreeMap::new();
    for entry in entries {
        docs.insert(entry.key, entry.doc);
    }
    (remainder, docs)
}
