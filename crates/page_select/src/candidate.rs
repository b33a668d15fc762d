//! Candidates fetched from the page and their display labels.
//!
//! The page reports `id -> [text, target]`; the host turns that into a list
//! sorted by id (page order) with sanitized labels. Label lookups resolve
//! duplicates to the entry with the highest id.

use log::warn;
use page_bridge::{BridgeError, JSValue};
use std::collections::{HashMap, HashSet};

/// Separator replacing each run of control characters inside a label.
const CONTROL_SEPARATOR: char = '/';

/// One selectable page element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Sanitized display text.
    pub label: String,
    /// Page-assigned index, stable for one fetch.
    pub id: i64,
    /// Destination used by the action (URL or raw title).
    pub target: String,
}

/// Raw fetch result: page id to `(text, target)`.
pub type RawEntries = HashMap<i64, (String, String)>;

/// Sanitize page text for display.
///
/// Leading and trailing whitespace/control runs are dropped, interior control runs become a
/// single `/`, interior whitespace runs a single space.
pub fn format_label(raw: &str) -> String {
    let trimmed = raw.trim_matches(|character: char| character.is_whitespace() || character.is_control());
    let mut out = String::with_capacity(trimmed.len());
    let mut last_run: Option<char> = None;
    for character in trimmed.chars() {
        let replacement = if character.is_control() {
            CONTROL_SEPARATOR
        } else if character.is_whitespace() {
            ' '
        } else {
            last_run = None;
            out.push(character);
            continue;
        };
        if last_run != Some(replacement) {
            out.push(replacement);
            last_run = Some(replacement);
        }
    }
    out
}

/// Decode the page's fetch result.
///
/// Accepts an object keyed by decimal ids or an array indexed by id; `null`/`undefined`
/// means no candidates. Entries that are not `[text, target]` pairs are skipped.
///
/// # Errors
/// Returns [`BridgeError::MalformedResult`] for any other shape.
pub fn decode_raw_entries(value: &JSValue) -> Result<RawEntries, BridgeError> {
    let mut entries = RawEntries::new();
    match value {
        JSValue::Undefined | JSValue::Null => {}
        JSValue::Object(fields) => {
            for (key, entry) in fields {
                let Ok(id) = key.trim().parse::<i64>() else {
                    warn!("skipping candidate with non-numeric id {key:?}");
                    continue;
                };
                if let Some(pair) = decode_pair(entry) {
                    entries.insert(id, pair);
                }
            }
        }
        JSValue::Array(items) => {
            for (index, entry) in items.iter().enumerate() {
                if entry.is_nullish() {
                    continue;
                }
                if let Some(pair) = decode_pair(entry) {
                    entries.insert(index as i64, pair);
                }
            }
        }
        other => {
            return Err(BridgeError::MalformedResult(format!(
                "expected an id -> [text, target] mapping, got {}",
                other.to_literal()
            )));
        }
    }
    Ok(entries)
}

fn decode_pair(entry: &JSValue) -> Option<(String, String)> {
    let Some(items) = entry.as_array() else {
        warn!("skipping candidate entry {}", entry.to_literal());
        return None;
    };
    let text = items.first().and_then(JSValue::as_str).unwrap_or_default();
    let target = items.get(1).and_then(JSValue::as_str).unwrap_or_default();
    Some((text.to_owned(), target.to_owned()))
}

/// Turn raw entries into candidates sorted by id.
pub fn prepare(raw: RawEntries) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = raw
        .into_iter()
        .map(|(id, (text, target))| Candidate {
            label: format_label(&text),
            id,
            target,
        })
        .collect();
    candidates.sort_by_key(|candidate| candidate.id);
    candidates
}

/// Candidates of one fetch with a label index.
#[derive(Clone, Debug, Default)]
pub struct CandidateList {
    items: Vec<Candidate>,
    by_label: HashMap<String, usize>,
}

impl CandidateList {
    /// Index `candidates` (expected in id order); later duplicates win label lookups.
    pub fn new(candidates: Vec<Candidate>) -> Self {
        let mut by_label = HashMap::with_capacity(candidates.len());
        for (position, candidate) in candidates.iter().enumerate() {
            by_label.insert(candidate.label.clone(), position);
        }
        Self {
            items: candidates,
            by_label,
        }
    }

    /// Decode, sanitize and index a fetch result.
    ///
    /// # Errors
    /// Returns [`BridgeError::MalformedResult`] if the value has the wrong shape.
    pub fn from_fetch_result(value: &JSValue) -> Result<Self, BridgeError> {
        Ok(Self::new(prepare(decode_raw_entries(value)?)))
    }

    /// Candidates in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.items.iter()
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the fetch produced nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct labels in id order, for seeding a completion session.
    pub fn labels(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .filter(|candidate| seen.insert(candidate.label.as_str()))
            .map(|candidate| candidate.label.clone())
            .collect()
    }

    /// The candidate shown as `label`; the last one when several share it.
    pub fn resolve(&self, label: &str) -> Option<&Candidate> {
        self.by_label
            .get(label)
            .and_then(|position| self.items.get(*position))
    }

    /// Candidate with page id `id`.
    pub fn get(&self, id: i64) -> Option<&Candidate> {
        self.items.iter().find(|candidate| candidate.id == id)
    }

    /// Resolve `labels` to ids, dropping unknown labels and repeats.
    pub fn ids_for<S: AsRef<str>>(&self, labels: &[S]) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::with_capacity(labels.len());
        for label in labels {
            if let Some(candidate) = self.resolve(label.as_ref())
                && !ids.contains(&candidate.id)
            {
                ids.push(candidate.id);
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_runs_become_one_separator() {
        assert_eq!(format_label("  Foo\n\nBar  "), "Foo/Bar");
        assert_eq!(format_label("a \n b"), "a / b");
        assert_eq!(format_label("a   b\u{a0}c"), "a b c");
        assert_eq!(format_label("\t\n "), "");
    }

    #[test]
    fn non_pair_entries_are_skipped() {
        let value = JSValue::Array(vec![
            JSValue::from(vec!["A", "u0"]),
            JSValue::Null,
            JSValue::from("junk"),
            JSValue::from(vec!["D"]),
        ]);
        let entries = decode_raw_entries(&value).expect("array form");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.get(&3), Some(&(String::from("D"), String::new())));
    }

    #[test]
    fn scalar_results_are_malformed() {
        assert!(matches!(
            decode_raw_entries(&JSValue::from(3)),
            Err(BridgeError::MalformedResult(_))
        ));
        assert!(decode_raw_entries(&JSValue::Undefined)
            .expect("undefined means empty")
            .is_empty());
    }
}
