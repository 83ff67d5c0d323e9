//! File selection by criteria
//!
//! Picks renditions out of a document's file list (`fulltext`, `metadata`,
//! `enrichments[label]`) using ordered criteria, e.g. "the generated txt
//! file, otherwise any txt file":
//!
//! ```text
//! [
//!   { mime: text/plain, original: false },   <- choice 1
//!   { mime: text/plain },                    <- choice 2, only if no choice 1
//! ]
//! ```
//!
//! Nothing here mutates the caller's collection; results borrow from it.

use crate::types::{Criterion, FieldTest, FileDescriptor};
use serde_json::Value;
use std::borrow::Cow;

impl FieldTest {
    /// Run the test against a descriptor field (`None` when the field is absent)
    pub fn test(&self, value: Option<&Value>) -> bool {
        match (self, value) {
            (_, None) => false,
            (FieldTest::Literal(expected), Some(actual)) => strict_eq(expected, actual),
            (FieldTest::Pattern(regex), Some(actual)) => regex.is_match(&stringify(actual)),
        }
    }
}

impl Criterion {
    /// True when every field test passes; stops at the first failure
    pub fn matches(&self, file: &FileDescriptor) -> bool {
        self.tests().all(|(field, test)| test.test(file.get(field)))
    }
}

/// Same type and same value. Integers and floats compare numerically.
fn strict_eq(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(a), Value::Number(b)) => {
            a == b || matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
        }
        _ => expected == actual,
    }
}

fn stringify(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// First file satisfying every test of `criterion`
pub fn match_one<'a>(files: &'a [FileDescriptor], criterion: &Criterion) -> Option<&'a FileDescriptor> {
    files.iter().find(|file| criterion.matches(file))
}

/// First file satisfying the earliest criterion that has any match
///
/// Later criteria are only consulted when every earlier one found nothing.
pub fn match_first_of<'a>(files: &'a [FileDescriptor], criteria: &[Criterion]) -> Option<&'a FileDescriptor> {
    criteria.iter().find_map(|criterion| match_one(files, criterion))
}

/// Every file satisfying at least one criterion, bucketed by criterion order
///
/// See [`partition`]; this is its flattened form.
pub fn match_all<'a>(files: &'a [FileDescriptor], criteria: &[Criterion]) -> Vec<&'a FileDescriptor> {
    partition(files, criteria).into_iter().flatten().collect()
}

/// One bucket per criterion. A file lands in the bucket of the earliest
/// criterion it satisfies and is then gone for the criteria after it.
pub fn partition<'a>(files: &'a [FileDescriptor], criteria: &[Criterion]) -> Vec<Vec<&'a FileDescriptor>> {
    // Shared across all criteria: consumed as files get claimed
    let mut remaining: Vec<&FileDescriptor> = files.iter().collect();
    let mut buckets = Vec::with_capacity(criteria.len());

    for criterion in criteria {
        let (claimed, rest): (Vec<_>, Vec<_>) =
            remaining.into_iter().partition(|file| criterion.matches(file));
        tracing::trace!(claimed = claimed.len(), left = rest.len(), "criterion applied");
        buckets.push(claimed);
        remaining = rest;
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn files(value: Value) -> Vec<FileDescriptor> {
        FileDescriptor::collection_from_value(value).unwrap()
    }

    fn criterion(value: Value) -> Criterion {
        Criterion::from_value(value).unwrap()
    }

    fn fulltext() -> Vec<FileDescriptor> {
        files(json!([
            { "extension": "pdf", "original": true, "mime": "application/pdf", "path": "/corpus/a.pdf" },
            { "extension": "tei", "original": true, "mime": "application/tei+xml", "path": "/corpus/a.tei" },
            { "extension": "txt", "original": true, "mime": "text/plain", "path": "/corpus/a.txt" },
            { "extension": "txt", "original": false, "mime": "text/plain", "path": "/out/a.txt" },
            { "extension": "zip", "original": false, "mime": "application/zip", "path": "/out/a.zip" }
        ]))
    }

    #[test]
    fn test_empty_criterion_matches_first() {
        let files = fulltext();
        let hit = match_one(&files, &Criterion::new()).unwrap();
        assert_eq!(hit, &files[0]);
    }

    #[test]
    fn test_empty_collection_has_no_match() {
        assert!(match_one(&[], &Criterion::new()).is_none());
        assert!(match_one(&[], &criterion(json!({ "mime": "text/plain" }))).is_none());
        assert!(match_first_of(&[], &[Criterion::new()]).is_none());
        assert!(match_all(&[], &[Criterion::new()]).is_empty());
    }

    #[test]
    fn test_literal_fields_all_required() {
        let files = fulltext();
        let hit = match_one(&files, &criterion(json!({ "mime": "text/plain", "original": false }))).unwrap();
        assert_eq!(hit.get("path"), Some(&json!("/out/a.txt")));
    }

    #[test]
    fn test_literal_is_type_strict() {
        let files = files(json!([{ "original": "false", "n": 1 }]));
        assert!(match_one(&files, &criterion(json!({ "original": false }))).is_none());
        assert!(match_one(&files, &criterion(json!({ "n": "1" }))).is_none());
        assert!(match_one(&files, &criterion(json!({ "n": 1.0 }))).is_some());
    }

    #[test]
    fn test_false_is_not_missing() {
        let files = files(json!([{ "mime": "text/plain" }]));
        assert!(match_one(&files, &criterion(json!({ "original": false }))).is_none());
        assert!(match_one(&files, &criterion(json!({ "original": null }))).is_none());
    }

    #[test]
    fn test_pattern_matches_suffix() {
        let plain = files(json!([{ "mime": "text/plain" }]));
        let html = files(json!([{ "mime": "text/html" }]));
        let c = Criterion::new().pattern("mime", "plain$").unwrap();
        assert_eq!(match_one(&plain, &c), Some(&plain[0]));
        assert!(match_one(&html, &c).is_none());
    }

    #[test]
    fn test_pattern_on_missing_field_never_matches() {
        // "undefined" would match a naive stringification
        let files = files(json!([{ "mime": "text/plain" }]));
        let c = Criterion::new().pattern("label", "undef|.*").unwrap();
        assert!(match_one(&files, &c).is_none());
    }

    #[test]
    fn test_pattern_on_non_string_values() {
        let files = files(json!([{ "original": false, "size": 2048 }]));
        let c = Criterion::new().pattern("original", "^false$").unwrap().pattern("size", "^20").unwrap();
        assert!(match_one(&files, &c).is_some());
    }

    #[test]
    fn test_first_of_prefers_earlier_criterion() {
        let files = files(json!([
            { "mime": "text/plain", "original": true },
            { "mime": "text/plain", "original": false }
        ]));
        let criteria = vec![
            criterion(json!({ "mime": "text/plain", "original": false })),
            criterion(json!({ "mime": "text/plain" })),
        ];
        let hit = match_first_of(&files, &criteria).unwrap();
        assert_eq!(hit, &files[1]);
    }

    #[test]
    fn test_first_of_falls_back() {
        let files = files(json!([{ "mime": "text/plain", "original": true }]));
        let c1 = criterion(json!({ "mime": "text/plain", "original": false }));
        let c2 = criterion(json!({ "mime": "text/plain" }));
        assert_eq!(
            match_first_of(&files, &[c1.clone(), c2.clone()]),
            match_one(&files, &c1).or_else(|| match_one(&files, &c2))
        );
        assert_eq!(match_first_of(&files, &[c1, c2]), Some(&files[0]));
    }

    #[test]
    fn test_first_of_empty_criteria() {
        assert!(match_first_of(&fulltext(), &[]).is_none());
    }

    #[test]
    fn test_match_all_buckets_by_earliest_criterion() {
        let files = fulltext();
        let criteria = vec![
            criterion(json!({ "original": false })),
            criterion(json!({ "mime": "text/plain" })),
            Criterion::new().pattern("mime", "^application/").unwrap(),
        ];

        let buckets = partition(&files, &criteria);
        let paths = |bucket: &Vec<&FileDescriptor>| -> Vec<String> {
            bucket.iter().map(|f| f.get("path").unwrap().as_str().unwrap().to_string()).collect()
        };

        assert_eq!(paths(&buckets[0]), vec!["/out/a.txt", "/out/a.zip"]);
        // the generated txt already went to bucket 0
        assert_eq!(paths(&buckets[1]), vec!["/corpus/a.txt"]);
        assert_eq!(paths(&buckets[2]), vec!["/corpus/a.pdf", "/corpus/a.tei"]);

        let all = match_all(&files, &criteria);
        assert_eq!(all.len(), 5);
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert!(!std::ptr::eq(*a, *b), "file returned twice");
            }
        }
    }

    #[test]
    fn test_match_all_nothing_qualifies() {
        let files = fulltext();
        assert!(match_all(&files, &[criterion(json!({ "mime": "image/png" }))]).is_empty());
        assert!(match_all(&files, &[]).is_empty());
    }

    #[test]
    fn test_match_all_leaves_input_untouched() {
        let files = fulltext();
        let before = files.clone();
        let _ = match_all(&files, &[Criterion::new()]);
        assert_eq!(files, before);
    }

    #[test]
    fn test_literal_scan_equivalence() {
        let files = fulltext();
        let c = criterion(json!({ "extension": "txt", "original": true }));
        let linear = files.iter().find(|f| {
            f.get("extension") == Some(&json!("txt")) && f.get("original") == Some(&json!(true))
        });
        assert_eq!(match_one(&files, &c), linear);
    }
}
