//! Reading and updating the files the CLI is pointed at: docObjects (or
//! bare file lists), criteria files and template data.

use anyhow::{anyhow, Context, Result};
use istex_core::{Criterion, Enrichments, FileDescriptor};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// File descriptors from either a bare JSON array or a docObject's
/// `container` key (`fulltext`, `metadata`, …)
pub fn read_files(path: &Path, container: Option<&str>) -> Result<Vec<FileDescriptor>> {
    let value = read_json(path)?;
    let list = match (value, container) {
        (Value::Array(items), None) => Value::Array(items),
        (Value::Object(mut doc), Some(key)) => doc
            .remove(key)
            .ok_or_else(|| anyhow!("{} has no '{}' key", path.display(), key))?,
        (Value::Object(_), None) => {
            return Err(anyhow!(
                "{} is a docObject, pass --container (fulltext, metadata, …)",
                path.display()
            ))
        }
        (_, Some(key)) => return Err(anyhow!("{} is not a docObject, cannot read '{}'", path.display(), key)),
        (other, None) => return Err(anyhow!("{} holds {other}, expected a file list", path.display())),
    };
    Ok(FileDescriptor::collection_from_value(list)?)
}

/// Ordered criteria from a YAML (or JSON) file
pub fn read_criteria(path: &Path) -> Result<Vec<Criterion>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("Invalid criteria in {}", path.display()))
}

/// Record an enrichment entry in a docObject file, rewriting it in place.
/// Returns whether the entry was new.
pub fn record_enrichment(doc_path: &Path, label: &str, entry: FileDescriptor) -> Result<bool> {
    let mut doc = match read_json(doc_path)? {
        Value::Object(doc) => doc,
        _ => return Err(anyhow!("{} is not a docObject", doc_path.display())),
    };

    // `insert` on an existing key keeps its position in the record
    let mut enrichments = match doc.get("enrichments") {
        Some(value) => Enrichments::from_value(value.clone())
            .with_context(|| format!("Invalid enrichments in {}", doc_path.display()))?,
        None => Enrichments::new(),
    };
    let appended = enrichments.save(label, entry)?;

    doc.insert("enrichments".to_string(), serde_json::to_value(&enrichments)?);
    fs::write(doc_path, serde_json::to_string_pretty(&Value::Object(doc))?)
        .with_context(|| format!("Failed to write {}", doc_path.display()))?;
    Ok(appended)
}

/// `key=value` pairs from the command line
pub fn parse_pairs(pairs: &[String]) -> Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or_else(|| anyhow!("expected key=value, got '{pair}'"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_files_from_doc_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "doc.json", r#"{ "id": "x", "fulltext": [{ "mime": "text/plain" }] }"#);
        let files = read_files(&path, Some("fulltext")).unwrap();
        assert_eq!(files.len(), 1);
        assert!(read_files(&path, None).is_err());
        assert!(read_files(&path, Some("metadata")).is_err());
    }

    #[test]
    fn test_read_files_from_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "files.json", r#"[{ "mime": "text/plain" }, { "mime": "text/html" }]"#);
        assert_eq!(read_files(&path, None).unwrap().len(), 2);
    }

    #[test]
    fn test_read_criteria_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "criteria.yaml",
            "- { mime: text/plain, original: false }\n- { mime: { pattern: \"plain$\" } }\n",
        );
        let criteria = read_criteria(&path).unwrap();
        assert_eq!(criteria.len(), 2);
        assert_eq!(criteria[0].len(), 2);
    }

    #[test]
    fn test_record_enrichment_updates_doc_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "doc.json", r#"{ "id": "x", "fulltext": [] }"#);
        let entry = FileDescriptor::new().with("path", "/out/x.teeft.tei.xml");

        assert!(record_enrichment(&path, "teeft", entry.clone()).unwrap());
        assert!(!record_enrichment(&path, "teeft", entry).unwrap());

        let doc = read_json(&path).unwrap();
        assert_eq!(doc["id"], json!("x"));
        assert_eq!(doc["enrichments"], json!({ "teeft": [{ "path": "/out/x.teeft.tei.xml" }] }));
    }

    #[test]
    fn test_record_enrichment_keeps_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "doc.json",
            r#"{ "id": "x", "enrichments": { "teeft": [{ "id": 1 }], "nb": [{ "id": 2 }] }, "fulltext": [] }"#,
        );
        record_enrichment(&path, "ner", FileDescriptor::new().with("id", 3)).unwrap();

        let doc = read_json(&path).unwrap();
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["id", "enrichments", "fulltext"]);
        let labels: Vec<&String> = doc["enrichments"].as_object().unwrap().keys().collect();
        assert_eq!(labels, vec!["teeft", "nb", "ner"]);
    }

    #[test]
    fn test_parse_pairs() {
        let pairs = parse_pairs(&["q=title:rust".to_string(), "size=10".to_string()]).unwrap();
        assert_eq!(pairs[0], ("q".to_string(), "title:rust".to_string()));
        assert!(parse_pairs(&["novalue".to_string()]).is_err());
    }
}
