//! Enrichments of a document record
//!
//! Enrichment modules append one entry per produced file under their label
//! in the record's `enrichments` mapping, and write TEI fragments rendered
//! from a template next to the corpus files.

use crate::error::{Error, Result};
use crate::matcher::match_one;
use crate::paths::FileLocation;
use crate::types::{Criterion, FileDescriptor};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// `enrichments` of a record: module label -> produced files. Labels keep
/// the order they were first recorded in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Enrichments(IndexMap<String, Vec<FileDescriptor>>);

impl Enrichments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a record's `enrichments` value
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Record an enrichment under `label` unless an equal one is already there.
    ///
    /// Equality is the matcher's: every field of `record` must be present with
    /// the same value in an existing entry. Returns whether it was appended.
    pub fn save(&mut self, label: &str, record: FileDescriptor) -> Result<bool> {
        if label.is_empty() {
            return Err(Error::invalid("enrichment label is required"));
        }

        let entries = self.0.entry(label.to_string()).or_default();
        if match_one(entries, &Criterion::from_descriptor(&record)).is_some() {
            tracing::debug!(label, "enrichment already recorded, skipping");
            return Ok(false);
        }

        entries.push(record);
        Ok(true)
    }

    pub fn get(&self, label: &str) -> Option<&[FileDescriptor]> {
        self.0.get(label).map(Vec::as_slice)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Functional form of [`Enrichments::save`], for records that may not have
/// an `enrichments` key yet
pub fn save(enrichments: Option<Enrichments>, label: &str, record: FileDescriptor) -> Result<Enrichments> {
    let mut enrichments = enrichments.unwrap_or_default();
    enrichments.save(label, record)?;
    Ok(enrichments)
}

pub fn read_template(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

/// Render a mustache template: `{{name}}` is escaped for XML output,
/// `{{{name}}}` is inserted as-is, `{{#list}}…{{/list}}` repeats.
pub fn render<S: Serialize>(template: &str, data: &S) -> Result<String> {
    let template = mustache::compile_str(template)?;
    let mut out = Vec::new();
    template.render(&mut out, data)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Render the template and write the fragment at `output`, creating the
/// directory if needed. Returns the written fragment.
pub fn write<S: Serialize>(template: &str, data: &S, output: &FileLocation) -> Result<String> {
    fs::create_dir_all(&output.directory)?;

    let fragment = render(template, data)?;
    let path = output.full_path();
    fs::write(&path, &fragment)?;

    tracing::info!(path = %path.display(), bytes = fragment.len(), "enrichment fragment written");
    Ok(fragment)
}
