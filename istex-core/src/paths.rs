//! Corpus paths for the LoadIstex chain
//!
//! For the id `0123456789012345678901234567890123456789`:
//! - directory => `<output>/0/1/2/0123456789012345678901234567890123456789/<type>/(<label>/)`
//! - filename  => `0123456789012345678901234567890123456789(.<label>)<extension>`

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Document sections stored per id in the corpus output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Metadata,
    Fulltext,
    Enrichments,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Metadata => "metadata",
            DocType::Fulltext => "fulltext",
            DocType::Enrichments => "enrichments",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "metadata" => Ok(DocType::Metadata),
            "fulltext" => Ok(DocType::Fulltext),
            "enrichments" => Ok(DocType::Enrichments),
            other => Err(Error::invalid(format!(
                "unknown document type '{other}' (expected metadata, fulltext or enrichments)"
            ))),
        }
    }
}

/// Everything needed to place one file of one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRequest {
    /// Root of the corpus output
    pub output_path: PathBuf,
    /// Istex id of the document
    pub id: String,
    /// Document section (see [`DocType`]); free-form so modules can add their own
    pub doc_type: String,
    /// Module label, gives each enrichment module its own sub-directory
    #[serde(default)]
    pub label: String,
    /// File extension including the leading dot (e.g. `.tei.xml`)
    pub extension: String,
}

impl PathRequest {
    pub fn new(output_path: impl Into<PathBuf>, id: &str, doc_type: impl ToString) -> Self {
        Self {
            output_path: output_path.into(),
            id: id.to_string(),
            doc_type: doc_type.to_string(),
            label: String::new(),
            extension: String::new(),
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = extension.to_string();
        self
    }

    fn filename(&self) -> String {
        if self.label.is_empty() {
            format!("{}{}", self.id, self.extension)
        } else {
            format!("{}.{}{}", self.id, self.label, self.extension)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLocation {
    pub directory: PathBuf,
    pub filename: String,
}

impl FileLocation {
    pub fn full_path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }
}

/// Fanned-out corpus layout: the first three characters of the id become
/// directory levels, followed by the id, the type and the label.
pub fn istex_path(request: &PathRequest) -> Result<FileLocation> {
    if request.id.is_empty() {
        return Err(Error::invalid("document id is required"));
    }

    let mut chars = request.id.chars();
    let (Some(a), Some(b), Some(c)) = (chars.next(), chars.next(), chars.next()) else {
        return Err(Error::invalid(format!(
            "document id '{}' is too short for the fan-out layout",
            request.id
        )));
    };

    let mut directory = request.output_path.clone();
    for part in [a.to_string(), b.to_string(), c.to_string()] {
        directory.push(part);
    }
    directory.push(&request.id);
    directory.push(&request.doc_type);
    // An empty label leaves a trailing separator
    directory.push(&request.label);

    Ok(FileLocation {
        directory,
        filename: request.filename(),
    })
}

/// Flat layout: `<output>/<label>`
pub fn flat_path(request: &PathRequest) -> Result<FileLocation> {
    if request.id.is_empty() {
        return Err(Error::invalid("document id is required"));
    }

    Ok(FileLocation {
        directory: Path::new(&request.output_path).join(&request.label),
        filename: request.filename(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "0123456789012345678901234567890123456789";

    #[test]
    fn test_istex_path_without_label() {
        let request = PathRequest::new("/out", ID, DocType::Fulltext).extension(".txt");
        let location = istex_path(&request).unwrap();
        assert_eq!(
            location.directory.to_str().unwrap(),
            format!("/out/0/1/2/{ID}/fulltext/")
        );
        assert_eq!(location.filename, format!("{ID}.txt"));
    }

    #[test]
    fn test_istex_path_with_label() {
        let request = PathRequest::new("/out", ID, DocType::Enrichments)
            .label("nb")
            .extension(".tei.xml");
        let location = istex_path(&request).unwrap();
        assert_eq!(
            location.directory,
            PathBuf::from(format!("/out/0/1/2/{ID}/enrichments/nb"))
        );
        assert_eq!(location.filename, format!("{ID}.nb.tei.xml"));
        assert_eq!(
            location.full_path(),
            PathBuf::from(format!("/out/0/1/2/{ID}/enrichments/nb/{ID}.nb.tei.xml"))
        );
    }

    #[test]
    fn test_istex_path_is_deterministic() {
        let request = PathRequest::new("/out", ID, "fulltext").extension(".txt");
        assert_eq!(istex_path(&request).unwrap(), istex_path(&request).unwrap());
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let request = PathRequest::new("/out", "", DocType::Metadata);
        assert!(matches!(istex_path(&request), Err(Error::InvalidArgument(_))));
        assert!(matches!(flat_path(&request), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_short_id_is_rejected_for_fan_out() {
        let request = PathRequest::new("/out", "ab", DocType::Metadata);
        assert!(matches!(istex_path(&request), Err(Error::InvalidArgument(_))));
        assert!(flat_path(&request).is_ok());
    }

    #[test]
    fn test_flat_path() {
        let request = PathRequest::new("/out", ID, DocType::Enrichments)
            .label("teeft")
            .extension(".tei.xml");
        let location = flat_path(&request).unwrap();
        assert_eq!(location.directory, PathBuf::from("/out/teeft"));
        assert_eq!(location.filename, format!("{ID}.teeft.tei.xml"));
    }

    #[test]
    fn test_doc_type_parsing() {
        assert_eq!("fulltext".parse::<DocType>().unwrap(), DocType::Fulltext);
        assert!("annexes".parse::<DocType>().is_err());
        assert_eq!(DocType::Metadata.to_string(), "metadata");
    }
}
