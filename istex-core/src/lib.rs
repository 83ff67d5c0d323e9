// LoadIstex Core Library
//
// Helpers shared by the LoadIstex enrichment modules: pick files out of a
// document record, place outputs in the corpus tree, record and write
// enrichments, and call external services.

pub mod error;
pub mod types;
pub mod matcher;
pub mod paths;
pub mod enrichments;
pub mod xml;
pub mod url;
pub mod dates;
pub mod services;
pub mod config;

// Re-export main types and functions for easy use
pub use error::{Error, ProcessLogs, Result};
pub use types::*;
pub use matcher::{match_all, match_first_of, match_one, partition};
pub use paths::{flat_path, istex_path, DocType, FileLocation, PathRequest};
pub use enrichments::Enrichments;
pub use xml::{XmlDocument, XmlElement};
pub use services::{post, PostRequest, ServiceResponse, TransformOutcome, TransformRequest, XsltProcessor};
pub use config::IstexConfig;
