use crate::error::{Error, Result};
use crate::types::Criterion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// Default value functions for serde
fn default_output_path() -> PathBuf {
    PathBuf::from("out")
}

fn default_xslt_program() -> PathBuf {
    PathBuf::from("xsltproc")
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IstexConfig {
    /// Root of the corpus output
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default)]
    pub services: ServicesConfig,
    /// Named, ordered criteria lists usable from the CLI (`--selection`)
    #[serde(default = "default_selections")]
    pub selections: BTreeMap<String, Vec<Criterion>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Web service receiving uploads
    #[serde(default)]
    pub upload_url: Option<String>,
    /// Extra headers sent with every upload
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_xslt_program")]
    pub xslt_program: PathBuf,
    /// Request timeout for uploads, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            upload_url: None,
            headers: BTreeMap::new(),
            xslt_program: default_xslt_program(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Selections every LoadIstex module ends up needing
fn default_selections() -> BTreeMap<String, Vec<Criterion>> {
    let mut selections = BTreeMap::new();
    selections.insert(
        "fulltext_txt".to_string(),
        vec![
            // txt generated by the chain first, any txt otherwise
            Criterion::new().literal("mime", "text/plain").literal("original", false),
            Criterion::new().literal("mime", "text/plain"),
        ],
    );
    selections.insert(
        "fulltext_tei".to_string(),
        vec![
            Criterion::new().literal("mime", "application/tei+xml").literal("original", false),
            Criterion::new().literal("mime", "application/tei+xml"),
        ],
    );
    selections.insert(
        "metadata_mods".to_string(),
        vec![Criterion::new().literal("mime", "application/mods+xml")],
    );
    selections
}

impl IstexConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::invalid(format!("invalid config {path}: {e}")))
    }

    /// Load config with fallback to defaults
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {p}: {e}, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn selection(&self, name: &str) -> Result<&[Criterion]> {
        self.selections
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::invalid(format!("unknown selection '{name}'")))
    }
}

impl Default for IstexConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            services: ServicesConfig::default(),
            selections: default_selections(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldTest;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config: IstexConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, IstexConfig::default());
        assert_eq!(config.services.xslt_program, PathBuf::from("xsltproc"));
        assert_eq!(config.selection("fulltext_txt").unwrap().len(), 2);
    }

    #[test]
    fn test_yaml_selections_with_patterns() {
        let yaml = r#"
output_path: /corpus/out
services:
  upload_url: http://localhost:8080/teeft
  timeout_secs: 5
selections:
  any_xml:
    - { mime: { pattern: "xml$" }, original: false }
    - { mime: { pattern: "xml$" } }
"#;
        let config: IstexConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.output_path, PathBuf::from("/corpus/out"));
        assert_eq!(config.services.timeout_secs, 5);
        assert_eq!(config.services.xslt_program, PathBuf::from("xsltproc"));

        let any_xml = config.selection("any_xml").unwrap();
        let fields: Vec<&str> = any_xml[0].tests().map(|(name, _)| name).collect();
        assert_eq!(fields, vec!["mime", "original"]);
        assert!(matches!(any_xml[1].tests().next(), Some((_, FieldTest::Pattern(_)))));
        // explicit selections replace the defaults
        assert!(config.selection("fulltext_txt").is_err());
    }

    #[test]
    fn test_config_roundtrips_through_yaml() {
        let config = IstexConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: IstexConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_fallback_on_missing_file() {
        let config = IstexConfig::load_with_fallback(Some("/nonexistent/istex.yaml"));
        assert_eq!(config, IstexConfig::default());
    }
}
