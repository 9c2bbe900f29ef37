//! `weaver.config.json` — the CLI's project configuration file (spec §6
//! "Configuration", added ambient surface: source roots, output directory,
//! template bundle directory, and the annotation prefix).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

fn default_annotation_prefix() -> String {
    "Weaver".to_string()
}

fn default_output_dir() -> String {
    "Generated".to_string()
}

fn default_source_extension() -> String {
    "swift".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directories (relative to the config file) scanned for source files.
    #[serde(rename = "sourceRoots", default = "default_source_roots")]
    pub source_roots: Vec<String>,
    /// Where generated files are written, relative to the config file.
    #[serde(rename = "outputDir", default = "default_output_dir")]
    pub output_dir: String,
    /// Directory of `.mustache` templates overriding the built-in defaults;
    /// `None` uses `generator::default_template_bundle()` as-is.
    #[serde(rename = "templateDir", default)]
    pub template_dir: Option<String>,
    /// Case-insensitive annotation family name (spec §4.2); `"Weaver"`
    /// unless the project has renamed its property wrapper.
    #[serde(rename = "annotationPrefix", default = "default_annotation_prefix")]
    pub annotation_prefix: String,
    /// File extension (without the dot) scanned for source files; `"swift"`
    /// unless the project houses its annotated sources under another
    /// extension.
    #[serde(rename = "sourceExtension", default = "default_source_extension")]
    pub source_extension: String,
}

fn default_source_roots() -> Vec<String> {
    vec![".".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_roots: default_source_roots(),
            output_dir: default_output_dir(),
            template_dir: None,
            annotation_prefix: default_annotation_prefix(),
            source_extension: default_source_extension(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or falls back to `Config::default()`
    /// when no file exists at `path` — a missing `weaver.config.json` is not
    /// an error, per spec §6 treating it as optional.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn resolved_source_roots(&self, base_dir: &Path) -> Vec<PathBuf> {
        self.source_roots.iter().map(|root| base_dir.join(root)).collect()
    }

    pub fn resolved_output_dir(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let config = Config::load(Path::new("/nonexistent/weaver.config.json")).unwrap();
        assert_eq!(config.annotation_prefix, "Weaver");
        assert_eq!(config.output_dir, "Generated");
        assert_eq!(config.source_extension, "swift");
    }

    #[test]
    fn deserializes_a_minimal_config() {
        let config: Config = serde_json::from_str(r#"{"sourceRoots": ["Sources/App"]}"#).unwrap();
        assert_eq!(config.source_roots, vec!["Sources/App".to_string()]);
        assert_eq!(config.annotation_prefix, "Weaver");
        assert_eq!(config.source_extension, "swift");
    }

    #[test]
    fn a_configured_source_extension_overrides_the_default() {
        let config: Config =
            serde_json::from_str(r#"{"sourceExtension": "kt", "annotationPrefix": "Inject"}"#).unwrap();
        assert_eq!(config.source_extension, "kt");
        assert_eq!(config.annotation_prefix, "Inject");
    }
}
