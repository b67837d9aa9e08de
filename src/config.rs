//! Project configuration loader describing where build targets read from and write to.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::Error as _;
use tracing::warn;

use crate::error::BuildConfigError;
use crate::models::{BrowserClass, ChunkNaming};

/// File name searched for by [`ProjectConfig::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "dual-target.config.json";

const DEFAULT_ENTRIES: [(&str, &str); 2] = [("home", "./src/home.js"), ("news", "./src/news.js")];

/// Discoverable project configuration describing filesystem layout and transpiler knobs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory every output path is resolved against.
    pub root: PathBuf,
    /// Logical entry name mapped to its source file.
    pub entries: BTreeMap<String, String>,
    /// Directory, relative to the root, holding one bundle directory per browser class.
    pub assets_dir: String,
    /// Directory, relative to the root, holding one template directory per browser class.
    pub templates_dir: String,
    /// URL prefix under which the asset directories are served. Left to the bundler when unset.
    pub public_path: Option<String>,
    /// Extension given to the emitted chunk templates.
    pub template_extension: String,
    /// Naming policy for split chunks.
    pub chunk_naming: ChunkNaming,
    /// Version of the polyfill library injected into legacy bundles.
    pub corejs: String,
    /// Ask the transpiler to log the plugins it selects for the modern bundle.
    pub transpiler_debug: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            entries: DEFAULT_ENTRIES
                .iter()
                .map(|(name, source)| (name.to_string(), source.to_string()))
                .collect(),
            assets_dir: "dist/assets".into(),
            templates_dir: "dist/templates".into(),
            public_path: None,
            template_extension: ".html.twig".into(),
            chunk_naming: ChunkNaming::Disabled,
            corejs: "3".into(),
            transpiler_debug: false,
        }
    }
}

impl ProjectConfig {
    /// Load the configuration a build driver asked for.
    ///
    /// An explicit file must exist and parse; its `root` is resolved against `root`. Without
    /// one the configuration is discovered in `root`.
    pub fn load(explicit: Option<&Path>, root: &Path) -> Result<Self, BuildConfigError> {
        match explicit {
            Some(path) => {
                let mut config = Self::from_path(path)?;
                config.root = root.join(&config.root);
                Ok(config)
            }
            None => Ok(Self::discover(root)),
        }
    }

    /// Attempt to load configuration from the provided directory.
    ///
    /// A missing file yields the defaults rooted at `dir`. A file that cannot be read or parsed
    /// is reported and also falls back to the defaults so a build can still be described.
    pub fn discover(dir: &Path) -> Self {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        let mut config = match Self::from_path(&candidate) {
            Ok(config) => config,
            Err(BuildConfigError::ConfigRead { source, .. })
                if source.kind() == ErrorKind::NotFound =>
            {
                Self::default()
            }
            Err(err) => {
                warn!("{err}; using default configuration");
                Self::default()
            }
        };
        config.root = dir.join(&config.root);
        config
    }

    /// Read configuration from a specific JSON file. The document must be a JSON object.
    pub fn from_path(path: &Path) -> Result<Self, BuildConfigError> {
        let parse_error = |source: serde_json::Error| BuildConfigError::ConfigParse {
            path: path.to_path_buf(),
            source,
        };

        let content = fs::read_to_string(path).map_err(|source| BuildConfigError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let value: serde_json::Value = serde_json::from_str(&content).map_err(parse_error)?;
        if !value.is_object() {
            return Err(parse_error(serde_json::Error::custom(
                "expected a JSON object at the top level",
            )));
        }
        serde_json::from_value(value).map_err(parse_error)
    }

    /// Directory receiving the bundles of one browser class.
    pub fn asset_dir(&self, class: BrowserClass) -> PathBuf {
        self.root.join(&self.assets_dir).join(class.as_str())
    }

    /// Directory receiving the chunk templates of one browser class.
    pub fn template_dir(&self, class: BrowserClass) -> PathBuf {
        self.root.join(&self.templates_dir).join(class.as_str())
    }

    /// Public URL prefix of one browser class, always ending in `/`.
    pub fn public_path_for(&self, class: BrowserClass) -> Option<String> {
        self.public_path
            .as_deref()
            .map(|prefix| format!("{}/{}/", prefix.trim_end_matches('/'), class.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn discover_defaults_when_file_missing() {
        let dir = tempdir().unwrap();
        let config = ProjectConfig::discover(dir.path());

        assert_eq!(config.root, dir.path().join("."));
        assert_eq!(config.template_extension, ".html.twig");
        assert_eq!(config.chunk_naming, ChunkNaming::Disabled);
        assert_eq!(config.entries["home"], "./src/home.js");
        assert_eq!(config.entries["news"], "./src/news.js");
        assert_eq!(config.public_path, None);
    }

    #[test]
    fn discover_reads_partial_file_and_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r#"{"chunk_naming": true, "corejs": "3.38"}"#,
        )
        .unwrap();

        let config = ProjectConfig::discover(dir.path());
        assert_eq!(config.chunk_naming, ChunkNaming::Deterministic);
        assert_eq!(config.corejs, "3.38");
        assert_eq!(config.assets_dir, "dist/assets");
        assert_eq!(config.entries.len(), 2);
    }

    #[test]
    fn configured_entries_replace_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, r#"{"entries": {"home": "./index.js"}}"#).unwrap();

        let config = ProjectConfig::from_path(&path).unwrap();
        let entries: Vec<(&str, &str)> = config
            .entries
            .iter()
            .map(|(name, source)| (name.as_str(), source.as_str()))
            .collect();
        assert_eq!(entries, vec![("home", "./index.js")]);
    }

    #[test]
    fn discover_falls_back_on_malformed_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "{ not json").unwrap();

        let config = ProjectConfig::discover(dir.path());
        assert_eq!(config.corejs, "3");
    }

    #[test]
    fn from_path_rejects_non_object_documents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[]").unwrap();

        let err = ProjectConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, BuildConfigError::ConfigParse { .. }));
        assert!(err.to_string().contains("JSON object"));
    }

    #[test]
    fn from_path_rejects_mistyped_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("typed.json");
        fs::write(&path, r#"{"corejs": 3}"#).unwrap();

        let err = ProjectConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, BuildConfigError::ConfigParse { .. }));
    }

    #[test]
    fn load_resolves_explicit_file_root_against_project_root() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("build.json");
        fs::write(&path, r#"{"root": "site", "corejs": "3.38"}"#).unwrap();

        let config = ProjectConfig::load(Some(&path), Path::new("/srv/project")).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/project/site"));
        assert_eq!(config.corejs, "3.38");
    }

    #[test]
    fn load_requires_explicit_file_to_exist() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.json");

        let err = ProjectConfig::load(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, BuildConfigError::ConfigRead { .. }));
    }

    #[test]
    fn load_without_explicit_file_discovers_in_root() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r#"{"template_extension": ".html"}"#,
        )
        .unwrap();

        let config = ProjectConfig::load(None, dir.path()).unwrap();
        assert_eq!(config.template_extension, ".html");
        assert_eq!(config.root, dir.path().join("."));
    }

    #[test]
    fn paths_are_split_per_browser_class() {
        let config = ProjectConfig {
            root: PathBuf::from("/srv/site"),
            public_path: Some("/dist/assets".into()),
            ..ProjectConfig::default()
        };

        assert_eq!(
            config.asset_dir(BrowserClass::Modern),
            PathBuf::from("/srv/site/dist/assets/modern")
        );
        assert_eq!(
            config.template_dir(BrowserClass::Legacy),
            PathBuf::from("/srv/site/dist/templates/legacy")
        );
        assert_eq!(
            config.public_path_for(BrowserClass::Legacy).as_deref(),
            Some("/dist/assets/legacy/")
        );
        assert_eq!(ProjectConfig::default().public_path_for(BrowserClass::Modern), None);
    }
}
