//! Data structures describing a single browser-class build target.
//!
//! The records serialise into the shape the external bundler expects (camelCase keys,
//! Babel preset pairs, `false` for disabled options) so a driver can hand them over
//! without further translation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::BuildConfigError;

/// Target compatibility tier for generated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserClass {
    /// Browsers with native module support; loaded through `<script type="module">`.
    Modern,
    /// Browsers without module support; loaded through `<script nomodule>`.
    Legacy,
}

impl BrowserClass {
    /// Every browser class, in the order descriptors are emitted.
    pub const ALL: [BrowserClass; 2] = [BrowserClass::Modern, BrowserClass::Legacy];

    /// Lowercase identifier used in paths and serialised output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Modern => "modern",
            Self::Legacy => "legacy",
        }
    }

    /// Attribute appended to the script tag so each browser loads exactly one bundle.
    pub fn script_attribute(self) -> &'static str {
        match self {
            Self::Modern => r#" type="module""#,
            Self::Legacy => " nomodule",
        }
    }

    /// Whether the target environment understands native module syntax.
    pub fn supports_esmodules(self) -> bool {
        matches!(self, Self::Modern)
    }
}

impl fmt::Display for BrowserClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserClass {
    type Err = BuildConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "modern" => Ok(Self::Modern),
            "legacy" => Ok(Self::Legacy),
            other => Err(BuildConfigError::InvalidBrowserClass(other.to_string())),
        }
    }
}

/// Bundler mode derived from the driver's `--mode` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Optimised build without watching or source maps.
    Production,
    /// Watching build with source maps.
    Development,
}

impl BuildMode {
    /// Only the exact string `production` selects a production build.
    pub fn from_flag(flag: Option<&str>) -> Self {
        Self::from_production(flag == Some("production"))
    }

    /// Map a production flag onto a mode.
    pub fn from_production(is_production: bool) -> Self {
        if is_production {
            Self::Production
        } else {
            Self::Development
        }
    }

    /// Whether this mode is a production build.
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Input accepted by [`crate::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetOptions {
    /// Browser class the descriptor is generated for.
    pub browser_class: BrowserClass,
    /// Whether the build runs in production mode.
    pub is_production: bool,
}

/// Complete build configuration for one browser class.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTargetDescriptor {
    /// Browser class, doubling as the configuration name.
    pub name: BrowserClass,
    /// Bundler mode.
    pub mode: BuildMode,
    /// Rebuild on change; always the inverse of production.
    pub watch: bool,
    /// Source map style, `false` when disabled.
    #[serde(serialize_with = "serialize_devtool")]
    pub devtool: Option<String>,
    /// Logical entry name mapped to its source file.
    pub entry: BTreeMap<String, String>,
    /// Where and how bundled files are written.
    pub output: OutputOptions,
    /// Per-module transformation rules.
    pub module: ModuleOptions,
    /// Module resolution settings.
    pub resolve: ResolveOptions,
    /// Post-build steps: CSS extraction and chunk template emission.
    pub plugins: PluginOptions,
    /// Chunk splitting policy.
    pub optimization: OptimizationOptions,
}

impl BuildTargetDescriptor {
    /// Browser class this descriptor targets.
    pub fn browser_class(&self) -> BrowserClass {
        self.name
    }

    /// Whether the descriptor was generated for a production build.
    pub fn is_production(&self) -> bool {
        self.mode.is_production()
    }

    /// Entry points keyed by logical name.
    pub fn entry_points(&self) -> &BTreeMap<String, String> {
        &self.entry
    }

    /// Directory receiving the bundled output.
    pub fn output_directory(&self) -> &Path {
        &self.output.path
    }

    /// Presets applied by the transpile rule, in order.
    pub fn transform_presets(&self) -> &[TransformPreset] {
        self
            .module
            .rules
            .iter()
            .find_map(|rule| match rule {
                ModuleRule::Transpile { options, .. } => Some(options.presets.as_slice()),
                ModuleRule::Stylesheet { .. } => None,
            })
            .unwrap_or_default()
    }

    /// Script tag template written for each chunk.
    pub fn script_tag_template(&self) -> &str {
        &self.plugins.chunk_manifest.template_script
    }

    /// Whether any preset injects polyfills based on usage.
    pub fn injects_polyfills(&self) -> bool {
        self
            .transform_presets()
            .iter()
            .any(TransformPreset::injects_polyfills)
    }

    /// First rule whose pattern matches the given module path.
    pub fn rule_for(&self, path: &str) -> Option<&ModuleRule> {
        self.module.rules.iter().find(|rule| rule.test().is_match(path))
    }
}

fn serialize_devtool<S: Serializer>(
    value: &Option<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(devtool) => serializer.serialize_str(devtool),
        None => serializer.serialize_bool(false),
    }
}

/// Output location and filename patterns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    /// Directory receiving the bundles; distinct per browser class.
    pub path: PathBuf,
    /// Bundle filename pattern.
    pub filename: String,
    /// Source map filename pattern.
    pub source_map_filename: String,
    /// URL prefix under which the bundles are served; the bundler decides when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_path: Option<String>,
}

/// Module transformation rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleOptions {
    /// Rules evaluated in order against each module path.
    pub rules: Vec<ModuleRule>,
}

/// A single transformation rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModuleRule {
    /// Scripts passed through the transpiler.
    Transpile {
        /// Module paths the rule applies to.
        test: RulePattern,
        /// Loader invoked for matching modules.
        loader: String,
        /// Loader options.
        options: TranspileOptions,
    },
    /// Stylesheets passed through the extraction pipeline.
    Stylesheet {
        /// Module paths the rule applies to.
        test: RulePattern,
        /// Loaders applied right to left by the bundler.
        #[serde(rename = "use")]
        pipeline: Vec<String>,
    },
}

impl ModuleRule {
    /// Pattern selecting the modules this rule applies to.
    pub fn test(&self) -> &RulePattern {
        match self {
            Self::Transpile { test, .. } | Self::Stylesheet { test, .. } => test,
        }
    }
}

/// Regular expression matched against module paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePattern {
    /// Expression source without delimiters.
    pub source: String,
    /// Whether the expression ignores case (`/.../i`).
    pub case_insensitive: bool,
}

impl RulePattern {
    /// Pattern compared case-sensitively.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            case_insensitive: false,
        }
    }

    /// Pattern compared without regard to case.
    pub fn case_insensitive(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            case_insensitive: true,
        }
    }

    /// Whether the module path matches. Malformed expressions never match.
    pub fn is_match(&self, path: &str) -> bool {
        RegexBuilder::new(&self.source)
            .case_insensitive(self.case_insensitive)
            .build()
            .is_ok_and(|pattern| pattern.is_match(path))
    }
}

/// Options handed to the transpiling loader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranspileOptions {
    /// Presets applied in order.
    pub presets: Vec<TransformPreset>,
}

/// A transpiler preset, serialised as the `[name, options]` pair Babel expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformPreset(pub String, pub PresetEnvOptions);

impl TransformPreset {
    /// Preset package name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Preset options.
    pub fn options(&self) -> &PresetEnvOptions {
        &self.1
    }

    /// Whether the preset injects polyfills for the features a module uses.
    pub fn injects_polyfills(&self) -> bool {
        self.1.use_built_ins == Some(UseBuiltIns::Usage)
    }
}

/// Options for the environment preset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetEnvOptions {
    /// Environments the output must run in.
    pub targets: PresetTargets,
    /// Polyfill injection strategy; absent means no injection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_built_ins: Option<UseBuiltIns>,
    /// Version of the shared polyfill library used for injection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corejs: Option<String>,
    /// Log the selected plugins and polyfills.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

/// Environment targets for the preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PresetTargets {
    /// Target browsers with native module support.
    pub esmodules: bool,
}

/// Polyfill injection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseBuiltIns {
    /// Import only the polyfills each module needs.
    Usage,
}

/// Module resolution settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveOptions {
    /// Extensions tried when an import omits one.
    pub extensions: Vec<String>,
}

/// Post-build steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginOptions {
    /// Stylesheet extraction into standalone files.
    pub css_extract: CssExtractOptions,
    /// Per-chunk HTML fragment emission.
    pub chunk_manifest: ChunkManifestOptions,
}

/// Filenames for extracted stylesheets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CssExtractOptions {
    /// Filename pattern for entry stylesheets.
    pub filename: String,
    /// Filename pattern for split-chunk stylesheets.
    pub chunk_filename: String,
}

/// Settings for the HTML fragments written per entry chunk.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkManifestOptions {
    /// Directory receiving the fragments; distinct per browser class.
    pub output_path: PathBuf,
    /// Extension appended to each fragment.
    pub file_extension: String,
    /// Template for stylesheet files, `{{chunk}}` marks the href.
    pub template_style: String,
    /// Template for script files, `{{chunk}}` marks the src.
    pub template_script: String,
}

/// Chunk optimisation settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationOptions {
    /// Shared-code splitting policy.
    pub split_chunks: SplitChunksOptions,
}

/// Shared-code splitting policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitChunksOptions {
    /// Which chunks are eligible for splitting.
    pub chunks: String,
    /// Naming policy for split chunks.
    pub name: ChunkNaming,
}

/// Naming policy for split chunks, serialised as the bundler's boolean flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum ChunkNaming {
    /// Split chunks receive opaque ids.
    #[default]
    Disabled,
    /// Split chunks are named deterministically after the modules they hold.
    Deterministic,
}

impl From<bool> for ChunkNaming {
    fn from(value: bool) -> Self {
        if value {
            Self::Deterministic
        } else {
            Self::Disabled
        }
    }
}

impl From<ChunkNaming> for bool {
    fn from(value: ChunkNaming) -> Self {
        matches!(value, ChunkNaming::Deterministic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_browser_classes() {
        assert_eq!("modern".parse::<BrowserClass>().unwrap(), BrowserClass::Modern);
        assert_eq!(" legacy ".parse::<BrowserClass>().unwrap(), BrowserClass::Legacy);
    }

    #[test]
    fn rejects_unknown_browser_class() {
        let err = "evergreen".parse::<BrowserClass>().unwrap_err();
        assert!(matches!(
            err,
            BuildConfigError::InvalidBrowserClass(value) if value == "evergreen"
        ));
    }

    #[test]
    fn only_exact_production_flag_selects_production() {
        assert_eq!(BuildMode::from_flag(Some("production")), BuildMode::Production);
        assert_eq!(BuildMode::from_flag(Some("Production")), BuildMode::Development);
        assert_eq!(BuildMode::from_flag(Some("none")), BuildMode::Development);
        assert_eq!(BuildMode::from_flag(None), BuildMode::Development);
    }

    #[test]
    fn case_insensitive_pattern_matches_upper_case_extension() {
        let pattern = RulePattern::case_insensitive(r"\.css$");
        assert!(pattern.is_match("./bootstrap.CSS"));
        assert!(!RulePattern::new(r"\.css$").is_match("./bootstrap.CSS"));
    }

    #[test]
    fn malformed_pattern_never_matches() {
        assert!(!RulePattern::new("(").is_match("("));
    }

    #[test]
    fn chunk_naming_serialises_as_boolean() {
        assert_eq!(serde_json::to_string(&ChunkNaming::Disabled).unwrap(), "false");
        assert_eq!(serde_json::to_string(&ChunkNaming::Deterministic).unwrap(), "true");
        let parsed: ChunkNaming = serde_json::from_str("true").unwrap();
        assert_eq!(parsed, ChunkNaming::Deterministic);
    }

    #[test]
    fn preset_serialises_as_name_options_pair() {
        let preset = TransformPreset(
            "@babel/preset-env".into(),
            PresetEnvOptions {
                targets: PresetTargets { esmodules: false },
                use_built_ins: Some(UseBuiltIns::Usage),
                corejs: Some("3".into()),
                debug: None,
            },
        );

        let value = serde_json::to_value(&preset).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                "@babel/preset-env",
                { "targets": { "esmodules": false }, "useBuiltIns": "usage", "corejs": "3" }
            ])
        );
        assert!(preset.injects_polyfills());
    }
}
