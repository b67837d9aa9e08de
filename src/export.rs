//! Serialise generated descriptors for the external bundler.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};

use crate::models::BuildTargetDescriptor;

/// Output encoding for descriptors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// Pretty-printed JSON array.
    #[default]
    Json,
    /// YAML sequence.
    Yaml,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(anyhow!("unsupported export format `{other}`")),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Yaml => f.write_str("yaml"),
        }
    }
}

/// Render descriptors in order as a single document.
pub fn render_descriptors(
    descriptors: &[BuildTargetDescriptor],
    format: ExportFormat,
) -> Result<String> {
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(descriptors)
            .context("failed to serialise descriptors as JSON"),
        ExportFormat::Yaml => {
            serde_yaml::to_string(descriptors).context("failed to serialise descriptors as YAML")
        }
    }
}
