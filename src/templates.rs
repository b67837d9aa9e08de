//! Render the per-entry HTML fragments that reference a build target's chunks.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::{NoExpand, Regex};
use tracing::info;

use crate::config::ProjectConfig;
use crate::generator::generate;
use crate::models::{BrowserClass, BuildMode, ChunkManifestOptions, TargetOptions};

fn chunk_placeholder() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*chunk\s*\}\}").expect("invalid chunk placeholder regex")
    })
}

/// Files emitted for one entry chunk, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFiles {
    /// Entry name the chunk belongs to.
    pub name: String,
    /// Emitted files, including split chunks the entry depends on.
    pub files: Vec<String>,
}

/// Rendered fragments for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFragments {
    /// `<link>` tags for the entry's stylesheets.
    pub styles: String,
    /// `<script>` tags for the entry's scripts.
    pub scripts: String,
}

/// Substitute each href into the template, one tag per line.
pub fn render_tags<'a>(template: &str, hrefs: impl IntoIterator<Item = &'a str>) -> String {
    hrefs
        .into_iter()
        .map(|href| chunk_placeholder().replace_all(template, NoExpand(href)).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the style and script fragments for a chunk.
///
/// Only `.css` and `.js` files produce tags; source maps and other emitted files are skipped.
pub fn render_chunk_fragments(
    options: &ChunkManifestOptions,
    public_path: &str,
    chunk: &ChunkFiles,
) -> ChunkFragments {
    let hrefs_with = |extension: &str| {
        chunk
            .files
            .iter()
            .filter(|file| file.ends_with(extension))
            .map(|file| join_public_path(public_path, file))
            .collect::<Vec<_>>()
    };

    let styles = hrefs_with(".css");
    let scripts = hrefs_with(".js");

    ChunkFragments {
        styles: render_tags(&options.template_style, styles.iter().map(String::as_str)),
        scripts: render_tags(&options.template_script, scripts.iter().map(String::as_str)),
    }
}

/// Write `<entry>-styles<ext>` and `<entry>-scripts<ext>` for every chunk.
pub fn write_chunk_templates(
    options: &ChunkManifestOptions,
    public_path: &str,
    chunks: &[ChunkFiles],
) -> Result<Vec<PathBuf>> {
    let output_dir = &options.output_path;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let mut written = Vec::with_capacity(chunks.len() * 2);
    for chunk in chunks {
        let fragments = render_chunk_fragments(options, public_path, chunk);
        for (kind, body) in [("styles", fragments.styles), ("scripts", fragments.scripts)] {
            let target =
                output_dir.join(format!("{}-{kind}{}", chunk.name, options.file_extension));
            fs::write(&target, body)
                .with_context(|| format!("failed to write {}", target.display()))?;
            info!(path = %target.display(), "wrote chunk template");
            written.push(target);
        }
    }

    Ok(written)
}

/// Write the chunk templates of the named browser class for a chunk map file.
///
/// Fails with [`crate::BuildConfigError::InvalidBrowserClass`] before touching the filesystem
/// when `target` is neither `modern` nor `legacy`.
pub fn emit_for_target(
    target: &str,
    mode: Option<&str>,
    config: &ProjectConfig,
    chunk_map: &Path,
) -> Result<Vec<PathBuf>> {
    let browser_class: BrowserClass = target.parse()?;
    let descriptor = generate(
        &TargetOptions {
            browser_class,
            is_production: BuildMode::from_flag(mode).is_production(),
        },
        config,
    );
    let chunks = load_chunk_map(chunk_map)?;
    write_chunk_templates(
        &descriptor.plugins.chunk_manifest,
        descriptor.output.public_path.as_deref().unwrap_or_default(),
        &chunks,
    )
}

/// Load a JSON map of entry name to emitted files.
pub fn load_chunk_map(path: &Path) -> Result<Vec<ChunkFiles>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("chunk map not found at {}", path.display()))?;
    let map: BTreeMap<String, Vec<String>> =
        serde_json::from_str(&content).context("failed to parse chunk map JSON")?;

    Ok(
        map
            .into_iter()
            .map(|(name, files)| ChunkFiles { name, files })
            .collect(),
    )
}

fn join_public_path(public_path: &str, file: &str) -> String {
    let file = file.replace('\\', "/");
    if public_path.is_empty() {
        return file;
    }
    format!(
        "{}/{}",
        public_path.trim_end_matches('/'),
        file.trim_start_matches('/')
    )
}
