//! Assemble the per-browser-class build configuration.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::ProjectConfig;
use crate::models::{
    BrowserClass, BuildMode, BuildTargetDescriptor, ChunkManifestOptions, CssExtractOptions,
    ModuleOptions, ModuleRule, OptimizationOptions, OutputOptions, PluginOptions, PresetEnvOptions,
    PresetTargets, ResolveOptions, RulePattern, SplitChunksOptions, TargetOptions, TranspileOptions,
    TransformPreset, UseBuiltIns,
};

const PRESET_ENV: &str = "@babel/preset-env";
const TRANSPILE_LOADER: &str = "babel-loader";
const CSS_EXTRACT_LOADER: &str = "mini-css-extract-plugin/dist/loader";
const CSS_MODULE_LOADER: &str = "css-loader";
const SOURCE_MAP_DEVTOOL: &str = "source-map";
const STYLE_TEMPLATE: &str = r#"<link rel="stylesheet" href="{{chunk}}" />"#;

/// Driver-supplied environment flags (`--env key=value`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnv(pub BTreeMap<String, String>);

impl BuildEnv {
    /// Parse `key=value` pairs; a bare `key` is recorded as `true`.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let flags = pairs
            .into_iter()
            .filter_map(|pair| {
                let pair = pair.as_ref().trim();
                if pair.is_empty() {
                    return None;
                }
                let (key, value) = pair.split_once('=').unwrap_or((pair, "true"));
                Some((key.to_string(), value.to_string()))
            })
            .collect();
        Self(flags)
    }
}

/// Driver arguments consulted when selecting the build mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildArgs {
    /// Raw `--mode` value, if any.
    pub mode: Option<String>,
}

impl BuildArgs {
    /// Arguments carrying the given mode flag.
    pub fn with_mode(mode: impl Into<String>) -> Self {
        Self {
            mode: Some(mode.into()),
        }
    }
}

/// Build the complete configuration for one browser class.
///
/// The result depends only on the inputs; no filesystem or network access happens here.
pub fn generate(options: &TargetOptions, config: &ProjectConfig) -> BuildTargetDescriptor {
    let class = options.browser_class;
    let mode = BuildMode::from_production(options.is_production);

    let descriptor = BuildTargetDescriptor {
        name: class,
        mode,
        watch: !options.is_production,
        devtool: (!options.is_production).then(|| SOURCE_MAP_DEVTOOL.to_string()),
        entry: config.entries.clone(),
        output: OutputOptions {
            path: config.asset_dir(class),
            filename: "[name].js".into(),
            source_map_filename: "[file].map".into(),
            public_path: config.public_path_for(class),
        },
        module: ModuleOptions {
            rules: vec![
                ModuleRule::Transpile {
                    test: RulePattern::new(r"\.js$"),
                    loader: TRANSPILE_LOADER.into(),
                    options: TranspileOptions {
                        presets: vec![preset_for(class, config)],
                    },
                },
                ModuleRule::Stylesheet {
                    test: RulePattern::case_insensitive(r"\.css$"),
                    pipeline: vec![CSS_EXTRACT_LOADER.into(), CSS_MODULE_LOADER.into()],
                },
            ],
        },
        resolve: ResolveOptions {
            extensions: vec![".js".into(), ".css".into()],
        },
        plugins: PluginOptions {
            css_extract: CssExtractOptions {
                filename: "[name].css".into(),
                chunk_filename: "[name].css".into(),
            },
            chunk_manifest: ChunkManifestOptions {
                output_path: config.template_dir(class),
                file_extension: config.template_extension.clone(),
                template_style: STYLE_TEMPLATE.into(),
                template_script: script_template(class),
            },
        },
        optimization: OptimizationOptions {
            split_chunks: SplitChunksOptions {
                chunks: "all".into(),
                name: config.chunk_naming,
            },
        },
    };

    debug!(
        target_class = %class,
        production = options.is_production,
        output = %descriptor.output.path.display(),
        "generated build target"
    );
    descriptor
}

/// Read the build mode and generate one descriptor per browser class, modern first.
pub fn select_mode(
    env: &BuildEnv,
    argv: &BuildArgs,
    config: &ProjectConfig,
) -> [BuildTargetDescriptor; 2] {
    let mode = BuildMode::from_flag(argv.mode.as_deref());
    debug!(?mode, env = ?env.0, "selecting build targets");

    BrowserClass::ALL.map(|browser_class| {
        generate(
            &TargetOptions {
                browser_class,
                is_production: mode.is_production(),
            },
            config,
        )
    })
}

fn preset_for(class: BrowserClass, config: &ProjectConfig) -> TransformPreset {
    let options = match class {
        BrowserClass::Modern => PresetEnvOptions {
            targets: PresetTargets { esmodules: true },
            use_built_ins: None,
            corejs: None,
            debug: Some(config.transpiler_debug),
        },
        BrowserClass::Legacy => PresetEnvOptions {
            targets: PresetTargets { esmodules: false },
            use_built_ins: Some(UseBuiltIns::Usage),
            corejs: Some(config.corejs.clone()),
            debug: None,
        },
    };
    TransformPreset(PRESET_ENV.into(), options)
}

fn script_template(class: BrowserClass) -> String {
    format!(
        r#"<script defer{} src="{{{{chunk}}}}"></script>"#,
        class.script_attribute()
    )
}
