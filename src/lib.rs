#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod example_page;
pub mod export;
pub mod generator;
pub mod models;
pub mod templates;

pub use config::ProjectConfig;
pub use error::BuildConfigError;
pub use export::{ExportFormat, render_descriptors};
pub use generator::{BuildArgs, BuildEnv, generate, select_mode};
pub use models::{BrowserClass, BuildMode, BuildTargetDescriptor, ChunkNaming, TargetOptions};
