//! Project file loading.
//!
//! The project file is YAML: an app name plus a mapping of named
//! constructs, each tagged with its type and carrying the construct's
//! configuration inline.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use statica_core::SpaConfig;

/// The construct type this tool knows how to compile.
pub const SINGLE_PAGE_APP: &str = "single-page-app";

/// Top-level project file: the app name plus its constructs.
#[derive(Debug, Deserialize)]
pub struct ProjectFile {
    pub app: String,
    #[serde(default)]
    pub constructs: BTreeMap<String, ConstructDecl>,
}

/// One construct declaration.
#[derive(Debug, Deserialize)]
pub struct ConstructDecl {
    #[serde(rename = "type")]
    pub construct_type: String,
    #[serde(flatten)]
    pub config: SpaConfig,
}

impl ProjectFile {
    /// Load and parse a YAML project file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot read project file {}", path.display()))?;
        let project: ProjectFile = serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid project file {}", path.display()))?;
        if project.app.is_empty() {
            bail!("project `app` name must not be empty");
        }
        Ok(project)
    }
}
