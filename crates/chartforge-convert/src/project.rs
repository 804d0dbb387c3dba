//! Project configuration file
//!
//! Operator projects carry a `PROJECT` file describing the project layout.
//! Only the pieces the chart needs are read: the project name and the chart
//! directory recorded by a previous chart generation.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{ConvertError, Result};

/// Default project file name
pub const PROJECT_FILE: &str = "PROJECT";

/// Plugin key under which the chart directory is recorded
pub const HELM_PLUGIN_KEY: &str = "helm.kubebuilder.io/v1-alpha";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default)]
    pub project_name: Option<String>,

    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default)]
    pub plugins: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HelmPluginConfig {
    #[serde(default)]
    chart_dir: Option<String>,
}

impl ProjectConfig {
    pub fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Load the project file, or `None` when it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("project file not found at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(ConvertError::read(path, e)),
        };

        Self::parse(&content)
            .map(Some)
            .map_err(|source| ConvertError::ProjectParse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Chart directory recorded by the Helm plugin, if any
    pub fn chart_dir(&self) -> Option<String> {
        let value = self.plugins.get(HELM_PLUGIN_KEY)?;
        let config: HelmPluginConfig = serde_yaml::from_value(value.clone()).ok()?;
        config.chart_dir.filter(|dir| !dir.is_empty())
    }
}
