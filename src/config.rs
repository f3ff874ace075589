use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CopilotResult;
use crate::markdown::{MarkdownOptions, MarkdownRenderer};
use crate::normalize::Normalizer;
use crate::segment::is_truthy;
use crate::style::StyleSet;

const LLM_PLUGIN_NAMES: [&str; 2] = ["@saltcorn/large-language-model", "large-language-model"];
const LLM_PLUGIN_MARKER: &str = "large-language-model";

/// Crate configuration. Every field has a default, so `{}` is a valid config.
///
/// ```yaml
/// markdown:
///   tables: true
/// handledStyles: box
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CopilotConfig {
    pub markdown: MarkdownOptions,
    pub handled_styles: StyleSet,
}

impl CopilotConfig {
    pub fn from_yaml_str(source: &str) -> CopilotResult<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> CopilotResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// A normaliser set up from this config.
    pub fn normalizer(&self) -> Normalizer<MarkdownRenderer> {
        Normalizer::new(MarkdownRenderer::new(self.markdown.clone()))
            .with_style_set(self.handled_styles)
    }
}

/// Installed plugins and their configuration, keyed by plugin name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginConfigs(pub Map<String, Value>);

impl PluginConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, config: Value) {
        self.0.insert(name.into(), config);
    }

    /// Installed with a non-empty configuration.
    pub fn is_configured(&self, name: &str) -> bool {
        self.0.get(name).map(is_truthy).unwrap_or(false)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<Map<String, Value>> for PluginConfigs {
    fn from(map: Map<String, Value>) -> Self {
        PluginConfigs(map)
    }
}

/// An HTML advisory when no language-model plugin is configured, else `None`.
pub fn incomplete_cfg_msg(plugins: &PluginConfigs) -> Option<String> {
    if LLM_PLUGIN_NAMES.iter().any(|name| plugins.is_configured(name)) {
        return None;
    }
    match plugins.names().find(|name| name.contains(LLM_PLUGIN_MARKER)) {
        Some(name) => Some(format!(
            "LLM module not configured. Please configure <a href=\"/plugins/configure/{}\">here<a> before using copilot.",
            urlencoding::encode(name)
        )),
        None => Some(
            "LLM module not configured. Please install and configure <a href=\"/plugins\">here<a> before using copilot."
                .to_string(),
        ),
    }
}
