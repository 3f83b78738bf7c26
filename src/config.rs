use serde::Deserialize;

use crate::error::ConfigError;
use crate::module_map::{EnvironmentMode, ModuleMap};
use crate::rewrite::RewriteConfig;

/// Plugin options as passed by the SWC host, e.g.
///
/// ```json
/// ["rewrite_modules_swc_plugin", { "moduleMap": { "promise": "promise" }, "modulePrefix": "fbjs/lib/" }]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PluginConfig {
    #[serde(default)]
    pub module_map: ModuleMap,
    pub module_prefix: Option<String>,
    /// Overrides the mode derived from the host's `env`.
    pub mode: Option<EnvironmentMode>,
}

impl PluginConfig {
    /// Parse the raw config string. Blank input and `null` mean defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str::<Option<Self>>(s)
            .map(Option::unwrap_or_default)
            .map_err(|source| ConfigError::InvalidPluginConfig { source })
    }

    /// Settle the pass configuration. An explicit `mode` wins over the
    /// environment name; with neither, the mode is `Normal`.
    pub fn into_rewrite_config(self, env_name: Option<&str>) -> RewriteConfig {
        let mode = self
            .mode
            .or_else(|| env_name.map(EnvironmentMode::from_env_name))
            .unwrap_or_default();
        RewriteConfig {
            module_map: self.module_map,
            module_prefix: self.module_prefix,
            mode,
        }
    }
}
