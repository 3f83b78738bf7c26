/// Errors raised while loading plugin configuration or a persisted module map.
///
/// The rewrite pass itself never fails; these only come from the
/// orchestrator-facing loaders.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid plugin config: {source}")]
    InvalidPluginConfig {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid module map: {source}")]
    InvalidModuleMap {
        #[source]
        source: serde_json::Error,
    },
}
