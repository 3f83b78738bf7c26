use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigError;

// -----------------------------------------------------------------------------
// Types
// -----------------------------------------------------------------------------

/// Prefix used for unmapped modules when none is configured.
pub const DEFAULT_MODULE_PREFIX: &str = "./";

static REPEATED_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"/{2,}").unwrap());

/// Exact-match table from a logical module name to its replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ModuleMap(HashMap<String, String>);

impl ModuleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a persisted module-map file: a flat JSON object of
    /// `"ShortName": "package/lib/ShortName"` entries.
    ///
    /// Used by native build drivers that load the map from disk before
    /// building a [`RewriteConfig`](crate::RewriteConfig); the Wasm plugin
    /// takes its map inline from the plugin config instead.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|source| ConfigError::InvalidModuleMap { source })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Merge `other` into this map. Entries from `other` win on conflict.
    ///
    /// Native build drivers use this to layer a module-map file over the
    /// inline entries of their build options.
    pub fn extend(&mut self, other: ModuleMap) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ModuleMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Whether the build runs under the test runner.
///
/// The test runner resolves logical module names itself, so unmapped names
/// are left alone in `Test` mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentMode {
    Test,
    #[default]
    Normal,
}

impl EnvironmentMode {
    /// Map a build environment name (SWC's `env`, the `NODE_ENV` analogue).
    pub fn from_env_name(env_name: &str) -> Self {
        if env_name == "test" {
            EnvironmentMode::Test
        } else {
            EnvironmentMode::Normal
        }
    }
}

// -----------------------------------------------------------------------------
// Resolution
// -----------------------------------------------------------------------------

/// Resolve `name` to its replacement. `None` means leave the literal as is.
pub fn resolve(
    name: &str,
    map: &ModuleMap,
    prefix: Option<&str>,
    mode: EnvironmentMode,
) -> Option<String> {
    if let Some(target) = map.get(name) {
        return Some(target.to_string());
    }
    match mode {
        EnvironmentMode::Test => None,
        EnvironmentMode::Normal => {
            let prefix = prefix.unwrap_or(DEFAULT_MODULE_PREFIX);
            Some(normalize(&format!("{prefix}{name}")))
        }
    }
}

/// Collapse redundant separators and `.`/`..` segments of a module specifier.
///
/// Unlike filesystem normalization, an explicit leading `./` is kept so the
/// result still reads as a relative specifier.
pub fn normalize(path: &str) -> String {
    let collapsed = REPEATED_SEPARATORS.replace_all(path, "/");
    let absolute = collapsed.starts_with('/');
    let explicit_relative = collapsed.starts_with("./");
    let trailing_slash = collapsed.len() > 1 && collapsed.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for seg in collapsed.split('/') {
        match seg {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                // `..` cannot climb above the root
                _ if absolute => {}
                _ => segments.push(".."),
            },
            _ => segments.push(seg),
        }
    }

    let mut out = segments.join("/");
    let climbs = out == ".." || out.starts_with("../");
    if absolute {
        out.insert(0, '/');
    } else if explicit_relative && !climbs {
        out.insert_str(0, "./");
    }
    if trailing_slash && !out.ends_with('/') {
        out.push('/');
    }
    if out.is_empty() {
        out.push('.');
    }
    out
}
