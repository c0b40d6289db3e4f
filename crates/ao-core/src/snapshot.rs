//! AuroraConfig snapshot and the file naming convention it is organized by.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

pub const ABOUT_FILE: &str = "about.json";
const JSON_SUFFIX: &str = ".json";

/// Complete configuration state of one affiliation.
///
/// File contents are kept as raw JSON so that a fetch followed by a write
/// submits untouched files byte for byte.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub files: BTreeMap<String, Box<RawValue>>,
    #[serde(default)]
    pub versions: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn content(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(|raw| raw.get())
    }

    pub fn version(&self, path: &str) -> Option<&str> {
        self.versions.get(path).map(String::as_str)
    }

    /// Copy of this snapshot with the given paths removed from `files`.
    ///
    /// Version tokens are left alone; the store ignores tokens for absent files.
    pub fn without<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> Snapshot {
        let mut next = self.clone();
        for path in paths {
            next.files.remove(path);
        }
        next
    }
}

/// Role of a path under the naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPath<'a> {
    /// `<env>/about.json`
    EnvAbout { env: &'a str },
    /// `<env>/<app>.json`
    Deployment { env: &'a str, app: &'a str },
    /// `<app>.json`
    AppRoot { app: &'a str },
    Other,
}

impl<'a> ConfigPath<'a> {
    pub fn classify(path: &'a str) -> Self {
        match path.split_once('/') {
            Some((env, file)) if !env.is_empty() && !file.contains('/') => {
                if file == ABOUT_FILE {
                    ConfigPath::EnvAbout { env }
                } else {
                    match file.strip_suffix(JSON_SUFFIX) {
                        Some(app) if !app.is_empty() => ConfigPath::Deployment { env, app },
                        _ => ConfigPath::Other,
                    }
                }
            }
            Some(_) => ConfigPath::Other,
            None => ConfigPath::AppRoot {
                app: path.strip_suffix(JSON_SUFFIX).unwrap_or(path),
            },
        }
    }

    pub fn env(&self) -> Option<&'a str> {
        match *self {
            ConfigPath::EnvAbout { env } | ConfigPath::Deployment { env, .. } => Some(env),
            _ => None,
        }
    }
}

pub fn about_path(env: &str) -> String {
    format!("{env}/{ABOUT_FILE}")
}

pub fn deployment_path(env: &str, app: &str) -> String {
    format!("{env}/{app}{JSON_SUFFIX}")
}

pub fn root_path(app: &str) -> String {
    format!("{app}{JSON_SUFFIX}")
}

/// Strip a trailing `.json` from a user token.
pub fn trim_json_suffix(token: &str) -> &str {
    token.strip_suffix(JSON_SUFFIX).unwrap_or(token)
}

#[cfg(test)]
pub(crate) fn snapshot_of(paths: &[&str]) -> Snapshot {
    let mut snapshot = Snapshot::default();
    for (i, path) in paths.iter().enumerate() {
        let raw = RawValue::from_string(format!("{{\"n\":{i}}}")).expect("raw json");
        snapshot.files.insert(path.to_string(), raw);
        snapshot.versions.insert(path.to_string(), format!("v{i}"));
    }
    snapshot
}
