//! Project metadata
//!
//! Extraction of the `[project]` table fields the backend needs, plus the
//! name normalization rules: distribution names follow the package-index
//! normalization (runs of `-_.` become a single `-`, lowercased), wheel
//! file components escape everything else to `_`.

use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::node::ConfigNode;
use super::path::ConfPath;

/// Package metadata from the `[project]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Normalized distribution name
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parse the `[project]` table. The name is required and is normalized.
pub fn parse_project_metadata(
    project: &ConfigNode,
    path: &ConfPath,
) -> Result<ProjectMetadata, ConfigError> {
    if !project.is_mapping() {
        return Err(ConfigError::wrong_type(
            path.to_string(),
            "dict",
            project.type_name(),
        ));
    }
    let name = match project.child("name") {
        Some(node) => node.as_str().ok_or_else(|| {
            ConfigError::wrong_type(
                path.join_name("name").to_string(),
                "string",
                node.type_name(),
            )
        })?,
        None => {
            return Err(ConfigError::MissingRequired {
                path: path.join_name("name").to_string(),
            });
        }
    };
    let optional_str = |field: &str| -> Result<Option<String>, ConfigError> {
        match project.child(field) {
            Some(node) => node
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| {
                    ConfigError::wrong_type(
                        path.join_name(field).to_string(),
                        "string",
                        node.type_name(),
                    )
                }),
            None => Ok(None),
        }
    };
    Ok(ProjectMetadata {
        name: normalize_dist_name(name),
        version: optional_str("version")?,
        description: optional_str("description")?,
    })
}

/// Package-index name normalization: runs of `-`, `_` and `.` collapse to a
/// single `-` and the result is lowercased.
pub fn normalize_dist_name(name: &str) -> String {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    let re = SEPARATORS.get_or_init(|| Regex::new(r"[-_.]+").expect("valid pattern"));
    re.replace_all(name, "-").to_lowercase()
}

/// Wheel-filename escaping: every run of characters outside `[A-Za-z0-9._]`
/// becomes a single `_`.
pub fn normalize_wheel_name(name: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    let re = INVALID.get_or_init(|| Regex::new(r"[^\w.]+").expect("valid pattern"));
    re.replace_all(name, "_").into_owned()
}

/// Import-name normalization for the extension module itself.
pub fn normalize_import_name(name: &str) -> String {
    name.replace('-', "_")
}
