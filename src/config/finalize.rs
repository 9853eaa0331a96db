//! Finalization phase
//!
//! The last pass before the tree is flattened: pending list operations
//! collapse into plain lists, path options are resolved against their base
//! directory and checked, and nothing else may fail afterwards.

use std::path::{Component, Path, PathBuf};

use super::error::ConfigError;
use super::listops::ListOps;
use super::node::ConfigNode;
use super::path::{ConfPath, Step};
use super::schema::{ConfigOption, OptionKind, PathBase, PathSpec, Schema};

/// Invocation-scoped data needed to resolve the configuration
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// Directory containing the main config file
    pub project_dir: PathBuf,
    /// Check that path options point at existing files/directories.
    /// Disabled for in-memory resolution in tests.
    pub check_paths: bool,
}

impl ResolveContext {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        ResolveContext {
            project_dir: project_dir.into(),
            check_paths: true,
        }
    }

    pub fn without_path_checks(mut self) -> Self {
        self.check_paths = false;
        self
    }
}

/// Finalize the option subtree rooted at `base`.
pub fn finalize(
    schema: &Schema,
    values: &mut ConfigNode,
    base: &ConfPath,
    ctx: &ResolveContext,
) -> Result<(), ConfigError> {
    let Some(root_option) = schema.find(base) else {
        return Ok(());
    };
    let Some(node) = values.get_mut(base) else {
        return Ok(());
    };
    finalize_node(root_option, base, node, ctx)
}

fn finalize_node(
    option: &ConfigOption,
    path: &ConfPath,
    node: &mut ConfigNode,
    ctx: &ResolveContext,
) -> Result<(), ConfigError> {
    match &option.kind {
        OptionKind::List(spec) => {
            let ops = ListOps::from_node(node, spec);
            *node = ConfigNode::str_list(ops.collapse());
            Ok(())
        }
        OptionKind::Path(spec) => {
            let Some(value) = node.as_str() else {
                return Err(ConfigError::wrong_type(
                    path.to_string(),
                    "string",
                    node.type_name(),
                ));
            };
            let resolved = resolve_path(value, spec, path, ctx)?;
            *node = ConfigNode::str(resolved.to_string_lossy().into_owned());
            Ok(())
        }
        OptionKind::Section { .. } | OptionKind::Override { .. } => {
            for sub in &option.sub_options {
                if let Some(child) = node.child_mut(&sub.name) {
                    finalize_node(sub, &path.join_name(&sub.name), child, ctx)?;
                }
            }
            Ok(())
        }
        OptionKind::Str
        | OptionKind::Int
        | OptionKind::Bool
        | OptionKind::Dict
        | OptionKind::Unchecked => Ok(()),
    }
}

fn resolve_path(
    value: &str,
    spec: &PathSpec,
    path: &ConfPath,
    ctx: &ResolveContext,
) -> Result<PathBuf, ConfigError> {
    let raw = PathBuf::from(value);
    let absolute = if raw.is_absolute() {
        if !spec.allow_absolute {
            return Err(ConfigError::invalid_value(
                path.to_string(),
                format!("\"{}\" must be a relative path", value),
            ));
        }
        raw
    } else {
        base_dir(spec, path, ctx).join(raw)
    };
    let resolved = normalize_path(&absolute);
    if spec.must_exist && ctx.check_paths {
        if !resolved.exists() {
            return Err(ConfigError::invalid_value(
                path.to_string(),
                format!("\"{}\" does not exist", resolved.display()),
            ));
        }
        if spec.is_folder != resolved.is_dir() {
            let kind = if spec.is_folder { "directory" } else { "file" };
            return Err(ConfigError::invalid_value(
                path.to_string(),
                format!("\"{}\" should be a {}", resolved.display(), kind),
            ));
        }
        let missing: Vec<&str> = spec
            .expected_contents
            .iter()
            .map(String::as_str)
            .filter(|sub| !resolved.join(sub).exists())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::invalid_value(
                path.to_string(),
                format!(
                    "\"{}\" does not contain the following required files or folders: \"{}\"",
                    resolved.display(),
                    missing.join("\", \"")
                ),
            ));
        }
    }
    Ok(resolved)
}

/// Base directory for a relative path value. Values from override files
/// (whose source identifier is an absolute file path) resolve next to that
/// file; everything else resolves against the project directory.
fn base_dir(spec: &PathSpec, path: &ConfPath, ctx: &ResolveContext) -> PathBuf {
    match spec.base {
        PathBase::Project => ctx.project_dir.clone(),
        PathBase::ConfigFile => {
            let source = path.steps().next();
            if let Some(Step::Name(name)) = source {
                let source_path = Path::new(name);
                if source_path.is_absolute() {
                    if let Some(parent) = source_path.parent() {
                        return parent.to_path_buf();
                    }
                }
            }
            ctx.project_dir.clone()
        }
    }
}

/// Lexical normalization: resolves `.` and `..` components without touching
/// the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}
