//! Override phase
//!
//! Applies override-option values onto their declared target paths, in
//! schema registration order: the local override file first, then the
//! cross-compilation override file, then command-line-supplied files in
//! arrival order. Later overrides win on conflicting keys. This phase runs
//! before inheritance, so inherited values can never clobber an explicit
//! override.

use super::error::ConfigError;
use super::merge::merge_option_value;
use super::node::ConfigNode;
use super::path::{ConfPath, Step};
use super::schema::{OptionKind, Schema};

/// Apply every override option whose source value is present.
pub fn apply_overrides(schema: &Schema, values: &mut ConfigNode) -> Result<(), ConfigError> {
    for (path, option) in schema.iter() {
        let OptionKind::Override { target } = &option.kind else {
            continue;
        };
        let Some(overlay) = values.get(&path).cloned() else {
            continue;
        };
        let target_option = schema.find(target).ok_or_else(|| {
            ConfigError::invalid_value(
                path.to_string(),
                format!("override target {} is not a recognized option", target),
            )
        })?;
        ensure_mapping_path(values, target)?;
        let base = values
            .get(target)
            .cloned()
            .unwrap_or_else(ConfigNode::empty_mapping);
        let merged = merge_option_value(target_option, target, &base, &overlay)?;
        values.set(target, merged);
    }
    Ok(())
}

/// Create empty mappings along `path` so an override can land on a target
/// the main file never mentioned. An intermediate step that exists as a
/// leaf is a type error.
fn ensure_mapping_path(values: &mut ConfigNode, path: &ConfPath) -> Result<(), ConfigError> {
    let mut current = ConfPath::root();
    let total = path.len();
    for (idx, step) in path.steps().enumerate() {
        let Step::Name(name) = step else {
            return Err(ConfigError::NoSuchPath {
                path: path.to_string(),
            });
        };
        current = current.join_name(name);
        let is_last = idx + 1 == total;
        match values.get(&current) {
            None => {
                values.set(&current, ConfigNode::empty_mapping());
            }
            Some(node) if !node.is_mapping() && !is_last => {
                return Err(ConfigError::wrong_type(
                    current.to_string(),
                    "dict",
                    node.type_name(),
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}
