//! Merge semantics shared by the override and inherit phases
//!
//! Both phases combine two value trees under one schema node: overrides merge
//! a supplied tree onto its target, inheritance merges a destination tree
//! onto a copy of its source. In both cases the overlay side wins on
//! conflicting leaves and untouched keys from either side survive.

use super::error::ConfigError;
use super::listops::ListOps;
use super::node::ConfigNode;
use super::path::ConfPath;
use super::schema::{ConfigOption, OptionKind};

/// Merge `overlay` onto `base` according to the option's kind. Mapping-typed
/// options merge key-by-key recursively, list options combine their pending
/// operations, everything else is replaced by the overlay.
pub fn merge_option_value(
    option: &ConfigOption,
    path: &ConfPath,
    base: &ConfigNode,
    overlay: &ConfigNode,
) -> Result<ConfigNode, ConfigError> {
    match &option.kind {
        OptionKind::Str
        | OptionKind::Int
        | OptionKind::Bool
        | OptionKind::Path(_)
        | OptionKind::Unchecked => Ok(overlay.clone()),
        OptionKind::Dict => Ok(merge_dict(base, overlay)),
        OptionKind::List(spec) => {
            let mut ops = ListOps::from_node(base, spec);
            ops.combine(&ListOps::from_node(overlay, spec));
            Ok(ops.to_node())
        }
        OptionKind::Section { .. } | OptionKind::Override { .. } => {
            merge_section(option, path, base, overlay)
        }
    }
}

fn merge_dict(base: &ConfigNode, overlay: &ConfigNode) -> ConfigNode {
    let mut merged = if base.is_mapping() {
        base.clone()
    } else {
        ConfigNode::empty_mapping()
    };
    for (name, value) in overlay.children() {
        merged.set_child(name, value.clone());
    }
    merged
}

fn merge_section(
    option: &ConfigOption,
    path: &ConfPath,
    base: &ConfigNode,
    overlay: &ConfigNode,
) -> Result<ConfigNode, ConfigError> {
    let mut merged = if base.is_mapping() {
        base.clone()
    } else {
        ConfigNode::empty_mapping()
    };
    for (name, overlay_child) in overlay.children() {
        let sub_path = path.join_name(name);
        let merged_child = match (option.sub(name), merged.child(name)) {
            (Some(sub_option), Some(base_child)) => {
                merge_option_value(sub_option, &sub_path, base_child, overlay_child)?
            }
            // Key only on the overlay side, or not schema-tracked
            // (non-strict sections): take it as-is.
            _ => overlay_child.clone(),
        };
        merged.set_child(name, merged_child);
    }
    Ok(merged)
}
