//! Verification phase
//!
//! Walks the schema against the loaded value trees: every present key must be
//! declared, every value must match its declared type, required options must
//! be present. Override sources are checked against the schema of their
//! target, not their own nominal position. The only mutations are type
//! coercions: bare strings become singleton lists where an option allows it,
//! and list-operation aliases are normalized to their canonical spelling.

use super::error::ConfigError;
use super::listops::{OP_APPEND, OP_PREPEND, OP_REMOVE, OP_VALUE};
use super::node::ConfigNode;
use super::path::ConfPath;
use super::schema::{ConfigOption, DefaultPolicy, ListSpec, OptionKind, Schema};

/// Verify every loaded source against the schema. Sources that are override
/// options are verified against their target's schema.
pub fn verify_sources(schema: &Schema, values: &mut ConfigNode) -> Result<(), ConfigError> {
    for option in &schema.root().sub_options {
        let path = ConfPath::from_names([option.name.clone()]);
        match values.child_mut(&option.name) {
            Some(node) => verify_node(schema, option, &path, node)?,
            None => {
                if matches!(option.default, DefaultPolicy::Required) {
                    return Err(ConfigError::MissingRequired {
                        path: path.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn verify_node(
    schema: &Schema,
    option: &ConfigOption,
    path: &ConfPath,
    node: &mut ConfigNode,
) -> Result<(), ConfigError> {
    match &option.kind {
        OptionKind::Unchecked => Ok(()),
        OptionKind::Override { target } => {
            let target_option = schema.find(target).ok_or_else(|| {
                ConfigError::invalid_value(
                    path.to_string(),
                    format!("override target {} is not a recognized option", target),
                )
            })?;
            verify_node(schema, target_option, path, node)
        }
        OptionKind::Section { strict } => verify_section(schema, option, *strict, path, node),
        OptionKind::Str | OptionKind::Path(_) => match node.as_str() {
            Some(_) => Ok(()),
            None => Err(ConfigError::wrong_type(
                path.to_string(),
                "string",
                node.type_name(),
            )),
        },
        OptionKind::Int => match node.as_int() {
            Some(_) => Ok(()),
            None => Err(ConfigError::wrong_type(
                path.to_string(),
                "int",
                node.type_name(),
            )),
        },
        OptionKind::Bool => match node.as_bool() {
            Some(_) => Ok(()),
            None => Err(ConfigError::wrong_type(
                path.to_string(),
                "bool",
                node.type_name(),
            )),
        },
        OptionKind::Dict => verify_dict(path, node),
        OptionKind::List(spec) => verify_list(spec, path, node),
    }
}

fn verify_section(
    schema: &Schema,
    option: &ConfigOption,
    strict: bool,
    path: &ConfPath,
    node: &mut ConfigNode,
) -> Result<(), ConfigError> {
    if !node.is_mapping() {
        return Err(ConfigError::wrong_type(
            path.to_string(),
            "dict",
            node.type_name(),
        ));
    }
    if strict {
        let unknown: Vec<String> = node
            .children()
            .filter(|(name, _)| option.sub(name).is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        if !unknown.is_empty() {
            return Err(ConfigError::unknown_options(path.to_string(), unknown));
        }
    }
    for sub in &option.sub_options {
        let sub_path = path.join_name(&sub.name);
        match node.child_mut(&sub.name) {
            Some(child) => verify_node(schema, sub, &sub_path, child)?,
            None => {
                if matches!(sub.default, DefaultPolicy::Required) {
                    return Err(ConfigError::MissingRequired {
                        path: sub_path.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn verify_dict(path: &ConfPath, node: &mut ConfigNode) -> Result<(), ConfigError> {
    if !node.is_mapping() {
        return Err(ConfigError::wrong_type(
            path.to_string(),
            "dict",
            node.type_name(),
        ));
    }
    for (name, value) in node.children() {
        if value.as_str().is_none() {
            return Err(ConfigError::wrong_type(
                path.join_name(name).to_string(),
                "string",
                value.type_name(),
            ));
        }
    }
    Ok(())
}

/// Operation-table aliases: `=`, `+` and `-` spell `value`, `append` and
/// `remove`.
const LIST_ALIASES: &[(&str, &str)] = &[("=", OP_VALUE), ("+", OP_APPEND), ("-", OP_REMOVE)];
const LIST_OPS: &[&str] = &[OP_VALUE, OP_APPEND, OP_PREPEND, OP_REMOVE];

fn verify_list(spec: &ListSpec, path: &ConfPath, node: &mut ConfigNode) -> Result<(), ConfigError> {
    if spec.convert_str_to_singleton {
        if let Some(value) = node.as_str().map(str::to_string) {
            *node = ConfigNode::str_list([value]);
            return Ok(());
        }
    }
    match node {
        ConfigNode::List(items) => {
            for (idx, item) in items.iter().enumerate() {
                if item.as_str().is_none() {
                    return Err(ConfigError::wrong_type(
                        format!("{}[{}]", path, idx),
                        "string",
                        item.type_name(),
                    ));
                }
            }
            Ok(())
        }
        ConfigNode::Mapping(_) => {
            *node = normalize_list_ops(path, node)?;
            Ok(())
        }
        other => Err(ConfigError::wrong_type(
            path.to_string(),
            "list",
            other.type_name(),
        )),
    }
}

/// Validate an operation table and rewrite aliases to canonical keys.
fn normalize_list_ops(path: &ConfPath, node: &ConfigNode) -> Result<ConfigNode, ConfigError> {
    let unknown: Vec<String> = node
        .children()
        .filter(|(name, _)| {
            !LIST_OPS.contains(name) && !LIST_ALIASES.iter().any(|(alias, _)| alias == name)
        })
        .map(|(name, _)| name.to_string())
        .collect();
    if !unknown.is_empty() {
        return Err(ConfigError::unknown_options(path.to_string(), unknown));
    }
    for (alias, canonical) in LIST_ALIASES {
        if node.child(alias).is_some() && node.child(canonical).is_some() {
            return Err(ConfigError::invalid_value(
                path.to_string(),
                format!("cannot combine \"{}\" and \"{}\"", canonical, alias),
            ));
        }
    }
    let member = |canonical: &str, alias: &str| {
        node.child(canonical).or_else(|| node.child(alias)).cloned()
    };
    let value = member(OP_VALUE, "=");
    let append = member(OP_APPEND, "+");
    let remove = member(OP_REMOVE, "-");
    let prepend = node.child(OP_PREPEND).cloned();
    if value.is_some() && (append.is_some() || prepend.is_some() || remove.is_some()) {
        return Err(ConfigError::invalid_value(
            path.to_string(),
            "cannot combine \"value\" or \"=\" with \"append\", \"prepend\" or \"remove\""
                .to_string(),
        ));
    }
    let mut canonical = ConfigNode::empty_mapping();
    for (key, items) in [
        (OP_VALUE, value),
        (OP_APPEND, append),
        (OP_PREPEND, prepend),
        (OP_REMOVE, remove),
    ] {
        let Some(items) = items else { continue };
        let member_path = format!("{}/{}", path, key);
        match &items {
            ConfigNode::List(elements) => {
                for (idx, item) in elements.iter().enumerate() {
                    if item.as_str().is_none() {
                        return Err(ConfigError::wrong_type(
                            format!("{}[{}]", member_path, idx),
                            "string",
                            item.type_name(),
                        ));
                    }
                }
            }
            other => {
                return Err(ConfigError::wrong_type(
                    member_path,
                    "list",
                    other.type_name(),
                ));
            }
        }
        canonical.set_child(key, items);
    }
    Ok(canonical)
}
