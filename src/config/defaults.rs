//! Defaulting phase
//!
//! Fills every option still unset after verification, overrides and
//! inheritance. Absolute defaults are written as-is; reference defaults copy
//! the value of another option, computing that option's own default on
//! demand when it has not been written yet. Options without a default are
//! skipped along with their entire subtree, which is how optional sections
//! stay absent from the resolved configuration.

use super::error::ConfigError;
use super::node::ConfigNode;
use super::path::ConfPath;
use super::schema::{ConfigOption, DefaultPolicy, Schema};

const MAX_REF_DEPTH: usize = 32;

/// Fill defaults for the option subtree rooted at `base`. The node at
/// `base` must already exist; nothing happens otherwise.
pub fn update_defaults(
    schema: &Schema,
    values: &mut ConfigNode,
    base: &ConfPath,
) -> Result<(), ConfigError> {
    let Some(root_option) = schema.find(base) else {
        return Ok(());
    };
    if !values.is_set(base) {
        return Ok(());
    }
    for sub in &root_option.sub_options {
        default_option(schema, sub, &base.join_name(&sub.name), base, values)?;
    }
    Ok(())
}

fn default_option(
    schema: &Schema,
    option: &ConfigOption,
    path: &ConfPath,
    base: &ConfPath,
    values: &mut ConfigNode,
) -> Result<(), ConfigError> {
    if !values.is_set(path) {
        match &option.default {
            DefaultPolicy::NoDefault => return Ok(()),
            DefaultPolicy::Required => {
                return Err(ConfigError::MissingRequired {
                    path: path.to_string(),
                });
            }
            DefaultPolicy::Value(default) => {
                values.set(path, default.clone());
            }
            DefaultPolicy::Ref {
                path: target,
                relative,
            } => match resolve_ref(schema, values, base, path, target, *relative, 0)? {
                Some(value) => {
                    values.set(path, value);
                }
                // The referenced option is unset and has no computable
                // default: leave this option unset too.
                None => return Ok(()),
            },
        }
    }
    if values.get(path).is_some_and(ConfigNode::is_mapping) {
        for sub in &option.sub_options {
            default_option(schema, sub, &path.join_name(&sub.name), base, values)?;
        }
    }
    Ok(())
}

/// Resolve a reference default: the referenced value when set, otherwise the
/// referenced option's own default, followed through chained references.
fn resolve_ref(
    schema: &Schema,
    values: &ConfigNode,
    base: &ConfPath,
    from: &ConfPath,
    target: &ConfPath,
    relative: bool,
    depth: usize,
) -> Result<Option<ConfigNode>, ConfigError> {
    if depth > MAX_REF_DEPTH {
        return Err(ConfigError::invalid_value(
            from.to_string(),
            "circular reference in default values",
        ));
    }
    let target_abs = if relative {
        from.parent().unwrap_or_default().join(target)?
    } else {
        base.join(target)?
    };
    if let Some(value) = values.get(&target_abs) {
        return Ok(Some(value.clone()));
    }
    let Some(target_option) = schema.find(&target_abs) else {
        return Ok(None);
    };
    match &target_option.default {
        DefaultPolicy::Value(value) => Ok(Some(value.clone())),
        DefaultPolicy::Ref {
            path: next,
            relative,
        } => resolve_ref(schema, values, base, &target_abs, next, *relative, depth + 1),
        DefaultPolicy::NoDefault | DefaultPolicy::Required => Ok(None),
    }
}
