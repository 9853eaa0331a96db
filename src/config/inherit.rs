//! Inheritance phase
//!
//! For every schema option carrying an inherit-source path, keys present at
//! the source but absent at the destination are copied in. Destination
//! values always win on conflict; environment-style dicts merge key-level
//! and tool argument lists extend instead of replacing. Traversal is
//! depth-first in schema order so chained inheritance (cross profile → OS
//! profile → top-level block) resolves parents before children.

use super::error::ConfigError;
use super::merge::merge_option_value;
use super::node::ConfigNode;
use super::path::ConfPath;
use super::schema::Schema;

/// Run inheritance over the whole tree.
pub fn inherit_all(schema: &Schema, values: &mut ConfigNode) -> Result<(), ConfigError> {
    for (path, option) in schema.iter() {
        let Some(source_rel) = &option.inherits else {
            continue;
        };
        // Inherit sources are absolute; resolving from the root also
        // rejects pointers that ascend out of the tree.
        let source = ConfPath::root().join(source_rel)?;
        let source_is_set = values.is_set(&source);
        if !values.is_set(&path) {
            if !(option.create_if_inherit_target_exists && source_is_set) {
                continue;
            }
            // The destination's parent section may be absent entirely, in
            // which case there is nothing to create into.
            if !values.set(&path, ConfigNode::empty_mapping()) {
                continue;
            }
        }
        if !source_is_set {
            continue;
        }
        let Some(source_value) = values.get(&source).cloned() else {
            continue;
        };
        let Some(dest_value) = values.get(&path).cloned() else {
            continue;
        };
        let merged = merge_option_value(option, &path, &source_value, &dest_value)?;
        values.set(&path, merged);
    }
    Ok(())
}
