//! List-option operation forms
//!
//! A list-of-strings option accepts either a plain list or a table of
//! operations (`value`, `append`, `prepend`, `remove`, with `=`/`+`/`-`
//! aliases). `ListOps` is the working form used while merging overrides and
//! inherited profiles; finalization collapses it back into a plain list.

use super::node::ConfigNode;
use super::schema::ListSpec;

pub const OP_VALUE: &str = "value";
pub const OP_APPEND: &str = "append";
pub const OP_PREPEND: &str = "prepend";
pub const OP_REMOVE: &str = "remove";

/// Pending list operations for one option
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOps {
    pub value: Option<Vec<String>>,
    pub append: Option<Vec<String>>,
    pub prepend: Option<Vec<String>>,
    pub remove: Option<Vec<String>>,
}

impl ListOps {
    /// Interpret a verified node as list operations. A plain list is an
    /// assignment, unless the option merges by default, in which case it
    /// extends whatever it lands on.
    pub fn from_node(node: &ConfigNode, spec: &ListSpec) -> ListOps {
        match node {
            ConfigNode::List(_) => {
                let items = node.as_str_list().unwrap_or_default();
                if spec.merge_by_default {
                    ListOps {
                        append: Some(items),
                        ..ListOps::default()
                    }
                } else {
                    ListOps {
                        value: Some(items),
                        ..ListOps::default()
                    }
                }
            }
            ConfigNode::Mapping(_) => {
                let get = |key: &str| node.child(key).and_then(ConfigNode::as_str_list);
                ListOps {
                    value: get(OP_VALUE),
                    append: get(OP_APPEND),
                    prepend: get(OP_PREPEND),
                    remove: get(OP_REMOVE),
                }
            }
            // A bare string only reaches this point for str-to-singleton
            // options whose value came from a reference default.
            ConfigNode::Scalar(scalar) => ListOps {
                value: Some(vec![scalar.to_string()]),
                ..ListOps::default()
            },
        }
    }

    /// Serialize back into a tree node, keeping pending operations as a
    /// table so later merges can still see them.
    pub fn to_node(&self) -> ConfigNode {
        if let (Some(value), None, None, None) = (&self.value, &self.append, &self.prepend, &self.remove)
        {
            return ConfigNode::str_list(value.clone());
        }
        let mut mapping = ConfigNode::empty_mapping();
        for (key, items) in [
            (OP_VALUE, &self.value),
            (OP_APPEND, &self.append),
            (OP_PREPEND, &self.prepend),
            (OP_REMOVE, &self.remove),
        ] {
            if let Some(items) = items {
                mapping.set_child(key, ConfigNode::str_list(items.clone()));
            }
        }
        mapping
    }

    /// Merge `overlay` onto `self`. An explicit `value` replaces everything;
    /// otherwise removals filter first, prepends go in front, appends after.
    pub fn combine(&mut self, overlay: &ListOps) {
        if let Some(value) = &overlay.value {
            self.value = Some(value.clone());
            self.append = None;
            self.prepend = None;
            self.remove = None;
            return;
        }
        match &mut self.value {
            None => {
                if let Some(remove) = &overlay.remove {
                    self.remove = Some(remove.clone());
                    if let Some(prepend) = &mut self.prepend {
                        prepend.retain(|item| !remove.contains(item));
                    }
                    if let Some(append) = &mut self.append {
                        append.retain(|item| !remove.contains(item));
                    }
                }
                if let Some(prepend) = &overlay.prepend {
                    let mut combined = prepend.clone();
                    combined.extend(self.prepend.take().unwrap_or_default());
                    self.prepend = Some(combined);
                }
                if let Some(append) = &overlay.append {
                    self.append
                        .get_or_insert_with(Vec::new)
                        .extend(append.iter().cloned());
                }
            }
            Some(value) => {
                if let Some(remove) = &overlay.remove {
                    value.retain(|item| !remove.contains(item));
                    if let Some(prepend) = &mut self.prepend {
                        prepend.retain(|item| !remove.contains(item));
                    }
                    if let Some(append) = &mut self.append {
                        append.retain(|item| !remove.contains(item));
                    }
                }
                if let Some(append) = &overlay.append {
                    value.extend(append.iter().cloned());
                }
                if let Some(prepend) = &overlay.prepend {
                    let mut combined = prepend.clone();
                    combined.append(value);
                    *value = combined;
                }
            }
        }
    }

    /// Resolve all pending operations against an empty base list.
    pub fn collapse(&self) -> Vec<String> {
        let mut base = ListOps {
            value: Some(Vec::new()),
            ..ListOps::default()
        };
        base.combine(self);
        base.value.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(
        value: Option<&[&str]>,
        append: Option<&[&str]>,
        prepend: Option<&[&str]>,
        remove: Option<&[&str]>,
    ) -> ListOps {
        let conv = |items: Option<&[&str]>| {
            items.map(|items| items.iter().map(|s| s.to_string()).collect())
        };
        ListOps {
            value: conv(value),
            append: conv(append),
            prepend: conv(prepend),
            remove: conv(remove),
        }
    }

    #[test]
    fn test_assign_replaces_everything() {
        let mut a = ops(Some(&["abc", "def", "ghi"]), None, None, None);
        a.combine(&ops(Some(&["123"]), None, None, None));
        assert_eq!(a.collapse(), vec!["123"]);
    }

    #[test]
    fn test_append_extends_value() {
        let mut a = ops(Some(&["abc", "def", "ghi"]), None, None, None);
        a.combine(&ops(None, Some(&["123"]), None, None));
        assert_eq!(a.collapse(), vec!["abc", "def", "ghi", "123"]);
    }

    #[test]
    fn test_remove_prepend_append_on_value() {
        // value [abc def ghi], then -= [def xyz], += [jkl], prepend [000]
        let mut a = ops(Some(&["abc", "def", "ghi"]), None, None, None);
        a.combine(&ops(None, Some(&["jkl"]), Some(&["000"]), Some(&["def", "xyz"])));
        assert_eq!(a.collapse(), vec!["000", "abc", "ghi", "jkl"]);
    }

    #[test]
    fn test_pending_ops_chain_without_value() {
        // No base value yet: ops accumulate and filter each other
        let mut a = ops(None, Some(&["arg1", "arg2"]), None, None);
        a.combine(&ops(None, Some(&["arg1"]), Some(&["win"]), Some(&["arg1"])));
        assert_eq!(a.collapse(), vec!["win", "arg2", "arg1"]);
    }

    #[test]
    fn test_remove_from_empty_value() {
        let mut a = ops(Some(&[]), None, None, None);
        a.combine(&ops(None, None, None, Some(&["foo"])));
        assert_eq!(a.collapse(), Vec::<String>::new());
    }

    #[test]
    fn test_collapse_round_trip_node() {
        let ops = ops(None, Some(&["a"]), Some(&["z"]), None);
        let node = ops.to_node();
        let spec = ListSpec::default();
        assert_eq!(ListOps::from_node(&node, &spec), ops);

        let plain = ListOps {
            value: Some(vec!["x".to_string()]),
            ..ListOps::default()
        };
        assert_eq!(plain.to_node(), ConfigNode::str_list(["x"]));
    }

    #[test]
    fn test_merge_by_default_plain_list_appends() {
        let spec = ListSpec {
            merge_by_default: true,
            ..ListSpec::default()
        };
        let node = ConfigNode::str_list(["a", "b"]);
        let ops = ListOps::from_node(&node, &spec);
        assert_eq!(ops.append, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(ops.value, None);
    }
}
