//! Generic configuration value trees
//!
//! `ConfigNode` is the universal in-memory representation of every loaded
//! source file and of the merged result. A node is a leaf (scalar or list)
//! or a mapping of named children, never both. Mapping children preserve
//! insertion order, which fixes the traversal order of every phase.

use std::fmt;

use super::error::ConfigError;
use super::path::{ConfPath, Step};

/// A leaf value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Str(_) => "string",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => write!(f, "{}", s),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// One point in a loaded-or-merged value tree
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Scalar(Scalar),
    List(Vec<ConfigNode>),
    Mapping(Vec<(String, ConfigNode)>),
}

impl ConfigNode {
    pub fn str(value: impl Into<String>) -> Self {
        ConfigNode::Scalar(Scalar::Str(value.into()))
    }

    pub fn int(value: i64) -> Self {
        ConfigNode::Scalar(Scalar::Int(value))
    }

    pub fn bool(value: bool) -> Self {
        ConfigNode::Scalar(Scalar::Bool(value))
    }

    pub fn empty_mapping() -> Self {
        ConfigNode::Mapping(Vec::new())
    }

    pub fn str_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ConfigNode::List(values.into_iter().map(ConfigNode::str).collect())
    }

    /// Human-readable type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigNode::Scalar(s) => s.type_name(),
            ConfigNode::List(_) => "list",
            ConfigNode::Mapping(_) => "dict",
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, ConfigNode::Mapping(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigNode::Scalar(Scalar::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigNode::Scalar(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigNode::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// The elements of a list node when every element is a string.
    pub fn as_str_list(&self) -> Option<Vec<String>> {
        match self {
            ConfigNode::List(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    }

    // -- mapping access -----------------------------------------------------

    /// Iterate over mapping children in insertion order (empty for leaves).
    pub fn children(&self) -> impl Iterator<Item = (&str, &ConfigNode)> {
        let slice: &[(String, ConfigNode)] = match self {
            ConfigNode::Mapping(children) => children,
            _ => &[],
        };
        slice.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn child(&self, name: &str) -> Option<&ConfigNode> {
        match self {
            ConfigNode::Mapping(children) => children
                .iter()
                .find(|(child, _)| child == name)
                .map(|(_, node)| node),
            _ => None,
        }
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut ConfigNode> {
        match self {
            ConfigNode::Mapping(children) => children
                .iter_mut()
                .find(|(child, _)| child == name)
                .map(|(_, node)| node),
            _ => None,
        }
    }

    /// Insert or replace a child, preserving the position of replaced keys.
    /// Returns false when this node is a leaf.
    pub fn set_child(&mut self, name: &str, node: ConfigNode) -> bool {
        match self {
            ConfigNode::Mapping(children) => {
                if let Some(entry) = children.iter_mut().find(|(child, _)| child == name) {
                    entry.1 = node;
                } else {
                    children.push((name.to_string(), node));
                }
                true
            }
            _ => false,
        }
    }

    /// Remove and return a child by name.
    pub fn remove_child(&mut self, name: &str) -> Option<ConfigNode> {
        match self {
            ConfigNode::Mapping(children) => {
                let idx = children.iter().position(|(child, _)| child == name)?;
                Some(children.remove(idx).1)
            }
            _ => None,
        }
    }

    // -- path access --------------------------------------------------------

    pub fn get(&self, path: &ConfPath) -> Option<&ConfigNode> {
        let mut node = self;
        for step in path.steps() {
            match step {
                Step::Name(name) => node = node.child(name)?,
                Step::Up => return None,
            }
        }
        Some(node)
    }

    pub fn get_mut(&mut self, path: &ConfPath) -> Option<&mut ConfigNode> {
        let mut node = self;
        for step in path.steps() {
            match step {
                Step::Name(name) => node = node.child_mut(name)?,
                Step::Up => return None,
            }
        }
        Some(node)
    }

    /// Lookup that reports the full path on failure.
    pub fn try_get(&self, path: &ConfPath) -> Result<&ConfigNode, ConfigError> {
        self.get(path).ok_or_else(|| ConfigError::NoSuchPath {
            path: path.to_string(),
        })
    }

    pub fn is_set(&self, path: &ConfPath) -> bool {
        self.get(path).is_some()
    }

    /// Set the node at `path`, replacing any existing value. All intermediate
    /// steps must already exist as mappings; returns false otherwise.
    pub fn set(&mut self, path: &ConfPath, node: ConfigNode) -> bool {
        let Some((parent, last)) = path.split_last() else {
            *self = node;
            return true;
        };
        let Step::Name(name) = last else {
            return false;
        };
        match self.get_mut(&parent) {
            Some(target) => target.set_child(name, node),
            None => false,
        }
    }

    /// Set the node at `path` only when nothing is there yet.
    pub fn set_default(&mut self, path: &ConfPath, node: ConfigNode) -> bool {
        if self.is_set(path) {
            return true;
        }
        self.set(path, node)
    }

    pub fn remove(&mut self, path: &ConfPath) -> Option<ConfigNode> {
        let (parent, last) = path.split_last()?;
        let Step::Name(name) = last else {
            return None;
        };
        self.get_mut(&parent)?.remove_child(name)
    }

    /// Depth-first pre-order iteration: every node with its absolute path,
    /// parents before children, siblings in insertion order.
    pub fn iter_dfs(&self) -> Dfs<'_> {
        Dfs {
            stack: vec![(ConfPath::root(), self)],
        }
    }

    // -- conversions --------------------------------------------------------

    pub fn from_toml(value: toml::Value) -> ConfigNode {
        match value {
            toml::Value::String(s) => ConfigNode::Scalar(Scalar::Str(s)),
            toml::Value::Integer(i) => ConfigNode::Scalar(Scalar::Int(i)),
            toml::Value::Float(x) => ConfigNode::Scalar(Scalar::Float(x)),
            toml::Value::Boolean(b) => ConfigNode::Scalar(Scalar::Bool(b)),
            toml::Value::Datetime(dt) => ConfigNode::Scalar(Scalar::Str(dt.to_string())),
            toml::Value::Array(items) => {
                ConfigNode::List(items.into_iter().map(ConfigNode::from_toml).collect())
            }
            toml::Value::Table(table) => ConfigNode::Mapping(
                table
                    .into_iter()
                    .map(|(key, val)| (key, ConfigNode::from_toml(val)))
                    .collect(),
            ),
        }
    }

    pub fn from_toml_table(table: toml::Table) -> ConfigNode {
        ConfigNode::from_toml(toml::Value::Table(table))
    }

    /// Build a tree from a JSON value. JSON null becomes an empty mapping.
    pub fn from_json(value: serde_json::Value) -> ConfigNode {
        match value {
            serde_json::Value::String(s) => ConfigNode::Scalar(Scalar::Str(s)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ConfigNode::Scalar(Scalar::Int(i))
                } else {
                    ConfigNode::Scalar(Scalar::Float(n.as_f64().unwrap_or(0.0)))
                }
            }
            serde_json::Value::Bool(b) => ConfigNode::Scalar(Scalar::Bool(b)),
            serde_json::Value::Array(items) => {
                ConfigNode::List(items.into_iter().map(ConfigNode::from_json).collect())
            }
            serde_json::Value::Object(map) => ConfigNode::Mapping(
                map.into_iter()
                    .map(|(key, val)| (key, ConfigNode::from_json(val)))
                    .collect(),
            ),
            serde_json::Value::Null => ConfigNode::empty_mapping(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigNode::Scalar(Scalar::Str(s)) => serde_json::Value::String(s.clone()),
            ConfigNode::Scalar(Scalar::Int(i)) => serde_json::Value::Number((*i).into()),
            ConfigNode::Scalar(Scalar::Float(x)) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ConfigNode::Scalar(Scalar::Bool(b)) => serde_json::Value::Bool(*b),
            ConfigNode::List(items) => {
                serde_json::Value::Array(items.iter().map(ConfigNode::to_json).collect())
            }
            ConfigNode::Mapping(children) => serde_json::Value::Object(
                children
                    .iter()
                    .map(|(name, node)| (name.clone(), node.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Pre-order traversal over a value tree
pub struct Dfs<'a> {
    stack: Vec<(ConfPath, &'a ConfigNode)>,
}

impl<'a> Iterator for Dfs<'a> {
    type Item = (ConfPath, &'a ConfigNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, node) = self.stack.pop()?;
        if let ConfigNode::Mapping(children) = node {
            for (name, child) in children.iter().rev() {
                self.stack.push((path.join_name(name), child));
            }
        }
        Some((path, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "trunk": {
                "mid1": { "leaf11": "11", "leaf12": "12" },
                "mid2": { "leaf21": "21", "leaf22": "22" },
            },
        })
    }

    #[test]
    fn test_json_round_trip() {
        let d = sample();
        let tree = ConfigNode::from_json(d.clone());
        assert_eq!(tree.to_json(), d);
    }

    #[test]
    fn test_path_lookup() {
        let tree = ConfigNode::from_json(sample());
        assert!(tree.get(&ConfPath::root()).is_some());
        assert!(tree.get(&ConfPath::parse("trunk")).unwrap().is_mapping());
        assert_eq!(
            tree.get(&ConfPath::parse("trunk/mid1/leaf11"))
                .and_then(ConfigNode::as_str),
            Some("11")
        );
        assert!(tree.get(&ConfPath::parse("trunk/mid3")).is_none());
        // Descending through a leaf fails
        assert!(tree.get(&ConfPath::parse("trunk/mid1/leaf11/x")).is_none());
    }

    #[test]
    fn test_try_get_names_path() {
        let tree = ConfigNode::from_json(sample());
        let err = tree.try_get(&ConfPath::parse("trunk/mid3/leaf")).unwrap_err();
        assert_eq!(err.to_string(), "No value at trunk/mid3/leaf");
    }

    #[test]
    fn test_dfs_parents_before_children() {
        let tree = ConfigNode::from_json(sample());
        let paths: Vec<String> = tree
            .iter_dfs()
            .map(|(path, _)| path.to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                "",
                "trunk",
                "trunk/mid1",
                "trunk/mid1/leaf11",
                "trunk/mid1/leaf12",
                "trunk/mid2",
                "trunk/mid2/leaf21",
                "trunk/mid2/leaf22",
            ]
        );
    }

    #[test]
    fn test_set_and_set_default() {
        let mut tree = ConfigNode::from_json(sample());
        assert!(tree.set(&ConfPath::parse("trunk/mid1/leaf11"), ConfigNode::str("x")));
        assert_eq!(
            tree.get(&ConfPath::parse("trunk/mid1/leaf11"))
                .and_then(ConfigNode::as_str),
            Some("x")
        );

        // set_default does not clobber
        assert!(tree.set_default(&ConfPath::parse("trunk/mid1/leaf12"), ConfigNode::str("y")));
        assert_eq!(
            tree.get(&ConfPath::parse("trunk/mid1/leaf12"))
                .and_then(ConfigNode::as_str),
            Some("12")
        );

        // new key appends after existing siblings
        assert!(tree.set_default(&ConfPath::parse("trunk/mid1/leaf13"), ConfigNode::str("z")));
        let keys: Vec<&str> = tree
            .get(&ConfPath::parse("trunk/mid1"))
            .unwrap()
            .children()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(keys, vec!["leaf11", "leaf12", "leaf13"]);

        // intermediate steps must exist
        assert!(!tree.set(&ConfPath::parse("trunk/mid3/leaf"), ConfigNode::str("q")));
    }

    #[test]
    fn test_remove() {
        let mut tree = ConfigNode::from_json(sample());
        let removed = tree.remove(&ConfPath::parse("trunk/mid2/leaf21"));
        assert_eq!(removed, Some(ConfigNode::str("21")));
        assert!(!tree.is_set(&ConfPath::parse("trunk/mid2/leaf21")));
    }

    #[test]
    fn test_from_toml() {
        let table: toml::Table = toml::from_str(
            r#"
            [cmake]
            build_type = "Release"
            args = ["a", "b"]
            parallel = 4
            verbose = true
            "#,
        )
        .unwrap();
        let tree = ConfigNode::from_toml_table(table);
        assert_eq!(
            tree.get(&ConfPath::parse("cmake/build_type"))
                .and_then(ConfigNode::as_str),
            Some("Release")
        );
        assert_eq!(
            tree.get(&ConfPath::parse("cmake/args"))
                .and_then(ConfigNode::as_str_list),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(
            tree.get(&ConfPath::parse("cmake/parallel"))
                .and_then(ConfigNode::as_int),
            Some(4)
        );
        assert_eq!(
            tree.get(&ConfPath::parse("cmake/verbose"))
                .and_then(ConfigNode::as_bool),
            Some(true)
        );
    }
}
