//! Declarative option schema
//!
//! The schema is a tree of typed option definitions mirroring the shape the
//! value trees are expected to take. It is built once per invocation and
//! never mutated by value processing; command-line override files and
//! cross-compilation inheritance wiring produce an augmented copy through
//! explicit builder steps.

use super::node::ConfigNode;
use super::path::{ConfPath, Step};

/// What a relative path option resolves against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathBase {
    /// The project directory (where pyproject.toml lives)
    Project,
    /// The directory of the config file the value came from
    ConfigFile,
}

/// Constraints on a path-typed option
#[derive(Debug, Clone)]
pub struct PathSpec {
    pub base: PathBase,
    pub allow_absolute: bool,
    pub must_exist: bool,
    pub is_folder: bool,
    pub expected_contents: Vec<String>,
}

impl Default for PathSpec {
    fn default() -> Self {
        PathSpec {
            base: PathBase::Project,
            allow_absolute: false,
            must_exist: true,
            is_folder: true,
            expected_contents: Vec::new(),
        }
    }
}

/// Behavior of a list-of-strings option
#[derive(Debug, Clone, Copy, Default)]
pub struct ListSpec {
    /// Accept a bare string as a one-element list
    pub convert_str_to_singleton: bool,
    /// A plain list value extends the base instead of replacing it, so
    /// derived profiles append to inherited tool argument lists
    pub merge_by_default: bool,
}

/// The typed behavior of an option
#[derive(Debug, Clone)]
pub enum OptionKind {
    /// Interior node holding sub-options. Strict sections reject unknown
    /// keys; non-strict sections skip unrecognized children unverified.
    Section { strict: bool },
    /// Opaque subtree accepted without inspection
    Unchecked,
    Str,
    Int,
    Bool,
    List(ListSpec),
    /// String-to-string mapping, merged key-by-key
    Dict,
    Path(PathSpec),
    /// A value that, when present, is merged onto `target`
    Override { target: ConfPath },
}

impl OptionKind {
    pub fn section() -> Self {
        OptionKind::Section { strict: true }
    }

    /// Type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            OptionKind::Section { .. } | OptionKind::Dict => "dict",
            OptionKind::Unchecked => "any",
            OptionKind::Str => "string",
            OptionKind::Int => "int",
            OptionKind::Bool => "bool",
            OptionKind::List(_) => "list",
            OptionKind::Path(_) => "path",
            OptionKind::Override { .. } => "dict",
        }
    }
}

/// How an unset option obtains its value
#[derive(Debug, Clone)]
pub enum DefaultPolicy {
    /// Leave unset; downstream code tolerates absence
    NoDefault,
    /// Absolute constant default
    Value(ConfigNode),
    /// Same value as another option, resolved after that option
    Ref { path: ConfPath, relative: bool },
    /// Resolution fails when the user supplies no value
    Required,
}

impl DefaultPolicy {
    pub fn relative_ref(path: &str) -> Self {
        DefaultPolicy::Ref {
            path: ConfPath::parse(path),
            relative: true,
        }
    }

    pub fn absolute_ref(path: &str) -> Self {
        DefaultPolicy::Ref {
            path: ConfPath::parse(path),
            relative: false,
        }
    }
}

/// One typed option definition
#[derive(Debug, Clone)]
pub struct ConfigOption {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    pub default: DefaultPolicy,
    pub inherits: Option<ConfPath>,
    /// Create the destination when unset but the inherit source exists
    pub create_if_inherit_target_exists: bool,
    pub sub_options: Vec<ConfigOption>,
}

impl ConfigOption {
    pub fn new(name: &str, kind: OptionKind) -> Self {
        ConfigOption {
            name: name.to_string(),
            description: String::new(),
            kind,
            default: DefaultPolicy::NoDefault,
            inherits: None,
            create_if_inherit_target_exists: false,
            sub_options: Vec::new(),
        }
    }

    pub fn section(name: &str) -> Self {
        ConfigOption::new(name, OptionKind::section())
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_default(mut self, default: DefaultPolicy) -> Self {
        self.default = default;
        self
    }

    pub fn with_inherits(mut self, source: &str, create_if_target_exists: bool) -> Self {
        self.inherits = Some(ConfPath::parse(source));
        self.create_if_inherit_target_exists = create_if_target_exists;
        self
    }

    pub fn with_sub(mut self, option: ConfigOption) -> Self {
        self.sub_options.push(option);
        self
    }

    pub fn with_subs(mut self, options: impl IntoIterator<Item = ConfigOption>) -> Self {
        self.sub_options.extend(options);
        self
    }

    pub fn sub(&self, name: &str) -> Option<&ConfigOption> {
        self.sub_options.iter().find(|opt| opt.name == name)
    }

    pub fn sub_mut(&mut self, name: &str) -> Option<&mut ConfigOption> {
        self.sub_options.iter_mut().find(|opt| opt.name == name)
    }

    /// Descend through sub-options along `path`.
    pub fn find(&self, path: &ConfPath) -> Option<&ConfigOption> {
        let mut option = self;
        for step in path.steps() {
            match step {
                Step::Name(name) => option = option.sub(name)?,
                Step::Up => return None,
            }
        }
        Some(option)
    }

    fn find_mut(&mut self, path: &ConfPath) -> Option<&mut ConfigOption> {
        let mut option = self;
        for step in path.steps() {
            match step {
                Step::Name(name) => option = option.sub_mut(name)?,
                Step::Up => return None,
            }
        }
        Some(option)
    }
}

/// An immutable option schema rooted at the set of recognized sources
#[derive(Debug, Clone)]
pub struct Schema {
    root: ConfigOption,
}

impl Schema {
    pub fn new(root: ConfigOption) -> Self {
        Schema { root }
    }

    pub fn root(&self) -> &ConfigOption {
        &self.root
    }

    pub fn find(&self, path: &ConfPath) -> Option<&ConfigOption> {
        self.root.find(path)
    }

    /// Register a command-line override file: a new root-level option named
    /// after the source, merged onto `target` during the override phase.
    /// Returns a new schema; the base schema is never mutated.
    pub fn with_override_file(mut self, source_id: &str, target: ConfPath) -> Self {
        self.root.sub_options.push(
            ConfigOption::new(source_id, OptionKind::Override { target })
                .describe("Command line override file"),
        );
        self
    }

    /// Redirect the inherit source of the option at `path`. Used to wire the
    /// cross-compilation blocks to the OS profile selected at invocation
    /// time. Returns a new schema; missing paths are ignored so wiring is
    /// safe to apply before the cross section is known to exist.
    pub fn with_inherit_redirect(mut self, path: &ConfPath, source: ConfPath) -> Self {
        if let Some(option) = self.root.find_mut(path) {
            option.inherits = Some(source);
        }
        self
    }

    /// Depth-first pre-order iteration over `(absolute path, option)` pairs,
    /// excluding the root, siblings in declaration order.
    pub fn iter(&self) -> SchemaDfs<'_> {
        let mut stack = Vec::new();
        for option in self.root.sub_options.iter().rev() {
            stack.push((ConfPath::from_names([option.name.clone()]), option));
        }
        SchemaDfs { stack }
    }
}

/// Pre-order traversal over the option schema
pub struct SchemaDfs<'a> {
    stack: Vec<(ConfPath, &'a ConfigOption)>,
}

impl<'a> Iterator for SchemaDfs<'a> {
    type Item = (ConfPath, &'a ConfigOption);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, option) = self.stack.pop()?;
        for sub in option.sub_options.iter().rev() {
            self.stack.push((path.join_name(&sub.name), sub));
        }
        Some((path, option))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_schema() -> Schema {
        let mid1 = ConfigOption::section("mid1")
            .with_sub(ConfigOption::new("leaf11", OptionKind::Str))
            .with_sub(ConfigOption::new("leaf12", OptionKind::Str));
        let mid2 = ConfigOption::section("mid2")
            .with_sub(ConfigOption::new("leaf21", OptionKind::Str))
            .with_sub(ConfigOption::new("leaf22", OptionKind::Str));
        let trunk = ConfigOption::section("trunk").with_sub(mid1).with_sub(mid2);
        Schema::new(ConfigOption::section("").with_sub(trunk))
    }

    #[test]
    fn test_find() {
        let schema = test_schema();
        assert_eq!(schema.find(&ConfPath::parse("trunk")).unwrap().name, "trunk");
        assert_eq!(
            schema.find(&ConfPath::parse("trunk/mid1/leaf12")).unwrap().name,
            "leaf12"
        );
        assert!(schema.find(&ConfPath::parse("trunk/mid3")).is_none());
    }

    #[test]
    fn test_iter_declaration_order() {
        let schema = test_schema();
        let paths: Vec<String> = schema.iter().map(|(path, _)| path.to_string()).collect();
        assert_eq!(
            paths,
            vec![
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
    fn test_with_override_file_leaves_base_intact() {
        let base = test_schema();
        let augmented = base
            .clone()
            .with_override_file("extra.toml", ConfPath::parse("trunk/mid2"));
        assert!(base.find(&ConfPath::parse("extra.toml")).is_none());
        let added = augmented.find(&ConfPath::parse("extra.toml")).unwrap();
        assert!(matches!(
            &added.kind,
            OptionKind::Override { target } if *target == ConfPath::parse("trunk/mid2")
        ));
    }

    #[test]
    fn test_with_inherit_redirect() {
        let schema = test_schema().with_inherit_redirect(
            &ConfPath::parse("trunk/mid2"),
            ConfPath::parse("trunk/mid1"),
        );
        assert_eq!(
            schema.find(&ConfPath::parse("trunk/mid2")).unwrap().inherits,
            Some(ConfPath::parse("trunk/mid1"))
        );
    }
}
