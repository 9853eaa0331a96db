//! Option tree paths
//!
//! `ConfPath` addresses nodes in both the option schema and the value trees.
//! Paths are immutable step sequences; a step is either a name or an ascent
//! (`^` in the textual form), so schema nodes can point at siblings and
//! ancestors (inherit sources, reference defaults, override targets).

use std::fmt;

use super::error::ConfigError;

/// One step of a configuration path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// Descend into the named child
    Name(String),
    /// Ascend one level ("^" in the textual form)
    Up,
}

/// An ordered, immutable sequence of path steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConfPath {
    steps: Vec<Step>,
}

impl ConfPath {
    /// The empty (root) path.
    pub fn root() -> Self {
        ConfPath { steps: Vec::new() }
    }

    /// Parse a `/`-separated path. Empty segments are dropped, `^` ascends.
    pub fn parse(text: &str) -> Self {
        let steps = text
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "^" {
                    Step::Up
                } else {
                    Step::Name(s.to_string())
                }
            })
            .collect();
        ConfPath { steps }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ConfPath {
            steps: names.into_iter().map(|n| Step::Name(n.into())).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }

    /// Append a single name step. Never fails.
    pub fn join_name(&self, name: &str) -> ConfPath {
        let mut steps = self.steps.clone();
        steps.push(Step::Name(name.to_string()));
        ConfPath { steps }
    }

    /// Join `suffix` onto this path, resolving ascent steps against the base.
    ///
    /// Ascending above the root is an error: a schema pointer that escapes
    /// the tree is always a bug in the option definitions, and silently
    /// clamping it would send lookups to the wrong node.
    pub fn join(&self, suffix: &ConfPath) -> Result<ConfPath, ConfigError> {
        let mut steps = self.steps.clone();
        for step in &suffix.steps {
            match step {
                Step::Name(name) => steps.push(Step::Name(name.clone())),
                Step::Up => {
                    if steps.pop().is_none() {
                        return Err(ConfigError::AboveRoot {
                            base: self.to_string(),
                            suffix: suffix.to_string(),
                        });
                    }
                }
            }
        }
        Ok(ConfPath { steps })
    }

    /// Split off the first step, if any. Ascent steps yield `None` for the
    /// name, which lookup code treats as an invalid path.
    pub fn split_first(&self) -> Option<(&Step, ConfPath)> {
        let (first, rest) = self.steps.split_first()?;
        Some((
            first,
            ConfPath {
                steps: rest.to_vec(),
            },
        ))
    }

    /// Split off the last step, if any.
    pub fn split_last(&self) -> Option<(ConfPath, &Step)> {
        let (last, init) = self.steps.split_last()?;
        Some((
            ConfPath {
                steps: init.to_vec(),
            },
            last,
        ))
    }

    /// The path without its last step.
    pub fn parent(&self) -> Option<ConfPath> {
        self.split_last().map(|(parent, _)| parent)
    }

    /// The name of the last step, when it is a name.
    pub fn last_name(&self) -> Option<&str> {
        match self.steps.last()? {
            Step::Name(name) => Some(name),
            Step::Up => None,
        }
    }
}

impl fmt::Display for ConfPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for step in &self.steps {
            if !first {
                write!(f, "/")?;
            }
            first = false;
            match step {
                Step::Name(name) => write!(f, "{}", name)?,
                Step::Up => write!(f, "..")?,
            }
        }
        Ok(())
    }
}
