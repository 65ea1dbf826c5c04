//! Result tree produced by a collection pass.
//!
//! One [`ResultNode`] is created per matched program/command level, mutated
//! only while that level consumes tokens, then frozen once control returns
//! to the parent level. The tree serializes to stable JSON: maps are
//! ordered, empty maps are kept (so the shape mirrors the declared grammar),
//! and the `command`/`rest` slots are omitted when absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Value collected for a kwarg or positional arg.
///
/// Non-multi fields hold a single scalar; fields declared multiple
/// accumulate every occurrence in encounter order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectedValue {
    /// Scalar value from a non-multi field.
    Single(String),
    /// Accumulated values from a multi field, in encounter order.
    Multiple(Vec<String>),
}

impl CollectedValue {
    /// The scalar value, if this is a non-multi field.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            CollectedValue::Single(value) => Some(value),
            CollectedValue::Multiple(_) => None,
        }
    }

    /// All collected values, in encounter order.
    pub fn values(&self) -> &[String] {
        match self {
            CollectedValue::Single(value) => std::slice::from_ref(value),
            CollectedValue::Multiple(values) => values,
        }
    }

    /// Appends to an accumulating sequence. Only multi fields hold
    /// `Multiple` values, and only multi fields are ever pushed onto.
    pub(crate) fn push(&mut self, value: String) {
        if let CollectedValue::Multiple(values) = self {
            values.push(value);
        }
    }
}

/// One level of the parsed output tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultNode {
    /// Name of the matched program or command.
    pub name: String,
    /// Collected keyword arguments.
    pub kwargs: BTreeMap<String, CollectedValue>,
    /// Collected flags; presence implies `true`.
    pub flags: BTreeMap<String, bool>,
    /// Collected positional arguments.
    pub args: BTreeMap<String, CollectedValue>,
    /// Nested result for the matched sub-command, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Box<ResultNode>>,
    /// Verbatim tail captured after a bare `--` token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest: Option<Vec<String>>,
}

impl ResultNode {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kwargs: BTreeMap::new(),
            flags: BTreeMap::new(),
            args: BTreeMap::new(),
            command: None,
            rest: None,
        }
    }

    /// Whether the given flag was supplied.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    /// The collected value for the given kwarg, if supplied.
    pub fn kwarg(&self, name: &str) -> Option<&CollectedValue> {
        self.kwargs.get(name)
    }

    /// The collected value for the given positional arg, if supplied.
    pub fn arg(&self, name: &str) -> Option<&CollectedValue> {
        self.args.get(name)
    }

    /// The nested result for the matched sub-command, if any.
    pub fn command(&self) -> Option<&ResultNode> {
        self.command.as_deref()
    }
}

/// Outcome of a successful collection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected {
    /// The parse succeeded; callbacks have already run.
    Tree(ResultNode),
    /// A registered help trigger matched; bare help text for the level that
    /// matched it, with no error line. Callbacks do not run.
    Help(String),
}

impl Collected {
    /// The result tree, if the pass produced one.
    pub fn tree(self) -> Option<ResultNode> {
        match self {
            Collected::Tree(tree) => Some(tree),
            Collected::Help(_) => None,
        }
    }
}
