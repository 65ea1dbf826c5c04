//! Grammar declaration nodes and builders.
//!
//! A command grammar is declared as a tree of nodes: a [`Program`] at the
//! root, with [`Command`], [`Flag`], [`KwArg`], and [`Arg`] children, plus
//! the requirement wrappers [`Required`], [`RequireAll`], and [`RequireAny`].
//! Declaration is free-form; [`Program::build`] validates the tree and
//! produces an immutable [`Grammar`](crate::Grammar) that can be reused
//! across any number of [`collect`](crate::Grammar::collect) calls.
//!
//! # Examples
//!
//! ```
//! use argtree_core::*;
//!
//! let grammar = Program::new("pkg")
//!     .description("package fetcher")
//!     .child(
//!         Command::new("install")
//!             .alias('i')
//!             .child(Arg::new("lib"))
//!             .child(Flag::new("save").alias('S')),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert!(grammar.root().find_command("install").is_some());
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::grammar::Grammar;
use crate::tree::ResultNode;
use crate::validate::{self, SchemaError};

/// Display hint for the value a [`KwArg`] or [`Arg`] accepts.
///
/// Hints are presentational only: they appear in rendered help text as a
/// bracketed annotation (e.g., `[file]`) and are never enforced while
/// collecting arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ValueType {
    /// Boolean value.
    Bool,
    /// String value (the default).
    #[default]
    String,
    /// Numeric value.
    Number,
    /// File path.
    File,
    /// Directory path.
    Directory,
    /// URL.
    Url,
}

impl ValueType {
    /// Lowercase label used for help-text annotations.
    pub fn label(self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::File => "file",
            ValueType::Directory => "directory",
            ValueType::Url => "url",
        }
    }
}

/// Signature for program/command callbacks.
///
/// A callback receives the result node for its own level, the parent level's
/// result node (`None` at the root), and the value returned by the nearest
/// ancestor callback that ran before it.
pub type CallbackFn =
    dyn Fn(&ResultNode, Option<&ResultNode>, Option<Value>) -> Option<Value> + Send + Sync;

/// Shared handle to a level callback.
///
/// Callbacks are queued during traversal and only run after the entire
/// argument vector has been consumed and validated, so a grammar violation
/// deep in the tree never triggers partial side effects in an ancestor.
#[derive(Clone)]
pub struct Callback(pub(crate) Arc<CallbackFn>);

impl Callback {
    /// Wraps a closure as a callback handle.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&ResultNode, Option<&ResultNode>, Option<Value>) -> Option<Value>
            + Send
            + Sync
            + 'static,
    {
        Callback(Arc::new(callback))
    }

    pub(crate) fn invoke(
        &self,
        tree: &ResultNode,
        parent: Option<&ResultNode>,
        carried: Option<Value>,
    ) -> Option<Value> {
        (self.0)(tree, parent, carried)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// Child node of a [`Program`] or [`Command`].
///
/// The requirement wrappers exist only while the grammar is being declared;
/// [`Program::build`] unwraps them into the owning level's flattened child
/// list and requirement bookkeeping, and the traversal engine never sees
/// them.
#[derive(Debug, Clone)]
pub enum Node {
    /// Nested sub-command.
    Command(Command),
    /// Boolean flag.
    Flag(Flag),
    /// Keyword argument carrying a value.
    KwArg(KwArg),
    /// Positional argument.
    Arg(Arg),
    /// One node that must be present.
    Required(Required),
    /// A set of nodes that must all be present.
    RequireAll(RequireAll),
    /// A set of nodes of which at least one must be present.
    RequireAny(RequireAny),
}

/// Root of a declared grammar.
///
/// Use the builder methods to attach metadata and children, then call
/// [`build`](Program::build) to validate the declaration and obtain a
/// [`Grammar`](crate::Grammar).
#[derive(Debug, Clone)]
pub struct Program {
    /// Program name shown in help output.
    pub name: String,
    /// Short description.
    pub description: Option<String>,
    /// Usage line (e.g., `pkg <command> [options]`).
    pub usage: Option<String>,
    /// Example invocations.
    pub examples: Vec<String>,
    pub(crate) callback: Option<Callback>,
    pub(crate) children: Vec<Node>,
    pub(crate) help: Option<Help>,
}

impl Program {
    /// Creates a program with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            usage: None,
            examples: Vec::new(),
            callback: None,
            children: Vec::new(),
            help: None,
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the usage line.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    /// Appends an example invocation.
    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// Sets the callback invoked after a successful collection pass.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ResultNode, Option<&ResultNode>, Option<Value>) -> Option<Value>
            + Send
            + Sync
            + 'static,
    {
        self.callback = Some(Callback::new(callback));
        self
    }

    /// Appends a child node.
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    /// Registers a program-wide help trigger.
    ///
    /// The registered name and alias are recognized at every nesting depth
    /// unless shadowed by a locally declared flag or kwarg with the same
    /// name or alias.
    pub fn with_help(mut self, help: Help) -> Self {
        self.help = Some(help);
        self
    }

    /// Validates the declaration and compiles it into a reusable grammar.
    ///
    /// Fails on invalid names or aliases, duplicate sibling names or aliases
    /// within a category, malformed requirement groups, or more than one
    /// required command at a level.
    ///
    /// # Examples
    ///
    /// ```
    /// use argtree_core::*;
    ///
    /// let grammar = Program::new("pkg")
    ///     .child(Flag::new("verbose").alias('v'))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(grammar.root().name, "pkg");
    ///
    /// // Two flags sharing a name is a declaration error.
    /// let err = Program::new("pkg")
    ///     .child(Flag::new("verbose"))
    ///     .child(Flag::new("verbose"))
    ///     .build();
    /// assert!(matches!(err, Err(SchemaError::DuplicateName(_))));
    /// ```
    pub fn build(self) -> Result<Grammar, SchemaError> {
        validate::compile_program(self)
    }
}

/// A named sub-command owning its own flags, kwargs, args, and commands.
#[derive(Debug, Clone)]
pub struct Command {
    /// Command name matched against positional tokens.
    pub name: String,
    /// Single-character alias, also matched positionally.
    pub alias: Option<char>,
    /// Short description.
    pub description: Option<String>,
    /// Usage line.
    pub usage: Option<String>,
    /// Example invocations.
    pub examples: Vec<String>,
    pub(crate) callback: Option<Callback>,
    pub(crate) children: Vec<Node>,
}

impl Command {
    /// Creates a command with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            description: None,
            usage: None,
            examples: Vec::new(),
            callback: None,
            children: Vec::new(),
        }
    }

    /// Sets the single-character alias.
    pub fn alias(mut self, alias: char) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the usage line.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    /// Appends an example invocation.
    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    /// Sets the callback invoked after a successful collection pass.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ResultNode, Option<&ResultNode>, Option<Value>) -> Option<Value>
            + Send
            + Sync
            + 'static,
    {
        self.callback = Some(Callback::new(callback));
        self
    }

    /// Appends a child node.
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }
}

/// A boolean flag (`--save`, `-S`). Presence sets the flag to `true`.
#[derive(Debug, Clone)]
pub struct Flag {
    /// Long name matched after `--`.
    pub name: String,
    /// Single-character alias matched after `-`.
    pub alias: Option<char>,
    /// Short description.
    pub description: Option<String>,
}

impl Flag {
    /// Creates a flag with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            description: None,
        }
    }

    /// Sets the single-character alias.
    pub fn alias(mut self, alias: char) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A keyword argument carrying a value (`--outfile path`, `--outfile=path`,
/// `-o path`, or `-opath`).
#[derive(Debug, Clone)]
pub struct KwArg {
    /// Long name matched after `--`.
    pub name: String,
    /// Single-character alias matched after `-`.
    pub alias: Option<char>,
    /// Short description.
    pub description: Option<String>,
    /// Display hint for the accepted value.
    pub value_type: Option<ValueType>,
    /// Whether repeated occurrences accumulate into a sequence.
    pub multiple: bool,
}

impl KwArg {
    /// Creates a kwarg with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            description: None,
            value_type: None,
            multiple: false,
        }
    }

    /// Sets the single-character alias.
    pub fn alias(mut self, alias: char) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the display hint for the accepted value.
    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// Marks as allowing multiple occurrences.
    pub fn allow_multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

/// A positional argument, filled by the first unconsumed positional token
/// that does not name a sibling command.
#[derive(Debug, Clone)]
pub struct Arg {
    /// Argument name, shown as `<name>` in help output.
    pub name: String,
    /// Short description.
    pub description: Option<String>,
    /// Display hint for the accepted value.
    pub value_type: Option<ValueType>,
    /// Whether repeated values accumulate into a sequence.
    pub multiple: bool,
}

impl Arg {
    /// Creates a positional argument with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            value_type: None,
            multiple: false,
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the display hint for the accepted value.
    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// Marks as accepting multiple values.
    pub fn allow_multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

/// Wraps exactly one node that must be present at its level.
#[derive(Debug, Clone)]
pub struct Required {
    pub(crate) member: Box<Node>,
}

impl Required {
    /// Requires the wrapped node.
    pub fn new(member: impl Into<Node>) -> Self {
        Self {
            member: Box::new(member.into()),
        }
    }
}

/// Wraps a set of nodes that must all be present at their level.
#[derive(Debug, Clone, Default)]
pub struct RequireAll {
    pub(crate) members: Vec<Node>,
}

impl RequireAll {
    /// Creates an empty require-all group; attach members with
    /// [`child`](RequireAll::child). Groups need at least two members.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a member node.
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.members.push(node.into());
        self
    }
}

/// Wraps a set of nodes of which at least one must be present.
#[derive(Debug, Clone, Default)]
pub struct RequireAny {
    pub(crate) members: Vec<Node>,
}

impl RequireAny {
    /// Creates an empty require-any group; attach members with
    /// [`child`](RequireAny::child). Groups need at least two members.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a member node.
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.members.push(node.into());
        self
    }
}

/// Program-wide help trigger descriptor.
///
/// Registered through [`Program::with_help`], the trigger is recognized at
/// every nesting depth during collection and short-circuits to rendering
/// bare help text for the level that matched it.
#[derive(Debug, Clone)]
pub struct Help {
    /// Long name matched after `--`.
    pub name: String,
    /// Single-character alias matched after `-`.
    pub alias: Option<char>,
    /// Description shown in the injected options row.
    pub description: Option<String>,
}

impl Help {
    /// Creates a help trigger with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            description: None,
        }
    }

    /// Sets the single-character alias.
    pub fn alias(mut self, alias: char) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Wraps a program, registering this trigger on it.
    ///
    /// Equivalent to [`Program::with_help`]; only a [`Program`] can carry a
    /// help registration.
    pub fn wrap(self, program: Program) -> Program {
        program.with_help(self)
    }
}

impl From<Command> for Node {
    fn from(node: Command) -> Self {
        Node::Command(node)
    }
}

impl From<Flag> for Node {
    fn from(node: Flag) -> Self {
        Node::Flag(node)
    }
}

impl From<KwArg> for Node {
    fn from(node: KwArg) -> Self {
        Node::KwArg(node)
    }
}

impl From<Arg> for Node {
    fn from(node: Arg) -> Self {
        Node::Arg(node)
    }
}

impl From<Required> for Node {
    fn from(node: Required) -> Self {
        Node::Required(node)
    }
}

impl From<RequireAll> for Node {
    fn from(node: RequireAll) -> Self {
        Node::RequireAll(node)
    }
}

impl From<RequireAny> for Node {
    fn from(node: RequireAny) -> Self {
        Node::RequireAny(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_builder_defaults() {
        let flag = Flag::new("save").alias('S').description("Save dependency");

        assert_eq!(flag.name, "save");
        assert_eq!(flag.alias, Some('S'));
        assert_eq!(flag.description.as_deref(), Some("Save dependency"));
    }

    #[test]
    fn test_kwarg_builder_multiple_and_type() {
        let kwarg = KwArg::new("registry")
            .alias('r')
            .value_type(ValueType::Url)
            .allow_multiple();

        assert!(kwarg.multiple);
        assert_eq!(kwarg.value_type, Some(ValueType::Url));
        assert_eq!(kwarg.value_type.map(ValueType::label), Some("url"));
    }

    #[test]
    fn test_program_collects_children_in_order() {
        let program = Program::new("pkg")
            .child(Arg::new("first"))
            .child(Flag::new("second"))
            .child(Command::new("third"));

        assert_eq!(program.children.len(), 3);
        assert!(matches!(program.children[0], Node::Arg(_)));
        assert!(matches!(program.children[1], Node::Flag(_)));
        assert!(matches!(program.children[2], Node::Command(_)));
    }

    #[test]
    fn test_help_wrap_registers_trigger() {
        let program = Help::new("help").alias('h').wrap(Program::new("pkg"));

        let help = program.help.expect("help should be registered");
        assert_eq!(help.name, "help");
        assert_eq!(help.alias, Some('h'));
    }
}
