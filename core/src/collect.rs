//! The token-consuming traversal engine.
//!
//! [`Grammar::collect`] walks the argument vector left-to-right in a single
//! synchronous pass, matching tokens against the current grammar level,
//! descending into matched sub-commands, and producing a
//! [`ResultNode`](crate::ResultNode) tree. Tokens are consumed exactly once,
//! globally: a child level never re-reads tokens an ancestor consumed.
//!
//! Validation failures abort the whole pass; the error carries help text
//! rendered for the deepest level reached. Callbacks only run after the
//! entire vector has been consumed and every level's requirements checked.

use std::collections::btree_map::Entry;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::grammar::{Grammar, HelpEntry, KwArgSchema, Level, Requirement};
use crate::help;
use crate::tree::{Collected, CollectedValue, ResultNode};

/// User-input errors detected while collecting arguments.
///
/// The `Display` impl is the exact message appended to rendered help text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// Token matched no command, flag, kwarg, or open positional arg.
    #[error("Unknown argument: {0}")]
    UnknownArgument(String),
    /// A non-multi flag or kwarg was supplied twice.
    #[error("Duplicate argument: {0}")]
    DuplicateArgument(String),
    /// A kwarg was supplied without a value.
    #[error("No value provided for argument: {0}")]
    MissingValue(String),
    /// A single-hyphen token carried an `=value` (ambiguous alias/value
    /// syntax, e.g. `-o=path`).
    #[error("Invalid argument syntax: {0}")]
    InvalidAliasSyntax(String),
    /// A kwarg alias appeared after the first position of a boolean alias
    /// cluster.
    #[error("Invalid argument: -{0}")]
    KwArgInCluster(char),
    /// A require-all entry was absent once the level's tokens were drained.
    #[error("Required argument {0} was not supplied")]
    MissingRequired(String),
    /// No member of a require-any group was present.
    #[error("Required one of: {0}")]
    MissingRequiredAny(String),
}

/// Failure of a whole collection pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectError {
    /// The argument vector did not carry the two conventional leading
    /// entries (executable path and program name). A programmer error, not
    /// formatted as help text.
    #[error("argument vector must carry the executable and program entries")]
    TruncatedArgv,
    /// User input failed validation. `help` holds the full help text
    /// rendered for the deepest level reached, with the error line appended.
    #[error("{error}")]
    Usage {
        /// The specific validation failure.
        error: UsageError,
        /// Rendered help text for the level active at the point of failure.
        help: String,
    },
}

impl Grammar {
    /// Collects an argument vector into a result tree.
    ///
    /// The first two entries (conventionally the executable path and the
    /// program name) are stripped before matching begins. On success,
    /// callbacks along the matched command chain have already run, root
    /// first, each receiving the value returned by the previous one.
    ///
    /// # Examples
    ///
    /// ```
    /// use argtree_core::*;
    ///
    /// let grammar = Program::new("p")
    ///     .child(
    ///         Command::new("install")
    ///             .child(Arg::new("lib"))
    ///             .child(Flag::new("save").alias('S')),
    ///     )
    ///     .build()
    ///     .unwrap();
    ///
    /// let collected = grammar
    ///     .collect(["node", "p", "install", "jargs", "--save"])
    ///     .unwrap();
    /// let tree = collected.tree().unwrap();
    /// let install = tree.command().unwrap();
    /// assert_eq!(install.name, "install");
    /// assert!(install.flag("save"));
    /// assert_eq!(install.arg("lib").unwrap().as_single(), Some("jargs"));
    /// ```
    pub fn collect<I, S>(&self, argv: I) -> Result<Collected, CollectError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens: Vec<String> = argv.into_iter().map(Into::into).collect();
        if tokens.len() < 2 {
            return Err(CollectError::TruncatedArgv);
        }
        let tail = tokens.split_off(2);
        debug!(program = %self.root.name, tokens = tail.len(), "collecting argument vector");

        let mut cursor = Cursor::new(tail);
        match parse_level(&self.root, self.globals.as_ref(), &mut cursor)? {
            Outcome::Help(text) => Ok(Collected::Help(text)),
            Outcome::Tree(tree) => {
                run_callbacks(&self.root, &tree);
                Ok(Collected::Tree(tree))
            }
        }
    }
}

/// Cursor over the remaining tokens, shared by every level of the descent.
struct Cursor {
    tokens: Vec<String>,
    pos: usize,
}

impl Cursor {
    fn new(tokens: Vec<String>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn next(&mut self) -> Option<String> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Hands back every remaining token verbatim.
    fn drain_rest(&mut self) -> Vec<String> {
        self.tokens.split_off(self.pos)
    }
}

enum Outcome {
    Tree(ResultNode),
    Help(String),
}

enum OptionOutcome {
    Consumed,
    Help,
}

/// One level of the recursive descent: consumes tokens until the cursor is
/// drained or a `--` cutoff, then checks this level's requirements.
fn parse_level(
    level: &Level,
    globals: Option<&HelpEntry>,
    cursor: &mut Cursor,
) -> Result<Outcome, CollectError> {
    let mut node = ResultNode::new(&level.name);

    while let Some(token) = cursor.next() {
        if token.starts_with('-') {
            let bare = token.trim_start_matches('-');
            if bare.is_empty() {
                // Strict cutoff: everything after `--` is captured verbatim.
                node.rest = Some(cursor.drain_rest());
                debug!(level = %level.name, "captured rest after `--`");
                break;
            }
            let outcome = consume_option(level, globals, cursor, &mut node, &token, bare)
                .map_err(|error| fail(level, globals, error))?;
            if let OptionOutcome::Help = outcome {
                return Ok(Outcome::Help(help::render(level, globals, None)));
            }
        } else {
            // The command slot, once filled, is never overwritten; later
            // positionals fall through to this level's args.
            let command = if node.command.is_none() {
                level.find_command(&token)
            } else {
                None
            };
            if let Some(command) = command {
                debug!(level = %level.name, command = %command.name, "descending into command");
                match parse_level(command, globals, cursor)? {
                    Outcome::Help(text) => return Ok(Outcome::Help(text)),
                    Outcome::Tree(child) => node.command = Some(Box::new(child)),
                }
            } else {
                consume_positional(level, &mut node, token)
                    .map_err(|error| fail(level, globals, error))?;
            }
        }
    }

    check_requirements(level, globals, &node)?;
    Ok(Outcome::Tree(node))
}

/// Writes a positional token into the first open declared arg.
fn consume_positional(
    level: &Level,
    node: &mut ResultNode,
    token: String,
) -> Result<(), UsageError> {
    let open = level
        .args
        .iter()
        .find(|arg| arg.multiple || !node.args.contains_key(&arg.name));
    match open {
        Some(arg) if arg.multiple => {
            match node.args.entry(arg.name.clone()) {
                Entry::Occupied(mut entry) => entry.get_mut().push(token),
                Entry::Vacant(entry) => {
                    entry.insert(CollectedValue::Multiple(vec![token]));
                }
            }
            Ok(())
        }
        Some(arg) => {
            node.args
                .insert(arg.name.clone(), CollectedValue::Single(token));
            Ok(())
        }
        None => Err(UsageError::UnknownArgument(token)),
    }
}

/// Resolves one flag/kwarg token: alias style (single hyphen, possibly a
/// cluster) or long-name style (double hyphen, possibly `=value`).
fn consume_option(
    level: &Level,
    globals: Option<&HelpEntry>,
    cursor: &mut Cursor,
    node: &mut ResultNode,
    token: &str,
    bare: &str,
) -> Result<OptionOutcome, UsageError> {
    if token.starts_with("--") {
        return consume_long(level, globals, cursor, node, token, bare);
    }

    if bare.contains('=') {
        return Err(UsageError::InvalidAliasSyntax(token.to_string()));
    }

    let aliases: Vec<char> = bare.chars().collect();
    if let [alias] = aliases.as_slice() {
        if let Some(flag) = level.find_flag_by_alias(*alias) {
            set_flag(node, &flag.name, token)?;
            return Ok(OptionOutcome::Consumed);
        }
        if let Some(kwarg) = level.find_kwarg_by_alias(*alias) {
            let value = cursor
                .next()
                .ok_or_else(|| UsageError::MissingValue(token.to_string()))?;
            return assign_kwarg(node, kwarg, value, token).map(|()| OptionOutcome::Consumed);
        }
        if globals.is_some_and(|help| help.alias == Some(*alias)) {
            return Ok(OptionOutcome::Help);
        }
        return Err(UsageError::UnknownArgument(token.to_string()));
    }

    let Some((&first, chained)) = aliases.split_first() else {
        return Err(UsageError::UnknownArgument(token.to_string()));
    };
    if let Some(kwarg) = level.find_kwarg_by_alias(first) {
        // The rest of the cluster is the kwarg's inline value.
        let value: String = chained.iter().collect();
        return assign_kwarg(node, kwarg, value, &format!("-{first}"))
            .map(|()| OptionOutcome::Consumed);
    }
    if level.find_flag_by_alias(first).is_none() {
        return Err(UsageError::UnknownArgument(format!("-{first}")));
    }
    for &alias in std::iter::once(&first).chain(chained) {
        if let Some(flag) = level.find_flag_by_alias(alias) {
            set_flag(node, &flag.name, &format!("-{alias}"))?;
        } else if level.find_kwarg_by_alias(alias).is_some() {
            return Err(UsageError::KwArgInCluster(alias));
        } else {
            return Err(UsageError::UnknownArgument(format!("-{alias}")));
        }
    }
    Ok(OptionOutcome::Consumed)
}

/// Resolves a `--name` or `--name=value` token.
fn consume_long(
    level: &Level,
    globals: Option<&HelpEntry>,
    cursor: &mut Cursor,
    node: &mut ResultNode,
    token: &str,
    bare: &str,
) -> Result<OptionOutcome, UsageError> {
    let (name, inline) = match bare.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (bare, None),
    };
    let display = format!("--{name}");

    if let Some(flag) = level.find_flag(name) {
        // Flags carry no value; an inline `=value` is dropped.
        set_flag(node, &flag.name, &display)?;
        return Ok(OptionOutcome::Consumed);
    }
    if let Some(kwarg) = level.find_kwarg(name) {
        let value = match inline {
            Some("") => return Err(UsageError::MissingValue(display)),
            Some(value) => value.to_string(),
            None => cursor
                .next()
                .ok_or_else(|| UsageError::MissingValue(display.clone()))?,
        };
        return assign_kwarg(node, kwarg, value, &display).map(|()| OptionOutcome::Consumed);
    }
    if globals.is_some_and(|help| help.name == name) {
        return Ok(OptionOutcome::Help);
    }
    Err(UsageError::UnknownArgument(token.to_string()))
}

fn set_flag(node: &mut ResultNode, name: &str, display: &str) -> Result<(), UsageError> {
    if node.flags.insert(name.to_string(), true).is_some() {
        return Err(UsageError::DuplicateArgument(display.to_string()));
    }
    Ok(())
}

fn assign_kwarg(
    node: &mut ResultNode,
    kwarg: &KwArgSchema,
    value: String,
    display: &str,
) -> Result<(), UsageError> {
    if kwarg.multiple {
        match node.kwargs.entry(kwarg.name.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().push(value),
            Entry::Vacant(entry) => {
                entry.insert(CollectedValue::Multiple(vec![value]));
            }
        }
        return Ok(());
    }
    if node.kwargs.contains_key(&kwarg.name) {
        return Err(UsageError::DuplicateArgument(display.to_string()));
    }
    node.kwargs
        .insert(kwarg.name.clone(), CollectedValue::Single(value));
    Ok(())
}

/// Checked once per level, after its share of the queue is drained.
fn check_requirements(
    level: &Level,
    globals: Option<&HelpEntry>,
    node: &ResultNode,
) -> Result<(), CollectError> {
    for requirement in &level.require_all {
        if !requirement.satisfied_by(node) {
            return Err(fail(
                level,
                globals,
                UsageError::MissingRequired(requirement.display_name()),
            ));
        }
    }
    for group in &level.require_any {
        if !group.iter().any(|requirement| requirement.satisfied_by(node)) {
            let list = group
                .iter()
                .map(Requirement::display_name)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(fail(level, globals, UsageError::MissingRequiredAny(list)));
        }
    }
    Ok(())
}

/// Renders help for the level active at the point of failure.
fn fail(level: &Level, globals: Option<&HelpEntry>, error: UsageError) -> CollectError {
    let help = help::render(level, globals, Some(&error.to_string()));
    CollectError::Usage { error, help }
}

/// Walks the matched command chain top-down, invoking declared callbacks and
/// threading each return value into the next callback that runs.
fn run_callbacks(root: &Level, tree: &ResultNode) {
    let mut level = root;
    let mut parent: Option<&ResultNode> = None;
    let mut current = tree;
    let mut carried: Option<Value> = None;
    loop {
        if let Some(callback) = &level.callback {
            carried = callback.invoke(current, parent, carried);
        }
        let Some(child) = current.command.as_deref() else {
            break;
        };
        let Some(next) = level.commands.iter().find(|cmd| cmd.name == child.name) else {
            break;
        };
        parent = Some(current);
        current = child;
        level = next;
    }
}
