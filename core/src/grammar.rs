//! Compiled grammar model.
//!
//! [`Program::build`](crate::Program::build) turns a declared node tree into
//! this immutable form: requirement wrappers are unwrapped into per-level
//! bookkeeping, children are split per category, and the optional help
//! registration becomes a program-scoped [`HelpEntry`]. A [`Grammar`] is
//! read-only during traversal and safe to reuse across collection passes.

use crate::tree::ResultNode;
use crate::types::{Callback, ValueType};

/// A validated, reusable command grammar.
///
/// Obtained from [`Program::build`](crate::Program::build); consumed by
/// [`collect`](Grammar::collect).
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) root: Level,
    pub(crate) globals: Option<HelpEntry>,
}

impl Grammar {
    /// The root program level.
    pub fn root(&self) -> &Level {
        &self.root
    }

    /// The registered program-wide help trigger, if any.
    pub fn globals(&self) -> Option<&HelpEntry> {
        self.globals.as_ref()
    }
}

/// Registered program-wide help trigger.
///
/// Visible at every nesting depth during collection and injected into
/// rendered option tables unless shadowed by a local flag or kwarg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    /// Long name matched after `--`.
    pub name: String,
    /// Single-character alias matched after `-`.
    pub alias: Option<char>,
    /// Description shown in the injected options row.
    pub description: Option<String>,
}

/// One compiled program or command level.
///
/// Children are stored per category; name and alias uniqueness within each
/// category is guaranteed by construction.
#[derive(Debug, Clone)]
pub struct Level {
    /// Level name (program name or command name).
    pub name: String,
    /// Single-character alias (commands only).
    pub alias: Option<char>,
    /// Short description.
    pub description: Option<String>,
    /// Usage line.
    pub usage: Option<String>,
    /// Example invocations.
    pub examples: Vec<String>,
    pub(crate) callback: Option<Callback>,
    /// Nested sub-command levels.
    pub commands: Vec<Level>,
    /// Boolean flags declared at this level.
    pub flags: Vec<FlagSchema>,
    /// Keyword arguments declared at this level.
    pub kwargs: Vec<KwArgSchema>,
    /// Positional arguments declared at this level, in declaration order.
    pub args: Vec<ArgSchema>,
    pub(crate) require_all: Vec<Requirement>,
    pub(crate) require_any: Vec<Vec<Requirement>>,
}

impl Level {
    /// Finds a nested command by name or alias.
    pub fn find_command(&self, token: &str) -> Option<&Level> {
        self.commands.iter().find(|command| {
            command.name == token
                || command
                    .alias
                    .is_some_and(|alias| token_is_char(token, alias))
        })
    }

    /// Finds a flag by long name.
    pub fn find_flag(&self, name: &str) -> Option<&FlagSchema> {
        self.flags.iter().find(|flag| flag.name == name)
    }

    /// Finds a flag by single-character alias.
    pub fn find_flag_by_alias(&self, alias: char) -> Option<&FlagSchema> {
        self.flags.iter().find(|flag| flag.alias == Some(alias))
    }

    /// Finds a kwarg by long name.
    pub fn find_kwarg(&self, name: &str) -> Option<&KwArgSchema> {
        self.kwargs.iter().find(|kwarg| kwarg.name == name)
    }

    /// Finds a kwarg by single-character alias.
    pub fn find_kwarg_by_alias(&self, alias: char) -> Option<&KwArgSchema> {
        self.kwargs.iter().find(|kwarg| kwarg.alias == Some(alias))
    }

    /// Whether a locally declared flag or kwarg shadows the given help entry
    /// by name or alias.
    pub(crate) fn shadows(&self, help: &HelpEntry) -> bool {
        let by_name = self.find_flag(&help.name).is_some() || self.find_kwarg(&help.name).is_some();
        let by_alias = help.alias.is_some_and(|alias| {
            self.find_flag_by_alias(alias).is_some() || self.find_kwarg_by_alias(alias).is_some()
        });
        by_name || by_alias
    }
}

fn token_is_char(token: &str, ch: char) -> bool {
    let mut chars = token.chars();
    chars.next() == Some(ch) && chars.next().is_none()
}

/// Compiled boolean flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSchema {
    /// Long name.
    pub name: String,
    /// Single-character alias.
    pub alias: Option<char>,
    /// Short description.
    pub description: Option<String>,
}

/// Compiled keyword argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KwArgSchema {
    /// Long name.
    pub name: String,
    /// Single-character alias.
    pub alias: Option<char>,
    /// Short description.
    pub description: Option<String>,
    /// Display hint for the accepted value.
    pub value_type: Option<ValueType>,
    /// Whether repeated occurrences accumulate into a sequence.
    pub multiple: bool,
}

/// Compiled positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSchema {
    /// Argument name.
    pub name: String,
    /// Short description.
    pub description: Option<String>,
    /// Display hint for the accepted value.
    pub value_type: Option<ValueType>,
    /// Whether repeated values accumulate into a sequence.
    pub multiple: bool,
}

/// One entry in a level's require-all list or require-any groups.
///
/// Presence is judged against the partial result for the owning level only:
/// a required command matches by the nested command's name, every other kind
/// by key existence in the corresponding collected map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Requirement {
    Command(String),
    Flag(String),
    KwArg(String),
    Arg(String),
}

impl Requirement {
    pub(crate) fn satisfied_by(&self, node: &ResultNode) -> bool {
        match self {
            Requirement::Command(name) => {
                node.command.as_deref().is_some_and(|cmd| cmd.name == *name)
            }
            Requirement::Flag(name) => node.flags.contains_key(name),
            Requirement::KwArg(name) => node.kwargs.contains_key(name),
            Requirement::Arg(name) => node.args.contains_key(name),
        }
    }

    /// Display form used in error messages: commands bare, flags and kwargs
    /// `--`-prefixed, positional args in angle brackets.
    pub(crate) fn display_name(&self) -> String {
        match self {
            Requirement::Command(name) => name.clone(),
            Requirement::Flag(name) | Requirement::KwArg(name) => format!("--{name}"),
            Requirement::Arg(name) => format!("<{name}>"),
        }
    }
}
