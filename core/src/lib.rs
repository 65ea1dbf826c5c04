//! Declarative command-line grammars with a tree-walking argument collector.
//!
//! Callers describe a command grammar as a tree of nodes — a [`Program`]
//! root with [`Command`], [`Flag`], [`KwArg`], and [`Arg`] children, plus
//! the requirement wrappers [`Required`], [`RequireAll`], and
//! [`RequireAny`] — then feed a raw argument vector through
//! [`Grammar::collect`], which walks the tree in one synchronous pass,
//! consumes tokens, validates constraints, and produces a structured
//! [`ResultNode`] tree before invoking matched callbacks top-down.
//!
//! # Example
//!
//! ```
//! use argtree_core::*;
//!
//! let grammar = Program::new("pkg")
//!     .usage("pkg <command> [options]")
//!     .child(
//!         Command::new("install")
//!             .alias('i')
//!             .description("Install a package")
//!             .child(Required::new(Arg::new("lib").value_type(ValueType::String)))
//!             .child(Flag::new("save").alias('S').description("Save to dependencies")),
//!     )
//!     .with_help(Help::new("help").alias('h').description("Show usage"))
//!     .build()?;
//!
//! let collected = grammar.collect(["node", "pkg", "install", "left-pad", "--save"]);
//! let tree = collected.unwrap().tree().unwrap();
//! let install = tree.command().unwrap();
//! assert!(install.flag("save"));
//! assert_eq!(install.arg("lib").unwrap().as_single(), Some("left-pad"));
//! # Ok::<(), argtree_core::SchemaError>(())
//! ```
//!
//! # Error tiers
//!
//! Declaration problems (bad names, duplicate siblings, malformed
//! requirement groups) surface as [`SchemaError`] from [`Program::build`]
//! and are never formatted as help text. Input problems surface as
//! [`CollectError::Usage`], which carries both the specific [`UsageError`]
//! and help text rendered for the deepest grammar level reached; whether to
//! print it and exit is the host's decision.

mod collect;
mod grammar;
pub mod help;
mod tree;
mod types;
mod validate;

pub use collect::{CollectError, UsageError};
pub use grammar::{ArgSchema, FlagSchema, Grammar, HelpEntry, KwArgSchema, Level};
pub use tree::{Collected, CollectedValue, ResultNode};
pub use types::{
    Arg, Callback, CallbackFn, Command, Flag, Help, KwArg, Node, Program, RequireAll, RequireAny,
    Required, ValueType,
};
pub use validate::SchemaError;
