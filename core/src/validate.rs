//! Declaration validation and requirement aggregation.
//!
//! Compiles a declared [`Program`] into an immutable [`Grammar`], catching
//! programmer errors such as malformed names, duplicate siblings, undersized
//! requirement groups, and ambiguous required commands before any collection
//! pass runs. Parse-time input errors are a separate tier; see
//! [`CollectError`](crate::CollectError).
//!
//! # Examples
//!
//! ```
//! use argtree_core::*;
//!
//! let ok = Program::new("pkg")
//!     .child(Command::new("install").child(Arg::new("lib")))
//!     .build();
//! assert!(ok.is_ok());
//!
//! // Names must not start with a hyphen.
//! let err = Program::new("pkg").child(Flag::new("-save")).build();
//! assert!(matches!(err, Err(SchemaError::InvalidName(_))));
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::grammar::{ArgSchema, FlagSchema, Grammar, HelpEntry, KwArgSchema, Level, Requirement};
use crate::types::{Help, Node, Program};

/// Grammar declaration errors.
///
/// These are programmer errors in the declared grammar, raised by
/// [`Program::build`] before any argument vector is seen. They are never
/// formatted as help text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Name is empty, contains a disallowed character, or starts with `-`.
    #[error("invalid node name: {0:?} (use letters, digits, and hyphens; must not start with a hyphen)")]
    InvalidName(String),
    /// Alias is not a letter or digit.
    #[error("invalid alias {0:?} on node {1:?}: aliases must be a letter or digit")]
    InvalidAlias(char, String),
    /// Two siblings in the same category share a name.
    #[error("duplicate sibling name: {0}")]
    DuplicateName(String),
    /// Two siblings in the same category share an alias.
    #[error("duplicate sibling alias: -{0}")]
    DuplicateAlias(char),
    /// A require-all or require-any group wraps fewer than two nodes.
    #[error("{0} must wrap at least two nodes")]
    GroupTooSmall(&'static str),
    /// A requirement group wraps another requirement group.
    #[error("requirement groups may only wrap commands, flags, kwargs, and args")]
    NestedGroup,
    /// More than one command is required at the same level; only one command
    /// can ever match the positional slot.
    #[error("cannot require more than one command at the same level")]
    AmbiguousRequiredCommands,
}

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]*$").expect("static regex must compile")
});

pub(crate) fn compile_program(program: Program) -> Result<Grammar, SchemaError> {
    validate_name(&program.name)?;
    let globals = program.help.map(compile_help).transpose()?;
    let shell = Level {
        name: program.name,
        alias: None,
        description: program.description,
        usage: program.usage,
        examples: program.examples,
        callback: program.callback,
        commands: Vec::new(),
        flags: Vec::new(),
        kwargs: Vec::new(),
        args: Vec::new(),
        require_all: Vec::new(),
        require_any: Vec::new(),
    };
    let root = populate_level(shell, program.children)?;
    Ok(Grammar { root, globals })
}

fn compile_help(help: Help) -> Result<HelpEntry, SchemaError> {
    validate_name(&help.name)?;
    if let Some(alias) = help.alias {
        validate_alias(alias, &help.name)?;
    }
    Ok(HelpEntry {
        name: help.name,
        alias: help.alias,
        description: help.description,
    })
}

/// Unwraps requirement groups and attaches matchable children to the level,
/// in declaration order.
fn populate_level(mut level: Level, children: Vec<Node>) -> Result<Level, SchemaError> {
    let mut siblings = SiblingNames::default();
    for node in children {
        match node {
            Node::Required(group) => {
                let requirement = attach(&mut level, &mut siblings, *group.member)?;
                level.require_all.push(requirement);
            }
            Node::RequireAll(group) => {
                if group.members.len() < 2 {
                    return Err(SchemaError::GroupTooSmall("RequireAll"));
                }
                for member in group.members {
                    let requirement = attach(&mut level, &mut siblings, member)?;
                    level.require_all.push(requirement);
                }
            }
            Node::RequireAny(group) => {
                if group.members.len() < 2 {
                    return Err(SchemaError::GroupTooSmall("RequireAny"));
                }
                let mut requirements = Vec::with_capacity(group.members.len());
                for member in group.members {
                    requirements.push(attach(&mut level, &mut siblings, member)?);
                }
                level.require_any.push(requirements);
            }
            other => {
                attach(&mut level, &mut siblings, other)?;
            }
        }
    }

    let required_commands = level
        .require_all
        .iter()
        .filter(|requirement| matches!(requirement, Requirement::Command(_)))
        .count();
    if required_commands > 1 {
        return Err(SchemaError::AmbiguousRequiredCommands);
    }

    Ok(level)
}

/// Validates and attaches one matchable node, returning its requirement
/// descriptor for the aggregation lists.
fn attach(
    level: &mut Level,
    siblings: &mut SiblingNames,
    node: Node,
) -> Result<Requirement, SchemaError> {
    match node {
        Node::Command(command) => {
            validate_name(&command.name)?;
            if let Some(alias) = command.alias {
                validate_alias(alias, &command.name)?;
            }
            siblings.insert_command(&command.name, command.alias)?;
            let shell = Level {
                name: command.name,
                alias: command.alias,
                description: command.description,
                usage: command.usage,
                examples: command.examples,
                callback: command.callback,
                commands: Vec::new(),
                flags: Vec::new(),
                kwargs: Vec::new(),
                args: Vec::new(),
                require_all: Vec::new(),
                require_any: Vec::new(),
            };
            let compiled = populate_level(shell, command.children)?;
            let requirement = Requirement::Command(compiled.name.clone());
            level.commands.push(compiled);
            Ok(requirement)
        }
        Node::Flag(flag) => {
            validate_name(&flag.name)?;
            if let Some(alias) = flag.alias {
                validate_alias(alias, &flag.name)?;
            }
            siblings.insert_option(&flag.name, flag.alias)?;
            let requirement = Requirement::Flag(flag.name.clone());
            level.flags.push(FlagSchema {
                name: flag.name,
                alias: flag.alias,
                description: flag.description,
            });
            Ok(requirement)
        }
        Node::KwArg(kwarg) => {
            validate_name(&kwarg.name)?;
            if let Some(alias) = kwarg.alias {
                validate_alias(alias, &kwarg.name)?;
            }
            siblings.insert_option(&kwarg.name, kwarg.alias)?;
            let requirement = Requirement::KwArg(kwarg.name.clone());
            level.kwargs.push(KwArgSchema {
                name: kwarg.name,
                alias: kwarg.alias,
                description: kwarg.description,
                value_type: kwarg.value_type,
                multiple: kwarg.multiple,
            });
            Ok(requirement)
        }
        Node::Arg(arg) => {
            validate_name(&arg.name)?;
            siblings.insert_arg(&arg.name)?;
            let requirement = Requirement::Arg(arg.name.clone());
            level.args.push(ArgSchema {
                name: arg.name,
                description: arg.description,
                value_type: arg.value_type,
                multiple: arg.multiple,
            });
            Ok(requirement)
        }
        Node::Required(_) | Node::RequireAll(_) | Node::RequireAny(_) => {
            Err(SchemaError::NestedGroup)
        }
    }
}

fn validate_name(name: &str) -> Result<(), SchemaError> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidName(name.to_string()))
    }
}

fn validate_alias(alias: char, owner: &str) -> Result<(), SchemaError> {
    if alias.is_ascii_alphanumeric() {
        Ok(())
    } else {
        Err(SchemaError::InvalidAlias(alias, owner.to_string()))
    }
}

/// Per-level uniqueness bookkeeping.
///
/// Names and aliases must be unique within a category: positional args,
/// option-likes (flags and kwargs together), and commands. An arg and a flag
/// may share a bare name without ambiguity; two flags may not.
#[derive(Default)]
struct SiblingNames {
    commands: HashSet<String>,
    command_aliases: HashSet<char>,
    options: HashSet<String>,
    option_aliases: HashSet<char>,
    args: HashSet<String>,
}

impl SiblingNames {
    fn insert_command(&mut self, name: &str, alias: Option<char>) -> Result<(), SchemaError> {
        if !self.commands.insert(name.to_string()) {
            return Err(SchemaError::DuplicateName(name.to_string()));
        }
        if let Some(alias) = alias {
            if !self.command_aliases.insert(alias) {
                return Err(SchemaError::DuplicateAlias(alias));
            }
        }
        Ok(())
    }

    fn insert_option(&mut self, name: &str, alias: Option<char>) -> Result<(), SchemaError> {
        if !self.options.insert(name.to_string()) {
            return Err(SchemaError::DuplicateName(name.to_string()));
        }
        if let Some(alias) = alias {
            if !self.option_aliases.insert(alias) {
                return Err(SchemaError::DuplicateAlias(alias));
            }
        }
        Ok(())
    }

    fn insert_arg(&mut self, name: &str) -> Result<(), SchemaError> {
        if !self.args.insert(name.to_string()) {
            return Err(SchemaError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Arg, Command, Flag, KwArg, RequireAll, RequireAny, Required};

    #[test]
    fn test_build_rejects_invalid_names() {
        for bad in ["", "-save", "sa ve", "sa_ve", "säve"] {
            let result = Program::new("pkg").child(Flag::new(bad)).build();
            assert_eq!(
                result.err(),
                Some(SchemaError::InvalidName(bad.to_string())),
                "name {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_build_rejects_invalid_alias() {
        let result = Program::new("pkg").child(Flag::new("save").alias('-')).build();
        assert_eq!(
            result.err(),
            Some(SchemaError::InvalidAlias('-', "save".to_string()))
        );
    }

    #[test]
    fn test_flags_and_kwargs_share_a_namespace() {
        let result = Program::new("pkg")
            .child(Flag::new("out"))
            .child(KwArg::new("out"))
            .build();
        assert_eq!(
            result.err(),
            Some(SchemaError::DuplicateName("out".to_string()))
        );
    }

    #[test]
    fn test_arg_may_share_a_name_with_a_flag() {
        let result = Program::new("pkg")
            .child(Flag::new("out"))
            .child(Arg::new("out"))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_duplicate_alias_within_category_is_rejected() {
        let result = Program::new("pkg")
            .child(Flag::new("save").alias('s'))
            .child(KwArg::new("source").alias('s'))
            .build();
        assert_eq!(result.err(), Some(SchemaError::DuplicateAlias('s')));
    }

    #[test]
    fn test_command_and_flag_namespaces_are_separate() {
        let result = Program::new("pkg")
            .child(Command::new("update"))
            .child(Flag::new("update"))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_required_group_unwraps_into_children_and_require_all() {
        let grammar = Program::new("pkg")
            .child(Required::new(Command::new("build")))
            .child(Flag::new("quiet"))
            .build()
            .unwrap();

        let root = grammar.root();
        assert!(root.find_command("build").is_some());
        assert!(root.find_flag("quiet").is_some());
        assert_eq!(
            root.require_all,
            vec![Requirement::Command("build".to_string())]
        );
        assert!(root.require_any.is_empty());
    }

    #[test]
    fn test_require_all_group_flattens_every_member() {
        let grammar = Program::new("pkg")
            .child(
                RequireAll::new()
                    .child(Arg::new("input"))
                    .child(KwArg::new("outfile")),
            )
            .build()
            .unwrap();

        assert_eq!(
            grammar.root().require_all,
            vec![
                Requirement::Arg("input".to_string()),
                Requirement::KwArg("outfile".to_string()),
            ]
        );
    }

    #[test]
    fn test_require_any_keeps_the_group_as_one_unit() {
        let grammar = Program::new("pkg")
            .child(
                RequireAny::new()
                    .child(Flag::new("save"))
                    .child(Flag::new("save-dev")),
            )
            .build()
            .unwrap();

        let root = grammar.root();
        assert!(root.require_all.is_empty());
        assert_eq!(
            root.require_any,
            vec![vec![
                Requirement::Flag("save".to_string()),
                Requirement::Flag("save-dev".to_string()),
            ]]
        );
    }

    #[test]
    fn test_undersized_groups_are_rejected() {
        let all = Program::new("pkg")
            .child(RequireAll::new().child(Flag::new("save")))
            .build();
        assert_eq!(all.err(), Some(SchemaError::GroupTooSmall("RequireAll")));

        let any = Program::new("pkg")
            .child(RequireAny::new().child(Flag::new("save")))
            .build();
        assert_eq!(any.err(), Some(SchemaError::GroupTooSmall("RequireAny")));
    }

    #[test]
    fn test_nested_groups_are_rejected() {
        let result = Program::new("pkg")
            .child(Required::new(Required::new(Flag::new("save"))))
            .build();
        assert_eq!(result.err(), Some(SchemaError::NestedGroup));
    }

    #[test]
    fn test_two_required_commands_are_ambiguous() {
        let result = Program::new("pkg")
            .child(
                RequireAll::new()
                    .child(Command::new("build"))
                    .child(Command::new("deploy")),
            )
            .build();
        assert_eq!(result.err(), Some(SchemaError::AmbiguousRequiredCommands));

        // One required command plus required non-commands is fine.
        let ok = Program::new("pkg")
            .child(Required::new(Command::new("build")))
            .child(Required::new(KwArg::new("target")))
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn test_uniqueness_is_checked_per_level() {
        // The same flag name may appear at different levels.
        let grammar = Program::new("pkg")
            .child(Flag::new("verbose"))
            .child(Command::new("install").child(Flag::new("verbose")))
            .build();
        assert!(grammar.is_ok());
    }

    #[test]
    fn test_help_registration_is_validated() {
        let result = Program::new("pkg")
            .with_help(crate::types::Help::new("help").alias('?'))
            .build();
        assert_eq!(
            result.err(),
            Some(SchemaError::InvalidAlias('?', "help".to_string()))
        );
    }
}
