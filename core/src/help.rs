//! Help-text rendering.
//!
//! Produces the usage message shown when collection fails or when the
//! registered help trigger matches: a commands table, an options table
//! (flags and kwargs as `--name, -a`, positional args as `<name>`, with
//! bracketed type annotations), the usage line and examples when declared,
//! and a trailing error line when one is supplied. Each category is sorted
//! alphabetically by name, and the registered help entry is injected into
//! the options unless a local flag or kwarg shadows it.

use crate::grammar::{HelpEntry, Level};

const INDENT: &str = "  ";
const GUTTER: usize = 4;

/// Renders help text for one grammar level.
///
/// # Examples
///
/// ```
/// use argtree_core::*;
///
/// let grammar = Program::new("pkg")
///     .usage("pkg <command> [options]")
///     .child(Command::new("install").alias('i').description("Install a package"))
///     .child(Flag::new("verbose").alias('v').description("Verbose output"))
///     .build()
///     .unwrap();
///
/// let text = help::render(grammar.root(), grammar.globals(), None);
/// assert!(text.contains("install, i"));
/// assert!(text.contains("--verbose, -v"));
/// assert!(text.contains("Usage: pkg <command> [options]"));
/// ```
pub fn render(level: &Level, globals: Option<&HelpEntry>, error: Option<&str>) -> String {
    let mut sections: Vec<String> = Vec::new();

    let mut commands: Vec<(String, String)> = level
        .commands
        .iter()
        .map(|command| {
            let left = match command.alias {
                Some(alias) => format!("{}, {alias}", command.name),
                None => command.name.clone(),
            };
            (left, command.description.clone().unwrap_or_default())
        })
        .collect();
    commands.sort();
    if !commands.is_empty() {
        sections.push(table("Commands", &commands));
    }

    let mut options: Vec<(String, String)> = Vec::new();
    if let Some(help) = globals {
        if !level.shadows(help) {
            options.push((
                option_left(&help.name, help.alias),
                help.description.clone().unwrap_or_default(),
            ));
        }
    }
    for flag in &level.flags {
        options.push((
            option_left(&flag.name, flag.alias),
            flag.description.clone().unwrap_or_default(),
        ));
    }
    for kwarg in &level.kwargs {
        let mut description = kwarg.description.clone().unwrap_or_default();
        if let Some(value_type) = kwarg.value_type {
            annotate(&mut description, value_type.label());
        }
        options.push((option_left(&kwarg.name, kwarg.alias), description));
    }
    options.sort();

    let mut args: Vec<(String, String)> = level
        .args
        .iter()
        .map(|arg| {
            let mut description = arg.description.clone().unwrap_or_default();
            if let Some(value_type) = arg.value_type {
                annotate(&mut description, value_type.label());
            }
            (format!("<{}>", arg.name), description)
        })
        .collect();
    args.sort();
    options.extend(args);

    if !options.is_empty() {
        sections.push(table("Options", &options));
    }

    if let Some(usage) = &level.usage {
        sections.push(format!("{INDENT}Usage: {usage}"));
    }

    if !level.examples.is_empty() {
        let mut block = format!("{INDENT}Examples:");
        for example in &level.examples {
            block.push_str(&format!("\n{INDENT}{INDENT}{example}"));
        }
        sections.push(block);
    }

    if let Some(error) = error {
        sections.push(format!("{INDENT}{error}"));
    }

    let mut text = sections.join("\n\n");
    text.push('\n');
    text
}

fn option_left(name: &str, alias: Option<char>) -> String {
    match alias {
        Some(alias) => format!("--{name}, -{alias}"),
        None => format!("--{name}"),
    }
}

fn annotate(description: &mut String, label: &str) {
    if description.is_empty() {
        description.push_str(&format!("[{label}]"));
    } else {
        description.push_str(&format!(" [{label}]"));
    }
}

/// Two-column table with the left column padded to a shared width.
fn table(title: &str, rows: &[(String, String)]) -> String {
    let width = rows.iter().map(|(left, _)| left.len()).max().unwrap_or(0) + GUTTER;
    let mut block = format!("{INDENT}{title}:");
    for (left, description) in rows {
        if description.is_empty() {
            block.push_str(&format!("\n{INDENT}{INDENT}{left}"));
        } else {
            block.push_str(&format!("\n{INDENT}{INDENT}{left:<width$}{description}"));
        }
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Arg, Command, Flag, Help, KwArg, Program, ValueType};

    fn grammar(program: Program) -> crate::grammar::Grammar {
        program.build().expect("grammar should compile")
    }

    #[test]
    fn test_render_sorts_each_category_by_name() {
        let grammar = grammar(
            Program::new("pkg")
                .child(Command::new("remove"))
                .child(Command::new("install"))
                .child(Flag::new("verbose"))
                .child(Flag::new("quiet")),
        );

        let text = render(grammar.root(), None, None);
        let install = text.find("install").unwrap();
        let remove = text.find("remove").unwrap();
        assert!(install < remove);

        let quiet = text.find("--quiet").unwrap();
        let verbose = text.find("--verbose").unwrap();
        assert!(quiet < verbose);
    }

    #[test]
    fn test_render_annotates_types_and_brackets_args() {
        let grammar = grammar(
            Program::new("pkg")
                .child(KwArg::new("outfile").alias('o').value_type(ValueType::File))
                .child(Arg::new("lib").description("Library name").value_type(ValueType::String)),
        );

        let text = render(grammar.root(), None, None);
        assert!(text.contains("--outfile, -o"));
        assert!(text.contains("[file]"));
        assert!(text.contains("<lib>"));
        assert!(text.contains("Library name [string]"));
    }

    #[test]
    fn test_render_injects_global_help_unless_shadowed() {
        let grammar = grammar(
            Program::new("pkg")
                .with_help(Help::new("help").alias('h').description("Show usage")),
        );
        let text = render(grammar.root(), grammar.globals(), None);
        assert!(text.contains("--help, -h"));
        assert!(text.contains("Show usage"));

        let shadowed = grammar_with_local_help();
        let text = render(shadowed.root(), shadowed.globals(), None);
        assert!(text.contains("--help"));
        assert!(!text.contains("Show usage"));
    }

    fn grammar_with_local_help() -> crate::grammar::Grammar {
        Program::new("pkg")
            .child(Flag::new("help").description("Local help flag"))
            .with_help(Help::new("help").alias('h').description("Show usage"))
            .build()
            .expect("grammar should compile")
    }

    #[test]
    fn test_render_appends_error_line_last() {
        let grammar = grammar(
            Program::new("pkg")
                .usage("pkg [options]")
                .example("pkg --verbose")
                .child(Flag::new("verbose")),
        );

        let text = render(grammar.root(), None, Some("Unknown argument: --wat"));
        let usage = text.find("Usage: pkg [options]").unwrap();
        let example = text.find("pkg --verbose").unwrap();
        let error = text.find("Unknown argument: --wat").unwrap();
        assert!(usage < example);
        assert!(example < error);
        assert!(text.ends_with("Unknown argument: --wat\n"));
    }

    #[test]
    fn test_render_omits_empty_sections() {
        let grammar = grammar(Program::new("pkg"));
        let text = render(grammar.root(), None, None);
        assert!(!text.contains("Commands:"));
        assert!(!text.contains("Options:"));
        assert!(!text.contains("Examples:"));
    }
}
