//! Demonstration binary for the argtree grammar engine.
//!
//! Declares a tiny package-manager grammar with `argtree-core` itself and
//! prints the collected result tree as JSON. Usage errors render help text
//! to stderr and exit non-zero; a matched help trigger prints bare help to
//! stdout and exits zero.

use std::process::ExitCode;

use argtree_core::{
    Arg, CollectError, Collected, Command, Flag, Grammar, Help, KwArg, Program, Required,
    SchemaError, ValueType,
};

fn demo_grammar() -> Result<Grammar, SchemaError> {
    Program::new("pkg")
        .description("Tiny package-manager demo for the argtree engine")
        .usage("pkg <command> [options]")
        .example("pkg install left-pad --save")
        .example("pkg remove left-pad right-pad")
        .child(
            Command::new("install")
                .alias('i')
                .description("Install a package")
                .usage("pkg install <lib> [options]")
                .child(Required::new(
                    Arg::new("lib")
                        .description("Package to install")
                        .value_type(ValueType::String),
                ))
                .child(
                    Flag::new("save")
                        .alias('S')
                        .description("Record in dependencies"),
                )
                .child(
                    Flag::new("save-dev")
                        .alias('D')
                        .description("Record in dev dependencies"),
                )
                .child(
                    KwArg::new("registry")
                        .alias('r')
                        .description("Registry to fetch from")
                        .value_type(ValueType::Url),
                )
                .callback(|tree, _parent, _carried| {
                    let lib = tree
                        .arg("lib")
                        .and_then(|value| value.as_single())
                        .unwrap_or_default();
                    eprintln!("installing {lib}");
                    None
                }),
        )
        .child(
            Command::new("remove")
                .description("Remove installed packages")
                .usage("pkg remove <libs>...")
                .child(Required::new(
                    Arg::new("libs")
                        .description("Packages to remove")
                        .allow_multiple(),
                )),
        )
        .with_help(Help::new("help").alias('h').description("Show usage information"))
        .build()
}

fn main() -> ExitCode {
    let grammar = match demo_grammar() {
        Ok(grammar) => grammar,
        Err(error) => {
            eprintln!("grammar declaration error: {error}");
            return ExitCode::FAILURE;
        }
    };

    // The engine expects node-style argv with two leading entries; a native
    // binary only carries one, so the program name is prepended.
    let argv = std::iter::once("pkg".to_string()).chain(std::env::args());

    match grammar.collect(argv) {
        Ok(Collected::Tree(tree)) => match serde_json::to_string_pretty(&tree) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("failed to serialize result tree: {error}");
                ExitCode::FAILURE
            }
        },
        Ok(Collected::Help(text)) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        Err(CollectError::Usage { help, .. }) => {
            eprint!("{help}");
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
