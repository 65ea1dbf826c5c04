use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_argtree-demo"))
        .args(args)
        .output()
        .expect("demo binary should run")
}

#[test]
fn install_prints_the_result_tree_as_json() {
    let output = run(&["install", "left-pad", "--save"]);
    assert!(output.status.success());

    let tree: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(tree["name"], "pkg");
    assert_eq!(tree["command"]["name"], "install");
    assert_eq!(tree["command"]["flags"]["save"], true);
    assert_eq!(tree["command"]["args"]["lib"], "left-pad");

    // The install callback reports on stderr.
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("installing left-pad"));
}

#[test]
fn remove_accumulates_multiple_libs() {
    let output = run(&["remove", "left-pad", "right-pad"]);
    assert!(output.status.success());

    let tree: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(
        tree["command"]["args"]["libs"],
        serde_json::json!(["left-pad", "right-pad"])
    );
}

#[test]
fn help_trigger_prints_usage_to_stdout() {
    let output = run(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Commands:"));
    assert!(stdout.contains("install, i"));
    assert!(stdout.contains("--help, -h"));
    assert!(stdout.contains("Usage: pkg <command> [options]"));
}

#[test]
fn help_trigger_works_inside_commands() {
    let output = run(&["install", "-h"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--save, -S"));
    assert!(stdout.contains("<lib>"));
}

#[test]
fn unknown_argument_renders_help_to_stderr() {
    let output = run(&["--wat"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown argument: --wat"));
}

#[test]
fn missing_required_arg_fails_with_the_deep_usage_line() {
    let output = run(&["install"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Required argument <lib> was not supplied"));
    assert!(stderr.contains("Usage: pkg install <lib> [options]"));
}
