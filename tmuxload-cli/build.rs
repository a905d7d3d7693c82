//! Build script for tmuxload-cli.
//!
//! This script generates man pages at build time using clap_mangen.
//! The generated man page is placed in OUT_DIR for inclusion in release builds.
//!
//! Note: We build a minimal command structure here rather than importing from
//! the main crate, since build scripts cannot depend on the crate being built.

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Build the CLI command structure for man page generation.
///
/// IMPORTANT: Keep this structure synchronized with src/cli.rs
/// When adding/removing/modifying commands, update both files.
fn build_cli() -> Command {
    Command::new("tmuxload")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Load declarative tmux workspaces")
        .long_about(
            "Command-line tool for building tmux sessions from YAML or JSON workspace files",
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config-dir")
                .long("config-dir")
                .help("Directory holding named workspaces")
                .value_name("PATH")
                .global(true)
                .env("TMUXLOAD_CONFIGDIR"),
        )
        .subcommands(vec![
            Command::new("load")
                .about("Build a workspace and attach to it")
                .long_about(
                    "Load a workspace file, build its session in tmux and attach to it; \
                     --dry-run prints the tmux commands instead",
                ),
            Command::new("import")
                .about("Convert a teamocil or tmuxinator file to a tmuxload workspace")
                .long_about("Translate a teamocil or tmuxinator file and print the workspace"),
            Command::new("convert")
                .about("Convert a workspace file between YAML and JSON")
                .long_about("Re-encode a workspace file as JSON if it is YAML, and as YAML otherwise"),
            Command::new("validate")
                .about("Check a workspace file without touching tmux")
                .long_about("Run the full load pipeline on a workspace and report warnings"),
            Command::new("freeze")
                .about("Export a running session as a workspace")
                .long_about("Read a running tmux session back and write it as a workspace file"),
            Command::new("ls")
                .about("List saved workspaces")
                .long_about("List the workspaces found in the workspace directory"),
        ])
}

fn main() {
    // Generate man pages at build time
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).unwrap();

    // Generate main tmuxload.1 man page
    let app = build_cli();
    let man = Man::new(app);
    let mut buffer = Vec::new();
    man.render(&mut buffer).unwrap();

    fs::write(man_dir.join("tmuxload.1"), buffer).unwrap();

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
}
