//! A built workspace frozen and loaded again describes the same windows.

mod common;

use common::load;
use tmuxload::freeze;
use tmuxload::{ConfigFormat, ConfigReader, MemoryMultiplexer, WorkspaceBuilder};

const WORKSPACE: &str = "session_name: app
windows:
  - window_name: editor
    start_directory: /srv/app
    layout: main-vertical
    panes:
      - vim
      - shell_command: cargo watch -x test
        start_directory: /srv/app/tests
  - window_name: logs
    start_directory: /var/log
    panes:
      - tail -f syslog
      - blank
";

#[test]
fn test_freeze_then_load_matches_original() {
    let original = load(WORKSPACE).config;
    let mut mux = MemoryMultiplexer::new();
    let outcome = WorkspaceBuilder::new(&original).build(&mut mux).unwrap();

    let frozen = freeze::freeze(&mut mux, outcome.session()).unwrap();
    let yaml = ConfigReader::dump(&frozen, ConfigFormat::Yaml).unwrap();
    let reloaded = load(&yaml).config;

    assert_eq!(reloaded.session_name, original.session_name);
    assert_eq!(reloaded.windows, original.windows);
}

#[test]
fn test_freeze_as_json_loads() {
    let original = load(WORKSPACE).config;
    let mut mux = MemoryMultiplexer::new();
    let outcome = WorkspaceBuilder::new(&original).build(&mut mux).unwrap();

    let frozen = freeze::freeze(&mut mux, outcome.session()).unwrap();
    let json = ConfigReader::dump(&frozen, ConfigFormat::Json).unwrap();
    let reloaded = common::loader()
        .load_str(&json, ConfigFormat::Json)
        .unwrap()
        .config;

    assert_eq!(reloaded.windows.len(), 2);
    assert_eq!(reloaded.windows[1].panes[1].shell_command.len(), 0);
}
