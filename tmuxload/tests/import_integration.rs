//! Importer tests through the public API and the full load pipeline.

mod common;

use common::{load, loader, yaml};
use tmuxload::import::{self, Dialect};
use tmuxload::{ConfigFormat, Error};

#[test]
fn test_teamocil_legacy_literal_example() {
    let raw = yaml(r#"{session: {name: "x", windows: [{name: "w", splits: [{cmd: ["a","b"]}]}]}}"#);
    let expected = yaml(
        r#"{session_name: "x", windows: [{window_name: "w", panes: [{shell_command: ["a","b"]}]}]}"#,
    );

    assert_eq!(import::detect(&raw).verdict().unwrap(), Dialect::TeamocilLegacy);
    assert_eq!(import::import(&raw, None).unwrap(), expected);
}

#[test]
fn test_tmuxinator_literal_example() {
    let raw = yaml(r#"{name: "y", windows: [{"editor": ["vim","git status"]}]}"#);
    let expected = yaml(
        r#"{session_name: "y", windows: [{window_name: "editor", panes: [{shell_command: ["vim","git status"]}]}]}"#,
    );

    assert_eq!(import::detect(&raw).verdict().unwrap(), Dialect::Tmuxinator);
    assert_eq!(import::import(&raw, Some(Dialect::Tmuxinator)).unwrap(), expected);
}

#[test]
fn test_tmuxinator_loads_end_to_end() {
    let loaded = load(
        "name: blog\nroot: ~/blog\npre: docker compose up -d\npre_window: nvm use\nstartup_window: server\nwindows:\n  - editor:\n      layout: main-vertical\n      panes:\n        - vim\n        - guard\n  - server: hugo server\n  - logs:\n",
    );
    let config = &loaded.config;
    assert_eq!(loaded.dialect, Dialect::Tmuxinator);
    assert_eq!(config.session_name, "blog");

    let names: Vec<_> = config
        .windows
        .iter()
        .map(|w| w.window_name.as_deref().unwrap())
        .collect();
    assert_eq!(names, ["editor", "server", "logs"]);

    let editor = &config.windows[0];
    assert_eq!(editor.layout.as_deref(), Some("main-vertical"));
    assert_eq!(editor.panes.len(), 2);
    let before: Vec<_> = editor.panes[0].commands().map(|c| c.cmd.as_str()).collect();
    assert_eq!(before, ["docker compose up -d", "nvm use", "vim"]);

    assert!(config.windows[1].focus);
    assert_eq!(config.windows[2].panes.len(), 1);
    assert!(config.windows[2].panes[0].shell_command.is_empty());
}

#[test]
fn test_teamocil_modern_loads_end_to_end() {
    let loaded = load(
        "name: api\nwindows:\n  - name: code\n    root: /srv/api\n    focus: true\n    panes:\n      - vim\n      - commands: [git fetch, git status]\n        focus: true\n",
    );
    assert_eq!(loaded.dialect, Dialect::TeamocilModern);
    let window = &loaded.config.windows[0];
    assert_eq!(window.window_name.as_deref(), Some("code"));
    assert!(window.focus);
    assert_eq!(window.panes[1].start_directory.as_deref(), Some("/srv/api"));
    assert_eq!(window.panes[1].shell_command.len(), 2);
    assert!(window.panes[1].focus);
}

#[test]
fn test_declared_dialect_skips_detection() {
    let loaded = loader()
        .with_dialect(Dialect::TeamocilLegacy)
        .load_str(
            "session:\n  name: declared\n  windows:\n    - name: w\n      splits: [{cmd: ls}]\n",
            ConfigFormat::Yaml,
        )
        .unwrap();
    assert_eq!(loaded.dialect, Dialect::TeamocilLegacy);
    assert_eq!(loaded.config.session_name, "declared");
}

#[test]
fn test_unrecognized_document_is_import_error() {
    let err = loader()
        .load_str("title: nothing\nitems: [1, 2]\n", ConfigFormat::Yaml)
        .unwrap_err();
    assert!(matches!(err, Error::ImportFormat { .. }));
    assert!(err.is_validation());
}

#[test]
fn test_canonical_documents_pass_through() {
    let raw = yaml("session_name: s\nwindows:\n  - window_name: w\n    panes: [ls]\n");
    assert_eq!(import::detect(&raw).verdict().unwrap(), Dialect::Canonical);
    assert_eq!(import::import(&raw, None).unwrap(), raw);
}

#[test]
fn test_dialect_names_round_trip() {
    for dialect in Dialect::ALL {
        assert_eq!(dialect.name().parse::<Dialect>().unwrap(), dialect);
    }
    assert!("screen".parse::<Dialect>().is_err());
}
