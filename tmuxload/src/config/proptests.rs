//! Property-based tests for the configuration pipeline.

use super::schema::{CommandSpec, Environment, PaneConfig, WindowConfig, WorkspaceConfig};
use super::shorthand::{ShorthandExpander, BLANK_MARKERS};
use super::trickle::DefaultsTrickler;
use proptest::prelude::*;
use serde_yaml::Value;

fn directory_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of("/[a-z]{1,8}(/[a-z]{1,8}){0,2}")
}

fn environment_strategy() -> impl Strategy<Value = Option<Environment>> {
    prop::option::of(prop::collection::btree_map("[A-Z]{1,4}", "[a-z0-9]{0,6}", 0..4))
}

fn commands_strategy() -> impl Strategy<Value = Option<Vec<CommandSpec>>> {
    prop::option::of(
        prop::collection::vec("[a-z]{1,6}( [a-z]{1,6})?", 0..3)
            .prop_map(|cmds| cmds.into_iter().map(CommandSpec::new).collect()),
    )
}

fn pane_strategy() -> impl Strategy<Value = PaneConfig> {
    (
        directory_strategy(),
        environment_strategy(),
        commands_strategy(),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(start_directory, environment, before, suppress)| PaneConfig {
            start_directory,
            environment,
            shell_command_before: before,
            suppress_history: suppress,
            ..Default::default()
        })
}

fn window_strategy() -> impl Strategy<Value = WindowConfig> {
    (
        directory_strategy(),
        environment_strategy(),
        commands_strategy(),
        prop::option::of(any::<bool>()),
        prop::collection::vec(pane_strategy(), 1..4),
    )
        .prop_map(
            |(start_directory, environment, before, suppress, panes)| WindowConfig {
                start_directory,
                environment,
                shell_command_before: before,
                suppress_history: suppress,
                panes,
                ..Default::default()
            },
        )
}

fn workspace_strategy() -> impl Strategy<Value = WorkspaceConfig> {
    (
        directory_strategy(),
        environment_strategy(),
        commands_strategy(),
        prop::option::of(any::<bool>()),
        prop::collection::vec(window_strategy(), 1..4),
    )
        .prop_map(
            |(start_directory, environment, before, suppress, windows)| WorkspaceConfig {
                session_name: "prop".to_string(),
                start_directory,
                environment,
                shell_command_before: before,
                suppress_history: suppress,
                windows,
                ..Default::default()
            },
        )
}

// Authored pane entries: blank markers, bare strings and command lists.
fn raw_pane_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(Value::String("blank".to_string())),
        "[a-z]{1,8}( [a-z]{1,8})?".prop_map(Value::String),
        prop::collection::vec("[a-z]{1,8}".prop_map(Value::String), 1..4).prop_map(Value::Sequence),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 500,
        .. ProptestConfig::default()
    })]

    #[test]
    fn trickle_is_idempotent(workspace in workspace_strategy()) {
        let once = DefaultsTrickler::trickle(&workspace);
        let twice = DefaultsTrickler::trickle(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn trickle_never_overrides_explicit_pane_values(workspace in workspace_strategy()) {
        let trickled = DefaultsTrickler::trickle(&workspace);
        for (window, original) in trickled.windows.iter().zip(&workspace.windows) {
            for (pane, authored) in window.panes.iter().zip(&original.panes) {
                if authored.start_directory.is_some() {
                    prop_assert_eq!(&pane.start_directory, &authored.start_directory);
                }
                if let Some(env) = &authored.environment {
                    let merged = pane.environment.as_ref().unwrap();
                    for (key, value) in env {
                        prop_assert_eq!(merged.get(key), Some(value));
                    }
                }
            }
        }
    }

    #[test]
    fn trickle_keeps_tree_shape(workspace in workspace_strategy()) {
        let trickled = DefaultsTrickler::trickle(&workspace);
        prop_assert_eq!(trickled.windows.len(), workspace.windows.len());
        prop_assert_eq!(trickled.pane_count(), workspace.pane_count());
    }

    #[test]
    fn expansion_never_loses_panes(panes in prop::collection::vec(raw_pane_strategy(), 1..6)) {
        let mut window = serde_yaml::Mapping::new();
        window.insert("panes".into(), Value::Sequence(panes.clone()));
        let mut session = serde_yaml::Mapping::new();
        session.insert("session_name".into(), "prop".into());
        session.insert("windows".into(), Value::Sequence(vec![Value::Mapping(window)]));

        let expanded = ShorthandExpander::expand(&Value::Mapping(session));
        let expanded_panes = expanded["windows"][0]["panes"].as_sequence().unwrap();
        prop_assert_eq!(expanded_panes.len(), panes.len());

        for (pane, authored) in expanded_panes.iter().zip(&panes) {
            let commands = pane["shell_command"].as_sequence().unwrap();
            match authored {
                Value::String(s) if BLANK_MARKERS.contains(&s.as_str()) => {
                    prop_assert!(commands.is_empty());
                }
                Value::String(_) => prop_assert_eq!(commands.len(), 1),
                Value::Sequence(items) => prop_assert_eq!(commands.len(), items.len()),
                _ => prop_assert!(commands.is_empty()),
            }
        }
    }
}
