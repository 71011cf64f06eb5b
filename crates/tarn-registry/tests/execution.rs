//! Registry behaviour observable through `execute`, `get` and `search`.

use std::sync::Arc;

use proptest::prelude::*;
use tarn_registry::{CommandBuilder, ExecuteError, Registry};
use tarn_test_utils::{args, CallRecorder};

fn registry_with(recorder: &CallRecorder, specs: &[(&str, &[&str])]) -> Registry {
    let registry = Registry::new();
    for (name, deps) in specs {
        registry.must_register(
            CommandBuilder::new(*name)
                .dependencies(deps.iter().copied())
                .run(recorder.action(name))
                .must_build(),
        );
    }
    registry
}

#[test]
fn test_dependencies_run_in_declaration_order_before_body() {
    let recorder = CallRecorder::new();
    let registry = registry_with(&recorder, &[("a", &[]), ("b", &[]), ("d", &["a", "b"])]);

    registry.execute("d", &[]).unwrap();

    assert_eq!(recorder.calls(), ["a", "b", "d"]);
}

#[test]
fn test_build_runs_once_before_test() {
    let recorder = CallRecorder::new();
    let registry = registry_with(&recorder, &[("build", &[]), ("test", &["build"])]);

    assert!(registry.execute("test", &[]).is_ok());

    assert_eq!(recorder.count("build"), 1);
    assert_eq!(recorder.calls(), ["build", "test"]);
}

#[test]
fn test_cycle_is_reported_before_any_body_runs() {
    let recorder = CallRecorder::new();
    let registry = registry_with(&recorder, &[("a", &["b"]), ("b", &["a"])]);

    let err = registry.execute("a", &[]).unwrap_err();

    assert!(matches!(err, ExecuteError::Cycle { .. }));
    assert!(err.to_string().contains("a -> b -> a"));
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_failing_dependency_stops_the_chain() {
    let recorder = CallRecorder::new();
    let registry = Registry::new();
    registry.must_register(
        CommandBuilder::new("b")
            .run(recorder.failing("b", "b exploded"))
            .must_build(),
    );
    registry.must_register(CommandBuilder::new("c").run(recorder.action("c")).must_build());
    registry.must_register(
        CommandBuilder::new("a")
            .depends_on("b")
            .run(recorder.action("a"))
            .must_build(),
    );
    registry.must_register(
        CommandBuilder::new("d")
            .dependencies(["a", "c"])
            .run(recorder.action("d"))
            .must_build(),
    );

    let err = registry.execute("d", &[]).unwrap_err();

    assert_eq!(err.failed_command(), Some("b"));
    assert_eq!(err.to_string(), "b exploded");
    assert_eq!(recorder.calls(), ["b"]);
}

#[test]
fn test_unknown_command_suggests_closest_name() {
    let recorder = CallRecorder::new();
    let registry = registry_with(&recorder, &[("build", &[]), ("test", &[])]);

    let err = registry.execute("biuld", &[]).unwrap_err();

    assert_eq!(err.suggestion(), Some("build"));
    assert!(err.to_string().contains("build"));
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_unknown_dependency_is_an_error() {
    let recorder = CallRecorder::new();
    let registry = registry_with(&recorder, &[("release", &["package"])]);

    let err = registry.execute("release", &[]).unwrap_err();

    assert!(matches!(err, ExecuteError::UnknownDependency { .. }));
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_args_reach_target_but_not_dependencies() {
    let recorder = CallRecorder::new();
    let registry = Registry::new();
    registry.must_register(
        CommandBuilder::new("build")
            .run_with_args(recorder.args_action("build"))
            .must_build(),
    );
    registry.must_register(
        CommandBuilder::namespaced("bench", "run")
            .depends_on("build")
            .run_with_args(recorder.args_action("bench:run"))
            .must_build(),
    );

    registry
        .execute("bench:run", &args(&["time=7s", "verbose"]))
        .unwrap();

    assert_eq!(recorder.last_args("build"), Some(vec![]));
    assert_eq!(
        recorder.last_args("bench:run"),
        Some(args(&["time=7s", "verbose"]))
    );
}

#[test]
fn test_execute_through_alias() {
    let recorder = CallRecorder::new();
    let registry = Registry::new();
    registry.must_register(
        CommandBuilder::namespaced("test", "unit")
            .alias("tu")
            .run(recorder.action("test:unit"))
            .must_build(),
    );

    registry.execute("TU", &[]).unwrap();

    assert_eq!(recorder.calls(), ["test:unit"]);
}

#[test]
fn test_dependency_may_be_named_by_alias() {
    let recorder = CallRecorder::new();
    let registry = Registry::new();
    registry.must_register(
        CommandBuilder::new("format")
            .alias("fmt")
            .run(recorder.action("format"))
            .must_build(),
    );
    registry.must_register(
        CommandBuilder::new("ci")
            .depends_on("fmt")
            .run(recorder.action("ci"))
            .must_build(),
    );

    registry.execute("ci", &[]).unwrap();

    assert_eq!(recorder.calls(), ["format", "ci"]);
}

#[test]
fn test_body_may_reenter_registry() {
    let registry = Arc::new(Registry::new());
    let recorder = CallRecorder::new();
    registry.must_register(CommandBuilder::new("inner").run(recorder.action("inner")).must_build());

    let handle = Arc::clone(&registry);
    registry.must_register(
        CommandBuilder::new("outer")
            .run(move || {
                handle.execute("inner", &[])?;
                Ok(())
            })
            .must_build(),
    );

    registry.execute("outer", &[]).unwrap();
    assert_eq!(recorder.calls(), ["inner"]);
}

fn command_name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(:[a-z]{1,8})?"
}

proptest! {
    #[test]
    fn prop_names_and_aliases_stay_unique(
        entries in prop::collection::vec((command_name(), prop::collection::vec("[a-z]{1,6}", 0..3)), 1..20)
    ) {
        let registry = Registry::new();
        for (name, aliases) in &entries {
            let cmd = CommandBuilder::new(name.clone())
                .aliases(aliases.clone())
                .run(|| Ok(()))
                .build()
                .unwrap();
            let before = registry.len();
            if registry.register(cmd).is_err() {
                prop_assert_eq!(registry.len(), before);
            }
        }

        let mut seen = std::collections::HashSet::new();
        for cmd in registry.list() {
            prop_assert!(seen.insert(cmd.full_name().to_string()));
            for alias in cmd.aliases() {
                prop_assert!(seen.insert(alias.clone()));
            }
        }
    }

    #[test]
    fn prop_alias_resolves_to_same_command(name in "[a-z]{5,8}", alias in "[A-Z]{2,4}") {
        let registry = Registry::new();
        registry.must_register(
            CommandBuilder::new(name.clone()).alias(alias.clone()).run(|| Ok(())).must_build(),
        );
        let by_alias = registry.get(&alias).unwrap();
        let by_name = registry.get(&name).unwrap();
        prop_assert!(Arc::ptr_eq(&by_alias, &by_name));
    }

    #[test]
    fn prop_search_is_complete(
        descriptions in prop::collection::vec("[a-z ]{0,20}", 1..12),
        query in "[a-z]{1,3}",
    ) {
        let registry = Registry::new();
        for (i, description) in descriptions.iter().enumerate() {
            registry.must_register(
                CommandBuilder::namespaced(format!("ns{i}"), format!("m{i}"))
                    .description(description.clone())
                    .run(|| Ok(()))
                    .must_build(),
            );
        }

        let found: std::collections::HashSet<String> = registry
            .search(&query.to_uppercase())
            .iter()
            .map(|c| c.full_name().to_string())
            .collect();

        for cmd in registry.list() {
            let expected = cmd.full_name().contains(&query)
                || cmd.description().to_lowercase().contains(&query);
            prop_assert_eq!(found.contains(cmd.full_name()), expected);
        }
    }
}
