//! End-to-end loading of project commands.
//!
//! Most tests plant a shell script where the compiled harness would live,
//! so the cache is hit and no toolchain is needed.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tarn_exec::SystemRunner;
use tarn_extension::{ExtensionError, ExtensionLoader, LoaderOptions, Prepared};
use tarn_registry::{CommandBuilder, ExecuteError, Registry};
use tarn_test_utils::{args, temp_dir, write_file, CallRecorder};
use tokio::runtime::Runtime;

const FAKE_HARNESS: &str = r#"#!/bin/sh
printf '%s|%s\n' "$1" "$TARN_ARGS" >> invocations.txt
if [ "$1" = "fail" ]; then
    echo 'tarn-result: {"command":"fail","ok":false,"error":"it broke"}' >&2
    exit 3
fi
echo "tarn-result: {\"command\":\"$1\",\"ok\":true,\"error\":null}" >&2
"#;

fn plant_binary(prepared: &Prepared) {
    std::fs::create_dir_all(prepared.binary.parent().unwrap()).unwrap();
    std::fs::write(&prepared.binary, FAKE_HARNESS).unwrap();
    std::fs::set_permissions(&prepared.binary, std::fs::Permissions::from_mode(0o755)).unwrap();
}

fn loader(root: &Path, rt: &Runtime) -> ExtensionLoader {
    let runner = SystemRunner::new(rt.handle().clone()).with_timeout(Duration::from_secs(10));
    ExtensionLoader::new(root, Arc::new(runner))
}

fn invocations(root: &Path) -> Vec<String> {
    std::fs::read_to_string(root.join("invocations.txt"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_project_commands_run_with_params() {
    let rt = Runtime::new().unwrap();
    let dir = temp_dir();
    write_file(
        dir.path(),
        "tarnfile.rs",
        r#"
        pub const ALIASES: &[(&str, &str)] = &[("b", "bench")];
        /// Benchmark with parameters
        pub fn bench(args: &[String]) {}
        pub struct Db;
        impl Db { pub fn migrate() {} }
        "#,
    );
    let loader = loader(dir.path(), &rt);
    plant_binary(&loader.prepare().unwrap().unwrap());

    let registry = Registry::new();
    let report = loader.load(&registry).unwrap();
    assert!(report.cache_hit);
    assert_eq!(report.registered, ["bench", "db:migrate"]);
    assert!(report.conflicts.is_empty());

    let bench = registry.get("b").unwrap();
    assert_eq!(bench.full_name(), "bench");
    assert_eq!(bench.description(), "Benchmark with parameters");
    assert_eq!(bench.category(), Some("user"));

    registry.execute("bench", &args(&["time=7s"])).unwrap();
    registry.execute("db:migrate", &[]).unwrap();

    assert_eq!(invocations(dir.path()), ["bench|time=7s", "db:migrate|"]);
}

#[test]
fn test_failing_project_command_reports_its_message() {
    let rt = Runtime::new().unwrap();
    let dir = temp_dir();
    write_file(dir.path(), "tarnfile.rs", "pub fn fail() -> Result<(), String> { Err(\"it broke\".into()) }");
    let loader = loader(dir.path(), &rt);
    plant_binary(&loader.prepare().unwrap().unwrap());

    let registry = Registry::new();
    loader.load(&registry).unwrap();
    let err = registry.execute("fail", &[]).unwrap_err();
    assert!(matches!(&err, ExecuteError::Failed { command, .. } if command == "fail"));
    assert_eq!(err.to_string(), "it broke");
}

#[test]
fn test_malformed_source_leaves_builtins_working() {
    let rt = Runtime::new().unwrap();
    let dir = temp_dir();
    write_file(dir.path(), "tarnfile.rs", "pub fn deploy( {");

    let recorder = CallRecorder::new();
    let registry = Registry::new();
    registry.must_register(CommandBuilder::new("build").run(recorder.action("build")).must_build());

    let err = loader(dir.path(), &rt).load(&registry).unwrap_err();
    assert!(matches!(err, ExtensionError::Parse { .. }));

    registry.execute("build", &[]).unwrap();
    assert_eq!(recorder.calls(), ["build"]);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_collision_with_builtin_is_reported() {
    let rt = Runtime::new().unwrap();
    let dir = temp_dir();
    write_file(dir.path(), "tarnfile.rs", "pub fn build() {}\npub fn deploy() {}");
    let loader = loader(dir.path(), &rt);
    plant_binary(&loader.prepare().unwrap().unwrap());

    let recorder = CallRecorder::new();
    let registry = Registry::new();
    registry.must_register(CommandBuilder::new("build").run(recorder.action("build")).must_build());

    let report = loader.load(&registry).unwrap();
    assert_eq!(report.registered, ["deploy"]);
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].name, "build");

    // The built-in is untouched.
    registry.execute("build", &[]).unwrap();
    assert_eq!(recorder.calls(), ["build"]);
    assert!(invocations(dir.path()).is_empty());
}

#[test]
fn test_directory_takes_precedence_over_file() {
    let rt = Runtime::new().unwrap();
    let dir = temp_dir();
    write_file(dir.path(), "tarnfile.rs", "pub fn from_file() {}");
    write_file(dir.path(), "tarnfiles/deploy.rs", "pub fn from_dir() {}");
    let loader = loader(dir.path(), &rt);
    plant_binary(&loader.prepare().unwrap().unwrap());

    let registry = Registry::new();
    let report = loader.load(&registry).unwrap();
    assert!(report.source.unwrap().ends_with("tarnfiles"));
    assert!(registry.contains("from_dir"));
    assert!(!registry.contains("from_file"));
}

#[test]
fn test_compile_failure_carries_compiler_output() {
    let rt = Runtime::new().unwrap();
    let dir = temp_dir();
    write_file(dir.path(), "tarnfile.rs", "pub fn build() { undefined_helper() }");
    let cargo = write_file(
        dir.path(),
        "fake-cargo",
        "#!/bin/sh\necho 'error[E0425]: cannot find function `undefined_helper` in this scope' >&2\necho ' --> tarnfile.rs:1:18' >&2\nexit 101\n",
    );
    std::fs::set_permissions(&cargo, std::fs::Permissions::from_mode(0o755)).unwrap();

    let loader = loader(dir.path(), &rt).with_options(LoaderOptions {
        cargo: cargo.to_string_lossy().into_owned(),
        ..LoaderOptions::default()
    });
    let registry = Registry::new();
    let err = loader.load(&registry).unwrap_err();

    assert!(matches!(err, ExtensionError::Compile { .. }));
    let text = err.to_string();
    assert!(text.contains("exit code 101"));
    assert!(text.contains("cannot find function `undefined_helper`"));
    assert!(text.contains("tarnfile.rs:1:18"));
    assert!(registry.is_empty());
}

#[test]
#[ignore = "compiles a real harness with cargo"]
fn test_real_compile_and_run() {
    let rt = Runtime::new().unwrap();
    let dir = temp_dir();
    write_file(
        dir.path(),
        "tarnfile.rs",
        r#"
        pub fn record(args: &[String]) -> Result<(), String> {
            std::fs::write("recorded.txt", args.join(",")).map_err(|e| e.to_string())
        }
        "#,
    );
    let loader = loader(dir.path(), &rt);
    let registry = Registry::new();
    let report = loader.load(&registry).unwrap();
    assert!(!report.cache_hit);

    registry.execute("record", &args(&["time=7s", "name=two words"])).unwrap();
    let recorded = std::fs::read_to_string(dir.path().join("recorded.txt")).unwrap();
    assert_eq!(recorded, "time=7s,name=two words");

    let again = loader.load(&Registry::new()).unwrap();
    assert!(again.cache_hit);
}
