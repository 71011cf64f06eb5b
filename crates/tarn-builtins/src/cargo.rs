//! Bodies that shell out to cargo.

use tarn_common_config::parse_duration;
use tarn_params::Params;
use tarn_registry::CommandResult;

use crate::context::BuiltinContext;
use crate::error::BuiltinError;

/// `package=`, `features=` and `all-features` as cargo flags.
fn selection(params: &Params) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(package) = params.value("package") {
        args.extend(["--package".to_string(), package.to_string()]);
    }
    if params.is_true("all-features") {
        args.push("--all-features".to_string());
    } else if let Some(features) = params.value("features") {
        args.extend(["--features".to_string(), features.to_string()]);
    }
    args
}

fn workspace_or_package(params: &Params) -> Vec<String> {
    if params.value("package").is_some() {
        selection(params)
    } else {
        let mut args = vec!["--workspace".to_string()];
        args.extend(selection(params));
        args
    }
}

pub fn build(ctx: &BuiltinContext, params: &Params) -> CommandResult {
    let mut args = vec!["build".to_string()];
    args.extend(selection(params));
    ctx.run(ctx.cargo(args))
}

pub fn build_release(ctx: &BuiltinContext, params: &Params) -> CommandResult {
    let mut args = vec!["build".to_string(), "--release".to_string()];
    args.extend(selection(params));
    ctx.run(ctx.cargo(args))
}

/// `filter=<name>` narrows to matching tests.
pub fn test(ctx: &BuiltinContext, params: &Params) -> CommandResult {
    let mut args = vec!["test".to_string()];
    args.extend(workspace_or_package(params));
    if let Some(filter) = params.value("filter") {
        args.push(filter.to_string());
    }
    ctx.run(ctx.cargo(args))
}

pub fn test_unit(ctx: &BuiltinContext, params: &Params) -> CommandResult {
    let mut args = vec!["test".to_string()];
    args.extend(workspace_or_package(params));
    args.extend(["--lib".to_string(), "--bins".to_string()]);
    if let Some(filter) = params.value("filter") {
        args.push(filter.to_string());
    }
    ctx.run(ctx.cargo(args))
}

pub fn test_doc(ctx: &BuiltinContext, params: &Params) -> CommandResult {
    let mut args = vec!["test".to_string()];
    args.extend(workspace_or_package(params));
    args.push("--doc".to_string());
    ctx.run(ctx.cargo(args))
}

/// `time=<duration>` becomes the measurement time, `count=<n>` the sample
/// size.
pub fn bench(ctx: &BuiltinContext, params: &Params) -> CommandResult {
    let mut args = vec!["bench".to_string()];
    args.extend(selection(params));

    let mut harness = Vec::new();
    if let Some(time) = params.value("time") {
        let invalid = |reason: String| BuiltinError::InvalidParam {
            key: "time".to_string(),
            value: time.to_string(),
            reason,
        };
        let duration = parse_duration(time).map_err(invalid)?;
        if duration.is_zero() {
            return Err(invalid("expected a duration above zero".to_string()).into());
        }
        // criterion reads fractional seconds
        harness.extend([
            "--measurement-time".to_string(),
            duration.as_secs_f64().to_string(),
        ]);
    }
    if let Some(count) = params.value("count") {
        let samples = count
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| BuiltinError::InvalidParam {
                key: "count".to_string(),
                value: count.to_string(),
                reason: "expected a positive integer".to_string(),
            })?;
        harness.extend(["--sample-size".to_string(), samples.to_string()]);
    }
    if !harness.is_empty() {
        args.push("--".to_string());
        args.extend(harness);
    }
    ctx.run(ctx.cargo(args))
}

pub fn lint(ctx: &BuiltinContext, params: &Params) -> CommandResult {
    let mut args = vec!["clippy".to_string()];
    args.extend(workspace_or_package(params));
    args.extend(["--all-targets", "--", "-D", "warnings"].map(String::from));
    ctx.run(ctx.cargo(args))
}

pub fn lint_fix(ctx: &BuiltinContext, params: &Params) -> CommandResult {
    let mut args = vec!["clippy".to_string(), "--fix".to_string()];
    args.extend(workspace_or_package(params));
    args.push("--all-targets".to_string());
    if params.is_true("allow-dirty") {
        args.extend(["--allow-dirty".to_string(), "--allow-staged".to_string()]);
    }
    ctx.run(ctx.cargo(args))
}

pub fn format(ctx: &BuiltinContext, _params: &Params) -> CommandResult {
    ctx.run(ctx.cargo(["fmt", "--all"]))
}

pub fn format_check(ctx: &BuiltinContext, _params: &Params) -> CommandResult {
    ctx.run(ctx.cargo(["fmt", "--all", "--", "--check"]))
}

pub fn clean(ctx: &BuiltinContext, params: &Params) -> CommandResult {
    let mut args = vec!["clean".to_string()];
    if let Some(package) = params.value("package") {
        args.extend(["--package".to_string(), package.to_string()]);
    }
    ctx.run(ctx.cargo(args))
}

pub fn deps_update(ctx: &BuiltinContext, params: &Params) -> CommandResult {
    let mut args = vec!["update".to_string()];
    if let Some(package) = params.value("package") {
        args.extend(["--package".to_string(), package.to_string()]);
    }
    ctx.run(ctx.cargo(args))
}

/// `depth=<n>` limits the tree.
pub fn deps_tree(ctx: &BuiltinContext, params: &Params) -> CommandResult {
    let mut args = vec!["tree".to_string()];
    if let Some(package) = params.value("package") {
        args.extend(["--package".to_string(), package.to_string()]);
    }
    if let Some(depth) = params.value("depth") {
        args.extend(["--depth".to_string(), depth.to_string()]);
    }
    ctx.run(ctx.cargo(args))
}

pub fn doc(ctx: &BuiltinContext, params: &Params) -> CommandResult {
    let mut args = vec!["doc".to_string(), "--no-deps".to_string()];
    args.extend(workspace_or_package(params));
    if params.is_true("open") {
        args.push("--open".to_string());
    }
    ctx.run(ctx.cargo(args))
}

/// Packages and verifies without uploading.
pub fn release_check(ctx: &BuiltinContext, params: &Params) -> CommandResult {
    let mut args = vec!["publish".to_string(), "--dry-run".to_string()];
    if let Some(package) = params.value("package") {
        args.extend(["--package".to_string(), package.to_string()]);
    }
    if params.is_true("allow-dirty") {
        args.push("--allow-dirty".to_string());
    }
    ctx.run(ctx.cargo(args))
}
