use tarn_params::Params;
use tarn_registry::CommandResult;

use crate::context::BuiltinContext;

pub fn status(ctx: &BuiltinContext, params: &Params) -> CommandResult {
    let mut args = vec!["status", "--short", "--branch"];
    if params.is_true("untracked") {
        args.push("--untracked-files=all");
    }
    ctx.run(ctx.git(args))
}
