//! `tarn`: run project commands with their dependencies.

use std::process::ExitCode;

use tarn_common_config::{vars, Environment};
use tarn_common_log::LogConfig;
use tracing::debug;

mod app;
mod cli;
mod error;
mod output;

use app::App;
use cli::Cli;
use error::CliError;

fn main() -> ExitCode {
    let cli = match Cli::parse_normalized(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            e.exit_code()
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)
            .map_err(|e| CliError::io_with_path(format!("cannot enter {}", dir.display()), e, dir))?;
    }
    let root = std::env::current_dir()?;

    let environment = Environment::init(&root)?;
    if Environment::get(vars::NO_COLOR).is_some() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let config = App::load_config(&root, &cli)?;
    let log = LogConfig::from_env()
        .with_verbosity(cli.verbose.max(u8::from(config.verbose)))
        .with_debug(cli.debug);
    if let Err(e) = tarn_common_log::init(log) {
        eprintln!("warning: {e}");
    }
    for file in environment.loaded_files() {
        debug!(file = %file.display(), "loaded environment file");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let app = App::new(root, config, runtime.handle().clone())?;
    runtime.block_on(app.run(cli))
}
