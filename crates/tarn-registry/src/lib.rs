//! Command registry for tarn.
//!
//! - [`Command`]: immutable description of one invocable unit
//! - [`CommandBuilder`]: fluent, validating constructor
//! - [`Registry`]: concurrent name/alias store with dependency-ordered execution
//!
//! ```
//! use tarn_registry::{CommandBuilder, Registry};
//!
//! let registry = Registry::new();
//! registry.must_register(CommandBuilder::new("build").run(|| Ok(())).must_build());
//! registry.must_register(
//!     CommandBuilder::new("test")
//!         .depends_on("build")
//!         .run(|| Ok(()))
//!         .must_build(),
//! );
//!
//! registry.execute("test", &[]).unwrap();
//! ```

pub mod builder;
pub mod category;
pub mod command;
pub mod error;
pub mod plan;
pub mod registry;
pub mod suggest;

pub use builder::CommandBuilder;
pub use category::CategoryInfo;
pub use command::{Action, ArgsAction, Command, CommandSummary};
pub use error::{BoxError, CommandResult, ExecuteError, RegistryError, ValidationError};
pub use registry::{Registry, RegistryMetadata, UNCATEGORIZED};
