//! Process execution for tarn.
//!
//! Every external process the tool starts goes through a [`CommandRunner`].
//! [`SystemRunner`] spawns real children under a timeout; [`RecordingRunner`]
//! records what would have run.

mod error;
mod recording;
mod report;
mod runner;
mod spec;

pub use error::ProcessError;
pub use recording::RecordingRunner;
pub use report::{Report, REPORT_PREFIX};
pub use runner::{CommandRunner, ProcessOutput, SystemRunner, DEFAULT_TIMEOUT};
pub use spec::ProcessSpec;
