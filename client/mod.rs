pub mod cli_args;
pub mod dispatcher;
pub mod formatter;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use cli_args::{Action, CliArgs};
pub use dispatcher::{CallOutcome, Dispatcher, PendingResponses};
pub use formatter::OutputFormatter;
pub use session::{run_action, CommandRunner};
