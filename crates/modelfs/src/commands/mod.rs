// Command handlers for the modelfs CLI.

pub mod config_cmd;
pub mod datasets;
pub mod models;
pub mod namespaces;
pub mod sources;
pub mod util;
pub mod watch;

use modelfs_core::{ConsoleConfig, Session};

use crate::cli::{Command, GlobalOpts};
use crate::config::resolve_console_config;
use crate::error::CliError;

/// Dispatch a connected command to its handler.
pub async fn dispatch(command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let mut console = resolve_console_config(global)?;
    if let Command::Watch(args) = &command {
        console.events_enabled = !args.no_events;
    }
    let session = Session::new(console.clone()).map_err(CliError::from)?;
    let namespace = effective_namespace(global, &console);

    match command {
        Command::Models(args) => models::handle(args.action, &session, &namespace, global).await,
        Command::Sources(args) => sources::handle(args.action, &session, &namespace, global).await,
        Command::Datasets(args) => {
            datasets::handle(args.action, &session, &namespace, global).await
        }
        Command::Namespaces(args) => namespaces::handle(args.action, &session, global).await,
        Command::Watch(args) => watch::handle(&args, &session, global).await,
        Command::Config(_) => unreachable!("config is dispatched before connection setup"),
    }
}

/// The namespace a command operates in: the explicit `-n` flag wins,
/// otherwise the persisted selection (falling back to the default).
fn effective_namespace(global: &GlobalOpts, console: &ConsoleConfig) -> String {
    global
        .namespace
        .clone()
        .unwrap_or_else(|| console.initial_namespace())
}
