//! Config command handlers (no console connection required).

use crate::cli::{ConfigAction, ConfigArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match &args.action {
        ConfigAction::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigAction::Init { server } => {
            let path = config::write_starter_config(server)?;
            if !global.quiet {
                eprintln!("Wrote {}", path.display());
            }
            Ok(())
        }
    }
}
