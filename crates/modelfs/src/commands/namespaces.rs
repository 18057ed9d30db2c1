//! Namespace command handlers.

use tabled::Tabled;

use modelfs_core::{NamespaceInfo, Session};

use crate::cli::{GlobalOpts, NamespacesAction};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NamespaceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Active")]
    active: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    action: NamespacesAction,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match action {
        NamespacesAction::List => {
            let namespaces: Vec<NamespaceInfo> =
                session.client().list_namespaces().await.map_err(CliError::from)?;
            let active = session.active_namespace();

            let out = output::render_list(
                &global.output,
                &namespaces,
                |n| NamespaceRow {
                    name: n.name.clone(),
                    active: if n.name == active { "*".into() } else { String::new() },
                },
                |n| n.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NamespacesAction::Use { name } => {
            // Runs the full switch path: persist, release, refresh, attach.
            session.set_namespace(&name).await;
            if !global.quiet {
                eprintln!("Active namespace is now '{name}'");
            }
            session.shutdown().await;
            Ok(())
        }
    }
}
