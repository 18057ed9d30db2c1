//! Model command handlers.

use std::sync::Arc;

use tabled::Tabled;

use modelfs_core::{ModelDetail, ModelSummary, Session};

use crate::cli::{GlobalOpts, ModelsAction};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Versions")]
    versions: String,
    #[tabled(rename = "Last Sync")]
    last_sync: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

impl From<&Arc<ModelSummary>> for ModelRow {
    fn from(m: &Arc<ModelSummary>) -> Self {
        Self {
            name: m.name.clone(),
            source: m.source_ref.clone(),
            versions: format!("{}/{}", m.versions_ready, m.versions_total),
            last_sync: m.last_sync_time.to_rfc3339(),
            status: m.status.to_string(),
            tags: m.tags.as_deref().unwrap_or_default().join(", "),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    action: ModelsAction,
    session: &Session,
    namespace: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = session.client();

    match action {
        ModelsAction::List => {
            let models: Vec<Arc<ModelSummary>> = client
                .list_models(namespace)
                .await
                .map_err(CliError::from)?
                .into_iter()
                .map(Arc::new)
                .collect();

            let out = output::render_list(
                &global.output,
                &models,
                |m| ModelRow::from(m),
                |m| m.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ModelsAction::Get { name } => {
            let detail = client.get_model(namespace, &name).await.map_err(|e| {
                CliError::from(modelfs_core::CoreError::for_resource(
                    e, "model", namespace, &name,
                ))
            })?;

            let out = output::render_single(
                &global.output,
                &detail,
                render_model_detail,
                |d| d.summary.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ModelsAction::Delete { name } => {
            if !util::confirm(
                &format!("Delete model '{namespace}/{name}'? This is destructive."),
                global.yes,
            )? {
                return Ok(());
            }
            client.delete_model(namespace, &name).await.map_err(|e| {
                CliError::from(modelfs_core::CoreError::for_resource(
                    e, "model", namespace, &name,
                ))
            })?;
            if !global.quiet {
                eprintln!("Model deleted");
            }
            Ok(())
        }

        ModelsAction::Resync { name } => {
            client.trigger_resync(namespace, &name).await.map_err(|e| {
                CliError::from(modelfs_core::CoreError::for_resource(
                    e, "model", namespace, &name,
                ))
            })?;
            if !global.quiet {
                eprintln!("Resync triggered");
            }
            Ok(())
        }
    }
}

fn render_model_detail(detail: &ModelDetail) -> String {
    let s = &detail.summary;
    let mut out = String::new();

    out.push_str(&format!("Name:       {}/{}\n", s.namespace, s.name));
    out.push_str(&format!("Source:     {}\n", s.source_ref));
    out.push_str(&format!("Status:     {}\n", s.status));
    out.push_str(&format!(
        "Versions:   {}/{} ready\n",
        s.versions_ready, s.versions_total
    ));
    out.push_str(&format!("Last sync:  {}\n", s.last_sync_time.to_rfc3339()));
    if let Some(ref msg) = s.reconcile_message {
        out.push_str(&format!("Message:    {msg}\n"));
    }
    if let Some(ref description) = detail.description {
        out.push_str(&format!("About:      {description}\n"));
    }

    if !detail.versions.is_empty() {
        out.push('\n');
        out.push_str("Versions:\n");
        for v in &detail.versions {
            out.push_str(&format!(
                "  {} ({}) -- {} / dataset {}{}\n",
                v.name,
                v.repo,
                v.desired_state,
                v.dataset_phase,
                if v.share_enabled { ", shared" } else { "" },
            ));
        }
    }

    out.trim_end().to_string()
}
