//! Model source command handlers.

use std::sync::Arc;

use tabled::Tabled;

use modelfs_core::{ModelSourceDetail, ModelSourceSummary, Session};

use crate::cli::{GlobalOpts, SourcesAction};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SourceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    source_type: String,
    #[tabled(rename = "Credentials")]
    credentials: String,
    #[tabled(rename = "Referenced By")]
    referenced: String,
    #[tabled(rename = "Last Checked")]
    last_checked: String,
}

impl From<&Arc<ModelSourceSummary>> for SourceRow {
    fn from(s: &Arc<ModelSourceSummary>) -> Self {
        let credentials = if s.credentials_ready {
            "ready".to_string()
        } else {
            s.credentials_status.clone().unwrap_or_else(|| "not ready".into())
        };
        Self {
            name: s.name.clone(),
            source_type: s.source_type.clone(),
            credentials,
            referenced: s.referenced_models.as_deref().unwrap_or_default().join(", "),
            last_checked: s.last_checked.to_rfc3339(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    action: SourcesAction,
    session: &Session,
    namespace: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = session.client();

    match action {
        SourcesAction::List => {
            let sources: Vec<Arc<ModelSourceSummary>> = client
                .list_model_sources(namespace)
                .await
                .map_err(CliError::from)?
                .into_iter()
                .map(Arc::new)
                .collect();

            let out = output::render_list(
                &global.output,
                &sources,
                |s| SourceRow::from(s),
                |s| s.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SourcesAction::Get { name } => {
            let detail = client.get_model_source(namespace, &name).await.map_err(|e| {
                CliError::from(modelfs_core::CoreError::for_resource(
                    e,
                    "modelsource",
                    namespace,
                    &name,
                ))
            })?;

            let out = output::render_single(
                &global.output,
                &detail,
                render_source_detail,
                |d| d.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SourcesAction::Delete { name } => {
            if !util::confirm(
                &format!("Delete model source '{namespace}/{name}'? This is destructive."),
                global.yes,
            )? {
                return Ok(());
            }
            client
                .delete_model_source(namespace, &name)
                .await
                .map_err(|e| {
                    CliError::from(modelfs_core::CoreError::for_resource(
                        e,
                        "modelsource",
                        namespace,
                        &name,
                    ))
                })?;
            if !global.quiet {
                eprintln!("Model source deleted");
            }
            Ok(())
        }
    }
}

fn render_source_detail(detail: &ModelSourceDetail) -> String {
    let spec = serde_json::to_string_pretty(&detail.spec)
        .unwrap_or_else(|_| detail.spec.to_string());
    format!(
        "Name:  {}/{}\nSpec:\n{spec}",
        detail.namespace, detail.name
    )
}
