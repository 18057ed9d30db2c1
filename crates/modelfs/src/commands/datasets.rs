//! Dataset command handlers.

use std::sync::Arc;

use tabled::Tabled;

use modelfs_core::{DatasetSummary, Session};

use crate::cli::{DatasetsAction, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DatasetRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "PVC")]
    pvc: String,
    #[tabled(rename = "Last Sync")]
    last_sync: String,
}

impl From<&Arc<DatasetSummary>> for DatasetRow {
    fn from(d: &Arc<DatasetSummary>) -> Self {
        Self {
            name: d.name.clone(),
            phase: d.phase.to_string(),
            pvc: d.pvc_name.clone().unwrap_or_default(),
            last_sync: d.last_sync.to_rfc3339(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    action: DatasetsAction,
    session: &Session,
    namespace: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match action {
        DatasetsAction::List => {
            let datasets: Vec<Arc<DatasetSummary>> = session
                .client()
                .list_datasets(namespace)
                .await
                .map_err(CliError::from)?
                .into_iter()
                .map(Arc::new)
                .collect();

            let out = output::render_list(
                &global.output,
                &datasets,
                |d| DatasetRow::from(d),
                |d| d.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
