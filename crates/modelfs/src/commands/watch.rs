//! Live mirror command.
//!
//! Runs a full console session -- snapshot fetch plus SSE event feed --
//! and prints each reconciled change as it lands, until interrupted.

use std::sync::Arc;
use std::time::Duration;

use owo_colors::OwoColorize;

use modelfs_core::{DatasetSummary, ErrorBanner, ModelSourceSummary, ModelSummary, Session};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

/// Snapshot poll interval when the event feed is disabled.
const POLL_INTERVAL: Duration = Duration::from_secs(15);

pub async fn handle(
    args: &WatchArgs,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Watching an unreachable console would sit silent forever; surface
    // connectivity as a foreground error before going live.
    session.client().list_namespaces().await.map_err(CliError::from)?;

    session.start().await;
    if let Some(ref ns) = global.namespace {
        if *ns != session.active_namespace() {
            session.set_namespace(ns).await;
        }
    }

    let color = output::should_color(&global.color);
    let namespace = session.active_namespace();
    if !global.quiet {
        eprintln!("Watching namespace '{namespace}' (ctrl-c to stop)");
    }

    // Snapshot-only degradation: poll instead of streaming.
    let poll_task = args.no_events.then(|| {
        let session = session.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(POLL_INTERVAL).await;
                session.refresh_all().await;
            }
        })
    });

    let store = session.store();
    let mut models = store.subscribe_models();
    let mut sources = store.subscribe_sources();
    let mut datasets = store.subscribe_datasets();
    let mut errors = store.subscribe_errors();

    print_line("models", &describe_models(&models.latest()), color);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = models.changed() => match changed {
                Some(snap) => print_line("models", &describe_models(&snap), color),
                None => break,
            },
            changed = sources.changed() => match changed {
                Some(snap) => print_line("sources", &describe_sources(&snap), color),
                None => break,
            },
            changed = datasets.changed() => match changed {
                Some(snap) => print_line("datasets", &describe_datasets(&snap), color),
                None => break,
            },
            result = errors.changed() => {
                if result.is_err() {
                    break;
                }
                let banners = errors.borrow_and_update().clone();
                print_line("errors", &describe_errors(&banners), color);
            }
        }
    }

    if let Some(task) = poll_task {
        task.abort();
    }
    session.shutdown().await;
    if !global.quiet {
        eprintln!("Stopped");
    }
    Ok(())
}

// ── Change line rendering ───────────────────────────────────────────

fn print_line(collection: &str, description: &str, color: bool) {
    let label = if color {
        format!("{}", collection.cyan().bold())
    } else {
        collection.to_string()
    };
    println!("{label}  {description}");
}

fn describe_models(snap: &Arc<Vec<Arc<ModelSummary>>>) -> String {
    if snap.is_empty() {
        return "(none)".into();
    }
    let parts: Vec<String> = snap
        .iter()
        .map(|m| format!("{} {}", m.name, m.status))
        .collect();
    format!("{} -- {}", snap.len(), parts.join(", "))
}

fn describe_sources(snap: &Arc<Vec<Arc<ModelSourceSummary>>>) -> String {
    if snap.is_empty() {
        return "(none)".into();
    }
    let parts: Vec<String> = snap
        .iter()
        .map(|s| {
            let creds = if s.credentials_ready { "ready" } else { "not-ready" };
            format!("{} [{creds}]", s.name)
        })
        .collect();
    format!("{} -- {}", snap.len(), parts.join(", "))
}

fn describe_datasets(snap: &Arc<Vec<Arc<DatasetSummary>>>) -> String {
    if snap.is_empty() {
        return "(none)".into();
    }
    let parts: Vec<String> = snap
        .iter()
        .map(|d| format!("{} {}", d.name, d.phase))
        .collect();
    format!("{} -- {}", snap.len(), parts.join(", "))
}

fn describe_errors(banners: &Arc<Vec<ErrorBanner>>) -> String {
    if banners.is_empty() {
        return "(cleared)".into();
    }
    let parts: Vec<String> = banners
        .iter()
        .map(|b| format!("{}: {}", b.reason, b.message))
        .collect();
    parts.join("; ")
}
