// ABOUTME: Reconciliation core - diffs source against each target and applies
// ABOUTME: INSERT/UPDATE/DELETE statements, fanning out one worker per target

use std::collections::HashMap;
use std::sync::Arc;

use crate::checksum::checksum_rows;
use crate::config::{JobConfig, TableConfig};
use crate::db::Table;
use crate::error::{Result, SyncError};
use crate::query;
use crate::rowset;
use crate::value::{PrimaryKey, Value};

/// Per-target result of one reconciliation pass.
///
/// `target_checksum` is the checksum computed before any mutation, so it
/// records the pre-sync state for audit logging. `synced` is true iff at
/// least one mutating statement was executed.
#[derive(Debug)]
pub struct SyncOutcome {
    pub target: TableConfig,
    pub target_checksum: String,
    pub synced: bool,
    pub error: Option<SyncError>,
}

/// Everything a target worker needs, shared read-only across the fan-out.
struct SharedSource {
    primary_keys: Vec<String>,
    pk_indices: Vec<usize>,
    columns: Vec<String>,
    checksum: String,
    map: HashMap<PrimaryKey, Vec<Value>>,
}

/// Synchronize every target of a job against its source.
///
/// The source is loaded and checksummed exactly once; each target then
/// reconciles itself against that shared snapshot in its own task. A failure
/// on one target never blocks or aborts a sibling. A source connection or
/// load failure aborts the whole job before any target is attempted.
pub(crate) async fn sync_targets(job: &JobConfig) -> Result<(String, Vec<SyncOutcome>)> {
    let mut source = Table::new(job.source.clone());
    source.connect().await?;

    let pk_indices = rowset::primary_key_indices(&job.columns, &job.primary_keys);

    let source_set = rowset::load(&source, &job.columns, &job.primary_keys, &pk_indices).await?;
    let source_checksum = checksum_rows(&source_set.rows);

    tracing::info!(
        "Loaded {} source rows from {} (checksum {})",
        source_set.len(),
        source.display_name(),
        source_checksum
    );

    let shared = Arc::new(SharedSource {
        primary_keys: job.primary_keys.clone(),
        pk_indices,
        columns: job.columns.clone(),
        checksum: source_checksum.clone(),
        map: source_set.by_key,
    });

    // Buffered to the number of targets so no worker blocks to report
    let (tx, mut rx) = tokio::sync::mpsc::channel(job.targets.len());

    for target in job.targets.clone() {
        let tx = tx.clone();
        let shared = Arc::clone(&shared);

        tokio::spawn(async move {
            let outcome = sync_target(target, shared).await;
            let _ = tx.send(outcome).await;
        });
    }

    drop(tx);

    let mut outcomes = Vec::with_capacity(job.targets.len());
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
    }

    if let Err(err) = source.close().await {
        tracing::warn!("Failed to close source {}: {}", source.display_name(), err);
    }

    Ok((source_checksum, outcomes))
}

/// Reconcile one target against the shared source snapshot.
async fn sync_target(config: TableConfig, shared: Arc<SharedSource>) -> SyncOutcome {
    let mut target = Table::new(config.clone());

    let result = reconcile(&mut target, &shared).await;
    let _ = target.close().await;

    match result {
        Ok((target_checksum, synced)) => SyncOutcome {
            target: config,
            target_checksum,
            synced,
            error: None,
        },
        Err(error) => SyncOutcome {
            target: config,
            target_checksum: String::new(),
            synced: false,
            error: Some(error),
        },
    }
}

async fn reconcile(target: &mut Table, shared: &SharedSource) -> Result<(String, bool)> {
    target.connect().await?;

    let target_set = rowset::load(
        target,
        &shared.columns,
        &shared.primary_keys,
        &shared.pk_indices,
    )
    .await?;
    let target_checksum = checksum_rows(&target_set.rows);

    // Matching checksums prove the target already agrees with the source
    if target_checksum == shared.checksum {
        tracing::debug!("{} is already in sync", target.display_name());
        return Ok((target_checksum, false));
    }

    let table_name = &target.config.table;

    let set_columns: Vec<String> = shared
        .columns
        .iter()
        .filter(|col| !shared.primary_keys.contains(*col))
        .cloned()
        .collect();

    let insert_sql = query::build_insert(table_name, &shared.columns);
    let update_sql = query::build_update(table_name, &set_columns, &shared.primary_keys);
    let delete_sql = query::build_delete(table_name, &shared.primary_keys);

    let mut target_map = target_set.by_key;
    let mut statements = 0u64;

    // Source pass: INSERT missing rows, UPDATE divergent ones. Removing each
    // matched key from the target map leaves only the rows to delete.
    for (key, row) in &shared.map {
        match target_map.remove(key) {
            None => {
                target.execute(&insert_sql, row.clone()).await?;
                statements += 1;
            }
            Some(existing) => {
                // Nothing to set when every column is a key column
                if existing == *row || set_columns.is_empty() {
                    continue;
                }

                // SET params carry the source's non-key values in column
                // order; WHERE params carry the raw key values, not the
                // normalized map-key form
                let mut params: Vec<Value> = shared
                    .columns
                    .iter()
                    .zip(row.iter())
                    .filter(|(col, _)| !shared.primary_keys.contains(*col))
                    .map(|(_, value)| value.clone())
                    .collect();
                params.extend(shared.pk_indices.iter().map(|&i| row[i].clone()));

                target.execute(&update_sql, params).await?;
                statements += 1;
            }
        }
    }

    // Leftover pass: whatever the source pass did not account for exists
    // only in the target and gets deleted
    for row in target_map.values() {
        let params: Vec<Value> = shared.pk_indices.iter().map(|&i| row[i].clone()).collect();
        target.execute(&delete_sql, params).await?;
        statements += 1;
    }

    tracing::info!(
        "Reconciled {} with {} statements",
        target.display_name(),
        statements
    );

    Ok((target_checksum, statements > 0))
}
