// ABOUTME: Full-table snapshot loader producing ordered rows plus a key map
// ABOUTME: One deterministic scan per table per sync pass, never cached

use std::collections::HashMap;

use crate::db::Table;
use crate::error::Result;
use crate::query;
use crate::value::{PrimaryKey, Value};

/// A full snapshot of one table at one point in time.
///
/// Every row appears exactly once in both `rows` (primary-key order, the
/// checksum input) and `by_key` (the reconciliation lookup), keyed
/// consistently.
pub struct RowSet {
    pub rows: Vec<Vec<Value>>,
    pub by_key: HashMap<PrimaryKey, Vec<Value>>,
}

impl RowSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Map each primary-key column to its position in the column list.
///
/// Config validation guarantees every primary key appears in the columns.
pub fn primary_key_indices(columns: &[String], primary_keys: &[String]) -> Vec<usize> {
    primary_keys
        .iter()
        .filter_map(|key| columns.iter().position(|col| col == key))
        .collect()
}

/// Load a table's RowSet with one full scan.
///
/// Selects exactly the configured columns, ordered by the primary-key columns
/// in declared order so the checksum input is deterministic. Any failure
/// aborts the whole load; a RowSet is never partially returned.
pub async fn load(
    table: &Table,
    columns: &[String],
    primary_keys: &[String],
    pk_indices: &[usize],
) -> Result<RowSet> {
    let select = query::build_select(&table.config.table, columns, primary_keys, None);
    let rows = table.query(&select, Vec::new()).await?;

    tracing::debug!(
        "Loaded {} rows from {}",
        rows.len(),
        table.display_name()
    );

    let mut by_key = HashMap::with_capacity(rows.len());
    for row in &rows {
        by_key.insert(PrimaryKey::extract(row, pk_indices), row.clone());
    }

    Ok(RowSet { rows, by_key })
}
