// ABOUTME: Connection abstraction over mysql_async pools and rusqlite handles
// ABOUTME: Synthesizes MySQL connection options when no DSN is given

use mysql_async::prelude::Queryable;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::TableConfig;
use crate::error::{Result, SyncError};
use crate::value::Value;

const POOL_MIN: usize = 5;
const POOL_MAX: usize = 5;
const POOL_INACTIVE_TTL: Duration = Duration::from_secs(300);

/// A table endpoint plus its live database handle.
///
/// Construction is cheap; nothing touches the network until [`connect`] is
/// called. Handles are private per endpoint and never shared across tables.
///
/// [`connect`]: Table::connect
pub struct Table {
    pub config: TableConfig,
    handle: Option<Handle>,
}

enum Handle {
    Mysql(mysql_async::Pool),
    // rusqlite connections are not Sync; the mutex serializes statement
    // execution so the handle can be used from spawned tasks
    Sqlite(Arc<Mutex<rusqlite::Connection>>),
}

impl Table {
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            handle: None,
        }
    }

    /// The name used for this endpoint in errors and logs.
    pub fn display_name(&self) -> &str {
        if self.config.label.is_empty() {
            &self.config.table
        } else {
            &self.config.label
        }
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Establish the database handle. Calling this on an already-connected
    /// table is a no-op.
    pub async fn connect(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }

        let handle = match self.config.driver.as_str() {
            "mysql" => self.connect_mysql().await?,
            "sqlite" | "sqlite3" => self.connect_sqlite()?,
            other => {
                return Err(SyncError::Configuration(format!(
                    "unsupported driver: {}",
                    other
                )))
            }
        };

        self.handle = Some(handle);
        tracing::debug!("Connected to {}", self.display_name());
        Ok(())
    }

    async fn connect_mysql(&self) -> Result<Handle> {
        let pool_opts = mysql_async::PoolOpts::default()
            .with_constraints(
                mysql_async::PoolConstraints::new(POOL_MIN, POOL_MAX).unwrap_or_default(),
            )
            .with_inactive_connection_ttl(POOL_INACTIVE_TTL);

        let opts = if self.config.dsn.is_empty() {
            // Synthesize connection options from the discrete fields; empty
            // fields keep the driver defaults (127.0.0.1, port 3306)
            let mut builder = mysql_async::OptsBuilder::default().pool_opts(pool_opts);

            if !self.config.host.is_empty() {
                builder = builder.ip_or_hostname(self.config.host.clone());
            }
            if self.config.port != 0 {
                builder = builder.tcp_port(self.config.port);
            }
            if !self.config.user.is_empty() {
                builder = builder.user(Some(self.config.user.clone()));
            }
            if !self.config.password.is_empty() {
                builder = builder.pass(Some(self.config.password.clone()));
            }
            if !self.config.db.is_empty() {
                builder = builder.db_name(Some(self.config.db.clone()));
            }

            mysql_async::Opts::from(builder)
        } else {
            let parsed = mysql_async::Opts::from_url(&self.config.dsn).map_err(|e| {
                SyncError::Configuration(format!("invalid mysql dsn: {}", e))
            })?;

            mysql_async::Opts::from(mysql_async::OptsBuilder::from_opts(parsed).pool_opts(pool_opts))
        };

        let pool = mysql_async::Pool::new(opts);

        // The pool connects lazily; check out one connection so bad
        // credentials or an unreachable server fail here, not mid-sync
        pool.get_conn()
            .await
            .map_err(|e| SyncError::connection(self.display_name(), e))?;

        Ok(Handle::Mysql(pool))
    }

    fn connect_sqlite(&self) -> Result<Handle> {
        if self.config.dsn.is_empty() {
            return Err(SyncError::Configuration(
                "for sqlite, dsn must be provided directly".to_string(),
            ));
        }

        // rusqlite opens with SQLITE_OPEN_URI by default, so shared in-memory
        // DSNs like file:name?mode=memory&cache=shared work here
        let conn = rusqlite::Connection::open(&self.config.dsn)
            .map_err(|e| SyncError::connection(self.display_name(), e))?;

        Ok(Handle::Sqlite(Arc::new(Mutex::new(conn))))
    }

    /// Execute a SELECT and return all rows as value slices, one value per
    /// selected column in order.
    pub async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Vec<Value>>> {
        match self.handle()? {
            Handle::Mysql(pool) => {
                let mut conn = pool
                    .get_conn()
                    .await
                    .map_err(|e| SyncError::query(self.display_name(), e))?;

                let rows: Vec<mysql_async::Row> = conn
                    .exec(sql, mysql_params(params))
                    .await
                    .map_err(|e| SyncError::query(self.display_name(), e))?;

                Ok(rows
                    .into_iter()
                    .map(|row| row.unwrap().into_iter().map(Value::from).collect())
                    .collect())
            }
            Handle::Sqlite(conn) => {
                let conn = conn.lock().await;
                let mut stmt = conn
                    .prepare(sql)
                    .map_err(|e| SyncError::query(self.display_name(), e))?;

                let column_count = stmt.column_count();
                let mut rows = stmt
                    .query(rusqlite::params_from_iter(
                        params.into_iter().map(rusqlite::types::Value::from),
                    ))
                    .map_err(|e| SyncError::query(self.display_name(), e))?;

                let mut out = Vec::new();
                while let Some(row) = rows
                    .next()
                    .map_err(|e| SyncError::query(self.display_name(), e))?
                {
                    let mut values = Vec::with_capacity(column_count);
                    for i in 0..column_count {
                        let value: rusqlite::types::Value = row
                            .get_ref(i)
                            .map_err(|e| SyncError::query(self.display_name(), e))?
                            .into();
                        values.push(Value::from(value));
                    }
                    out.push(values);
                }

                Ok(out)
            }
        }
    }

    /// Execute an INSERT/UPDATE/DELETE and return the affected-row count.
    pub async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64> {
        match self.handle()? {
            Handle::Mysql(pool) => {
                let mut conn = pool
                    .get_conn()
                    .await
                    .map_err(|e| SyncError::query(self.display_name(), e))?;

                conn.exec_drop(sql, mysql_params(params))
                    .await
                    .map_err(|e| SyncError::query(self.display_name(), e))?;

                Ok(conn.affected_rows())
            }
            Handle::Sqlite(conn) => {
                let conn = conn.lock().await;
                let affected = conn
                    .execute(
                        sql,
                        rusqlite::params_from_iter(
                            params.into_iter().map(rusqlite::types::Value::from),
                        ),
                    )
                    .map_err(|e| SyncError::query(self.display_name(), e))?;

                Ok(affected as u64)
            }
        }
    }

    /// Tear down the handle. MySQL pools are drained; SQLite handles close on
    /// drop.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(Handle::Mysql(pool)) = self.handle.take() {
            pool.disconnect()
                .await
                .map_err(|e| SyncError::connection(self.display_name(), e))?;
        }

        Ok(())
    }

    fn handle(&self) -> Result<&Handle> {
        self.handle
            .as_ref()
            .ok_or_else(|| SyncError::query(self.display_name(), "not connected"))
    }
}

fn mysql_params(params: Vec<Value>) -> mysql_async::Params {
    if params.is_empty() {
        mysql_async::Params::Empty
    } else {
        mysql_async::Params::Positional(params.into_iter().map(mysql_async::Value::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_config(dsn: &str) -> TableConfig {
        TableConfig {
            table: "users".to_string(),
            driver: "sqlite".to_string(),
            dsn: dsn.to_string(),
            ..TableConfig::default()
        }
    }

    #[tokio::test]
    async fn test_connect_rejects_unsupported_driver() {
        let mut table = Table::new(TableConfig {
            table: "users".to_string(),
            driver: "mssql".to_string(),
            ..TableConfig::default()
        });

        let err = table.connect().await.unwrap_err();
        assert!(err.to_string().contains("unsupported driver: mssql"));
    }

    #[tokio::test]
    async fn test_connect_rejects_sqlite_without_dsn() {
        let mut table = Table::new(TableConfig {
            table: "users".to_string(),
            driver: "sqlite3".to_string(),
            ..TableConfig::default()
        });

        let err = table.connect().await.unwrap_err();
        assert!(err.to_string().contains("dsn must be provided directly"));
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let mut table = Table::new(sqlite_config(":memory:"));
        table.connect().await.unwrap();
        assert!(table.is_connected());
        table.connect().await.unwrap();
        assert!(table.is_connected());
    }

    #[tokio::test]
    async fn test_query_and_execute_round_trip() {
        let mut table = Table::new(sqlite_config(":memory:"));
        table.connect().await.unwrap();

        table
            .execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", Vec::new())
            .await
            .unwrap();

        let inserted = table
            .execute(
                "INSERT INTO users (id, name) VALUES (?, ?)",
                vec![Value::Integer(1), Value::Text("Alice".to_string())],
            )
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        let rows = table
            .query("SELECT id, name FROM users", Vec::new())
            .await
            .unwrap();
        assert_eq!(
            rows,
            vec![vec![Value::Integer(1), Value::Text("Alice".to_string())]]
        );
    }

    #[tokio::test]
    async fn test_query_on_missing_table_is_a_query_error() {
        let mut table = Table::new(sqlite_config(":memory:"));
        table.connect().await.unwrap();

        let err = table
            .query("SELECT id FROM nowhere", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Query { .. }));
        assert!(err.to_string().contains("no such table"));
    }
}
