use crate::db::schema::{BACKFILL_COLUMNS, SQLITE_INIT};
use crate::error::DeskError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use tracing::info;

pub type SqlitePool = Pool<Sqlite>;

/// Handle over the registration database. Cheap to clone.
#[derive(Clone)]
pub struct Storage {
    pub(crate) pool: SqlitePool,
}

/// Open (creating if needed) the database behind `database_url` and bring
/// its schema up to date.
pub async fn connect(database_url: &str) -> Result<Storage, DeskError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    if let Some(parent) = options.get_filename().parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    let storage = Storage::new(pool);
    storage.init_schema().await?;
    Ok(storage)
}

impl Storage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the schema by executing the bundled DDL, then add columns
    /// that databases from older builds are missing.
    pub async fn init_schema(&self) -> Result<(), DeskError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        self.backfill_columns().await
    }

    async fn backfill_columns(&self) -> Result<(), DeskError> {
        let mut known: HashMap<&str, HashSet<String>> = HashMap::new();
        for &(table, column, decl, fill) in BACKFILL_COLUMNS {
            if !known.contains_key(table) {
                let names = self.table_columns(table).await?;
                known.insert(table, names);
            }
            if known.get(table).is_some_and(|cols| cols.contains(column)) {
                continue;
            }
            info!(table, column, "adding missing column");
            let mut tx = self.pool.begin().await?;
            sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column} {decl}"))
                .execute(&mut *tx)
                .await?;
            if let Some(fill) = fill {
                let res = sqlx::query(fill).execute(&mut *tx).await?;
                info!(table, column, rows = res.rows_affected(), "filled new column");
            }
            tx.commit().await?;
        }
        Ok(())
    }

    async fn table_columns(&self, table: &str) -> Result<HashSet<String>, DeskError> {
        let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(DeskError::from))
            .collect()
    }
}
