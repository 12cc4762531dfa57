use std::path::{Path, PathBuf};
use std::time::Duration;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};
use crate::metadata::QualifiedName;
use super::{
    CatalogClient, CatalogError, CatalogObject, ObjectDefinition, ObjectKind, dependents_of,
};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS __matview_catalog_objects (
        db_name TEXT NOT NULL,
        object_name TEXT NOT NULL,
        object_kind TEXT NOT NULL CHECK(object_kind IN ('BASE_TABLE', 'VIEW', 'MATERIALIZED_VIEW')),
        view_text TEXT,
        source_tables TEXT NOT NULL DEFAULT '[]',
        rewrite_enabled INTEGER NOT NULL DEFAULT 0,
        owner TEXT,
        created_at_ms INTEGER NOT NULL,
        PRIMARY KEY (db_name, object_name)
    );

    CREATE INDEX IF NOT EXISTS idx_matview_catalog_kind
        ON __matview_catalog_objects(object_kind);
"#;

const SELECT_COLUMNS: &str =
    "db_name, object_name, object_kind, view_text, source_tables, rewrite_enabled, owner, created_at_ms";

/// Configuration for the SQLite-backed catalog
#[derive(Debug, Clone)]
pub struct SqliteCatalogConfig {
    /// Database file; `None` keeps the catalog in memory
    pub path: Option<PathBuf>,
    /// How long a call waits on a locked database before failing
    pub busy_timeout: Duration,
}

impl Default for SqliteCatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl SqliteCatalogConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("MATVIEW_CATALOG_PATH")
            && !val.is_empty() {
                config.path = Some(PathBuf::from(val));
            }

        if let Ok(val) = std::env::var("MATVIEW_CATALOG_BUSY_TIMEOUT_MS")
            && let Ok(ms) = val.parse::<u64>() {
                config.busy_timeout = Duration::from_millis(ms);
            }

        config
    }
}

/// Raw column values of one catalog row, converted outside the rusqlite closure
struct StoredRow {
    db_name: String,
    object_name: String,
    object_kind: String,
    view_text: Option<String>,
    source_tables: String,
    rewrite_enabled: bool,
    owner: Option<String>,
    created_at_ms: i64,
}

impl StoredRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            db_name: row.get(0)?,
            object_name: row.get(1)?,
            object_kind: row.get(2)?,
            view_text: row.get(3)?,
            source_tables: row.get(4)?,
            rewrite_enabled: row.get(5)?,
            owner: row.get(6)?,
            created_at_ms: row.get(7)?,
        })
    }

    fn into_object(self) -> Result<CatalogObject, CatalogError> {
        let name = QualifiedName::new(&self.db_name, &self.object_name)
            .map_err(|e| CatalogError::InvalidRecord(e.to_string()))?;
        let kind = self.object_kind.parse::<ObjectKind>()?;
        let source_tables: Vec<QualifiedName> = serde_json::from_str(&self.source_tables)
            .map_err(|e| CatalogError::InvalidRecord(format!("source tables of {}: {}", name, e)))?;
        let created_at = DateTime::<Utc>::from_timestamp_millis(self.created_at_ms)
            .ok_or_else(|| CatalogError::InvalidRecord(format!("creation time of {}", name)))?;

        Ok(CatalogObject::new(
            name,
            kind,
            ObjectDefinition {
                view_text: self.view_text,
                source_tables,
                rewrite_enabled: self.rewrite_enabled,
                owner: self.owner,
                created_at,
            },
        ))
    }
}

/// Durable catalog stored in a SQLite database
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Self::with_config(SqliteCatalogConfig {
            path: Some(path.as_ref().to_path_buf()),
            ..Default::default()
        })
    }

    pub fn open_in_memory() -> Result<Self, CatalogError> {
        Self::with_config(SqliteCatalogConfig::default())
    }

    pub fn with_config(config: SqliteCatalogConfig) -> Result<Self, CatalogError> {
        let conn = match &config.path {
            Some(path) => {
                let conn = Connection::open(path)?;
                conn.execute_batch(
                    "PRAGMA journal_mode=WAL;
                     PRAGMA synchronous=NORMAL;"
                )?;
                conn
            }
            None => Connection::open_in_memory()?,
        };
        conn.busy_timeout(config.busy_timeout)?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened SQLite catalog at {}", config.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string()));

        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Store `object`, failing with `AlreadyExists` if its name is taken
    pub fn create_object(&self, object: &CatalogObject) -> Result<(), CatalogError> {
        let source_tables = serde_json::to_string(&object.definition.source_tables)
            .map_err(|e| CatalogError::InvalidRecord(e.to_string()))?;

        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO __matview_catalog_objects
                (db_name, object_name, object_kind, view_text, source_tables, rewrite_enabled, owner, created_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                object.name.database(),
                object.name.object(),
                object.kind.as_str(),
                object.definition.view_text,
                source_tables,
                object.definition.rewrite_enabled,
                object.definition.owner,
                object.definition.created_at.timestamp_millis(),
            ],
        )?;

        if inserted == 0 {
            return Err(CatalogError::AlreadyExists(object.name.clone()));
        }
        debug!("Created {} {} in SQLite catalog", object.kind, object.name);
        Ok(())
    }

    fn load_all(conn: &Connection) -> Result<Vec<CatalogObject>, CatalogError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM __matview_catalog_objects", SELECT_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], StoredRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(StoredRow::into_object).collect()
    }
}

impl CatalogClient for SqliteCatalog {
    fn lookup(&self, name: &QualifiedName) -> Result<Option<CatalogObject>, CatalogError> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM __matview_catalog_objects WHERE db_name = ?1 AND object_name = ?2",
                    SELECT_COLUMNS
                ),
                params![name.database(), name.object()],
                StoredRow::from_row,
            )
            .optional()?;
        row.map(StoredRow::into_object).transpose()
    }

    fn delete(&self, name: &QualifiedName, cascade: bool) -> Result<(), CatalogError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let mut doomed = vec![name.clone()];
        if cascade {
            doomed.extend(dependents_of(name, &Self::load_all(&tx)?));
        }

        let mut removed = 0;
        for target in &doomed {
            removed += tx.execute(
                "DELETE FROM __matview_catalog_objects WHERE db_name = ?1 AND object_name = ?2",
                params![target.database(), target.object()],
            )?;
        }
        tx.commit()?;

        debug!("Deleted {} catalog object(s) for {} (cascade: {})", removed, name, cascade);
        Ok(())
    }

    fn list_materialized_views(&self) -> Result<Vec<CatalogObject>, CatalogError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM __matview_catalog_objects WHERE object_kind = 'MATERIALIZED_VIEW'
             ORDER BY db_name, object_name",
            SELECT_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], StoredRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(StoredRow::into_object).collect()
    }
}
