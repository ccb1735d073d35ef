use std::sync::Arc;

use diesel::Connection;
use diesel::sqlite::SqliteConnection;
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::DatabaseConfig;
use crate::db::{DatabaseError, Params, QueryExecutor, Row};
use crate::query::QuerySpec;

fn establish_connection(path: &str) -> Result<SqliteConnection, DatabaseError> {
    SqliteConnection::establish(path).map_err(|e| DatabaseError::Connection(e.to_string()))
}

/// Runs catalog queries against one SQLite database file. Each call opens its
/// own connection on the blocking pool.
#[derive(Clone)]
pub struct DatabaseManager {
    sqlite_path: Arc<String>,
}

impl DatabaseManager {
    pub fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let path = config.sqlite_path().ok_or_else(|| {
            DatabaseError::Connection("no sqlite database configured".to_string())
        })?;
        debug!(path = %path, "using sqlite database");
        Ok(Self {
            sqlite_path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &str {
        &self.sqlite_path
    }

    pub async fn migrate(&self, catalog: &Catalog) -> Result<Vec<String>, DatabaseError> {
        let catalog = catalog.clone();
        let db_path = self.sqlite_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            QueryExecutor::new(&mut conn).migrate(&catalog)
        })
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
    }

    /// Collects the rows of a select, stopping after `limit` rows when given.
    pub async fn select_rows(
        &self,
        spec: &QuerySpec,
        params: &Params,
        limit: Option<usize>,
    ) -> Result<Vec<Row>, DatabaseError> {
        if limit == Some(0) {
            return Ok(Vec::new());
        }

        let spec = spec.clone();
        let params = params.clone();
        let db_path = self.sqlite_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            let mut rows = Vec::new();
            QueryExecutor::new(&mut conn).select(&spec, &params, &mut |row: &Row| {
                rows.push(row.clone());
                limit.is_none_or(|limit| rows.len() < limit)
            })?;
            Ok(rows)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }

    pub async fn execute(&self, spec: &QuerySpec, params: &Params) -> Result<usize, DatabaseError> {
        let spec = spec.clone();
        let params = params.clone();
        let db_path = self.sqlite_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&db_path)?;
            QueryExecutor::new(&mut conn).execute(&spec, &params)
        })
        .await
        .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use tempfile::NamedTempFile;

    use super::DatabaseManager;
    use crate::catalog::Catalog;
    use crate::config::DatabaseConfig;
    use crate::db::{DatabaseError, Params, Value};

    const CATALOG: &str = r#"
queries:
  - name: create_users
    kind: create_table
    table: users
    columns:
      - { name: id, type: int }
      - { name: name, type: text }
  - name: insert_user
    kind: insert
    table: users
    columns:
      - { name: id, type: int }
      - { name: name, type: text }
  - name: query_something
    kind: select
    columns:
      - { name: id, type: int }
      - { name: name, type: text }
    sql: "FROM users WHERE id >= :id ORDER BY id"
    binds:
      - { name: id, type: int }
"#;

    fn config_for(file: &NamedTempFile) -> DatabaseConfig {
        DatabaseConfig {
            url: None,
            filename: Some(file.path().to_string_lossy().to_string()),
        }
    }

    #[tokio::test]
    async fn sqlite_round_trip_persists_across_managers() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let config = config_for(&file);
        let catalog = Catalog::from_yaml_str(CATALOG).expect("catalog");

        let manager = DatabaseManager::new(&config).expect("db manager");
        assert_eq!(manager.migrate(&catalog).await.expect("migrate"), vec!["users"]);

        let insert = catalog.get("insert_user").expect("insert_user");
        for (id, name) in [(1, "alice"), (2, "bob"), (3, "carol")] {
            let params: Params = [
                ("id".to_string(), Value::Integer(id)),
                ("name".to_string(), Value::from(name)),
            ]
            .into_iter()
            .collect();
            assert_eq!(manager.execute(insert, &params).await.expect("insert"), 1);
        }

        let reopened = DatabaseManager::new(&config).expect("db manager reopened");
        assert!(reopened.migrate(&catalog).await.expect("migrate reopened").is_empty());

        let query = catalog.get("query_something").expect("query_something");
        let params: Params = [("id".to_string(), Value::Integer(2))].into_iter().collect();

        let rows = reopened.select_rows(query, &params, None).await.expect("select");
        let names: Vec<&str> = rows.iter().filter_map(|r| r.get_text("name")).collect();
        assert_eq!(names, vec!["bob", "carol"]);

        let limited = reopened
            .select_rows(query, &params, Some(1))
            .await
            .expect("limited select");
        assert_eq!(limited.len(), 1);

        let none = reopened
            .select_rows(query, &params, Some(0))
            .await
            .expect("zero limit");
        assert!(none.is_empty());
    }

    #[test]
    fn unconfigured_database_is_rejected() {
        let config = DatabaseConfig {
            url: None,
            filename: None,
        };
        assert!(matches!(
            DatabaseManager::new(&config),
            Err(DatabaseError::Connection(_))
        ));
    }

    #[test]
    fn url_prefix_is_stripped() {
        let config = DatabaseConfig {
            url: Some("sqlite:///var/lib/app/app.db".to_string()),
            filename: None,
        };
        let manager = DatabaseManager::new(&config).expect("db manager");
        assert_eq!(manager.path(), "/var/lib/app/app.db");
    }
}
