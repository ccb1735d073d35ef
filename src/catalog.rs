use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::query::QuerySpec;

pub use self::validator::CatalogError;

mod builtin;
mod validator;

/// An ordered set of named queries. Generation and listing follow this order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Catalog {
    #[serde(default)]
    queries: Vec<QuerySpec>,
}

impl Catalog {
    pub fn new(queries: Vec<QuerySpec>) -> Result<Self, CatalogError> {
        let catalog = Self { queries };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn builtin() -> Self {
        Self {
            queries: builtin::queries(),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_yaml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading query catalog");
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Loads `path` when given, the built-in catalog otherwise.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn get(&self, name: &str) -> Option<&QuerySpec> {
        self.queries.iter().find(|q| q.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuerySpec> {
        self.queries.iter()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::{Catalog, CatalogError};
    use crate::query::{Column, QueryDef, QueryKind, QuerySpec};

    const USERS_CATALOG: &str = r#"
queries:
  - name: create_users
    kind: create_table
    table: users
    columns:
      - { name: id, type: int }
      - { name: name, type: text }
      - { name: score, type: bigint }
  - name: users_by_id
    kind: select
    columns:
      - { name: id, type: int }
      - { name: name, type: text }
    sql: "FROM users WHERE id=:id"
    binds:
      - { name: id, type: int }
"#;

    #[test]
    fn builtin_catalog_is_valid_and_ordered() {
        let catalog = Catalog::builtin();
        catalog.validate().expect("builtin catalog validates");

        let names: Vec<&str> = catalog.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "query_something",
                "query_something2",
                "insert_something",
                "update_something",
                "delete_something",
                "create_table_something",
            ]
        );
    }

    #[test]
    fn builtin_query_something_takes_one_integer() {
        let catalog = Catalog::builtin();
        let query = catalog.get("query_something").expect("query_something");
        assert_eq!(query.def.kind(), QueryKind::Select);
        assert_eq!(query.def.parameters(), vec![Column::int("id")]);
        assert_eq!(query.def.sql(), "SELECT id, name FROM users WHERE id=:id");
    }

    #[test]
    fn yaml_catalog_keeps_declaration_order() {
        let catalog = Catalog::from_yaml_str(USERS_CATALOG).expect("parse catalog");
        assert_eq!(catalog.len(), 2);
        let kinds: Vec<QueryKind> = catalog.iter().map(|q| q.def.kind()).collect();
        assert_eq!(kinds, vec![QueryKind::CreateTable, QueryKind::Select]);
        assert_eq!(
            catalog.get("create_users").expect("create_users").def.columns()[2],
            Column::int64("score")
        );
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = NamedTempFile::new().expect("temp catalog");
        file.write_all(USERS_CATALOG.as_bytes()).expect("write catalog");

        let catalog = Catalog::load(file.path()).expect("load catalog");
        assert!(catalog.get("users_by_id").is_some());
    }

    #[test]
    fn load_reports_the_missing_path() {
        let err = Catalog::load("/definitely/not/here.yaml").expect_err("missing file");
        match err {
            CatalogError::Io { path, .. } => assert!(path.contains("not/here.yaml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let err = Catalog::from_yaml_str("queries:\n  - name: x\n    kind: upsert\n")
            .expect_err("unknown kind");
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn yaml_round_trip_preserves_the_builtin_catalog() {
        let builtin = Catalog::builtin();
        let yaml = serde_yaml::to_string(&builtin).expect("serialize");
        let parsed = Catalog::from_yaml_str(&yaml).expect("reparse");
        assert_eq!(parsed, builtin);
    }

    #[test]
    fn new_rejects_invalid_queries() {
        let err = Catalog::new(vec![QuerySpec::new(
            "bad",
            QueryDef::select(vec![Column::int("id")]).with_sql("FROM t WHERE id=:id", vec![]),
        )])
        .expect_err("undeclared placeholder");
        assert!(err.to_string().contains("bad"));
    }
}
