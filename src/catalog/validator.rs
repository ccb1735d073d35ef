use std::collections::HashSet;

use thiserror::Error;

use super::Catalog;
use crate::query::{
    Column, GENERATED_NAMES, QueryDef, QueryKind, QuerySpec, is_cpp_identifier, placeholders,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid query {query}: {reason}")]
    Invalid { query: String, reason: String },
}

fn invalid(query: &QuerySpec, reason: impl Into<String>) -> CatalogError {
    CatalogError::Invalid {
        query: query.name.clone(),
        reason: reason.into(),
    }
}

impl Catalog {
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for query in &self.queries {
            if !seen.insert(query.name.as_str()) {
                return Err(invalid(query, "duplicate query name"));
            }
            validate_query(query)?;
        }
        Ok(())
    }

    /// Rejects parameters and columns that would shadow the statement local
    /// when it is renamed away from the default.
    pub fn check_statement_name(&self, statement: &str) -> Result<(), CatalogError> {
        for query in &self.queries {
            let clash = query
                .def
                .columns()
                .iter()
                .chain(query.def.binds())
                .find(|c| c.name == statement);
            if let Some(column) = clash {
                return Err(invalid(
                    query,
                    format!("{} clashes with the generated statement name", column.name),
                ));
            }
        }
        Ok(())
    }
}

fn validate_query(query: &QuerySpec) -> Result<(), CatalogError> {
    if !is_cpp_identifier(&query.name) {
        return Err(invalid(query, "query name must be a C identifier"));
    }

    if let Some(table) = query.def.table_name() {
        if !is_cpp_identifier(table) {
            return Err(invalid(
                query,
                format!("table name {table:?} must be a C identifier"),
            ));
        }
    }

    let kind = query.def.kind();
    if kind != QueryKind::Delete && query.def.columns().is_empty() {
        return Err(invalid(query, format!("{kind} needs at least one column")));
    }
    check_names(query, "column", query.def.columns())?;
    check_names(query, "bind", query.def.binds())?;

    if let QueryDef::Select { sql, .. } = &query.def {
        if !placeholders::has_keyword(sql, "FROM") {
            return Err(invalid(query, "select needs a FROM clause"));
        }
    }

    if let QueryDef::Update { columns, binds, .. } = &query.def {
        for bind in binds {
            if let Some(column) = columns.iter().find(|c| c.name == bind.name) {
                if column.ty != bind.ty {
                    return Err(invalid(
                        query,
                        format!(
                            "{} is bound as {} but assigned as {}",
                            bind.name, bind.ty, column.ty
                        ),
                    ));
                }
            }
        }
    }

    check_placeholders(query)
}

fn check_names(query: &QuerySpec, what: &str, columns: &[Column]) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for column in columns {
        if !is_cpp_identifier(&column.name) {
            return Err(invalid(
                query,
                format!("{what} name {:?} must be a C identifier", column.name),
            ));
        }
        if GENERATED_NAMES.contains(&column.name.as_str()) {
            return Err(invalid(
                query,
                format!("{what} name {} is used by the generated code", column.name),
            ));
        }
        if !seen.insert(column.name.as_str()) {
            return Err(invalid(query, format!("duplicate {what} {}", column.name)));
        }
    }
    Ok(())
}

fn check_placeholders(query: &QuerySpec) -> Result<(), CatalogError> {
    let used = placeholders::distinct_names(query.def.tail());
    let binds = query.def.binds();

    for name in &used {
        if !binds.iter().any(|b| &b.name == name) {
            return Err(invalid(query, format!(":{name} is not a declared bind")));
        }
    }
    for bind in binds {
        if !used.contains(&bind.name) {
            return Err(invalid(
                query,
                format!("bind {} is never used in the sql clause", bind.name),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::CatalogError;
    use crate::catalog::Catalog;
    use crate::query::{Column, QueryDef, QuerySpec};

    fn reason(def: QueryDef) -> String {
        match Catalog::new(vec![QuerySpec::new("q", def)]) {
            Err(CatalogError::Invalid { reason, .. }) => reason,
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("definition unexpectedly valid"),
        }
    }

    #[test]
    fn declared_bind_must_appear_in_sql() {
        let r = reason(
            QueryDef::select(vec![Column::int("id")])
                .with_sql("FROM users", vec![Column::int("id")]),
        );
        assert!(r.contains("never used"), "{r}");
    }

    #[test]
    fn placeholder_must_be_declared() {
        let r = reason(
            QueryDef::delete()
                .table("t")
                .with_sql("WHERE id=:id AND type=:type", vec![Column::int("id")]),
        );
        assert_eq!(r, ":type is not a declared bind");
    }

    #[test]
    fn select_needs_a_source() {
        let r = reason(QueryDef::select(vec![Column::int("id")]));
        assert!(r.contains("FROM"), "{r}");
    }

    #[test]
    fn select_tail_without_from_is_rejected() {
        let r = reason(
            QueryDef::select(vec![Column::int("id")])
                .with_sql("WHERE id=:id", vec![Column::int("id")]),
        );
        assert_eq!(r, "select needs a FROM clause");
    }

    #[test]
    fn quoted_from_does_not_count_as_a_source() {
        let r = reason(
            QueryDef::select(vec![Column::text("note")]).with_sql("WHERE note = 'from'", vec![]),
        );
        assert_eq!(r, "select needs a FROM clause");
    }

    #[test_case("db"; "connection")]
    #[test_case("r"; "status")]
    #[test_case("stmt"; "statement")]
    #[test_case("handler"; "handler")]
    #[test_case("m"; "model")]
    #[test_case("sql"; "sql text")]
    #[test_case("errmsg"; "error message")]
    #[test_case("ensure_finalize"; "finalizer")]
    #[test_case("Handler"; "handler template")]
    #[test_case("Model"; "model template")]
    fn generated_names_cannot_be_columns(name: &str) {
        let r = reason(
            QueryDef::select(vec![Column::int(name)]).with_sql("FROM t", vec![]),
        );
        assert_eq!(r, format!("column name {name} is used by the generated code"));
    }

    #[test_case("r"; "status")]
    #[test_case("stmt"; "statement")]
    #[test_case("db"; "connection")]
    fn generated_names_cannot_be_binds(name: &str) {
        let r = reason(
            QueryDef::delete()
                .table("t")
                .with_sql(format!("WHERE id=:{name}"), vec![Column::int(name)]),
        );
        assert_eq!(r, format!("bind name {name} is used by the generated code"));
    }

    #[test]
    fn renamed_statement_cannot_shadow_a_parameter() {
        let catalog = Catalog::new(vec![QuerySpec::new(
            "by_query",
            QueryDef::delete()
                .table("t")
                .with_sql("WHERE query=:query", vec![Column::int("query")]),
        )])
        .expect("valid with the default statement name");

        catalog
            .check_statement_name("stmt")
            .expect("no clash with the default");
        let err = catalog
            .check_statement_name("query")
            .expect_err("bind shadows the statement");
        assert!(
            err.to_string().contains("query clashes with the generated statement name"),
            "{err}"
        );
    }

    #[test]
    fn insert_needs_columns() {
        let r = reason(QueryDef::insert(vec![]).table("t"));
        assert_eq!(r, "insert needs at least one column");
    }

    #[test]
    fn delete_may_have_no_columns() {
        Catalog::new(vec![QuerySpec::new("wipe", QueryDef::delete().table("t"))])
            .expect("delete without columns is valid");
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let r = reason(
            QueryDef::create_table(vec![Column::int("id"), Column::text("id")]).table("t"),
        );
        assert_eq!(r, "duplicate column id");
    }

    #[test]
    fn keywords_cannot_name_columns() {
        let r = reason(QueryDef::insert(vec![Column::int("class")]).table("t"));
        assert!(r.contains("class"), "{r}");
    }

    #[test]
    fn table_names_must_be_identifiers() {
        let r = reason(QueryDef::create_table(vec![Column::int("id")]).table("my table"));
        assert!(r.contains("my table"), "{r}");
    }

    #[test]
    fn missing_table_is_rejected() {
        let r = reason(QueryDef::insert(vec![Column::int("id")]));
        assert!(r.contains("table name"), "{r}");
    }

    #[test]
    fn update_column_and_bind_types_must_agree() {
        let r = reason(
            QueryDef::update(vec![Column::text("id")])
                .table("t")
                .with_sql("WHERE id=:id", vec![Column::int("id")]),
        );
        assert!(r.contains("bound as INT"), "{r}");
    }

    #[test]
    fn query_names_are_unique() {
        let def = QueryDef::delete().table("t");
        let err = Catalog::new(vec![
            QuerySpec::new("wipe", def.clone()),
            QuerySpec::new("wipe", def),
        ])
        .expect_err("duplicate");
        match err {
            CatalogError::Invalid { query, reason } => {
                assert_eq!(query, "wipe");
                assert_eq!(reason, "duplicate query name");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn query_names_must_be_identifiers() {
        let err = Catalog::new(vec![QuerySpec::new("drop-all", QueryDef::delete().table("t"))])
            .expect_err("bad name");
        assert!(err.to_string().contains("drop-all"));
    }
}
