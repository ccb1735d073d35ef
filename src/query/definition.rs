use serde::{Deserialize, Serialize};

use super::Column;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    CreateTable,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Select => "select",
            QueryKind::Insert => "insert",
            QueryKind::Update => "update",
            QueryKind::Delete => "delete",
            QueryKind::CreateTable => "create_table",
        }
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declarative query. `sql` holds the clause that follows the generated head
/// (`FROM ...` for selects, `WHERE ...` for updates and deletes).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryDef {
    Select {
        columns: Vec<Column>,
        #[serde(default)]
        sql: String,
        #[serde(default)]
        binds: Vec<Column>,
    },
    Insert {
        #[serde(default)]
        table: String,
        columns: Vec<Column>,
    },
    Update {
        #[serde(default)]
        table: String,
        columns: Vec<Column>,
        #[serde(default)]
        sql: String,
        #[serde(default)]
        binds: Vec<Column>,
    },
    Delete {
        #[serde(default)]
        table: String,
        #[serde(default)]
        sql: String,
        #[serde(default)]
        binds: Vec<Column>,
    },
    CreateTable {
        #[serde(default)]
        table: String,
        columns: Vec<Column>,
    },
}

impl QueryDef {
    pub fn select(columns: Vec<Column>) -> Self {
        QueryDef::Select {
            columns,
            sql: String::new(),
            binds: Vec::new(),
        }
    }

    pub fn insert(columns: Vec<Column>) -> Self {
        QueryDef::Insert {
            table: String::new(),
            columns,
        }
    }

    pub fn update(columns: Vec<Column>) -> Self {
        QueryDef::Update {
            table: String::new(),
            columns,
            sql: String::new(),
            binds: Vec::new(),
        }
    }

    pub fn delete() -> Self {
        QueryDef::Delete {
            table: String::new(),
            sql: String::new(),
            binds: Vec::new(),
        }
    }

    pub fn create_table(columns: Vec<Column>) -> Self {
        QueryDef::CreateTable {
            table: String::new(),
            columns,
        }
    }

    /// Sets the target table. Selects name their source in the trailing clause instead.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        match &mut self {
            QueryDef::Insert { table, .. }
            | QueryDef::Update { table, .. }
            | QueryDef::Delete { table, .. }
            | QueryDef::CreateTable { table, .. } => *table = name.into(),
            QueryDef::Select { .. } => {}
        }
        self
    }

    /// Sets the trailing clause and the parameters it binds. Inserts and table
    /// creation have no trailing clause and are returned unchanged.
    pub fn with_sql(mut self, tail: impl Into<String>, bind: Vec<Column>) -> Self {
        match &mut self {
            QueryDef::Select { sql, binds, .. }
            | QueryDef::Update { sql, binds, .. }
            | QueryDef::Delete { sql, binds, .. } => {
                *sql = tail.into();
                *binds = bind;
            }
            QueryDef::Insert { .. } | QueryDef::CreateTable { .. } => {}
        }
        self
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            QueryDef::Select { .. } => QueryKind::Select,
            QueryDef::Insert { .. } => QueryKind::Insert,
            QueryDef::Update { .. } => QueryKind::Update,
            QueryDef::Delete { .. } => QueryKind::Delete,
            QueryDef::CreateTable { .. } => QueryKind::CreateTable,
        }
    }

    pub fn table_name(&self) -> Option<&str> {
        match self {
            QueryDef::Insert { table, .. }
            | QueryDef::Update { table, .. }
            | QueryDef::Delete { table, .. }
            | QueryDef::CreateTable { table, .. } => Some(table),
            QueryDef::Select { .. } => None,
        }
    }

    pub fn columns(&self) -> &[Column] {
        match self {
            QueryDef::Select { columns, .. }
            | QueryDef::Insert { columns, .. }
            | QueryDef::Update { columns, .. }
            | QueryDef::CreateTable { columns, .. } => columns,
            QueryDef::Delete { .. } => &[],
        }
    }

    pub fn binds(&self) -> &[Column] {
        match self {
            QueryDef::Select { binds, .. }
            | QueryDef::Update { binds, .. }
            | QueryDef::Delete { binds, .. } => binds,
            QueryDef::Insert { .. } | QueryDef::CreateTable { .. } => &[],
        }
    }

    pub fn tail(&self) -> &str {
        match self {
            QueryDef::Select { sql, .. }
            | QueryDef::Update { sql, .. }
            | QueryDef::Delete { sql, .. } => sql,
            QueryDef::Insert { .. } | QueryDef::CreateTable { .. } => "",
        }
    }

    /// Arguments a caller supplies, in generated parameter order.
    pub fn parameters(&self) -> Vec<Column> {
        match self {
            QueryDef::Select { binds, .. } | QueryDef::Delete { binds, .. } => binds.clone(),
            QueryDef::Insert { columns, .. } => columns.clone(),
            QueryDef::Update { columns, binds, .. } => {
                let mut params = columns.clone();
                for bind in binds {
                    if !params.iter().any(|p| p.name == bind.name) {
                        params.push(bind.clone());
                    }
                }
                params
            }
            QueryDef::CreateTable { .. } => Vec::new(),
        }
    }

    /// Full statement text with named placeholders.
    pub fn sql(&self) -> String {
        match self {
            QueryDef::Select { columns, .. } => self.select_sql(&column_list(columns)),
            QueryDef::Insert { table, columns } => format!(
                "INSERT INTO {}({}) VALUES ({})",
                table,
                column_list(columns),
                columns
                    .iter()
                    .map(|c| format!(":{}", c.name))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            QueryDef::Update {
                table,
                columns,
                sql,
                ..
            } => {
                let assignments = columns
                    .iter()
                    .map(|c| format!("{0}=:{0}", c.name))
                    .collect::<Vec<_>>()
                    .join(", ");
                with_tail(format!("UPDATE {table} SET {assignments}"), sql)
            }
            QueryDef::Delete { table, sql, .. } => with_tail(format!("DELETE FROM {table}"), sql),
            QueryDef::CreateTable { .. } => self
                .create_table_lines()
                .iter()
                .map(|line| format!("{line}\n"))
                .collect(),
        }
    }

    /// A select with its column list replaced by `projection`.
    pub fn select_sql(&self, projection: &str) -> String {
        with_tail(format!("SELECT {projection}"), self.tail())
    }

    /// `CREATE TABLE` text, one entry per source line.
    pub fn create_table_lines(&self) -> Vec<String> {
        let QueryDef::CreateTable { table, columns } = self else {
            return Vec::new();
        };

        let mut lines = vec![format!("CREATE TABLE {table} (")];
        for (i, column) in columns.iter().enumerate() {
            let lead = if i == 0 { ' ' } else { ',' };
            lines.push(format!("{lead}   {} {}", column.name, column.ty.sql_type()));
        }
        lines.push(")".to_string());
        lines
    }
}

fn column_list(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn with_tail(head: String, tail: &str) -> String {
    let tail = tail.trim();
    if tail.is_empty() {
        head
    } else {
        format!("{head} {tail}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuerySpec {
    pub name: String,
    #[serde(flatten)]
    pub def: QueryDef,
}

impl QuerySpec {
    pub fn new(name: impl Into<String>, def: QueryDef) -> Self {
        Self {
            name: name.into(),
            def,
        }
    }
}
