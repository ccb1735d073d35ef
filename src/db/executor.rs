use diesel::connection::{DefaultLoadingMode, SimpleConnection};
use diesel::prelude::*;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{BigInt, Integer, Nullable, Text};
use diesel::sqlite::{Sqlite, SqliteConnection};
use tracing::{debug, info};

use super::{DatabaseError, Params, Row, Value};
use crate::catalog::Catalog;
use crate::query::{Column, ColumnType, QueryKind, QuerySpec, placeholders};

const ENCODED_COLUMN: &str = "encoded_row";

type BoundQuery = BoxedSqlQuery<'static, Sqlite, SqlQuery>;

/// Receives select rows as they are stepped.
pub trait RowHandler {
    /// Returns false to stop the scan.
    fn on_row(&mut self, row: &Row) -> bool;

    /// Called once when the scan runs to completion or fails, but not after
    /// `on_row` has stopped it.
    fn on_finish(&mut self, _status: Result<(), &DatabaseError>) {}
}

impl<F> RowHandler for F
where
    F: FnMut(&Row) -> bool,
{
    fn on_row(&mut self, row: &Row) -> bool {
        self(row)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOutcome {
    /// Rows handed to the handler.
    pub rows: usize,
    /// The handler asked to stop before the last row.
    pub stopped: bool,
}

// Rows come back as one JSON array per row so any declared column list can be
// loaded through a single `QueryableByName` shape.
#[derive(QueryableByName)]
struct EncodedRow {
    #[diesel(sql_type = Text)]
    encoded_row: String,
}

#[derive(QueryableByName)]
struct TableName {
    #[diesel(sql_type = Text)]
    #[allow(dead_code)]
    name: String,
}

pub struct QueryExecutor<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> QueryExecutor<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub fn select<H: RowHandler + ?Sized>(
        &mut self,
        spec: &QuerySpec,
        params: &Params,
        handler: &mut H,
    ) -> Result<SelectOutcome, DatabaseError> {
        let result = self.stream_rows(spec, params, handler);
        match &result {
            Ok(outcome) if outcome.stopped => {}
            Ok(_) => handler.on_finish(Ok(())),
            Err(err) => handler.on_finish(Err(err)),
        }
        result
    }

    fn stream_rows<H: RowHandler + ?Sized>(
        &mut self,
        spec: &QuerySpec,
        params: &Params,
        handler: &mut H,
    ) -> Result<SelectOutcome, DatabaseError> {
        expect_kind(spec, |kind| kind == QueryKind::Select)?;

        let columns = spec.def.columns();
        let projection = format!(
            "json_array({}) AS {ENCODED_COLUMN}",
            columns
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let query = prepare(&spec.def.select_sql(&projection), &spec.def.parameters(), params)?;

        debug!(query = %spec.name, "running select");
        let mut outcome = SelectOutcome {
            rows: 0,
            stopped: false,
        };
        for encoded in query.load_iter::<EncodedRow, DefaultLoadingMode>(&mut *self.conn)? {
            let row = decode_row(columns, &encoded?.encoded_row)?;
            outcome.rows += 1;
            if !handler.on_row(&row) {
                outcome.stopped = true;
                break;
            }
        }
        Ok(outcome)
    }

    /// Runs an insert, update, delete or create-table query and returns the
    /// number of affected rows.
    pub fn execute(&mut self, spec: &QuerySpec, params: &Params) -> Result<usize, DatabaseError> {
        expect_kind(spec, |kind| kind != QueryKind::Select)?;

        if spec.def.kind() == QueryKind::CreateTable {
            check_unknown(params, &[])?;
            self.conn.batch_execute(&spec.def.sql())?;
            debug!(query = %spec.name, "created table");
            return Ok(0);
        }

        let query = prepare(&spec.def.sql(), &spec.def.parameters(), params)?;
        let affected = query.execute(&mut *self.conn)?;
        debug!(query = %spec.name, affected, "executed query");
        Ok(affected)
    }

    pub fn table_exists(&mut self, table: &str) -> Result<bool, DatabaseError> {
        let found = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind::<Text, _>(table)
        .load::<TableName>(&mut *self.conn)?;
        Ok(!found.is_empty())
    }

    /// Creates the table of every create-table query whose table is missing.
    /// Returns the names of the tables created.
    pub fn migrate(&mut self, catalog: &Catalog) -> Result<Vec<String>, DatabaseError> {
        let mut created = Vec::new();
        for spec in catalog
            .iter()
            .filter(|q| q.def.kind() == QueryKind::CreateTable)
        {
            let Some(table) = spec.def.table_name() else {
                continue;
            };
            if self.table_exists(table)? {
                debug!(table, "table already exists");
                continue;
            }
            self.execute(spec, &Params::new())
                .map_err(|e| DatabaseError::Migration(format!("{}: {e}", spec.name)))?;
            info!(table, query = %spec.name, "created table");
            created.push(table.to_string());
        }
        Ok(created)
    }
}

fn expect_kind(spec: &QuerySpec, allowed: impl Fn(QueryKind) -> bool) -> Result<(), DatabaseError> {
    let kind = spec.def.kind();
    if allowed(kind) {
        Ok(())
    } else {
        Err(DatabaseError::WrongKind {
            query: spec.name.clone(),
            kind,
        })
    }
}

fn check_unknown(params: &Params, declared: &[Column]) -> Result<(), DatabaseError> {
    match params
        .keys()
        .find(|name| !declared.iter().any(|c| &c.name == *name))
    {
        Some(name) => Err(DatabaseError::UnknownParameter(name.clone())),
        None => Ok(()),
    }
}

/// Rewrites named placeholders and binds each occurrence in order.
fn prepare(sql: &str, declared: &[Column], params: &Params) -> Result<BoundQuery, DatabaseError> {
    check_unknown(params, declared)?;

    let (sql, names) = placeholders::positional(sql);
    let mut query = diesel::sql_query(sql).into_boxed::<Sqlite>();
    for name in names {
        let ty = declared
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.ty)
            .ok_or_else(|| DatabaseError::UnknownParameter(name.clone()))?;
        let value = params
            .get(&name)
            .ok_or_else(|| DatabaseError::MissingParameter(name.clone()))?;
        query = bind_value(query, &name, ty, value)?;
    }
    Ok(query)
}

fn bind_value(
    query: BoundQuery,
    name: &str,
    ty: ColumnType,
    value: &Value,
) -> Result<BoundQuery, DatabaseError> {
    Ok(match (ty, value) {
        (ColumnType::Integer, Value::Null) => query.bind::<Nullable<Integer>, _>(None::<i32>),
        (ColumnType::Int64, Value::Null) => query.bind::<Nullable<BigInt>, _>(None::<i64>),
        (ColumnType::Text, Value::Null) => query.bind::<Nullable<Text>, _>(None::<String>),
        (ColumnType::Integer, Value::Integer(v)) => query.bind::<Integer, _>(*v),
        (ColumnType::Int64, Value::Integer(v)) => query.bind::<BigInt, _>(i64::from(*v)),
        (ColumnType::Int64, Value::Int64(v)) => query.bind::<BigInt, _>(*v),
        (ColumnType::Text, Value::Text(v)) => query.bind::<Text, _>(v.clone()),
        (expected, found) => {
            return Err(DatabaseError::TypeMismatch {
                name: name.to_string(),
                expected,
                found: found.type_name(),
            });
        }
    })
}

fn decode_row(columns: &[Column], encoded: &str) -> Result<Row, DatabaseError> {
    let cells: Vec<serde_json::Value> =
        serde_json::from_str(encoded).map_err(|e| DatabaseError::Decode(e.to_string()))?;
    if cells.len() != columns.len() {
        return Err(DatabaseError::Decode(format!(
            "expected {} columns, got {}",
            columns.len(),
            cells.len()
        )));
    }

    columns
        .iter()
        .zip(cells)
        .map(|(column, cell)| Ok((column.name.clone(), decode_cell(column, cell)?)))
        .collect::<Result<Vec<_>, DatabaseError>>()
        .map(Row::new)
}

fn decode_cell(column: &Column, cell: serde_json::Value) -> Result<Value, DatabaseError> {
    use serde_json::Value as Json;

    let mismatch = |cell: &Json| {
        DatabaseError::Decode(format!(
            "column {} declared {} holds {cell}",
            column.name, column.ty
        ))
    };

    match (column.ty, cell) {
        (_, Json::Null) => Ok(Value::Null),
        (ColumnType::Text, Json::String(s)) => Ok(Value::Text(s)),
        (ColumnType::Text, Json::Number(n)) => Ok(Value::Text(n.to_string())),
        (ColumnType::Integer, cell) => integer_of(&cell)
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Integer)
            .ok_or_else(|| mismatch(&cell)),
        (ColumnType::Int64, cell) => integer_of(&cell)
            .map(Value::Int64)
            .ok_or_else(|| mismatch(&cell)),
        (ColumnType::Text, cell) => Err(mismatch(&cell)),
    }
}

// SQLite's type affinity lets an integer column hold numeric text.
fn integer_of(cell: &serde_json::Value) -> Option<i64> {
    match cell {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
