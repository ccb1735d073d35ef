use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[serde(alias = "int")]
    Integer,
    #[serde(alias = "bigint")]
    Int64,
    Text,
}

impl ColumnType {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "INT",
            ColumnType::Int64 => "BIGINT",
            ColumnType::Text => "TEXT",
        }
    }

    pub fn cpp_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "int",
            ColumnType::Int64 => "int64_t",
            ColumnType::Text => "const char *",
        }
    }

    /// Expression reading result column `idx` of `stmt`.
    pub fn column_expr(self, stmt: &str, idx: usize) -> String {
        match self {
            ColumnType::Integer => format!("sqlite3_column_int({stmt}, {idx})"),
            ColumnType::Int64 => format!("sqlite3_column_int64({stmt}, {idx})"),
            ColumnType::Text => format!(
                "reinterpret_cast<{}>(sqlite3_column_text({stmt}, {idx}))",
                self.cpp_type()
            ),
        }
    }

    /// Statement binding `value` to the parameter at index expression `idx`.
    pub fn bind_stmt(self, stmt: &str, idx: &str, value: &str) -> String {
        match self {
            ColumnType::Integer => format!("sqlite3_bind_int({stmt}, {idx}, {value});"),
            ColumnType::Int64 => format!("sqlite3_bind_int64({stmt}, {idx}, {value});"),
            ColumnType::Text => format!("sqlite3_bind_text({stmt}, {idx}, {value}, -1, NULL);"),
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sql_type())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    pub fn int64(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Int64)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::{Column, ColumnType};

    #[test_case(ColumnType::Integer, "INT", "int")]
    #[test_case(ColumnType::Int64, "BIGINT", "int64_t")]
    #[test_case(ColumnType::Text, "TEXT", "const char *")]
    fn type_names(ty: ColumnType, sql: &str, cpp: &str) {
        assert_eq!(ty.sql_type(), sql);
        assert_eq!(ty.cpp_type(), cpp);
    }

    #[test]
    fn column_readers_use_the_matching_sqlite_call() {
        assert_eq!(
            ColumnType::Integer.column_expr("stmt", 0),
            "sqlite3_column_int(stmt, 0)"
        );
        assert_eq!(
            ColumnType::Int64.column_expr("stmt", 2),
            "sqlite3_column_int64(stmt, 2)"
        );
        assert_eq!(
            ColumnType::Text.column_expr("stmt", 1),
            "reinterpret_cast<const char *>(sqlite3_column_text(stmt, 1))"
        );
    }

    #[test]
    fn text_binding_is_static_and_nul_terminated() {
        assert_eq!(
            ColumnType::Text.bind_stmt("stmt", "3", "name"),
            "sqlite3_bind_text(stmt, 3, name, -1, NULL);"
        );
    }

    #[test]
    fn yaml_type_spellings() {
        let cols: Vec<Column> = serde_yaml::from_str(
            "- { name: a, type: int }\n- { name: b, type: integer }\n- { name: c, type: bigint }\n- { name: d, type: int64 }\n- { name: e, type: text }\n",
        )
        .expect("parse columns");
        let types: Vec<ColumnType> = cols.iter().map(|c| c.ty).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Integer,
                ColumnType::Integer,
                ColumnType::Int64,
                ColumnType::Int64,
                ColumnType::Text,
            ]
        );
    }
}
