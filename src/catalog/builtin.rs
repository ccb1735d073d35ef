use crate::query::{Column, QueryDef, QuerySpec};

pub(super) fn queries() -> Vec<QuerySpec> {
    vec![
        QuerySpec::new(
            "query_something",
            QueryDef::select(vec![Column::int("id"), Column::text("name")])
                .with_sql("FROM users WHERE id=:id", vec![Column::int("id")]),
        ),
        QuerySpec::new(
            "query_something2",
            QueryDef::select(vec![Column::int("id"), Column::text("name")])
                .with_sql("FROM users2 WHERE id=:id", vec![Column::int("id")]),
        ),
        QuerySpec::new(
            "insert_something",
            QueryDef::insert(vec![Column::int("id"), Column::text("name")]).table("XXX"),
        ),
        QuerySpec::new(
            "update_something",
            QueryDef::update(vec![Column::int("id"), Column::text("name")])
                .table("XXX")
                .with_sql(
                    "WHERE id=:id AND type=:type",
                    vec![Column::int("id"), Column::int("type")],
                ),
        ),
        QuerySpec::new(
            "delete_something",
            QueryDef::delete().table("XXX").with_sql(
                "WHERE id=:id AND type=:type",
                vec![Column::int("id"), Column::int("type")],
            ),
        ),
        QuerySpec::new(
            "create_table_something",
            QueryDef::create_table(vec![Column::int("id"), Column::text("name")]).table("XXX"),
        ),
    ]
}
