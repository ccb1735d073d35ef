use super::GeneratorOptions;
use super::writer::{CodeWriter, escape_c};
use crate::query::{Column, QueryDef, QuerySpec};

pub(super) fn emit_query(out: &mut CodeWriter, query: &QuerySpec, options: &GeneratorOptions) {
    match &query.def {
        QueryDef::Select { .. } => emit_select(out, query, options),
        QueryDef::Insert { .. } | QueryDef::Update { .. } => {
            emit_modify(out, query, options);
            emit_with_model(out, query, options);
        }
        QueryDef::Delete { .. } => emit_modify(out, query, options),
        QueryDef::CreateTable { .. } => emit_create_table(out, query, options),
    }
}

fn param_decl(column: &Column) -> String {
    format!("{} {}", column.ty.cpp_type(), column.name)
}

fn signature(
    options: &GeneratorOptions,
    ret: &str,
    name: &str,
    params: &[String],
) -> String {
    let terminator = if options.declarations_only { ";" } else { "" };
    format!(
        "{}{ret} {name}({}){terminator}",
        options.prefix,
        params.join(", ")
    )
}

fn open_statement(out: &mut CodeWriter, options: &GeneratorOptions) {
    let stmt = &options.statement;
    out.line(1, format!("sqlite3_stmt *{stmt} = NULL;"));
    out.line(
        1,
        format!("scoped_exit ensure_finalize(&{stmt}); // sqlite3_finalize({stmt})"),
    );
    out.blank();
}

fn prepare_line(options: &GeneratorOptions, sql: &str) -> String {
    format!(
        "int r = sqlite3_prepare_v2(db, \"{}\", {}, &{}, NULL);",
        escape_c(sql),
        sql.len(),
        options.statement
    )
}

fn emit_binds(out: &mut CodeWriter, options: &GeneratorOptions, params: &[Column]) {
    if params.is_empty() {
        return;
    }
    let stmt = &options.statement;
    for param in params {
        let index = format!("sqlite3_bind_parameter_index({stmt}, \":{}\")", param.name);
        out.line(1, param.ty.bind_stmt(stmt, &index, &param.name));
    }
    out.blank();
}

fn emit_select(out: &mut CodeWriter, query: &QuerySpec, options: &GeneratorOptions) {
    let binds = query.def.parameters();
    let bind_params: Vec<String> = binds.iter().map(param_decl).collect();

    let mut params = vec!["sqlite3 *db".to_string()];
    params.extend(bind_params.iter().cloned());
    params.push("Handler handler".to_string());
    out.line(0, "template <typename Handler>");
    out.line(0, signature(options, "void", &query.name, &params));
    if !options.declarations_only {
        emit_select_body(out, query, options, &binds, SelectTarget::Columns);
    }

    let mut params = vec!["sqlite3 *db".to_string(), "Model& m".to_string()];
    params.extend(bind_params);
    params.push("Handler handler".to_string());
    out.line(0, "template <typename Model, typename Handler>");
    out.line(0, signature(options, "void", &query.name, &params));
    if !options.declarations_only {
        emit_select_body(out, query, options, &binds, SelectTarget::Model);
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SelectTarget {
    Columns,
    Model,
}

fn emit_select_body(
    out: &mut CodeWriter,
    query: &QuerySpec,
    options: &GeneratorOptions,
    binds: &[Column],
    target: SelectTarget,
) {
    let stmt = &options.statement;
    let columns = query.def.columns();

    out.line(0, "{");
    open_statement(out, options);
    out.line(1, prepare_line(options, &query.def.sql()));
    out.line(1, "if (r != SQLITE_OK) {");
    out.line(2, "handler(r);");
    out.line(2, "return;");
    out.line(1, "}");
    out.blank();
    emit_binds(out, options, binds);

    out.line(1, "while (1) {");
    out.line(2, format!("r = sqlite3_step({stmt});"));
    out.line(2, "if (r == SQLITE_ROW) {");
    for (idx, column) in columns.iter().enumerate() {
        out.line(
            3,
            format!(
                "{} {} = {};",
                column.ty.cpp_type(),
                column.name,
                column.ty.column_expr(stmt, idx)
            ),
        );
    }
    let call = match target {
        SelectTarget::Columns => {
            let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
            format!("if (! handler(r, {}))", names.join(", "))
        }
        SelectTarget::Model => {
            for column in columns {
                out.line(3, format!("m.{0} = {0};", column.name));
            }
            "if (! handler(r, &m))".to_string()
        }
    };
    out.line(3, call);
    out.line(4, "break;");
    out.line(2, "} else {");
    out.line(3, "handler(r);");
    out.line(3, "break;");
    out.line(2, "}");
    out.line(1, "}");
    out.line(0, "}");
    out.blank();
}

fn emit_modify(out: &mut CodeWriter, query: &QuerySpec, options: &GeneratorOptions) {
    let parameters = query.def.parameters();
    let mut params = vec!["sqlite3 *db".to_string()];
    params.extend(parameters.iter().map(param_decl));

    out.line(0, signature(options, "int", &query.name, &params));
    if options.declarations_only {
        return;
    }

    out.line(0, "{");
    open_statement(out, options);
    out.line(1, prepare_line(options, &query.def.sql()));
    out.line(1, "if (r != SQLITE_OK)");
    out.line(2, "return r;");
    out.blank();
    emit_binds(out, options, &parameters);
    out.line(1, format!("r = sqlite3_step({});", options.statement));
    out.line(1, "return r;");
    out.line(0, "}");
    out.blank();
}

fn emit_with_model(out: &mut CodeWriter, query: &QuerySpec, options: &GeneratorOptions) {
    let name = format!("{}_with_model", query.name);
    let params = ["sqlite3 *db".to_string(), "Model const& m".to_string()];

    out.line(0, "template <typename Model>");
    out.line(0, signature(options, "int", &name, &params));
    if options.declarations_only {
        return;
    }

    let mut args = vec!["db".to_string()];
    args.extend(
        query
            .def
            .parameters()
            .iter()
            .map(|p| format!("m.{}", p.name)),
    );
    out.line(0, "{");
    out.line(1, format!("return {}({});", query.name, args.join(", ")));
    out.line(0, "}");
    out.blank();
}

fn emit_create_table(out: &mut CodeWriter, query: &QuerySpec, options: &GeneratorOptions) {
    let params = ["sqlite3 *db".to_string(), "char **errmsg".to_string()];
    out.line(0, signature(options, "int", &query.name, &params));
    if options.declarations_only {
        return;
    }

    out.line(0, "{");
    out.line(1, "const char *sql = \"\"");
    for line in query.def.create_table_lines() {
        out.line(2, format!("\"{}\\n\"", escape_c(&line)));
    }
    out.line(2, ";");
    out.blank();
    out.line(1, "int r = sqlite3_exec(db, sql, NULL, NULL, errmsg);");
    out.line(1, "return r;");
    out.line(0, "}");
    out.blank();
}
