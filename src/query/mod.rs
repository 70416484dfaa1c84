//! Read-only SQL queries over the tracker and notebook database
//!
//! Queries are parsed with `sqlparser` (SQLite dialect) before they reach
//! SQLite, so only a single `SELECT` statement is ever executed. Results are
//! returned as JSON cells: text holding a JSON object or array is decoded,
//! which keeps `json_extract` output and whole parameter columns structured.
//!
//! References:
//! - sqlparser-rs: <https://docs.rs/sqlparser>
//! - SQLite JSON functions: <https://www.sqlite.org/json1.html>

use minijinja::{context, Environment};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use crate::tracker::Logged;
use crate::{Error, Result};

const TABLE_TEMPLATE: &str = r#"<table class="skeval-query">
<thead><tr>{% for column in columns %}<th>{{ column }}</th>{% endfor %}</tr></thead>
<tbody>
{% for row in rows %}<tr>{% for cell in row %}<td>{{ cell }}</td>{% endfor %}</tr>
{% endfor %}</tbody>
</table>"#;

/// Check that `sql` is exactly one `SELECT` statement.
///
/// # Errors
///
/// Returns error if the SQL does not parse, holds several statements, or
/// is not a query.
///
/// # Example
/// ```
/// use skeval::query::validate_select;
///
/// assert!(validate_select("SELECT uuid FROM experiments").is_ok());
/// assert!(validate_select("DELETE FROM experiments").is_err());
/// ```
pub fn validate_select(sql: &str) -> Result<()> {
    let statements = Parser::parse_sql(&SQLiteDialect {}, sql)?;
    match statements.as_slice() {
        [Statement::Query(query)] if is_read_only(query) => Ok(()),
        [] => Err(Error::ReadOnlyQuery("empty query".to_string())),
        [_] => Err(Error::ReadOnlyQuery(sql.trim().to_string())),
        _ => Err(Error::ReadOnlyQuery(format!(
            "{} statements (send one SELECT at a time)",
            statements.len()
        ))),
    }
}

/// A query whose body and CTEs only read: `WITH ... UPDATE` also parses as
/// a query.
fn is_read_only(query: &Query) -> bool {
    let ctes_read_only = query
        .with
        .as_ref()
        .map_or(true, |with| with.cte_tables.iter().all(|cte| is_read_only(&cte.query)));
    ctes_read_only && is_read_only_body(&query.body)
}

fn is_read_only_body(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(_) | SetExpr::Values(_) | SetExpr::Table(_) => true,
        SetExpr::Query(query) => is_read_only(query),
        SetExpr::SetOperation { left, right, .. } => {
            is_read_only_body(left) && is_read_only_body(right)
        }
        _ => false,
    }
}

/// Rows returned by a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// Column names in select order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows of JSON cells.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the query returned no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column.
    ///
    /// # Errors
    ///
    /// Returns error if the column does not exist.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let index = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::NotFound(format!("column '{name}'")))?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Rows as JSON objects keyed by column name.
    #[must_use]
    pub fn to_records(&self) -> Vec<serde_json::Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    /// Render as an HTML table.
    ///
    /// With `render_plots`, cells holding logged figures or plot dumps are
    /// drawn inline; otherwise they show as JSON text.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render.
    pub fn to_html(&self, render_plots: bool) -> Result<String> {
        let rows: Vec<Vec<minijinja::Value>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| render_cell(cell, render_plots)).collect())
            .collect();

        let mut env = Environment::new();
        env.add_template("table.html", TABLE_TEMPLATE)?;
        let html = env
            .get_template("table.html")?
            .render(context! { columns => &self.columns, rows => rows })?;
        Ok(html)
    }
}

fn render_cell(cell: &Value, render_plots: bool) -> minijinja::Value {
    match cell {
        Value::Null => minijinja::Value::from(""),
        Value::String(s) => minijinja::Value::from(s.as_str()),
        Value::Object(_) if render_plots => match Logged::from_value(cell.clone()) {
            Logged::Value(v) => minijinja::Value::from(v.to_string()),
            plot => minijinja::Value::from_safe_string(plot.to_html()),
        },
        other => minijinja::Value::from(other.to_string()),
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::from(n),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            let trimmed = text.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                if let Ok(json) = serde_json::from_str(&text) {
                    return json;
                }
            }
            Value::String(text.into_owned())
        }
        ValueRef::Blob(bytes) => Value::String(format!("<{} bytes>", bytes.len())),
    }
}

/// Validate and run `sql`, collecting every row.
///
/// # Errors
///
/// Returns error if the query is not a single `SELECT` or SQLite rejects it.
pub fn run(conn: &Connection, sql: &str) -> Result<QueryResult> {
    validate_select(sql)?;
    let mut stmt = conn.prepare(sql)?;
    if !stmt.readonly() {
        return Err(Error::ReadOnlyQuery(sql.trim().to_string()));
    }
    let columns: Vec<String> = stmt.column_names().iter().map(ToString::to_string).collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(to_json(row.get_ref(i)?));
        }
        rows.push(values);
    }

    tracing::debug!(rows = rows.len(), "query finished");
    Ok(QueryResult { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id TEXT, n REAL, p TEXT);
             INSERT INTO t VALUES ('a', 1.5, '{\"x\": 1}');
             INSERT INTO t VALUES ('b', NULL, 'plain');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_validate_rejects_writes() {
        assert!(validate_select("SELECT 1").is_ok());
        assert!(matches!(
            validate_select("DROP TABLE t"),
            Err(Error::ReadOnlyQuery(_))
        ));
        assert!(matches!(
            validate_select("SELECT 1; DELETE FROM t"),
            Err(Error::ReadOnlyQuery(_))
        ));
    }

    #[test]
    fn test_validate_rejects_cte_writes() {
        for sql in [
            "WITH x AS (SELECT 1) UPDATE t SET id = 'z'",
            "WITH x AS (SELECT 1) INSERT INTO t VALUES ('c', 2.0, '')",
        ] {
            assert!(
                matches!(validate_select(sql), Err(Error::ReadOnlyQuery(_))),
                "{sql} should be rejected"
            );
        }
        assert!(validate_select("WITH x AS (SELECT 1 AS a) SELECT a FROM x").is_ok());
        assert!(validate_select("SELECT 1 UNION SELECT 2").is_ok());
    }

    #[test]
    fn test_validate_syntax_error() {
        assert!(matches!(validate_select("SELEC 1"), Err(Error::Sql(_))));
    }

    #[test]
    fn test_run_decodes_json_text() {
        let result = run(&conn(), "SELECT id, n, p FROM t ORDER BY id").unwrap();
        assert_eq!(result.columns(), &["id", "n", "p"]);
        assert_eq!(result.rows()[0][2], serde_json::json!({"x": 1}));
        assert_eq!(result.rows()[1][1], Value::Null);
        assert_eq!(result.rows()[1][2], Value::String("plain".into()));
    }

    #[test]
    fn test_run_json_extract() {
        let result = run(&conn(), "SELECT json_extract(p, '$.x') AS x FROM t WHERE id = 'a'").unwrap();
        assert_eq!(result.column("x").unwrap(), vec![&serde_json::json!(1)]);
    }

    #[test]
    fn test_to_html_escapes() {
        let result = QueryResult {
            columns: vec!["c".into()],
            rows: vec![vec![Value::String("<b>".into())]],
        };
        let html = result.to_html(false).unwrap();
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains("<th>c</th>"));
    }
}
