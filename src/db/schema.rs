//! Schema-introspecting persistence primitives.
//!
//! The upstream schema belongs to another system and evolves independently,
//! so inserts and updates filter the caller's field map down to the columns
//! that exist at call time. Column sets come from live catalog metadata on
//! every call; each statement reflects the schema at that instant.
//!
//! Statements are built only from identifiers that independently exist as
//! live column names, quoted and escaped. Caller text is never interpolated
//! into SQL; values travel as bound parameters.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

use crate::error::{Error, Result};

/// A value bound into a dynamically built statement.
#[derive(Debug, Clone)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
    Null,
}

impl SqlValue {
    fn bind_to<'q>(
        self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            SqlValue::Text(v) => query.bind(v),
            SqlValue::Int(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Timestamp(v) => query.bind(v),
            SqlValue::Json(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(v)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(v: serde_json::Value) -> Self {
        SqlValue::Json(v)
    }
}

/// Ordered field map for a dynamic insert or update. Caller order is
/// preserved in the built statement.
#[derive(Debug, Default)]
pub struct Fields {
    entries: Vec<(String, SqlValue)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn into_entries(self) -> Vec<(String, SqlValue)> {
        self.entries
    }
}

impl super::Db {
    /// Does the named table exist in the public schema right now?
    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                 SELECT 1 FROM information_schema.tables
                 WHERE table_schema = 'public' AND table_name = $1
             )",
        )
        .bind(table)
        .fetch_one(self.pool())
        .await?;
        Ok(row.0)
    }

    /// Live column set of the named table.
    pub async fn table_columns(&self, table: &str) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT column_name FROM information_schema.columns
             WHERE table_schema = 'public' AND table_name = $1",
        )
        .bind(table)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Insert the surviving fields into `table`, returning the generated id.
    ///
    /// Fields with no matching live column are discarded. Fails with
    /// `SchemaUnavailable` when the table is absent and `NoMatchingColumns`
    /// when nothing survives the filter.
    pub async fn insert_filtered(&self, table: &str, fields: Fields) -> Result<i64> {
        let columns = self.table_columns(table).await?;
        if columns.is_empty() {
            return Err(Error::SchemaUnavailable(table.to_string()));
        }

        let (surviving, dropped) = split_by_columns(fields.into_entries(), &columns);
        if !dropped.is_empty() {
            tracing::debug!(table, dropped = ?dropped, "discarded fields with no matching column");
        }
        if surviving.is_empty() {
            return Err(Error::NoMatchingColumns(table.to_string()));
        }

        let column_list = surviving
            .iter()
            .map(|(name, _)| quote_ident(name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=surviving.len())
            .map(|n| format!("${n}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({column_list}) VALUES ({placeholders}) RETURNING \"id\"::BIGINT",
            quote_ident(table)
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in surviving {
            query = value.bind_to(query);
        }
        let row = query.fetch_one(self.pool()).await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    /// Update `table` rows matching `predicate`, assigning the surviving
    /// fields. Returns the number of rows affected; zero surviving fields is
    /// a successful no-op.
    ///
    /// The predicate uses `?` placeholders for `args`; they are renumbered
    /// after the assignment parameters.
    pub async fn update_filtered(
        &self,
        table: &str,
        fields: Fields,
        predicate: &str,
        args: Vec<SqlValue>,
    ) -> Result<u64> {
        let columns = self.table_columns(table).await?;
        if columns.is_empty() {
            return Err(Error::SchemaUnavailable(table.to_string()));
        }

        let (surviving, dropped) = split_by_columns(fields.into_entries(), &columns);
        if !dropped.is_empty() {
            tracing::debug!(table, dropped = ?dropped, "discarded fields with no matching column");
        }
        if surviving.is_empty() {
            return Ok(0);
        }

        let assignments = surviving
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("{} = ${}", quote_ident(name), i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let where_sql = number_placeholders(predicate, surviving.len() + 1);
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {where_sql}",
            quote_ident(table)
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in surviving {
            query = value.bind_to(query);
        }
        for value in args {
            query = value.bind_to(query);
        }
        Ok(query.execute(self.pool()).await?.rows_affected())
    }
}

/// Split a field list into (surviving, dropped-names) against a live column
/// set.
fn split_by_columns(
    entries: Vec<(String, SqlValue)>,
    columns: &HashSet<String>,
) -> (Vec<(String, SqlValue)>, Vec<String>) {
    let mut surviving = Vec::with_capacity(entries.len());
    let mut dropped = Vec::new();
    for (name, value) in entries {
        if columns.contains(&name) {
            surviving.push((name, value));
        } else {
            dropped.push(name);
        }
    }
    (surviving, dropped)
}

/// Quote an identifier for Postgres. Only called on names verified against
/// the live catalog, but escaped regardless.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Rewrite `?` placeholders in a predicate to `$n`, numbering from `start`.
fn number_placeholders(predicate: &str, start: usize) -> String {
    let mut out = String::with_capacity(predicate.len() + 4);
    let mut n = start;
    for ch in predicate.chars() {
        if ch == '?' {
            out.push('$');
            out.push_str(&n.to_string());
            n += 1;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_only_live_columns_in_order() {
        let columns: HashSet<String> = ["a".to_string(), "b".to_string()].into();
        let fields = Fields::new()
            .set("a", 1i64)
            .set("unknown_field", 3i64)
            .set("b", 2i64);
        let (surviving, dropped) = split_by_columns(fields.into_entries(), &columns);
        let names: Vec<_> = surviving.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(dropped, vec!["unknown_field".to_string()]);
    }

    #[test]
    fn quote_ident_escapes_embedded_quotes() {
        assert_eq!(quote_ident("state"), "\"state\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn placeholders_are_renumbered_after_assignments() {
        assert_eq!(number_placeholders("id = ?", 5), "id = $5");
        assert_eq!(
            number_placeholders("id = ? AND state = ?", 3),
            "id = $3 AND state = $4"
        );
        assert_eq!(number_placeholders("deleted IS NULL", 2), "deleted IS NULL");
    }
}
