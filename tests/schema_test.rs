mod common;

use stobridge::db::schema::{Fields, SqlValue};
use stobridge::error::Error;

#[tokio::test]
#[ignore] // Requires running Postgres
async fn insert_keeps_only_live_columns() {
    let db = common::test_db().await;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS scratch_widget (id BIGSERIAL PRIMARY KEY, a BIGINT, b BIGINT)",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let id = db
        .insert_filtered(
            "scratch_widget",
            Fields::new()
                .set("a", 1i64)
                .set("b", 2i64)
                .set("unknown_field", 3i64),
        )
        .await
        .unwrap();
    assert!(id > 0);

    let row: (Option<i64>, Option<i64>) =
        sqlx::query_as("SELECT a, b FROM scratch_widget WHERE id = $1")
            .bind(id)
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(row, (Some(1), Some(2)));
}

#[tokio::test]
#[ignore] // Requires running Postgres
async fn insert_with_only_unknown_fields_fails() {
    let db = common::test_db().await;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS scratch_widget (id BIGSERIAL PRIMARY KEY, a BIGINT, b BIGINT)",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let result = db
        .insert_filtered(
            "scratch_widget",
            Fields::new().set("nope", 1i64).set("also_nope", 2i64),
        )
        .await;
    assert!(
        matches!(result, Err(Error::NoMatchingColumns(ref t)) if t == "scratch_widget"),
        "expected NoMatchingColumns, got {result:?}"
    );
}

#[tokio::test]
#[ignore] // Requires running Postgres
async fn insert_into_missing_table_fails() {
    let db = common::test_db().await;
    let result = db
        .insert_filtered("definitely_absent_table", Fields::new().set("a", 1i64))
        .await;
    assert!(
        matches!(result, Err(Error::SchemaUnavailable(_))),
        "expected SchemaUnavailable, got {result:?}"
    );
}

#[tokio::test]
#[ignore] // Requires running Postgres
async fn update_with_no_surviving_fields_is_a_noop() {
    let db = common::test_db().await;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS scratch_widget (id BIGSERIAL PRIMARY KEY, a BIGINT, b BIGINT)",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let rows = db
        .update_filtered(
            "scratch_widget",
            Fields::new().set("ghost_column", 9i64),
            "id = ?",
            vec![SqlValue::Int(1)],
        )
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

#[tokio::test]
#[ignore] // Requires running Postgres
async fn update_binds_predicate_params_after_assignments() {
    let db = common::test_db().await;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS scratch_widget (id BIGSERIAL PRIMARY KEY, a BIGINT, b BIGINT)",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let id = db
        .insert_filtered(
            "scratch_widget",
            Fields::new().set("a", 1i64).set("b", 77i64),
        )
        .await
        .unwrap();

    let rows = db
        .update_filtered(
            "scratch_widget",
            Fields::new().set("a", 10i64).set("missing", 0i64),
            "id = ? AND b = ?",
            vec![SqlValue::Int(id), SqlValue::Int(77)],
        )
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let row: (Option<i64>,) = sqlx::query_as("SELECT a FROM scratch_widget WHERE id = $1")
        .bind(id)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(row.0, Some(10));
}
