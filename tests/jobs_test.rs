mod common;

use serde_json::json;
use stobridge::db::jobs::JobStatus;

#[tokio::test]
#[ignore] // Requires running Postgres
async fn enqueue_bootstraps_table_and_records_queued_job() {
    let db = common::test_db().await;

    // Start from a missing table to exercise the lazy bootstrap.
    sqlx::query("DROP TABLE IF EXISTS integration_job")
        .execute(db.pool())
        .await
        .unwrap();

    let payload = json!({
        "payment_type": "refund",
        "customer_id": "CUST-1",
        "amount": 42.5
    });
    let job_id = db
        .enqueue_job("create_payment", payload.clone())
        .await
        .unwrap();
    assert!(job_id > 0);

    let job = db.job(job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.job_type, "create_payment");
    assert_eq!(job.payload, payload);
    assert!(job.error.is_none());

    // Table persists; a second enqueue gets a fresh id.
    let next_id = db
        .enqueue_job("create_customer_invoice", json!({"order_number": "ORD-9"}))
        .await
        .unwrap();
    assert!(next_id > job_id);
}
