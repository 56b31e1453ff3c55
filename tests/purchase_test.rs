mod common;

use std::sync::Arc;

use stobridge::error::Error;
use stobridge::transfer::TransferService;

#[tokio::test]
#[ignore] // Requires running Postgres
async fn empty_batch_is_rejected_before_any_lookup() {
    let db = Arc::new(common::test_db().await);
    let service = TransferService::new(db);

    let result = service.purchase_state(&[]).await;
    assert!(
        matches!(result, Err(Error::Validation(_))),
        "expected Validation, got {result:?}"
    );
}

#[tokio::test]
#[ignore] // Requires running Postgres
async fn missing_reference_does_not_abort_the_batch() {
    let db = Arc::new(common::test_db().await);
    let service = TransferService::new(db);

    let batch = vec![
        common::PO_APPROVED.to_string(),
        "PO-MISSING-XYZ".to_string(),
        common::PO_DRAFT.to_string(),
    ];
    let results = service.purchase_state(&batch).await.unwrap();

    assert_eq!(results.len(), 3);
    // Result order mirrors input order.
    assert_eq!(results[0].po_number, common::PO_APPROVED);
    assert!(results[0].approved);
    assert_eq!(results[1].po_number, "PO-MISSING-XYZ");
    assert!(!results[1].approved);
    assert!(results[1].message.contains("PO-MISSING-XYZ"));
    assert_eq!(results[2].po_number, common::PO_DRAFT);
    assert!(!results[2].approved);
}
