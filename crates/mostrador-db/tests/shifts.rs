//! Integration tests for the shift lifecycle and cash reconciliation.

mod common;

use std::sync::Arc;

use common::{seed_product, test_db, test_db_on_disk};
use mostrador_core::{Cart, CashEntry, PaymentMethod, ShiftStatus};
use mostrador_db::{CheckoutError, ShiftError};

#[tokio::test]
async fn only_one_shift_open_at_a_time() {
    let db = test_db().await;

    let first = db.shifts().open(5_000).await.unwrap();
    assert!(first.is_open());

    let err = db.shifts().open(1_000).await.unwrap_err();
    match err {
        ShiftError::AlreadyOpen { shift_id } => assert_eq!(shift_id, first.id),
        other => panic!("expected AlreadyOpen, got {other:?}"),
    }

    // Closing frees the slot for the next shift.
    db.shifts().close(5_000).await.unwrap();
    let second = db.shifts().open(2_000).await.unwrap();
    assert_ne!(second.id, first.id);
}

#[tokio::test]
async fn close_without_open_shift_fails() {
    let db = test_db().await;

    let err = db.shifts().close(0).await.unwrap_err();
    assert!(matches!(err, ShiftError::NoOpenShift));

    // Double close: the second call finds nothing open.
    db.shifts().open(0).await.unwrap();
    db.shifts().close(0).await.unwrap();
    let err = db.shifts().close(0).await.unwrap_err();
    assert!(matches!(err, ShiftError::NoOpenShift));
}

#[tokio::test]
async fn negative_cash_amounts_are_rejected() {
    let db = test_db().await;

    assert!(matches!(
        db.shifts().open(-1).await.unwrap_err(),
        ShiftError::NegativeCash { amount_cents: -1 }
    ));

    db.shifts().open(0).await.unwrap();
    assert!(matches!(
        db.shifts().close(-500).await.unwrap_err(),
        ShiftError::NegativeCash { .. }
    ));
}

#[tokio::test]
async fn close_reconciles_opening_cash_sales_and_manual_entries() {
    let db = test_db().await;
    let coke = seed_product(&db, "COKE-330", 800, 10).await;

    let shift = db.shifts().open(10_000).await.unwrap();

    // One sale of 800
    let mut cart = Cart::new();
    cart.add(&coke).unwrap();
    db.checkout()
        .finalize_sale(&cart, Some(&shift), "u1", "Ana", PaymentMethod::Cash, 0)
        .await
        .unwrap();

    // Manual deposit of 2000 and withdrawal of 500
    db.cash()
        .append(&CashEntry::deposit(&shift.id, 2_000, Some("change fund".into())))
        .await
        .unwrap();
    db.cash()
        .append(&CashEntry::withdrawal(&shift.id, 500, Some("courier tip".into())))
        .await
        .unwrap();

    assert_eq!(db.cash().sum_for_shift(&shift.id).await.unwrap(), 2_300);
    assert_eq!(
        db.cash()
            .sum_for_shift_by_category(&shift.id, "sale")
            .await
            .unwrap(),
        800
    );

    // expected = 10000 + 800 + 2000 - 500 = 12300; drawer counted 12250
    let close = db.shifts().close(12_250).await.unwrap();
    assert_eq!(close.expected_cash_cents, 12_300);
    assert_eq!(close.counted_cash_cents, 12_250);
    assert_eq!(close.discrepancy_cents, -50);

    assert_eq!(close.shift.status, ShiftStatus::Closed);
    assert!(close.shift.closed_at.is_some());
    assert_eq!(close.shift.closing_cash_cents, Some(12_250));
}

#[tokio::test(flavor = "multi_thread")]
async fn close_never_omits_a_committed_sale_from_expected_cash() {
    // Race a checkout against the close on a multi-connection pool. The
    // close must account for every entry that actually landed in the
    // shift, whichever side wins the write lock.
    let db = Arc::new(test_db_on_disk().await);
    let item = seed_product(&db, "RACE-1", 700, 50).await;
    let shift = db.shifts().open(1_000).await.unwrap();

    let mut cart = Cart::new();
    cart.add(&item).unwrap();

    let (db_sale, shift_sale) = (Arc::clone(&db), shift.clone());
    let sale_task = tokio::spawn(async move {
        db_sale
            .checkout()
            .finalize_sale(&cart, Some(&shift_sale), "u1", "Ana", PaymentMethod::Cash, 0)
            .await
    });

    let close = db.shifts().close(1_000).await.unwrap();
    let sale_result = sale_task.await.unwrap();

    let journal_sum = db.cash().sum_for_shift(&shift.id).await.unwrap();
    assert_eq!(close.expected_cash_cents, 1_000 + journal_sum);

    match sale_result {
        // Sale won the lock: its entry is in the journal and in expected.
        Ok(_) => assert_eq!(journal_sum, 700),
        // Close won the lock: the sale saw the closed shift and wrote nothing.
        Err(CheckoutError::ShiftNotOpen) => assert_eq!(journal_sum, 0),
        Err(other) => panic!("unexpected checkout failure: {other:?}"),
    }
}

#[tokio::test]
async fn closed_shift_is_terminal_and_queryable() {
    let db = test_db().await;

    let shift = db.shifts().open(1_000).await.unwrap();
    db.shifts().close(1_000).await.unwrap();

    assert!(db.shifts().current_open().await.unwrap().is_none());

    let reread = db.shifts().get_by_id(&shift.id).await.unwrap().unwrap();
    assert_eq!(reread.status, ShiftStatus::Closed);
    assert_eq!(reread.opening_cash_cents, 1_000);

    let recent = db.shifts().list_recent(10).await.unwrap();
    assert_eq!(recent.len(), 1);
}

#[tokio::test]
async fn cash_journal_preserves_append_order() {
    let db = test_db().await;
    let shift = db.shifts().open(0).await.unwrap();

    db.cash()
        .append(&CashEntry::deposit(&shift.id, 100, None))
        .await
        .unwrap();
    db.cash()
        .append(&CashEntry::withdrawal(&shift.id, 30, None))
        .await
        .unwrap();
    db.cash()
        .append(&CashEntry::deposit(&shift.id, 7, None))
        .await
        .unwrap();

    let entries = db.cash().list_for_shift(&shift.id).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].amount_cents, 100);
    assert_eq!(entries[1].amount_cents, 30);
    assert_eq!(entries[2].amount_cents, 7);
    assert_eq!(
        entries.iter().map(|e| e.signed_amount_cents()).sum::<i64>(),
        77
    );
}
