//! Integration tests for the sale-finalization transaction.
//!
//! Every test runs against a fresh in-memory SQLite database with the
//! real migrations applied, so the schema constraints are exercised too.

mod common;

use std::sync::Arc;

use common::{seed_product, stock_of, test_db, test_db_on_disk};
use mostrador_core::{Cart, CashEntryType, CoreError, PaymentMethod, CASH_CATEGORY_SALE};
use mostrador_db::CheckoutError;

#[tokio::test]
async fn finalize_commits_sale_lines_stock_and_cash_together() {
    let db = test_db().await;
    let coke = seed_product(&db, "COKE-330", 150, 10).await;
    let chips = seed_product(&db, "CHIPS-01", 250, 4).await;
    let shift = db.shifts().open(10_000).await.unwrap();

    let mut cart = Cart::new();
    cart.add(&coke).unwrap();
    cart.set_quantity(&coke.id, 3).unwrap();
    cart.add(&chips).unwrap();

    let committed = db
        .checkout()
        .finalize_sale(&cart, Some(&shift), "u1", "Ana", PaymentMethod::Cash, 0)
        .await
        .unwrap();

    // Totals: 3 * 150 + 1 * 250
    assert_eq!(committed.sale.subtotal_cents, 700);
    assert_eq!(committed.sale.discount_cents, 0);
    assert_eq!(committed.sale.total_cents, 700);
    assert_eq!(committed.sale.shift_id, shift.id);
    assert_eq!(committed.sale.user_name, "Ana");

    // Lines preserve cart insertion order via line_no
    assert_eq!(committed.lines.len(), 2);
    assert_eq!(committed.lines[0].line_no, 1);
    assert_eq!(committed.lines[0].product_id, coke.id);
    assert_eq!(committed.lines[0].quantity, 3);
    assert_eq!(committed.lines[0].line_total_cents, 450);
    assert_eq!(committed.lines[1].line_no, 2);
    assert_eq!(committed.lines[1].product_id, chips.id);

    // Stock decremented
    assert_eq!(stock_of(&db, &coke.id).await, 7);
    assert_eq!(stock_of(&db, &chips.id).await, 3);

    // Exactly one cash entry, equal to the sale total
    let entries = db.cash().list_for_shift(&shift.id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].entry_type, CashEntryType::Income);
    assert_eq!(entries[0].category, CASH_CATEGORY_SALE);
    assert_eq!(entries[0].amount_cents, 700);
    assert_eq!(
        entries[0].description.as_deref(),
        Some(format!("Sale {}", committed.sale.sale_number).as_str())
    );

    // The sale reads back by id and by number
    let reread = db.sales().get_by_id(&committed.sale.id).await.unwrap();
    assert!(reread.is_some());
    let by_number = db
        .sales()
        .get_by_number(&committed.sale.sale_number)
        .await
        .unwrap();
    assert_eq!(by_number.unwrap().id, committed.sale.id);

    let lines = db.sales().get_lines(&committed.sale.id).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].line_no, 1);
}

#[tokio::test]
async fn empty_cart_is_rejected_before_any_write() {
    let db = test_db().await;
    let shift = db.shifts().open(0).await.unwrap();

    let cart = Cart::new();
    let err = db
        .checkout()
        .finalize_sale(&cart, Some(&shift), "u1", "Ana", PaymentMethod::Cash, 0)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Invalid(CoreError::EmptyCart)
    ));
    assert!(db.cash().list_for_shift(&shift.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn finalize_without_open_shift_writes_nothing() {
    let db = test_db().await;
    let coke = seed_product(&db, "COKE-330", 150, 10).await;

    let mut cart = Cart::new();
    cart.add(&coke).unwrap();

    // No shift at all
    let err = db
        .checkout()
        .finalize_sale(&cart, None, "u1", "Ana", PaymentMethod::Cash, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::ShiftNotOpen));

    // A shift snapshot that has since been closed in the database
    let shift = db.shifts().open(0).await.unwrap();
    db.shifts().close(0).await.unwrap();

    let err = db
        .checkout()
        .finalize_sale(&cart, Some(&shift), "u1", "Ana", PaymentMethod::Cash, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::ShiftNotOpen));

    assert_eq!(stock_of(&db, &coke.id).await, 10);
}

#[tokio::test]
async fn discount_beyond_subtotal_is_rejected() {
    let db = test_db().await;
    let coke = seed_product(&db, "COKE-330", 150, 10).await;
    let shift = db.shifts().open(0).await.unwrap();

    let mut cart = Cart::new();
    cart.add(&coke).unwrap();

    for bad_discount in [-1, 151] {
        let err = db
            .checkout()
            .finalize_sale(
                &cart,
                Some(&shift),
                "u1",
                "Ana",
                PaymentMethod::Cash,
                bad_discount,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Invalid(CoreError::InvalidDiscount { .. })
        ));
    }

    assert_eq!(stock_of(&db, &coke.id).await, 10);
    assert!(db.cash().list_for_shift(&shift.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn discount_flows_into_total_and_cash_entry() {
    let db = test_db().await;
    let coke = seed_product(&db, "COKE-330", 500, 10).await;
    let shift = db.shifts().open(0).await.unwrap();

    let mut cart = Cart::new();
    cart.add(&coke).unwrap();
    cart.set_quantity(&coke.id, 2).unwrap();

    let committed = db
        .checkout()
        .finalize_sale(&cart, Some(&shift), "u1", "Ana", PaymentMethod::Card, 300)
        .await
        .unwrap();

    assert_eq!(committed.sale.subtotal_cents, 1000);
    assert_eq!(committed.sale.discount_cents, 300);
    assert_eq!(committed.sale.total_cents, 700);
    assert_eq!(committed.cash_entry.amount_cents, 700);
    assert_eq!(committed.cash_entry.payment_method, PaymentMethod::Card);
}

#[tokio::test]
async fn stock_conflict_rolls_back_earlier_decrements() {
    let db = test_db().await;
    let plenty = seed_product(&db, "PLENTY", 100, 50).await;
    let scarce = seed_product(&db, "SCARCE", 100, 5).await;
    let shift = db.shifts().open(0).await.unwrap();

    let mut cart = Cart::new();
    cart.add(&plenty).unwrap();
    cart.set_quantity(&plenty.id, 10).unwrap();
    cart.add(&scarce).unwrap();
    cart.set_quantity(&scarce.id, 5).unwrap();

    // Another terminal takes 3 units of the scarce product first.
    {
        let other = db.shifts().current_open().await.unwrap().unwrap();
        let mut other_cart = Cart::new();
        other_cart.add(&scarce).unwrap();
        other_cart.set_quantity(&scarce.id, 3).unwrap();
        db.checkout()
            .finalize_sale(
                &other_cart,
                Some(&other),
                "u2",
                "Bea",
                PaymentMethod::Cash,
                0,
            )
            .await
            .unwrap();
    }

    let err = db
        .checkout()
        .finalize_sale(&cart, Some(&shift), "u1", "Ana", PaymentMethod::Cash, 0)
        .await
        .unwrap_err();

    match err {
        CheckoutError::StockConflict { shortages } => {
            assert_eq!(shortages.len(), 1);
            assert_eq!(shortages[0].product_id, scarce.id);
            assert_eq!(shortages[0].requested, 5);
            assert_eq!(shortages[0].available, 2);
        }
        other => panic!("expected StockConflict, got {other:?}"),
    }

    // The plenty decrement was rolled back with everything else.
    assert_eq!(stock_of(&db, &plenty.id).await, 50);
    assert_eq!(stock_of(&db, &scarce.id).await, 2);

    // Only the first terminal's sale exists.
    let entries = db.cash().list_for_shift(&shift.id).await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_finalize_has_exactly_one_winner() {
    let db = Arc::new(test_db().await);
    let item = seed_product(&db, "LAST-5", 100, 5).await;
    let shift = db.shifts().open(0).await.unwrap();

    // Both carts want 3 of the 5 remaining units; only one can win.
    let mut cart_a = Cart::new();
    cart_a.add(&item).unwrap();
    cart_a.set_quantity(&item.id, 3).unwrap();
    let cart_b = cart_a.clone();

    let (db_a, shift_a) = (Arc::clone(&db), shift.clone());
    let (db_b, shift_b) = (Arc::clone(&db), shift.clone());

    let task_a = tokio::spawn(async move {
        db_a.checkout()
            .finalize_sale(&cart_a, Some(&shift_a), "u1", "Ana", PaymentMethod::Cash, 0)
            .await
    });
    let task_b = tokio::spawn(async move {
        db_b.checkout()
            .finalize_sale(&cart_b, Some(&shift_b), "u2", "Bea", PaymentMethod::Cash, 0)
            .await
    });

    let result_a = task_a.await.unwrap();
    let result_b = task_b.await.unwrap();

    let wins = [&result_a, &result_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one of the two sales must commit");

    let loser = if result_a.is_err() { result_a } else { result_b };
    assert!(matches!(
        loser.unwrap_err(),
        CheckoutError::StockConflict { .. }
    ));

    // 5 - 3, never negative, never double-decremented.
    assert_eq!(stock_of(&db, &item.id).await, 2);

    let entries = db.cash().list_for_shift(&shift.id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount_cents, 300);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_finalize_on_multi_connection_pool_has_one_winner() {
    // File-backed with the production pool size: the two checkouts contend
    // across real connections, not just on pool acquisition.
    let db = Arc::new(test_db_on_disk().await);
    let item = seed_product(&db, "LAST-5", 100, 5).await;
    let shift = db.shifts().open(0).await.unwrap();

    let mut cart_a = Cart::new();
    cart_a.add(&item).unwrap();
    cart_a.set_quantity(&item.id, 3).unwrap();
    let cart_b = cart_a.clone();

    let (db_a, shift_a) = (Arc::clone(&db), shift.clone());
    let (db_b, shift_b) = (Arc::clone(&db), shift.clone());

    let task_a = tokio::spawn(async move {
        db_a.checkout()
            .finalize_sale(&cart_a, Some(&shift_a), "u1", "Ana", PaymentMethod::Cash, 0)
            .await
    });
    let task_b = tokio::spawn(async move {
        db_b.checkout()
            .finalize_sale(&cart_b, Some(&shift_b), "u2", "Bea", PaymentMethod::Cash, 0)
            .await
    });

    let result_a = task_a.await.unwrap();
    let result_b = task_b.await.unwrap();

    let wins = [&result_a, &result_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one of the two sales must commit");

    // The loser sees a stock conflict, never a lock error.
    let loser = if result_a.is_err() { result_a } else { result_b };
    assert!(matches!(
        loser.unwrap_err(),
        CheckoutError::StockConflict { .. }
    ));

    assert_eq!(stock_of(&db, &item.id).await, 2);
    let entries = db.cash().list_for_shift(&shift.id).await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_sales_of_distinct_products_both_commit() {
    let db = Arc::new(test_db_on_disk().await);
    let first = seed_product(&db, "ITEM-A", 100, 10).await;
    let second = seed_product(&db, "ITEM-B", 200, 10).await;
    let shift = db.shifts().open(0).await.unwrap();

    let mut cart_a = Cart::new();
    cart_a.add(&first).unwrap();
    let mut cart_b = Cart::new();
    cart_b.add(&second).unwrap();

    let (db_a, shift_a) = (Arc::clone(&db), shift.clone());
    let (db_b, shift_b) = (Arc::clone(&db), shift.clone());

    let task_a = tokio::spawn(async move {
        db_a.checkout()
            .finalize_sale(&cart_a, Some(&shift_a), "u1", "Ana", PaymentMethod::Cash, 0)
            .await
    });
    let task_b = tokio::spawn(async move {
        db_b.checkout()
            .finalize_sale(&cart_b, Some(&shift_b), "u2", "Bea", PaymentMethod::Cash, 0)
            .await
    });

    // No shared stock: database write-lock contention alone must never
    // fail a sale, only delay it.
    task_a.await.unwrap().unwrap();
    task_b.await.unwrap().unwrap();

    assert_eq!(stock_of(&db, &first.id).await, 9);
    assert_eq!(stock_of(&db, &second.id).await, 9);
    let entries = db.cash().list_for_shift(&shift.id).await.unwrap();
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn catalog_reads_do_not_mutate_stock() {
    let db = test_db().await;
    let coke = seed_product(&db, "COKE-330", 150, 10).await;

    let first = db.products().search("Test", 50).await.unwrap();
    let second = db.products().search("Test", 50).await.unwrap();

    assert_eq!(first.len(), second.len());
    assert_eq!(first[0].stock, second[0].stock);
    assert_eq!(stock_of(&db, &coke.id).await, 10);
}

#[tokio::test]
async fn sales_report_reads_back_committed_sales() {
    let db = test_db().await;
    let coke = seed_product(&db, "COKE-330", 150, 10).await;
    let shift = db.shifts().open(0).await.unwrap();

    let mut cart = Cart::new();
    cart.add(&coke).unwrap();
    db.checkout()
        .finalize_sale(&cart, Some(&shift), "u1", "Ana", PaymentMethod::Qr, 0)
        .await
        .unwrap();

    let for_shift = db.sales().list_for_shift(&shift.id).await.unwrap();
    assert_eq!(for_shift.len(), 1);
    assert_eq!(for_shift[0].payment_method, PaymentMethod::Qr);

    assert_eq!(db.sales().total_for_shift(&shift.id).await.unwrap(), 150);

    let from = chrono::Utc::now() - chrono::Duration::hours(1);
    let to = chrono::Utc::now() + chrono::Duration::hours(1);
    let windowed = db.sales().list_between(from, to).await.unwrap();
    assert_eq!(windowed.len(), 1);
}
