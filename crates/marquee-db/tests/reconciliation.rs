//! End-to-end reconciliation scenarios against an in-memory database.
//!
//! These walk the full paths an operator takes - order creation, discount,
//! schedule generation, payment toggles, bundle insertion and partial
//! returns - and check the money/quantity invariants after every step.

use marquee_core::installment::PaidRemovalPolicy;
use marquee_core::returns::{ReturnRequest, ReturnRequestItem};
use marquee_core::{
    BundleItem, CoreError, Discount, Money, NewInstallment, Order, Percent, ReturnStatus,
};
use marquee_db::{Database, DbConfig, DbError};

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

fn assert_due_invariant(order: &Order) {
    assert_eq!(
        order.amount_due_cents,
        (order.final_amount_cents - order.amount_paid_cents).max(0),
        "amount_due must always equal max(0, final - paid)"
    );
}

/// Order of 10,000 cents gross with a 10% discount: final 9,000, schedule
/// of three exact 3,000 installments, paying the first leaves 6,000 due.
#[tokio::test]
async fn discounted_order_scheduled_and_paid() {
    let db = test_db().await;

    let mut order = db.orders().create("Ana Souza", "ana").await.unwrap();
    order.add_item("Mesa Redonda", 2, Money::from_cents(5_000)).unwrap();
    order
        .set_discount(Discount::Percentage(Percent::from_percentage(10.0)))
        .unwrap();
    db.orders().save(&mut order, "ana").await.unwrap();

    let loaded = db.orders().load(order.order_number).await.unwrap();
    assert_eq!(loaded.gross_total_cents, 10_000);
    assert_eq!(loaded.discount_cents, 1_000);
    assert_eq!(loaded.final_amount_cents, 9_000);
    assert_due_invariant(&loaded);

    let schedule = db
        .installments()
        .generate_schedule(&order.id, 3, "ana")
        .await
        .unwrap();
    let amounts: Vec<i64> = schedule.iter().map(|i| i.amount_cents).collect();
    assert_eq!(amounts, vec![3_000, 3_000, 3_000]);

    db.installments()
        .toggle_payment(&schedule[0].id, "ana")
        .await
        .unwrap();

    let reloaded = db.orders().load(order.order_number).await.unwrap();
    assert_eq!(reloaded.amount_paid_cents, 3_000);
    assert_eq!(reloaded.amount_due_cents, 6_000);
    assert_due_invariant(&reloaded);
}

/// Kit A {X:2, Y:1} at 3,000 cents: shared unit price 1,000; inserting
/// twice merges into one row per product with summed quantities at the
/// frozen unit price.
#[tokio::test]
async fn bundle_kit_a_pricing_and_double_insertion() {
    let db = test_db().await;

    let bundle = db
        .bundles()
        .create(
            "Kit A",
            None,
            3_000,
            vec![
                BundleItem {
                    product_name: "X".to_string(),
                    quantity: 2,
                },
                BundleItem {
                    product_name: "Y".to_string(),
                    quantity: 1,
                },
            ],
        )
        .await
        .unwrap();

    let order = db.orders().create("Bruno Lima", "ana").await.unwrap();

    let once = db
        .bundles()
        .add_to_order(order.order_number, &bundle.id, "ana")
        .await
        .unwrap();
    let x = once.items.iter().find(|i| i.name == "X").unwrap();
    let y = once.items.iter().find(|i| i.name == "Y").unwrap();
    assert_eq!((x.quantity, x.total_cents), (2, 2_000));
    assert_eq!((y.quantity, y.total_cents), (1, 1_000));
    assert_eq!(once.gross_total_cents, 3_000);

    let twice = db
        .bundles()
        .add_to_order(order.order_number, &bundle.id, "ana")
        .await
        .unwrap();
    assert_eq!(twice.items.len(), 2);
    let x = twice.items.iter().find(|i| i.name == "X").unwrap();
    assert_eq!((x.quantity, x.unit_price_cents, x.total_cents), (4, 1_000, 4_000));
    assert_eq!(twice.gross_total_cents, 6_000);
    assert_due_invariant(&twice);
}

/// Ordered 5 Toalhas, returned 3: pending is 2, and trying to return 3
/// more fails with the conflict carrying the live ceiling.
#[tokio::test]
async fn toalha_return_ceiling_conflict() {
    let db = test_db().await;

    let mut order = db.orders().create("Carla Dias", "ana").await.unwrap();
    order.add_item("Toalha", 5, Money::from_cents(1_200)).unwrap();
    db.orders().save(&mut order, "ana").await.unwrap();

    let request = |quantity| ReturnRequest {
        items: vec![ReturnRequestItem {
            product_name: "Toalha".to_string(),
            quantity,
        }],
        responsible: "Carlos".to_string(),
        notes: None,
    };

    db.returns().record(order.order_number, &request(3)).await.unwrap();

    let summary = db.returns().summary(order.order_number).await.unwrap();
    let toalha = summary.iter().find(|l| l.product_name == "Toalha").unwrap();
    assert_eq!(toalha.pending, 2);
    assert_eq!(toalha.status, ReturnStatus::PartiallyReturned);

    let err = db
        .returns()
        .record(order.order_number, &request(3))
        .await
        .unwrap_err();
    match err {
        DbError::Domain(CoreError::ReturnExceedsPending {
            product,
            pending,
            requested,
        }) => {
            assert_eq!(product, "Toalha");
            assert_eq!(pending, 2);
            assert_eq!(requested, 3);
        }
        other => panic!("Expected ReturnExceedsPending, got {other:?}"),
    }

    // Returning the remaining 2 fully settles the item
    db.returns().record(order.order_number, &request(2)).await.unwrap();
    assert!(!db.returns().has_pending(order.order_number).await.unwrap());
}

/// A discount edit after a schedule exists re-derives the totals, and the
/// amount-due invariant keeps holding through payment toggles.
#[tokio::test]
async fn discount_edit_interacts_with_installments() {
    let db = test_db().await;

    let mut order = db.orders().create("Davi Rocha", "ana").await.unwrap();
    order.add_item("Mesa", 2, Money::from_cents(5_000)).unwrap();
    db.orders().save(&mut order, "ana").await.unwrap();

    let schedule = db
        .installments()
        .generate_schedule(&order.id, 2, "ana")
        .await
        .unwrap();
    assert_eq!(
        schedule.iter().map(|i| i.amount_cents).sum::<i64>(),
        10_000
    );

    db.installments()
        .toggle_payment(&schedule[0].id, "ana")
        .await
        .unwrap();

    // Discount applied after money was received: due re-derives, paid stays
    let mut reloaded = db.orders().load(order.order_number).await.unwrap();
    reloaded
        .set_discount(Discount::Fixed(Money::from_cents(2_000)))
        .unwrap();
    db.orders().save(&mut reloaded, "ana").await.unwrap();

    let final_state = db.orders().load(order.order_number).await.unwrap();
    assert_eq!(final_state.final_amount_cents, 8_000);
    assert_eq!(final_state.amount_paid_cents, 5_000);
    assert_eq!(final_state.amount_due_cents, 3_000);
    assert_due_invariant(&final_state);
}

/// Direct aggregate edits and installment additions share one ceiling
/// system: what was paid directly shrinks what can be scheduled.
#[tokio::test]
async fn direct_payment_shrinks_schedulable_balance() {
    let db = test_db().await;

    let mut order = db.orders().create("Elisa Prado", "ana").await.unwrap();
    order.add_item("Mesa", 1, Money::from_cents(8_000)).unwrap();
    order.set_amount_paid(Money::from_cents(5_000)).unwrap();
    db.orders().save(&mut order, "ana").await.unwrap();

    let input = NewInstallment {
        amount_cents: 3_001,
        due_date: chrono::Utc::now().date_naive(),
        method: None,
        notes: None,
    };
    let err = db
        .installments()
        .add(&order.id, &input, "ana")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InstallmentExceedsBalance {
            available_cents: 3_000,
            requested_cents: 3_001,
        })
    ));

    let ok = NewInstallment {
        amount_cents: 3_000,
        ..input
    };
    db.installments().add(&order.id, &ok, "ana").await.unwrap();

    // Fully scheduled now - generating more is a conflict
    let err = db
        .installments()
        .generate_schedule(&order.id, 2, "ana")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::NothingToSchedule { .. })
    ));
}

/// Removing a paid installment honors the chosen policy end to end.
#[tokio::test]
async fn paid_removal_policy_round_trip() {
    let db = test_db().await;

    let mut order = db.orders().create("Fabio Neri", "ana").await.unwrap();
    order.add_item("Mesa", 1, Money::from_cents(6_000)).unwrap();
    db.orders().save(&mut order, "ana").await.unwrap();

    let input = NewInstallment {
        amount_cents: 2_000,
        due_date: chrono::Utc::now().date_naive(),
        method: None,
        notes: None,
    };

    let first = db.installments().add(&order.id, &input, "ana").await.unwrap();
    db.installments().toggle_payment(&first.id, "ana").await.unwrap();
    db.installments()
        .remove(&first.id, PaidRemovalPolicy::PreservePaidAmount, "ana")
        .await
        .unwrap();

    let after_preserve = db.orders().load(order.order_number).await.unwrap();
    assert_eq!(after_preserve.amount_paid_cents, 2_000);

    let second = db.installments().add(&order.id, &input, "ana").await.unwrap();
    db.installments().toggle_payment(&second.id, "ana").await.unwrap();
    db.installments()
        .remove(&second.id, PaidRemovalPolicy::ReversePayment, "ana")
        .await
        .unwrap();

    let after_reverse = db.orders().load(order.order_number).await.unwrap();
    assert_eq!(after_reverse.amount_paid_cents, 2_000);
    assert_due_invariant(&after_reverse);
}
