//! Checkout integration tests against a real PostgreSQL server.
//!
//! These are `#[ignore]`d by default; run them with:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/bayon_pos_test cargo test -- --ignored
//! ```
//!
//! Each test works under a fresh random user id and seeds its own
//! products, so the suite can run concurrently against one database.

use chrono::Utc;
use uuid::Uuid;

use bayon_core::{OrderStatus, PaymentMethod, Product};
use bayon_db::{CheckoutError, CheckoutService, Database, DbConfig};

// =============================================================================
// Helpers
// =============================================================================

async fn test_db() -> Database {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for these tests");
    Database::connect(DbConfig::new(url))
        .await
        .expect("failed to connect to test database")
}

fn fresh_user() -> String {
    format!("user-{}", Uuid::new_v4())
}

async fn seed_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> String {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        price_cents,
        stock_quantity: stock,
        image_url: None,
        created_at: now,
        updated_at: now,
    };
    db.products()
        .insert(&product)
        .await
        .expect("failed to seed product");
    product.id
}

async fn add_to_cart(db: &Database, user_id: &str, product_id: &str, quantity: i64) {
    db.carts()
        .insert_line(&Uuid::new_v4().to_string(), user_id, product_id, quantity)
        .await
        .expect("failed to seed cart line");
}

async fn stock_of(db: &Database, product_id: &str) -> i64 {
    db.products()
        .get_by_id(product_id)
        .await
        .expect("failed to read product")
        .expect("product should exist")
        .stock_quantity
}

// =============================================================================
// Summary and Pricing
// =============================================================================

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn test_order_summary_worked_example() {
    let db = test_db().await;
    let checkout = CheckoutService::new(db.clone());
    let user = fresh_user();

    // 2 x $10.00 + 1 x $5.00 = $25.00, tax $2.50, total $27.50.
    let coffee = seed_product(&db, "Coffee", 1000, 10).await;
    let tea = seed_product(&db, "Tea", 500, 10).await;
    add_to_cart(&db, &user, &coffee, 2).await;
    add_to_cart(&db, &user, &tea, 1).await;

    let summary = checkout.order_summary(&user).await.expect("summary");

    assert_eq!(summary.items.len(), 2);
    assert_eq!(summary.totals.sub_total_cents, 2500);
    assert_eq!(summary.totals.tax_cents, 250);
    assert_eq!(summary.totals.total_cents, 2750);

    // Read-only: nothing changed.
    assert_eq!(stock_of(&db, &coffee).await, 10);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn test_empty_cart_rejected_everywhere() {
    let db = test_db().await;
    let checkout = CheckoutService::new(db.clone());
    let user = fresh_user();

    assert!(matches!(
        checkout.order_summary(&user).await,
        Err(CheckoutError::EmptyCart)
    ));
    assert!(matches!(
        checkout.checkout_cash(&user).await,
        Err(CheckoutError::EmptyCart)
    ));
    assert!(matches!(
        checkout.prepare_qr(&user).await,
        Err(CheckoutError::EmptyCart)
    ));
}

// =============================================================================
// Cash Checkout
// =============================================================================

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn test_cash_checkout_completes_and_settles() {
    let db = test_db().await;
    let checkout = CheckoutService::new(db.clone());
    let user = fresh_user();

    let product = seed_product(&db, "Noodles", 350, 5).await;
    add_to_cart(&db, &user, &product, 2).await;

    let result = checkout.checkout_cash(&user).await.expect("cash checkout");

    // Cash orders are born completed; there is no pending stop.
    assert_eq!(result.order.status, OrderStatus::Completed);
    assert_eq!(result.order.payment_method, PaymentMethod::Cash);
    assert!(result.order.completed_at.is_some());
    assert_eq!(result.order.sub_total_cents, 700);
    assert_eq!(result.order.tax_cents, 70);
    assert_eq!(result.order.total_cents, 770);

    // Lines snapshot name and price from the locked product row.
    assert_eq!(result.lines.len(), 1);
    assert_eq!(result.lines[0].name_snapshot, "Noodles");
    assert_eq!(result.lines[0].price_at_sale_cents, 350);
    assert_eq!(result.lines[0].quantity, 2);

    // Stock decremented, cart cleared.
    assert_eq!(stock_of(&db, &product).await, 3);
    let remaining = db.carts().lines_for_user(&user).await.expect("cart read");
    assert!(remaining.is_empty());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn test_insufficient_stock_reports_name_and_remaining() {
    let db = test_db().await;
    let checkout = CheckoutService::new(db.clone());
    let user = fresh_user();

    let product = seed_product(&db, "Rare Item", 9900, 1).await;
    add_to_cart(&db, &user, &product, 2).await;

    let err = checkout.checkout_cash(&user).await.unwrap_err();
    match err {
        CheckoutError::InsufficientStock {
            product_name,
            available_stock,
        } => {
            assert_eq!(product_name, "Rare Item");
            assert_eq!(available_stock, 1);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // The attempt left nothing behind.
    assert_eq!(stock_of(&db, &product).await, 1);
    assert_eq!(db.carts().lines_for_user(&user).await.unwrap().len(), 1);
    assert!(checkout.completed_orders(&user).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn test_failed_checkout_rolls_back_every_line() {
    let db = test_db().await;
    let checkout = CheckoutService::new(db.clone());
    let user = fresh_user();

    // First line is fine, second violates stock; the whole attempt
    // must abort, including the first line's would-be decrement.
    let plentiful = seed_product(&db, "A Plentiful", 100, 50).await;
    let scarce = seed_product(&db, "B Scarce", 100, 0).await;
    add_to_cart(&db, &user, &plentiful, 1).await;
    add_to_cart(&db, &user, &scarce, 1).await;

    let err = checkout.checkout_cash(&user).await.unwrap_err();
    match err {
        CheckoutError::InsufficientStock {
            product_name,
            available_stock,
        } => {
            assert_eq!(product_name, "B Scarce");
            assert_eq!(available_stock, 0);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(stock_of(&db, &plentiful).await, 50);
    assert_eq!(stock_of(&db, &scarce).await, 0);
    assert_eq!(db.carts().lines_for_user(&user).await.unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn test_concurrent_checkouts_never_oversell() {
    let db = test_db().await;
    let user_a = fresh_user();
    let user_b = fresh_user();

    // One unit, two buyers racing for it.
    let product = seed_product(&db, "Last One", 500, 1).await;
    add_to_cart(&db, &user_a, &product, 1).await;
    add_to_cart(&db, &user_b, &product, 1).await;

    let checkout_a = CheckoutService::new(db.clone());
    let checkout_b = CheckoutService::new(db.clone());
    let (ua, ub) = (user_a.clone(), user_b.clone());
    let (res_a, res_b) = tokio::join!(
        tokio::spawn(async move { checkout_a.checkout_cash(&ua).await }),
        tokio::spawn(async move { checkout_b.checkout_cash(&ub).await }),
    );
    let res_a = res_a.expect("task a");
    let res_b = res_b.expect("task b");

    let successes = [&res_a, &res_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one buyer gets the last unit");

    let loser = if res_a.is_err() { res_a } else { res_b };
    assert!(matches!(
        loser,
        Err(CheckoutError::InsufficientStock {
            available_stock: 0,
            ..
        })
    ));

    assert_eq!(stock_of(&db, &product).await, 0);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn test_price_at_sale_survives_catalog_change() {
    let db = test_db().await;
    let checkout = CheckoutService::new(db.clone());
    let user = fresh_user();

    let product = seed_product(&db, "Volatile", 1000, 10).await;
    add_to_cart(&db, &user, &product, 1).await;

    let result = checkout.checkout_cash(&user).await.expect("cash checkout");
    let order_id = result.order.id.clone();

    // Catalog price changes after the sale.
    db.products()
        .set_price(&product, 9999)
        .await
        .expect("price update");

    let hydrated = checkout.get_order(&user, &order_id).await.expect("re-read");
    assert_eq!(hydrated.lines[0].price_at_sale_cents, 1000);
    assert_eq!(hydrated.order.sub_total_cents, 1000);
}

// =============================================================================
// KHQR Flow
// =============================================================================

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn test_qr_flow_pending_then_completed() {
    let db = test_db().await;
    let checkout = CheckoutService::new(db.clone());
    let user = fresh_user();

    let product = seed_product(&db, "Iced Latte", 250, 4).await;
    add_to_cart(&db, &user, &product, 2).await;

    let totals = checkout.prepare_qr(&user).await.expect("prepare");
    assert_eq!(totals.total_cents, 550);

    let tx_ref = format!("md5-{}", Uuid::new_v4().simple());
    let order = checkout
        .create_pending_qr_order(&user, &totals, &tx_ref)
        .await
        .expect("pending order");

    // Pending holds nothing: stock and cart untouched until payment.
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_method, PaymentMethod::Khqr);
    assert!(order.completed_at.is_none());
    assert_eq!(stock_of(&db, &product).await, 4);
    assert_eq!(db.carts().lines_for_user(&user).await.unwrap().len(), 1);

    let verified = checkout
        .complete_qr_order(&user, &tx_ref)
        .await
        .expect("verify");

    assert_eq!(verified.order.id, order.id);
    assert_eq!(verified.order.status, OrderStatus::Completed);
    assert!(verified.order.completed_at.is_some());
    assert_eq!(verified.lines.len(), 1);
    assert_eq!(stock_of(&db, &product).await, 2);
    assert!(db.carts().lines_for_user(&user).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn test_verify_replay_decrements_once() {
    let db = test_db().await;
    let checkout = CheckoutService::new(db.clone());
    let user = fresh_user();

    let product = seed_product(&db, "Croissant", 300, 6).await;
    add_to_cart(&db, &user, &product, 1).await;

    let totals = checkout.prepare_qr(&user).await.expect("prepare");
    let tx_ref = format!("md5-{}", Uuid::new_v4().simple());
    checkout
        .create_pending_qr_order(&user, &totals, &tx_ref)
        .await
        .expect("pending order");

    let first = checkout
        .complete_qr_order(&user, &tx_ref)
        .await
        .expect("first verify");
    let second = checkout
        .complete_qr_order(&user, &tx_ref)
        .await
        .expect("replayed verify");

    // The replay returns the same completed order and touches nothing.
    assert_eq!(second.order.id, first.order.id);
    assert_eq!(second.order.status, OrderStatus::Completed);
    assert_eq!(second.lines.len(), first.lines.len());
    assert_eq!(stock_of(&db, &product).await, 5);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn test_order_history_empty_for_new_user() {
    let db = test_db().await;
    let checkout = CheckoutService::new(db.clone());
    let user = fresh_user();

    // No orders is a normal answer, not an error.
    let orders = checkout.completed_orders(&user).await.expect("history");
    assert!(orders.is_empty());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn test_verify_unknown_reference_not_found() {
    let db = test_db().await;
    let checkout = CheckoutService::new(db.clone());
    let user = fresh_user();

    let err = checkout
        .complete_qr_order(&user, "no-such-reference")
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::OrderNotFound));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL server"]
async fn test_verify_scoped_to_owner() {
    let db = test_db().await;
    let checkout = CheckoutService::new(db.clone());
    let owner = fresh_user();
    let stranger = fresh_user();

    let product = seed_product(&db, "Sandwich", 450, 3).await;
    add_to_cart(&db, &owner, &product, 1).await;

    let totals = checkout.prepare_qr(&owner).await.expect("prepare");
    let tx_ref = format!("md5-{}", Uuid::new_v4().simple());
    checkout
        .create_pending_qr_order(&owner, &totals, &tx_ref)
        .await
        .expect("pending order");

    // A different user presenting the same reference sees nothing.
    let err = checkout
        .complete_qr_order(&stranger, &tx_ref)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::OrderNotFound));

    // The owner can still settle it.
    checkout
        .complete_qr_order(&owner, &tx_ref)
        .await
        .expect("owner verify");
}
