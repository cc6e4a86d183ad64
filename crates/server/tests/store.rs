//! Store invariants checked against a real `PostgreSQL` database.
//!
//! Run with:
//! ```bash
//! TEST_DATABASE_URL=postgres://... cargo test -p shopdesk-server -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;

use shopdesk_core::{Email, Money, OrderStatus, PaymentStatus, ProductId, UserId, UserRole};
use shopdesk_server::db::products::NewProduct;
use shopdesk_server::db::{OrderRepository, ProductRepository, UserRepository};
use shopdesk_server::models::{AddressInput, Order};
use shopdesk_server::services::accounts::AccountService;
use shopdesk_server::services::orders::{OrderService, UpdateStatusRequest, validate_status_change};
use shopdesk_server::services::stock::{CheckoutLine, StockError, StockService};

async fn product(pool: &PgPool, name: &str, stock: i32) -> ProductId {
    let product = ProductRepository::new(pool)
        .create(NewProduct {
            product_type: "tshirts".to_owned(),
            name: name.to_owned(),
            description: "Test product".to_owned(),
            price: Money::new(Decimal::new(1999, 2)).unwrap(),
            discounted_percentage: Decimal::TEN,
            stock,
            category: "apparel".to_owned(),
            brand: "acme".to_owned(),
            badge: false,
            is_available: true,
            offer: false,
            images: vec!["https://cdn.example.com/p.jpg".to_owned()],
            tags: Vec::new(),
        })
        .await
        .unwrap();
    product.id
}

async fn customer(pool: &PgPool) -> UserId {
    let email = Email::parse(&format!("{}@example.com", UserId::generate())).unwrap();
    UserRepository::new(pool)
        .create("Test Customer", &email, "not-a-real-hash", UserRole::User)
        .await
        .unwrap()
        .id
}

async fn mug_order(pool: &PgPool, user_id: UserId) -> Order {
    let product_id = product(pool, "Mug", 3).await;
    let request = serde_json::from_value(json!({
        "items": [{ "_id": product_id.to_string(), "name": "Mug", "price": "4.50", "quantity": 2 }],
        "amount": "9.00",
        "address": {
            "firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.com",
            "street": "1 Main St", "city": "Springfield", "state": "IL",
            "postal_code": "62701", "country": "US", "phone": "555-0100"
        }
    }))
    .unwrap();
    OrderService::new(pool).place(user_id, request).await.unwrap()
}

async fn set_status(pool: &PgPool, order: &Order, status: &str, payment: Option<&str>) -> Order {
    let change = validate_status_change(UpdateStatusRequest {
        order_id: Some(order.id.to_string()),
        status: Some(status.to_owned()),
        payment_status: payment.map(str::to_owned),
    })
    .unwrap();
    OrderService::new(pool).change_status(change).await.unwrap()
}

fn line(id: ProductId, quantity: i64) -> CheckoutLine {
    CheckoutLine {
        product_id: Some(id.to_string()),
        quantity: Some(quantity),
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_concurrent_sales_never_oversell() {
    let pool = common::test_pool().await;
    let id = product(&pool, "Last units", 5).await;

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                StockService::new(&pool)
                    .sell(Some(&id.to_string()), Some(1))
                    .await
            })
        })
        .collect();

    let mut sold = 0;
    let mut refused = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => sold += 1,
            Err(StockError::Insufficient) => refused += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!((sold, refused), (5, 5));

    let after = ProductRepository::new(&pool).get_by_id(id).await.unwrap().unwrap();
    assert_eq!(after.stock, 0);
    assert_eq!(after.sold_quantity, 5);
    assert!(!after.is_available);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_checkout_is_all_or_nothing() {
    let pool = common::test_pool().await;
    let plenty = product(&pool, "Plenty", 10).await;
    let scarce = product(&pool, "Scarce", 1).await;

    let err = StockService::new(&pool)
        .checkout(&[line(plenty, 3), line(scarce, 2)])
        .await
        .unwrap_err();
    let StockError::Validation(errors) = err else {
        panic!("expected validation failure, got {err}");
    };
    assert_eq!(errors, ["Insufficient stock for Scarce. Available: 1, Requested: 2"]);

    let products = ProductRepository::new(&pool);
    assert_eq!(products.get_by_id(plenty).await.unwrap().unwrap().stock, 10);
    assert_eq!(products.get_by_id(scarce).await.unwrap().unwrap().stock, 1);

    let outcome = StockService::new(&pool)
        .checkout(&[line(plenty, 3), line(scarce, 1)])
        .await
        .unwrap();
    assert_eq!(outcome.updated_products.len(), 2);
    assert_eq!(products.get_by_id(plenty).await.unwrap().unwrap().stock, 7);
    assert_eq!(products.get_by_id(scarce).await.unwrap().unwrap().stock, 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_order_is_linked_to_owner_and_unlinked_on_delete() {
    let pool = common::test_pool().await;
    let user_id = customer(&pool).await;
    let order = mug_order(&pool, user_id).await;
    assert_eq!(order.address.zipcode, "62701");

    let users = UserRepository::new(&pool);
    let owner = users.get_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(owner.order_ids, vec![order.id]);

    OrderService::new(&pool).delete(order.id).await.unwrap();
    let owner = users.get_by_id(user_id).await.unwrap().unwrap();
    assert!(owner.order_ids.is_empty());
    assert!(OrderRepository::new(&pool).get_by_id(order.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_status_updates_move_freely_and_repeat_cleanly() {
    let pool = common::test_pool().await;
    let user_id = customer(&pool).await;
    let order = mug_order(&pool, user_id).await;
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);

    let delivered = set_status(&pool, &order, "delivered", Some("paid")).await;
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.payment_status, PaymentStatus::Paid);

    // Backward move without a payment status keeps the recorded one.
    let reopened = set_status(&pool, &order, "pending", None).await;
    assert_eq!(reopened.status, OrderStatus::Pending);
    assert_eq!(reopened.payment_status, PaymentStatus::Paid);

    let first = set_status(&pool, &order, "shipped", Some("failed")).await;
    let second = set_status(&pool, &order, "shipped", Some("failed")).await;
    assert_eq!(
        (second.status, second.payment_status),
        (first.status, first.payment_status)
    );
    assert_eq!(second.status, OrderStatus::Shipped);
    assert_eq!(second.payment_status, PaymentStatus::Failed);
    assert!(second.updated_at >= first.updated_at);

    let stored = OrderRepository::new(&pool).get_by_id(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Shipped);
    assert_eq!(stored.payment_status, PaymentStatus::Failed);
    assert_eq!(stored.items, order.items);
    assert_eq!(stored.amount, order.amount);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_address_book_keeps_one_default() {
    let pool = common::test_pool().await;
    let user_id = customer(&pool).await;
    let accounts = AccountService::new(&pool);

    let input = |label: &str, is_default: bool| -> AddressInput {
        serde_json::from_value(json!({
            "label": label, "street": "1 Main St", "city": "Springfield",
            "state": "IL", "zipCode": "62701", "country": "US", "isDefault": is_default
        }))
        .unwrap()
    };

    let (home, _) = accounts.add_address(user_id, input("Home", false)).await.unwrap();
    assert!(home.is_default);

    let (work, book) = accounts.add_address(user_id, input("Work", true)).await.unwrap();
    assert_eq!(book.default_address().map(|a| a.id), Some(work.id));
    assert_eq!(book.as_slice().iter().filter(|a| a.is_default).count(), 1);

    let book = accounts.remove_address(user_id, work.id).await.unwrap();
    assert_eq!(book.default_address().map(|a| a.id), Some(home.id));
}
