//! HTTP tests against a running server. See the crate docs for setup.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use shopdesk_integration_tests::Api;

fn shipping_address() -> Value {
    json!({
        "firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.com",
        "street": "1 Main St", "city": "Springfield", "state": "IL",
        "zipCode": "62701", "country": "US", "phone": "555-0100"
    })
}

async fn create_product(admin: &Api, stock: u32) -> String {
    let (status, body) = admin
        .post(
            "/api/product/add",
            json!({
                "_type": "tshirts",
                "name": format!("Integration tee {}", uuid::Uuid::new_v4()),
                "description": "Created by the integration tests",
                "price": 25,
                "category": "apparel",
                "brand": "acme",
                "stock": stock,
                "images": ["https://cdn.example.com/tee.jpg"]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["product"]["_id"].as_str().unwrap().to_owned()
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_health() {
    let response = reqwest::get(format!("{}/health", shopdesk_integration_tests::base_url()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_customer_cannot_reach_admin_routes() {
    let customer = Api::customer().await;
    let (status, body) = customer.get("/api/order/list").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_checkout_conflict_leaves_stock_untouched() {
    let admin = Api::admin().await;
    let customer = Api::customer().await;
    let product_id = create_product(&admin, 2).await;

    let (status, body) = customer
        .post("/api/checkout", json!({ "items": [{ "_id": product_id, "quantity": 3 }] }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Stock validation failed");
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(1));

    let (_, body) = admin.get(&format!("/api/product/single?_id={product_id}")).await;
    assert_eq!(body["product"]["stock"], 2);

    let (status, body) = customer
        .post("/api/checkout", json!({ "items": [{ "_id": product_id, "quantity": 2 }] }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["updatedProducts"][0]["stock"], 0);
    assert_eq!(body["updatedProducts"][0]["isAvailable"], false);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_order_lifecycle() {
    let admin = Api::admin().await;
    let customer = Api::customer().await;
    let product_id = create_product(&admin, 5).await;

    let (status, body) = customer
        .post(
            "/api/order/create",
            json!({
                "items": [{ "_id": product_id, "name": "Tee", "price": 25, "quantity": 2 }],
                "amount": 50,
                "address": shipping_address()
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order_id = body["orderId"].as_str().unwrap().to_owned();

    let (_, body) = customer.get("/api/order/my-orders").await;
    assert_eq!(body["orders"][0]["_id"], order_id.as_str());

    let (status, body) = admin
        .post(
            "/api/order/update-status",
            json!({ "orderId": order_id, "status": "shipped", "paymentStatus": "paid" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["order"]["status"], "shipped");

    let (status, _) = admin.post("/api/order/delete", json!({ "orderId": order_id })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = customer.get(&format!("/api/order/user/{order_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order not found");
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_order_amount_must_match_items() {
    let customer = Api::customer().await;
    let (status, body) = customer
        .post(
            "/api/order/create",
            json!({
                "items": [{ "_id": uuid::Uuid::new_v4().to_string(), "name": "Tee", "price": 25, "quantity": 2 }],
                "amount": 10,
                "address": shipping_address()
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Order amount does not match item total");
}
