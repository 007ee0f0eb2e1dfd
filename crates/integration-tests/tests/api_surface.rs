//! End-to-end HTTP tests through the full router.

#![allow(clippy::unwrap_used)]

use buyit_integration_tests::{body_json, create_product, json_request, send, signup, test_router};
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let router = test_router(300);
    let response = send(&router, json_request("GET", "/health", None, None)).await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn test_signup_then_login() {
    let router = test_router(300);
    signup(&router, "ada@test.example").await;

    let response = send(
        &router,
        json_request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "ada@test.example", "password": "hunter2-but-longer" })),
        ),
    )
    .await;
    assert_eq!(response.status().as_u16(), 200);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_login_wrong_password_is_401() {
    let router = test_router(300);
    signup(&router, "ada@test.example").await;

    let response = send(
        &router,
        json_request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "ada@test.example", "password": "wrong" })),
        ),
    )
    .await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_duplicate_signup_is_409() {
    let router = test_router(300);
    signup(&router, "ada@test.example").await;

    let response = send(
        &router,
        json_request(
            "POST",
            "/auth/signup",
            None,
            Some(json!({
                "username": "other",
                "email": "ada@test.example",
                "password": "pw-pw-pw",
            })),
        ),
    )
    .await;
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn test_product_create_and_list() {
    let router = test_router(300);
    let id = create_product(&router, "overshirt", "49.90").await;

    let response = send(&router, json_request("GET", "/products", None, None)).await;
    assert_eq!(response.status().as_u16(), 200);
    let body = body_json(response).await;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"].as_i64().unwrap(), id);
    assert_eq!(listed[0]["name"], json!("overshirt"));
}

#[tokio::test]
async fn test_product_views_honor_query_count() {
    let router = test_router(300);
    for i in 0..10 {
        create_product(&router, &format!("p{i}"), "10.00").await;
    }

    let response = send(
        &router,
        json_request("GET", "/products/featured?n=3", None, None),
    )
    .await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 3);

    let response = send(
        &router,
        json_request("GET", "/products/recent?n=2", None, None),
    )
    .await;
    let recent = body_json(response).await;
    let recent = recent.as_array().unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[1]["name"], json!("p9"));
}

#[tokio::test]
async fn test_cart_requires_token() {
    let router = test_router(300);
    let response = send(&router, json_request("GET", "/cart", None, None)).await;
    assert_eq!(response.status().as_u16(), 401);

    let response = send(&router, json_request("GET", "/cart", Some("garbage"), None)).await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_cart_add_and_read_back() {
    let router = test_router(300);
    let token = signup(&router, "ada@test.example").await;
    let id = create_product(&router, "widget", "10.00").await;

    let response = send(
        &router,
        json_request(
            "POST",
            "/cart/items",
            Some(&token),
            Some(json!({ "productId": id })),
        ),
    )
    .await;
    assert_eq!(response.status().as_u16(), 200);
    let body = body_json(response).await;
    assert_eq!(body["quantity"], json!(1));

    let response = send(&router, json_request("GET", "/cart", Some(&token), None)).await;
    let cart = body_json(response).await;
    // Dense view: one entry per slot, zeroes included
    assert_eq!(cart.as_object().unwrap().len(), 300);
    assert_eq!(cart[&id.to_string()], json!(1));
    assert_eq!(cart["0"], json!(0));
}

#[tokio::test]
async fn test_cart_add_out_of_range_is_400() {
    let router = test_router(300);
    let token = signup(&router, "ada@test.example").await;

    let response = send(
        &router,
        json_request(
            "POST",
            "/cart/items",
            Some(&token),
            Some(json!({ "productId": 300 })),
        ),
    )
    .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_cart_add_unregistered_is_404() {
    let router = test_router(300);
    let token = signup(&router, "ada@test.example").await;

    let response = send(
        &router,
        json_request(
            "POST",
            "/cart/items",
            Some(&token),
            Some(json!({ "productId": 17 })),
        ),
    )
    .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_checkout_round_trip() {
    let router = test_router(300);
    let token = signup(&router, "ada@test.example").await;
    let id = create_product(&router, "widget", "10.00").await;

    for _ in 0..2 {
        let response = send(
            &router,
            json_request(
                "POST",
                "/cart/items",
                Some(&token),
                Some(json!({ "productId": id })),
            ),
        )
        .await;
        assert_eq!(response.status().as_u16(), 200);
    }

    let response = send(
        &router,
        json_request(
            "POST",
            "/orders",
            Some(&token),
            Some(json!({
                "shippingInfo": {
                    "name": "Ada",
                    "address": "1 Main St",
                    "city": "Springfield",
                    "postalCode": "12345",
                },
                "paymentInfo": {
                    "cardNumber": "4242424242424242",
                    "expiryDate": "12/30",
                    "cvv": "123",
                },
                "totalAmount": "20.00",
            })),
        ),
    )
    .await;
    assert_eq!(response.status().as_u16(), 201);
    let receipt = body_json(response).await;
    assert_eq!(receipt["itemCount"], json!(1));
    assert!(receipt["orderId"].is_string());

    // Default config clears the cart on checkout
    let response = send(&router, json_request("GET", "/cart", Some(&token), None)).await;
    let cart = body_json(response).await;
    assert_eq!(cart[&id.to_string()], json!(0));
}

#[tokio::test]
async fn test_product_delete() {
    let router = test_router(300);
    let id = create_product(&router, "widget", "10.00").await;

    let response = send(
        &router,
        json_request("DELETE", &format!("/products/{id}"), None, None),
    )
    .await;
    assert_eq!(response.status().as_u16(), 204);

    let response = send(
        &router,
        json_request("DELETE", &format!("/products/{id}"), None, None),
    )
    .await;
    assert_eq!(response.status().as_u16(), 404);
}
