//! Storefront backend client against a mocked commerce backend.

#![allow(clippy::unwrap_used)]

use mobistore_core::{Money, ProductId, UserRole};
use mobistore_integration_tests::{auth_json, product_json, storefront_client};
use mobistore_storefront::backend::{BackendError, ProductQuery};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_products_sends_filters_and_reads_paged_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("page", "2"))
        .and(query_param("brand", "Apple"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "products": [
                    product_json("p1", "iPhone 15", 20_990_000),
                    product_json("p2", "iPhone 15 Plus", 23_490_000)
                ],
                "total": 14,
                "page": 2,
                "totalPages": 2
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = storefront_client(&server);
    let query = ProductQuery {
        page: Some(2),
        brand: Some("Apple".to_string()),
        ..ProductQuery::default()
    };

    let page = client.list_products(&query).await.unwrap();
    assert_eq!(page.products.len(), 2);
    assert_eq!(page.total, 14);
    assert_eq!(page.page, 2);
    assert_eq!(page.pages, 2);
    assert_eq!(page.products[0].price, Money::from_dong(20_990_000));
    assert_eq!(page.products[0].brand.as_deref(), Some("Apple"));

    // Second read is served from the cache; `expect(1)` fails otherwise.
    let cached = client.list_products(&query).await.unwrap();
    assert_eq!(cached.products.len(), 2);
}

#[tokio::test]
async fn list_products_accepts_bare_array() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([product_json("p1", "Galaxy S24", 18_990_000)])),
        )
        .mount(&server)
        .await;

    let page = storefront_client(&server)
        .list_products(&ProductQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.pages, 1);
}

#[tokio::test]
async fn missing_product_maps_to_not_found_with_backend_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Product not found" })),
        )
        .mount(&server)
        .await;

    let err = storefront_client(&server)
        .get_product(&ProductId::new("missing"))
        .await
        .unwrap_err();

    match err {
        BackendError::NotFound(message) => assert_eq!(message, "Product not found"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_not_shown_to_users() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products/p1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("stack trace"))
        .mount(&server)
        .await;

    let err = storefront_client(&server)
        .get_product(&ProductId::new("p1"))
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::Status { status: 500, .. }));
    assert_eq!(err.user_message(), None);
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_posts_credentials_and_returns_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/login"))
        .and(body_json(json!({
            "email": "a@mobistore.vn",
            "password": "secret123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_json("user")))
        .mount(&server)
        .await;

    let auth = storefront_client(&server)
        .login("a@mobistore.vn", "secret123")
        .await
        .unwrap();

    assert_eq!(auth.token, "jwt-token");
    assert_eq!(auth.user.email, "a@mobistore.vn");
    assert_eq!(auth.user.role, UserRole::User);
}

#[tokio::test]
async fn rejected_token_maps_to_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/profile"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Token expired" })),
        )
        .mount(&server)
        .await;

    let err = storefront_client(&server).me("expired").await.unwrap_err();
    assert!(matches!(err, BackendError::Unauthorized));
}

#[tokio::test]
async fn duplicate_registration_message_is_shown() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/register"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "Email đã tồn tại" })),
        )
        .mount(&server)
        .await;

    let err = storefront_client(&server)
        .register("Nguyễn Văn A", "a@mobistore.vn", "secret123")
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), Some("Email đã tồn tại"));
}

// ---------------------------------------------------------------------------
// News & chat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_news_drops_unpublished_articles() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_id": "n1", "title": "Ra mắt iPhone 16", "content": "...", "published": true },
            { "_id": "n2", "title": "Bản nháp", "content": "...", "published": false },
            { "_id": "n3", "title": "Khuyến mãi tháng 3", "content": "..." }
        ])))
        .mount(&server)
        .await;

    let news = storefront_client(&server).list_news().await.unwrap();
    let titles: Vec<&str> = news.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["Ra mắt iPhone 16", "Khuyến mãi tháng 3"]);
}

#[tokio::test]
async fn chat_ask_works_without_login() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/ask"))
        .and(body_json(json!({ "message": "đơn hàng của tôi" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": "Bạn có thể xem đơn hàng tại trang Đơn hàng.",
            "actions": [{ "label": "Đơn hàng", "url": "/orders" }]
        })))
        .mount(&server)
        .await;

    let reply = storefront_client(&server)
        .chat_ask(None, "đơn hàng của tôi")
        .await
        .unwrap();

    assert!(reply.reply.contains("Đơn hàng"));
    assert_eq!(reply.actions.len(), 1);
    assert_eq!(reply.actions[0].url, "/orders");
}

#[tokio::test]
async fn clear_cart_accepts_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/cart"))
        .and(header("authorization", "Bearer jwt-token"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    storefront_client(&server)
        .clear_cart("jwt-token")
        .await
        .unwrap();
}
