//! Storefront routes driven through the router with a mocked backend.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use mobistore_integration_tests::{auth_json, product_json, storefront_app};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FORM: &str = "application/x-www-form-urlencoded";

/// `name=value` of the session cookie set by `response`.
fn session_cookie(response: &axum::response::Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Product listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn listing_with_blank_price_fields_renders() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("sort", "price"))
        .and(query_param("brand", "Apple"))
        .and(query_param_is_missing("minPrice"))
        .and(query_param_is_missing("maxPrice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [product_json("p1", "iPhone 15", 20_990_000)],
            "total": 1,
            "page": 1,
            "totalPages": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = storefront_app(&server)
        .oneshot(
            Request::get("/products?sort=price&brand=Apple&min_price=&max_price=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn listing_with_garbage_price_is_rejected() {
    let server = MockServer::start().await;

    let response = storefront_app(&server)
        .oneshot(
            Request::get("/products?min_price=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn checkout_requires_login() {
    let server = MockServer::start().await;

    let response = storefront_app(&server)
        .oneshot(
            Request::post("/checkout")
                .header(header::CONTENT_TYPE, FORM)
                .body(Body::from("address_id=a1&payment_method=cod"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn checkout_form_with_blank_installment_fields_places_cod_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_json("user")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "_id": "ci1",
                "productId": product_json("p1", "iPhone 15", 20_990_000),
                "quantity": 1,
                "price": 20_990_000
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/address"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "_id": "a1",
            "fullName": "Nguyễn Văn A",
            "phone": "0901234567",
            "address": "12 Lê Lợi",
            "city": "Hồ Chí Minh",
            "isDefault": true
        }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(body_partial_json(json!({
            "paymentMethod": "cod",
            "isInstallment": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "_id": "o1",
            "totalAmount": 20_990_000,
            "paymentMethod": "cod"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let app = storefront_app(&server);

    let login = app
        .clone()
        .oneshot(
            Request::post("/auth/login")
                .header(header::CONTENT_TYPE, FORM)
                .header("x-forwarded-for", "203.0.113.7")
                .body(Body::from("email=a%40mobistore.vn&password=secret123"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::SEE_OTHER);
    let cookie = session_cookie(&login);

    let response = app
        .oneshot(
            Request::post("/checkout")
                .header(header::CONTENT_TYPE, FORM)
                .header(header::COOKIE, cookie)
                .body(Body::from(
                    "address_id=a1&payment_method=cod&installment_months=&down_payment_percent=&note=",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/account/orders/o1");
}
