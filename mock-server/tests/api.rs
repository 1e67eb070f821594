use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, status, ApiResponse};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn envelope(function: &str, data: Value) -> Value {
    json!({
        "Website": "42",
        "ClientCode": "secret",
        "ClientVersion": 1.3,
        "Language": "en-US",
        "TestMode": true,
        "UserToken": "",
        "Function": function,
        "Data": data,
    })
}

fn form_request(uri: &str, body: String) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(body)
        .unwrap()
}

fn call(envelope: &Value) -> Request<String> {
    form_request("/v1/", format!("jsonrequest={envelope}"))
}

async fn send(app: &Router, envelope: &Value) -> ApiResponse {
    let resp = app.clone().oneshot(call(envelope)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

fn order(order_id: &str) -> Value {
    json!({
        "PartnerID": 7,
        "RestaurantID": 42,
        "OrderID": order_id,
        "OrderPrice": 20.0,
        "DeliveryFee": 3.5,
        "RecipientName": "Jane Doe",
        "RecipientAddress": "Main St 1",
        "RecipientPhone": "+3612345",
        "RecipientLocation": "1051 Budapest",
        "OrderDetails": "2xPizza\\r\\n1xCola",
    })
}

// --- envelope ---

#[tokio::test]
async fn check_client_version_succeeds() {
    let resp = send(&app(), &envelope("CheckClientVersion", Value::Null)).await;
    assert!(resp.status);
    assert_eq!(resp.status_code, status::OK);
    assert_eq!(resp.function, "CheckClientVersion");
    assert!(resp.test_mode);
    assert_eq!(resp.data.unwrap()["LatestVersion"], 1.3);
}

#[tokio::test]
async fn unversioned_path_is_accepted() {
    let body = format!("jsonrequest={}", envelope("CheckClientVersion", Value::Null));
    let resp = app().oneshot(form_request("/v1", body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_function_is_reported_in_envelope() {
    let resp = send(&app(), &envelope("GetRestaurants", json!({}))).await;
    assert!(!resp.status);
    assert_eq!(resp.status_code, status::UNKNOWN_FUNCTION);
    assert_eq!(resp.function, "GetRestaurants");
    assert!(resp.error_message.unwrap().contains("GetRestaurants"));
}

#[tokio::test]
async fn missing_client_code_is_unauthorized() {
    let mut env = envelope("CheckClientVersion", Value::Null);
    env["ClientCode"] = json!("");
    let resp = send(&app(), &env).await;
    assert_eq!(resp.status_code, status::UNAUTHORIZED);
}

#[tokio::test]
async fn body_without_form_field_returns_400() {
    let resp = app()
        .oneshot(form_request("/v1/", envelope("CheckClientVersion", Value::Null).to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn broken_endpoint_returns_empty_body() {
    let resp = app()
        .oneshot(form_request("/broken", "jsonrequest={}".to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());
}

// --- orders ---

#[tokio::test]
async fn create_order_assigns_computed_fields() {
    let resp = send(&app(), &envelope("CreateExternalOrder", order("A-1"))).await;
    assert!(resp.status);
    let data = resp.data.unwrap();
    assert!(data["ID"].as_i64().is_some());
    assert!(data["CreateDate"].as_str().is_some());
    assert_eq!(data["TotalPrice"], 23.5);
    assert_eq!(data["RecipientZip"], "1051");
    assert_eq!(data["OrderDetails"], "2xPizza\\r\\n1xCola");
}

#[tokio::test]
async fn resubmitting_an_order_edits_it() {
    let app = app();
    let first = send(&app, &envelope("CreateExternalOrder", order("A-1"))).await;
    let mut changed = order("A-1");
    changed["OrderPrice"] = json!(30.0);
    let second = send(&app, &envelope("CreateExternalOrder", changed)).await;

    let (first, second) = (first.data.unwrap(), second.data.unwrap());
    assert_eq!(first["ID"], second["ID"]);
    assert_eq!(first["CreateDate"], second["CreateDate"]);
    assert_eq!(second["TotalPrice"], 33.5);
}

#[tokio::test]
async fn distinct_orders_get_distinct_ids() {
    let app = app();
    let a = send(&app, &envelope("CreateExternalOrder", order("A-1"))).await;
    let b = send(&app, &envelope("CreateExternalOrder", order("A-2"))).await;
    assert_ne!(a.data.unwrap()["ID"], b.data.unwrap()["ID"]);
}

#[tokio::test]
async fn create_order_without_identifiers_is_invalid() {
    let resp = send(&app(), &envelope("CreateExternalOrder", json!({"OrderPrice": 1}))).await;
    assert!(!resp.status);
    assert_eq!(resp.status_code, status::INVALID_DATA);
}

#[tokio::test]
async fn cancel_removes_order() {
    let app = app();
    send(&app, &envelope("CreateExternalOrder", order("A-1"))).await;
    let base = json!({"PartnerID": 7, "RestaurantID": 42, "OrderID": "A-1"});

    let cancelled = send(&app, &envelope("CancelExternalOrder", base.clone())).await;
    assert!(cancelled.status);
    assert!(cancelled.data.is_none());

    let again = send(&app, &envelope("CancelExternalOrder", base)).await;
    assert_eq!(again.status_code, status::NOT_FOUND);
}

// --- delivery ---

#[tokio::test]
async fn delivery_info_returns_estimate() {
    let data = json!({
        "PartnerID": 7,
        "RestaurantID": 42,
        "Location": "1051 Budapest",
        "PickupDate": "2024-05-01T18:00:00",
    });
    let resp = send(&app(), &envelope("GetDeliveryInfo", data)).await;
    assert!(resp.status);
    let data = resp.data.unwrap();
    assert_eq!(data["PickupDate"], "2024-05-01T18:00:00");
    assert_eq!(data["DeliveryDate"], "2024-05-01T18:45:00");
    assert_eq!(data["DeliveryDelayTime"], 15);
    assert_eq!(data["Location"], "1051 Budapest");
}

#[tokio::test]
async fn delivery_info_with_non_object_data_is_invalid() {
    let resp = send(&app(), &envelope("GetDeliveryInfo", json!([1, 2]))).await;
    assert_eq!(resp.status_code, status::INVALID_DATA);
}
