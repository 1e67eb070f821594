use std::{collections::HashMap, sync::Arc};

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use time::{
    format_description::BorrowedFormatItem, macros::format_description, Duration, OffsetDateTime,
    PrimitiveDateTime,
};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};

/// Form field carrying the request JSON.
pub const FORM_FIELD: &str = "jsonrequest";

/// Oldest client version the server still accepts.
pub const MIN_CLIENT_VERSION: f64 = 1.0;

/// Version reported by `CheckClientVersion`.
pub const LATEST_CLIENT_VERSION: f64 = 1.3;

pub mod status {
    pub const OK: i64 = 0;
    pub const UNKNOWN_FUNCTION: i64 = 1;
    pub const INVALID_DATA: i64 = 2;
    pub const NOT_FOUND: i64 = 3;
    pub const UNAUTHORIZED: i64 = 4;
    pub const OUTDATED_CLIENT: i64 = 5;
}

const DELIVERY_DELAY_MINUTES: i64 = 15;
const DELIVERY_MINUTES: i64 = 45;
const DELIVERY_FEE: f64 = 2.5;

const WIRE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiRequest {
    pub website: String,
    pub client_code: String,
    pub client_version: f64,
    pub language: String,
    pub test_mode: bool,
    #[serde(default)]
    pub user_token: String,
    pub function: Option<String>,
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiResponse {
    pub status: bool,
    pub status_code: i64,
    pub status_message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_message: Option<String>,
    pub language: String,
    pub test_mode: bool,
    pub function: String,
    pub data: Option<Value>,
}

impl ApiResponse {
    fn ok(request: &ApiRequest, data: Option<Value>) -> Self {
        Self {
            status: true,
            status_code: status::OK,
            status_message: "OK".to_string(),
            error_message: None,
            language: request.language.clone(),
            test_mode: request.test_mode,
            function: request.function.clone().unwrap_or_default(),
            data,
        }
    }

    fn failure(request: &ApiRequest, code: i64, message: impl Into<String>) -> Self {
        Self {
            status: false,
            status_code: code,
            status_message: "Error".to_string(),
            error_message: Some(message.into()),
            language: request.language.clone(),
            test_mode: request.test_mode,
            function: request.function.clone().unwrap_or_default(),
            data: None,
        }
    }
}

/// Orders keyed by partner, restaurant and partner-side order id.
#[derive(Debug, Default)]
pub struct Store {
    orders: HashMap<(i64, i64, String), Map<String, Value>>,
    next_id: i64,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store {
        next_id: 1000,
        ..Store::default()
    }));
    Router::new()
        .route("/v1", post(handle))
        .route("/v1/", post(handle))
        .route("/broken", post(broken))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Accepts any request and answers 200 with an empty body.
async fn broken(_body: String) -> StatusCode {
    StatusCode::OK
}

async fn handle(
    State(db): State<Db>,
    body: String,
) -> Result<Json<ApiResponse>, (StatusCode, String)> {
    let request = parse_form(&body).map_err(|reason| {
        warn!(%reason, "rejecting request");
        (StatusCode::BAD_REQUEST, reason)
    })?;
    let function = request.function.clone().unwrap_or_default();
    info!(%function, website = %request.website, test_mode = request.test_mode, "api call");

    if request.client_code.is_empty() {
        return Ok(Json(ApiResponse::failure(
            &request,
            status::UNAUTHORIZED,
            "missing client code",
        )));
    }

    let response = match function.as_str() {
        "CheckClientVersion" => check_client_version(&request),
        "CreateExternalOrder" => create_external_order(&db, &request).await,
        "CancelExternalOrder" => cancel_external_order(&db, &request).await,
        "GetDeliveryInfo" => get_delivery_info(&request),
        other => ApiResponse::failure(
            &request,
            status::UNKNOWN_FUNCTION,
            format!("unknown function '{other}'"),
        ),
    };
    Ok(Json(response))
}

/// Extract and parse the JSON carried in the `jsonrequest` form field.
pub fn parse_form(body: &str) -> Result<ApiRequest, String> {
    let json = body
        .strip_prefix(FORM_FIELD)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or_else(|| format!("body must start with '{FORM_FIELD}='"))?;
    serde_json::from_str(json).map_err(|e| e.to_string())
}

fn check_client_version(request: &ApiRequest) -> ApiResponse {
    if request.client_version < MIN_CLIENT_VERSION {
        return ApiResponse::failure(
            request,
            status::OUTDATED_CLIENT,
            format!("client version {} is no longer supported", request.client_version),
        );
    }
    ApiResponse::ok(
        request,
        Some(json!({
            "LatestVersion": LATEST_CLIENT_VERSION,
            "MinimumVersion": MIN_CLIENT_VERSION,
        })),
    )
}

#[derive(Debug, Deserialize)]
struct OrderKey {
    #[serde(rename = "PartnerID")]
    partner_id: i64,
    #[serde(rename = "RestaurantID")]
    restaurant_id: i64,
    #[serde(rename = "OrderID")]
    order_id: String,
}

impl OrderKey {
    fn into_tuple(self) -> (i64, i64, String) {
        (self.partner_id, self.restaurant_id, self.order_id)
    }
}

fn data_object(request: &ApiRequest) -> Result<Map<String, Value>, ApiResponse> {
    match &request.data {
        Some(Value::Object(map)) => Ok(map.clone()),
        _ => Err(ApiResponse::failure(
            request,
            status::INVALID_DATA,
            "Data must be an object",
        )),
    }
}

fn order_key(request: &ApiRequest, data: &Map<String, Value>) -> Result<(i64, i64, String), ApiResponse> {
    OrderKey::deserialize(Value::Object(data.clone()))
        .map(OrderKey::into_tuple)
        .map_err(|e| ApiResponse::failure(request, status::INVALID_DATA, e.to_string()))
}

async fn create_external_order(db: &Db, request: &ApiRequest) -> ApiResponse {
    let mut order = match data_object(request) {
        Ok(order) => order,
        Err(failure) => return failure,
    };
    let key = match order_key(request, &order) {
        Ok(key) => key,
        Err(failure) => return failure,
    };

    let mut store = db.write().await;
    let existing = store.orders.get(&key).map(|existing| {
        (
            existing.get("ID").cloned().unwrap_or_default(),
            existing.get("CreateDate").cloned().unwrap_or_default(),
        )
    });
    let (id, create_date) = match existing {
        Some(kept) => kept,
        None => {
            store.next_id += 1;
            (json!(store.next_id), json!(format_time(now())))
        }
    };

    let price = |field: &str| order.get(field).and_then(Value::as_f64).unwrap_or(0.0);
    let total = price("OrderPrice") + price("DeliveryFee");
    let zip = order
        .get("RecipientLocation")
        .and_then(Value::as_str)
        .and_then(|location| location.split_whitespace().next())
        .filter(|token| !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string);

    order.insert("ID".to_string(), id);
    order.insert("CreateDate".to_string(), create_date);
    order.insert("TotalPrice".to_string(), json!(total));
    if let Some(zip) = zip {
        order.insert("RecipientZip".to_string(), json!(zip));
    }
    order
        .entry("OrderDetails")
        .or_insert_with(|| json!(""));
    store.orders.insert(key, order.clone());

    ApiResponse::ok(request, Some(Value::Object(order)))
}

async fn cancel_external_order(db: &Db, request: &ApiRequest) -> ApiResponse {
    let data = match data_object(request) {
        Ok(data) => data,
        Err(failure) => return failure,
    };
    let key = match order_key(request, &data) {
        Ok(key) => key,
        Err(failure) => return failure,
    };
    match db.write().await.orders.remove(&key) {
        Some(_) => ApiResponse::ok(request, None),
        None => ApiResponse::failure(
            request,
            status::NOT_FOUND,
            format!("order '{}' not found", key.2),
        ),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DeliveryQuery {
    #[serde(rename = "PartnerID")]
    partner_id: i64,
    #[serde(rename = "RestaurantID")]
    restaurant_id: i64,
    #[serde(default)]
    location: String,
    #[serde(default)]
    pickup_date: Option<String>,
}

fn get_delivery_info(request: &ApiRequest) -> ApiResponse {
    let data = match data_object(request) {
        Ok(data) => data,
        Err(failure) => return failure,
    };
    let query = match DeliveryQuery::deserialize(Value::Object(data)) {
        Ok(query) => query,
        Err(e) => return ApiResponse::failure(request, status::INVALID_DATA, e.to_string()),
    };
    let pickup = match query.pickup_date.as_deref().map(parse_time) {
        Some(Ok(pickup)) => pickup,
        Some(Err(reason)) => {
            return ApiResponse::failure(request, status::INVALID_DATA, reason);
        }
        None => now() + Duration::minutes(DELIVERY_DELAY_MINUTES),
    };
    let delivery = pickup + Duration::minutes(DELIVERY_MINUTES);

    ApiResponse::ok(
        request,
        Some(json!({
            "PartnerID": query.partner_id,
            "RestaurantID": query.restaurant_id,
            "Location": query.location,
            "PickupDate": format_time(pickup),
            "DeliveryDate": format_time(delivery),
            "DeliveryDelayTime": DELIVERY_DELAY_MINUTES,
            "DeliveryTime": DELIVERY_MINUTES,
            "DeliveryFee": DELIVERY_FEE,
        })),
    )
}

fn now() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

fn format_time(value: PrimitiveDateTime) -> String {
    value.format(WIRE_FORMAT).unwrap_or_default()
}

fn parse_time(value: &str) -> Result<PrimitiveDateTime, String> {
    PrimitiveDateTime::parse(value, WIRE_FORMAT).map_err(|e| format!("invalid date '{value}': {e}"))
}
