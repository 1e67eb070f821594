//! Turns raw reply JSON into a [`ResponseEnvelope`].
//!
//! # Design
//! Which payload type `Data` becomes is decided by the reply's `Function`
//! tag alone. A [`Decoder`] maps function names to conversions; functions
//! without one decode to a [`DataBag`]. The built-in conversions are the only
//! code that can assign the decode-only fields of orders and delivery quotes.

use std::collections::HashMap;
use std::fmt;

use serde::de::Error as _;
use serde::Deserialize;
use serde_json::Value;
use time::PrimitiveDateTime;
use tracing::debug;

use crate::delivery::{DeliveryEstimate, DeliveryInfo};
use crate::error::DecodeError;
use crate::order::{self, DecodedOrderFields, ExternalOrder};
use crate::payload::{DataBag, Payload};
use crate::response::{ResponseEnvelope, StatusCode};
use crate::timestamp;

/// Converts the `Data` of one function's reply into a payload.
pub type Conversion = Box<dyn Fn(&Value) -> Result<Payload, serde_json::Error> + Send + Sync>;

/// Top-level shape every reply must have.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawResponse {
    status: bool,
    status_code: StatusCode,
    status_message: String,
    #[serde(default)]
    error_message: Option<String>,
    language: String,
    test_mode: bool,
    function: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Registry of per-function conversions.
pub struct Decoder {
    conversions: HashMap<String, Conversion>,
}

impl Default for Decoder {
    /// A decoder with the conversions for `GetDeliveryInfo` and
    /// `CreateExternalOrder` registered.
    fn default() -> Self {
        let mut decoder = Self::empty();
        decoder
            .register(crate::client::functions::GET_DELIVERY_INFO, delivery_info)
            .register(crate::client::functions::CREATE_EXTERNAL_ORDER, external_order);
        decoder
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<_> = self.conversions.keys().collect();
        functions.sort();
        f.debug_struct("Decoder").field("functions", &functions).finish()
    }
}

impl Decoder {
    /// A decoder that turns every `Data` into a [`DataBag`].
    pub fn empty() -> Self {
        Self {
            conversions: HashMap::new(),
        }
    }

    /// Register `conversion` for `function`, replacing any earlier one.
    pub fn register<F>(&mut self, function: impl Into<String>, conversion: F) -> &mut Self
    where
        F: Fn(&Value) -> Result<Payload, serde_json::Error> + Send + Sync + 'static,
    {
        self.conversions.insert(function.into(), Box::new(conversion));
        self
    }

    pub fn is_registered(&self, function: &str) -> bool {
        self.conversions.contains_key(function)
    }

    /// Parse and decode a raw reply body.
    pub fn decode_slice(&self, body: &[u8]) -> Result<ResponseEnvelope, DecodeError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| DecodeError::Protocol(e.to_string()))?;
        self.decode(value)
    }

    /// Decode an already parsed reply.
    pub fn decode(&self, value: Value) -> Result<ResponseEnvelope, DecodeError> {
        if value.is_null() {
            return Err(DecodeError::Protocol("response body is empty".to_string()));
        }
        let raw: RawResponse =
            serde_json::from_value(value).map_err(|e| DecodeError::Protocol(e.to_string()))?;

        let mut response = ResponseEnvelope::new(raw.status, raw.status_code)
            .with_status_message(raw.status_message)
            .with_language(raw.language)
            .with_test_mode(raw.test_mode)
            .with_function(raw.function.as_str());
        if let Some(message) = raw.error_message {
            response = response.with_error_message(message);
        }

        match raw.data {
            None | Some(Value::Null) => Ok(response),
            Some(data) => {
                let payload = self.convert(&raw.function, data)?;
                Ok(response.with_data(payload))
            }
        }
    }

    fn convert(&self, function: &str, data: Value) -> Result<Payload, DecodeError> {
        if let Some(conversion) = self.conversions.get(function) {
            debug!(function, "decoding data with registered conversion");
            return conversion(&data).map_err(|source| DecodeError::Data {
                function: function.to_string(),
                source,
            });
        }
        debug!(function, "no conversion registered, decoding data as generic bag");
        Ok(Payload::Generic(DataBag::from(data)))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DeliveryInfoData {
    #[serde(rename = "PartnerID")]
    partner_id: i64,
    #[serde(rename = "RestaurantID")]
    restaurant_id: i64,
    #[serde(default)]
    location: Option<String>,
    pickup_date: String,
    delivery_date: String,
    delivery_delay_time: i64,
    delivery_time: i64,
    delivery_fee: f64,
}

/// `GetDeliveryInfo` → [`Payload::DeliveryInfo`].
pub fn delivery_info(data: &Value) -> Result<Payload, serde_json::Error> {
    let data = DeliveryInfoData::deserialize(data)?;
    let mut info = DeliveryInfo::new(data.partner_id, data.restaurant_id);
    if let Some(location) = data.location {
        info.set_location(location);
    }
    info.set_pickup_date(parse_time("PickupDate", &data.pickup_date)?)
        .set_delivery_date(parse_time("DeliveryDate", &data.delivery_date)?);
    Ok(Payload::DeliveryInfo(info.with_estimate(DeliveryEstimate {
        delay_time: data.delivery_delay_time,
        time: data.delivery_time,
        fee: data.delivery_fee,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExternalOrderData {
    #[serde(rename = "PartnerID")]
    partner_id: i64,
    #[serde(rename = "RestaurantID")]
    restaurant_id: i64,
    #[serde(rename = "OrderID")]
    order_id: String,
    #[serde(rename = "ID", default)]
    id: Option<i64>,
    #[serde(default)]
    create_date: Option<String>,
    #[serde(default)]
    total_price: f64,
    #[serde(default)]
    delivery_fee: f64,
    #[serde(default)]
    order_price: f64,
    #[serde(default)]
    pickup_date: Option<String>,
    #[serde(default)]
    delivery_date: Option<String>,
    #[serde(default)]
    recipient_name: Option<String>,
    #[serde(default)]
    recipient_address: Option<String>,
    #[serde(default)]
    recipient_address_notes: Option<String>,
    #[serde(default)]
    recipient_phone: Option<String>,
    #[serde(default)]
    recipient_company: Option<String>,
    #[serde(default)]
    recipient_location: Option<String>,
    #[serde(default)]
    recipient_zip: Option<String>,
    #[serde(default)]
    recipient_count: u32,
    #[serde(default)]
    order_comments: Option<String>,
    #[serde(default)]
    order_details: Option<String>,
}

/// `CreateExternalOrder` → [`Payload::Order`].
pub fn external_order(data: &Value) -> Result<Payload, serde_json::Error> {
    let data = ExternalOrderData::deserialize(data)?;
    let mut order = ExternalOrder::new(data.partner_id, data.restaurant_id, data.order_id);
    order
        .set_delivery_fee(data.delivery_fee)
        .set_order_price(data.order_price)
        .set_recipient_count(data.recipient_count);
    if let Some(date) = data.pickup_date {
        order.set_pickup_date(parse_time("PickupDate", &date)?);
    }
    if let Some(date) = data.delivery_date {
        order.set_delivery_date(parse_time("DeliveryDate", &date)?);
    }
    if let Some(v) = data.recipient_name {
        order.set_recipient_name(v);
    }
    if let Some(v) = data.recipient_address {
        order.set_recipient_address(v);
    }
    if let Some(v) = data.recipient_address_notes {
        order.set_recipient_address_notes(v);
    }
    if let Some(v) = data.recipient_phone {
        order.set_recipient_phone(v);
    }
    if let Some(v) = data.recipient_company {
        order.set_recipient_company(v);
    }
    if let Some(v) = data.recipient_location {
        order.set_recipient_location(v);
    }
    if let Some(v) = data.order_comments {
        order.set_order_comments(v);
    }
    let mut order_details_text = None;
    if let Some(details) = data.order_details {
        match order::parse_items(&details) {
            Ok(items) => {
                for item in items {
                    order.add_item(item);
                }
            }
            Err(err) => {
                debug!(%err, "OrderDetails is free text, keeping it verbatim");
                order_details_text = Some(details);
            }
        }
    }
    let create_date = match data.create_date {
        Some(date) => Some(parse_time("CreateDate", &date)?),
        None => None,
    };
    order.apply_decoded(DecodedOrderFields {
        external_id: data.id,
        create_date,
        total_price: data.total_price,
        recipient_zip: data.recipient_zip,
        order_details_text,
    });
    Ok(Payload::Order(order))
}

fn parse_time(field: &str, value: &str) -> Result<PrimitiveDateTime, serde_json::Error> {
    timestamp::parse(value)
        .map_err(|e| serde_json::Error::custom(format!("invalid {field} '{value}': {e}")))
}
