//! Delivery quote between a restaurant and a customer location.

use time::PrimitiveDateTime;

use crate::fields::FieldMap;
use crate::timestamp;

/// Request and result of `GetDeliveryInfo`.
///
/// Callers set the location and optional timestamps. The delay, time and fee
/// are computed by the API and only populated on decoded replies.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryInfo {
    partner_id: i64,
    restaurant_id: i64,
    location: String,
    pickup_date: Option<PrimitiveDateTime>,
    delivery_date: Option<PrimitiveDateTime>,
    delivery_delay_time: Option<i64>,
    delivery_time: Option<i64>,
    delivery_fee: Option<f64>,
}

/// Values only the API can assign to a delivery quote.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeliveryEstimate {
    pub delay_time: i64,
    pub time: i64,
    pub fee: f64,
}

impl DeliveryInfo {
    pub fn new(partner_id: i64, restaurant_id: i64) -> Self {
        Self {
            partner_id,
            restaurant_id,
            location: String::new(),
            pickup_date: None,
            delivery_date: None,
            delivery_delay_time: None,
            delivery_time: None,
            delivery_fee: None,
        }
    }

    pub(crate) fn with_estimate(mut self, estimate: DeliveryEstimate) -> Self {
        self.delivery_delay_time = Some(estimate.delay_time);
        self.delivery_time = Some(estimate.time);
        self.delivery_fee = Some(estimate.fee);
        self
    }

    pub fn partner_id(&self) -> i64 {
        self.partner_id
    }

    pub fn restaurant_id(&self) -> i64 {
        self.restaurant_id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Customer location used for lookup on the e-takeaway side.
    pub fn set_location(&mut self, location: impl Into<String>) -> &mut Self {
        self.location = location.into();
        self
    }

    pub fn pickup_date(&self) -> Option<PrimitiveDateTime> {
        self.pickup_date
    }

    pub fn set_pickup_date(&mut self, date: PrimitiveDateTime) -> &mut Self {
        self.pickup_date = Some(date);
        self
    }

    pub fn delivery_date(&self) -> Option<PrimitiveDateTime> {
        self.delivery_date
    }

    pub fn set_delivery_date(&mut self, date: PrimitiveDateTime) -> &mut Self {
        self.delivery_date = Some(date);
        self
    }

    /// System-wide delivery delay in minutes.
    pub fn delivery_delay_time(&self) -> Option<i64> {
        self.delivery_delay_time
    }

    /// Delivery time in minutes, delay included.
    pub fn delivery_time(&self) -> Option<i64> {
        self.delivery_time
    }

    /// Delivery fee in the site's default currency.
    pub fn delivery_fee(&self) -> Option<f64> {
        self.delivery_fee
    }

    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields
            .set("PartnerID", self.partner_id)
            .set("RestaurantID", self.restaurant_id)
            .set("Location", self.location.as_str())
            .set_opt("PickupDate", self.pickup_date.as_ref().map(timestamp::format))
            .set_opt("DeliveryDate", self.delivery_date.as_ref().map(timestamp::format));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn fresh_quote_has_no_estimate() {
        let info = DeliveryInfo::new(1, 2);
        assert_eq!(info.delivery_delay_time(), None);
        assert_eq!(info.delivery_time(), None);
        assert_eq!(info.delivery_fee(), None);
    }

    #[test]
    fn serializes_location_and_skips_unset_dates() {
        let mut info = DeliveryInfo::new(1, 2);
        info.set_location("1051 Budapest");
        assert_eq!(
            info.to_fields().to_json_string().unwrap(),
            r#"{"Location":"1051 Budapest","PartnerID":1,"RestaurantID":2}"#
        );
    }

    #[test]
    fn serializes_dates_when_set() {
        let mut info = DeliveryInfo::new(1, 2);
        info.set_pickup_date(datetime!(2024-05-01 12:00:00))
            .set_delivery_date(datetime!(2024-05-01 12:45:00));
        let json = info.to_fields().to_json();
        assert_eq!(json["PickupDate"], "2024-05-01T12:00:00");
        assert_eq!(json["DeliveryDate"], "2024-05-01T12:45:00");
    }

    #[test]
    fn estimate_is_never_serialized() {
        let info = DeliveryInfo::new(1, 2).with_estimate(DeliveryEstimate {
            delay_time: 10,
            time: 40,
            fee: 2.5,
        });
        assert_eq!(info.delivery_time(), Some(40));
        let fields = info.to_fields();
        assert!(!fields.contains_key("DeliveryTime"));
        assert!(!fields.contains_key("DeliveryFee"));
        assert!(!fields.contains_key("DeliveryDelayTime"));
    }
}
