//! External orders handed to e-takeaway for delivery.
//!
//! # Design
//! `ExternalOrderBase` carries the three identifiers every order-related call
//! needs. `ExternalOrder` embeds it and adds pricing, timing, recipient
//! details and line items; [`ExternalOrder::base`] projects the identifiers
//! back out, which is what cancellation sends.
//!
//! Fields the API computes (`ID`, `CreateDate`, `TotalPrice`, `RecipientZip`)
//! have getters only. They are filled in by the decoder through
//! [`ExternalOrder::apply_decoded`], which is not reachable outside the crate.

use std::fmt;
use std::str::FromStr;

use time::PrimitiveDateTime;

use crate::error::FormatError;
use crate::fields::FieldMap;
use crate::timestamp;

/// Separator placed between line items in `OrderDetails`.
///
/// This is the literal text `\r\n` (four characters), not a line break.
pub const ITEM_SEPARATOR: &str = "\\r\\n";

/// A single ordered item, rendered as `<amount>x<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    name: String,
    amount: u64,
}

impl Item {
    /// Amounts below 1 are stored as 1.
    pub fn new(name: impl Into<String>, amount: i64) -> Self {
        let amount = amount.max(1).unsigned_abs();
        Self {
            name: name.into(),
            amount,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.amount, self.name)
    }
}

impl FromStr for Item {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (amount, name) = s.split_once('x').ok_or_else(|| FormatError {
            input: s.to_string(),
            reason: "missing 'x' between amount and name",
        })?;
        let amount: i64 = amount.parse().map_err(|_| FormatError {
            input: s.to_string(),
            reason: "amount is not an integer",
        })?;
        Ok(Item::new(name, amount))
    }
}

/// Join items into the `OrderDetails` text.
pub fn format_items(items: &[Item]) -> String {
    items
        .iter()
        .map(Item::to_string)
        .collect::<Vec<_>>()
        .join(ITEM_SEPARATOR)
}

/// Split `OrderDetails` text back into items. An empty string yields no items.
pub fn parse_items(details: &str) -> Result<Vec<Item>, FormatError> {
    if details.is_empty() {
        return Ok(Vec::new());
    }
    details.split(ITEM_SEPARATOR).map(str::parse::<Item>).collect()
}

/// Identifiers shared by every order call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalOrderBase {
    partner_id: i64,
    restaurant_id: i64,
    order_id: String,
}

impl ExternalOrderBase {
    pub fn new(partner_id: i64, restaurant_id: i64, order_id: impl Into<String>) -> Self {
        Self {
            partner_id,
            restaurant_id,
            order_id: order_id.into(),
        }
    }

    /// Partner id in the e-takeaway database.
    pub fn partner_id(&self) -> i64 {
        self.partner_id
    }

    /// Restaurant the order was placed at.
    pub fn restaurant_id(&self) -> i64 {
        self.restaurant_id
    }

    /// Order id in the partner's own database.
    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields
            .set("PartnerID", self.partner_id)
            .set("RestaurantID", self.restaurant_id)
            .set("OrderID", self.order_id.as_str());
        fields
    }
}

/// An order placed with a partner restaurant that e-takeaway should deliver.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalOrder {
    base: ExternalOrderBase,
    external_id: Option<i64>,
    create_date: Option<PrimitiveDateTime>,
    total_price: f64,
    delivery_fee: f64,
    order_price: f64,
    pickup_date: Option<PrimitiveDateTime>,
    delivery_date: Option<PrimitiveDateTime>,
    recipient_name: String,
    recipient_address: String,
    recipient_address_notes: String,
    recipient_phone: String,
    recipient_company: String,
    recipient_location: String,
    recipient_zip: Option<String>,
    recipient_count: u32,
    order_comments: String,
    items: Vec<Item>,
    order_details_text: Option<String>,
}

/// Values only the API can assign to an order.
#[derive(Debug, Clone, Default)]
pub(crate) struct DecodedOrderFields {
    pub external_id: Option<i64>,
    pub create_date: Option<PrimitiveDateTime>,
    pub total_price: f64,
    pub recipient_zip: Option<String>,
    pub order_details_text: Option<String>,
}

impl ExternalOrder {
    pub fn new(partner_id: i64, restaurant_id: i64, order_id: impl Into<String>) -> Self {
        Self::from_base(ExternalOrderBase::new(partner_id, restaurant_id, order_id))
    }

    pub fn from_base(base: ExternalOrderBase) -> Self {
        Self {
            base,
            external_id: None,
            create_date: None,
            total_price: 0.0,
            delivery_fee: 0.0,
            order_price: 0.0,
            pickup_date: None,
            delivery_date: None,
            recipient_name: String::new(),
            recipient_address: String::new(),
            recipient_address_notes: String::new(),
            recipient_phone: String::new(),
            recipient_company: String::new(),
            recipient_location: String::new(),
            recipient_zip: None,
            recipient_count: 0,
            order_comments: String::new(),
            items: Vec::new(),
            order_details_text: None,
        }
    }

    pub(crate) fn apply_decoded(&mut self, decoded: DecodedOrderFields) {
        self.external_id = decoded.external_id;
        self.create_date = decoded.create_date;
        self.total_price = decoded.total_price;
        self.recipient_zip = decoded.recipient_zip;
        self.order_details_text = decoded.order_details_text;
    }

    /// The identifying prefix of this order.
    pub fn base(&self) -> &ExternalOrderBase {
        &self.base
    }

    pub fn partner_id(&self) -> i64 {
        self.base.partner_id
    }

    pub fn restaurant_id(&self) -> i64 {
        self.base.restaurant_id
    }

    pub fn order_id(&self) -> &str {
        &self.base.order_id
    }

    /// Id assigned by e-takeaway once the order exists on their side.
    pub fn external_id(&self) -> Option<i64> {
        self.external_id
    }

    pub fn create_date(&self) -> Option<PrimitiveDateTime> {
        self.create_date
    }

    /// Order price plus e-takeaway's delivery fee, as computed by the API.
    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    pub fn delivery_fee(&self) -> f64 {
        self.delivery_fee
    }

    /// Overrides the fee e-takeaway would otherwise calculate. `0` means "let
    /// the API decide".
    pub fn set_delivery_fee(&mut self, fee: f64) -> &mut Self {
        self.delivery_fee = fee;
        self
    }

    pub fn order_price(&self) -> f64 {
        self.order_price
    }

    pub fn set_order_price(&mut self, price: f64) -> &mut Self {
        self.order_price = price;
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

    pub fn recipient_name(&self) -> &str {
        &self.recipient_name
    }

    pub fn set_recipient_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.recipient_name = name.into();
        self
    }

    pub fn recipient_address(&self) -> &str {
        &self.recipient_address
    }

    pub fn set_recipient_address(&mut self, address: impl Into<String>) -> &mut Self {
        self.recipient_address = address.into();
        self
    }

    pub fn recipient_address_notes(&self) -> &str {
        &self.recipient_address_notes
    }

    pub fn set_recipient_address_notes(&mut self, notes: impl Into<String>) -> &mut Self {
        self.recipient_address_notes = notes.into();
        self
    }

    pub fn recipient_phone(&self) -> &str {
        &self.recipient_phone
    }

    pub fn set_recipient_phone(&mut self, phone: impl Into<String>) -> &mut Self {
        self.recipient_phone = phone.into();
        self
    }

    pub fn recipient_company(&self) -> &str {
        &self.recipient_company
    }

    pub fn set_recipient_company(&mut self, company: impl Into<String>) -> &mut Self {
        self.recipient_company = company.into();
        self
    }

    pub fn recipient_location(&self) -> &str {
        &self.recipient_location
    }

    pub fn set_recipient_location(&mut self, location: impl Into<String>) -> &mut Self {
        self.recipient_location = location.into();
        self
    }

    /// Zip code the API resolved from `RecipientLocation`.
    pub fn recipient_zip(&self) -> Option<&str> {
        self.recipient_zip.as_deref()
    }

    pub fn recipient_count(&self) -> u32 {
        self.recipient_count
    }

    /// Number of people eating; tells the restaurant how much cutlery to pack.
    pub fn set_recipient_count(&mut self, count: u32) -> &mut Self {
        self.recipient_count = count;
        self
    }

    pub fn order_comments(&self) -> &str {
        &self.order_comments
    }

    pub fn set_order_comments(&mut self, comments: impl Into<String>) -> &mut Self {
        self.order_comments = comments.into();
        self
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn add_item(&mut self, item: Item) -> &mut Self {
        self.items.push(item);
        self
    }

    pub fn clear_items(&mut self) -> &mut Self {
        self.items.clear();
        self
    }

    /// `OrderDetails` exactly as the API returned it, when it was not a
    /// list of `<amount>x<name>` items.
    pub fn order_details_text(&self) -> Option<&str> {
        self.order_details_text.as_deref()
    }

    /// `OrderDetails` as sent on the wire. Items win over decoded free text.
    pub fn order_details(&self) -> String {
        match &self.order_details_text {
            Some(text) if self.items.is_empty() => text.clone(),
            _ => format_items(&self.items),
        }
    }

    pub fn to_fields(&self) -> FieldMap {
        let mut fields = self.base.to_fields();
        fields
            .set("OrderPrice", self.order_price)
            .set("RecipientName", self.recipient_name.as_str())
            .set("RecipientAddress", self.recipient_address.as_str())
            .set("RecipientPhone", self.recipient_phone.as_str())
            .set("RecipientLocation", self.recipient_location.as_str())
            .set("OrderDetails", self.order_details());

        if self.delivery_fee > 0.0 {
            fields.set("DeliveryFee", self.delivery_fee);
        }
        fields
            .set_opt("PickupDate", self.pickup_date.as_ref().map(timestamp::format))
            .set_opt("DeliveryDate", self.delivery_date.as_ref().map(timestamp::format))
            .set_opt("RecipientAddressNotes", non_empty(&self.recipient_address_notes))
            .set_opt("RecipientCompany", non_empty(&self.recipient_company))
            .set_opt("OrderComments", non_empty(&self.order_comments));
        if self.recipient_count > 0 {
            fields.set("RecipientCount", self.recipient_count);
        }
        fields
    }
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn item_amount_is_clamped_to_one() {
        assert_eq!(Item::new("Pizza", 0).amount(), 1);
        assert_eq!(Item::new("Pizza", -5).amount(), 1);
        assert_eq!(Item::new("Pizza", 3).amount(), 3);
    }

    #[test]
    fn item_renders_amount_then_name() {
        assert_eq!(Item::new("Margherita", 2).to_string(), "2xMargherita");
    }

    #[test]
    fn item_parses_on_first_x_only() {
        let item: Item = "3xMax Extra Burger".parse().unwrap();
        assert_eq!(item.amount(), 3);
        assert_eq!(item.name(), "Max Extra Burger");
    }

    #[test]
    fn item_round_trips() {
        for item in [Item::new("Soup", 1), Item::new("Coke xl", 12), Item::new("", 4)] {
            let back: Item = item.to_string().parse().unwrap();
            assert_eq!(back, item);
        }
    }

    #[test]
    fn item_without_separator_is_rejected() {
        let err = "Pizza".parse::<Item>().unwrap_err();
        assert_eq!(err.input, "Pizza");
    }

    #[test]
    fn item_with_non_numeric_amount_is_rejected() {
        assert!("twoxPizza".parse::<Item>().is_err());
        assert!("xPizza".parse::<Item>().is_err());
    }

    #[test]
    fn item_with_non_positive_amount_parses_clamped() {
        let item: Item = "0xSalad".parse().unwrap();
        assert_eq!(item.amount(), 1);
    }

    #[test]
    fn items_join_with_literal_separator() {
        let items = vec![Item::new("Pizza", 2), Item::new("Cola", 1)];
        let details = format_items(&items);
        assert_eq!(details, r"2xPizza\r\n1xCola");
        assert!(!details.contains('\n'));
        assert_eq!(parse_items(&details).unwrap(), items);
    }

    #[test]
    fn empty_details_mean_no_items() {
        assert!(parse_items("").unwrap().is_empty());
        assert_eq!(format_items(&[]), "");
    }

    #[test]
    fn base_renders_identifiers() {
        let base = ExternalOrderBase::new(7, 42, "A-1");
        assert_eq!(
            base.to_fields().to_json_string().unwrap(),
            r#"{"OrderID":"A-1","PartnerID":7,"RestaurantID":42}"#
        );
    }

    #[test]
    fn minimal_order_omits_optional_fields() {
        let order = ExternalOrder::new(7, 42, "A-1");
        let fields = order.to_fields();
        for key in [
            "DeliveryFee",
            "PickupDate",
            "DeliveryDate",
            "RecipientAddressNotes",
            "RecipientCompany",
            "RecipientCount",
            "OrderComments",
        ] {
            assert!(!fields.contains_key(key), "{key} should be omitted");
        }
        assert_eq!(
            fields.to_json(),
            serde_json::json!({
                "OrderDetails": "",
                "OrderID": "A-1",
                "OrderPrice": 0.0,
                "PartnerID": 7,
                "RecipientAddress": "",
                "RecipientLocation": "",
                "RecipientName": "",
                "RecipientPhone": "",
                "RestaurantID": 42
            })
        );
    }

    #[test]
    fn base_fields_are_a_prefix_of_order_fields() {
        let order = ExternalOrder::new(1, 2, "x");
        let order_fields = order.to_fields();
        for key in order.base().to_fields().keys() {
            assert_eq!(order_fields.get(key), order.base().to_fields().get(key));
        }
    }

    #[test]
    fn full_order_emits_everything_set() {
        let mut order = ExternalOrder::new(7, 42, "A-1");
        order
            .set_order_price(21.5)
            .set_delivery_fee(3.0)
            .set_pickup_date(datetime!(2024-05-01 18:00:00))
            .set_delivery_date(datetime!(2024-05-01 18:30:00))
            .set_recipient_name("Jane Doe")
            .set_recipient_address("Main street 1")
            .set_recipient_address_notes("2nd floor")
            .set_recipient_phone("+3612345678")
            .set_recipient_company("ACME")
            .set_recipient_location("Budapest")
            .set_recipient_count(3)
            .set_order_comments("Ring twice")
            .add_item(Item::new("Pizza", 2))
            .add_item(Item::new("Cola", 1));

        let json = order.to_fields().to_json();
        assert_eq!(json["DeliveryFee"], 3.0);
        assert_eq!(json["PickupDate"], "2024-05-01T18:00:00");
        assert_eq!(json["DeliveryDate"], "2024-05-01T18:30:00");
        assert_eq!(json["RecipientAddressNotes"], "2nd floor");
        assert_eq!(json["RecipientCompany"], "ACME");
        assert_eq!(json["RecipientCount"], 3);
        assert_eq!(json["OrderComments"], "Ring twice");
        assert_eq!(json["OrderDetails"], r"2xPizza\r\n1xCola");
    }

    #[test]
    fn clearing_items_empties_details() {
        let mut order = ExternalOrder::new(1, 2, "x");
        order.add_item(Item::new("Pizza", 1)).clear_items();
        assert!(order.items().is_empty());
        assert_eq!(order.order_details(), "");
    }

    #[test]
    fn decoded_fields_have_no_public_setter_but_are_readable() {
        let mut order = ExternalOrder::new(1, 2, "x");
        order.apply_decoded(DecodedOrderFields {
            external_id: Some(99),
            create_date: Some(datetime!(2024-01-02 03:04:05)),
            total_price: 12.5,
            recipient_zip: Some("1051".into()),
            ..DecodedOrderFields::default()
        });
        assert_eq!(order.external_id(), Some(99));
        assert_eq!(order.total_price(), 12.5);
        assert_eq!(order.recipient_zip(), Some("1051"));
        // decode-only fields never go back on the wire
        assert!(!order.to_fields().contains_key("ID"));
    }

    #[test]
    fn large_amount_round_trips_unchanged() {
        let item: Item = "5000000000xPizza".parse().unwrap();
        assert_eq!(item.amount(), 5_000_000_000);
        assert_eq!(item.to_string(), "5000000000xPizza");
        let max = Item::new("Pizza", i64::MAX);
        assert_eq!(max.to_string().parse::<Item>().unwrap(), max);
    }

    #[test]
    fn amount_beyond_i64_is_rejected() {
        assert!("99999999999999999999xPizza".parse::<Item>().is_err());
    }

    #[test]
    fn decoded_free_text_details_are_kept() {
        let mut order = ExternalOrder::new(1, 2, "x");
        order.apply_decoded(DecodedOrderFields {
            order_details_text: Some("Extra napkins".into()),
            ..DecodedOrderFields::default()
        });
        assert_eq!(order.order_details_text(), Some("Extra napkins"));
        assert_eq!(order.order_details(), "Extra napkins");
        assert_eq!(order.to_fields().to_json()["OrderDetails"], "Extra napkins");

        order.add_item(Item::new("Cola", 1));
        assert_eq!(order.order_details(), "1xCola");
    }
}
