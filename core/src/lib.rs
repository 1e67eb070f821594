//! Client core for the e-takeaway partner API.
//!
//! # Overview
//! Every call is one form POST whose `jsonrequest` field carries a JSON
//! request envelope: credentials, call metadata, a function name and a
//! payload. The reply is a JSON response envelope whose `Data` shape depends
//! on the function that was called.
//!
//! # Design
//! - `PartnerClient` holds the current `RequestEnvelope` and derives a fresh
//!   one per call, so nothing from one call leaks into the next.
//! - Payloads are a closed `Payload` enum rendered through `FieldMap`, which
//!   sorts keys and emits only fields that were set.
//! - `Decoder` maps function names to conversions; anything unregistered
//!   lands in a `DataBag`.
//! - The network sits behind the `Transport` trait. `build_request` and
//!   `parse_response` can also be driven by the host directly.

pub mod client;
pub mod decode;
pub mod delivery;
pub mod error;
pub mod fields;
pub mod http;
pub mod order;
pub mod payload;
pub mod request;
pub mod response;
pub mod timestamp;

pub use client::{functions, PartnerClient, API_URL};
pub use decode::{Conversion, Decoder};
pub use delivery::DeliveryInfo;
pub use error::{ApiError, DecodeError, FormatError, TransportError};
pub use fields::{FieldMap, FieldValue};
pub use http::{HttpRequest, HttpResponse, Transport};
#[cfg(feature = "ureq")]
pub use http::UreqTransport;
pub use order::{ExternalOrder, ExternalOrderBase, Item};
pub use payload::{DataBag, Payload};
pub use request::RequestEnvelope;
pub use response::{ResponseEnvelope, StatusCode};
