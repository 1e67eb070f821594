//! The partner API dispatcher.
//!
//! # Design
//! `PartnerClient` owns the current [`RequestEnvelope`] and never mutates it
//! in place: each call starts from [`RequestEnvelope::clone_reset`], so the
//! envelope seen by one call cannot leak its function or payload into the
//! next. A call is split into [`build_request`](PartnerClient::build_request)
//! and [`parse_response`](PartnerClient::parse_response);
//! [`dispatch`](PartnerClient::dispatch) composes them around the transport.

use tracing::{debug, warn};

use crate::decode::Decoder;
use crate::delivery::DeliveryInfo;
use crate::error::{ApiError, DecodeError, TransportError};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::order::{ExternalOrder, ExternalOrderBase};
use crate::payload::Payload;
use crate::request::RequestEnvelope;
use crate::response::ResponseEnvelope;

/// Production endpoint of the partner API.
pub const API_URL: &str = "http://api.e-takeaway.com/v1/";

/// Name of the form field carrying the request JSON.
pub const FORM_FIELD: &str = "jsonrequest";

/// Function names understood by the partner API.
pub mod functions {
    pub const CREATE_EXTERNAL_ORDER: &str = "CreateExternalOrder";
    pub const CANCEL_EXTERNAL_ORDER: &str = "CancelExternalOrder";
    pub const GET_DELIVERY_INFO: &str = "GetDeliveryInfo";
    pub const CHECK_CLIENT_VERSION: &str = "CheckClientVersion";
}

/// Blocking client for the partner API.
///
/// One instance serves one logical caller; every call takes `&mut self`.
#[derive(Debug)]
pub struct PartnerClient<T> {
    request: RequestEnvelope,
    response: Option<ResponseEnvelope>,
    decoder: Decoder,
    endpoint: String,
    transport: T,
}

impl<T: Transport> PartnerClient<T> {
    pub fn new(request: RequestEnvelope, transport: T) -> Self {
        Self {
            request,
            response: None,
            decoder: Decoder::default(),
            endpoint: API_URL.to_string(),
            transport,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Register extra conversions on the live decoder.
    pub fn decoder_mut(&mut self) -> &mut Decoder {
        &mut self.decoder
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The envelope of the most recent call, or the initial one.
    pub fn request(&self) -> &RequestEnvelope {
        &self.request
    }

    /// Reply to the most recent call. `None` before the first call and after
    /// a call whose `Data` failed to decode. A non-2xx status or transport
    /// failure leaves the previous reply in place.
    pub fn last_response(&self) -> Option<&ResponseEnvelope> {
        self.response.as_ref()
    }

    /// Replace the held envelope with a fresh one for `function` and render
    /// it as a form POST.
    pub fn build_request(
        &mut self,
        function: &str,
        data: Option<Payload>,
    ) -> Result<HttpRequest, ApiError> {
        let mut next = self.request.clone_reset();
        next.set_call(function, data);
        self.request = next;

        let json = self.request.to_json().map_err(ApiError::Serialization)?;
        Ok(HttpRequest {
            path: self.endpoint.clone(),
            headers: vec![
                (
                    "Content-Type".to_string(),
                    "application/x-www-form-urlencoded".to_string(),
                ),
                ("Expect".to_string(), String::new()),
            ],
            body: format!("{FORM_FIELD}={json}"),
        })
    }

    /// Decode the reply to the last built request and keep it as
    /// [`last_response`](Self::last_response).
    ///
    /// A 2xx reply whose body is not a response envelope yields a failed
    /// envelope rather than an error.
    pub fn parse_response(&mut self, response: HttpResponse) -> Result<ResponseEnvelope, ApiError> {
        check_status(&response)?;
        let envelope = match self.decoder.decode_slice(&response.body) {
            Ok(envelope) => envelope,
            Err(DecodeError::Protocol(diagnostic)) => {
                warn!(
                    function = self.request.function().unwrap_or_default(),
                    %diagnostic,
                    "invalid response, synthesizing failure"
                );
                ResponseEnvelope::invalid(&self.request, diagnostic)
            }
            Err(DecodeError::Data { function, source }) => {
                self.response = None;
                return Err(ApiError::DataDecode { function, source });
            }
        };
        self.response = Some(envelope.clone());
        Ok(envelope)
    }

    /// Send one call and return its decoded reply.
    pub fn dispatch(
        &mut self,
        function: &str,
        data: Option<Payload>,
    ) -> Result<ResponseEnvelope, ApiError> {
        let request = self.build_request(function, data)?;
        debug!(function, endpoint = %self.endpoint, "dispatching");
        let response = self.transport.send(&request)?;
        self.parse_response(response)
    }

    /// Create an order, or edit the existing one with the same identifiers.
    pub fn create_external_order(
        &mut self,
        order: ExternalOrder,
    ) -> Result<ResponseEnvelope, ApiError> {
        self.dispatch(functions::CREATE_EXTERNAL_ORDER, Some(order.into()))
    }

    pub fn cancel_external_order(
        &mut self,
        order: &ExternalOrderBase,
    ) -> Result<ResponseEnvelope, ApiError> {
        self.dispatch(functions::CANCEL_EXTERNAL_ORDER, Some(order.clone().into()))
    }

    /// Ask for the delivery estimate of a would-be order.
    pub fn get_delivery_info(&mut self, info: DeliveryInfo) -> Result<ResponseEnvelope, ApiError> {
        self.dispatch(functions::GET_DELIVERY_INFO, Some(info.into()))
    }

    pub fn check_client_version(&mut self) -> Result<ResponseEnvelope, ApiError> {
        self.dispatch(functions::CHECK_CLIENT_VERSION, None)
    }
}

/// Map non-2xx replies to [`TransportError::Status`].
fn check_status(response: &HttpResponse) -> Result<(), TransportError> {
    if response.is_success() {
        return Ok(());
    }
    Err(TransportError::Status {
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    })
}
