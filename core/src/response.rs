//! The decoded reply envelope.

use serde::{Deserialize, Serialize};

use crate::payload::Payload;
use crate::request::RequestEnvelope;

/// Numeric status reported by the API in `StatusCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub i64);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(0);

    /// Never sent by the server; marks a reply the client could not decode.
    pub const INVALID_RESPONSE: StatusCode = StatusCode(-1);
}

/// Outcome of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    status: bool,
    status_code: StatusCode,
    status_message: String,
    error_message: Option<String>,
    language: String,
    test_mode: bool,
    function: String,
    data: Option<Payload>,
}

impl ResponseEnvelope {
    pub fn new(status: bool, status_code: StatusCode) -> Self {
        Self {
            status,
            status_code,
            status_message: String::new(),
            error_message: None,
            language: String::new(),
            test_mode: false,
            function: String::new(),
            data: None,
        }
    }

    /// Failure envelope for a reply that is not a valid response, correlated
    /// with the request that produced it.
    pub(crate) fn invalid(request: &RequestEnvelope, diagnostic: impl Into<String>) -> Self {
        Self::new(false, StatusCode::INVALID_RESPONSE)
            .with_status_message("Error")
            .with_error_message(diagnostic)
            .with_language(request.language())
            .with_test_mode(request.test_mode())
            .with_function(request.function().unwrap_or_default())
    }

    pub fn with_status_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = message.into();
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    pub fn with_data(mut self, data: Payload) -> Self {
        self.data = Some(data);
        self
    }

    /// `true` when the call succeeded.
    pub fn status(&self) -> bool {
        self.status
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn data(&self) -> Option<&Payload> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<Payload> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_copies_call_metadata_from_request() {
        let mut request = RequestEnvelope::new("42", "abc").with_language("hu-HU");
        request
            .set_test_mode(true)
            .set_call("CreateExternalOrder", None);
        let response = ResponseEnvelope::invalid(&request, "EOF while parsing");
        assert!(!response.status());
        assert_eq!(response.status_code(), StatusCode::INVALID_RESPONSE);
        assert_eq!(response.status_message(), "Error");
        assert_eq!(response.error_message(), Some("EOF while parsing"));
        assert_eq!(response.language(), "hu-HU");
        assert!(response.test_mode());
        assert_eq!(response.function(), "CreateExternalOrder");
        assert!(response.data().is_none());
    }

    #[test]
    fn status_code_is_a_bare_integer_on_the_wire() {
        let code: StatusCode = serde_json::from_str("7").unwrap();
        assert_eq!(code, StatusCode(7));
        assert_eq!(serde_json::to_string(&StatusCode::OK).unwrap(), "0");
    }
}
