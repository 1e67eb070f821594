//! The outgoing request envelope.

use crate::fields::FieldMap;
use crate::payload::Payload;

/// Client version reported when none is set explicitly.
pub const DEFAULT_CLIENT_VERSION: f64 = 1.3;

/// Display language used when none is given.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Credentials, call metadata and the active function call.
///
/// The function name and payload are only ever assigned together through
/// [`set_call`](Self::set_call). [`clone_reset`](Self::clone_reset) derives
/// the envelope for the next call: same credentials and metadata, no call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    website: String,
    client_code: String,
    client_version: f64,
    language: String,
    test_mode: bool,
    user_token: String,
    function: Option<String>,
    data: Option<Payload>,
}

impl RequestEnvelope {
    /// `website` selects the site and database; `client_code` is the secret key.
    pub fn new(website: impl Into<String>, client_code: impl Into<String>) -> Self {
        Self {
            website: website.into(),
            client_code: client_code.into(),
            client_version: DEFAULT_CLIENT_VERSION,
            language: DEFAULT_LANGUAGE.to_string(),
            test_mode: false,
            user_token: String::new(),
            function: None,
            data: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Copy of this envelope with function and payload cleared.
    pub fn clone_reset(&self) -> Self {
        Self {
            website: self.website.clone(),
            client_code: self.client_code.clone(),
            client_version: self.client_version,
            language: self.language.clone(),
            test_mode: self.test_mode,
            user_token: self.user_token.clone(),
            function: None,
            data: None,
        }
    }

    pub fn website(&self) -> &str {
        &self.website
    }

    pub fn client_code(&self) -> &str {
        &self.client_code
    }

    pub fn client_version(&self) -> f64 {
        self.client_version
    }

    pub fn set_client_version(&mut self, version: f64) -> &mut Self {
        self.client_version = version;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// ISO code of the display language, e.g. `hu-HU`.
    pub fn set_language(&mut self, language: impl Into<String>) -> &mut Self {
        self.language = language.into();
        self
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    pub fn set_test_mode(&mut self, test_mode: bool) -> &mut Self {
        self.test_mode = test_mode;
        self
    }

    pub fn user_token(&self) -> &str {
        &self.user_token
    }

    /// Token for the few functions that need an authenticated user.
    pub fn set_user_token(&mut self, token: impl Into<String>) -> &mut Self {
        self.user_token = token.into();
        self
    }

    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    pub fn data(&self) -> Option<&Payload> {
        self.data.as_ref()
    }

    pub fn set_call(&mut self, function: impl Into<String>, data: Option<Payload>) -> &mut Self {
        self.function = Some(function.into());
        self.data = data;
        self
    }

    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields
            .set("Website", self.website.as_str())
            .set("ClientCode", self.client_code.as_str())
            .set("ClientVersion", self.client_version)
            .set("Language", self.language.as_str())
            .set("TestMode", self.test_mode)
            .set("UserToken", self.user_token.as_str())
            .set("Function", self.function.as_deref())
            .set_nested("Data", self.data.as_ref().map(Payload::to_fields));
        fields
    }

    /// Serialize to the JSON text carried in the `jsonrequest` form field.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        self.to_fields().to_json_string()
    }
}
