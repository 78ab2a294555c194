//! Problem Details - uniform violation report (RFC 9457 style)
//!
//! Every validator reports through the same carrier:
//! - `ProblemKind`: the closed set of registry problem kinds, each fixing
//!   `type`, `status` and `title`
//! - `ProblemReport`: one occurrence of a problem with its `detail` and `errors`
//! - `ErrorDetail`: one violation, pinned by `pointer` to the hint/query/location
//!
//! Field lengths follow the problem registry limits; longer values are
//! truncated on a char boundary.

use serde::{Deserialize, Serialize};

const REGISTRY_BASE: &str = "https://problems-registry.smartbear.com/";

pub const MAX_DETAIL_LEN: usize = 4096;
pub const MAX_REFERENCE_LEN: usize = 1024;
pub const MAX_CODE_LEN: usize = 50;
pub const MAX_ERRORS: usize = 1000;

/// Predefined problem kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemKind {
    AlreadyExists,
    BadRequest,
    BusinessRuleViolation,
    Forbidden,
    InvalidBodyPropertyFormat,
    InvalidBodyPropertyValue,
    InvalidParameters,
    InvalidRequestHeaderFormat,
    InvalidRequestParameterFormat,
    InvalidRequestParameterValue,
    LicenseCancelled,
    LicenseExpired,
    MissingBodyProperty,
    MissingRequestHeader,
    MissingRequestParameter,
    NotFound,
    ServerError,
    ServiceUnavailable,
    Unauthorized,
    ValidationError,
}

impl ProblemKind {
    pub const ALL: [ProblemKind; 20] = [
        Self::AlreadyExists,
        Self::BadRequest,
        Self::BusinessRuleViolation,
        Self::Forbidden,
        Self::InvalidBodyPropertyFormat,
        Self::InvalidBodyPropertyValue,
        Self::InvalidParameters,
        Self::InvalidRequestHeaderFormat,
        Self::InvalidRequestParameterFormat,
        Self::InvalidRequestParameterValue,
        Self::LicenseCancelled,
        Self::LicenseExpired,
        Self::MissingBodyProperty,
        Self::MissingRequestHeader,
        Self::MissingRequestParameter,
        Self::NotFound,
        Self::ServerError,
        Self::ServiceUnavailable,
        Self::Unauthorized,
        Self::ValidationError,
    ];

    /// Registry slug, the last segment of the type URI
    pub const fn slug(self) -> &'static str {
        match self {
            Self::AlreadyExists => "already-exists",
            Self::BadRequest => "bad-request",
            Self::BusinessRuleViolation => "business-rule-violation",
            Self::Forbidden => "forbidden",
            Self::InvalidBodyPropertyFormat => "invalid-body-property-format",
            Self::InvalidBodyPropertyValue => "invalid-body-property-value",
            Self::InvalidParameters => "invalid-parameters",
            Self::InvalidRequestHeaderFormat => "invalid-request-header-format",
            Self::InvalidRequestParameterFormat => "invalid-request-parameter-format",
            Self::InvalidRequestParameterValue => "invalid-request-parameter-value",
            Self::LicenseCancelled => "license-cancelled",
            Self::LicenseExpired => "license-expired",
            Self::MissingBodyProperty => "missing-body-property",
            Self::MissingRequestHeader => "missing-request-header",
            Self::MissingRequestParameter => "missing-request-parameter",
            Self::NotFound => "not-found",
            Self::ServerError => "server-error",
            Self::ServiceUnavailable => "service-unavailable",
            Self::Unauthorized => "unauthorized",
            Self::ValidationError => "validation-error",
        }
    }

    /// Full type URI
    pub fn type_uri(self) -> String {
        format!("{}{}", REGISTRY_BASE, self.slug())
    }

    /// Parse a type URI back into a kind
    pub fn from_type_uri(uri: &str) -> Option<Self> {
        let slug = uri.strip_prefix(REGISTRY_BASE)?;
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }

    pub const fn status(self) -> u16 {
        match self {
            Self::AlreadyExists => 409,
            Self::BusinessRuleViolation | Self::ValidationError => 422,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::ServerError => 500,
            Self::LicenseCancelled | Self::LicenseExpired | Self::ServiceUnavailable => 503,
            Self::Unauthorized => 401,
            Self::BadRequest
            | Self::InvalidBodyPropertyFormat
            | Self::InvalidBodyPropertyValue
            | Self::InvalidParameters
            | Self::InvalidRequestHeaderFormat
            | Self::InvalidRequestParameterFormat
            | Self::InvalidRequestParameterValue
            | Self::MissingBodyProperty
            | Self::MissingRequestHeader
            | Self::MissingRequestParameter => 400,
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::AlreadyExists => "Already exists",
            Self::BadRequest => "Bad Request",
            Self::BusinessRuleViolation => "Business Rule Violation",
            Self::Forbidden => "Forbidden",
            Self::InvalidBodyPropertyFormat => "Invalid Body Property Format",
            Self::InvalidBodyPropertyValue => "Invalid Body Property Value",
            Self::InvalidParameters => "Invalid parameters",
            Self::InvalidRequestHeaderFormat => "Invalid Request Header Format",
            Self::InvalidRequestParameterFormat => "Invalid Request Parameter Format",
            Self::InvalidRequestParameterValue => "Invalid Request Parameter Value",
            Self::LicenseCancelled => "License Cancelled",
            Self::LicenseExpired => "License Expired",
            Self::MissingBodyProperty => "Missing body property",
            Self::MissingRequestHeader => "Missing request header",
            Self::MissingRequestParameter => "Missing request parameter",
            Self::NotFound => "Not Found",
            Self::ServerError => "Server Error",
            Self::ServiceUnavailable => "Service Unavailable",
            Self::Unauthorized => "Unauthorized",
            Self::ValidationError => "Validation Error",
        }
    }

    pub const fn default_detail(self) -> &'static str {
        match self {
            Self::AlreadyExists => "The resource being created already exists.",
            Self::BadRequest => "The request is invalid or malformed.",
            Self::BusinessRuleViolation => {
                "The request body is invalid and not meeting business rules."
            }
            Self::Forbidden => {
                "The resource could not be returned as the requestor is not authorized."
            }
            Self::InvalidBodyPropertyFormat => "The request body contains a malformed property.",
            Self::InvalidBodyPropertyValue => {
                "The request body contains an invalid body property value."
            }
            Self::InvalidParameters => {
                "The request contained invalid, or malformed parameters (path or header or query)."
            }
            Self::InvalidRequestHeaderFormat => {
                "The request contains a malformed request header parameter."
            }
            Self::InvalidRequestParameterFormat => {
                "The request contains a malformed request query parameter."
            }
            Self::InvalidRequestParameterValue => {
                "The request body contains an invalid request parameter value."
            }
            Self::LicenseCancelled => "The service is unavailable as the license associated with your client or organization has been cancelled. Please contact your account manager or representative.",
            Self::LicenseExpired => "The service is unavailable as the license associated with your client or organization has expired. Please contact your account manager or representative.",
            Self::MissingBodyProperty => "The request is missing an expected body property.",
            Self::MissingRequestHeader => "The request is missing an expected HTTP request header.",
            Self::MissingRequestParameter => {
                "The request is missing an expected query or path parameter."
            }
            Self::NotFound => "The requested resource was not found.",
            Self::ServerError => "The server encountered an unexpected error.",
            Self::ServiceUnavailable => "The service is currently unavailable.",
            Self::Unauthorized => {
                "Access token not set or invalid, and the requested resource could not be returned."
            }
            Self::ValidationError => "The request is not valid.",
        }
    }
}

/// A single violation inside a problem report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Description of this specific violation
    pub detail: String,
    /// Hint query id, policy query or JSON pointer into the inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorDetail {
    /// Create a detail pinned to `pointer`
    pub fn new(pointer: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            detail: truncate(detail.into(), MAX_DETAIL_LEN),
            pointer: Some(truncate(pointer.into(), MAX_REFERENCE_LEN)),
            parameter: None,
            header: None,
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(truncate(code.into(), MAX_CODE_LEN));
        self
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(truncate(parameter.into(), MAX_REFERENCE_LEN));
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(truncate(header.into(), MAX_REFERENCE_LEN));
        self
    }

    /// Pointer or empty string
    pub fn pointer_str(&self) -> &str {
        self.pointer.as_deref().unwrap_or("")
    }
}

/// One occurrence of a problem
///
/// Built only through a [`ProblemKind`], so `type`, `status` and `title`
/// always agree with each other. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemReport {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub status: u16,
    pub title: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorDetail>,
}

impl ProblemReport {
    /// New report with the kind's default detail and no errors
    pub fn new(kind: ProblemKind) -> Self {
        Self {
            problem_type: kind.type_uri(),
            status: kind.status(),
            title: kind.title().to_string(),
            detail: kind.default_detail().to_string(),
            instance: None,
            code: None,
            errors: Vec::new(),
        }
    }

    /// Business rule violation carrying the given violations
    pub fn business_rule_violation(errors: Vec<ErrorDetail>) -> Self {
        Self::new(ProblemKind::BusinessRuleViolation).with_errors(errors)
    }

    /// Server error carrying the given details
    pub fn server_error(detail: impl Into<String>, errors: Vec<ErrorDetail>) -> Self {
        Self::new(ProblemKind::ServerError)
            .with_detail(detail)
            .with_errors(errors)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = truncate(detail.into(), MAX_DETAIL_LEN);
        self
    }

    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(truncate(instance.into(), MAX_REFERENCE_LEN));
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(truncate(code.into(), MAX_CODE_LEN));
        self
    }

    /// Attach error details (capped at [`MAX_ERRORS`])
    pub fn with_errors(mut self, mut errors: Vec<ErrorDetail>) -> Self {
        if errors.len() > MAX_ERRORS {
            tracing::warn!(
                dropped = errors.len() - MAX_ERRORS,
                "Problem report truncated to {} error details",
                MAX_ERRORS
            );
            errors.truncate(MAX_ERRORS);
        }
        self.errors = errors;
        self
    }

    /// Kind recovered from the type URI
    pub fn kind(&self) -> Option<ProblemKind> {
        ProblemKind::from_type_uri(&self.problem_type)
    }

    /// Error details whose pointer equals `pointer`
    pub fn errors_at<'a>(&'a self, pointer: &'a str) -> impl Iterator<Item = &'a ErrorDetail> {
        self.errors
            .iter()
            .filter(move |e| e.pointer.as_deref() == Some(pointer))
    }
}

fn truncate(mut s: String, max_chars: usize) -> String {
    if let Some((idx, _)) = s.char_indices().nth(max_chars) {
        s.truncate(idx);
    }
    s
}
