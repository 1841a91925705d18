//! GraphQL wire types and store error classification.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A GraphQL request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlRequest {
    pub query: String,
    pub variables: Value,
}

impl GraphQlRequest {
    pub fn new(query: impl Into<String>, variables: Value) -> Self {
        Self {
            query: query.into(),
            variables,
        }
    }
}

/// A GraphQL response body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub path: Option<Vec<Value>>,
}

impl GraphQlResponse {
    /// A successful response carrying `data`.
    #[must_use]
    pub fn with_data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// A response carrying a single store-reported error.
    #[must_use]
    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: Some(vec![GraphQlError {
                message: message.into(),
                path: None,
            }]),
        }
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Message of the first reported error.
    #[must_use]
    pub fn first_error(&self) -> Option<&str> {
        self.errors
            .as_ref()
            .and_then(|errors| errors.first())
            .map(|e| e.message.as_str())
    }

    /// The non-null value under `data.<field>`.
    #[must_use]
    pub fn root_payload(&self, field: &str) -> Option<&Value> {
        self.data
            .as_ref()
            .and_then(|data| data.get(field))
            .filter(|value| !value.is_null())
    }
}

/// A store rejection that means the desired state already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BenignRejection {
    /// A component purl already exists under another document
    SharedComponent,
    /// The document's serial number is already stored
    DuplicateBom,
    /// A required metadata field was null
    NonNullableField,
}

impl fmt::Display for BenignRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::SharedComponent => "some components in this BOM were also found in another BOM",
            Self::DuplicateBom => "BOMs are immutable, duplicate submission ignored",
            Self::NonNullableField => "non-nullable metadata field missing",
        };
        f.write_str(text)
    }
}

/// How the mutation client should react to a store-reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A transaction conflict the store asks us to retry
    Transient,
    Benign(BenignRejection),
    Fatal,
}

/// Classify a store error message.
#[must_use]
pub fn classify(message: &str) -> ErrorClass {
    if message.contains("couldn't commit transaction") && message.contains("Please retry") {
        ErrorClass::Transient
    } else if message.contains("duplicate XID found") {
        ErrorClass::Benign(BenignRejection::SharedComponent)
    } else if message.contains("already exists for field serialNumber inside type Bom") {
        ErrorClass::Benign(BenignRejection::DuplicateBom)
    } else if message.contains("Non-nullable field")
        && (message.contains("'timestamp'") || message.contains("'serialNumber'"))
    {
        ErrorClass::Benign(BenignRejection::NonNullableField)
    } else {
        ErrorClass::Fatal
    }
}
