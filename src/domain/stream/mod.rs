//! Stream records and their decoding.
//!
//! Producers outside this crate append records in one of two layouts: a
//! single `payload` field holding a JSON document, or flat fields such as
//! `gameId`, `awayId` and `status` that become a JSON object of strings.
//! The consumer decodes each record on its own, so a bad record never
//! affects its neighbours in the batch.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Record field carrying the JSON document.
pub const PAYLOAD_FIELD: &str = "payload";

/// Where a consumer reads from: stream key, group and its own identity.
///
/// The consumer name must be unique per process; two processes sharing one
/// name may process the same pending records concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCoordinates {
    pub stream_key: String,
    pub group: String,
    pub consumer: String,
}

impl fmt::Display for StreamCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.stream_key, self.group, self.consumer)
    }
}

/// Raw record as read from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    pub id: String,
    pub fields: HashMap<String, String>,
}

impl StreamRecord {
    pub fn new(id: impl Into<String>, fields: HashMap<String, String>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Record with a single payload field.
    pub fn with_payload(id: impl Into<String>, payload: impl Into<String>) -> Self {
        let mut fields = HashMap::new();
        fields.insert(PAYLOAD_FIELD.to_string(), payload.into());
        Self::new(id, fields)
    }

    pub fn raw_payload(&self) -> Option<&str> {
        self.fields.get(PAYLOAD_FIELD).map(String::as_str)
    }
}

/// A record decoded for a specific consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub stream_key: String,
    pub group: String,
    pub consumer: String,
    pub record_id: String,
    pub payload: Map<String, JsonValue>,
}

impl StreamEvent {
    /// Decodes the record into a JSON object.
    ///
    /// A `payload` field wins when present. Otherwise every field becomes a
    /// string member of the object.
    pub fn decode(source: &StreamCoordinates, record: &StreamRecord) -> Result<Self, EventProcessingError> {
        let payload = match record.raw_payload() {
            Some(raw) => parse_object(raw)?,
            None if record.fields.is_empty() => {
                return Err(EventProcessingError::malformed("record has no fields"));
            }
            None => record
                .fields
                .iter()
                .map(|(name, value)| (name.clone(), JsonValue::String(value.clone())))
                .collect(),
        };

        Ok(Self {
            stream_key: source.stream_key.clone(),
            group: source.group.clone(),
            consumer: source.consumer.clone(),
            record_id: record.id.clone(),
            payload,
        })
    }

    /// Deserializes the payload into a typed event.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, EventProcessingError> {
        serde_json::from_value(JsonValue::Object(self.payload.clone()))
            .map_err(|e| EventProcessingError::malformed(e.to_string()))
    }
}

fn parse_object(raw: &str) -> Result<Map<String, JsonValue>, EventProcessingError> {
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(other) => Err(EventProcessingError::malformed(format!(
            "payload must be a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(EventProcessingError::malformed(e.to_string())),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Failure to process one record. Logged and dead-lettered; never aborts
/// the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventProcessingError {
    /// The payload could not be decoded into the expected event.
    #[error("malformed event: {0}")]
    Malformed(String),

    /// The handler rejected the event.
    #[error("handler failed: {0}")]
    Handler(String),

    /// The push transport reported failure.
    #[error("dispatch failed: {0}")]
    Dispatch(String),

    /// A backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl EventProcessingError {
    pub fn malformed(message: impl Into<String>) -> Self {
        EventProcessingError::Malformed(message.into())
    }

    pub fn handler(message: impl Into<String>) -> Self {
        EventProcessingError::Handler(message.into())
    }

    pub fn dispatch(message: impl Into<String>) -> Self {
        EventProcessingError::Dispatch(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        EventProcessingError::Unavailable(message.into())
    }

    /// Short machine-readable reason stored with dead-lettered records.
    pub fn reason(&self) -> &'static str {
        match self {
            EventProcessingError::Malformed(_) => "malformed",
            EventProcessingError::Handler(_) => "handler",
            EventProcessingError::Dispatch(_) => "dispatch",
            EventProcessingError::Unavailable(_) => "unavailable",
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            EventProcessingError::Malformed(_) => ErrorCode::MalformedEvent,
            EventProcessingError::Handler(_) => ErrorCode::InternalError,
            EventProcessingError::Dispatch(_) => ErrorCode::EventDispatchFailed,
            EventProcessingError::Unavailable(_) => ErrorCode::CacheError,
        }
    }
}

impl From<EventProcessingError> for DomainError {
    fn from(err: EventProcessingError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
