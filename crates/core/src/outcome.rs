use bytes::Bytes;
use serde_json::Value;

/// Whether a result is structured JSON or raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Json,
    Binary,
}

/// Payload carried by an [`ActionResult`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Structured data serialized as a JSON document.
    Json(Value),
    /// Raw bytes written verbatim as the response body.
    Binary { data: Bytes, content_type: String },
}

/// The final product of an action's lifecycle, consumed exactly once by the
/// response encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResult {
    pub payload: Payload,
    /// Overrides the default success status when set.
    pub status: Option<u16>,
}

impl ActionResult {
    /// A JSON result with the default success status.
    #[must_use]
    pub fn json(data: Value) -> Self {
        Self {
            payload: Payload::Json(data),
            status: None,
        }
    }

    /// A binary result. An empty `content_type` falls back to
    /// `application/octet-stream`.
    #[must_use]
    pub fn binary(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        let content_type = if content_type.is_empty() {
            "application/octet-stream".to_owned()
        } else {
            content_type
        };
        Self {
            payload: Payload::Binary {
                data: data.into(),
                content_type,
            },
            status: None,
        }
    }

    /// An empty JSON result (`null`) with `204 No Content`.
    #[must_use]
    pub fn no_content() -> Self {
        Self::json(Value::Null).with_status(204)
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn kind(&self) -> ResultKind {
        match self.payload {
            Payload::Json(_) => ResultKind::Json,
            Payload::Binary { .. } => ResultKind::Binary,
        }
    }
}
