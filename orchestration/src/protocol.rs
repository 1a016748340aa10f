//! Request/response protocol crossing the isolation boundary.
//!
//! Closed tagged variants over the message kinds, JSON-compatible with the
//! original worker wire format: requests are `{id, type, payload?}` and
//! responses are `{id, type, result?/error?}`. The envelope carries the
//! correlation id; the endpoint echoes it back unmodified and attaches no
//! meaning to it. Transport-agnostic: envelopes are moved over in-process
//! channels here, but the same JSON works over pipes or sockets.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diagnostics::Diagnostic;
use crate::options::{CompileOptions, CompileResult};

/// Caller-chosen correlation token, unique among outstanding requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh id (UUID v4).
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Host → endpoint message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum Request {
    /// Construct (or confirm) the native compiler core.
    Init,
    /// Compile one source file.
    Compile {
        source: String,
        options: CompileOptions,
    },
    /// Type-check one source file, returning only diagnostics.
    Check { source: String },
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Compile { .. } => "compile",
            Self::Check { .. } => "check",
        }
    }
}

/// Endpoint → host message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Response {
    InitSuccess,
    CompileSuccess { result: CompileResult },
    CheckSuccess { diagnostics: Vec<Diagnostic> },
    Error { error: String },
}

impl Response {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitSuccess => "init-success",
            Self::CompileSuccess { .. } => "compile-success",
            Self::CheckSuccess { .. } => "check-success",
            Self::Error { .. } => "error",
        }
    }
}

/// A request plus its correlation id, as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub id: RequestId,
    #[serde(flatten)]
    pub request: Request,
}

impl RequestEnvelope {
    pub fn new(id: RequestId, request: Request) -> Self {
        Self { id, request }
    }

    /// Wrap a request with a freshly generated id.
    pub fn fresh(request: Request) -> Self {
        Self::new(RequestId::fresh(), request)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode from JSON. Unknown `type` tags surface as a decode error
    /// naming the unrecognized variant.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// A response plus the echoed correlation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: RequestId,
    #[serde(flatten)]
    pub response: Response,
}

impl ResponseEnvelope {
    pub fn new(id: RequestId, response: Response) -> Self {
        Self { id, response }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = RequestId::fresh();
        let b = RequestId::fresh();
        assert_ne!(a, b);
        assert!(!a.as_str().is_empty());
    }

    #[test]
    fn test_init_wire_shape() {
        let envelope = RequestEnvelope::new("req-1".into(), Request::Init);
        let value: serde_json::Value =
            serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"id": "req-1", "type": "init"}));
    }

    #[test]
    fn test_compile_wire_shape() {
        let envelope = RequestEnvelope::new(
            "req-2".into(),
            Request::Compile {
                source: "let x = 1;".into(),
                options: CompileOptions::default(),
            },
        );
        let value: serde_json::Value =
            serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(value["id"], "req-2");
        assert_eq!(value["type"], "compile");
        assert_eq!(value["payload"]["source"], "let x = 1;");
        assert_eq!(value["payload"]["options"]["target"], "es2020");
    }

    #[test]
    fn test_check_roundtrip() {
        let envelope = RequestEnvelope::fresh(Request::Check {
            source: "const y: string = 2;".into(),
        });
        let restored = RequestEnvelope::from_json(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(restored, envelope);
        assert_eq!(restored.request.kind(), "check");
    }

    #[test]
    fn test_response_wire_shapes() {
        let init = ResponseEnvelope::new("a".into(), Response::InitSuccess);
        let value: serde_json::Value = serde_json::from_str(&init.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"id": "a", "type": "init-success"}));

        let err = ResponseEnvelope::new("b".into(), Response::Error { error: "boom".into() });
        let value: serde_json::Value = serde_json::from_str(&err.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"id": "b", "type": "error", "error": "boom"}));

        let ok = ResponseEnvelope::new(
            "c".into(),
            Response::CompileSuccess {
                result: CompileResult {
                    code: "var x = 1;".into(),
                    source_map: None,
                    diagnostics: vec![],
                },
            },
        );
        let value: serde_json::Value = serde_json::from_str(&ok.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "compile-success");
        assert_eq!(value["result"]["code"], "var x = 1;");
    }

    #[test]
    fn test_unknown_type_is_a_decode_error_naming_the_tag() {
        let raw = r#"{"id": "x", "type": "frobnicate"}"#;
        let err = RequestEnvelope::from_json(raw).unwrap_err();
        assert!(err.to_string().contains("frobnicate"));

        let raw = r#"{"id": "x", "type": "self-destruct"}"#;
        let err = ResponseEnvelope::from_json(raw).unwrap_err();
        assert!(err.to_string().contains("self-destruct"));
    }

    #[test]
    fn test_id_is_echoed_verbatim_through_serde() {
        let id: RequestId = "anything-goes-here".into();
        let envelope = ResponseEnvelope::new(id.clone(), Response::InitSuccess);
        let restored = ResponseEnvelope::from_json(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(restored.id, id);
    }

    #[test]
    fn test_response_kind_names() {
        assert_eq!(Response::InitSuccess.kind(), "init-success");
        assert_eq!(
            Response::Error { error: String::new() }.kind(),
            "error"
        );
    }
}
