//! Per-request context passed explicitly down the call chain.
//!
//! Instead of ambient thread-local state, handlers accept a
//! `RequestContext` and record its fields on their tracing spans.

use serde::{Deserialize, Serialize};

use super::RequestId;

/// Context that flows through every coordinated operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Correlates log lines for one inbound request.
    pub request_id: RequestId,

    /// Client address as seen by the edge, recorded on login.
    #[serde(skip_serializing_if = "Option::is_none")]
    remote_ip: Option<String>,
}

impl RequestContext {
    /// Creates a context with a fresh request id.
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            remote_ip: None,
        }
    }

    /// Context for work that is not triggered by a request (consumer, jobs).
    pub fn background() -> Self {
        Self::new()
    }

    /// Builder: attach the caller's address.
    pub fn with_remote_ip(mut self, ip: impl Into<String>) -> Self {
        self.remote_ip = Some(ip.into());
        self
    }

    /// Returns the caller's address if known.
    pub fn remote_ip(&self) -> Option<&str> {
        self.remote_ip.as_deref()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
