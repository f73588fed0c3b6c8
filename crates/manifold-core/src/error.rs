//! Provider error taxonomy.
//!
//! Upstream backends report failures in incompatible shapes (HTTP status,
//! in-body error objects, SDK-style error strings). Everything is folded
//! into [`ProviderError`], which carries the kind, the best-available
//! status code, and a stable human-readable message.

use thiserror::Error;

/// Stable messages for well-known upstream status codes.
///
/// Codes not listed here keep the raw upstream message.
const STATUS_MESSAGES: &[(u16, &str)] = &[
    (400, "Invalid Model: The specified model is not supported."),
    (401, "Unauthorized: Invalid API key or insufficient permissions."),
    (403, "Forbidden: You do not have access to this resource."),
    (429, "Quota Exceeded: You have exceeded your usage limits."),
    (500, "Internal Server Error: An error occurred on the server."),
    (502, "Bad Gateway: Incorrect API Endpoint"),
];

/// Look up the mapped message for a status code.
pub fn mapped_message(status: u16) -> Option<&'static str> {
    STATUS_MESSAGES
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, msg)| *msg)
}

/// Classification of an upstream failure, derived from its status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpstreamKind {
    /// 401 / 403 — bad or insufficient credentials.
    Auth,
    /// 429 — quota or rate limit.
    RateLimited,
    /// 502 — wrong endpoint or dead gateway.
    BadGateway,
    /// 5xx other than 502.
    Server,
    /// Anything else (4xx protocol errors, unknown codes).
    Other,
}

impl UpstreamKind {
    /// Classify a status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => UpstreamKind::Auth,
            429 => UpstreamKind::RateLimited,
            502 => UpstreamKind::BadGateway,
            s if s >= 500 => UpstreamKind::Server,
            _ => UpstreamKind::Other,
        }
    }
}

/// Errors raised by the provider layer.
///
/// Local validation errors (`InvalidParameter`, `ProviderNotFound`) are
/// raised immediately and never retried. Upstream errors are annotated at
/// the adapter boundary and re-raised; the caller decides whether to
/// retry, surface, or degrade.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Out-of-range configuration value. Synchronous and local.
    #[error("invalid {param}: {message}")]
    InvalidParameter {
        param: &'static str,
        message: String,
    },

    /// No registered provider matched the requested name or endpoint.
    #[error("provider not found: {query}")]
    ProviderNotFound { query: String },

    /// Grounded search requested on a backend without the capability.
    #[error("grounded search is not supported by {provider}")]
    NotSupported { provider: String },

    /// Upstream failure, annotated with the mapped message.
    #[error("{message}")]
    Upstream {
        kind: UpstreamKind,
        status: u16,
        message: String,
    },
}

impl ProviderError {
    /// Invalid parameter shorthand.
    pub fn invalid(param: &'static str, message: impl Into<String>) -> Self {
        ProviderError::InvalidParameter {
            param,
            message: message.into(),
        }
    }

    /// Build an upstream error: classify the status and swap in the mapped
    /// message, keeping the raw upstream text for unlisted codes.
    pub fn upstream(status: u16, raw_message: impl Into<String>) -> Self {
        let raw = raw_message.into();
        let message = mapped_message(status).map(String::from).unwrap_or(raw);
        ProviderError::Upstream {
            kind: UpstreamKind::from_status(status),
            status,
            message,
        }
    }

    /// Build an upstream error keeping the given message verbatim,
    /// bypassing the status table. Used for upstream strings that have
    /// already been rewritten to a domain message.
    pub fn upstream_verbatim(status: u16, message: impl Into<String>) -> Self {
        ProviderError::Upstream {
            kind: UpstreamKind::from_status(status),
            status,
            message: message.into(),
        }
    }

    /// Status code carried to the caller. Defaults to 500 where the
    /// upstream provided none; local errors report their HTTP-equivalent.
    pub fn status_code(&self) -> u16 {
        match self {
            ProviderError::InvalidParameter { .. } => 400,
            ProviderError::ProviderNotFound { .. } => 404,
            ProviderError::NotSupported { .. } => 500,
            ProviderError::Upstream { status, .. } => *status,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_message_known_codes() {
        assert_eq!(
            mapped_message(401),
            Some("Unauthorized: Invalid API key or insufficient permissions.")
        );
        assert_eq!(
            mapped_message(429),
            Some("Quota Exceeded: You have exceeded your usage limits.")
        );
        assert_eq!(mapped_message(502), Some("Bad Gateway: Incorrect API Endpoint"));
    }

    #[test]
    fn test_mapped_message_unknown_code() {
        assert_eq!(mapped_message(418), None);
    }

    #[test]
    fn test_upstream_uses_mapped_message() {
        let err = ProviderError::upstream(401, "upstream says no");
        match &err {
            ProviderError::Upstream { kind, status, message } => {
                assert_eq!(*kind, UpstreamKind::Auth);
                assert_eq!(*status, 401);
                assert_eq!(
                    message,
                    "Unauthorized: Invalid API key or insufficient permissions."
                );
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn test_upstream_falls_back_to_raw_message() {
        let err = ProviderError::upstream(418, "I'm a teapot");
        match err {
            ProviderError::Upstream { kind, message, .. } => {
                assert_eq!(kind, UpstreamKind::Other);
                assert_eq!(message, "I'm a teapot");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[test]
    fn test_upstream_verbatim_skips_table() {
        let err = ProviderError::upstream_verbatim(400, "Content of the message is empty");
        match err {
            ProviderError::Upstream { message, .. } => {
                assert_eq!(message, "Content of the message is empty");
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(UpstreamKind::from_status(401), UpstreamKind::Auth);
        assert_eq!(UpstreamKind::from_status(403), UpstreamKind::Auth);
        assert_eq!(UpstreamKind::from_status(429), UpstreamKind::RateLimited);
        assert_eq!(UpstreamKind::from_status(502), UpstreamKind::BadGateway);
        assert_eq!(UpstreamKind::from_status(500), UpstreamKind::Server);
        assert_eq!(UpstreamKind::from_status(503), UpstreamKind::Server);
        assert_eq!(UpstreamKind::from_status(404), UpstreamKind::Other);
    }

    #[test]
    fn test_local_error_status_codes() {
        assert_eq!(ProviderError::invalid("temperature", "out of range").status_code(), 400);
        assert_eq!(
            ProviderError::ProviderNotFound { query: "xyz".into() }.status_code(),
            404
        );
        assert_eq!(
            ProviderError::NotSupported { provider: "claude".into() }.status_code(),
            500
        );
    }

    #[test]
    fn test_display_is_the_message() {
        let err = ProviderError::upstream(429, "whatever");
        assert_eq!(
            err.to_string(),
            "Quota Exceeded: You have exceeded your usage limits."
        );
    }
}
