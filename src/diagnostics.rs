//! Out-of-band diagnostics forwarding.
//!
//! Independent of the line-based log output, the interceptor hands decoded
//! body text to a [`DiagnosticsReporter`] so an error-tracking backend can
//! attach payloads to its reports. Request bodies are forwarded whenever one
//! was buffered and decoded; response bodies only when they classified as
//! plaintext with a nonzero declared length.

use tracing::debug;

/// Collector for decoded request and response body text.
///
/// Each method is called at most once per intercepted call.
pub trait DiagnosticsReporter: Send + Sync {
    /// Receive the decoded request body text.
    fn capture_request_body(&self, text: &str);
    /// Receive the decoded response body text.
    fn capture_response_body(&self, text: &str);
}

/// Reporter that drops every payload. Installed when no reporter is
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl DiagnosticsReporter for NoopReporter {
    fn capture_request_body(&self, _text: &str) {}
    fn capture_response_body(&self, _text: &str) {}
}

/// Reporter that forwards payloads to `tracing` at DEBUG level, standing in
/// for an external telemetry backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl DiagnosticsReporter for TracingReporter {
    fn capture_request_body(&self, text: &str) {
        debug!(target: "wiretap::diagnostics", body = %text, "request body captured");
    }

    fn capture_response_body(&self, text: &str) {
        debug!(target: "wiretap::diagnostics", body = %text, "response body captured");
    }
}
