//! # Wiretap
//!
//! A [`tower`] middleware that renders HTTP traffic flowing through a client
//! pipeline as human-readable log lines, at a configurable [`Verbosity`].
//!
//! ## Features
//!
//! - **Verbosity-gated**: from nothing at all up to full bodies, switchable
//!   at runtime while requests are in flight
//! - **Redaction**: sensitive header values never reach the log
//! - **Safe body sampling**: binary payloads are detected and summarized
//!   instead of dumped
//! - **Transparent gzip**: compressed response bodies are inflated for
//!   display only, without touching what the caller receives
//! - **Diagnostics forwarding**: decoded body text goes to a separate
//!   [`DiagnosticsReporter`] for out-of-band reporting
//!
//! ## Quick Start
//!
//! ```rust
//! use wiretap::{TracingSink, TrafficLogLayer, Verbosity};
//!
//! let layer = TrafficLogLayer::new(TracingSink::default());
//! layer.set_verbosity(Verbosity::Body);
//! layer.redact_header("Authorization");
//!
//! // Wrap the service that performs the actual I/O:
//! // let client = ServiceBuilder::new().layer(layer).service(http_client);
//! ```
//!
//! With `Verbosity::Body`, a call renders as:
//!
//! ```text
//! <<<<<<<<<<<<<<<<<<<< Request >>>>>>>>>>>>>>>>>>>>
//! Network Request --> POST https://example.com/greeting HTTP/1.1
//! Network Request --> Content-Type: text/plain
//! Network Request --> Content-Length: 3
//! Network Request --> host: example.com
//!
//! Hi?
//! Network Request --> END POST (3-byte body)
//!
//! >>>>>>>>>>>>>>>>>>>> Response <<<<<<<<<<<<<<<<<<<<
//! Network Response <-- 200 OK https://example.com/greeting (22ms)
//! Network Response <-- content-type: text/plain
//! Network Response <-- Hello!
//! Network Response <-- END HTTP (6-byte body)
//! ```
//!
//! The line format is meant for humans and may change between releases; it
//! is not a stable machine-readable surface.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use http::{header, HeaderName, HeaderValue};
use parking_lot::RwLock;
use tower::{Layer, Service};
use tracing::debug;

pub mod body;

pub mod types;
pub use types::{Request, RequestBody, Response, ResponseBody};

pub mod sink;
pub use sink::{LineSink, TracingSink};

pub mod multi_sink;
pub use multi_sink::MultiSink;

pub mod diagnostics;
pub use diagnostics::{DiagnosticsReporter, NoopReporter, TracingReporter};

const REQUEST_PREFIX: &str = "Network Request --> ";
const RESPONSE_PREFIX: &str = "Network Response <-- ";
const REQUEST_BANNER: &str = "<<<<<<<<<<<<<<<<<<<< Request >>>>>>>>>>>>>>>>>>>>";
const RESPONSE_BANNER: &str = ">>>>>>>>>>>>>>>>>>>> Response <<<<<<<<<<<<<<<<<<<<";
const REDACTED: &str = "\u{2588}\u{2588}";

/// Logging detail level, totally ordered by increasing detail.
///
/// `None` performs no logging work at all; `Basic` logs request and response
/// summary lines; `Headers` adds the header lists; `Body` additionally logs
/// bodies when they are present and printable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Verbosity {
    /// No logs.
    None = 0,
    /// Request and response summary lines only.
    ///
    /// ```text
    /// Network Request --> POST https://example.com/greeting (3-byte body)
    /// Network Response <-- 200 OK https://example.com/greeting (22ms, 6-byte body)
    /// ```
    Basic = 1,
    /// Summary lines plus all request and response headers.
    Headers = 2,
    /// Summary lines, headers, and bodies where present and printable.
    Body = 3,
}

impl Verbosity {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Verbosity::None,
            1 => Verbosity::Basic,
            2 => Verbosity::Headers,
            _ => Verbosity::Body,
        }
    }
}

/// State shared between a layer and every service it produces.
struct Shared {
    verbosity: AtomicU8,
    /// Lowercased header names whose values must not be logged. Updates
    /// install a fresh set so in-flight readers keep their snapshot.
    redact: RwLock<Arc<HashSet<String>>>,
    sink: Box<dyn LineSink>,
    diagnostics: Box<dyn DiagnosticsReporter>,
}

impl Shared {
    fn verbosity(&self) -> Verbosity {
        Verbosity::from_u8(self.verbosity.load(Ordering::Relaxed))
    }

    fn redactions(&self) -> Arc<HashSet<String>> {
        self.redact.read().clone()
    }

    fn log(&self, line: &str) {
        self.sink.log_message(line);
    }

    fn log_header(
        &self,
        prefix: &str,
        redact: &HashSet<String>,
        name: &HeaderName,
        value: &HeaderValue,
    ) {
        let value = if redact.contains(name.as_str()) {
            REDACTED.into()
        } else {
            String::from_utf8_lossy(value.as_bytes())
        };
        self.log(&format!("{prefix}{name}: {value}"));
    }

    fn log_request(&self, request: &Request, log_headers: bool, log_body: bool) {
        self.log("");
        self.log(REQUEST_BANNER);

        let mut summary = format!("{REQUEST_PREFIX}{} {}", request.method, request.url);
        if let Some(version) = request.version {
            summary.push_str(&format!(" {version:?}"));
        }
        if !log_headers {
            if let Some(length) = request.body.as_ref().and_then(|b| b.content_length()) {
                summary.push_str(&format!(" ({length}-byte body)"));
            }
        }
        self.log(&summary);

        if !log_headers {
            return;
        }

        if let Some(body) = &request.body {
            // Body headers are only reliably present at a lower pipeline
            // layer, so synthesize them from the body's own metadata.
            if let Some(content_type) = body.content_type() {
                self.log(&format!("{REQUEST_PREFIX}Content-Type: {content_type}"));
            }
            if let Some(length) = body.content_length() {
                self.log(&format!("{REQUEST_PREFIX}Content-Length: {length}"));
            }
        }

        let redact = self.redactions();
        for (name, value) in &request.headers {
            // Skip what was synthesized above.
            if name != &header::CONTENT_TYPE && name != &header::CONTENT_LENGTH {
                self.log_header(REQUEST_PREFIX, &redact, name, value);
            }
        }

        let method = &request.method;
        match &request.body {
            Some(_) if log_body && body::has_unknown_encoding(&request.headers) => {
                self.log(&format!("{REQUEST_PREFIX}END {method} (encoded body omitted)"));
            }
            Some(body) if log_body => {
                // A cloned handle; the producer's bytes stay untouched.
                let buffered = body.bytes().clone();
                let text = body::decode_text(&buffered, body.content_type());
                self.diagnostics.capture_request_body(&text);

                let size = body.content_length().unwrap_or(buffered.len() as u64);
                if body::is_plaintext(&buffered) {
                    self.log("");
                    self.log(&text);
                    self.log(&format!("{REQUEST_PREFIX}END {method} ({size}-byte body)"));
                } else {
                    self.log(&format!(
                        "{REQUEST_PREFIX}END {method} (binary {size}-byte body omitted)"
                    ));
                }
            }
            _ => self.log(&format!("{REQUEST_PREFIX}END {method}")),
        }
    }

    fn log_response(&self, response: &Response, elapsed_ms: u128, log_headers: bool, log_body: bool) {
        let declared_length = response.body.as_ref().and_then(|b| b.content_length());

        let mut summary = format!("{RESPONSE_PREFIX}{}", response.status.as_u16());
        if !response.message.is_empty() {
            summary.push(' ');
            summary.push_str(&response.message);
        }
        summary.push_str(&format!(" {} ({elapsed_ms}ms", response.url));
        if !log_headers {
            let size = match declared_length {
                Some(length) => format!("{length}-byte"),
                None => "unknown-length".to_string(),
            };
            summary.push_str(&format!(", {size} body"));
        }
        summary.push(')');
        self.log(&summary);

        if !log_headers {
            return;
        }

        let redact = self.redactions();
        for (name, value) in &response.headers {
            self.log_header(RESPONSE_PREFIX, &redact, name, value);
        }

        if !log_body || !response.promises_body() {
            self.log(&format!("{RESPONSE_PREFIX}END HTTP"));
            return;
        }
        if body::has_unknown_encoding(&response.headers) {
            self.log(&format!("{RESPONSE_PREFIX}END HTTP (encoded body omitted)"));
            return;
        }
        let Some(response_body) = &response.body else {
            self.log(&format!("{RESPONSE_PREFIX}END HTTP"));
            return;
        };

        let mut buffered = response_body.bytes().clone();
        let mut gzipped_length = None;
        if body::is_gzip(&response.headers) {
            gzipped_length = Some(buffered.len() as u64);
            match body::gunzip(&buffered) {
                Ok(inflated) => buffered = Bytes::from(inflated),
                Err(err) => {
                    // A stream that will not inflate is as opaque as any
                    // binary body; logging must not fail the call.
                    debug!(error = %err, "gzip inflate failed, treating body as binary");
                    self.log(&format!(
                        "{RESPONSE_PREFIX}END HTTP (binary {}-byte body omitted)",
                        buffered.len()
                    ));
                    return;
                }
            }
        }

        if !body::is_plaintext(&buffered) {
            self.log(&format!(
                "{RESPONSE_PREFIX}END HTTP (binary {}-byte body omitted)",
                buffered.len()
            ));
            return;
        }

        if declared_length != Some(0) {
            let text = body::decode_text(&buffered, response_body.content_type());
            self.log(&format!("{RESPONSE_PREFIX}{text}"));
            self.diagnostics.capture_response_body(&text);
        }

        match gzipped_length {
            Some(gzipped) => self.log(&format!(
                "{RESPONSE_PREFIX}END HTTP ({}-byte, {gzipped}-gzipped-byte body)",
                buffered.len()
            )),
            None => self.log(&format!(
                "{RESPONSE_PREFIX}END HTTP ({}-byte body)",
                buffered.len()
            )),
        }
    }
}

/// Tower layer that installs traffic logging around an inner service.
///
/// The layer owns the shared configuration; every service it produces reads
/// the same verbosity and redaction set, so both can be changed while
/// requests are in flight.
///
/// # Examples
///
/// ```rust
/// use wiretap::{TracingReporter, TracingSink, TrafficLogLayer, Verbosity};
///
/// let layer = TrafficLogLayer::with_diagnostics(TracingSink::default(), TracingReporter);
/// layer.set_verbosity(Verbosity::Headers);
/// layer.redact_header("Proxy-Authorization");
/// ```
#[derive(Clone)]
pub struct TrafficLogLayer {
    shared: Arc<Shared>,
}

impl TrafficLogLayer {
    /// Create a layer that logs to `sink` and discards diagnostics.
    pub fn new(sink: impl LineSink + 'static) -> Self {
        Self::with_diagnostics(sink, NoopReporter)
    }

    /// Create a layer that logs to `sink` and forwards decoded body text to
    /// `diagnostics`.
    pub fn with_diagnostics(
        sink: impl LineSink + 'static,
        diagnostics: impl DiagnosticsReporter + 'static,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                verbosity: AtomicU8::new(Verbosity::None as u8),
                redact: RwLock::new(Arc::new(HashSet::new())),
                sink: Box::new(sink),
                diagnostics: Box::new(diagnostics),
            }),
        }
    }

    /// Change the level at which traffic is logged. Takes effect for calls
    /// that start after the store; in-flight calls keep the level they
    /// sampled at their start.
    pub fn set_verbosity(&self, level: Verbosity) {
        self.shared.verbosity.store(level as u8, Ordering::Relaxed);
    }

    /// The currently configured level.
    pub fn verbosity(&self) -> Verbosity {
        self.shared.verbosity()
    }

    /// Never log the value of the named header. Matching is
    /// case-insensitive. Safe to call while requests are being logged:
    /// updates install a new set, so concurrent readers keep a consistent
    /// snapshot.
    pub fn redact_header(&self, name: &str) {
        let mut guard = self.shared.redact.write();
        let mut next: HashSet<String> = (**guard).clone();
        next.insert(name.to_ascii_lowercase());
        *guard = Arc::new(next);
    }
}

impl<S> Layer<S> for TrafficLogLayer {
    type Service = TrafficLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TrafficLogService {
            inner,
            shared: self.shared.clone(),
        }
    }
}

/// Service produced by [`TrafficLogLayer`].
///
/// Logs the request, delegates to the inner service (the rest of the HTTP
/// pipeline), then logs the response or the transport failure. The request
/// and response are forwarded unmodified in every case.
#[derive(Clone)]
pub struct TrafficLogService<S> {
    inner: S,
    shared: Arc<Shared>,
}

impl<S> Service<Request> for TrafficLogService<S>
where
    S: Service<Request, Response = Response>,
    S::Error: std::error::Error + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        // One snapshot per call; a concurrent set_verbosity must not change
        // the shape of a block that is already being emitted.
        let verbosity = self.shared.verbosity();
        if verbosity == Verbosity::None {
            return Box::pin(self.inner.call(request));
        }

        let log_body = verbosity == Verbosity::Body;
        let log_headers = verbosity >= Verbosity::Headers;

        self.shared.log_request(&request, log_headers, log_body);

        self.shared.log("");
        self.shared.log(RESPONSE_BANNER);
        let start = Instant::now();
        let future = self.inner.call(request);
        let shared = self.shared.clone();

        Box::pin(async move {
            match future.await {
                Ok(response) => {
                    let elapsed_ms = start.elapsed().as_millis();
                    shared.log_response(&response, elapsed_ms, log_headers, log_body);
                    Ok(response)
                }
                Err(err) => {
                    shared.log(&format!("{RESPONSE_PREFIX}HTTP FAILED: {err}"));
                    Err(err)
                }
            }
        })
    }
}
