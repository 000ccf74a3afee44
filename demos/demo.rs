use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use http::{Method, StatusCode, Uri, Version};
use tower::{service_fn, Layer, ServiceExt};
use tracing::{info, Level};
use wiretap::{
    MultiSink, Request, RequestBody, Response, ResponseBody, TracingReporter, TracingSink,
    TrafficLogLayer, Verbosity,
};

#[derive(Debug, thiserror::Error)]
#[error("backend unreachable: {0}")]
struct TransportError(&'static str);

/// Stand-in for the rest of the HTTP pipeline: resolves a canned response
/// per path instead of performing real I/O.
async fn backend(request: Request) -> Result<Response, TransportError> {
    match request.url.path() {
        "/greeting" => Ok(Response::new(StatusCode::OK, request.url.clone())
            .header("content-type", "text/plain")
            .with_body(ResponseBody::new("Hello!").with_content_type("text/plain"))),
        "/compressed" => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder
                .write_all(b"{\"status\": \"inflated just for the log\"}")
                .unwrap();
            let compressed = encoder.finish().unwrap();
            Ok(Response::new(StatusCode::OK, request.url.clone())
                .header("content-type", "application/json")
                .header("content-encoding", "gzip")
                .with_body(ResponseBody::new(compressed).with_content_type("application/json")))
        }
        "/icon" => Ok(Response::new(StatusCode::OK, request.url.clone())
            .header("content-type", "image/png")
            .with_body(
                ResponseBody::new(&b"\x89PNG\r\n\x1a\n"[..]).with_content_type("image/png"),
            )),
        _ => Err(TransportError("no route")),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    let layer = TrafficLogLayer::with_diagnostics(
        MultiSink::new().with(TracingSink::default()),
        TracingReporter,
    );
    layer.set_verbosity(Verbosity::Body);
    layer.redact_header("Authorization");

    let service = layer.layer(service_fn(backend));

    info!("--- plaintext exchange, Authorization redacted ---");
    let request = Request::new(Method::POST, Uri::from_static("https://demo.invalid/greeting"))
        .with_version(Version::HTTP_11)
        .header("host", "demo.invalid")
        .header("authorization", "Bearer super-secret")
        .with_body(RequestBody::new("Hi?").with_content_type("text/plain"));
    service.clone().oneshot(request).await.unwrap();

    info!("--- gzip response, inflated for display only ---");
    let request = Request::new(Method::GET, Uri::from_static("https://demo.invalid/compressed"));
    service.clone().oneshot(request).await.unwrap();

    info!("--- binary response, summarized instead of dumped ---");
    let request = Request::new(Method::GET, Uri::from_static("https://demo.invalid/icon"));
    service.clone().oneshot(request).await.unwrap();

    info!("--- transport failure, logged then propagated ---");
    let request = Request::new(Method::GET, Uri::from_static("https://demo.invalid/missing"));
    let err = service.clone().oneshot(request).await.unwrap_err();
    info!("caller still sees the failure: {err}");
}
