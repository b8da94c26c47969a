//! Response compression with a per-request opt-out.

use axum::{
    body::Body,
    http::{header, HeaderName, Request},
    middleware::Next,
    response::Response,
};
use tower_http::compression::{
    predicate::{NotForContentType, Predicate, SizeAbove},
    CompressionLayer,
};
use tower_http::CompressionLevel;

/// Request header that disables compression for that request.
pub const X_NO_COMPRESSION: HeaderName = HeaderName::from_static("x-no-compression");

/// Responses smaller than this are sent uncompressed.
pub const MIN_COMPRESS_SIZE: u16 = 1024;

/// Compression for responses above [`MIN_COMPRESS_SIZE`], skipping media
/// types that are already compressed or streamed.
pub fn compression_layer() -> CompressionLayer<impl Predicate> {
    let predicate = SizeAbove::new(MIN_COMPRESS_SIZE)
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE);

    CompressionLayer::new()
        .quality(CompressionLevel::Precise(6))
        .compress_when(predicate)
}

/// Strip `Accept-Encoding` from requests carrying [`X_NO_COMPRESSION`] so
/// the compression layer behind this one leaves the response alone.
pub async fn honor_no_compression(mut request: Request<Body>, next: Next) -> Response {
    if request.headers().contains_key(&X_NO_COMPRESSION) {
        request.headers_mut().remove(header::ACCEPT_ENCODING);
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/big", get(|| async { "x".repeat(4096) }))
            .route("/small", get(|| async { "tiny" }))
            .layer(compression_layer())
            .layer(axum::middleware::from_fn(honor_no_compression))
    }

    fn get_with(path: &str, extra: Option<(&str, &str)>) -> Request<Body> {
        let mut builder = Request::builder()
            .uri(path)
            .header(header::ACCEPT_ENCODING, "gzip");
        if let Some((name, value)) = extra {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn compresses_large_bodies() {
        let response = app().oneshot(get_with("/big", None)).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
    }

    #[tokio::test]
    async fn leaves_small_bodies_alone() {
        let response = app().oneshot(get_with("/small", None)).await.unwrap();
        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
    }

    #[tokio::test]
    async fn opt_out_header_disables_compression() {
        let response = app()
            .oneshot(get_with("/big", Some(("x-no-compression", "1"))))
            .await
            .unwrap();
        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
    }
}
