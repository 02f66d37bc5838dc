//! The pipeline behind a tower `Service`.
#![cfg(feature = "tower")]

use bytes::Bytes;
use http::StatusCode;
use plinth::tower::DispatchService;
use std::sync::Arc;
use tower::ServiceExt;

mod common;
use common::{exploding, json_dispatcher, respond_with};

fn request() -> http::Request<Bytes> {
    http::Request::builder().uri("/").body(Bytes::new()).unwrap()
}

#[tokio::test]
async fn test_service_returns_buffered_response() {
    let service = DispatchService::new(Arc::new(json_dispatcher(respond_with(b"{}"))));

    let response = service.oneshot(request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"{}");
}

#[tokio::test]
async fn test_service_contains_crashes() {
    let service = DispatchService::new(Arc::new(json_dispatcher(exploding())));

    let response = service.clone().oneshot(request()).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.body().as_ref(),
        br#"{"message":"Internal Server Error"}"#
    );
    assert!(service.inner().has_handler());
}
