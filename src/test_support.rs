//! Helpers for driving the router in-process.

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(v) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string())),
        None => req.body(Body::empty()),
    }
    .expect("build request");
    app.clone().oneshot(req).await.expect("router is infallible")
}

pub async fn read_json<T: DeserializeOwned>(res: Response) -> T {
    let bytes = res
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

/// Signs up a fresh user and returns its token.
pub async fn signup(app: &Router, email: &str) -> String {
    let res = send(
        app,
        Method::POST,
        "/api/v1/auth/signup",
        None,
        Some(json!({"name": "Tester", "email": email, "password": "pw123456"})),
    )
    .await;
    let body: Value = read_json(res).await;
    body["token"].as_str().expect("token").to_string()
}
