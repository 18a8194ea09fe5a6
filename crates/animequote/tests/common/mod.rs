//! Shared fixtures for HTTP-level tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tower::ServiceExt;

use animequote::AppBuilder;
use animequote::auth_adapter::{AdminUser, AuthAdapter};
use animequote::prelude::*;
use animequote_core::settings::memory::InMemoryMetaAdapter;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "hunter2";
pub const ADMIN_TOKEN: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
pub const ROTATED_TOKEN: &str = "fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210";

/// Auth adapter with a single fixed admin account
#[derive(Debug, Default)]
pub struct StaticAuthAdapter {
	pub broken: bool,
	pub rotated: AtomicBool,
}

impl StaticAuthAdapter {
	pub fn broken() -> Self {
		Self { broken: true, ..Self::default() }
	}

	fn current_token(&self) -> &'static str {
		if self.rotated.load(Ordering::SeqCst) { ROTATED_TOKEN } else { ADMIN_TOKEN }
	}
}

#[async_trait]
impl AuthAdapter for StaticAuthAdapter {
	async fn validate_token(&self, token: &str) -> ClResult<bool> {
		if self.broken {
			return Err(Error::DbError);
		}
		Ok(token == self.current_token())
	}

	async fn read_admin(&self, username: &str) -> ClResult<Option<AdminUser>> {
		Ok((username == ADMIN_USER).then(|| AdminUser {
			id: 1,
			username: ADMIN_USER.into(),
			token: self.current_token().into(),
			created_at: Timestamp(1_700_000_000),
			last_login: None,
		}))
	}

	async fn create_admin(&self, _username: &str, _password: &str) -> ClResult<AdminUser> {
		Err(Error::PermissionDenied)
	}

	async fn authenticate_admin(&self, username: &str, password: &str) -> ClResult<Option<Box<str>>> {
		if self.broken {
			return Err(Error::DbError);
		}
		Ok((username == ADMIN_USER && password == ADMIN_PASSWORD).then(|| self.current_token().into()))
	}

	async fn rotate_token(&self, username: &str) -> ClResult<Box<str>> {
		if username != ADMIN_USER {
			return Err(Error::NotFound);
		}
		self.rotated.store(true, Ordering::SeqCst);
		Ok(ROTATED_TOKEN.into())
	}
}

pub async fn build_app_with(auth: StaticAuthAdapter) -> (App, Router) {
	let mut builder = AppBuilder::new();
	builder
		.auth_adapter(Arc::new(auth))
		.meta_adapter(Arc::new(InMemoryMetaAdapter::new()));
	builder.build().await.unwrap()
}

pub async fn build_app() -> (App, Router) {
	build_app_with(StaticAuthAdapter::default()).await
}

pub fn request(method: &str, uri: &str, client: &str) -> axum::http::request::Builder {
	Request::builder().method(method).uri(uri).header("x-forwarded-for", client)
}

pub fn admin_request(method: &str, uri: &str, client: &str) -> axum::http::request::Builder {
	request(method, uri, client).header("authorization", format!("Bearer {}", ADMIN_TOKEN))
}

pub async fn send(router: &Router, req: Request<Body>) -> Response<Body> {
	router.clone().oneshot(req).await.unwrap()
}

pub async fn get(router: &Router, uri: &str, client: &str) -> Response<Body> {
	send(router, request("GET", uri, client).body(Body::empty()).unwrap()).await
}

pub async fn admin_get(router: &Router, uri: &str, client: &str) -> Response<Body> {
	send(router, admin_request("GET", uri, client).body(Body::empty()).unwrap()).await
}

pub fn json_request(method: &str, uri: &str, client: &str, body: &str) -> Request<Body> {
	admin_request(method, uri, client)
		.header("content-type", "application/json")
		.body(Body::from(body.to_string()))
		.unwrap()
}

pub fn login_request(client: &str, username: &str, password: &str) -> Request<Body> {
	let body = serde_json::json!({ "username": username, "password": password });
	request("POST", "/api/v1/admin/login", client)
		.header("content-type", "application/json")
		.body(Body::from(body.to_string()))
		.unwrap()
}

pub async fn body_json(res: Response<Body>) -> serde_json::Value {
	let bytes = res.into_body().collect().await.unwrap().to_bytes();
	serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(res: Response<Body>) -> String {
	let bytes = res.into_body().collect().await.unwrap().to_bytes();
	String::from_utf8(bytes.to_vec()).unwrap()
}

// vim: ts=4
