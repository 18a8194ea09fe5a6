//! Adapter that manages administrative credentials.

use async_trait::async_trait;
use serde::Serialize;
use serde_with::skip_serializing_none;
use std::fmt::Debug;

use crate::prelude::*;

/// Administrative user as stored by the auth adapter
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
	pub id: i64,
	pub username: Box<str>,
	#[serde(skip)]
	pub token: Box<str>,
	pub created_at: Timestamp,
	pub last_login: Option<Timestamp>,
}

#[async_trait]
pub trait AuthAdapter: Debug + Send + Sync {
	/// Returns true if the token belongs to an administrative user.
	/// Storage failures are errors, not `false`.
	async fn validate_token(&self, token: &str) -> ClResult<bool>;

	/// Reads an administrative user by name
	async fn read_admin(&self, username: &str) -> ClResult<Option<AdminUser>>;

	/// Creates an administrative user with a freshly generated token
	async fn create_admin(&self, username: &str, password: &str) -> ClResult<AdminUser>;

	/// Checks a username and password. Returns the user's token on success
	/// and records the login time.
	async fn authenticate_admin(&self, username: &str, password: &str) -> ClResult<Option<Box<str>>>;

	/// Replaces the token of an administrative user, returning the new one
	async fn rotate_token(&self, username: &str) -> ClResult<Box<str>>;
}

// vim: ts=4
