//! Password hashing and token generation

use std::fmt::Write;

use animequote_types::prelude::*;

const BCRYPT_COST: u32 = 10;
const TOKEN_BYTES: usize = 32;

fn generate_password_hash_sync(password: &str) -> ClResult<Box<str>> {
	let hash = bcrypt::hash(password, BCRYPT_COST)
		.map_err(|err| Error::Internal(format!("password hashing failed: {}", err)))?;

	Ok(hash.into())
}

/// Hashes a password on the blocking pool
pub async fn generate_password_hash(password: Box<str>) -> ClResult<Box<str>> {
	tokio::task::spawn_blocking(move || generate_password_hash_sync(&password))
		.await
		.map_err(|err| Error::Internal(format!("password hashing task failed: {}", err)))?
}

/// Checks a password against a stored hash on the blocking pool
pub async fn check_password(password: Box<str>, password_hash: Box<str>) -> ClResult<bool> {
	tokio::task::spawn_blocking(move || bcrypt::verify(password.as_ref(), &password_hash))
		.await
		.map_err(|err| Error::Internal(format!("password check task failed: {}", err)))?
		.map_err(|_| Error::PermissionDenied)
}

/// Generates a random hex-encoded token
pub fn generate_token() -> Box<str> {
	use rand::Rng;

	let mut bytes = [0u8; TOKEN_BYTES];
	rand::rng().fill_bytes(&mut bytes);

	let mut token = String::with_capacity(TOKEN_BYTES * 2);
	for byte in bytes {
		let _ = write!(token, "{:02x}", byte);
	}
	token.into()
}


// vim: ts=4
