//! Client identity extraction
//!
//! Shared by the rate limiter and the brute-force guard. Forwarding headers
//! take precedence over the peer address:
//! `X-Forwarded-For` (first entry) > `X-Real-IP` > connection address.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::HeaderMap;
use hyper::Request;

/// Identity used when nothing identifies the client
pub const UNKNOWN_IDENTITY: &str = "unknown";

/// Resolves the client identity of a request
pub fn client_identity<B>(req: &Request<B>) -> Box<str> {
	let peer = req.extensions().get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0);
	client_identity_from_parts(req.headers(), peer)
}

/// Resolves the client identity from headers and an optional peer address
pub fn client_identity_from_parts(headers: &HeaderMap, peer: Option<SocketAddr>) -> Box<str> {
	extract_from_xff(headers)
		.or_else(|| extract_from_x_real_ip(headers))
		.or_else(|| peer.map(|addr| addr.ip().to_string().into()))
		.unwrap_or_else(|| UNKNOWN_IDENTITY.into())
}

/// Extract the first address from X-Forwarded-For
fn extract_from_xff(headers: &HeaderMap) -> Option<Box<str>> {
	headers
		.get("x-forwarded-for")
		.and_then(|h| h.to_str().ok())
		.and_then(|s| s.split(',').next())
		.and_then(normalize_address)
}

/// Extract the address from X-Real-IP
fn extract_from_x_real_ip(headers: &HeaderMap) -> Option<Box<str>> {
	headers.get("x-real-ip").and_then(|h| h.to_str().ok()).and_then(normalize_address)
}

/// Strips the port and IPv6 brackets from an address.
///
/// - `"203.0.113.7:8080"` → `"203.0.113.7"`
/// - `"[2001:db8::1]:443"` → `"2001:db8::1"`
/// - `"[2001:db8::1]"` → `"2001:db8::1"`
/// - `"2001:db8::1"` → `"2001:db8::1"`
pub fn normalize_address(raw: &str) -> Option<Box<str>> {
	let raw = raw.trim();
	if raw.is_empty() {
		return None;
	}
	if let Ok(addr) = raw.parse::<SocketAddr>() {
		return Some(addr.ip().to_string().into());
	}

	let stripped = raw.trim_start_matches('[').trim_end_matches(']');
	if stripped.is_empty() { None } else { Some(stripped.into()) }
}


// vim: ts=4
