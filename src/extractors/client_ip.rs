use std::net::SocketAddr;
use std::sync::Arc;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::extract::connect_info::MockConnectInfo;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::http::StatusCode;
use crate::state::AppState;

/// The resolved caller address, kept as a string: a proxy-installed header
/// entry is authoritative even when it does not parse as an IP literal.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl FromRequestParts<Arc<AppState>> for ClientIp {
	type Rejection = StatusCode;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &Arc<AppState>,
	) -> Result<Self, Self::Rejection> {
		if let Some(proxy) = &state.config.trusted_proxy {
			if let Some(ip) = forwarded_by_trusted_proxy(&parts.headers, proxy) {
				return Ok(Self(ip.to_owned()));
			}
		}
		if let Some(ip) = header_value(&parts.headers, "x-real-ip") {
			return Ok(Self(ip.to_owned()));
		}
		let addr = parts.extensions.get::<ConnectInfo<SocketAddr>>()
			.map(|v| v.ip())
			.or_else(|| {
				parts.extensions.get::<MockConnectInfo<SocketAddr>>()
					.map(|v| v.0.ip())
			});
		let addr = addr.ok_or(StatusCode::BAD_REQUEST)?;
		Ok(Self(addr.to_string()))
	}
}

/// Last `x-forwarded-for` hop, only when the request went through the
/// configured proxy: clients may prepend entries, the proxy appends the
/// authoritative one.
fn forwarded_by_trusted_proxy<'a>(headers: &'a HeaderMap, proxy: &str) -> Option<&'a str> {
	let forwarded_server = header_value(headers, "x-forwarded-server")?;
	if forwarded_server != proxy {
		return None;
	}
	headers.get("x-forwarded-for")
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.split(',').next_back())
		.map(str::trim)
		.filter(|v| !v.is_empty())
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name)
		.and_then(|v| v.to_str().ok())
		.map(str::trim)
		.filter(|v| !v.is_empty())
}
