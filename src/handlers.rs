use std::sync::Arc;
use std::time::Instant;
use axum::extract::{Query, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use log::{debug, error, info};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use crate::extractors::ClientIp;
use crate::model::{EchoError, ErrorPageCtx};
use crate::state::{AppState, RenderContext};

pub fn build_router(state: Arc<AppState>) -> Router {
	let favicon = ServeFile::new(state.config.static_dir.join("favicon.ico"));
	let assets = ServeDir::new(&state.config.static_dir);
	let mut router = Router::new()
		.route("/", get(echo))
		.route_service("/favicon.ico", favicon)
		.nest_service("/static", assets)
		.layer(middleware::from_fn(access_log))
		.with_state(state.clone());
	if let Some(origin) = &state.config.cors_origin {
		router = router.layer(cors_layer(origin));
	}
	router
}

fn cors_layer(origin: &str) -> CorsLayer {
	let origin = origin.parse::<HeaderValue>()
		.expect("CORS_ORIGIN must be a valid header value");
	CorsLayer::new()
		.allow_origin(origin)
		.allow_methods([Method::GET, Method::PUT, Method::POST, Method::DELETE])
		.allow_headers([header::CONTENT_TYPE])
}

async fn access_log(req: Request, next: Next) -> Response {
	let method = req.method().clone();
	let uri = req.uri().clone();
	let start = Instant::now();
	let res = next.run(req).await;
	info!(
		"{method} {uri} {} {:.1}ms",
		res.status().as_u16(),
		start.elapsed().as_secs_f64() * 1000.0,
	);
	res
}

#[derive(Debug, Clone, Deserialize)]
pub struct EchoQuery {
	pub format: Option<String>,
	pub callback: Option<String>,
}

async fn echo(
	State(state): State<Arc<AppState>>,
	ClientIp(address): ClientIp,
	Query(query): Query<EchoQuery>,
	headers: HeaderMap,
) -> Response {
	let record = state.geoip.enrich(&address).await;
	if let Some(format) = &query.format {
		debug!("Requested format: {format}");
	}
	let accept = headers.get(header::ACCEPT).and_then(|value| value.to_str().ok());
	let entry = match state.formats.negotiate(query.format.as_deref(), accept) {
		Ok(entry) => entry,
		Err(err) => return error_response(&state, err),
	};
	let ctx = RenderContext {
		record: &record,
		callback: query.callback.as_deref(),
		templates: &state.templates,
		supported_types: state.formats.supported_types(),
	};
	match (entry.render)(&ctx) {
		Ok(body) => ([(header::CONTENT_TYPE, entry.content_type)], body).into_response(),
		Err(err) => error_response(&state, err),
	}
}

fn error_response(state: &AppState, err: EchoError) -> Response {
	let ctx = ErrorPageCtx {
		description: err.to_string(),
		supported_types: state.formats.supported_types(),
	};
	match state.templates.render_error(&ctx) {
		Ok(html) => (StatusCode::BAD_REQUEST, Html(html)).into_response(),
		Err(template_err) => {
			error!("Unable to render error page: {template_err}");
			(StatusCode::BAD_REQUEST, err.to_string()).into_response()
		}
	}
}
