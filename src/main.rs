use std::net::SocketAddr;
use axum_server::tls_rustls::RustlsConfig;
use log::info;
use tokio::net::TcpListener;
use crate::config::AppConfig;
use crate::handlers::build_router;
use crate::state::AppState;

mod config;
mod handlers;
mod state;
mod model;
mod extractors;

#[tokio::main]
async fn main() {
	let _ = dotenvy::dotenv();
	let config = AppConfig::load_from_env();
	let default_filter = if config.debug { "debug" } else { "info" };
	env_logger::init_from_env(env_logger::Env::default().default_filter_or(default_filter));
	let state = AppState::new(config.clone());
	let router = build_router(state);
	match (&config.tls_cert, &config.tls_key) {
		(Some(cert), Some(key)) => {
			let tls = RustlsConfig::from_pem_file(cert, key)
				.await
				.expect("Unable to load TLS material");
			info!("Listening on https://{}/", config.listen_addr);
			axum_server::bind_rustls(config.listen_addr, tls)
				.serve(router.into_make_service_with_connect_info::<SocketAddr>())
				.await
				.expect("Unable to start HTTPS server");
		}
		_ => {
			let listener = TcpListener::bind(config.listen_addr)
				.await
				.expect("Unable to bind TCP listener");
			info!("Listening on http://{}/", listener.local_addr().expect("Unable to get local address"));
			axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
				.await
				.expect("Unable to start Axum server");
		}
	}
}
