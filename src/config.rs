use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TRUSTED_PROXY: &str = "bit.pe";
const DEFAULT_GEOIP_TIMEOUT_MS: u64 = 500;

pub struct AppConfig {
	pub listen_addr: SocketAddr,
	pub tls_cert: Option<PathBuf>,
	pub tls_key: Option<PathBuf>,
	pub static_dir: PathBuf,
	pub cors_origin: Option<String>,
	pub trusted_proxy: Option<String>,
	pub geoip_db: Option<PathBuf>,
	pub geoip_timeout: Duration,
	pub debug: bool,
}

impl AppConfig {
	pub fn load_from_env() -> Arc<Self> {
		let listen_addr = env::var("LISTEN_ADDR").ok()
			.unwrap_or_else(|| "127.0.0.1:8080".to_owned())
			.parse()
			.expect("LISTEN_ADDR must be a valid socket address");
		let tls_cert = env::var("TLS_CERT").ok().map(PathBuf::from);
		let tls_key = env::var("TLS_KEY").ok().map(PathBuf::from);
		assert_eq!(
			tls_cert.is_some(),
			tls_key.is_some(),
			"TLS_CERT and TLS_KEY must be set together",
		);
		let static_dir = env::var("STATIC_DIR").ok()
			.map(PathBuf::from)
			.unwrap_or_else(|| PathBuf::from("./static"));
		let cors_origin = env::var("CORS_ORIGIN").ok();
		let trusted_proxy = match env::var("TRUSTED_PROXY").ok() {
			Some(value) if value.is_empty() => None,
			Some(value) => Some(value),
			None => Some(DEFAULT_TRUSTED_PROXY.to_owned()),
		};
		let geoip_db = env::var("GEOIP_DB").ok().map(PathBuf::from);
		let geoip_timeout = env::var("GEOIP_TIMEOUT_MS").ok()
			.map(|value| value.parse().expect("GEOIP_TIMEOUT_MS must be an integer"))
			.map(Duration::from_millis)
			.unwrap_or(Duration::from_millis(DEFAULT_GEOIP_TIMEOUT_MS));
		let debug = env::var("DEBUG").ok()
			.is_some_and(|value| value != "0" && !value.eq_ignore_ascii_case("false"));

		Arc::new(Self {
			listen_addr,
			tls_cert,
			tls_key,
			static_dir,
			cors_origin,
			trusted_proxy,
			geoip_db,
			geoip_timeout,
			debug,
		})
	}
}

#[cfg(test)]
impl AppConfig {
	pub fn for_tests() -> Self {
		Self {
			listen_addr: "127.0.0.1:0".parse().expect("Unable to parse test address"),
			tls_cert: None,
			tls_key: None,
			static_dir: PathBuf::from("./static"),
			cors_origin: None,
			trusted_proxy: Some(DEFAULT_TRUSTED_PROXY.to_owned()),
			geoip_db: None,
			geoip_timeout: Duration::from_millis(DEFAULT_GEOIP_TIMEOUT_MS),
			debug: false,
		}
	}
}
