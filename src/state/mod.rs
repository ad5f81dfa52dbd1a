mod formats;
mod geoip;
mod templates;

pub use formats::*;
pub use geoip::*;
pub use templates::*;

use std::sync::Arc;
use crate::config::AppConfig;

pub struct AppState {
	pub config: Arc<AppConfig>,
	pub formats: Arc<FormatService>,
	pub geoip: Arc<GeoIpService>,
	pub templates: Arc<TemplateService>,
}

impl AppState {
	pub fn new(config: Arc<AppConfig>) -> Arc<Self> {
		let formats = FormatService::new();
		let geoip = GeoIpService::new(config.clone());
		let templates = TemplateService::new();

		Arc::new(Self {
			config,
			formats,
			geoip,
			templates,
		})
	}
}
