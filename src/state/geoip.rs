use std::net::IpAddr;
use std::sync::Arc;
use log::{info, warn};
use maxminddb::{geoip2, MaxMindDbError, Mmap};
use tokio::task;
use tokio::time;
use crate::config::AppConfig;
use crate::model::AddressRecord;

pub struct GeoIpService {
	config: Arc<AppConfig>,
	reader: Option<Arc<maxminddb::Reader<Mmap>>>,
}

impl GeoIpService {
	pub fn new(config: Arc<AppConfig>) -> Arc<Self> {
		let reader = config.geoip_db.as_ref().and_then(|path| {
			match maxminddb::Reader::open_mmap(path) {
				Ok(reader) => {
					info!(
						"Opened GeoIP database {} (type={}, build_epoch={})",
						path.display(),
						reader.metadata.database_type,
						reader.metadata.build_epoch,
					);
					Some(Arc::new(reader))
				}
				Err(err) => {
					warn!("Unable to open GeoIP database {}: {err}", path.display());
					None
				}
			}
		});
		Arc::new(Self {
			config,
			reader,
		})
	}

	/// Best-effort enrichment: any failure degrades to the bare address.
	pub async fn enrich(&self, address: &str) -> AddressRecord {
		let record = AddressRecord::bare(address);
		let Some(reader) = self.reader.clone() else { return record };
		let Ok(ip) = record.ip.parse::<IpAddr>() else {
			warn!("Skipping GeoIP lookup for unparseable address {}", record.ip);
			return record;
		};
		let lookup = task::spawn_blocking(move || Self::lookup_city(&reader, ip));
		match time::timeout(self.config.geoip_timeout, lookup).await {
			Ok(Ok(Ok(geo))) => AddressRecord { geo, ..record },
			Ok(Ok(Err(err))) => {
				warn!("GeoIP lookup for {ip} failed: {err}");
				record
			}
			Ok(Err(err)) => {
				warn!("GeoIP lookup task for {ip} failed: {err}");
				record
			}
			Err(_) => {
				warn!("GeoIP lookup for {ip} timed out after {:?}", self.config.geoip_timeout);
				record
			}
		}
	}

	fn lookup_city(
		reader: &maxminddb::Reader<Mmap>,
		ip: IpAddr,
	) -> Result<Option<String>, MaxMindDbError> {
		let res = reader.lookup::<geoip2::City>(ip)?;
		let Some(res) = res else { return Ok(None) };
		let city = res.city.as_ref()
			.and_then(|c| c.names.as_ref())
			.and_then(|n| n.get("en"))
			.map(|n| (*n).to_owned());
		let country = res.country.as_ref()
			.and_then(|c| c.names.as_ref())
			.and_then(|n| n.get("en"))
			.map(|n| (*n).to_owned());
		Ok(match (city, country) {
			(Some(city), Some(country)) => Some(format!("{city}, {country}")),
			(Some(city), None) => Some(city),
			(None, country) => country,
		})
	}
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;
	use std::sync::Arc;
	use crate::config::AppConfig;
	use crate::model::AddressRecord;
	use super::GeoIpService;

	#[tokio::test]
	async fn missing_database_degrades_to_bare_record() {
		let service = GeoIpService::new(Arc::new(AppConfig::for_tests()));
		let record = service.enrich("1.2.3.4").await;
		assert_eq!(record, AddressRecord::bare("1.2.3.4"));
	}

	#[tokio::test]
	async fn unreadable_database_degrades_to_bare_record() {
		let mut config = AppConfig::for_tests();
		config.geoip_db = Some(PathBuf::from("/nonexistent/GeoLite2-City.mmdb"));
		let service = GeoIpService::new(Arc::new(config));
		let record = service.enrich("1.2.3.4").await;
		assert_eq!(record, AddressRecord::bare("1.2.3.4"));
	}

	#[tokio::test]
	async fn unparseable_address_degrades_to_bare_record() {
		let service = GeoIpService::new(Arc::new(AppConfig::for_tests()));
		let record = service.enrich("not-an-address").await;
		assert_eq!(record, AddressRecord::bare("not-an-address"));
	}
}
