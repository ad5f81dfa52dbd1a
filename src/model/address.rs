use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
	pub ip: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub geo: Option<String>,
}

impl AddressRecord {
	pub fn bare(ip: impl Into<String>) -> Self {
		Self {
			ip: ip.into(),
			geo: None,
		}
	}
}
