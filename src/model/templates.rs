use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SupportedType {
	#[serde(rename = "type")]
	pub content_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EchoPageCtx<'a> {
	pub address: &'a str,
	pub geo: Option<&'a str>,
	pub supported_types: &'a [SupportedType],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPageCtx<'a> {
	pub description: String,
	pub supported_types: &'a [SupportedType],
}
