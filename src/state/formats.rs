use std::str::FromStr;
use std::sync::Arc;
use ahash::AHashMap;
use mime::Mime;
use crate::model::{AddressRecord, EchoError, EchoPageCtx, SupportedType};
use crate::state::TemplateService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
	Text,
	Json,
	Js,
	Yaml,
	Html,
}

impl FromStr for Format {
	type Err = EchoError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"text" => Ok(Self::Text),
			"json" => Ok(Self::Json),
			"js" => Ok(Self::Js),
			"yaml" => Ok(Self::Yaml),
			"html" => Ok(Self::Html),
			_ => Err(EchoError::UnknownFormat),
		}
	}
}

pub type RenderFn = fn(&RenderContext<'_>) -> Result<String, EchoError>;

pub struct RenderContext<'a> {
	pub record: &'a AddressRecord,
	pub callback: Option<&'a str>,
	pub templates: &'a TemplateService,
	pub supported_types: &'a [SupportedType],
}

pub struct FormatEntry {
	pub content_type: &'static str,
	media_type: Mime,
	pub format: Format,
	pub render: RenderFn,
}

pub struct FormatService {
	entries: Vec<FormatEntry>,
	by_format: AHashMap<Format, usize>,
	supported_types: Vec<SupportedType>,
}

impl FormatService {
	pub fn new() -> Arc<Self> {
		let mut service = Self {
			entries: Vec::new(),
			by_format: AHashMap::new(),
			supported_types: Vec::new(),
		};
		service.register(&["text/plain"], Format::Text, render_text);
		service.register(&["application/json"], Format::Json, render_json);
		service.register(&["application/javascript"], Format::Js, render_js);
		service.register(
			&["text/yaml", "text/x-yaml", "application/yaml", "application/x-yaml"],
			Format::Yaml,
			render_yaml,
		);
		service.register(&["text/html"], Format::Html, render_html);
		Arc::new(service)
	}

	/// Registers the same renderer under each content type; the first entry
	/// for a logical format becomes its `format=` lookup target, and overall
	/// registration order is negotiation priority.
	fn register(&mut self, content_types: &[&'static str], format: Format, render: RenderFn) {
		for &content_type in content_types {
			let media_type = content_type.parse()
				.expect("Registered content type must be a valid media type");
			self.entries.push(FormatEntry {
				content_type,
				media_type,
				format,
				render,
			});
			self.by_format.entry(format).or_insert(self.entries.len() - 1);
			self.supported_types.push(SupportedType {
				content_type,
			});
		}
	}

	pub fn supported_types(&self) -> &[SupportedType] {
		&self.supported_types
	}

	pub fn negotiate(
		&self,
		format: Option<&str>,
		accept: Option<&str>,
	) -> Result<&FormatEntry, EchoError> {
		if let Some(name) = format {
			let format = name.parse::<Format>()?;
			let idx = self.by_format.get(&format)
				.copied()
				.ok_or(EchoError::UnknownFormat)?;
			return Ok(&self.entries[idx]);
		}
		self.negotiate_accept(accept.unwrap_or("*/*"))
			.ok_or(EchoError::NoAcceptableFormat)
	}

	fn negotiate_accept(&self, accept: &str) -> Option<&FormatEntry> {
		let ranges = parse_media_ranges(accept);
		let mut best: Option<(usize, f32)> = None;
		for (idx, entry) in self.entries.iter().enumerate() {
			// The most specific matching range determines this entry's quality.
			let quality = ranges.iter()
				.filter_map(|range| {
					range.matches(&entry.media_type)
						.map(|specificity| (specificity, range.quality))
				})
				.max_by_key(|(specificity, _)| *specificity)
				.map(|(_, quality)| quality);
			let Some(quality) = quality else { continue };
			if quality <= 0.0 {
				continue;
			}
			// Strictly greater, so earlier registration wins ties.
			if best.is_none_or(|(_, best_quality)| quality > best_quality) {
				best = Some((idx, quality));
			}
		}
		best.map(|(idx, _)| &self.entries[idx])
	}
}

struct MediaRange {
	media_type: Mime,
	quality: f32,
}

impl MediaRange {
	/// Specificity of the match: exact beats `type/*` beats `*/*`.
	fn matches(&self, offer: &Mime) -> Option<u8> {
		if self.media_type.type_() == mime::STAR {
			return Some(0);
		}
		if self.media_type.type_() != offer.type_() {
			return None;
		}
		if self.media_type.subtype() == mime::STAR {
			return Some(1);
		}
		(self.media_type.subtype() == offer.subtype()).then_some(2)
	}
}

fn parse_media_ranges(accept: &str) -> Vec<MediaRange> {
	accept.split(',')
		.filter_map(|part| {
			let media_type: Mime = part.trim().parse().ok()?;
			let quality = media_type.get_param("q")
				.and_then(|q| q.as_str().parse::<f32>().ok())
				.map(|q| q.clamp(0.0, 1.0))
				.unwrap_or(1.0);
			Some(MediaRange {
				media_type,
				quality,
			})
		})
		.collect()
}

fn render_text(ctx: &RenderContext<'_>) -> Result<String, EchoError> {
	Ok(ctx.record.ip.clone())
}

fn render_json(ctx: &RenderContext<'_>) -> Result<String, EchoError> {
	Ok(serde_json::to_string(ctx.record)?)
}

fn render_js(ctx: &RenderContext<'_>) -> Result<String, EchoError> {
	let Some(callback) = ctx.callback else { return Err(EchoError::MissingCallback) };
	let payload = serde_json::to_string(ctx.record)?;
	Ok(format!("{callback}({payload})"))
}

fn render_yaml(ctx: &RenderContext<'_>) -> Result<String, EchoError> {
	Ok(serde_yaml::to_string(ctx.record)?)
}

fn render_html(ctx: &RenderContext<'_>) -> Result<String, EchoError> {
	let page = EchoPageCtx {
		address: &ctx.record.ip,
		geo: ctx.record.geo.as_deref(),
		supported_types: ctx.supported_types,
	};
	Ok(ctx.templates.render_echo(&page)?)
}

#[cfg(test)]
mod tests {
	use crate::model::{AddressRecord, EchoError};
	use crate::state::TemplateService;
	use super::{Format, FormatService, RenderContext};

	#[test]
	fn explicit_format_lookup_is_by_logical_name() {
		let service = FormatService::new();
		let entry = service.negotiate(Some("json"), None).unwrap();
		assert_eq!(entry.format, Format::Json);
		assert_eq!(entry.content_type, "application/json");
	}

	#[test]
	fn unknown_format_is_rejected() {
		let service = FormatService::new();
		let err = service.negotiate(Some("xml"), None).err().unwrap();
		assert!(matches!(err, EchoError::UnknownFormat));
	}

	#[test]
	fn format_override_beats_accept_header() {
		let service = FormatService::new();
		let entry = service.negotiate(Some("yaml"), Some("application/json")).unwrap();
		assert_eq!(entry.format, Format::Yaml);
		assert_eq!(entry.content_type, "text/yaml");
	}

	#[test]
	fn missing_accept_header_picks_first_registered() {
		let service = FormatService::new();
		let entry = service.negotiate(None, None).unwrap();
		assert_eq!(entry.content_type, "text/plain");
	}

	#[test]
	fn full_wildcard_picks_first_registered() {
		let service = FormatService::new();
		let entry = service.negotiate(None, Some("*/*")).unwrap();
		assert_eq!(entry.content_type, "text/plain");
	}

	#[test]
	fn exact_range_matches_its_entry() {
		let service = FormatService::new();
		let entry = service.negotiate(None, Some("application/json")).unwrap();
		assert_eq!(entry.content_type, "application/json");
	}

	#[test]
	fn subtype_wildcard_picks_first_of_its_type() {
		let service = FormatService::new();
		let entry = service.negotiate(None, Some("application/*")).unwrap();
		assert_eq!(entry.content_type, "application/json");
	}

	#[test]
	fn quality_values_order_candidates() {
		let service = FormatService::new();
		let entry = service
			.negotiate(None, Some("text/plain;q=0.1, application/json"))
			.unwrap();
		assert_eq!(entry.content_type, "application/json");
	}

	#[test]
	fn most_specific_range_determines_quality() {
		let service = FormatService::new();
		let entry = service
			.negotiate(None, Some("text/*;q=0.2, text/html"))
			.unwrap();
		assert_eq!(entry.content_type, "text/html");
	}

	#[test]
	fn zero_quality_excludes_a_range() {
		let service = FormatService::new();
		let entry = service
			.negotiate(None, Some("text/plain;q=0, */*"))
			.unwrap();
		assert_eq!(entry.content_type, "application/json");
	}

	#[test]
	fn unmatched_accept_is_rejected() {
		let service = FormatService::new();
		let err = service.negotiate(None, Some("application/xml")).err().unwrap();
		assert!(matches!(err, EchoError::NoAcceptableFormat));
	}

	#[test]
	fn equivalent_yaml_content_types_share_one_renderer() {
		let service = FormatService::new();
		let yaml_types = ["text/yaml", "text/x-yaml", "application/yaml", "application/x-yaml"];
		for content_type in yaml_types {
			let entry = service.negotiate(None, Some(content_type)).unwrap();
			assert_eq!(entry.format, Format::Yaml, "{content_type}");
			assert_eq!(entry.content_type, content_type);
		}
	}

	#[test]
	fn jsonp_requires_a_callback() {
		let service = FormatService::new();
		let templates = TemplateService::new();
		let record = AddressRecord::bare("1.2.3.4");
		let entry = service.negotiate(Some("js"), None).unwrap();

		let ctx = RenderContext {
			record: &record,
			callback: None,
			templates: &templates,
			supported_types: service.supported_types(),
		};
		let err = (entry.render)(&ctx).unwrap_err();
		assert!(matches!(err, EchoError::MissingCallback));

		let ctx = RenderContext {
			record: &record,
			callback: Some("foo"),
			templates: &templates,
			supported_types: service.supported_types(),
		};
		let body = (entry.render)(&ctx).unwrap();
		assert_eq!(body, r#"foo({"ip":"1.2.3.4"})"#);
	}

	#[test]
	fn html_renderer_lists_supported_types() {
		let service = FormatService::new();
		let templates = TemplateService::new();
		let record = AddressRecord {
			ip: "1.2.3.4".to_owned(),
			geo: Some("Reykjavik, Iceland".to_owned()),
		};
		let entry = service.negotiate(Some("html"), None).unwrap();
		let ctx = RenderContext {
			record: &record,
			callback: None,
			templates: &templates,
			supported_types: service.supported_types(),
		};
		let body = (entry.render)(&ctx).unwrap();
		assert!(body.contains("1.2.3.4"));
		assert!(body.contains("Reykjavik, Iceland"));
		assert!(body.contains("text/plain"));
		assert!(body.contains("application/x-yaml"));
	}

	#[test]
	fn json_and_yaml_round_trip_to_the_same_record() {
		let service = FormatService::new();
		let templates = TemplateService::new();
		let record = AddressRecord {
			ip: "203.0.113.7".to_owned(),
			geo: Some("Berlin, Germany".to_owned()),
		};
		let ctx = RenderContext {
			record: &record,
			callback: None,
			templates: &templates,
			supported_types: service.supported_types(),
		};

		let json = (service.negotiate(Some("json"), None).unwrap().render)(&ctx).unwrap();
		let yaml = (service.negotiate(Some("yaml"), None).unwrap().render)(&ctx).unwrap();

		let from_json: AddressRecord = serde_json::from_str(&json).unwrap();
		let from_yaml: AddressRecord = serde_yaml::from_str(&yaml).unwrap();
		assert_eq!(from_json, record);
		assert_eq!(from_yaml, record);
	}
}
