use std::sync::Arc;
use handlebars::Handlebars;
use thiserror::Error;
use crate::model::{EchoPageCtx, ErrorPageCtx};

#[derive(Debug, Error)]
pub enum TemplateServiceError {
	#[error(transparent)]
	Render(#[from] handlebars::RenderError),
}

pub struct TemplateService {
	handlebars: Handlebars<'static>,
}

impl TemplateService {
	pub fn new() -> Arc<Self> {
		let mut handlebars = Handlebars::new();
		handlebars.set_strict_mode(true);
		handlebars.set_dev_mode(cfg!(debug_assertions));
		handlebars.register_template_file("ipecho", "./templates/ipecho.html")
			.expect("Unable to register ipecho template");
		handlebars.register_template_file("error", "./templates/error.html")
			.expect("Unable to register error template");
		Arc::new(Self {
			handlebars,
		})
	}

	pub fn render_echo(&self, ctx: &EchoPageCtx<'_>) -> Result<String, TemplateServiceError> {
		Ok(self.handlebars.render("ipecho", ctx)?)
	}

	pub fn render_error(&self, ctx: &ErrorPageCtx<'_>) -> Result<String, TemplateServiceError> {
		Ok(self.handlebars.render("error", ctx)?)
	}
}
