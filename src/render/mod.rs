//! Report rendering: one HTML template and a chain of PDF renderer tiers.

mod chrome;
pub mod html;
mod layout;
mod text;

pub use chrome::ChromeRenderer;
pub use html::{escape_html, render_html};
pub use layout::LayoutRenderer;
pub use text::PlainTextRenderer;

use crate::{
    Error, Result,
    config::RenderConfig,
    report::{CategoryLabel, Language, StructuredReport},
};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Which template variant to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Includes the user block (`generated_by`, `user_email`).
    Detailed,
    Compact,
}

/// Everything a renderer tier needs for one document.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub report: StructuredReport,
    pub category: CategoryLabel,
    pub language: Language,
    pub patient: Option<Map<String, Value>>,
    pub layout: Layout,
    pub generated_at: DateTime<Local>,
}

impl RenderContext {
    pub fn new(
        report: StructuredReport,
        category: impl Into<CategoryLabel>,
        language: Language,
        layout: Layout,
    ) -> Self {
        Self {
            report,
            category: category.into(),
            language,
            patient: None,
            layout,
            generated_at: Local::now(),
        }
    }

    pub fn with_patient(mut self, patient: Option<Map<String, Value>>) -> Self {
        self.patient = patient;
        self
    }

    /// A patient-info field as display text; null and empty values are skipped.
    pub fn patient_field(&self, key: &str) -> Option<String> {
        let value = self.patient.as_ref()?.get(key)?;
        let text = match value {
            Value::Null => return None,
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        (!text.is_empty()).then_some(text)
    }
}

/// One way of turning a report into document bytes.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    fn name(&self) -> &'static str;

    /// `html` is the pre-built template output; tiers that lay out the
    /// document themselves may ignore it.
    async fn render(&self, ctx: &RenderContext, html: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    /// Suggested filename, may contain Arabic.
    pub filename: String,
    pub ascii_filename: String,
    /// Name of the tier that produced `bytes`.
    pub tier: &'static str,
}

impl RenderedDocument {
    /// `Content-Disposition` value with an ASCII fallback and an RFC 5987
    /// UTF-8 name.
    pub fn content_disposition(&self) -> String {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            self.ascii_filename,
            percent_encode(&self.filename)
        )
    }
}

/// `<stem>_<YYYYmmdd_HHMMSS>.pdf`
pub fn filename_for(category: &CategoryLabel, language: Language, at: &DateTime<Local>) -> String {
    stamped(&category.file_stem(language), at)
}

fn stamped(stem: &str, at: &DateTime<Local>) -> String {
    format!("{}_{}.pdf", stem, at.format("%Y%m%d_%H%M%S"))
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Tries each tier in order and returns the first success.
pub struct RendererChain {
    tiers: Vec<Box<dyn PdfRenderer>>,
}

impl RendererChain {
    pub fn new(tiers: Vec<Box<dyn PdfRenderer>>) -> Self {
        Self { tiers }
    }

    /// Browser, then printpdf layout, then plain text.
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(vec![
            Box::new(ChromeRenderer::new(config)),
            Box::new(LayoutRenderer),
            Box::new(PlainTextRenderer),
        ])
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    pub async fn render(&self, ctx: &RenderContext) -> Result<RenderedDocument> {
        let html = render_html(ctx);
        info!(
            "Rendering {} report ({}), {} chars of HTML",
            ctx.category,
            ctx.language,
            html.chars().count()
        );

        for tier in &self.tiers {
            match tier.render(ctx, &html).await {
                Ok(bytes) => {
                    info!("PDF generated by {} tier: {} bytes", tier.name(), bytes.len());
                    let filename = filename_for(&ctx.category, ctx.language, &ctx.generated_at);
                    let ascii_filename =
                        stamped(&ctx.category.ascii_file_stem(), &ctx.generated_at);
                    return Ok(RenderedDocument {
                        bytes,
                        filename,
                        ascii_filename,
                        tier: tier.name(),
                    });
                }
                Err(e) => warn!("{} renderer failed: {}", tier.name(), e),
            }
        }

        Err(Error::RenderExhausted {
            tiers: self.tiers.len(),
        })
    }
}
