//! Last-resort tier: a UTF-8 text summary. Cannot fail.

use super::{PdfRenderer, RenderContext};
use crate::Result;
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct PlainTextRenderer;

#[async_trait]
impl PdfRenderer for PlainTextRenderer {
    fn name(&self) -> &'static str {
        "text"
    }

    async fn render(&self, ctx: &RenderContext, _html: &str) -> Result<Vec<u8>> {
        Ok(summary(ctx).into_bytes())
    }
}

fn summary(ctx: &RenderContext) -> String {
    let report = &ctx.report;
    let mut lines = vec![
        "MEDICAL ANALYSIS REPORT".to_string(),
        format!("Generated: {}", ctx.generated_at.format("%Y-%m-%d %H:%M:%S")),
        String::new(),
        format!("Category: {}", ctx.category.display_name(ctx.language)),
        format!("Confidence: {}%", report.confidence),
        format!("Severity: {}", report.severity),
        String::new(),
        "Analysis:".to_string(),
        report.summary.clone(),
    ];

    for (title, items) in [
        ("Findings", &report.findings),
        ("Recommendations", &report.recommendations),
    ] {
        if items.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("{title}:"));
        lines.extend(items.iter().map(|item| format!("- {item}")));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
