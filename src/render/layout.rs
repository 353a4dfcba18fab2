//! Second tier: a plain A4 document laid out directly with printpdf.
//!
//! Uses the built-in Helvetica faces, which only cover Latin-1. Common
//! typography outside that range is mapped to ASCII and anything else left
//! becomes `?`. Arabic text is replaced by an English notice rather than
//! emitted as broken glyphs.

use super::{PdfRenderer, RenderContext};
use crate::{Error, Result, report::is_arabic_script};
use async_trait::async_trait;
use printpdf::*;
use std::io::BufWriter;

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const TOP: f32 = 280.0;
const BOTTOM: f32 = 20.0;
const LEFT: Mm = Mm(20.0);
const INDENT: Mm = Mm(25.0);
const WRAP_COLUMNS: usize = 90;

const NON_LATIN_NOTICE: &str =
    "[This text is not available in the fallback PDF. Arabic content requires the full renderer.]";

#[derive(Debug, Default)]
pub struct LayoutRenderer;

#[async_trait]
impl PdfRenderer for LayoutRenderer {
    fn name(&self) -> &'static str {
        "layout"
    }

    async fn render(&self, ctx: &RenderContext, _html: &str) -> Result<Vec<u8>> {
        build_pdf(ctx)
    }
}

/// Tracks the write position and starts a new page when the bottom margin is hit.
struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor<'_> {
    fn line(&mut self, text: &str, size: f32, x: Mm, font: &IndirectFontRef, advance: f32) {
        if self.y - advance < BOTTOM {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
        }
        self.layer.use_text(text, size, x, Mm(self.y), font);
        self.y -= advance;
    }

    fn paragraph(&mut self, text: &str, x: Mm, font: &IndirectFontRef) {
        for line in wrap_text(&latin_or_notice(text), WRAP_COLUMNS) {
            self.line(&line, 10.0, x, font, 5.0);
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }
}

fn build_pdf(ctx: &RenderContext) -> Result<Vec<u8>> {
    let report = &ctx.report;
    let (doc, page1, layer1) =
        PdfDocument::new("MEDICAL ANALYSIS REPORT", PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| Error::render(format!("PDF font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| Error::render(format!("PDF font error: {e}")))?;

    let mut cursor = Cursor {
        doc: &doc,
        layer: doc.get_page(page1).get_layer(layer1),
        y: TOP,
    };

    cursor.line("MEDICAL ANALYSIS REPORT", 18.0, LEFT, &bold, 9.0);
    cursor.line(
        &format!("Generated: {}", ctx.generated_at.format("%Y-%m-%d %H:%M:%S")),
        10.0,
        LEFT,
        &font,
        8.0,
    );

    cursor.line("ANALYSIS SUMMARY", 12.0, LEFT, &bold, 6.0);
    cursor.line(
        &format!("Analysis Type: {}", to_latin1(&ctx.category.as_str().to_uppercase())),
        10.0,
        INDENT,
        &font,
        5.0,
    );
    cursor.line(&format!("Confidence: {}%", report.confidence), 10.0, INDENT, &font, 5.0);
    cursor.line(&format!("Severity: {}", report.severity), 10.0, INDENT, &font, 5.0);
    cursor.gap(4.0);

    cursor.line("DETAILED ANALYSIS", 12.0, LEFT, &bold, 6.0);
    if report.summary.trim().is_empty() {
        cursor.paragraph("No detailed analysis available.", INDENT, &font);
    } else {
        cursor.paragraph(&report.summary, INDENT, &font);
    }
    cursor.gap(4.0);

    if !report.parameters.is_empty() {
        cursor.line("LABORATORY PARAMETERS", 12.0, LEFT, &bold, 6.0);
        for p in &report.parameters {
            let row = format!("{}: {} {} (ref. {})", p.name, p.value, p.unit, p.reference_range);
            cursor.paragraph(&row, INDENT, &font);
        }
        cursor.gap(4.0);
    }

    for (title, items) in [
        ("KEY FINDINGS", &report.findings),
        ("RECOMMENDATIONS", &report.recommendations),
    ] {
        if items.is_empty() {
            continue;
        }
        cursor.line(title, 12.0, LEFT, &bold, 6.0);
        for (i, item) in items.iter().enumerate() {
            cursor.paragraph(&format!("{}. {}", i + 1, item), INDENT, &font);
        }
        cursor.gap(4.0);
    }

    cursor.gap(4.0);
    cursor.paragraph(
        "DISCLAIMER: This analysis is generated by AI for educational purposes only. It does not \
         constitute medical advice and should not replace consultation with a qualified \
         healthcare professional.",
        LEFT,
        &font,
    );

    drop(cursor);
    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| Error::render(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| Error::render(format!("PDF buffer error: {e}")))
}

fn latin_or_notice(text: &str) -> String {
    if text.chars().any(is_arabic_script) {
        NON_LATIN_NOTICE.to_string()
    } else {
        to_latin1(text)
    }
}

fn to_latin1(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            c if (c as u32) <= 0xFF => out.push(c),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2022}' | '\u{2023}' | '\u{25CF}' => out.push('*'),
            '\u{03BC}' => out.push('\u{00B5}'),
            '\u{2264}' => out.push_str("<="),
            '\u{2265}' => out.push_str(">="),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            '\u{2192}' => out.push_str("->"),
            _ => out.push('?'),
        }
    }
    out
}

/// Greedy word wrap on character count; words longer than `width` are split.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let separator = usize::from(!current.is_empty());
        if current.chars().count() + separator + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
