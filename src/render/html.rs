//! Printable HTML for a report, in English (LTR) or Arabic (RTL).
//!
//! All report and patient text is HTML-escaped before interpolation.

use super::{Layout, RenderContext};
use crate::report::Language;

struct Labels {
    title: &'static str,
    user_info: &'static str,
    generated_by: &'static str,
    email: &'static str,
    analysis_summary: &'static str,
    analysis_type: &'static str,
    confidence: &'static str,
    severity: &'static str,
    detailed_analysis: &'static str,
    parameters: &'static str,
    parameter_columns: [&'static str; 4],
    findings: &'static str,
    recommendations: &'static str,
    no_analysis: &'static str,
    no_findings: &'static str,
    no_recommendations: &'static str,
    disclaimer: &'static str,
    disclaimer_text: &'static str,
    date: &'static str,
    time: &'static str,
}

const EN: Labels = Labels {
    title: "MEDICAL ANALYSIS REPORT",
    user_info: "USER INFORMATION",
    generated_by: "Generated By",
    email: "Email",
    analysis_summary: "ANALYSIS SUMMARY",
    analysis_type: "Analysis Type",
    confidence: "Confidence Score",
    severity: "Severity Level",
    detailed_analysis: "DETAILED ANALYSIS",
    parameters: "LABORATORY PARAMETERS",
    parameter_columns: ["Parameter", "Value", "Unit", "Reference"],
    findings: "KEY FINDINGS",
    recommendations: "RECOMMENDATIONS",
    no_analysis: "No detailed analysis available.",
    no_findings: "No specific findings noted.",
    no_recommendations: "Consult with healthcare provider for interpretation.",
    disclaimer: "IMPORTANT DISCLAIMER",
    disclaimer_text: "This application uses AI to analyze medical images with high accuracy to support clinical decision-making. However, it is not a substitute for professional medical advice, diagnosis, or treatment. Users must consult a licensed physician before taking any clinical action.",
    date: "Report Date",
    time: "Generated Time",
};

const AR: Labels = Labels {
    title: "تقرير التحليل الطبي",
    user_info: "معلومات المستخدم",
    generated_by: "أنشأ بواسطة",
    email: "البريد الإلكتروني",
    analysis_summary: "ملخص التحليل",
    analysis_type: "نوع التحليل",
    confidence: "نسبة الثقة",
    severity: "مستوى الخطورة",
    detailed_analysis: "التحليل التفصيلي",
    parameters: "المعايير المختبرية",
    parameter_columns: ["المعيار", "القيمة", "الوحدة", "المرجع"],
    findings: "النتائج الرئيسية",
    recommendations: "التوصيات",
    no_analysis: "لا يوجد تحليل متاح",
    no_findings: "لا توجد نتائج محددة.",
    no_recommendations: "استشر مقدم الرعاية الصحية لتفسير النتائج.",
    disclaimer: "إخلاء مسؤولية مهم",
    disclaimer_text: "يستخدم هذا التطبيق الذكاء الاصطناعي لتحليل الصور الطبية بدقة عالية لدعم اتخاذ القرارات السريرية. ومع ذلك، فهو ليس بديلاً عن الاستشارة الطبية المهنية أو التشخيص أو العلاج. يجب على المستخدمين استشارة طبيب مرخص قبل اتخاذ أي إجراء سريري.",
    date: "تاريخ التقرير",
    time: "وقت الإنشاء",
};

const FOOTER: &str = "Generated by MedDx AI Medical Analysis Platform";

fn labels(language: Language) -> &'static Labels {
    match language {
        Language::En => &EN,
        Language::Ar => &AR,
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_html(ctx: &RenderContext) -> String {
    let t = labels(ctx.language);
    let report = &ctx.report;
    let rtl = ctx.language.is_rtl();
    let (direction, start_side) = if rtl { ("rtl", "right") } else { ("ltr", "left") };
    let font_family = if rtl {
        "'Amiri', 'Noto Sans Arabic', 'Arial Unicode MS', Arial, sans-serif"
    } else {
        "Arial, sans-serif"
    };

    let mut html = String::with_capacity(8 * 1024);

    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="{lang}" dir="{direction}">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<link href="https://fonts.googleapis.com/css2?family=Amiri:wght@400;700&family=Noto+Sans+Arabic:wght@400;600;700&display=swap" rel="stylesheet">
<style>
@page {{ size: A4; margin: 20mm 15mm; }}
* {{ box-sizing: border-box; margin: 0; padding: 0; }}
body {{ font-family: {font_family}; direction: {direction}; line-height: 1.6; color: #333; background: white; font-size: 12pt; }}
.header {{ text-align: center; margin-bottom: 30px; border-bottom: 3px solid #4F46E5; padding-bottom: 20px; }}
.title {{ font-size: 24pt; font-weight: bold; color: #4F46E5; margin-bottom: 10px; }}
.date-info {{ margin-top: 10px; color: #6B7280; font-size: 11pt; }}
.section {{ margin-bottom: 25px; break-inside: avoid; page-break-inside: avoid; }}
.section-title {{ font-size: 14pt; font-weight: bold; color: #1F2937; margin-bottom: 10px; padding: 8px 12px; background: #F3F4F6; border-{start_side}: 4px solid #4F46E5; }}
.info-grid {{ display: grid; grid-template-columns: 1fr 1fr; gap: 15px; margin-bottom: 20px; }}
.info-item {{ padding: 10px; background: #F9FAFB; border-radius: 4px; }}
.info-label {{ font-weight: bold; color: #4B5563; margin-bottom: 4px; }}
.info-value {{ color: #1F2937; }}
.analysis-text {{ background: #F9FAFB; padding: 15px; border-radius: 6px; margin: 10px 0; white-space: pre-wrap; }}
ul {{ margin: 10px 0; padding-{start_side}: 20px; }}
li {{ margin-bottom: 8px; line-height: 1.5; }}
table {{ width: 100%; border-collapse: collapse; margin-top: 15px; }}
th, td {{ padding: 10px; border: 1px solid #dee2e6; text-align: {start_side}; }}
th {{ background: #f8f9fa; }}
.disclaimer {{ background: #FEF2F2; border: 2px solid #FCA5A5; padding: 15px; border-radius: 6px; margin-top: 30px; }}
.disclaimer-title {{ font-weight: bold; color: #DC2626; margin-bottom: 8px; }}
.disclaimer-text {{ color: #991B1B; font-size: 11pt; }}
.footer {{ margin-top: 40px; text-align: center; font-size: 10pt; color: #6B7280; border-top: 1px solid #E5E7EB; padding-top: 15px; }}
</style>
</head>
<body>
<div class="header">
<div class="title">{title}</div>
<div class="date-info">{date_label}: {date} | {time_label}: {time}</div>
</div>
"#,
        lang = ctx.language.as_str(),
        title = t.title,
        date_label = t.date,
        date = ctx.generated_at.format("%Y-%m-%d"),
        time_label = t.time,
        time = ctx.generated_at.format("%H:%M:%S"),
    ));

    if ctx.layout == Layout::Detailed {
        let items: Vec<(&str, String)> = [
            (t.generated_by, ctx.patient_field("generated_by")),
            (t.email, ctx.patient_field("user_email")),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
        .collect();

        if !items.is_empty() {
            html.push_str(&format!(
                "<div class=\"section\">\n<div class=\"section-title\">{}</div>\n<div class=\"info-grid\">\n",
                t.user_info
            ));
            for (label, value) in items {
                info_item(&mut html, label, &escape_html(&value));
            }
            html.push_str("</div>\n</div>\n");
        }
    }

    html.push_str(&format!(
        "<div class=\"section\">\n<div class=\"section-title\">{}</div>\n<div class=\"info-grid\">\n",
        t.analysis_summary
    ));
    info_item(
        &mut html,
        t.analysis_type,
        &escape_html(ctx.category.display_name(ctx.language)),
    );
    info_item(&mut html, t.confidence, &format!("{}%", report.confidence));
    info_item(&mut html, t.severity, report.severity.as_str());
    html.push_str("</div>\n</div>\n");

    let summary = if report.summary.trim().is_empty() {
        t.no_analysis.to_string()
    } else {
        escape_html(&report.summary)
    };
    section_open(&mut html, t.detailed_analysis);
    html.push_str(&format!("<div class=\"analysis-text\">{summary}</div>\n"));
    html.push_str("</div>\n");

    if !report.parameters.is_empty() {
        section_open(&mut html, t.parameters);
        html.push_str("<table>\n<tr>");
        for column in t.parameter_columns {
            html.push_str(&format!("<th>{column}</th>"));
        }
        html.push_str("</tr>\n");
        for p in &report.parameters {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&p.name),
                escape_html(&p.value),
                escape_html(&p.unit),
                escape_html(&p.reference_range)
            ));
        }
        html.push_str("</table>\n</div>\n");
    }

    bullet_section(&mut html, t.findings, &report.findings, t.no_findings);
    bullet_section(
        &mut html,
        t.recommendations,
        &report.recommendations,
        t.no_recommendations,
    );

    html.push_str(&format!(
        r#"<div class="disclaimer">
<div class="disclaimer-title">{}</div>
<div class="disclaimer-text">{}</div>
</div>
<div class="footer">{FOOTER}</div>
</body>
</html>
"#,
        t.disclaimer, t.disclaimer_text
    ));

    html
}

fn section_open(html: &mut String, title: &str) {
    html.push_str(&format!(
        "<div class=\"section\">\n<div class=\"section-title\">{title}</div>\n"
    ));
}

/// `value` must already be escaped.
fn info_item(html: &mut String, label: &str, value: &str) {
    html.push_str(&format!(
        "<div class=\"info-item\"><div class=\"info-label\">{label}</div><div class=\"info-value\">{value}</div></div>\n"
    ));
}

fn bullet_section(html: &mut String, title: &str, items: &[String], empty: &str) {
    section_open(html, title);
    if items.is_empty() {
        html.push_str(&format!("<div class=\"analysis-text\">{empty}</div>\n"));
    } else {
        html.push_str("<ul>\n");
        for item in items {
            html.push_str(&format!("<li>{}</li>\n", escape_html(item)));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</div>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::context;
    use crate::report::{Category, Parameter, Severity};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;y&#39;"
        );
    }

    #[test]
    fn test_contains_severity_and_confidence() {
        let mut ctx = context(Category::Cbc, Language::En, Layout::Compact);
        ctx.report.severity = Severity::Moderate;
        ctx.report.confidence = 93;
        let html = render_html(&ctx);
        assert!(html.contains("moderate"));
        assert!(html.contains("93%"));
        assert!(html.contains("Complete Blood Count (CBC)"));
        assert!(html.contains("dir=\"ltr\""));
    }

    #[test]
    fn test_arabic_is_rtl_with_arabic_labels() {
        let html = render_html(&context(Category::Ecg, Language::Ar, Layout::Compact));
        assert!(html.contains("dir=\"rtl\""));
        assert!(html.contains("تقرير التحليل الطبي"));
        assert!(html.contains("تخطيط القلب"));
        assert!(html.contains("border-right"));
    }

    #[test]
    fn test_model_text_is_escaped() {
        let mut ctx = context(Category::Xray, Language::En, Layout::Compact);
        ctx.report.findings = vec!["<img src=x onerror=alert(1)>".to_string()];
        let html = render_html(&ctx);
        assert!(!html.contains("<img src=x"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
    }

    #[test]
    fn test_raw_category_label_is_escaped() {
        let mut ctx = context(Category::Cbc, Language::En, Layout::Compact);
        ctx.category = crate::report::CategoryLabel::parse("<b>MRI</b>");
        let html = render_html(&ctx);
        assert!(html.contains("&lt;b&gt;MRI&lt;/b&gt;"));
        assert!(!html.contains("<b>MRI"));
    }

    #[test]
    fn test_parameters_table() {
        let mut ctx = context(Category::Cbc, Language::En, Layout::Compact);
        ctx.report.parameters = vec![Parameter::new("WBC", "12.5", "x10^3/uL", "4.0-11.0")];
        let html = render_html(&ctx);
        assert!(html.contains("<td>WBC</td><td>12.5</td><td>x10^3/uL</td><td>4.0-11.0</td>"));
    }

    #[test]
    fn test_user_block_only_in_detailed_layout() {
        let patient = json!({"generated_by": "Dr. Salem", "user_email": "salem@example.com"});

        let mut detailed = context(Category::Cbc, Language::En, Layout::Detailed);
        detailed.patient = patient.as_object().cloned();
        let html = render_html(&detailed);
        assert!(html.contains("USER INFORMATION"));
        assert!(html.contains("Dr. Salem"));
        assert!(html.contains("salem@example.com"));

        let mut compact = context(Category::Cbc, Language::En, Layout::Compact);
        compact.patient = patient.as_object().cloned();
        assert!(!render_html(&compact).contains("USER INFORMATION"));
    }

    #[test]
    fn test_empty_sections_use_placeholders() {
        let mut ctx = context(Category::Microscopy, Language::En, Layout::Compact);
        ctx.report.summary.clear();
        ctx.report.findings.clear();
        ctx.report.recommendations.clear();
        let html = render_html(&ctx);
        assert!(html.contains("No detailed analysis available."));
        assert!(html.contains("No specific findings noted."));
    }
}
