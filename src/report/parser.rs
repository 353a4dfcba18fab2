use super::{Category, Parameter, ReportScorer, StructuredReport};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

pub const DEFAULT_FINDING: &str = "Analysis completed - see detailed analysis above";
pub const DEFAULT_RECOMMENDATION: &str = "Consult with healthcare provider for interpretation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    Findings,
    Recommendations,
    Parameters,
}

static HEADINGS: LazyLock<[(Regex, Section); 4]> = LazyLock::new(|| {
    let heading = |alternatives: &str| {
        Regex::new(&format!(r"(?i)^#+\s*({alternatives})")).expect("heading regex")
    };
    [
        (heading("Detailed Analysis|التحليل التفصيلي"), Section::Summary),
        (heading("Key Findings|النتائج الرئيسية"), Section::Findings),
        (heading("Recommendations|التوصيات"), Section::Recommendations),
        (heading("Measured Parameters|المعايير المقاسة"), Section::Parameters),
    ]
});

// Names must start with a letter so digits inside "4.0-11.0" are not
// read back as a parameter called "4".
static PARAMETER_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // WBC: 12.5 x10^3/uL (4.0-11.0)
        r"(?i)(\p{L}\w*):\s*([\d.]+)\s*([^\s(]+)?\s*\(([^)]+)\)",
        // Hemoglobin 13.2 g/dL - 12.0-16.0
        r"(?i)(\p{L}\w*)\s*([\d.]+)\s*([^\s(]+)?\s*-\s*([^,\n]+)",
        // • Platelets: 250 x10^3/uL (150-400)
        r"(?i)•\s*(\p{L}\w*):\s*([\d.]+)\s*([^\s(]+)?\s*\(([^)]+)\)",
    ]
    .map(|pattern| Regex::new(pattern).expect("parameter regex"))
});

/// Turns free model prose into a [`StructuredReport`].
///
/// Section detection is line based. Non-bulleted lines are only kept while
/// the cursor is on the summary; under Key Findings, Recommendations or
/// Measured Parameters they are dropped because the model is told to bullet
/// those sections.
pub struct ResponseParser {
    scorer: Box<dyn ReportScorer>,
}

impl ResponseParser {
    pub fn new(scorer: Box<dyn ReportScorer>) -> Self {
        Self { scorer }
    }

    pub fn parse(&self, raw: &str, category: Option<Category>) -> StructuredReport {
        if raw.trim().is_empty() {
            warn!("Model response was empty, returning default report");
            return self.default_report(raw, category);
        }

        let mut summary = String::new();
        let mut findings = Vec::new();
        let mut recommendations = Vec::new();
        let mut section = Section::Summary;

        for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some((_, next)) = HEADINGS.iter().find(|(re, _)| re.is_match(line)) {
                section = *next;
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            if let Some(item) = line.strip_prefix('•').or_else(|| line.strip_prefix('-')) {
                let item = item.trim();
                if item.is_empty() {
                    continue;
                }
                match section {
                    Section::Findings => findings.push(item.to_string()),
                    Section::Recommendations => recommendations.push(item.to_string()),
                    Section::Summary | Section::Parameters => {}
                }
                continue;
            }
            if section == Section::Summary {
                summary.push_str(line);
                summary.push(' ');
            }
        }

        let parameters = extract_parameters(raw);
        debug!(
            "Parsed response: {} summary chars, {} findings, {} recommendations, {} parameters",
            summary.len(),
            findings.len(),
            recommendations.len(),
            parameters.len()
        );

        StructuredReport {
            summary: summary.trim_end().to_string(),
            findings,
            recommendations,
            parameters,
            severity: self.scorer.severity(raw),
            confidence: self.scorer.confidence(raw),
            category,
        }
    }

    /// Minimal report wrapping the raw text, used when nothing can be parsed.
    pub fn default_report(&self, raw: &str, category: Option<Category>) -> StructuredReport {
        StructuredReport {
            summary: raw.to_string(),
            findings: vec![DEFAULT_FINDING.to_string()],
            recommendations: vec![DEFAULT_RECOMMENDATION.to_string()],
            parameters: Vec::new(),
            severity: Default::default(),
            confidence: self.scorer.confidence(raw),
            category,
        }
    }
}

/// Pull `NAME: VALUE UNIT (REFERENCE)` style rows out of the whole text.
///
/// Matches from later patterns that overlap an earlier match are discarded;
/// the result is ordered by position in the text.
pub fn extract_parameters(text: &str) -> Vec<Parameter> {
    let mut spans: Vec<(usize, usize, Parameter)> = Vec::new();

    for pattern in PARAMETER_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let (start, end) = (whole.start(), whole.end());
            if spans.iter().any(|(s, e, _)| start < *e && *s < end) {
                continue;
            }
            let field = |i: usize| caps.get(i).map_or("", |m| m.as_str().trim());
            spans.push((start, end, Parameter::new(field(1), field(2), field(3), field(4))));
        }
    }

    spans.sort_by_key(|(start, _, _)| *start);
    spans.into_iter().map(|(_, _, p)| p).collect()
}
