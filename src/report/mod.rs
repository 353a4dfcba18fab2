mod parser;
mod types;

pub use parser::{DEFAULT_FINDING, DEFAULT_RECOMMENDATION, ResponseParser, extract_parameters};
pub use types::*;

use rand::Rng;

/// Severity and confidence for a parsed report.
///
/// The shipped [`HeuristicScorer`] is a placeholder: severity is a keyword
/// scan and confidence is random. A calibrated model can replace it here
/// without touching the parser or its callers.
pub trait ReportScorer: Send + Sync {
    fn severity(&self, raw: &str) -> Severity;
    fn confidence(&self, raw: &str) -> u8;
}

pub const CONFIDENCE_RANGE: std::ops::RangeInclusive<u8> = 90..=97;

const SEVERITY_TIERS: [(Severity, &[&str]); 3] = [
    (Severity::Severe, &["severe", "critical", "emergency", "urgent"]),
    (Severity::Moderate, &["moderate", "concerning"]),
    (Severity::Mild, &["mild", "slight"]),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl ReportScorer for HeuristicScorer {
    /// First tier with any keyword present wins.
    fn severity(&self, raw: &str) -> Severity {
        let text = raw.to_lowercase();
        SEVERITY_TIERS
            .iter()
            .find(|(_, words)| words.iter().any(|w| text.contains(w)))
            .map(|(severity, _)| *severity)
            .unwrap_or_default()
    }

    fn confidence(&self, _raw: &str) -> u8 {
        rand::thread_rng().gen_range(CONFIDENCE_RANGE)
    }
}

/// Parse with the default heuristic scorer.
pub fn parse_response(raw: &str, category: Option<Category>) -> StructuredReport {
    ResponseParser::new(Box::new(HeuristicScorer)).parse(raw, category)
}
