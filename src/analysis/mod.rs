//! Analysis orchestration: validate, encode, prompt, call the model, parse.
//!
//! Each call is strictly sequential and makes exactly one model request.
//! Failures from the model are reported as [`Error::AnalysisFailed`] and are
//! not retried here.

mod encode;

pub use encode::{encode_image, is_image_content_type};

use crate::{
    Error, Result,
    config::LlmConfig,
    llm::{VisionClient, VisionRequest},
    prompts::{self, PromptPair},
    report::{Category, HeuristicScorer, Language, ResponseParser, StructuredReport},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

/// One uploaded image plus the form fields that steer its analysis.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub category: String,
    pub sub_category: Option<String>,
    pub language: Language,
    /// Caller-supplied directive placed ahead of the system prompt.
    pub language_instruction: Option<String>,
    /// Raw patient-info JSON as submitted.
    pub patient_info: Option<String>,
}

pub struct Analyzer {
    client: Arc<dyn VisionClient>,
    parser: ResponseParser,
    max_tokens: u32,
    temperature: f32,
}

impl Analyzer {
    pub fn new(client: Arc<dyn VisionClient>, llm: &LlmConfig) -> Self {
        Self {
            client,
            parser: ResponseParser::new(Box::new(HeuristicScorer)),
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
        }
    }

    pub fn with_parser(mut self, parser: ResponseParser) -> Self {
        self.parser = parser;
        self
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> Result<StructuredReport> {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "analysis",
            %request_id,
            category = %request.category,
            language = %request.language,
            sub_category = request.sub_category.as_deref().unwrap_or("")
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: AnalysisRequest) -> Result<StructuredReport> {
        info!(
            "Received {} analysis request for file {} ({} bytes)",
            request.category.to_uppercase(),
            request.filename.as_deref().unwrap_or("<unnamed>"),
            request.image.len()
        );

        if !is_image_content_type(request.content_type.as_deref()) {
            warn!(
                "Rejected upload with content type {:?}",
                request.content_type
            );
            return Err(Error::invalid_input("File must be an image"));
        }
        let category: Category = request.category.parse()?;

        let image_data_uri = encode_image(&request.image, request.filename.as_deref());
        let prompts = build_prompts(&request, category);

        let vision_request = VisionRequest {
            system_prompt: prompts.system,
            user_prompt: prompts.user,
            image_data_uri,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        info!("Sending {} request to vision model", category);
        let response = self.client.complete(vision_request).await.map_err(|e| {
            error!("{} analysis failed: {}", category.as_str().to_uppercase(), e);
            match e {
                Error::AnalysisFailed(msg) => Error::AnalysisFailed(msg),
                other => Error::analysis_failed(other.to_string()),
            }
        })?;

        info!(
            "Received model response: {} characters, finish_reason={:?}",
            response.content.chars().count(),
            response.finish_reason
        );
        if let Some(usage) = &response.usage {
            debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let report = self.parser.parse(&response.content, Some(category));
        info!(
            "{} analysis completed: severity={}, {} findings, {} parameters",
            category.as_str().to_uppercase(),
            report.severity,
            report.findings.len(),
            report.parameters.len()
        );
        Ok(report)
    }
}

/// Table prompts plus patient context, sub-category note and caller directive.
pub fn build_prompts(request: &AnalysisRequest, category: Category) -> PromptPair {
    let sub_category = request
        .sub_category
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    if let Some(sub) = sub_category {
        if !prompts::sub_categories(category.as_str()).iter().any(|known| *known == sub) {
            debug!("Sub-category '{}' has no dedicated prompt, using category default", sub);
        }
    }

    let PromptPair { mut system, mut user } =
        prompts::select(category.as_str(), sub_category, request.language);

    if let Some(context) = patient_context(request.patient_info.as_deref()) {
        let label = match request.language {
            Language::En => "Patient context",
            Language::Ar => "سياق المريض",
        };
        user.push_str(&format!("\n\n{label}: {context}"));
    }

    if let Some(sub) = sub_category {
        let label = match (category, request.language) {
            (Category::Xray, Language::En) => Some("Specific X-ray type"),
            (Category::Xray, Language::Ar) => Some("نوع الأشعة المحدد"),
            (Category::Microscopy, Language::En) => Some("Specific microscopy analysis type"),
            (Category::Microscopy, Language::Ar) => Some("نوع التحليل المجهري المحدد"),
            _ => None,
        };
        if let Some(label) = label {
            user.push_str(&format!("\n\n{label}: {sub}"));
        }
    }

    if let Some(directive) = request
        .language_instruction
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        system = format!("{directive}\n\n{system}");
    }

    PromptPair { system, user }
}

/// Compact JSON of the patient info, or `None` when absent, empty or invalid.
fn patient_context(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Null) => None,
        Ok(Value::Object(map)) if map.is_empty() => None,
        Ok(value) => {
            info!("Patient info provided");
            Some(value.to_string())
        }
        Err(e) => {
            warn!("Could not parse patient info JSON: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(category: &str, language: Language) -> AnalysisRequest {
        AnalysisRequest {
            image: vec![1, 2, 3],
            filename: Some("scan.png".to_string()),
            content_type: Some("image/png".to_string()),
            category: category.to_string(),
            sub_category: None,
            language,
            language_instruction: None,
            patient_info: None,
        }
    }

    #[test]
    fn test_plain_prompts_match_table() {
        let req = request("cbc", Language::En);
        assert_eq!(
            build_prompts(&req, Category::Cbc),
            prompts::select("cbc", None, Language::En)
        );
    }

    #[test]
    fn test_patient_context_appended() {
        let mut req = request("cbc", Language::En);
        req.patient_info = Some(r#"{"age": 42}"#.to_string());
        let pair = build_prompts(&req, Category::Cbc);
        assert!(pair.user.ends_with("\n\nPatient context: {\"age\":42}"));
    }

    #[test]
    fn test_invalid_patient_json_is_ignored() {
        let mut req = request("ecg", Language::En);
        req.patient_info = Some("not json".to_string());
        let pair = build_prompts(&req, Category::Ecg);
        assert!(!pair.user.contains("Patient context"));
    }

    #[test]
    fn test_sub_category_note_in_arabic() {
        let mut req = request("xray", Language::Ar);
        req.sub_category = Some("skeletal".to_string());
        let pair = build_prompts(&req, Category::Xray);
        assert!(pair.user.ends_with("\n\nنوع الأشعة المحدد: skeletal"));
    }

    #[test]
    fn test_sub_category_note_skipped_for_cbc() {
        let mut req = request("cbc", Language::En);
        req.sub_category = Some("anything".to_string());
        let pair = build_prompts(&req, Category::Cbc);
        assert!(!pair.user.contains("anything"));
    }

    #[test]
    fn test_language_directive_is_prepended() {
        let mut req = request("ecg", Language::En);
        req.language_instruction = Some("Respond only in Arabic.".to_string());
        let pair = build_prompts(&req, Category::Ecg);
        assert!(pair.system.starts_with("Respond only in Arabic.\n\nYou are a medical expert."));
    }
}
