use meddx_rust::{
    Error,
    analysis::{AnalysisRequest, Analyzer},
    report::{
        Category, DEFAULT_FINDING, DEFAULT_RECOMMENDATION, Language, Parameter, ReportScorer,
        ResponseParser, Severity,
    },
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

mod common;

use common::mocks::MockVisionClient;
use common::test_utils::{SAMPLE_CBC_REPLY, create_test_config};

fn request(category: &str) -> AnalysisRequest {
    AnalysisRequest {
        image: b"\x89PNG\r\n\x1a\nfake".to_vec(),
        filename: Some("blood_smear.PNG".to_string()),
        content_type: Some("image/png".to_string()),
        category: category.to_string(),
        sub_category: None,
        language: Language::En,
        language_instruction: None,
        patient_info: None,
    }
}

fn analyzer(client: Arc<MockVisionClient>) -> Analyzer {
    Analyzer::new(client, &create_test_config().llm)
}

#[tokio::test]
async fn test_cbc_analysis_end_to_end() {
    let client = Arc::new(MockVisionClient::new().with_response(SAMPLE_CBC_REPLY));
    let report = assert_ok!(analyzer(client.clone()).analyze(request("cbc")).await);

    assert_eq!(report.category, Some(Category::Cbc));
    assert_eq!(
        report.summary,
        "Mild leukocytosis consistent with a reactive process."
    );
    assert_eq!(report.findings.len(), 2);
    assert_eq!(
        report.recommendations,
        vec!["Repeat CBC in two weeks", "Correlate with clinical symptoms"]
    );
    assert_eq!(
        report.parameters,
        vec![
            Parameter::new("WBC", "12.5", "x10^3/uL", "4.0-11.0"),
            Parameter::new("Hemoglobin", "13.8", "g/dL", "12.0-16.0"),
        ]
    );
    assert!((90..=97).contains(&report.confidence));
}

#[tokio::test]
async fn test_model_request_shape() {
    let client = Arc::new(MockVisionClient::new().with_response(SAMPLE_CBC_REPLY));
    let mut req = request("xray");
    req.sub_category = Some("chest_lung".to_string());
    req.patient_info = Some(r#"{"age": 61, "sex": "M"}"#.to_string());

    assert_ok!(analyzer(client.clone()).analyze(req).await);

    let requests = client.get_requests();
    assert_eq!(requests.len(), 1);
    let sent = &requests[0];
    assert_eq!(sent.max_tokens, 2000);
    assert!((sent.temperature - 0.1).abs() < f32::EPSILON);
    assert!(sent.image_data_uri.starts_with("data:image/png;base64,"));
    assert!(sent.user_prompt.contains("Patient context: {\"age\":61,\"sex\":\"M\"}"));
    assert!(sent.user_prompt.ends_with("Specific X-ray type: chest_lung"));
}

#[tokio::test]
async fn test_arabic_request_uses_arabic_prompts() {
    let client = Arc::new(MockVisionClient::new().with_response("## التحليل التفصيلي\nطبيعي"));
    let mut req = request("ecg");
    req.language = Language::Ar;

    let report = assert_ok!(analyzer(client.clone()).analyze(req).await);
    assert_eq!(report.summary, "طبيعي");

    let sent = &client.get_requests()[0];
    assert!(sent.system_prompt.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c)));
}

#[tokio::test]
async fn test_non_image_rejected_before_model_call() {
    let client = Arc::new(MockVisionClient::new().with_response(SAMPLE_CBC_REPLY));
    let mut req = request("cbc");
    req.content_type = Some("application/pdf".to_string());

    let err = assert_err!(analyzer(client.clone()).analyze(req).await);
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(err.to_string(), "File must be an image");
    assert!(client.get_requests().is_empty());
}

#[tokio::test]
async fn test_unknown_category_rejected() {
    let client = Arc::new(MockVisionClient::new());
    let err = assert_err!(analyzer(client.clone()).analyze(request("mri")).await);
    assert_eq!(
        err.to_string(),
        "Invalid category. Must be one of: cbc, ecg, xray, microscopy"
    );
    assert!(client.get_requests().is_empty());
}

#[tokio::test]
async fn test_model_failure_becomes_analysis_failed() {
    let client = Arc::new(MockVisionClient::new().with_error("upstream unavailable"));
    let err = assert_err!(analyzer(client).analyze(request("microscopy")).await);

    assert!(matches!(err, Error::AnalysisFailed(_)));
    assert!(err.to_string().starts_with("Analysis failed: "));
    assert!(err.to_string().contains("upstream unavailable"));
}

#[test_log::test(tokio::test)]
async fn test_unstructured_reply_keeps_text_in_summary() {
    let client = Arc::new(MockVisionClient::new().with_response("Image quality too low to assess."));
    let report = assert_ok!(analyzer(client).analyze(request("xray")).await);

    assert_eq!(report.summary, "Image quality too low to assess.");
    assert!(report.findings.is_empty());
    assert!(report.parameters.is_empty());
}

#[tokio::test]
async fn test_blank_reply_yields_default_report() {
    let client = Arc::new(MockVisionClient::new().with_response("   \n  "));
    let report = assert_ok!(analyzer(client).analyze(request("ecg")).await);

    assert_eq!(report.findings, vec![DEFAULT_FINDING.to_string()]);
    assert_eq!(report.recommendations, vec![DEFAULT_RECOMMENDATION.to_string()]);
    assert_eq!(report.category, Some(Category::Ecg));
}

struct FixedScorer;

impl ReportScorer for FixedScorer {
    fn severity(&self, _raw: &str) -> Severity {
        Severity::Severe
    }

    fn confidence(&self, _raw: &str) -> u8 {
        80
    }
}

#[tokio::test]
async fn test_custom_scorer_replaces_heuristics() {
    let client = Arc::new(MockVisionClient::new().with_response(SAMPLE_CBC_REPLY));
    let analyzer = analyzer(client).with_parser(ResponseParser::new(Box::new(FixedScorer)));

    let report = assert_ok!(analyzer.analyze(request("cbc")).await);
    assert_eq!(report.severity, Severity::Severe);
    assert_eq!(report.confidence, 80);
}
