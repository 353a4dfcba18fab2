use async_trait::async_trait;
use meddx_rust::{
    Error, Result,
    llm::{Usage, VisionClient, VisionRequest, VisionResponse},
    render::{PdfRenderer, RenderContext},
};
use std::sync::{Arc, Mutex};

/// Mock vision client that replays canned replies and records every request
#[derive(Debug)]
pub struct MockVisionClient {
    pub responses: Arc<Mutex<Vec<String>>>,
    pub requests: Arc<Mutex<Vec<VisionRequest>>>,
    pub error: Option<String>,
}

impl MockVisionClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            error: None,
        }
    }

    pub fn with_response(self, content: &str) -> Self {
        self.responses.lock().unwrap().push(content.to_string());
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn get_requests(&self) -> Vec<VisionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockVisionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisionClient for MockVisionClient {
    async fn complete(&self, request: VisionRequest) -> Result<VisionResponse> {
        self.requests.lock().unwrap().push(request);

        if let Some(ref error) = self.error {
            return Err(Error::internal(error.clone()));
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(Error::analysis_failed("No more mock responses available"));
        }

        Ok(VisionResponse {
            model: "mock-vision".to_string(),
            content: responses.remove(0),
            finish_reason: Some("stop".to_string()),
            usage: Some(Usage {
                prompt_tokens: 900,
                completion_tokens: 250,
                total_tokens: 1150,
            }),
        })
    }
}

/// Renderer tier that always fails
pub struct FailingRenderer(pub &'static str);

#[async_trait]
impl PdfRenderer for FailingRenderer {
    fn name(&self) -> &'static str {
        self.0
    }

    async fn render(&self, _ctx: &RenderContext, _html: &str) -> Result<Vec<u8>> {
        Err(Error::render(format!("{} unavailable in tests", self.0)))
    }
}

/// Renderer tier that returns fixed bytes and keeps the HTML it was given
pub struct StaticRenderer {
    pub bytes: Vec<u8>,
    pub seen_html: Arc<Mutex<Vec<String>>>,
}

impl StaticRenderer {
    pub fn pdf() -> Self {
        Self {
            bytes: b"%PDF-1.4\n% static test document\n%%EOF".to_vec(),
            seen_html: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl PdfRenderer for StaticRenderer {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn render(&self, _ctx: &RenderContext, html: &str) -> Result<Vec<u8>> {
        self.seen_html.lock().unwrap().push(html.to_string());
        Ok(self.bytes.clone())
    }
}
