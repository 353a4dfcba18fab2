//! Primary tier: print the HTML report with a headless Chromium.
//!
//! This is the only tier that shapes Arabic correctly. The HTML is written to
//! a temp file, loaded by the browser, given `settle_ms` of virtual time for
//! web fonts, and printed to A4 (page size and margins come from the
//! template's `@page` rule).

use super::{PdfRenderer, RenderContext};
use crate::{Error, Result, config::RenderConfig};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const MIN_HTML_LEN: usize = 100;
const STDERR_TAIL: usize = 500;

pub struct ChromeRenderer {
    chrome_path: String,
    settle_ms: u64,
    timeout: Duration,
}

impl ChromeRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            chrome_path: config.chrome_path.clone(),
            settle_ms: config.settle_ms,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn args(&self, html_url: &str, pdf_path: &str) -> Vec<String> {
        vec![
            "--headless=new".to_string(),
            "--no-sandbox".to_string(),
            "--disable-setuid-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--font-render-hinting=none".to_string(),
            "--no-pdf-header-footer".to_string(),
            "--run-all-compositor-stages-before-draw".to_string(),
            format!("--virtual-time-budget={}", self.settle_ms),
            format!("--print-to-pdf={pdf_path}"),
            html_url.to_string(),
        ]
    }
}

#[async_trait]
impl PdfRenderer for ChromeRenderer {
    fn name(&self) -> &'static str {
        "chrome"
    }

    async fn render(&self, _ctx: &RenderContext, html: &str) -> Result<Vec<u8>> {
        if html.len() < MIN_HTML_LEN {
            return Err(Error::render("HTML content is too short or empty"));
        }

        let dir = tempfile::tempdir()?;
        let html_path = dir.path().join("report.html");
        let pdf_path = dir.path().join("report.pdf");
        tokio::fs::write(&html_path, html).await?;

        let html_url = format!("file://{}", html_path.display());
        let args = self.args(&html_url, &pdf_path.display().to_string());
        debug!("Launching {} for {} bytes of HTML", self.chrome_path, html.len());

        let mut cmd = Command::new(&self.chrome_path);
        cmd.args(&args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                Error::render(format!(
                    "{} did not finish within {:?}",
                    self.chrome_path, self.timeout
                ))
            })?
            .map_err(|e| Error::render(format!("failed to launch {}: {}", self.chrome_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: String = stderr
                .chars()
                .rev()
                .take(STDERR_TAIL)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            return Err(Error::render(format!(
                "{} exited with {}: {}",
                self.chrome_path,
                output.status,
                tail.trim()
            )));
        }

        let bytes = tokio::fs::read(&pdf_path)
            .await
            .map_err(|e| Error::render(format!("browser produced no PDF: {e}")))?;
        if !bytes.starts_with(b"%PDF") {
            return Err(Error::render("browser output is not a PDF"));
        }

        debug!("Browser printed {} PDF bytes", bytes.len());
        Ok(bytes)
    }
}
