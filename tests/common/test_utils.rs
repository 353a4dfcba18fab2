use meddx_rust::config::{Config, LlmConfig, LogsConfig, RenderConfig, ServerConfig};

pub const BOUNDARY: &str = "meddx-test-boundary";

/// Reply in the heading/bullet shape the prompts ask for
pub const SAMPLE_CBC_REPLY: &str = "## Detailed Analysis\n\
Mild leukocytosis consistent with a reactive process.\n\
\n\
## Key Findings\n\
- WBC: 12.5 x10^3/uL (4.0-11.0)\n\
- Hemoglobin: 13.8 g/dL (12.0-16.0)\n\
\n\
## Recommendations\n\
- Repeat CBC in two weeks\n\
- Correlate with clinical symptoms\n";

pub const SAMPLE_CONFIG_YAML: &str = r#"
llm:
  base_url: "http://127.0.0.1:9/v1"
  api_key: "test-api-key"
  model: "gpt-4.1"
server:
  host: "127.0.0.1"
  port: 8080
  logs:
    level: "debug"
render:
  chrome_path: "/nonexistent/chromium"
  settle_ms: 10
  timeout_secs: 5
"#;

/// Create a test configuration with sensible defaults
pub fn create_test_config() -> Config {
    Config {
        llm: LlmConfig {
            base_url: "http://127.0.0.1:9/v1".to_string(),
            api_key: "test-api-key".to_string(),
            model: "gpt-4.1".to_string(),
            max_tokens: 2000,
            temperature: 0.1,
            timeout_secs: 5,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            logs: LogsConfig {
                level: "debug".to_string(),
            },
            cors_allowed_origins: vec!["*".to_string()],
            max_upload_bytes: 1024 * 1024,
        },
        render: RenderConfig {
            chrome_path: "/nonexistent/chromium".to_string(),
            settle_ms: 10,
            timeout_secs: 5,
        },
    }
}

/// One part of a multipart/form-data body
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

/// Encode parts as a multipart body delimited by [`BOUNDARY`]
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Write a config YAML file into `dir` and return its path
pub async fn create_test_config_file(dir: &tempfile::TempDir, content: &str) -> String {
    let config_path = dir.path().join("config.yaml");
    tokio::fs::write(&config_path, content)
        .await
        .expect("Failed to write test config");
    config_path.to_string_lossy().to_string()
}
