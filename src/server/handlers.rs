use super::types::{FormData, HealthResponse, RootResponse, UploadedFile};
use crate::{
    Error, Result,
    analysis::{AnalysisRequest, Analyzer},
    render::{Layout, RenderContext, RendererChain},
    report::{Category, CategoryLabel, Language, StructuredReport},
};
use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Multipart parts read as files even when the client sends no filename.
const FILE_FIELDS: [&str; 2] = ["file", "image_file"];

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub renderer: Arc<RendererChain>,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Medical Analysis API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<StructuredReport>> {
    let form = read_form(multipart).await?;
    let file = required_file(&form, "file")?;
    let category = form
        .text("category")
        .ok_or_else(|| Error::invalid_input("Missing required field: category"))?;
    let language = parse_language(&form)?;

    let request = AnalysisRequest {
        image: file.bytes.to_vec(),
        filename: file.filename.clone(),
        content_type: file.content_type.clone(),
        category: category.to_string(),
        sub_category: form.text("sub_category").map(str::to_string),
        language,
        language_instruction: form.text("language_instruction").map(str::to_string),
        patient_info: form.text("patient_info").map(str::to_string),
    };

    run_analysis(&state, request).await
}

/// Fixed-category CBC route kept for older clients.
pub async fn analyze_cbc(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<StructuredReport>> {
    let form = read_form(multipart).await?;
    let file = required_file(&form, "file")?;

    let request = AnalysisRequest {
        image: file.bytes.to_vec(),
        filename: file.filename.clone(),
        content_type: file.content_type.clone(),
        category: Category::Cbc.as_str().to_string(),
        sub_category: None,
        language: Language::En,
        language_instruction: None,
        patient_info: form.text("patient_info").map(str::to_string),
    };

    run_analysis(&state, request).await
}

pub async fn generate_pdf_detailed(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response> {
    generate_pdf(&state, multipart, Layout::Detailed).await
}

pub async fn generate_pdf_compact(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response> {
    generate_pdf(&state, multipart, Layout::Compact).await
}

async fn run_analysis(state: &AppState, request: AnalysisRequest) -> Result<Json<StructuredReport>> {
    match state.analyzer.analyze(request).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            error!("Analysis request failed: {}", e);
            Err(e)
        }
    }
}

async fn generate_pdf(state: &AppState, multipart: Multipart, layout: Layout) -> Result<Response> {
    let form = read_form(multipart).await?;

    let raw = form
        .text("analysis_data")
        .ok_or_else(|| Error::invalid_input("Missing required field: analysis_data"))?;
    let report: StructuredReport = serde_json::from_str(raw)
        .map_err(|e| Error::invalid_input(format!("Invalid analysis_data JSON: {e}")))?;

    let category = match form.text("category") {
        Some(value) => CategoryLabel::parse(value),
        None => report
            .category
            .map(CategoryLabel::from)
            .ok_or_else(|| Error::invalid_input("Missing required field: category"))?,
    };
    if category.known().is_none() {
        warn!("Rendering PDF under unrecognised category label '{}'", category);
    }
    let language = parse_language(&form)?;
    let patient = patient_object(form.text("patient_info"));

    if let Some(image) = form.file("image_file") {
        debug!("Ignoring {} byte image_file on PDF request", image.bytes.len());
    }

    info!(
        "Generating {:?} PDF for {} report in {}",
        layout, category, language
    );

    let ctx = RenderContext::new(report, category, language, layout).with_patient(patient);
    let document = state.renderer.render(&ctx).await.map_err(|e| {
        error!("PDF generation failed: {}", e);
        e
    })?;

    info!(
        "Serving {} ({} bytes, {} tier)",
        document.filename,
        document.bytes.len(),
        document.tier
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, document.content_disposition()),
        ],
        document.bytes,
    )
        .into_response())
}

async fn read_form(mut multipart: Multipart) -> Result<FormData> {
    let mut form = FormData::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_input(format!("Invalid multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if field.file_name().is_some() || FILE_FIELDS.contains(&name.as_str()) {
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::invalid_input(format!("Failed to read field {name}: {e}")))?;
            form.files.insert(
                name,
                UploadedFile {
                    filename,
                    content_type,
                    bytes,
                },
            );
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| Error::invalid_input(format!("Failed to read field {name}: {e}")))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

fn required_file<'a>(form: &'a FormData, name: &str) -> Result<&'a UploadedFile> {
    form.file(name)
        .ok_or_else(|| Error::invalid_input(format!("Missing required field: {name}")))
}

/// `language` form field, `en` when absent.
fn parse_language(form: &FormData) -> Result<Language> {
    form.text("language")
        .map(str::parse::<Language>)
        .transpose()
        .map(Option::unwrap_or_default)
}

fn patient_object(raw: Option<&str>) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw?) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            warn!("Could not parse patient info JSON: {}", e);
            None
        }
    }
}
