use crate::models::{
    prompt::DEFAULT_MEDIA_TYPE, Attachment, Modality, Prompt, PromptRequest,
};
use crate::services::metrics;
use crate::startup::AppState;
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::time::Instant;

/// Form/JSON field carrying the user's text.
const PROMPT_FIELD: &str = "prompt";

/// Any JSON value is accepted as `prompt`; non-strings are rendered as JSON.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateTextRequest {
    #[serde(default)]
    pub prompt: Option<serde_json::Value>,
}

impl GenerateTextRequest {
    pub fn user_text(&self) -> Option<String> {
        self.prompt.as_ref().map(|value| match value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub result: String,
}

#[tracing::instrument(skip(state, body))]
pub async fn generate_text(
    State(state): State<AppState>,
    body: Result<Json<GenerateTextRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let Json(request) = body.map_err(json_error)?;

    let user_text = request.user_text();
    let prompt = Prompt::flattened(&state.persona, user_text.as_deref());
    let result = run_generation(&state, "text", &prompt).await?;

    Ok(Json(GenerateResponse { result }))
}

#[tracing::instrument(skip(state, multipart))]
pub async fn generate_from_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate_from_attachment(state, Modality::Image, multipart).await
}

#[tracing::instrument(skip(state, multipart))]
pub async fn generate_from_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate_from_attachment(state, Modality::Document, multipart).await
}

#[tracing::instrument(skip(state, multipart))]
pub async fn generate_from_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    generate_from_attachment(state, Modality::Audio, multipart).await
}

async fn generate_from_attachment(
    state: AppState,
    modality: Modality,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    // A body that is not multipart simply carries no file.
    let request = match multipart {
        Ok(multipart) => read_prompt_request(multipart, modality).await?,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Request body is not multipart");
            PromptRequest::default()
        }
    };

    let prompt = request
        .into_prompt(&state.persona, modality)
        .map_err(|missing| AppError::BadRequest(anyhow::anyhow!(missing.message)))?;

    let result = run_generation(&state, modality.field_name(), &prompt).await?;

    Ok(Json(GenerateResponse { result }))
}

/// Buffer the multipart body into a [`PromptRequest`].
///
/// Only a file under the modality's field name becomes the attachment; a
/// second file, or a file under any other name, is rejected.
async fn read_prompt_request(
    mut multipart: Multipart,
    modality: Modality,
) -> Result<PromptRequest, AppError> {
    let mut request = PromptRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        let is_file = field.file_name().is_some();

        if is_file {
            if name != modality.field_name() {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Unexpected file field '{}'. Send the file under '{}'",
                    name,
                    modality.field_name()
                )));
            }
            if request.attachment.is_some() {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Only one '{}' file is accepted per request",
                    name
                )));
            }

            let media_type = field
                .content_type()
                .unwrap_or(DEFAULT_MEDIA_TYPE)
                .to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?.to_vec();

            tracing::info!(
                field = %name,
                media_type = %media_type,
                size = bytes.len(),
                "Attachment received"
            );

            request.attachment = Some(Attachment::new(bytes, media_type));
        } else if name == PROMPT_FIELD {
            request.user_text = Some(field.text().await.map_err(multipart_error)?);
        } else {
            tracing::debug!(field = %name, "Ignoring unknown form field");
        }
    }

    Ok(request)
}

fn json_error(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(rejection.body_text())
    } else {
        AppError::BadRequest(anyhow::anyhow!(
            "Invalid JSON body: {}",
            rejection.body_text()
        ))
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(anyhow::anyhow!(
            "Failed to read multipart body: {}",
            e.body_text()
        ))
    }
}

/// Call the provider once and relay its text. The only await on the model.
async fn run_generation(
    state: &AppState,
    route: &'static str,
    prompt: &Prompt,
) -> Result<String, AppError> {
    let provider = state.provider.name();
    let model = state.provider.model().to_string();
    let start = Instant::now();

    let outcome = state.provider.generate(prompt).await;
    metrics::record_provider_latency(provider, &model, start.elapsed().as_secs_f64());

    match outcome {
        Ok(response) => {
            metrics::record_genai_request(route, &model, "success");
            metrics::record_tokens(&model, response.input_tokens, response.output_tokens);

            tracing::info!(
                route,
                model = %model,
                input_tokens = response.input_tokens,
                output_tokens = response.output_tokens,
                finish_reason = response.finish_reason.as_str(),
                "Generation completed"
            );

            Ok(response.text)
        }
        Err(e) => {
            let code = e.category().as_str();
            metrics::record_genai_request(route, &model, "error");
            metrics::record_provider_error(provider, code);

            tracing::error!(route, model = %model, code, error = %e, "Model call failed");

            Err(e.into())
        }
    }
}
