use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use indexmap::IndexMap;
use tracing::debug;

use super::AppState;
use super::error::ServerError;
use super::types::{
    ErrorBody, HealthResponse, MixRequest, MixResponse, MixResult, TextureResponse,
};
use crate::generation::{GenerationError, apply_transitions};
use crate::metadata::TextureMetadata;
use crate::texture::encode_png_base64;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let classes = state.generator.metadata().num_classes;
    if state.generator.is_alive() {
        (StatusCode::OK, Json(HealthResponse { status: "ok", classes }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unavailable",
                classes,
            }),
        )
    }
}

pub async fn classes(State(state): State<AppState>) -> Json<TextureMetadata> {
    Json(state.generator.metadata().clone())
}

/// Every class plus the configured transitions, as base64 PNGs.
pub async fn generate_all(
    State(state): State<AppState>,
) -> Result<Json<IndexMap<String, String>>, ServerError> {
    let mut images = state.generator.generate_all().await.map_err(internal)?;
    apply_transitions(&mut images, &state.transitions)?;

    let encoded = images
        .iter()
        .map(|(name, image)| Ok((name.clone(), encode_png_base64(image)?)))
        .collect::<anyhow::Result<IndexMap<_, _>>>()?;
    debug!(textures = encoded.len(), "generated texture set");
    Ok(Json(encoded))
}

pub async fn generate_one(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<TextureResponse>, ServerError> {
    let response = match state.generator.generate(&name).await {
        Ok(image) => TextureResponse::Texture(encode_png_base64(&image)?),
        Err(GenerationError::UnknownTexture(_)) => {
            TextureResponse::Error(ErrorBody::unknown_texture())
        }
        Err(GenerationError::Internal(err)) => return Err(err.into()),
    };
    Ok(Json(response))
}

pub async fn mix(
    State(state): State<AppState>,
    payload: Result<Json<MixRequest>, JsonRejection>,
) -> Result<Json<MixResponse>, ServerError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return Ok(Json(MixResponse::Error(ErrorBody::new(
                rejection.body_text(),
            ))));
        }
    };

    let (Some(first), Some(second)) = (request.texture1, request.texture2) else {
        return Ok(Json(MixResponse::Error(ErrorBody::unknown_texture())));
    };
    let ratio = request
        .ratio
        .unwrap_or(state.default_mix_ratio)
        .clamp(0.0, 1.0);

    let image = match state.generator.mix(&first, &second, ratio).await {
        Ok(image) => image,
        Err(GenerationError::UnknownTexture(_)) => {
            return Ok(Json(MixResponse::Error(ErrorBody::unknown_texture())));
        }
        Err(GenerationError::Internal(err)) => return Err(err.into()),
    };

    Ok(Json(MixResponse::Mixed(MixResult {
        texture: encode_png_base64(&image)?,
        texture1: first,
        texture2: second,
        ratio,
        result_name: request.result_name,
    })))
}

fn internal(err: GenerationError) -> ServerError {
    match err {
        GenerationError::Internal(err) => ServerError::Internal(err),
        other => ServerError::Internal(other.into()),
    }
}
