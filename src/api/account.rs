//! Account deletion and data export, both behind feature flags.

use axum::{
    Extension, Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::io::{Cursor, Write};
use std::sync::Arc;
use zip::write::SimpleFileOptions;

use super::auth::AuthedUser;
use super::{ApiError, ApiResponse, AppState, DeleteAccountResponse};
use crate::constants::takeout;
use crate::services::TakeoutData;

/// DELETE /account
/// Schedules irreversible deletion through the wipeout workflow.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthedUser>,
) -> Result<Json<ApiResponse<DeleteAccountResponse>>, ApiError> {
    if !state.config().read().await.features.enable_account_deletion {
        return Err(ApiError::page_not_found());
    }

    state.wipeout().schedule_deletion(&user.user_id).await?;

    Ok(Json(ApiResponse::success(DeleteAccountResponse {
        success: true,
    })))
}

/// GET /account/export
/// Streams back the caller's takeout bundle as a single zip archive. The
/// archive is assembled fully in memory before the response is written.
pub async fn export_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthedUser>,
) -> Result<Response, ApiError> {
    if !state.config().read().await.features.enable_account_export {
        return Err(ApiError::page_not_found());
    }

    let takeout_data = state.takeout().export(&user.user_id).await?;
    let archive = build_archive(&takeout_data)
        .map_err(|e| ApiError::internal(format!("Failed to build export archive: {e}")))?;

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", takeout::ARCHIVE_FILE_NAME),
        ),
    ];

    Ok((headers, archive).into_response())
}

/// One JSON entry plus one `images/` entry per decoded image.
fn build_archive(takeout_data: &TakeoutData) -> anyhow::Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut writer = zip::ZipWriter::new(&mut cursor);

    writer.start_file(takeout::DATA_FILE_NAME, options)?;
    writer.write_all(serde_json::to_string(&takeout_data.user_data)?.as_bytes())?;

    for image in &takeout_data.user_images {
        let decoded = decode_data_uri(&image.b64_image_data)?;
        writer.start_file(
            format!("{}{}", takeout::IMAGES_PREFIX, image.image_export_path),
            options,
        )?;
        writer.write_all(&decoded)?;
    }

    writer.finish()?;

    Ok(cursor.into_inner())
}

/// Strips the `data:<mime>;base64,` header and decodes the payload.
fn decode_data_uri(data_uri: &str) -> anyhow::Result<Vec<u8>> {
    let payload = data_uri.split_once(',').map_or(data_uri, |(_, rest)| rest);
    BASE64
        .decode(payload)
        .map_err(|e| anyhow::anyhow!("Invalid base64 image payload: {e}"))
}
