use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, ProfileDto, ProfilePictureDto};

/// GET /profile/{username}
/// Publicly viewable profile data.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<ProfileDto>>, ApiError> {
    let settings = state
        .store()
        .get_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::user_not_found(&username))?;

    Ok(Json(ApiResponse::success(ProfileDto {
        username,
        user_bio: settings.user_bio,
        subject_interests: settings.subject_interests,
        profile_picture_data_url: settings.profile_picture_data_url,
        name: settings.name,
        surname: settings.surname,
    })))
}

/// GET /profile/{username}/picture
/// Profile picture data URI for any user, or none if not uploaded.
pub async fn get_profile_picture_by_username(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<ProfilePictureDto>>, ApiError> {
    let settings = state
        .store()
        .get_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::user_not_found(&username))?;

    Ok(Json(ApiResponse::success(ProfilePictureDto {
        profile_picture_data_url: settings.profile_picture_data_url,
    })))
}
