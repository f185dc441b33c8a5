use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{PreferenceUpdate, ServiceResponse, UserPreferenceSet},
    routes::{required, AppState},
    services::user_genres,
};

#[derive(Debug, Deserialize)]
pub struct UserGenresQuery {
    user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuery {
    id: String,
}

/// Handler for the annotated genre list of one user
pub async fn get_user_genres(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<UserGenresQuery>, QueryRejection>,
) -> AppResult<ServiceResponse> {
    let Query(params) = query.map_err(|e| AppError::validation(e.body_text()))?;
    let user_id = required("user_id", &params.user_id)?;

    tracing::info!(request_id = %request_id, user_id = %user_id, "Fetching user genres");

    user_genres::get_user_genres(state.downstream.as_ref(), &state.config, user_id).await
}

/// Handler relaying a preference update
///
/// The user adapter's JSON answer is returned as-is; an empty answer becomes
/// a success envelope without `data`.
pub async fn update_user_genres(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    query: Result<Query<UpdateQuery>, QueryRejection>,
    body: Result<Json<PreferenceUpdate>, JsonRejection>,
) -> AppResult<Response> {
    let Query(params) = query.map_err(|e| AppError::validation(e.body_text()))?;
    let Json(update) = body.map_err(|e| AppError::validation(e.body_text()))?;
    let user_id = required("id", &params.id)?;
    let preferences = UserPreferenceSet::from(update);

    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        count = preferences.preferences.len(),
        "Processing preference update"
    );

    let relayed = user_genres::update_user_genres(
        state.downstream.as_ref(),
        &state.config,
        user_id,
        preferences,
    )
    .await?;

    // bodiless 2xx answers still get an envelope
    if relayed.is_null() {
        return Ok(
            ServiceResponse::new(StatusCode::OK, "User preferences updated", None).into_response(),
        );
    }

    Ok((StatusCode::OK, Json(relayed)).into_response())
}
