use serde_json::{json, Value};

use crate::{
    config::Config,
    error::AppResult,
    models::{Genre, ServiceResponse, UserPreferenceSet},
    services::downstream::{require, Downstream, ServiceError},
};

const GENRES_UNAVAILABLE: &str = "GENRE DATABASE service unavailable";
const USERS_UNAVAILABLE: &str = "USER DATABASE service unavailable";

/// Genre catalogue annotated with the user's preferences
///
/// Both lookups run concurrently. The catalogue is checked first, so when
/// both fail the response names the genre database.
pub async fn get_user_genres(
    downstream: &dyn Downstream,
    config: &Config,
    user_id: &str,
) -> AppResult<ServiceResponse> {
    let (genres, user) = tokio::join!(
        fetch_catalogue(downstream, config),
        fetch_preferences(downstream, config, user_id),
    );

    let catalogue = match genres {
        Ok(catalogue) => catalogue,
        Err(e) => return Ok(dependency_failure(e, GENRES_UNAVAILABLE)),
    };
    let preferences = match user {
        Ok(preferences) => preferences,
        Err(e) => return Ok(dependency_failure(e, USERS_UNAVAILABLE)),
    };

    tracing::info!(
        user_id = %user_id,
        genres = catalogue.len(),
        preferred = preferences.preferences.len(),
        "Merged user genre preferences"
    );

    let user_genres = preferences.annotate(catalogue);
    Ok(ServiceResponse::ok(
        "Genres and user preferences retrieved successfully",
        json!({ "user_genres": serde_json::to_value(&user_genres)? }),
    ))
}

/// Relays a preference update to the user adapter
///
/// The adapter's answer is returned untouched; genre ids are not checked
/// against the catalogue.
pub async fn update_user_genres(
    downstream: &dyn Downstream,
    config: &Config,
    user_id: &str,
    preferences: UserPreferenceSet,
) -> Result<Value, ServiceError> {
    tracing::info!(
        user_id = %user_id,
        preferences = ?preferences.preferences,
        "Updating user genre preferences"
    );

    downstream
        .put(
            &config.user_url,
            vec![("id", user_id.to_string())],
            serde_json::to_value(&preferences)
                .map_err(|e| ServiceError::Malformed(e.to_string()))?,
        )
        .await
}

pub async fn fetch_catalogue(
    downstream: &dyn Downstream,
    config: &Config,
) -> Result<Vec<Genre>, ServiceError> {
    let payload = downstream.get(&config.genres_url, vec![]).await?;
    let genres = require(&payload, "/data/genres")?;
    serde_json::from_value(genres.clone()).map_err(|e| ServiceError::Malformed(e.to_string()))
}

pub async fn fetch_preferences(
    downstream: &dyn Downstream,
    config: &Config,
    user_id: &str,
) -> Result<UserPreferenceSet, ServiceError> {
    let payload = downstream
        .get(&config.user_url, vec![("id", user_id.to_string())])
        .await?;
    let preferences = require(&payload, "/data/preferences")?;
    serde_json::from_value(preferences.clone())
        .map(UserPreferenceSet::new)
        .map_err(|e| ServiceError::Malformed(e.to_string()))
}

fn dependency_failure(error: ServiceError, unavailable_message: &str) -> ServiceResponse {
    match error {
        ServiceError::Reported { .. } => error.to_response(),
        other => {
            tracing::error!(
                error = %other,
                dependency = unavailable_message,
                "User genre dependency failed"
            );
            ServiceResponse::unavailable(unavailable_message)
        }
    }
}
