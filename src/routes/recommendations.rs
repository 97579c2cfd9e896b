use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult, middleware::request_id::RequestId, models::Recommendation,
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default)]
    pub q: String,
}

/// Handler for recommendations endpoint
///
/// A missing or blank query returns the trending picks.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let query = params.q.trim();

    tracing::info!(
        request_id = %request_id,
        query = %query,
        "Processing recommendation request"
    );

    let recommendations = if query.is_empty() {
        state.recommender.get_default_recs().await?
    } else {
        state.recommender.recommend_anime(query).await?
    };

    Ok(Json(recommendations))
}

/// Handler for the trending endpoint
pub async fn trending(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<Vec<Recommendation>>> {
    tracing::info!(request_id = %request_id, "Processing trending request");

    let recommendations = state.recommender.get_default_recs().await?;
    Ok(Json(recommendations))
}
