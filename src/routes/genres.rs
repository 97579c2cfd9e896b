use axum::{extract::State, Json};
use std::sync::Arc;

use crate::routes::AppState;

/// Lists every genre name the parser recognizes, alphabetically
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.recommender.genres().names())
}
