use axum::{extract::State, Json};

use crate::models::candidate::QualifiedCandidate;
use crate::state::AppState;

/// GET /getCandidates
pub async fn handle_get_candidates(State(state): State<AppState>) -> Json<Vec<QualifiedCandidate>> {
    Json(state.candidates.list().await)
}
