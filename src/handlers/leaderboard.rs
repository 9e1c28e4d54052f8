use axum::{
    extract::{Query, State},
    Json,
};

use crate::models::leaderboard::{LeaderboardQuery, LeaderboardResponse};
use crate::AppState;

/// GET /api/leaderboard
///
/// Users ranked by coins plus holdings value. Optional `limit` query parameter.
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<LeaderboardResponse> {
    Json(LeaderboardResponse {
        leaderboard: state.leaderboard.get_leaderboard(query.limit),
    })
}
