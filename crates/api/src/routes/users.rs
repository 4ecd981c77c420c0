use axum::routing::get;
use axum::{Json, Router};
use slotwise_domain::UserProfile;

use super::AppState;
use crate::auth::CurrentUser;

pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}
