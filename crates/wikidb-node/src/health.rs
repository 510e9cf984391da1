use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use wikidb_common::wire::{Health, Role};

pub fn router(role: Role) -> Router {
    Router::new().route("/health", get(health)).with_state(role)
}

async fn health(State(role): State<Role>) -> Json<Health> {
    Json(Health { status: "ok", role })
}
