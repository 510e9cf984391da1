use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::instrument;

use wikidb_common::model::Payload;
use wikidb_common::wire::{RequestPageCommit, RequestUserCommit};

use crate::driver::CoordinatorState;

fn to_status(e: wikidb_common::Error) -> (StatusCode, String) {
    (e.status_code(), e.to_string())
}

#[instrument(skip(state))]
pub async fn request_user_commit(
    State(state): State<Arc<CoordinatorState>>,
    Json(body): Json<RequestUserCommit>,
) -> axum::response::Result<StatusCode> {
    let payload = Payload::User {
        name: body.name,
        admin: body.admin,
    };
    state.drive(payload).await.map_err(to_status)?;
    Ok(StatusCode::OK)
}

#[instrument(skip(state))]
pub async fn request_page_commit(
    State(state): State<Arc<CoordinatorState>>,
    Json(body): Json<RequestPageCommit>,
) -> axum::response::Result<StatusCode> {
    let payload = Payload::Page {
        name: body.page,
        content: body.content,
    };
    state.drive(payload).await.map_err(to_status)?;
    Ok(StatusCode::OK)
}
