use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use tracing::instrument;

use wikidb_common::model::Payload;
use wikidb_common::wire::{CanPageCommit, CanUserCommit, CommitReply, DoCommit, HaveCommit};
use wikidb_store::Store;

pub struct ReplicaState {
    pub store: Arc<Store>,
    pub sender: String,
}

fn to_status(e: wikidb_common::Error) -> (http::StatusCode, String) {
    (e.status_code(), e.to_string())
}

#[instrument(skip(state))]
pub async fn can_user_commit(
    State(state): State<Arc<ReplicaState>>,
    Json(body): Json<CanUserCommit>,
) -> axum::response::Result<Json<CommitReply>> {
    let payload = Payload::User {
        name: body.name,
        admin: body.admin,
    };
    let vote = state
        .store
        .replica_prepare(body.transaction_id, payload)
        .await
        .map_err(to_status)?;
    Ok(Json(CommitReply {
        transaction_id: body.transaction_id,
        sender: state.sender.clone(),
        commit: vote,
    }))
}

#[instrument(skip(state))]
pub async fn can_page_commit(
    State(state): State<Arc<ReplicaState>>,
    Json(body): Json<CanPageCommit>,
) -> axum::response::Result<Json<CommitReply>> {
    let payload = Payload::Page {
        name: body.page,
        content: body.content,
    };
    let vote = state
        .store
        .replica_prepare(body.transaction_id, payload)
        .await
        .map_err(to_status)?;
    Ok(Json(CommitReply {
        transaction_id: body.transaction_id,
        sender: state.sender.clone(),
        commit: vote,
    }))
}

#[instrument(skip(state))]
pub async fn do_commit(
    State(state): State<Arc<ReplicaState>>,
    Json(body): Json<DoCommit>,
) -> axum::response::Result<Json<HaveCommit>> {
    let ack = state
        .store
        .replica_do_commit(body.transaction_id, body.commit)
        .await
        .map_err(to_status)?;
    Ok(Json(HaveCommit {
        transaction_id: body.transaction_id,
        sender: state.sender.clone(),
        commit: ack,
    }))
}
