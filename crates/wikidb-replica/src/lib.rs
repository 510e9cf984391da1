//! The replica side of the two-phase commit protocol: `CanCommit` and
//! `DoCommit` handlers, mounted on every node regardless of role.

mod handlers;

pub use handlers::ReplicaState;

use std::sync::Arc;

use axum::routing::post;
use axum::Router;

/// Routes mounted on every node: the coordinator is itself a replica for
/// fan-out purposes and must answer its own prepare/commit calls the same
/// way any other replica does.
pub fn router(state: Arc<ReplicaState>) -> Router {
    Router::new()
        .route("/can_user_commit", post(handlers::can_user_commit))
        .route("/can_page_commit", post(handlers::can_page_commit))
        .route("/do_commit", post(handlers::do_commit))
        .with_state(state)
}
