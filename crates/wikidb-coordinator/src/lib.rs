//! The coordinator's two-phase commit driver: conflict guard, `tid`
//! allocation, and the parallel prepare/commit fan-out to every replica.

mod driver;
mod handlers;

pub use driver::CoordinatorState;

use std::sync::Arc;

use axum::routing::post;
use axum::Router;

/// Routes mounted only on the node configured as coordinator.
pub fn router(state: Arc<CoordinatorState>) -> Router {
    Router::new()
        .route("/request_user_commit", post(handlers::request_user_commit))
        .route("/request_page_commit", post(handlers::request_page_commit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;
    use wikidb_store::Store;

    fn build(replicas: Vec<String>) -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path()).unwrap());
        let state = Arc::new(CoordinatorState {
            store,
            replicas,
            client: reqwest::Client::new(),
            prepare_timeout: Duration::from_millis(200),
            commit_timeout: Duration::from_millis(200),
        });
        (dir, router(state))
    }

    #[tokio::test]
    async fn request_with_no_replicas_commits_trivially() {
        let (_dir, app) = build(vec![]);
        let req = Request::builder()
            .method("POST")
            .uri("/request_user_commit")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"alice","admin":true}"#))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn request_with_unreachable_replica_aborts_with_409() {
        // Nothing listens on this port; the prepare call fails immediately.
        let (_dir, app) = build(vec!["127.0.0.1:1".into()]);
        let req = Request::builder()
            .method("POST")
            .uri("/request_page_commit")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"page":"Home","content":"hi"}"#))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }
}
