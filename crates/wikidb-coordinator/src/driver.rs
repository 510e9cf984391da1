use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{info, warn};

use wikidb_common::model::{LogStatus, Payload, PendingStatus};
use wikidb_common::wire::{CanPageCommit, CanUserCommit, CommitReply, DoCommit, HaveCommit};
use wikidb_common::{Error, Result};
use wikidb_store::Store;

pub struct CoordinatorState {
    pub store: Arc<Store>,
    pub replicas: Vec<String>,
    pub client: reqwest::Client,
    pub prepare_timeout: Duration,
    pub commit_timeout: Duration,
}

impl CoordinatorState {
    /// Runs one full two-phase-commit round for `payload` to completion and
    /// reports the terminal outcome. A `Conflict` returned here means no
    /// `tid` was ever allocated; any other error means a `tid` was allocated
    /// but the round aborted.
    pub async fn drive(&self, payload: Payload) -> Result<()> {
        let tid = self.store.allocate_coordinator_transaction(payload.clone()).await?;
        info!(tid, kind = ?payload.kind(), name = payload.name(), "opened transaction");

        for replica in &self.replicas {
            self.store
                .pending()
                .insert(tid, replica, PendingStatus::Requested)?;
        }

        let votes = join_all(
            self.replicas
                .iter()
                .map(|replica| self.send_prepare(tid, replica, &payload)),
        )
        .await;

        let all_yes = votes.iter().all(|v| *v);
        for (replica, vote) in self.replicas.iter().zip(votes.iter()) {
            let status = if *vote {
                PendingStatus::Promised
            } else {
                PendingStatus::Aborted
            };
            self.store.pending().update_status(tid, replica, status)?;
        }

        if all_yes {
            self.store.coordinator_log().update_status(tid, LogStatus::Promised)?;
            let _acks = join_all(
                self.replicas
                    .iter()
                    .map(|replica| self.send_commit(tid, replica, true)),
            )
            .await;
            for replica in &self.replicas {
                self.store
                    .pending()
                    .update_status(tid, replica, PendingStatus::Done)?;
            }
            self.store.coordinator_log().update_status(tid, LogStatus::Done)?;
            info!(tid, "committed");
            Ok(())
        } else {
            self.store.coordinator_log().update_status(tid, LogStatus::Aborted)?;
            let _acks = join_all(
                self.replicas
                    .iter()
                    .map(|replica| self.send_commit(tid, replica, false)),
            )
            .await;
            for replica in &self.replicas {
                self.store
                    .pending()
                    .update_status(tid, replica, PendingStatus::Done)?;
            }
            warn!(tid, "aborted: prepare phase did not reach unanimous agreement");
            Err(Error::PrepareNack)
        }
    }

    async fn send_prepare(&self, tid: u64, replica: &str, payload: &Payload) -> bool {
        let result = match payload {
            Payload::User { name, admin } => {
                let body = CanUserCommit {
                    transaction_id: tid,
                    name: name.clone(),
                    admin: *admin,
                };
                self.post::<_, CommitReply>(replica, "can_user_commit", &body, self.prepare_timeout)
                    .await
            }
            Payload::Page { name, content } => {
                let body = CanPageCommit {
                    transaction_id: tid,
                    page: name.clone(),
                    content: content.clone(),
                };
                self.post::<_, CommitReply>(replica, "can_page_commit", &body, self.prepare_timeout)
                    .await
            }
        };
        match result {
            Ok(reply) if reply.transaction_id == tid => reply.commit,
            Ok(_) => {
                warn!(tid, replica, "prepare reply carried a mismatched transaction id");
                false
            }
            Err(e) => {
                warn!(tid, replica, error = %e, "prepare request failed or timed out, treating as a no vote");
                false
            }
        }
    }

    async fn send_commit(&self, tid: u64, replica: &str, commit: bool) -> Option<HaveCommit> {
        let body = DoCommit {
            transaction_id: tid,
            commit,
        };
        match self
            .post::<_, HaveCommit>(replica, "do_commit", &body, self.commit_timeout)
            .await
        {
            Ok(reply) => Some(reply),
            Err(e) => {
                // Best-effort: the coordinator has already decided. A replica
                // that never acknowledges stays visible in the pending table.
                warn!(tid, replica, error = %e, "do_commit delivery failed");
                None
            }
        }
    }

    /// Re-drives every non-terminal coordinator log entry left over from a
    /// previous process. Runs once at startup, before the HTTP listener
    /// starts accepting new requests: `promised` entries get a fresh
    /// `DoCommit(true)` fan-out (the prepare phase already succeeded), and
    /// anything else (`pending`) is resolved by fanning out `DoCommit(false)`,
    /// since we can't know whether the prepare round finished.
    pub async fn recover(&self) -> Result<()> {
        let open = self.store.coordinator_log().scan_open()?;
        if open.is_empty() {
            return Ok(());
        }
        info!(count = open.len(), "resolving transactions left open by a previous run");
        for entry in open {
            let commit = entry.status == LogStatus::Promised;
            let next_status = if commit { LogStatus::Done } else { LogStatus::Aborted };
            let _acks = join_all(
                self.replicas
                    .iter()
                    .map(|replica| self.send_commit(entry.tid, replica, commit)),
            )
            .await;
            for replica in &self.replicas {
                self.store
                    .pending()
                    .update_status(entry.tid, replica, PendingStatus::Done)?;
            }
            self.store.coordinator_log().update_status(entry.tid, next_status)?;
        }
        Ok(())
    }

    async fn post<B: serde::Serialize, R: serde::de::DeserializeOwned>(
        &self,
        replica: &str,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> std::result::Result<R, reqwest::Error> {
        self.client
            .post(format!("http://{replica}/{path}"))
            .json(body)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<R>()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikidb_common::model::LogEntry;

    fn build(replicas: Vec<String>) -> (tempfile::TempDir, CoordinatorState) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path()).unwrap());
        let state = CoordinatorState {
            store,
            replicas,
            client: reqwest::Client::new(),
            prepare_timeout: Duration::from_millis(100),
            commit_timeout: Duration::from_millis(100),
        };
        (dir, state)
    }

    #[tokio::test]
    async fn recover_is_a_no_op_when_the_log_has_no_open_entries() {
        let (_dir, state) = build(vec![]);
        state.recover().await.unwrap();
    }

    #[tokio::test]
    async fn recover_resolves_a_promised_entry_to_done() {
        let (_dir, state) = build(vec!["127.0.0.1:1".into()]);
        state
            .store
            .coordinator_log()
            .insert(&LogEntry {
                tid: 1,
                payload: Some(Payload::User {
                    name: "alice".into(),
                    admin: true,
                }),
                status: LogStatus::Promised,
            })
            .unwrap();

        state.recover().await.unwrap();

        let entry = state.store.coordinator_log().get(1).unwrap().unwrap();
        assert_eq!(entry.status, LogStatus::Done);
    }

    #[tokio::test]
    async fn recover_resolves_a_pending_entry_to_aborted() {
        let (_dir, state) = build(vec!["127.0.0.1:1".into()]);
        state
            .store
            .coordinator_log()
            .insert(&LogEntry {
                tid: 2,
                payload: Some(Payload::Page {
                    name: "Home".into(),
                    content: "hi".into(),
                }),
                status: LogStatus::Pending,
            })
            .unwrap();

        state.recover().await.unwrap();

        let entry = state.store.coordinator_log().get(2).unwrap().unwrap();
        assert_eq!(entry.status, LogStatus::Aborted);
    }
}
