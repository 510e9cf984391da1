//! Embedded, crash-safe storage for a single wikidb node.
//!
//! [`Store`] owns one [`sled::Db`] per node and exposes the raw component
//! operations (`coordinator_log()`, `replica_log()`, `pending()`, `records()`)
//! alongside a handful of compound operations — allocate-and-conflict-check,
//! prepare, do-commit — that need to run as a single atomic step. Those
//! compound operations are serialized through an in-process lock rather than
//! a cross-tree sled transaction, since every caller lives in the same node
//! process.
//!
//! A node that is both coordinator and a replica (the configured `replicas`
//! list may name the coordinator itself, per §6) keeps *two* logs, not one:
//! the coordinator's bookkeeping of a transaction it is driving, and the
//! replica participant's record of a prepare/commit it was asked to vote on,
//! are distinct roles that happen to share a `tid`. A single log keyed by
//! `tid` would collide the two — the coordinator's own `CanCommit` to itself
//! would find its own just-allocated `pending` entry instead of voting fresh
//! — so each role gets its own tree.

mod log;
mod pending;
mod records;

pub use log::TransactionLog;
pub use pending::PendingTable;
pub use records::{Page, ReplicaStore, User};

use std::path::Path;

use tokio::sync::Mutex;
use tracing::error;

use wikidb_common::model::{LogEntry, LogStatus, Payload};
use wikidb_common::{Error, Result};

pub struct Store {
    db: sled::Db,
    coordinator_log: TransactionLog,
    replica_log: TransactionLog,
    pending: PendingTable,
    records: ReplicaStore,
    /// Serializes the compound operations below. See module docs.
    guard: Mutex<()>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let db = sled::Config::default()
            .path(path)
            .flush_every_ms(Some(50))
            .open()?;
        let coordinator_log = TransactionLog::new(db.open_tree("coordinator_log")?);
        let replica_log = TransactionLog::new(db.open_tree("replica_log")?);
        let pending = PendingTable::new(db.open_tree("pending")?);
        let records = ReplicaStore::new(db.open_tree("users")?, db.open_tree("pages")?);
        Ok(Self {
            db,
            coordinator_log,
            replica_log,
            pending,
            records,
            guard: Mutex::new(()),
        })
    }

    /// The coordinator's own bookkeeping of transactions it drives:
    /// `pending` → `promised` → `done`/`aborted`. Only ever touched by
    /// [`Store::allocate_coordinator_transaction`] and the coordinator's
    /// recovery scan.
    pub fn coordinator_log(&self) -> &TransactionLog {
        &self.coordinator_log
    }

    /// This node's replica-participant record of transactions it has been
    /// asked to vote on: `promised` → `committed`/`aborted`. Touched by
    /// [`Store::replica_prepare`] and [`Store::replica_do_commit`] — separate
    /// from `coordinator_log` so a node that fans out to itself doesn't
    /// collide its own coordinator bookkeeping with its own vote.
    pub fn replica_log(&self) -> &TransactionLog {
        &self.replica_log
    }

    pub fn pending(&self) -> &PendingTable {
        &self.pending
    }

    pub fn records(&self) -> &ReplicaStore {
        &self.records
    }

    /// The conflict-guard check and `tid` allocation run as one atomic step,
    /// so two concurrent requests for the same object can never both open a
    /// transaction.
    pub async fn allocate_coordinator_transaction(&self, payload: Payload) -> Result<u64> {
        let _guard = self.guard.lock().await;
        if self.coordinator_log.has_open(payload.kind(), payload.name())? {
            return Err(Error::Conflict);
        }
        let tid = self.db.generate_id()?;
        self.coordinator_log.insert(&LogEntry {
            tid,
            payload: Some(payload),
            status: LogStatus::Pending,
        })?;
        Ok(tid)
    }

    /// Handles an incoming `CanCommit`. Returns the vote.
    pub async fn replica_prepare(&self, tid: u64, payload: Payload) -> Result<bool> {
        let _guard = self.guard.lock().await;
        if let Some(entry) = self.replica_log.get(tid)? {
            return Ok(entry.status == LogStatus::Promised);
        }
        let entry = LogEntry {
            tid,
            payload: Some(payload),
            status: LogStatus::Promised,
        };
        // Fall back to a false vote rather than a 5xx if we can't durably
        // record the promise; the caller always gets a CommitReply.
        match self.replica_log.insert(&entry) {
            Ok(()) => Ok(true),
            Err(e) => {
                error!(tid, error = %e, "failed to durably record promise, voting false");
                Ok(false)
            }
        }
    }

    /// Handles an incoming `DoCommit`. Returns the ack.
    pub async fn replica_do_commit(&self, tid: u64, commit: bool) -> Result<bool> {
        let _guard = self.guard.lock().await;
        let Some(entry) = self.replica_log.get(tid)? else {
            self.replica_log.insert(&LogEntry::stale_abort(tid))?;
            return Ok(false);
        };

        if !commit {
            self.replica_log.update_status(tid, LogStatus::Aborted)?;
            return Ok(false);
        }

        match entry.status {
            LogStatus::Promised | LogStatus::Committed => {
                if let Some(payload) = &entry.payload {
                    match payload {
                        Payload::User { name, admin } => self.records.upsert_user(name, *admin)?,
                        Payload::Page { name, content } => self.records.upsert_page(name, content)?,
                    }
                }
                self.replica_log.update_status(tid, LogStatus::Committed)?;
                Ok(true)
            }
            // Asked to commit something we already aborted. Refuse without
            // applying.
            LogStatus::Aborted => Ok(false),
            LogStatus::Pending | LogStatus::Done => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikidb_common::model::Kind;

    fn open_temp() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn allocate_rejects_second_open_transaction_on_same_object() {
        let (_dir, store) = open_temp();
        let p1 = Payload::Page {
            name: "Home".into(),
            content: "a".into(),
        };
        let p2 = Payload::Page {
            name: "Home".into(),
            content: "b".into(),
        };
        let tid1 = store.allocate_coordinator_transaction(p1).await.unwrap();
        assert!(tid1 > 0 || tid1 == 0);
        let err = store.allocate_coordinator_transaction(p2).await.unwrap_err();
        assert!(matches!(err, Error::Conflict));
    }

    #[tokio::test]
    async fn allocate_allows_new_transaction_after_previous_closes() {
        let (_dir, store) = open_temp();
        let p1 = Payload::Page {
            name: "Home".into(),
            content: "a".into(),
        };
        let tid1 = store.allocate_coordinator_transaction(p1).await.unwrap();
        store.coordinator_log().update_status(tid1, LogStatus::Done).unwrap();

        let p2 = Payload::Page {
            name: "Home".into(),
            content: "b".into(),
        };
        let tid2 = store.allocate_coordinator_transaction(p2).await.unwrap();
        assert_ne!(tid1, tid2);
    }

    #[tokio::test]
    async fn prepare_is_idempotent_after_promise() {
        let (_dir, store) = open_temp();
        let payload = Payload::User {
            name: "alice".into(),
            admin: true,
        };
        let vote1 = store.replica_prepare(1, payload.clone()).await.unwrap();
        let vote2 = store.replica_prepare(1, payload).await.unwrap();
        assert!(vote1);
        assert!(vote2);
    }

    #[tokio::test]
    async fn do_commit_applies_store_and_marks_committed() {
        let (_dir, store) = open_temp();
        let payload = Payload::User {
            name: "alice".into(),
            admin: true,
        };
        store.replica_prepare(1, payload).await.unwrap();
        let ack = store.replica_do_commit(1, true).await.unwrap();
        assert!(ack);

        let user = store.records().get_user_by_name("alice").unwrap().unwrap();
        assert!(user.admin);
        let entry = store.replica_log().get(1).unwrap().unwrap();
        assert_eq!(entry.status, LogStatus::Committed);
    }

    #[tokio::test]
    async fn do_commit_is_idempotent_after_commit() {
        let (_dir, store) = open_temp();
        let payload = Payload::Page {
            name: "Home".into(),
            content: "hi".into(),
        };
        store.replica_prepare(2, payload).await.unwrap();
        assert!(store.replica_do_commit(2, true).await.unwrap());
        assert!(store.replica_do_commit(2, true).await.unwrap());

        let page = store.records().get_page("Home").unwrap().unwrap();
        assert_eq!(page.content, "hi");
    }

    #[tokio::test]
    async fn do_commit_false_aborts_without_applying() {
        let (_dir, store) = open_temp();
        let payload = Payload::Page {
            name: "Home".into(),
            content: "hi".into(),
        };
        store.replica_prepare(3, payload).await.unwrap();
        let ack = store.replica_do_commit(3, false).await.unwrap();
        assert!(!ack);
        assert!(store.records().get_page("Home").unwrap().is_none());
        let entry = store.replica_log().get(3).unwrap().unwrap();
        assert_eq!(entry.status, LogStatus::Aborted);
    }

    #[tokio::test]
    async fn do_commit_unknown_tid_creates_aborted_stub() {
        let (_dir, store) = open_temp();
        let ack = store.replica_do_commit(999, true).await.unwrap();
        assert!(!ack);
        let entry = store.replica_log().get(999).unwrap().unwrap();
        assert_eq!(entry.status, LogStatus::Aborted);
        assert!(entry.payload.is_none());
    }

    #[tokio::test]
    async fn has_open_respects_kind_and_terminal_statuses() {
        let (_dir, store) = open_temp();
        assert!(!store.coordinator_log().has_open(Kind::Page, "Home").unwrap());
        let tid = store
            .allocate_coordinator_transaction(Payload::Page {
                name: "Home".into(),
                content: "a".into(),
            })
            .await
            .unwrap();
        assert!(store.coordinator_log().has_open(Kind::Page, "Home").unwrap());
        store.coordinator_log().update_status(tid, LogStatus::Aborted).unwrap();
        assert!(!store.coordinator_log().has_open(Kind::Page, "Home").unwrap());
    }
}
