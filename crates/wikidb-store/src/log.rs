use wikidb_common::model::{Kind, LogEntry, LogStatus};
use wikidb_common::Result;

/// The durable transaction log: one entry per transaction this node has
/// ever seen, keyed by `tid`.
///
/// Exposes the raw keyed operations — `insert`, `update_status`, `get`,
/// `has`, and the `has_open` conflict-guard predicate. Atomicity across
/// *compound* operations (allocate-then-insert, check-then-apply) is the
/// caller's responsibility — see [`crate::Store`], which holds the lock
/// that makes those compound operations serializable.
pub struct TransactionLog {
    tree: sled::Tree,
}

impl TransactionLog {
    pub(crate) fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    pub fn has(&self, tid: u64) -> Result<bool> {
        Ok(self.tree.contains_key(tid.to_be_bytes())?)
    }

    pub fn get(&self, tid: u64) -> Result<Option<LogEntry>> {
        match self.tree.get(tid.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn insert(&self, entry: &LogEntry) -> Result<()> {
        let bytes = serde_json::to_vec(entry)?;
        self.tree.insert(entry.tid.to_be_bytes(), bytes)?;
        self.tree.flush()?;
        Ok(())
    }

    pub fn update_status(&self, tid: u64, status: LogStatus) -> Result<()> {
        if let Some(mut entry) = self.get(tid)? {
            entry.status = status;
            self.insert(&entry)?;
        }
        Ok(())
    }

    /// True iff some entry targets (kind, name) with a non-terminal status.
    /// Callers use this to refuse opening a second transaction on an object
    /// that already has one in flight.
    pub fn has_open(&self, kind: Kind, name: &str) -> Result<bool> {
        for item in self.tree.iter() {
            let (_, bytes) = item?;
            let entry: LogEntry = serde_json::from_slice(&bytes)?;
            if entry.status.is_open() && entry.kind() == Some(kind) && entry.name() == Some(name) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Entries in a non-terminal status, used by the startup recovery scan
    /// and by the operator-inspection surface.
    pub fn scan_open(&self) -> Result<Vec<LogEntry>> {
        let mut open = Vec::new();
        for item in self.tree.iter() {
            let (_, bytes) = item?;
            let entry: LogEntry = serde_json::from_slice(&bytes)?;
            if entry.status.is_open() {
                open.push(entry);
            }
        }
        Ok(open)
    }
}
