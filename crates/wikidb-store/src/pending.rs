use wikidb_common::model::{PendingEntry, PendingStatus};
use wikidb_common::Result;

/// The coordinator-only pending table, tracking fan-out progress per replica.
///
/// Keyed by `(tid, replica)`. Exists purely so an operator or recovery
/// routine can see where a round stalled; nothing here is on the
/// correctness-critical path of the protocol.
pub struct PendingTable {
    tree: sled::Tree,
}

fn key(tid: u64, replica: &str) -> Vec<u8> {
    let mut k = tid.to_be_bytes().to_vec();
    k.push(b':');
    k.extend_from_slice(replica.as_bytes());
    k
}

impl PendingTable {
    pub(crate) fn new(tree: sled::Tree) -> Self {
        Self { tree }
    }

    pub fn insert(&self, tid: u64, replica: &str, status: PendingStatus) -> Result<()> {
        let entry = PendingEntry {
            tid,
            replica: replica.to_owned(),
            status,
        };
        self.tree.insert(key(tid, replica), serde_json::to_vec(&entry)?)?;
        Ok(())
    }

    pub fn update_status(&self, tid: u64, replica: &str, status: PendingStatus) -> Result<()> {
        self.insert(tid, replica, status)
    }

    pub fn remove_all(&self, tid: u64) -> Result<()> {
        let prefix = {
            let mut p = tid.to_be_bytes().to_vec();
            p.push(b':');
            p
        };
        for item in self.tree.scan_prefix(prefix) {
            let (key, _) = item?;
            self.tree.remove(key)?;
        }
        Ok(())
    }

    /// All rows for `tid`, for operator inspection of a stalled round.
    pub fn rows_for(&self, tid: u64) -> Result<Vec<PendingEntry>> {
        let prefix = {
            let mut p = tid.to_be_bytes().to_vec();
            p.push(b':');
            p
        };
        let mut rows = Vec::new();
        for item in self.tree.scan_prefix(prefix) {
            let (_, bytes) = item?;
            rows.push(serde_json::from_slice(&bytes)?);
        }
        Ok(rows)
    }

    /// A full snapshot of the table, for the operator-inspection surface.
    pub fn snapshot(&self) -> Result<Vec<PendingEntry>> {
        let mut rows = Vec::new();
        for item in self.tree.iter() {
            let (_, bytes) = item?;
            rows.push(serde_json::from_slice(&bytes)?);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> (tempfile::TempDir, PendingTable) {
        let dir = tempfile::tempdir().unwrap();
        let db = sled::Config::default().path(dir.path()).open().unwrap();
        let table = PendingTable::new(db.open_tree("pending").unwrap());
        (dir, table)
    }

    #[test]
    fn rows_for_only_returns_the_requested_tid() {
        let (_dir, table) = open();
        table.insert(1, "r1", PendingStatus::Requested).unwrap();
        table.insert(1, "r2", PendingStatus::Requested).unwrap();
        table.insert(2, "r1", PendingStatus::Requested).unwrap();

        let rows = table.rows_for(1).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.tid == 1));
    }

    #[test]
    fn update_status_overwrites_the_row_in_place() {
        let (_dir, table) = open();
        table.insert(1, "r1", PendingStatus::Requested).unwrap();
        table.update_status(1, "r1", PendingStatus::Promised).unwrap();

        let rows = table.rows_for(1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, PendingStatus::Promised);
    }

    #[test]
    fn remove_all_clears_every_replica_row_for_a_tid_but_not_others() {
        let (_dir, table) = open();
        table.insert(1, "r1", PendingStatus::Requested).unwrap();
        table.insert(1, "r2", PendingStatus::Requested).unwrap();
        table.insert(2, "r1", PendingStatus::Requested).unwrap();

        table.remove_all(1).unwrap();

        assert!(table.rows_for(1).unwrap().is_empty());
        assert_eq!(table.rows_for(2).unwrap().len(), 1);
    }

    #[test]
    fn snapshot_returns_every_row_across_all_transactions() {
        let (_dir, table) = open();
        table.insert(1, "r1", PendingStatus::Requested).unwrap();
        table.insert(2, "r1", PendingStatus::Done).unwrap();

        assert_eq!(table.snapshot().unwrap().len(), 2);
    }
}
