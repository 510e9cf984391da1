use serde::{Deserialize, Serialize};

/// The two record kinds a transaction can target.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    User,
    Page,
}

/// The payload carried by a single transaction, as a tagged variant keyed by
/// record kind rather than one row shape shared across both kinds.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    User { name: String, admin: bool },
    Page { name: String, content: String },
}

impl Payload {
    pub fn kind(&self) -> Kind {
        match self {
            Payload::User { .. } => Kind::User,
            Payload::Page { .. } => Kind::Page,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Payload::User { name, .. } => name,
            Payload::Page { name, .. } => name,
        }
    }
}

/// Status of a log entry. Coordinator entries use the full set; replica
/// entries only ever reach `Committed` or `Aborted` as a terminal state
/// (`Done` is coordinator-only).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Pending,
    Promised,
    Committed,
    Aborted,
    Done,
}

impl LogStatus {
    /// Entries in a terminal status no longer count as "open" against the
    /// conflict guard.
    pub fn is_open(self) -> bool {
        !matches!(self, LogStatus::Aborted | LogStatus::Done | LogStatus::Committed)
    }
}

/// A single transaction's log entry, as seen on whichever node stores it.
/// `tid` is allocated exclusively by the coordinator.
///
/// `payload` is `None` only for the stale-commit stub: a replica receiving
/// `DoCommit` for a `tid` it never prepared records an `Aborted` entry with
/// empty fields, and the `DoCommit` wire message carries no `kind`, so
/// there is nothing to type it as.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEntry {
    pub tid: u64,
    pub payload: Option<Payload>,
    pub status: LogStatus,
}

impl LogEntry {
    pub fn kind(&self) -> Option<Kind> {
        self.payload.as_ref().map(Payload::kind)
    }

    pub fn name(&self) -> Option<&str> {
        self.payload.as_ref().map(Payload::name)
    }

    pub fn stale_abort(tid: u64) -> Self {
        LogEntry {
            tid,
            payload: None,
            status: LogStatus::Aborted,
        }
    }
}

/// Status of a single (tid, replica) pair during a two-phase-commit round,
/// tracked only by the coordinator's pending table. Not on the correctness
/// critical path; it exists for operator/recovery inspection.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatus {
    Requested,
    Promised,
    Aborted,
    Started,
    Done,
}

/// One row of the coordinator-only pending table, keyed by (tid, replica).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingEntry {
    pub tid: u64,
    pub replica: String,
    pub status: PendingStatus,
}
