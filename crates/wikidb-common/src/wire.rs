//! JSON request/response bodies for the HTTP endpoints. Field names are
//! exact: the front-end and the inter-node fan-out client both depend on them.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RequestUserCommit {
    pub name: String,
    pub admin: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RequestPageCommit {
    pub page: String,
    pub content: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CanUserCommit {
    pub transaction_id: u64,
    pub name: String,
    pub admin: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CanPageCommit {
    pub transaction_id: u64,
    pub page: String,
    pub content: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CommitReply {
    pub transaction_id: u64,
    pub sender: String,
    pub commit: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DoCommit {
    pub transaction_id: u64,
    pub commit: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct HaveCommit {
    pub transaction_id: u64,
    pub sender: String,
    pub commit: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Coordinator,
    Replica,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: &'static str,
    pub role: Role,
}
