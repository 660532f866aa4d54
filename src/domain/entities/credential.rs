use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Page size used for every paginated key listing.
pub const PAGE_SIZE: u32 = 10;

/// Which paginated credential list an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Valid,
    Invalid,
}

impl ListKind {
    pub const ALL: [ListKind; 2] = [ListKind::Valid, ListKind::Invalid];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Valid => "valid",
            ListKind::Invalid => "invalid",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "valid" => Ok(ListKind::Valid),
            "invalid" => Ok(ListKind::Invalid),
            other => Err(format!("unknown list kind: {}", other)),
        }
    }
}

/// One managed API key and its failure counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialEntry {
    pub key: String,
    pub status: ListKind,
    pub failure_count: u64,
}

/// Parameters of one `GET /api/keys` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub kind: ListKind,
    /// 1-indexed
    pub page: u32,
    pub limit: u32,
    pub search: String,
}

impl PageRequest {
    pub fn new(kind: ListKind, page: u32, search: impl Into<String>) -> Self {
        Self {
            kind,
            page,
            limit: PAGE_SIZE,
            search: search.into(),
        }
    }
}

/// One page of credentials as returned by the Remote Key Service, in server order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPage {
    pub entries: Vec<CredentialEntry>,
    /// Raw value from the server; may be 0 for an empty collection.
    pub total_pages: u32,
}

/// A credential surfaced for operator attention because of a specific error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteworthyEntry {
    pub key: String,
    #[serde(default)]
    pub status: Option<ListKind>,
    #[serde(default, alias = "errorCode", alias = "status_code")]
    pub error_code: Option<u16>,
    #[serde(default, alias = "errorStatus")]
    pub error_status: Option<String>,
    #[serde(default, alias = "failureCount", alias = "count")]
    pub failure_count: u64,
}
