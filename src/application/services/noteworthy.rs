use crate::application::services::sequencing::{FetchOutcome, RequestSequence, Ticket};
use crate::domain::entities::NoteworthyEntry;
use crate::domain::errors::ServiceResult;
use tokio_util::sync::CancellationToken;

/// Status codes offered as one-click filters
pub const PRESET_STATUS_CODES: [u16; 3] = [429, 403, 400];

/// Keys recently associated with one error status. Not paginated; the
/// service applies `limit`.
#[derive(Debug)]
pub struct NoteworthyList {
    entries: Vec<NoteworthyEntry>,
    status_code: u16,
    limit: u32,
    sequence: RequestSequence,
    loaded: bool,
    last_error: Option<String>,
}

impl NoteworthyList {
    pub fn new(status_code: u16, limit: u32) -> Self {
        Self {
            entries: Vec::new(),
            status_code,
            limit,
            sequence: RequestSequence::new(),
            loaded: false,
            last_error: None,
        }
    }

    pub fn entries(&self) -> &[NoteworthyEntry] {
        &self.entries
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns true when the filter changed
    pub fn set_status_code(&mut self, status_code: u16) -> bool {
        if status_code == self.status_code {
            return false;
        }
        self.status_code = status_code;
        true
    }

    pub fn begin_fetch(&mut self, parent: &CancellationToken) -> (Ticket, u16, u32) {
        (self.sequence.issue(parent), self.status_code, self.limit)
    }

    pub fn apply(
        &mut self,
        seq: u64,
        status_code: u16,
        result: ServiceResult<Vec<NoteworthyEntry>>,
    ) -> FetchOutcome {
        if !self.sequence.complete(seq) || status_code != self.status_code {
            return FetchOutcome::Stale;
        }
        match result {
            Ok(entries) => {
                self.entries = entries;
                self.loaded = true;
                self.last_error = None;
                FetchOutcome::Applied
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Drop a deleted key ahead of the next fetch
    pub fn forget(&mut self, key: &str) {
        self.entries.retain(|entry| entry.key != key);
    }

    pub fn cancel(&mut self) {
        self.sequence.cancel();
    }
}
