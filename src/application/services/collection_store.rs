use crate::application::services::sequencing::{FetchOutcome, RequestSequence, Ticket};
use crate::domain::entities::{CredentialEntry, KeyPage, ListKind, PageRequest};
use crate::domain::errors::ServiceResult;
use tokio_util::sync::CancellationToken;

/// One page of one credential list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatedView {
    pub kind: ListKind,
    pub entries: Vec<CredentialEntry>,
    /// 1-indexed, always within `1..=total_pages`
    pub page: u32,
    pub total_pages: u32,
    /// Debounced search term the entries were (or are being) fetched for
    pub search: String,
}

impl PaginatedView {
    fn new(kind: ListKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            page: 1,
            total_pages: 1,
            search: String::new(),
        }
    }

    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.page, self.total_pages)
    }
}

/// Client-side state of one paginated, searchable key list.
///
/// Holds no I/O: the orchestrator asks it for the next request, performs the
/// call, and hands the result back through [`apply`](Self::apply).
#[derive(Debug)]
pub struct PaginatedCollectionStore {
    view: PaginatedView,
    search_input: String,
    sequence: RequestSequence,
    loading: bool,
    loaded: bool,
    last_error: Option<String>,
}

impl PaginatedCollectionStore {
    pub fn new(kind: ListKind) -> Self {
        Self {
            view: PaginatedView::new(kind),
            search_input: String::new(),
            sequence: RequestSequence::new(),
            loading: false,
            loaded: false,
            last_error: None,
        }
    }

    pub fn kind(&self) -> ListKind {
        self.view.kind
    }

    pub fn view(&self) -> &PaginatedView {
        &self.view
    }

    /// Parameters the next fetch will use
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.view.kind, self.view.page, self.view.search.clone())
    }

    /// Raw text in the search box, possibly not yet debounced
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether any fetch has succeeded yet
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn visible_keys(&self) -> Vec<String> {
        self.view.entries.iter().map(|e| e.key.clone()).collect()
    }

    /// Move to page `n`, clamped into `1..=total_pages`.
    /// Returns true when the page actually changed.
    pub fn set_page(&mut self, n: u32) -> bool {
        let target = n.clamp(1, self.view.total_pages.max(1));
        if target == self.view.page {
            return false;
        }
        self.view.page = target;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.view.page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> bool {
        self.set_page(self.view.page.saturating_sub(1))
    }

    pub fn set_search_input(&mut self, raw: &str) {
        self.search_input = raw.to_string();
    }

    /// Adopt a debounced search term. A new term always restarts at page 1.
    /// Returns true when the term changed.
    pub fn apply_search(&mut self, term: &str) -> bool {
        if term == self.view.search {
            return false;
        }
        self.view.search = term.to_string();
        self.view.page = 1;
        true
    }

    /// Issue a fetch for the current parameters, superseding any in flight
    pub fn begin_fetch(&mut self, parent: &CancellationToken) -> (Ticket, PageRequest) {
        let ticket = self.sequence.issue(parent);
        self.loading = true;
        (ticket, self.request())
    }

    /// Apply the response to request `seq`.
    ///
    /// Stale responses are dropped. Failures keep the current entries. When
    /// the server reports fewer pages than the current page, the page is
    /// clamped to the last one and [`FetchOutcome::Clamped`] asks for a refetch.
    pub fn apply(&mut self, seq: u64, result: ServiceResult<KeyPage>) -> FetchOutcome {
        if !self.sequence.complete(seq) {
            return FetchOutcome::Stale;
        }
        self.loading = false;

        match result {
            Ok(page) => {
                self.view.entries = page.entries;
                self.view.total_pages = page.total_pages.max(1);
                self.loaded = true;
                self.last_error = None;

                if self.view.page > self.view.total_pages {
                    self.view.page = self.view.total_pages;
                    FetchOutcome::Clamped {
                        page: self.view.page,
                    }
                } else {
                    FetchOutcome::Applied
                }
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Abandon the in-flight fetch, if any
    pub fn cancel(&mut self) {
        self.sequence.cancel();
        self.loading = false;
    }
}
