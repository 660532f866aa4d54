use crate::application::services::debounce::{Debouncer, SettleFn};
use crate::application::services::mutation_coordinator::{mask, MutationCoordinator, SyncTarget};
use crate::application::services::sequencing::{run_bounded, with_timeout, Completion, FetchOutcome};
use crate::application::services::{
    NoteworthyList, PaginatedCollectionStore, SelectAllScope, SelectionTracker, StatsAggregator,
};
use crate::application::snapshot::{
    DashboardSnapshot, KeyCounts, KeyRow, ListSnapshot, NavSelection, NoteworthySnapshot,
    TrendSnapshot,
};
use crate::domain::entities::{KeyPage, ListKind, PageRequest, StatsPeriod, TimeRange};
use crate::domain::errors::{MutationResult, ServiceResult};
use crate::domain::ports::clipboard::Clipboard;
use crate::domain::ports::key_service::KeyService;
use crate::domain::ports::navigator::{NavTarget, Navigator};
use crate::domain::ports::task_spawner::TaskSpawner;
use crate::domain::ports::time_service::TimeService;
use futures::FutureExt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Tunables of the dashboard core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSettings {
    pub search_debounce: Duration,
    pub request_timeout: Duration,
    pub noteworthy_status_code: u16,
    pub noteworthy_limit: u32,
    /// Periodic full refresh; `None` disables it
    pub auto_refresh: Option<Duration>,
    pub trend_range: TimeRange,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
            noteworthy_status_code: 429,
            noteworthy_limit: 10,
            auto_refresh: None,
            trend_range: TimeRange::default(),
        }
    }
}

/// Collaborators the dashboard talks to
#[derive(Clone)]
pub struct DashboardPorts {
    pub service: Arc<dyn KeyService>,
    pub clipboard: Arc<dyn Clipboard>,
    pub navigator: Arc<dyn Navigator>,
    pub time: Arc<dyn TimeService>,
    pub spawner: Arc<dyn TaskSpawner>,
}

struct DashboardState {
    nav: NavSelection,
    valid: PaginatedCollectionStore,
    invalid: PaginatedCollectionStore,
    valid_selection: SelectionTracker,
    invalid_selection: SelectionTracker,
    stats: StatsAggregator,
    noteworthy: NoteworthyList,
    refresh_cycles: u64,
    mounted: bool,
    shut_down: bool,
    notice: Option<String>,
}

impl DashboardState {
    fn new(settings: &DashboardSettings) -> Self {
        Self {
            nav: NavSelection::Dashboard,
            valid: PaginatedCollectionStore::new(ListKind::Valid),
            invalid: PaginatedCollectionStore::new(ListKind::Invalid),
            valid_selection: SelectionTracker::new(),
            invalid_selection: SelectionTracker::new(),
            stats: StatsAggregator::new(settings.trend_range),
            noteworthy: NoteworthyList::new(settings.noteworthy_status_code, settings.noteworthy_limit),
            refresh_cycles: 0,
            mounted: false,
            shut_down: false,
            notice: None,
        }
    }

    fn store(&self, kind: ListKind) -> &PaginatedCollectionStore {
        match kind {
            ListKind::Valid => &self.valid,
            ListKind::Invalid => &self.invalid,
        }
    }

    fn store_mut(&mut self, kind: ListKind) -> &mut PaginatedCollectionStore {
        match kind {
            ListKind::Valid => &mut self.valid,
            ListKind::Invalid => &mut self.invalid,
        }
    }

    fn selection(&self, kind: ListKind) -> &SelectionTracker {
        match kind {
            ListKind::Valid => &self.valid_selection,
            ListKind::Invalid => &self.invalid_selection,
        }
    }

    fn selection_mut(&mut self, kind: ListKind) -> &mut SelectionTracker {
        match kind {
            ListKind::Valid => &mut self.valid_selection,
            ListKind::Invalid => &mut self.invalid_selection,
        }
    }

    /// Whether the state machine still accepts input
    fn active(&self) -> bool {
        !self.shut_down && self.nav == NavSelection::Dashboard
    }

    fn list_snapshot(&self, kind: ListKind) -> ListSnapshot {
        let store = self.store(kind);
        let selection = self.selection(kind);
        let view = store.view();
        let visible = store.visible_keys();

        ListSnapshot {
            kind,
            rows: view
                .entries
                .iter()
                .map(|entry| KeyRow {
                    key: entry.key.clone(),
                    failure_count: entry.failure_count,
                    selected: selection.is_selected(&entry.key),
                })
                .collect(),
            page: view.page,
            total_pages: view.total_pages,
            search_input: store.search_input().to_string(),
            search: view.search.clone(),
            loading: store.is_loading(),
            loaded: store.is_loaded(),
            error: store.last_error().map(str::to_string),
            selected_count: selection.len(),
            all_visible_selected: selection.all_selected(&visible),
        }
    }
}

struct DashboardInner {
    ports: DashboardPorts,
    settings: DashboardSettings,
    mutations: MutationCoordinator,
    state: Mutex<DashboardState>,
    valid_search: Debouncer<String>,
    invalid_search: Debouncer<String>,
    /// Root of every fetch and timer token
    shutdown: CancellationToken,
    revision: watch::Sender<u64>,
    inflight: watch::Sender<usize>,
}

/// Orchestrates the stores of the key dashboard.
///
/// Cheap to clone; all clones drive the same state. Every change bumps a
/// revision counter observable through [`subscribe`](Dashboard::subscribe).
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

impl Dashboard {
    pub fn new(ports: DashboardPorts, settings: DashboardSettings) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<DashboardInner>| {
            let mutations = MutationCoordinator::new(
                Arc::clone(&ports.service),
                Arc::clone(&ports.clipboard),
                Arc::clone(&ports.time),
                settings.request_timeout,
            );
            let valid_search = search_debouncer(weak, ListKind::Valid, &ports, settings.search_debounce);
            let invalid_search = search_debouncer(weak, ListKind::Invalid, &ports, settings.search_debounce);
            let (revision, _) = watch::channel(0);
            let (inflight, _) = watch::channel(0);

            DashboardInner {
                state: Mutex::new(DashboardState::new(&settings)),
                ports,
                settings,
                mutations,
                valid_search,
                invalid_search,
                shutdown: CancellationToken::new(),
                revision,
                inflight,
            }
        });

        Self { inner }
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.inner.settings
    }

    fn state(&self) -> MutexGuard<'_, DashboardState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn debouncer(&self, kind: ListKind) -> &Debouncer<String> {
        match kind {
            ListKind::Valid => &self.inner.valid_search,
            ListKind::Invalid => &self.inner.invalid_search,
        }
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|revision| *revision += 1);
    }

    /// Receiver that changes whenever the snapshot may have changed
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Wait until no fetch spawned by the dashboard is still running
    pub async fn settled(&self) {
        let mut inflight = self.inner.inflight.subscribe();
        let _ = inflight.wait_for(|count| *count == 0).await;
    }

    fn spawn_tracked<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.inflight.send_modify(|count| *count += 1);
        let this = self.clone();
        self.inner.ports.spawner.spawn(
            async move {
                future.await;
                this.inner
                    .inflight
                    .send_modify(|count| *count = count.saturating_sub(1));
            }
            .boxed(),
        );
    }

    /// First render: composite refresh, the trend series and the optional
    /// auto refresh timer. Later calls do nothing.
    pub fn mount(&self) {
        {
            let mut state = self.state();
            if state.mounted || !state.active() {
                return;
            }
            state.mounted = true;
        }
        info!("Mounting key dashboard");
        self.refresh_all();
        self.fetch_trend();
        if let Some(period) = self.inner.settings.auto_refresh {
            self.start_auto_refresh(period);
        }
    }

    /// Operator-triggered refresh of everything, trend included
    pub fn refresh(&self) {
        info!("Manual refresh requested");
        self.refresh_all();
        self.fetch_trend();
    }

    /// Composite refresh: both lists, the stats snapshot and the noteworthy
    /// list, issued independently.
    pub fn refresh_all(&self) {
        {
            let mut state = self.state();
            if !state.active() {
                return;
            }
            state.refresh_cycles += 1;
            debug!("Starting refresh cycle {}", state.refresh_cycles);
        }
        for kind in ListKind::ALL {
            self.fetch_list(kind);
        }
        self.fetch_stats();
        self.fetch_noteworthy();
    }

    fn start_auto_refresh(&self, period: Duration) {
        let weak = Arc::downgrade(&self.inner);
        let token = self.inner.shutdown.child_token();
        let time = Arc::clone(&self.inner.ports.time);
        info!("Auto refresh every {:?}", period);

        self.inner.ports.spawner.spawn(
            async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = time.sleep(period) => {}
                    }
                    match weak.upgrade() {
                        Some(inner) => Dashboard { inner }.refresh_all(),
                        None => break,
                    }
                }
                debug!("Auto refresh stopped");
            }
            .boxed(),
        );
    }

    fn fetch_list(&self, kind: ListKind) {
        let (ticket, request) = {
            let mut state = self.state();
            if !state.active() {
                return;
            }
            state.store_mut(kind).begin_fetch(&self.inner.shutdown)
        };
        self.bump();
        debug!(
            "Fetching {} keys page {} search {:?} (seq {})",
            kind, request.page, request.search, ticket.seq
        );

        let this = self.clone();
        self.spawn_tracked(async move {
            let service = Arc::clone(&this.inner.ports.service);
            let completion = run_bounded(
                this.inner.ports.time.as_ref(),
                this.inner.settings.request_timeout,
                &ticket.token,
                service.list_keys(&request),
            )
            .await;

            match completion {
                Completion::Done(result) => this.apply_list(kind, ticket.seq, result),
                Completion::Cancelled => debug!("Fetch of {} keys (seq {}) cancelled", kind, ticket.seq),
            }
        });
    }

    fn apply_list(&self, kind: ListKind, seq: u64, result: ServiceResult<KeyPage>) {
        let outcome = {
            let mut state = self.state();
            if state.shut_down {
                return;
            }
            let outcome = state.store_mut(kind).apply(seq, result);
            if matches!(outcome, FetchOutcome::Applied | FetchOutcome::Clamped { .. }) {
                let visible = state.store(kind).visible_keys();
                state.selection_mut(kind).observe(visible);
            }
            outcome
        };

        match outcome {
            FetchOutcome::Applied => {}
            FetchOutcome::Stale => debug!("Discarded stale {} keys response (seq {})", kind, seq),
            FetchOutcome::Clamped { page } => {
                info!("{} keys shrank, moving to page {}", kind, page);
                self.fetch_list(kind);
            }
            FetchOutcome::Failed(err) => warn!("Failed to load {} keys: {}", kind, err),
        }
        self.bump();
    }

    fn fetch_stats(&self) {
        let ticket = {
            let mut state = self.state();
            if !state.active() {
                return;
            }
            state.stats.begin_snapshot(&self.inner.shutdown)
        };

        let this = self.clone();
        self.spawn_tracked(async move {
            let service = Arc::clone(&this.inner.ports.service);
            let completion = run_bounded(
                this.inner.ports.time.as_ref(),
                this.inner.settings.request_timeout,
                &ticket.token,
                service.stats_details(StatsPeriod::All),
            )
            .await;

            if let Completion::Done(result) = completion {
                let outcome = {
                    let mut state = this.state();
                    if state.shut_down {
                        return;
                    }
                    state.stats.apply_snapshot(ticket.seq, result)
                };
                if let FetchOutcome::Failed(err) = outcome {
                    warn!("Failed to load stats: {}", err);
                }
                this.bump();
            }
        });
    }

    fn fetch_trend(&self) {
        let (ticket, range) = {
            let mut state = self.state();
            if !state.active() {
                return;
            }
            state.stats.begin_trend(&self.inner.shutdown)
        };
        self.bump();

        let this = self.clone();
        self.spawn_tracked(async move {
            let service = Arc::clone(&this.inner.ports.service);
            let completion = run_bounded(
                this.inner.ports.time.as_ref(),
                this.inner.settings.request_timeout,
                &ticket.token,
                service.stats_details(StatsPeriod::Range(range)),
            )
            .await;

            if let Completion::Done(result) = completion {
                let outcome = {
                    let mut state = this.state();
                    if state.shut_down {
                        return;
                    }
                    state.stats.apply_trend(ticket.seq, range, result)
                };
                match outcome {
                    FetchOutcome::Failed(err) => warn!("Failed to load {} trend: {}", range, err),
                    FetchOutcome::Stale => debug!("Discarded stale {} trend", range),
                    _ => {}
                }
                this.bump();
            }
        });
    }

    fn fetch_noteworthy(&self) {
        let (ticket, status_code, limit) = {
            let mut state = self.state();
            if !state.active() {
                return;
            }
            state.noteworthy.begin_fetch(&self.inner.shutdown)
        };

        let this = self.clone();
        self.spawn_tracked(async move {
            let service = Arc::clone(&this.inner.ports.service);
            let completion = run_bounded(
                this.inner.ports.time.as_ref(),
                this.inner.settings.request_timeout,
                &ticket.token,
                service.attention_keys(status_code, limit),
            )
            .await;

            if let Completion::Done(result) = completion {
                let outcome = {
                    let mut state = this.state();
                    if state.shut_down {
                        return;
                    }
                    state.noteworthy.apply(ticket.seq, status_code, result)
                };
                if let FetchOutcome::Failed(err) = outcome {
                    warn!("Failed to load keys with status {}: {}", status_code, err);
                }
                this.bump();
            }
        });
    }

    /// Jump to page `n` of a list (clamped). Triggers a composite refresh
    /// when the page changed.
    pub fn set_page(&self, kind: ListKind, n: u32) -> bool {
        self.change_page(kind, |store| store.set_page(n))
    }

    pub fn next_page(&self, kind: ListKind) -> bool {
        self.change_page(kind, PaginatedCollectionStore::next_page)
    }

    pub fn prev_page(&self, kind: ListKind) -> bool {
        self.change_page(kind, PaginatedCollectionStore::prev_page)
    }

    fn change_page<F>(&self, kind: ListKind, change: F) -> bool
    where
        F: FnOnce(&mut PaginatedCollectionStore) -> bool,
    {
        let changed = {
            let mut state = self.state();
            if !state.active() {
                return false;
            }
            change(state.store_mut(kind))
        };
        if changed {
            self.refresh_all();
        }
        changed
    }

    /// Raw search box input. The fetch happens once typing pauses.
    pub fn set_search(&self, kind: ListKind, raw: &str) {
        {
            let mut state = self.state();
            if !state.active() {
                return;
            }
            state.store_mut(kind).set_search_input(raw);
        }
        self.bump();
        self.debouncer(kind).push(raw.to_string());
    }

    /// Adopt a debounced term: page 1, selection cleared, composite refresh
    fn apply_search(&self, kind: ListKind, term: &str) {
        let changed = {
            let mut state = self.state();
            if !state.active() {
                return;
            }
            let changed = state.store_mut(kind).apply_search(term);
            if changed {
                state.selection_mut(kind).reset();
            }
            changed
        };
        if changed {
            info!("Searching {} keys for {:?}", kind, term);
            self.refresh_all();
        }
    }

    /// Flip one key of the list. Returns whether it is now selected.
    pub fn toggle_selection(&self, kind: ListKind, key: &str) -> bool {
        let selected = {
            let mut state = self.state();
            if !state.active() {
                return false;
            }
            state.selection_mut(kind).toggle(key)
        };
        self.bump();
        selected
    }

    /// Select-all control over the visible page
    pub fn toggle_select_page(&self, kind: ListKind) -> bool {
        let selected = {
            let mut state = self.state();
            if !state.active() {
                return false;
            }
            let visible = state.store(kind).visible_keys();
            state.selection_mut(kind).toggle_all(&visible)
        };
        self.bump();
        selected
    }

    /// Select-all control over every key matching the current search.
    ///
    /// Walks all pages of the current term. If every matching key is already
    /// selected the selection is cleared instead.
    pub async fn toggle_select_matching(&self, kind: ListKind) -> ServiceResult<bool> {
        let (search, total_pages) = {
            let state = self.state();
            if !state.active() {
                return Ok(false);
            }
            let view = state.store(kind).view();
            (view.search.clone(), view.total_pages)
        };

        let mut matching = Vec::new();
        let mut page = 1;
        let mut last_page = total_pages.max(1);
        while page <= last_page {
            let request = PageRequest::new(kind, page, search.clone());
            let result = with_timeout(
                self.inner.ports.time.as_ref(),
                self.inner.settings.request_timeout,
                self.inner.ports.service.list_keys(&request),
            )
            .await?;
            last_page = result.total_pages.max(1);
            matching.extend(result.entries.into_iter().map(|entry| entry.key));
            page += 1;
        }

        let selected = {
            let mut state = self.state();
            if !state.active() || state.store(kind).view().search != search {
                debug!("Search for {} keys changed during select-all, discarding", kind);
                return Ok(false);
            }
            let selection = state.selection_mut(kind);
            if selection.all_selected(&matching) || matching.is_empty() {
                selection.clear();
                false
            } else {
                selection.select_many(matching);
                true
            }
        };
        self.bump();
        Ok(selected)
    }

    pub async fn toggle_select_all(&self, kind: ListKind, scope: SelectAllScope) -> ServiceResult<bool> {
        match scope {
            SelectAllScope::Page => Ok(self.toggle_select_page(kind)),
            SelectAllScope::AllMatching => self.toggle_select_matching(kind).await,
        }
    }

    fn note(&self, notice: impl Into<String>) {
        self.state().notice = Some(notice.into());
        self.bump();
    }

    fn note_result<T>(&self, result: &MutationResult<T>, success: impl FnOnce(&T) -> String) {
        match result {
            Ok(value) => self.note(success(value)),
            Err(err) => self.note(err.to_string()),
        }
    }

    pub async fn verify(&self, key: &str) -> MutationResult<()> {
        if !self.state().active() {
            return Ok(());
        }
        let result = self.inner.mutations.verify(self, key).await;
        self.note_result(&result, |_| format!("Verification of {} finished", mask(key)));
        result
    }

    pub async fn remove(&self, key: &str) -> MutationResult<()> {
        if !self.state().active() {
            return Ok(());
        }
        let result = self.inner.mutations.remove(self, key).await;
        self.note_result(&result, |_| format!("Deleted {}", mask(key)));
        result
    }

    /// Batch delete of the list's selection. Returns the number of keys deleted.
    pub async fn remove_selected(&self, kind: ListKind) -> MutationResult<usize> {
        if !self.state().active() {
            return Ok(0);
        }
        let result = self.inner.mutations.remove_selected(self, kind).await;
        self.note_result(&result, |count| format!("Deleted {} {} keys", count, kind));
        result
    }

    pub async fn copy(&self, key: &str) -> MutationResult<()> {
        let result = self.inner.mutations.copy(key).await;
        self.note_result(&result, |_| format!("Copied {}", mask(key)));
        result
    }

    /// Switch the trend chart range; only the trend is re-fetched
    pub fn set_time_range(&self, range: TimeRange) -> bool {
        let changed = {
            let mut state = self.state();
            if !state.active() {
                return false;
            }
            state.stats.set_range(range)
        };
        if changed {
            info!("Trend range set to {}", range);
            self.fetch_trend();
        }
        changed
    }

    /// Filter the noteworthy list by another status code
    pub fn set_noteworthy_status(&self, status_code: u16) -> bool {
        let changed = {
            let mut state = self.state();
            if !state.active() {
                return false;
            }
            state.noteworthy.set_status_code(status_code)
        };
        if changed {
            info!("Noteworthy filter set to status {}", status_code);
            self.fetch_noteworthy();
            self.bump();
        }
        changed
    }

    /// Move the navigation selection. Leaving `Dashboard` is terminal: the
    /// core stops and the navigator takes over.
    pub fn navigate(&self, selection: NavSelection) {
        let target = match selection {
            NavSelection::Dashboard => return,
            NavSelection::Config => NavTarget::Config,
            NavSelection::Logs => NavTarget::Logs,
        };
        {
            let mut state = self.state();
            if !state.active() {
                return;
            }
            state.nav = selection;
        }
        info!("Navigating to {}", target.path());
        self.teardown();
        self.inner.ports.navigator.navigate(target);
    }

    /// Cancel timers and in-flight fetches. No state changes afterwards.
    pub fn shutdown(&self) {
        info!("Shutting down key dashboard");
        self.teardown();
    }

    fn teardown(&self) {
        self.inner.valid_search.dispose();
        self.inner.invalid_search.dispose();
        self.inner.shutdown.cancel();
        {
            let mut state = self.state();
            state.shut_down = true;
            state.valid.cancel();
            state.invalid.cancel();
            state.stats.cancel();
            state.noteworthy.cancel();
        }
        self.bump();
    }

    pub fn is_shut_down(&self) -> bool {
        self.state().shut_down
    }

    pub fn refresh_cycles(&self) -> u64 {
        self.state().refresh_cycles
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let state = self.state();
        let valid = state.list_snapshot(ListKind::Valid);
        let invalid = state.list_snapshot(ListKind::Invalid);
        let counts = KeyCounts {
            valid: valid.rows.len(),
            invalid: invalid.rows.len(),
            total: valid.rows.len() + invalid.rows.len(),
        };

        DashboardSnapshot {
            nav: state.nav,
            valid,
            invalid,
            stats: state.stats.snapshot().cloned(),
            stats_error: state.stats.snapshot_error().map(str::to_string),
            trend: TrendSnapshot {
                range: state.stats.range(),
                state: state.stats.trend_state(),
                error: state.stats.trend_error().map(str::to_string),
            },
            noteworthy: NoteworthySnapshot {
                status_code: state.noteworthy.status_code(),
                limit: state.noteworthy.limit(),
                entries: state.noteworthy.entries().to_vec(),
                loaded: state.noteworthy.is_loaded(),
                error: state.noteworthy.last_error().map(str::to_string),
            },
            counts,
            refresh_cycles: state.refresh_cycles,
            notice: state.notice.clone(),
        }
    }
}

impl SyncTarget for Dashboard {
    fn refresh_all(&self) {
        Dashboard::refresh_all(self);
    }

    fn selected_keys(&self, kind: ListKind) -> Vec<String> {
        self.state().selection(kind).selected()
    }

    fn lists_showing(&self, key: &str) -> Vec<ListKind> {
        let state = self.state();
        ListKind::ALL
            .into_iter()
            .filter(|kind| state.selection(*kind).has_seen(key))
            .collect()
    }

    fn clear_selection(&self, kind: ListKind) {
        self.state().selection_mut(kind).clear();
        self.bump();
    }

    fn forget_keys(&self, kind: ListKind, keys: &[String]) {
        {
            let mut state = self.state();
            state.selection_mut(kind).forget(keys.iter().map(String::as_str));
            for key in keys {
                state.noteworthy.forget(key);
            }
        }
        self.bump();
    }
}

fn search_debouncer(
    weak: &Weak<DashboardInner>,
    kind: ListKind,
    ports: &DashboardPorts,
    delay: Duration,
) -> Debouncer<String> {
    let weak = weak.clone();
    let on_settle: SettleFn<String> = Arc::new(move |term: String| {
        let weak = weak.clone();
        async move {
            if let Some(inner) = weak.upgrade() {
                Dashboard { inner }.apply_search(kind, &term);
            }
        }
        .boxed()
    });
    Debouncer::new(delay, Arc::clone(&ports.time), Arc::clone(&ports.spawner), on_settle)
}
