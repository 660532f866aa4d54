use crate::domain::entities::{
    KeyPage, ListKind, NoteworthyEntry, PageRequest, StatsDetails, StatsPeriod,
};
use crate::domain::errors::{ServiceError, ServiceResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Remote Key Service: owner of all credential state
#[async_trait]
pub trait KeyService: Send + Sync {
    /// `GET /api/keys` for one page of one list
    async fn list_keys(&self, request: &PageRequest) -> ServiceResult<KeyPage>;

    /// `GET /api/stats/details` for the given period
    async fn stats_details(&self, period: StatsPeriod) -> ServiceResult<StatsDetails>;

    /// `GET /api/stats/attention-keys` filtered by status code
    async fn attention_keys(
        &self,
        status_code: u16,
        limit: u32,
    ) -> ServiceResult<Vec<NoteworthyEntry>>;

    /// Ask the service to re-validate one key against its provider
    async fn verify_key(&self, key: &str) -> ServiceResult<()>;

    /// Delete one key
    async fn delete_key(&self, key: &str) -> ServiceResult<()>;

    /// Delete a batch of keys in one call
    async fn delete_keys(&self, keys: &[String]) -> ServiceResult<()>;
}

/// One call observed by [`MockKeyService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    ListKeys(PageRequest),
    StatsDetails(StatsPeriod),
    AttentionKeys { status_code: u16, limit: u32 },
    VerifyKey(String),
    DeleteKey(String),
    DeleteKeys(Vec<String>),
}

impl ServiceCall {
    pub fn is_list(&self, kind: ListKind) -> bool {
        matches!(self, ServiceCall::ListKeys(req) if req.kind == kind)
    }
}

#[derive(Default)]
struct MockState {
    calls: Vec<ServiceCall>,
    pages: HashMap<(ListKind, u32, String), ServiceResult<KeyPage>>,
    page_delays: HashMap<(ListKind, u32), Duration>,
    stats: HashMap<&'static str, ServiceResult<StatsDetails>>,
    attention: Option<ServiceResult<Vec<NoteworthyEntry>>>,
    verify_result: Option<ServiceError>,
    delete_result: Option<ServiceError>,
    batch_delete_result: Option<ServiceError>,
}

/// Scripted implementation of [`KeyService`] for testing.
/// Records every call; unscripted listings return an empty single page.
#[derive(Clone, Default)]
pub struct MockKeyService {
    state: Arc<Mutex<MockState>>,
}

impl MockKeyService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the response for one (kind, page, search) listing
    pub async fn set_page(
        &self,
        kind: ListKind,
        page: u32,
        search: &str,
        result: ServiceResult<KeyPage>,
    ) {
        let mut state = self.state.lock().await;
        state.pages.insert((kind, page, search.to_string()), result);
    }

    /// Delay responses for one (kind, page) listing
    pub async fn set_page_delay(&self, kind: ListKind, page: u32, delay: Duration) {
        let mut state = self.state.lock().await;
        state.page_delays.insert((kind, page), delay);
    }

    pub async fn set_stats(&self, period: StatsPeriod, result: ServiceResult<StatsDetails>) {
        let mut state = self.state.lock().await;
        state.stats.insert(period.as_str(), result);
    }

    pub async fn set_attention(&self, result: ServiceResult<Vec<NoteworthyEntry>>) {
        let mut state = self.state.lock().await;
        state.attention = Some(result);
    }

    pub async fn fail_verify(&self, error: ServiceError) {
        self.state.lock().await.verify_result = Some(error);
    }

    pub async fn fail_delete(&self, error: ServiceError) {
        self.state.lock().await.delete_result = Some(error);
    }

    pub async fn fail_batch_delete(&self, error: ServiceError) {
        self.state.lock().await.batch_delete_result = Some(error);
    }

    /// All calls received so far, in arrival order
    pub async fn calls(&self) -> Vec<ServiceCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    async fn record(&self, call: ServiceCall) {
        self.state.lock().await.calls.push(call);
    }
}

#[async_trait]
impl KeyService for MockKeyService {
    async fn list_keys(&self, request: &PageRequest) -> ServiceResult<KeyPage> {
        self.record(ServiceCall::ListKeys(request.clone())).await;

        let (delay, result) = {
            let state = self.state.lock().await;
            let delay = state
                .page_delays
                .get(&(request.kind, request.page))
                .copied();
            let result = state
                .pages
                .get(&(request.kind, request.page, request.search.clone()))
                .cloned()
                .unwrap_or_else(|| {
                    Ok(KeyPage {
                        entries: Vec::new(),
                        total_pages: 1,
                    })
                });
            (delay, result)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn stats_details(&self, period: StatsPeriod) -> ServiceResult<StatsDetails> {
        self.record(ServiceCall::StatsDetails(period)).await;
        let state = self.state.lock().await;
        state
            .stats
            .get(period.as_str())
            .cloned()
            .unwrap_or_else(|| Ok(StatsDetails::default()))
    }

    async fn attention_keys(
        &self,
        status_code: u16,
        limit: u32,
    ) -> ServiceResult<Vec<NoteworthyEntry>> {
        self.record(ServiceCall::AttentionKeys { status_code, limit })
            .await;
        let state = self.state.lock().await;
        state.attention.clone().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn verify_key(&self, key: &str) -> ServiceResult<()> {
        self.record(ServiceCall::VerifyKey(key.to_string())).await;
        match self.state.lock().await.verify_result.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn delete_key(&self, key: &str) -> ServiceResult<()> {
        self.record(ServiceCall::DeleteKey(key.to_string())).await;
        match self.state.lock().await.delete_result.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn delete_keys(&self, keys: &[String]) -> ServiceResult<()> {
        self.record(ServiceCall::DeleteKeys(keys.to_vec())).await;
        match self.state.lock().await.batch_delete_result.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
