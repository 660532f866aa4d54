use crate::application::services::sequencing::with_timeout;
use crate::domain::entities::ListKind;
use crate::domain::errors::{MutationError, MutationResult};
use crate::domain::ports::clipboard::Clipboard;
use crate::domain::ports::key_service::KeyService;
use crate::domain::ports::time_service::TimeService;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// State the coordinator re-synchronizes after a write.
///
/// Implemented by the dashboard; every successful mutation ends in
/// [`refresh_all`](SyncTarget::refresh_all) instead of patching local state.
pub trait SyncTarget: Send + Sync {
    /// Re-fetch every list, the stats snapshot and the noteworthy list
    fn refresh_all(&self);

    fn selected_keys(&self, kind: ListKind) -> Vec<String>;

    /// Lists whose fetched pages have shown `key`
    fn lists_showing(&self, key: &str) -> Vec<ListKind>;

    fn clear_selection(&self, kind: ListKind);

    /// Drop deleted keys from the selection of `kind` and from its seen keys
    fn forget_keys(&self, kind: ListKind, keys: &[String]);
}

/// Runs writes against the Remote Key Service. No retries.
#[derive(Clone)]
pub struct MutationCoordinator {
    service: Arc<dyn KeyService>,
    clipboard: Arc<dyn Clipboard>,
    time: Arc<dyn TimeService>,
    timeout: Duration,
}

impl MutationCoordinator {
    pub fn new(
        service: Arc<dyn KeyService>,
        clipboard: Arc<dyn Clipboard>,
        time: Arc<dyn TimeService>,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            clipboard,
            time,
            timeout,
        }
    }

    /// Re-validate one key. Refreshes everything whatever the outcome; the
    /// selection of the key's list is cleared only on success.
    pub async fn verify(&self, target: &dyn SyncTarget, key: &str) -> MutationResult<()> {
        info!("Verifying key {}", mask(key));
        let result = with_timeout(self.time.as_ref(), self.timeout, self.service.verify_key(key)).await;

        match &result {
            Ok(()) => {
                prune_selections(target, key);
            }
            Err(err) => warn!("Verification of {} failed: {}", mask(key), err),
        }
        target.refresh_all();
        result.map_err(MutationError::from)
    }

    /// Delete one key. On success the selection of its list is cleared and
    /// everything is refreshed.
    pub async fn remove(&self, target: &dyn SyncTarget, key: &str) -> MutationResult<()> {
        info!("Deleting key {}", mask(key));
        match with_timeout(self.time.as_ref(), self.timeout, self.service.delete_key(key)).await {
            Ok(()) => {
                let deleted = [key.to_string()];
                for kind in prune_selections(target, key) {
                    target.forget_keys(kind, &deleted);
                }
                target.refresh_all();
                Ok(())
            }
            Err(err) => {
                error!("Failed to delete key {}: {}", mask(key), err);
                Err(err.into())
            }
        }
    }

    /// Delete the whole selection of `kind` in one batch call.
    ///
    /// Returns the number of keys sent. Only when the service accepted the
    /// batch are the sent keys dropped from the selection; keys toggled while
    /// the call was running stay selected.
    pub async fn remove_selected(&self, target: &dyn SyncTarget, kind: ListKind) -> MutationResult<usize> {
        let keys = target.selected_keys(kind);
        if keys.is_empty() {
            return Err(MutationError::EmptySelection(kind));
        }

        info!("Deleting {} selected {} keys", keys.len(), kind);
        match with_timeout(self.time.as_ref(), self.timeout, self.service.delete_keys(&keys)).await {
            Ok(()) => {
                target.forget_keys(kind, &keys);
                target.refresh_all();
                Ok(keys.len())
            }
            Err(err) => {
                error!("Batch delete of {} {} keys failed: {}", keys.len(), kind, err);
                Err(err.into())
            }
        }
    }

    /// Best-effort copy of the full key text
    pub async fn copy(&self, key: &str) -> MutationResult<()> {
        self.clipboard.write_text(key).await.map_err(|err| {
            warn!("Copy to clipboard failed: {}", err);
            MutationError::Clipboard(err)
        })
    }
}

/// Clear the selection of every list that has shown `key`, or of both lists
/// when none has. Returns the lists cleared.
fn prune_selections(target: &dyn SyncTarget, key: &str) -> Vec<ListKind> {
    let mut kinds = target.lists_showing(key);
    if kinds.is_empty() {
        kinds = ListKind::ALL.to_vec();
    }
    for kind in &kinds {
        target.clear_selection(*kind);
    }
    kinds
}

/// Shortened form of a key for log lines
pub fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return key.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{KeyPage, NoteworthyEntry, PageRequest, StatsDetails, StatsPeriod};
    use crate::domain::errors::{ServiceError, ServiceResult};
    use crate::domain::ports::clipboard::RecordingClipboard;
    use crate::domain::ports::key_service::{MockKeyService, ServiceCall};
    use crate::infrastructure::runtime::tokio::TokioTimeService;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingTarget {
        refreshes: Mutex<usize>,
        selections: Mutex<HashMap<ListKind, Vec<String>>>,
        shown: Mutex<HashMap<ListKind, Vec<String>>>,
        forgotten: Mutex<Vec<(ListKind, String)>>,
    }

    impl CountingTarget {
        fn with_selection(kind: ListKind, keys: &[&str]) -> Self {
            let target = Self::default();
            target
                .selections
                .lock()
                .unwrap()
                .insert(kind, keys.iter().map(|k| k.to_string()).collect());
            target
        }

        fn select(&self, kind: ListKind, keys: &[&str]) {
            self.selections
                .lock()
                .unwrap()
                .entry(kind)
                .or_default()
                .extend(keys.iter().map(|k| k.to_string()));
        }

        fn show(&self, kind: ListKind, keys: &[&str]) {
            self.shown
                .lock()
                .unwrap()
                .insert(kind, keys.iter().map(|k| k.to_string()).collect());
        }

        fn refreshes(&self) -> usize {
            *self.refreshes.lock().unwrap()
        }

        fn forgotten(&self) -> Vec<(ListKind, String)> {
            self.forgotten.lock().unwrap().clone()
        }
    }

    impl SyncTarget for CountingTarget {
        fn refresh_all(&self) {
            *self.refreshes.lock().unwrap() += 1;
        }

        fn selected_keys(&self, kind: ListKind) -> Vec<String> {
            self.selections
                .lock()
                .unwrap()
                .get(&kind)
                .cloned()
                .unwrap_or_default()
        }

        fn lists_showing(&self, key: &str) -> Vec<ListKind> {
            let shown = self.shown.lock().unwrap();
            ListKind::ALL
                .into_iter()
                .filter(|kind| shown.get(kind).map_or(false, |keys| keys.iter().any(|k| k == key)))
                .collect()
        }

        fn clear_selection(&self, kind: ListKind) {
            self.selections.lock().unwrap().remove(&kind);
        }

        fn forget_keys(&self, kind: ListKind, keys: &[String]) {
            if let Some(selected) = self.selections.lock().unwrap().get_mut(&kind) {
                selected.retain(|k| !keys.contains(k));
            }
            self.forgotten
                .lock()
                .unwrap()
                .extend(keys.iter().map(|k| (kind, k.clone())));
        }
    }

    fn coordinator(service: &MockKeyService, clipboard: Arc<dyn Clipboard>) -> MutationCoordinator {
        MutationCoordinator::new(
            Arc::new(service.clone()),
            clipboard,
            Arc::new(TokioTimeService::new()),
            Duration::from_secs(30),
        )
    }

    #[tokio::test]
    async fn test_verify_success_refreshes_once() {
        let service = MockKeyService::new();
        let coordinator = coordinator(&service, Arc::new(RecordingClipboard::new()));
        let target = CountingTarget::default();

        coordinator.verify(&target, "k1").await.unwrap();

        assert_eq!(target.refreshes(), 1);
        assert_eq!(service.calls().await, vec![ServiceCall::VerifyKey("k1".to_string())]);
    }

    #[tokio::test]
    async fn test_verify_success_clears_selection_of_its_list() {
        let service = MockKeyService::new();
        let coordinator = coordinator(&service, Arc::new(RecordingClipboard::new()));
        let target = CountingTarget::default();
        target.show(ListKind::Valid, &["k1", "k2"]);
        target.select(ListKind::Valid, &["k1", "k2"]);
        target.show(ListKind::Invalid, &["i1"]);
        target.select(ListKind::Invalid, &["i1"]);

        coordinator.verify(&target, "k2").await.unwrap();

        assert!(target.selected_keys(ListKind::Valid).is_empty());
        assert_eq!(target.selected_keys(ListKind::Invalid), vec!["i1"]);
        assert!(target.forgotten().is_empty());
    }

    #[tokio::test]
    async fn test_verify_failure_still_refreshes_once() {
        let service = MockKeyService::new();
        service
            .fail_verify(ServiceError::Status {
                status: 502,
                message: "Upstream rejected key".to_string(),
            })
            .await;
        let coordinator = coordinator(&service, Arc::new(RecordingClipboard::new()));
        let target = CountingTarget::default();
        target.show(ListKind::Valid, &["k1", "k2"]);
        target.select(ListKind::Valid, &["k2"]);

        let err = coordinator.verify(&target, "k1").await.unwrap_err();

        assert_eq!(err.to_string(), "Upstream rejected key");
        assert_eq!(target.refreshes(), 1);
        assert_eq!(target.selected_keys(ListKind::Valid), vec!["k2"]);
    }

    #[tokio::test]
    async fn test_remove_clears_selection_of_its_list() {
        let service = MockKeyService::new();
        let coordinator = coordinator(&service, Arc::new(RecordingClipboard::new()));
        let target = CountingTarget::default();
        target.show(ListKind::Invalid, &["k8", "k9"]);
        target.select(ListKind::Invalid, &["k8", "k9"]);
        target.show(ListKind::Valid, &["v1"]);
        target.select(ListKind::Valid, &["v1"]);

        coordinator.remove(&target, "k9").await.unwrap();

        assert_eq!(target.refreshes(), 1);
        assert!(target.selected_keys(ListKind::Invalid).is_empty());
        assert_eq!(target.selected_keys(ListKind::Valid), vec!["v1"]);
        assert_eq!(target.forgotten(), vec![(ListKind::Invalid, "k9".to_string())]);
    }

    #[tokio::test]
    async fn test_remove_of_unseen_key_clears_both_lists() {
        let service = MockKeyService::new();
        let coordinator = coordinator(&service, Arc::new(RecordingClipboard::new()));
        let target = CountingTarget::default();
        target.select(ListKind::Valid, &["v1"]);
        target.select(ListKind::Invalid, &["i1"]);

        coordinator.remove(&target, "elsewhere").await.unwrap();

        assert!(target.selected_keys(ListKind::Valid).is_empty());
        assert!(target.selected_keys(ListKind::Invalid).is_empty());
        assert_eq!(target.forgotten().len(), 2);
    }

    #[tokio::test]
    async fn test_remove_failure_leaves_state_alone() {
        let service = MockKeyService::new();
        service.fail_delete(ServiceError::Transport("reset".to_string())).await;
        let coordinator = coordinator(&service, Arc::new(RecordingClipboard::new()));
        let target = CountingTarget::default();

        target.show(ListKind::Valid, &["k9"]);
        target.select(ListKind::Valid, &["k9"]);

        assert!(coordinator.remove(&target, "k9").await.is_err());
        assert_eq!(target.refreshes(), 0);
        assert_eq!(target.selected_keys(ListKind::Valid), vec!["k9"]);
        assert!(target.forgotten().is_empty());
    }

    #[tokio::test]
    async fn test_remove_selected_clears_selection_and_refreshes() {
        let service = MockKeyService::new();
        let coordinator = coordinator(&service, Arc::new(RecordingClipboard::new()));
        let target = CountingTarget::with_selection(ListKind::Valid, &["k2"]);

        let count = coordinator.remove_selected(&target, ListKind::Valid).await.unwrap();

        assert_eq!(count, 1);
        assert!(target.selected_keys(ListKind::Valid).is_empty());
        assert_eq!(target.refreshes(), 1);
        assert_eq!(
            service.calls().await,
            vec![ServiceCall::DeleteKeys(vec!["k2".to_string()])]
        );
    }

    #[tokio::test]
    async fn test_remove_selected_keeps_keys_selected_during_the_call() {
        struct SelectingService {
            inner: MockKeyService,
            target: Arc<CountingTarget>,
        }

        #[async_trait]
        impl KeyService for SelectingService {
            async fn list_keys(&self, request: &PageRequest) -> ServiceResult<KeyPage> {
                self.inner.list_keys(request).await
            }
            async fn stats_details(&self, period: StatsPeriod) -> ServiceResult<StatsDetails> {
                self.inner.stats_details(period).await
            }
            async fn attention_keys(&self, status_code: u16, limit: u32) -> ServiceResult<Vec<NoteworthyEntry>> {
                self.inner.attention_keys(status_code, limit).await
            }
            async fn verify_key(&self, key: &str) -> ServiceResult<()> {
                self.inner.verify_key(key).await
            }
            async fn delete_key(&self, key: &str) -> ServiceResult<()> {
                self.inner.delete_key(key).await
            }
            async fn delete_keys(&self, keys: &[String]) -> ServiceResult<()> {
                // Operator ticks another row while the batch is on the wire
                self.target.select(ListKind::Valid, &["k3"]);
                self.inner.delete_keys(keys).await
            }
        }

        let target = Arc::new(CountingTarget::with_selection(ListKind::Valid, &["k1", "k2"]));
        let service = MockKeyService::new();
        let coordinator = MutationCoordinator::new(
            Arc::new(SelectingService {
                inner: service.clone(),
                target: Arc::clone(&target),
            }),
            Arc::new(RecordingClipboard::new()),
            Arc::new(TokioTimeService::new()),
            Duration::from_secs(30),
        );

        let count = coordinator.remove_selected(target.as_ref(), ListKind::Valid).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            service.calls().await,
            vec![ServiceCall::DeleteKeys(vec!["k1".to_string(), "k2".to_string()])]
        );
        assert_eq!(target.selected_keys(ListKind::Valid), vec!["k3"]);
        assert_eq!(target.refreshes(), 1);
    }

    #[tokio::test]
    async fn test_remove_selected_failure_keeps_selection() {
        let service = MockKeyService::new();
        service
            .fail_batch_delete(ServiceError::Status {
                status: 500,
                message: "HTTP error! status: 500".to_string(),
            })
            .await;
        let coordinator = coordinator(&service, Arc::new(RecordingClipboard::new()));
        let target = CountingTarget::with_selection(ListKind::Invalid, &["a", "b"]);

        let result = coordinator.remove_selected(&target, ListKind::Invalid).await;

        assert!(matches!(result, Err(MutationError::Service(_))));
        assert_eq!(target.selected_keys(ListKind::Invalid), vec!["a", "b"]);
        assert_eq!(target.refreshes(), 0);
    }

    #[tokio::test]
    async fn test_remove_selected_with_empty_selection_makes_no_call() {
        let service = MockKeyService::new();
        let coordinator = coordinator(&service, Arc::new(RecordingClipboard::new()));
        let target = CountingTarget::default();

        let result = coordinator.remove_selected(&target, ListKind::Valid).await;

        assert_eq!(result, Err(MutationError::EmptySelection(ListKind::Valid)));
        assert!(service.calls().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_delete_times_out() {
        struct HungService(MockKeyService);

        #[async_trait]
        impl KeyService for HungService {
            async fn list_keys(&self, request: &PageRequest) -> ServiceResult<KeyPage> {
                self.0.list_keys(request).await
            }
            async fn stats_details(&self, period: StatsPeriod) -> ServiceResult<StatsDetails> {
                self.0.stats_details(period).await
            }
            async fn attention_keys(&self, status_code: u16, limit: u32) -> ServiceResult<Vec<NoteworthyEntry>> {
                self.0.attention_keys(status_code, limit).await
            }
            async fn verify_key(&self, key: &str) -> ServiceResult<()> {
                self.0.verify_key(key).await
            }
            async fn delete_key(&self, _key: &str) -> ServiceResult<()> {
                futures::future::pending().await
            }
            async fn delete_keys(&self, keys: &[String]) -> ServiceResult<()> {
                self.0.delete_keys(keys).await
            }
        }

        let coordinator = MutationCoordinator::new(
            Arc::new(HungService(MockKeyService::new())),
            Arc::new(RecordingClipboard::new()),
            Arc::new(TokioTimeService::new()),
            Duration::from_secs(5),
        );
        let target = CountingTarget::default();

        let err = coordinator.remove(&target, "k1").await.unwrap_err();
        assert_eq!(
            err,
            MutationError::Service(ServiceError::Timeout(Duration::from_secs(5)))
        );
        assert_eq!(target.refreshes(), 0);
    }

    #[tokio::test]
    async fn test_copy_writes_full_key() {
        let service = MockKeyService::new();
        let clipboard = RecordingClipboard::new();
        let coordinator = coordinator(&service, Arc::new(clipboard.clone()));

        coordinator.copy("AIzaSyExampleKey").await.unwrap();

        assert_eq!(clipboard.copied().await, vec!["AIzaSyExampleKey".to_string()]);
        assert!(service.calls().await.is_empty());
    }

    #[test]
    fn test_mask_shortens_long_keys() {
        assert_eq!(mask("AIzaSyExampleKey"), "AIza...eKey");
        assert_eq!(mask("short"), "short");
    }
}
