#![allow(dead_code)]
pub mod fake_key_service;

pub use fake_key_service::*;

use keydash::application::{Dashboard, DashboardPorts, DashboardSettings};
use keydash::domain::ports::clipboard::RecordingClipboard;
use keydash::domain::ports::navigator::RecordingNavigator;
use keydash::infrastructure::http::HttpKeyService;
use keydash::infrastructure::runtime::tokio::{TokioTaskSpawner, TokioTimeService};
use std::sync::Arc;
use std::time::Duration;

pub fn http_service(fake: &FakeKeyService) -> HttpKeyService {
    HttpKeyService::new(&fake.base_url, Duration::from_secs(5), None).expect("Failed to build client")
}

pub struct TestDashboard {
    pub dashboard: Dashboard,
    pub clipboard: RecordingClipboard,
    pub navigator: RecordingNavigator,
}

/// Dashboard wired to the fake service over real HTTP
pub fn dashboard_for(fake: &FakeKeyService, settings: DashboardSettings) -> TestDashboard {
    let clipboard = RecordingClipboard::new();
    let navigator = RecordingNavigator::new();
    let ports = DashboardPorts {
        service: Arc::new(http_service(fake)),
        clipboard: Arc::new(clipboard.clone()),
        navigator: Arc::new(navigator.clone()),
        time: Arc::new(TokioTimeService::new()),
        spawner: Arc::new(TokioTaskSpawner::new()),
    };
    TestDashboard {
        dashboard: Dashboard::new(ports, settings),
        clipboard,
        navigator,
    }
}

pub fn fast_settings() -> DashboardSettings {
    DashboardSettings {
        search_debounce: Duration::from_millis(50),
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}
