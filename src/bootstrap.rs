use crate::application::dashboard::{Dashboard, DashboardPorts};
use crate::config::Config;
use crate::domain::errors::ServiceError;
use crate::infrastructure::http::HttpKeyService;
use crate::infrastructure::runtime::tokio::{TokioTaskSpawner, TokioTimeService};
use crate::infrastructure::terminal::{Osc52Clipboard, TerminalNavigator};
use std::sync::Arc;

/// Wire the dashboard to the HTTP client, the terminal and the Tokio runtime
pub fn build_dashboard(config: &Config) -> Result<Dashboard, ServiceError> {
    let service = HttpKeyService::new(
        &config.base_url,
        config.request_timeout(),
        config.auth_token.as_deref(),
    )?;
    tracing::info!("Key service client targets {}", config.base_url);

    let ports = DashboardPorts {
        service: Arc::new(service),
        clipboard: Arc::new(Osc52Clipboard::new(std::io::stdout())),
        navigator: Arc::new(TerminalNavigator::new(config.base_url.clone(), std::io::stdout())),
        time: Arc::new(TokioTimeService::new()),
        spawner: Arc::new(TokioTaskSpawner::new()),
    };

    Ok(Dashboard::new(ports, config.dashboard_settings()))
}
