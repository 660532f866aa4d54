use async_trait::async_trait;
use std::time::Duration;

/// Clock used by debouncing, timeouts and auto refresh.
/// Backed by tokio time so paused-clock tests drive it deterministically.
#[async_trait]
pub trait TimeService: Send + Sync {
    async fn sleep(&self, duration: Duration);
}
