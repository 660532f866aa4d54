use futures::future::BoxFuture;

/// Spawns the dashboard's background work: fetches, debounce timers,
/// auto refresh. Lets tests and alternative runtimes replace Tokio.
pub trait TaskSpawner: Send + Sync {
    /// Run a detached future to completion
    fn spawn(&self, future: BoxFuture<'static, ()>);
}
